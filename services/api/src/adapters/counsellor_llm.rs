//! services/api/src/adapters/counsellor_llm.rs
//!
//! This module contains the adapter that answers counsellor prompts with an
//! OpenAI-compatible LLM directly, instead of going through the backend's
//! `/chat` endpoint. It implements the `CounsellorService` port.

const SYSTEM_INSTRUCTIONS: &str = r#"You are 'Dream University AI', an expert international education counsellor.
Adapt to what the student asks for:

PROFILE ANALYZER:
- Read the student's profile (GPA, budget, exams) and point out strengths and weaknesses.
- Be honest and practical. Call out missing requirements such as IELTS or GRE.

DECISION MAKER:
- Recommend countries that fit the student's career goals and budget.
- Mention risks (visa issues, a tight budget) and how confident you are.

UNIVERSITY SHORTLISTER:
- Suggest universities from the database below that realistically match the profile.
- Label each one SAFE, MODERATE or AMBITIOUS.
- Only recommend universities that appear in the database.

SOP WRITER:
- Help write compelling Statements of Purpose aligned with the chosen university and career goals.
- If important details are missing, ask for them before writing."#;

use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client, error::OpenAIError,
};
use async_trait::async_trait;
use dream_university_core::{
    ports::{CatalogService, CounsellorService, PortError, PortResult},
    University,
};
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CounsellorService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiCounsellorAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    catalog: Arc<dyn CatalogService>,
}

impl OpenAiCounsellorAdapter {
    /// Creates a new `OpenAiCounsellorAdapter`. The catalog grounds recommendations.
    pub fn new(client: Client<OpenAIConfig>, model: String, catalog: Arc<dyn CatalogService>) -> Self {
        Self { client, model, catalog }
    }
}

/// Renders the catalog as one line per university for the system prompt.
pub fn format_catalog(universities: &[University]) -> String {
    if universities.is_empty() {
        return "No university data available.".to_string();
    }
    universities
        .iter()
        .map(|u| {
            format!(
                "- {} ({}): Fees ${}, Tags: [{}]",
                u.name,
                u.country,
                u.tuition_usd,
                u.tags.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

//=========================================================================================
// `CounsellorService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CounsellorService for OpenAiCounsellorAdapter {
    async fn send_message(&self, message: &str) -> PortResult<String> {
        // A catalog outage only weakens the grounding; the question is still answered.
        let universities = match self.catalog.fetch_universities().await {
            Ok(list) => list,
            Err(e) => {
                warn!("Counsellor prompt built without catalog context: {}", e);
                Vec::new()
            }
        };
        let system_prompt = format!(
            "{}\n\n--- UNIVERSITY DATABASE (For Recommendations Only) ---\n{}\n---------------------------",
            SYSTEM_INSTRUCTIONS,
            format_catalog(&universities)
        );

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("User Query: {}", message))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Malformed("Counsellor LLM response contained no text content.".to_string())
            })
    }
}
