//! crates/dream_university_core/src/resilient.rs
//!
//! Wraps the counsellor port so every call resolves to usable text.
//!
//! A failed call (transport error, bad status, malformed body, timeout) is
//! replaced by fallback content of the same shape. Nothing here retries on its
//! own; a retry is the caller sending the same prompt again.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::Profile;
use crate::fallback;
use crate::ports::{CounsellorService, PortError, PortResult};

/// Default bound for document drafting.
pub const DRAFT_TIMEOUT: Duration = Duration::from_millis(8000);
/// Pause before a templated draft is handed back.
pub const DRAFT_FALLBACK_DELAY: Duration = Duration::from_millis(1000);

/// What to return when the call fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// The fixed offline notice, returned immediately.
    OfflineNotice,
    /// A prepared document, returned after `delay`.
    Document { text: String, delay: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOptions {
    pub timeout: Option<Duration>,
    pub fallback: Fallback,
}

/// Timing knobs for the two call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResilienceSettings {
    /// Bound for conversational calls. `None` leaves them unbounded.
    pub chat_timeout: Option<Duration>,
    pub draft_timeout: Duration,
    pub draft_fallback_delay: Duration,
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            chat_timeout: Some(Duration::from_secs(30)),
            draft_timeout: DRAFT_TIMEOUT,
            draft_fallback_delay: DRAFT_FALLBACK_DELAY,
        }
    }
}

#[derive(Clone)]
pub struct ResilientClient {
    counsellor: Arc<dyn CounsellorService>,
    settings: ResilienceSettings,
}

impl ResilientClient {
    pub fn new(counsellor: Arc<dyn CounsellorService>, settings: ResilienceSettings) -> Self {
        Self { counsellor, settings }
    }

    /// Sends `prompt` and returns the reply, or the fallback on any failure.
    pub async fn send(&self, prompt: &str, options: SendOptions) -> String {
        match self.try_send(prompt, options.timeout).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Counsellor call failed, substituting fallback content: {}", e);
                match options.fallback {
                    Fallback::OfflineNotice => fallback::OFFLINE_NOTICE.to_string(),
                    Fallback::Document { text, delay } => {
                        tokio::time::sleep(delay).await;
                        text
                    }
                }
            }
        }
    }

    async fn try_send(&self, prompt: &str, timeout: Option<Duration>) -> PortResult<String> {
        let call = self.counsellor.send_message(prompt);
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| PortError::Timeout(limit.as_millis() as u64))?,
            None => call.await,
        }
    }

    /// One conversational turn. The prompt carries the profile's budget and GPA.
    pub async fn ask(&self, profile: &Profile, text: &str) -> String {
        let prompt = chat_prompt(profile, text);
        let options = SendOptions {
            timeout: self.settings.chat_timeout,
            fallback: Fallback::OfflineNotice,
        };
        self.send(&prompt, options).await
    }

    /// Drafts a statement of purpose, falling back to the templated one.
    pub async fn draft_statement(&self, profile: &Profile) -> String {
        info!("Drafting statement of purpose for {}.", profile.name);
        let options = SendOptions {
            timeout: Some(self.settings.draft_timeout),
            fallback: Fallback::Document {
                text: fallback::statement_of_purpose(profile),
                delay: self.settings.draft_fallback_delay,
            },
        };
        self.send(&statement_prompt(profile), options).await
    }
}

pub fn chat_prompt(profile: &Profile, text: &str) -> String {
    format!(
        "Profile: {} budget, {} GPA. Query: {}",
        profile.budget, profile.gpa, text
    )
}

pub fn statement_prompt(profile: &Profile) -> String {
    format!(
        "Act as an expert SOP Writer. Write a 200-word Statement of Purpose for {}. \n\nProfile:\n- GPA: {}\n- Target: {} in {}\n- Course: {}\n- Languages: {}",
        profile.name,
        profile.gpa,
        profile.target_degree,
        profile.target_country.as_deref().unwrap_or("Any"),
        profile.target_course,
        profile.languages.join(", ")
    )
}
