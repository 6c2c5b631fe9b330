//! crates/dream_university_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format.

use std::fmt;

/// A single standardized-test record entered during onboarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestScore {
    pub name: String,
    /// Score or rank as typed by the student.
    pub score: String,
}

/// The single user profile held by a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub city: String,
    pub currency: String,
    /// Annual budget in `currency` units.
    pub budget: u64,
    /// Cumulative grade metric; the scale is whatever the student entered.
    pub gpa: f64,
    pub target_degree: String,
    pub target_course: String,
    /// `None` means no preference ("any").
    pub target_country: Option<String>,
    /// Unique, in the order they were selected.
    pub languages: Vec<String>,
    pub tests: Vec<TestScore>,
    pub completeness: Completeness,
}

/// Whether the profile has gone through every onboarding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    Incomplete,
    Complete,
}

impl Profile {
    pub fn is_complete(&self) -> bool {
        self.completeness == Completeness::Complete
    }

    /// Adds a language unless it is already present.
    pub fn add_language(&mut self, language: &str) {
        if !self.languages.iter().any(|l| l == language) {
            self.languages.push(language.to_string());
        }
    }
}

/// An externally sourced catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct University {
    pub id: u32,
    pub name: String,
    pub country: String,
    /// Annual tuition, normalized to USD.
    pub tuition_usd: u64,
    pub image_url: String,
    pub institution_type: Option<String>,
    pub tags: Vec<String>,
    pub global_rank: Option<u32>,
    pub acceptance_rate_percent: Option<f64>,
}

/// Fit of a university for a given profile. Derived, never stored on the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchCategory {
    Dream,
    Target,
    Safe,
}

impl fmt::Display for MatchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchCategory::Dream => "Dream",
            MatchCategory::Target => "Target",
            MatchCategory::Safe => "Safe",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    High,
    Medium,
    Low,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchTier::High => "High Match",
            MatchTier::Medium => "Medium Match",
            MatchTier::Low => "Low Match",
        };
        f.write_str(label)
    }
}

/// A transient country scoring result. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRecommendation {
    pub country: String,
    /// 0..=100
    pub match_percent: u8,
    pub tier: MatchTier,
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

/// Which generator a task can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiAction {
    StatementOfPurpose,
}

/// A unit of application work on the roadmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub label: String,
    pub status: TaskStatus,
    /// Display string, never parsed.
    pub deadline: String,
    ai_action: Option<AiAction>,
}

impl Task {
    pub fn new(id: &str, label: &str, status: TaskStatus, deadline: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            status,
            deadline: deadline.to_string(),
            ai_action: None,
        }
    }

    pub fn with_ai_action(mut self, action: AiAction) -> Self {
        self.ai_action = Some(action);
        self
    }

    /// The action tag is fixed at construction.
    pub fn ai_action(&self) -> Option<AiAction> {
        self.ai_action
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the counsellor conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// A drafted document held only in session memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub action: AiAction,
    pub text: String,
}

/// The views of the funnel, in the order a session normally visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Landing,
    Auth,
    Onboarding,
    Analysis,
    Dashboard,
    Application,
    Success,
}
