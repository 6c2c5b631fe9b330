pub mod catalog;
pub mod domain;
pub mod fallback;
pub mod funnel;
pub mod ports;
pub mod profile;
pub mod resilient;
pub mod scoring;
pub mod tasks;

pub use domain::{
    AiAction, ChatMessage, ChatRole, Completeness, CountryRecommendation, GeneratedDocument,
    MatchCategory, MatchTier, Profile, Task, TaskStatus, TestScore, University, View,
};
pub use funnel::{Effect, FunnelController, FunnelEvent, FunnelSettings, QuickPrompt};
pub use ports::{CatalogService, CounsellorService, PortError, PortResult};
pub use profile::{OnboardingStep, OnboardingWizard, ProfileStore};
pub use resilient::{ResilienceSettings, ResilientClient};
pub use tasks::TaskBoard;
