//! services/api/src/web/protocol.rs
//!
//! Defines the JSON protocol between the browser client and the API server:
//! the actions a client can apply to its session, and the snapshot of the
//! session returned after every action.

use dream_university_core::{
    funnel::{FunnelController, FunnelEvent, QuickPrompt},
    profile, scoring, ChatRole, MatchCategory, Profile, Task, TaskStatus, University, View,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Actions Sent FROM the Client TO the Server
//=========================================================================================

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatusDto {
    Todo,
    InProgress,
    Done,
}

impl From<TaskStatusDto> for TaskStatus {
    fn from(status: TaskStatusDto) -> Self {
        match status {
            TaskStatusDto::Todo => TaskStatus::Todo,
            TaskStatusDto::InProgress => TaskStatus::InProgress,
            TaskStatusDto::Done => TaskStatus::Done,
        }
    }
}

impl From<TaskStatus> for TaskStatusDto {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Todo => TaskStatusDto::Todo,
            TaskStatus::InProgress => TaskStatusDto::InProgress,
            TaskStatus::Done => TaskStatusDto::Done,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuickPromptDto {
    DraftEmail,
    VisaHelp,
}

/// Represents the actions a client can apply to its session.
#[derive(Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    /// Leaves the landing page for sign-in.
    Start,
    /// The full value of the name field after a keystroke.
    NameInput { value: String },
    SubmitAuth {
        #[serde(default)]
        email: String,
    },
    SetDegree { degree: String },
    SetGpa { gpa: f64 },
    SetCourse { course: String },
    SelectTest { name: String },
    EnterScore { score: String },
    AddTest,
    SetCurrency { currency: String },
    SetBudget { input: String },
    ToggleLanguage { language: String },
    SelectCountry { country: Option<String> },
    NextStep,
    ContinueToDashboard,
    OpenDashboard,
    OpenApplication,
    ToggleShortlist { university_id: u32 },
    ShowDetails { university_id: u32 },
    HideDetails,
    SetTaskStatus { task_id: String, status: TaskStatusDto },
    SendChat { text: String },
    QuickPrompt { prompt: QuickPromptDto },
    RequestDraft,
    /// Re-issues the draft request, discarding the one in flight.
    RetryDraft,
    CloseDraft,
    AcceptDraft,
    /// Brand/logo: back to the landing page.
    Reset,
    /// Discards the whole session state and starts over.
    Restart,
}

impl ClientAction {
    /// The funnel event for this action, or `None` for `Restart`, which the
    /// session task handles itself.
    pub fn into_event(self) -> Option<FunnelEvent> {
        let event = match self {
            ClientAction::Start => FunnelEvent::Start,
            ClientAction::NameInput { value } => FunnelEvent::NameInput(value),
            ClientAction::SubmitAuth { email } => FunnelEvent::SubmitAuth { email },
            ClientAction::SetDegree { degree } => FunnelEvent::SetDegree(degree),
            ClientAction::SetGpa { gpa } => FunnelEvent::SetGpa(gpa),
            ClientAction::SetCourse { course } => FunnelEvent::SetCourse(course),
            ClientAction::SelectTest { name } => FunnelEvent::SelectTest(name),
            ClientAction::EnterScore { score } => FunnelEvent::EnterScore(score),
            ClientAction::AddTest => FunnelEvent::AddTest,
            ClientAction::SetCurrency { currency } => FunnelEvent::SetCurrency(currency),
            ClientAction::SetBudget { input } => FunnelEvent::SetBudgetInput(input),
            ClientAction::ToggleLanguage { language } => FunnelEvent::ToggleLanguage(language),
            ClientAction::SelectCountry { country } => FunnelEvent::SelectCountry(country),
            ClientAction::NextStep => FunnelEvent::NextStep,
            ClientAction::ContinueToDashboard => FunnelEvent::ContinueToDashboard,
            ClientAction::OpenDashboard => FunnelEvent::OpenDashboard,
            ClientAction::OpenApplication => FunnelEvent::OpenApplication,
            ClientAction::ToggleShortlist { university_id } => {
                FunnelEvent::ToggleShortlist(university_id)
            }
            ClientAction::ShowDetails { university_id } => FunnelEvent::ShowDetails(university_id),
            ClientAction::HideDetails => FunnelEvent::HideDetails,
            ClientAction::SetTaskStatus { task_id, status } => {
                FunnelEvent::SetTaskStatus { task_id, status: status.into() }
            }
            ClientAction::SendChat { text } => FunnelEvent::SendChat(text),
            ClientAction::QuickPrompt { prompt } => FunnelEvent::QuickPrompt(match prompt {
                QuickPromptDto::DraftEmail => QuickPrompt::DraftEmail,
                QuickPromptDto::VisaHelp => QuickPrompt::VisaHelp,
            }),
            ClientAction::RequestDraft | ClientAction::RetryDraft => FunnelEvent::RequestDraft,
            ClientAction::CloseDraft => FunnelEvent::CloseDraft,
            ClientAction::AcceptDraft => FunnelEvent::AcceptDraft,
            ClientAction::Reset => FunnelEvent::Reset,
            ClientAction::Restart => return None,
        };
        Some(event)
    }
}

//=========================================================================================
// Snapshot Sent FROM the Server TO the Client
//=========================================================================================

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViewDto {
    Landing,
    Auth,
    Onboarding,
    Analysis,
    Dashboard,
    Application,
    Success,
}

impl From<View> for ViewDto {
    fn from(view: View) -> Self {
        match view {
            View::Landing => ViewDto::Landing,
            View::Auth => ViewDto::Auth,
            View::Onboarding => ViewDto::Onboarding,
            View::Analysis => ViewDto::Analysis,
            View::Dashboard => ViewDto::Dashboard,
            View::Application => ViewDto::Application,
            View::Success => ViewDto::Success,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct TestScoreDto {
    pub name: String,
    pub score: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ProfileDto {
    pub name: String,
    pub email: String,
    pub city: String,
    pub currency: String,
    pub budget: u64,
    pub gpa: f64,
    pub target_degree: String,
    pub target_course: String,
    pub target_country: Option<String>,
    pub languages: Vec<String>,
    pub tests: Vec<TestScoreDto>,
    pub complete: bool,
}

impl From<&Profile> for ProfileDto {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            email: profile.email.clone(),
            city: profile.city.clone(),
            currency: profile.currency.clone(),
            budget: profile.budget,
            gpa: profile.gpa,
            target_degree: profile.target_degree.clone(),
            target_course: profile.target_course.clone(),
            target_country: profile.target_country.clone(),
            languages: profile.languages.clone(),
            tests: profile
                .tests
                .iter()
                .map(|t| TestScoreDto { name: t.name.clone(), score: t.score.clone() })
                .collect(),
            complete: profile.is_complete(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct OnboardingDto {
    pub step: u8,
    pub can_advance: bool,
    pub target_degree: String,
    pub gpa: f64,
    pub target_course: String,
    pub tests: Vec<TestScoreDto>,
    pub pending_test: TestScoreDto,
    pub currency: String,
    pub budget_input: String,
    pub languages: Vec<String>,
    pub target_country: Option<String>,
    pub test_options: Vec<String>,
    pub language_options: Vec<String>,
    /// Offered target countries; "Any" means no preference.
    pub country_options: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct CountryDto {
    pub country: String,
    pub match_percent: u8,
    pub tier: String,
    pub rationale: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct AnalysisDto {
    pub loading: bool,
    pub countries: Vec<CountryDto>,
    pub recommendation: String,
    pub action_items: Vec<String>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum CategoryDto {
    Dream,
    Target,
    Safe,
}

impl From<MatchCategory> for CategoryDto {
    fn from(category: MatchCategory) -> Self {
        match category {
            MatchCategory::Dream => CategoryDto::Dream,
            MatchCategory::Target => CategoryDto::Target,
            MatchCategory::Safe => CategoryDto::Safe,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct UniversityCardDto {
    pub id: u32,
    pub name: String,
    pub country: String,
    pub tuition_usd: u64,
    pub image_url: String,
    pub institution_type: Option<String>,
    pub tags: Vec<String>,
    pub global_rank: Option<u32>,
    pub acceptance_rate_percent: Option<f64>,
    pub category: CategoryDto,
    pub locked: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct UniversityDetailsDto {
    pub university: UniversityCardDto,
    pub fit_rationale: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct TaskDto {
    pub id: String,
    pub label: String,
    pub status: TaskStatusDto,
    pub deadline: String,
    /// Set on tasks that can be drafted with AI.
    pub ai_action: Option<String>,
}

impl From<&Task> for TaskDto {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            label: task.label.clone(),
            status: task.status.into(),
            deadline: task.deadline.clone(),
            ai_action: task.ai_action().map(|_| "SOP".to_string()),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ChatMessageDto {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct DraftDto {
    pub open: bool,
    pub generating: bool,
    pub text: Option<String>,
}

/// Everything a client needs to render its session.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub view: ViewDto,
    pub auth_name: String,
    pub profile: Option<ProfileDto>,
    pub onboarding: OnboardingDto,
    pub analysis: Option<AnalysisDto>,
    pub catalog_loading: bool,
    pub universities: Vec<UniversityCardDto>,
    pub shortlist: Vec<u32>,
    pub details: Option<UniversityDetailsDto>,
    pub tasks: Vec<TaskDto>,
    pub progress: u8,
    pub chat: Vec<ChatMessageDto>,
    pub typing: bool,
    pub draft: DraftDto,
    pub lead_university: String,
}

fn owned(options: &[&str]) -> Vec<String> {
    options.iter().map(|o| o.to_string()).collect()
}

fn card(funnel: &FunnelController, university: &University) -> UniversityCardDto {
    UniversityCardDto {
        id: university.id,
        name: university.name.clone(),
        country: university.country.clone(),
        tuition_usd: university.tuition_usd,
        image_url: university.image_url.clone(),
        institution_type: university.institution_type.clone(),
        tags: university.tags.clone(),
        global_rank: university.global_rank,
        acceptance_rate_percent: university.acceptance_rate_percent,
        category: funnel.category(university).into(),
        locked: funnel.is_locked(university.id),
    }
}

impl SessionSnapshot {
    pub fn capture(session_id: Uuid, funnel: &FunnelController) -> Self {
        let wizard = funnel.wizard();
        let onboarding = OnboardingDto {
            step: wizard.step(),
            can_advance: wizard.can_advance(),
            target_degree: wizard.target_degree.clone(),
            gpa: wizard.gpa,
            target_course: wizard.target_course.clone(),
            tests: wizard
                .tests
                .iter()
                .map(|t| TestScoreDto { name: t.name.clone(), score: t.score.clone() })
                .collect(),
            pending_test: TestScoreDto {
                name: wizard.pending_test.name.clone(),
                score: wizard.pending_test.score.clone(),
            },
            currency: wizard.currency.clone(),
            budget_input: wizard.budget_input.clone(),
            languages: wizard.languages.clone(),
            target_country: wizard.target_country.clone(),
            test_options: owned(&profile::TEST_OPTIONS),
            language_options: owned(&profile::LANGUAGE_OPTIONS),
            country_options: std::iter::once(profile::NO_PREFERENCE)
                .chain(profile::COUNTRY_OPTIONS)
                .map(str::to_string)
                .collect(),
        };

        let analysis = funnel.analysis().map(|analysis| AnalysisDto {
            loading: analysis.loading,
            countries: analysis
                .countries
                .iter()
                .map(|c| CountryDto {
                    country: c.country.clone(),
                    match_percent: c.match_percent,
                    tier: c.tier.to_string(),
                    rationale: c.rationale.clone(),
                })
                .collect(),
            recommendation: analysis.report.recommendation,
            action_items: analysis.report.action_items,
        });

        let draft = funnel.draft();

        Self {
            session_id,
            view: funnel.current_view().into(),
            auth_name: funnel.auth_name().to_string(),
            profile: funnel.profile().map(ProfileDto::from),
            onboarding,
            analysis,
            catalog_loading: funnel.catalog_loading(),
            universities: funnel.universities().iter().map(|u| card(funnel, u)).collect(),
            shortlist: funnel.shortlist().to_vec(),
            details: funnel.details().map(|u| UniversityDetailsDto {
                university: card(funnel, u),
                fit_rationale: scoring::fit_rationale(u),
            }),
            tasks: funnel.tasks().tasks().iter().map(TaskDto::from).collect(),
            progress: funnel.tasks().progress(),
            chat: funnel
                .chat_history()
                .iter()
                .map(|m| ChatMessageDto {
                    role: match m.role {
                        ChatRole::User => "user".to_string(),
                        ChatRole::Assistant => "assistant".to_string(),
                    },
                    content: m.content.clone(),
                })
                .collect(),
            typing: funnel.is_typing(),
            draft: DraftDto {
                open: draft.open,
                generating: draft.generating,
                text: funnel.draft_text().map(str::to_string),
            },
            lead_university: funnel.lead_university_name().to_string(),
        }
    }
}
