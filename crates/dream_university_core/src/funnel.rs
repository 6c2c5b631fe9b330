//! crates/dream_university_core/src/funnel.rs
//!
//! The top-level state machine for one session.
//!
//! The controller never performs I/O. Every user action and every completed
//! external call is a [`FunnelEvent`]; handling one mutates the session and
//! returns the [`Effect`]s the owner must run. Effects settle later as further
//! events, so navigation is never blocked by an outstanding call.
//!
//! Every event is defined from every state: an event that makes no sense
//! where the session currently is simply does nothing.

use std::time::Duration;

use tracing::{debug, info};

use crate::domain::{
    AiAction, ChatMessage, CountryRecommendation, GeneratedDocument, MatchCategory, Profile,
    TaskStatus, University, View,
};
use crate::fallback;
use crate::profile::{self, OnboardingWizard, ProfileStore};
use crate::scoring::{self, AnalysisReport};
use crate::tasks::{TaskBoard, FINALIZE_SELECTION_TASK};

/// Shown on the success screen when nothing is shortlisted.
pub const DEFAULT_UNIVERSITY_NAME: &str = "Dream University";

/// Simulated latency of the analysis screen.
pub const ANALYSIS_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunnelSettings {
    pub analysis_delay: Duration,
}

impl Default for FunnelSettings {
    fn default() -> Self {
        Self { analysis_delay: ANALYSIS_DELAY }
    }
}

//=========================================================================================
// Events and Effects
//=========================================================================================

/// Canned counsellor prompts offered next to the chat input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickPrompt {
    DraftEmail,
    VisaHelp,
}

impl QuickPrompt {
    pub fn text(self) -> &'static str {
        match self {
            QuickPrompt::DraftEmail => "Draft email to professor",
            QuickPrompt::VisaHelp => "Visa requirements",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunnelEvent {
    // --- Landing and sign-in ---
    Start,
    /// A keystroke in the name field; the whole candidate value.
    NameInput(String),
    SubmitAuth { email: String },

    // --- Onboarding ---
    SetDegree(String),
    SetGpa(f64),
    SetCourse(String),
    SelectTest(String),
    EnterScore(String),
    AddTest,
    SetCurrency(String),
    SetBudgetInput(String),
    ToggleLanguage(String),
    SelectCountry(Option<String>),
    NextStep,

    // --- Analysis ---
    AnalysisReady { round: u64 },
    CatalogLoaded(Vec<University>),
    ContinueToDashboard,

    // --- Dashboard and roadmap ---
    OpenDashboard,
    OpenApplication,
    ToggleShortlist(u32),
    ShowDetails(u32),
    HideDetails,
    SetTaskStatus { task_id: String, status: TaskStatus },

    // --- Counsellor ---
    SendChat(String),
    QuickPrompt(QuickPrompt),
    ChatReplied(String),

    // --- Drafting ---
    RequestDraft,
    DraftSettled { generation: u64, text: String },
    CloseDraft,
    AcceptDraft,

    /// Brand/logo: back to the landing view, nothing torn down.
    Reset,
}

/// External work requested by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Load the catalog and report it as [`FunnelEvent::CatalogLoaded`].
    FetchCatalog,
    /// Emit [`FunnelEvent::AnalysisReady`] after `delay`.
    RevealAnalysis { round: u64, delay: Duration },
    /// Ask the counsellor and report [`FunnelEvent::ChatReplied`].
    AskCounsellor { profile: Profile, text: String },
    /// Draft a statement and report [`FunnelEvent::DraftSettled`].
    /// Any earlier draft still running is superseded and should be cancelled.
    DraftDocument { generation: u64, profile: Profile },
}

//=========================================================================================
// Session state
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftState {
    pub open: bool,
    pub generating: bool,
    pub generation: u64,
    pub document: Option<GeneratedDocument>,
}

/// The analysis screen's content. Recomputed from the profile on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub loading: bool,
    pub countries: Vec<CountryRecommendation>,
    pub report: AnalysisReport,
}

#[derive(Debug, Clone)]
pub struct FunnelController {
    settings: FunnelSettings,
    view: View,
    auth_name: String,
    profile: Option<Profile>,
    wizard: OnboardingWizard,
    analysis_round: u64,
    analysis_loading: bool,
    universities: Vec<University>,
    catalog_loading: bool,
    shortlist: Vec<u32>,
    details: Option<u32>,
    tasks: TaskBoard,
    chat: Vec<ChatMessage>,
    pending_replies: usize,
    draft: DraftState,
}

impl Default for FunnelController {
    fn default() -> Self {
        Self::new(FunnelSettings::default())
    }
}

impl FunnelController {
    pub fn new(settings: FunnelSettings) -> Self {
        Self {
            settings,
            view: View::Landing,
            auth_name: String::new(),
            profile: None,
            wizard: OnboardingWizard::default(),
            analysis_round: 0,
            analysis_loading: false,
            universities: Vec::new(),
            catalog_loading: false,
            shortlist: Vec::new(),
            details: None,
            tasks: TaskBoard::seeded(),
            chat: Vec::new(),
            pending_replies: 0,
            draft: DraftState::default(),
        }
    }

    /// Applies one event and returns the external work it requires.
    ///
    /// Once the roadmap is complete the funnel is finished: every event is
    /// ignored until the session is replaced.
    pub fn handle(&mut self, event: FunnelEvent) -> Vec<Effect> {
        if self.current_view() == View::Success {
            debug!("Roadmap complete, ignoring further events.");
            return Vec::new();
        }
        match event {
            FunnelEvent::Start => {
                if self.view == View::Landing {
                    self.view = View::Auth;
                }
                Vec::new()
            }
            FunnelEvent::NameInput(candidate) => {
                if self.view == View::Auth && profile::is_acceptable_name(&candidate) {
                    self.auth_name = candidate;
                }
                Vec::new()
            }
            FunnelEvent::SubmitAuth { email } => {
                self.submit_auth(&email);
                Vec::new()
            }
            FunnelEvent::NextStep => self.next_step(),
            FunnelEvent::AnalysisReady { round } => {
                if round == self.analysis_round {
                    self.analysis_loading = false;
                }
                Vec::new()
            }
            FunnelEvent::CatalogLoaded(universities) => {
                self.universities = universities;
                self.catalog_loading = false;
                self.shortlist.retain(|id| self.universities.iter().any(|u| u.id == *id));
                Vec::new()
            }
            FunnelEvent::ContinueToDashboard => {
                if self.view == View::Analysis && !self.analysis_loading {
                    self.view = View::Dashboard;
                }
                Vec::new()
            }
            FunnelEvent::OpenDashboard => {
                if self.has_complete_profile() {
                    self.view = View::Dashboard;
                }
                Vec::new()
            }
            FunnelEvent::OpenApplication => {
                if self.has_complete_profile() && !self.shortlist.is_empty() {
                    self.view = View::Application;
                }
                Vec::new()
            }
            FunnelEvent::ToggleShortlist(id) => {
                self.toggle_shortlist(id);
                Vec::new()
            }
            FunnelEvent::ShowDetails(id) => {
                if self.universities.iter().any(|u| u.id == id) {
                    self.details = Some(id);
                }
                Vec::new()
            }
            FunnelEvent::HideDetails => {
                self.details = None;
                Vec::new()
            }
            FunnelEvent::SetTaskStatus { task_id, status } => {
                if !self.tasks.set_status(&task_id, status) {
                    debug!("Ignoring status change for unknown task {}.", task_id);
                }
                Vec::new()
            }
            FunnelEvent::SendChat(text) => self.send_chat(&text),
            FunnelEvent::QuickPrompt(prompt) => self.send_chat(prompt.text()),
            FunnelEvent::ChatReplied(text) => {
                self.pending_replies = self.pending_replies.saturating_sub(1);
                self.chat.push(ChatMessage::assistant(text));
                Vec::new()
            }
            FunnelEvent::RequestDraft => self.request_draft(),
            FunnelEvent::DraftSettled { generation, text } => {
                if generation == self.draft.generation && self.draft.generating {
                    self.draft.generating = false;
                    self.draft.document =
                        Some(GeneratedDocument { action: AiAction::StatementOfPurpose, text });
                } else {
                    debug!("Discarding superseded draft {}.", generation);
                }
                Vec::new()
            }
            FunnelEvent::CloseDraft => {
                self.draft.open = false;
                Vec::new()
            }
            FunnelEvent::AcceptDraft => {
                self.accept_draft();
                Vec::new()
            }
            FunnelEvent::Reset => {
                self.view = View::Landing;
                Vec::new()
            }
            onboarding_edit => {
                self.edit_onboarding(onboarding_edit);
                Vec::new()
            }
        }
    }

    fn submit_auth(&mut self, email: &str) {
        if self.view != View::Auth {
            return;
        }
        let profile = ProfileStore::create_placeholder(&self.auth_name, email);
        info!("Signed in as {}.", profile.name);
        if self.chat.is_empty() {
            self.chat.push(ChatMessage::assistant(fallback::greeting(&profile.name)));
        }
        self.profile = Some(profile);
        self.wizard = OnboardingWizard::default();
        self.view = View::Onboarding;
    }

    fn edit_onboarding(&mut self, event: FunnelEvent) {
        if self.view != View::Onboarding {
            return;
        }
        let wizard = &mut self.wizard;
        match event {
            FunnelEvent::SetDegree(degree) => wizard.target_degree = degree,
            FunnelEvent::SetGpa(gpa) => wizard.gpa = if gpa.is_finite() { gpa.max(0.0) } else { 0.0 },
            FunnelEvent::SetCourse(course) => wizard.target_course = course,
            FunnelEvent::SelectTest(name) => {
                if !wizard.select_test(&name) {
                    debug!("Ignoring unknown test {}.", name);
                }
            }
            FunnelEvent::EnterScore(score) => {
                wizard.set_pending_score(&score);
            }
            FunnelEvent::AddTest => {
                wizard.add_pending_test();
            }
            FunnelEvent::SetCurrency(currency) => wizard.currency = currency,
            FunnelEvent::SetBudgetInput(input) => wizard.budget_input = input,
            FunnelEvent::ToggleLanguage(language) => {
                if !wizard.toggle_language(&language) {
                    debug!("Ignoring unknown language {}.", language);
                }
            }
            FunnelEvent::SelectCountry(country) => {
                wizard.select_country(country);
            }
            other => debug!("Ignoring {:?} outside its view.", other),
        }
    }

    fn next_step(&mut self) -> Vec<Effect> {
        if self.view != View::Onboarding {
            return Vec::new();
        }
        if !self.wizard.is_last_step() {
            self.wizard.advance();
            return Vec::new();
        }
        let Some(current) = self.profile.as_ref() else {
            return Vec::new();
        };

        let completed = self.wizard.complete(current);
        info!(
            "Onboarding complete for {} (budget {} {}, GPA {}).",
            completed.name, completed.budget, completed.currency, completed.gpa
        );
        self.profile = Some(completed);
        self.view = View::Analysis;
        self.analysis_round += 1;
        self.analysis_loading = true;
        self.catalog_loading = true;

        vec![
            Effect::FetchCatalog,
            Effect::RevealAnalysis { round: self.analysis_round, delay: self.settings.analysis_delay },
        ]
    }

    fn toggle_shortlist(&mut self, id: u32) {
        if !self.has_complete_profile() || !self.universities.iter().any(|u| u.id == id) {
            return;
        }
        if let Some(pos) = self.shortlist.iter().position(|locked| *locked == id) {
            self.shortlist.remove(pos);
        } else {
            self.shortlist.push(id);
            self.tasks.set_status(FINALIZE_SELECTION_TASK, TaskStatus::Done);
        }
    }

    fn send_chat(&mut self, text: &str) -> Vec<Effect> {
        let Some(profile) = self.profile.as_ref() else {
            return Vec::new();
        };
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.chat.push(ChatMessage::user(text));
        self.pending_replies += 1;
        vec![Effect::AskCounsellor { profile: profile.clone(), text: text.to_string() }]
    }

    fn request_draft(&mut self) -> Vec<Effect> {
        let Some(profile) = self.profile.as_ref() else {
            return Vec::new();
        };
        self.draft.generation += 1;
        self.draft.open = true;
        self.draft.generating = true;
        self.draft.document = None;
        vec![Effect::DraftDocument { generation: self.draft.generation, profile: profile.clone() }]
    }

    fn accept_draft(&mut self) {
        if !self.draft.open || self.draft.generating {
            return;
        }
        let Some(action) = self.draft.document.as_ref().map(|d| d.action) else {
            return;
        };
        if let Some(task_id) = self.tasks.task_for_action(action).map(|t| t.id.clone()) {
            self.tasks.set_status(&task_id, TaskStatus::Done);
        }
        self.draft.open = false;
    }

    //=====================================================================================
    // Read side
    //=====================================================================================

    /// The view to present. A finished roadmap pre-empts the application view.
    pub fn current_view(&self) -> View {
        if self.view == View::Application && self.tasks.all_done() {
            View::Success
        } else {
            self.view
        }
    }

    fn has_complete_profile(&self) -> bool {
        self.profile.as_ref().is_some_and(Profile::is_complete)
    }

    pub fn auth_name(&self) -> &str {
        &self.auth_name
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn wizard(&self) -> &OnboardingWizard {
        &self.wizard
    }

    /// Ranked countries and report, only once a complete profile exists.
    pub fn analysis(&self) -> Option<Analysis> {
        let profile = self.profile.as_ref().filter(|p| p.is_complete())?;
        let countries = scoring::rank_countries(profile);
        let report = scoring::analysis_report(profile, &countries);
        Some(Analysis { loading: self.analysis_loading, countries, report })
    }

    pub fn universities(&self) -> &[University] {
        &self.universities
    }

    pub fn catalog_loading(&self) -> bool {
        self.catalog_loading
    }

    pub fn category(&self, university: &University) -> MatchCategory {
        let gpa = self.profile.as_ref().map(|p| p.gpa).unwrap_or(0.0);
        scoring::categorize(university, gpa)
    }

    pub fn is_locked(&self, id: u32) -> bool {
        self.shortlist.contains(&id)
    }

    /// Locked ids in the order they were locked.
    pub fn shortlist(&self) -> &[u32] {
        &self.shortlist
    }

    /// Locked universities in catalog order.
    pub fn locked_universities(&self) -> impl Iterator<Item = &University> {
        self.universities.iter().filter(|u| self.shortlist.contains(&u.id))
    }

    pub fn details(&self) -> Option<&University> {
        let id = self.details?;
        self.universities.iter().find(|u| u.id == id)
    }

    pub fn tasks(&self) -> &TaskBoard {
        &self.tasks
    }

    pub fn chat_history(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn is_typing(&self) -> bool {
        self.pending_replies > 0
    }

    pub fn draft(&self) -> &DraftState {
        &self.draft
    }

    /// Text available to copy once a draft has settled.
    pub fn draft_text(&self) -> Option<&str> {
        if self.draft.generating {
            return None;
        }
        self.draft.document.as_ref().map(|d| d.text.as_str())
    }

    /// The university the roadmap and success screen are about.
    pub fn lead_university_name(&self) -> &str {
        self.locked_universities()
            .next()
            .map(|u| u.name.as_str())
            .unwrap_or(DEFAULT_UNIVERSITY_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in() -> FunnelController {
        let mut funnel = FunnelController::default();
        funnel.handle(FunnelEvent::Start);
        funnel.handle(FunnelEvent::NameInput("Asha".into()));
        funnel.handle(FunnelEvent::SubmitAuth { email: "asha@example.com".into() });
        funnel
    }

    fn onboarded() -> (FunnelController, Vec<Effect>) {
        let mut funnel = signed_in();
        funnel.handle(FunnelEvent::SetGpa(3.9));
        funnel.handle(FunnelEvent::SetCourse("Computer Science".into()));
        for _ in 0..3 {
            funnel.handle(FunnelEvent::NextStep);
        }
        let effects = funnel.handle(FunnelEvent::NextStep);
        (funnel, effects)
    }

    fn catalog() -> Vec<University> {
        let mut list = fallback::fallback_catalog();
        list.truncate(3);
        list
    }

    fn at_dashboard() -> FunnelController {
        let (mut funnel, _) = onboarded();
        funnel.handle(FunnelEvent::CatalogLoaded(catalog()));
        funnel.handle(FunnelEvent::AnalysisReady { round: 1 });
        funnel.handle(FunnelEvent::ContinueToDashboard);
        funnel
    }

    #[test]
    fn name_keystrokes_with_digits_are_rejected() {
        let mut funnel = FunnelController::default();
        funnel.handle(FunnelEvent::Start);
        funnel.handle(FunnelEvent::NameInput("Asha".into()));
        funnel.handle(FunnelEvent::NameInput("Asha7".into()));
        assert_eq!(funnel.auth_name(), "Asha");
    }

    #[test]
    fn sign_in_creates_placeholder_and_greets() {
        let funnel = signed_in();
        assert_eq!(funnel.current_view(), View::Onboarding);
        let profile = funnel.profile().expect("profile created");
        assert!(!profile.is_complete());
        assert_eq!(funnel.chat_history().len(), 1);
        assert!(funnel.chat_history()[0].content.starts_with("Hello Asha."));
        assert!(funnel.analysis().is_none());
    }

    #[test]
    fn first_step_needs_gpa() {
        let mut funnel = signed_in();
        funnel.handle(FunnelEvent::NextStep);
        assert_eq!(funnel.wizard().step(), 1);
        funnel.handle(FunnelEvent::SetGpa(3.1));
        funnel.handle(FunnelEvent::NextStep);
        assert_eq!(funnel.wizard().step(), 2);
    }

    #[test]
    fn finishing_onboarding_fetches_catalog_and_starts_analysis() {
        let (funnel, effects) = onboarded();
        assert_eq!(funnel.current_view(), View::Analysis);
        assert!(funnel.profile().is_some_and(Profile::is_complete));
        assert_eq!(
            effects,
            vec![
                Effect::FetchCatalog,
                Effect::RevealAnalysis { round: 1, delay: ANALYSIS_DELAY },
            ]
        );
        let analysis = funnel.analysis().expect("analysis available");
        assert!(analysis.loading);
        assert_eq!(analysis.countries[0].country, "USA");
    }

    #[test]
    fn analysis_cannot_be_skipped_while_loading() {
        let (mut funnel, _) = onboarded();
        funnel.handle(FunnelEvent::ContinueToDashboard);
        assert_eq!(funnel.current_view(), View::Analysis);
        funnel.handle(FunnelEvent::AnalysisReady { round: 0 });
        funnel.handle(FunnelEvent::ContinueToDashboard);
        assert_eq!(funnel.current_view(), View::Analysis);
        funnel.handle(FunnelEvent::AnalysisReady { round: 1 });
        funnel.handle(FunnelEvent::ContinueToDashboard);
        assert_eq!(funnel.current_view(), View::Dashboard);
    }

    #[test]
    fn application_needs_a_shortlist() {
        let mut funnel = at_dashboard();
        funnel.handle(FunnelEvent::OpenApplication);
        assert_eq!(funnel.current_view(), View::Dashboard);

        funnel.handle(FunnelEvent::ToggleShortlist(2));
        funnel.handle(FunnelEvent::OpenApplication);
        assert_eq!(funnel.current_view(), View::Application);
        funnel.handle(FunnelEvent::OpenDashboard);
        assert_eq!(funnel.current_view(), View::Dashboard);
    }

    #[test]
    fn locking_finalizes_selection_and_unlocking_keeps_it() {
        let mut funnel = at_dashboard();
        assert_eq!(
            funnel.tasks().get(FINALIZE_SELECTION_TASK).map(|t| t.status),
            Some(TaskStatus::InProgress)
        );
        funnel.handle(FunnelEvent::ToggleShortlist(101));
        assert!(funnel.is_locked(101));
        assert_eq!(
            funnel.tasks().get(FINALIZE_SELECTION_TASK).map(|t| t.status),
            Some(TaskStatus::Done)
        );
        funnel.handle(FunnelEvent::ToggleShortlist(101));
        assert!(!funnel.is_locked(101));
        assert_eq!(
            funnel.tasks().get(FINALIZE_SELECTION_TASK).map(|t| t.status),
            Some(TaskStatus::Done)
        );
    }

    #[test]
    fn unknown_university_cannot_be_locked() {
        let mut funnel = at_dashboard();
        funnel.handle(FunnelEvent::ToggleShortlist(9_999));
        assert!(funnel.shortlist().is_empty());
    }

    #[test]
    fn lead_university_follows_catalog_order() {
        let mut funnel = at_dashboard();
        assert_eq!(funnel.lead_university_name(), DEFAULT_UNIVERSITY_NAME);
        funnel.handle(FunnelEvent::ToggleShortlist(2));
        funnel.handle(FunnelEvent::ToggleShortlist(1));
        assert_eq!(funnel.shortlist(), &[2, 1]);
        assert_eq!(funnel.lead_university_name(), "Stanford University");
    }

    #[test]
    fn completing_every_task_in_application_reaches_success() {
        let mut funnel = at_dashboard();
        funnel.handle(FunnelEvent::ToggleShortlist(1));
        funnel.handle(FunnelEvent::OpenApplication);
        for id in ["1", "4"] {
            funnel.handle(FunnelEvent::SetTaskStatus { task_id: id.into(), status: TaskStatus::Done });
        }
        assert_eq!(funnel.tasks().progress(), 100);
        assert_eq!(funnel.current_view(), View::Success);
        assert_eq!(funnel.lead_university_name(), "Stanford University");
    }

    #[test]
    fn success_only_pre_empts_the_application_view() {
        let mut funnel = at_dashboard();
        funnel.handle(FunnelEvent::ToggleShortlist(1));
        for id in ["1", "4"] {
            funnel.handle(FunnelEvent::SetTaskStatus { task_id: id.into(), status: TaskStatus::Done });
        }
        assert_eq!(funnel.current_view(), View::Dashboard);
        funnel.handle(FunnelEvent::OpenApplication);
        assert_eq!(funnel.current_view(), View::Success);
    }

    #[test]
    fn success_is_terminal() {
        let mut funnel = at_dashboard();
        funnel.handle(FunnelEvent::ToggleShortlist(2));
        funnel.handle(FunnelEvent::OpenApplication);
        for id in ["1", "4"] {
            funnel.handle(FunnelEvent::SetTaskStatus { task_id: id.into(), status: TaskStatus::Done });
        }
        assert_eq!(funnel.current_view(), View::Success);

        funnel.handle(FunnelEvent::OpenDashboard);
        funnel.handle(FunnelEvent::ToggleShortlist(2));
        funnel.handle(FunnelEvent::SetTaskStatus { task_id: "3".into(), status: TaskStatus::Todo });
        assert!(funnel.handle(FunnelEvent::RequestDraft).is_empty());
        funnel.handle(FunnelEvent::Reset);

        assert_eq!(funnel.current_view(), View::Success);
        assert_eq!(funnel.lead_university_name(), "University of Oxford");
        assert_eq!(funnel.tasks().progress(), 100);
        assert!(!funnel.draft().open);
    }

    #[test]
    fn details_only_open_for_catalog_entries() {
        let mut funnel = at_dashboard();
        funnel.handle(FunnelEvent::ShowDetails(9_999));
        assert!(funnel.details().is_none());

        funnel.handle(FunnelEvent::ShowDetails(101));
        assert_eq!(funnel.details().map(|u| u.name.as_str()), Some("Indian Institute of Technology (IIT) Bombay"));

        funnel.handle(FunnelEvent::HideDetails);
        assert!(funnel.details().is_none());
    }

    #[test]
    fn chat_records_turns_and_typing() {
        let mut funnel = signed_in();
        assert!(funnel.handle(FunnelEvent::SendChat("   ".into())).is_empty());

        let effects = funnel.handle(FunnelEvent::QuickPrompt(QuickPrompt::VisaHelp));
        assert!(matches!(
            effects.as_slice(),
            [Effect::AskCounsellor { text, .. }] if text == "Visa requirements"
        ));
        assert!(funnel.is_typing());

        funnel.handle(FunnelEvent::ChatReplied(fallback::OFFLINE_NOTICE.into()));
        assert!(!funnel.is_typing());
        let history = funnel.chat_history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1], ChatMessage::user("Visa requirements"));
        assert_eq!(history[2], ChatMessage::assistant("System Offline."));
    }

    #[test]
    fn chat_needs_a_profile() {
        let mut funnel = FunnelController::default();
        assert!(funnel.handle(FunnelEvent::SendChat("hello".into())).is_empty());
        assert!(funnel.chat_history().is_empty());
    }

    #[test]
    fn superseded_draft_is_discarded() {
        let mut funnel = at_dashboard();
        funnel.handle(FunnelEvent::RequestDraft);
        let effects = funnel.handle(FunnelEvent::RequestDraft);
        assert!(matches!(effects.as_slice(), [Effect::DraftDocument { generation: 2, .. }]));

        funnel.handle(FunnelEvent::DraftSettled { generation: 1, text: "old".into() });
        assert!(funnel.draft().generating);
        assert_eq!(funnel.draft_text(), None);

        funnel.handle(FunnelEvent::DraftSettled { generation: 2, text: "new".into() });
        assert!(!funnel.draft().generating);
        assert_eq!(funnel.draft_text(), Some("new"));
    }

    #[test]
    fn accepting_a_draft_completes_the_statement_task() {
        let mut funnel = at_dashboard();
        funnel.handle(FunnelEvent::AcceptDraft);
        assert_eq!(funnel.tasks().get("1").map(|t| t.status), Some(TaskStatus::Todo));

        funnel.handle(FunnelEvent::RequestDraft);
        funnel.handle(FunnelEvent::AcceptDraft);
        assert_eq!(funnel.tasks().get("1").map(|t| t.status), Some(TaskStatus::Todo));

        funnel.handle(FunnelEvent::DraftSettled { generation: 1, text: "SOP".into() });
        funnel.handle(FunnelEvent::AcceptDraft);
        assert_eq!(funnel.tasks().get("1").map(|t| t.status), Some(TaskStatus::Done));
        assert!(!funnel.draft().open);
    }

    #[test]
    fn reset_returns_to_landing_without_teardown() {
        let mut funnel = at_dashboard();
        funnel.handle(FunnelEvent::ToggleShortlist(1));
        funnel.handle(FunnelEvent::Reset);
        assert_eq!(funnel.current_view(), View::Landing);
        assert!(funnel.is_locked(1));
        assert!(funnel.profile().is_some());
    }

    #[test]
    fn onboarding_edits_outside_onboarding_are_ignored() {
        let mut funnel = at_dashboard();
        let before = funnel.wizard().clone();
        funnel.handle(FunnelEvent::SetGpa(1.0));
        funnel.handle(FunnelEvent::ToggleLanguage("French".into()));
        assert_eq!(funnel.wizard(), &before);
    }
}
