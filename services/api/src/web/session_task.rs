//! services/api/src/web/session_task.rs
//!
//! This module contains the long-running task that owns one session's
//! `FunnelController`.
//!
//! Client actions arrive over a command channel. Effects requested by the
//! controller are run as spawned tasks whose results come back through a
//! completion channel, tagged with the epoch they were started in. `Restart`
//! bumps the epoch and cancels everything still running, so late results from
//! a discarded session state are dropped instead of applied.

use crate::web::{
    protocol::{ClientAction, SessionSnapshot},
    state::{AppState, SessionHandle, SessionSettings},
};
use dream_university_core::{
    catalog, ports::CatalogService, Effect, FunnelController, FunnelEvent, ResilientClient,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

const COMMAND_BUFFER: usize = 32;

/// A request sent from a `SessionHandle` to its session task.
#[derive(Debug)]
pub enum SessionCommand {
    Apply { action: ClientAction, reply: oneshot::Sender<SessionSnapshot> },
    Snapshot { reply: oneshot::Sender<SessionSnapshot> },
}

/// The result of an effect, tagged with the epoch that started it.
struct Completion {
    epoch: u64,
    event: FunnelEvent,
}

/// Starts a new session task and returns the handle used to drive it.
pub fn spawn_session(app_state: &AppState) -> SessionHandle {
    let session_id = Uuid::new_v4();
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (completion_tx, completion_rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();

    let worker = SessionWorker {
        session_id,
        catalog: app_state.catalog.clone(),
        client: app_state.client.clone(),
        settings: app_state.settings,
        funnel: FunnelController::new(app_state.settings.funnel),
        epoch: 0,
        in_flight: shutdown.child_token(),
        shutdown: shutdown.clone(),
        draft_token: None,
        completions: completion_tx,
    };
    tokio::spawn(worker.run(command_rx, completion_rx));

    SessionHandle::new(session_id, command_tx, shutdown)
}

struct SessionWorker {
    session_id: Uuid,
    catalog: Arc<dyn CatalogService>,
    client: ResilientClient,
    settings: SessionSettings,
    funnel: FunnelController,
    epoch: u64,
    shutdown: CancellationToken,
    /// Parent of every effect started in the current epoch.
    in_flight: CancellationToken,
    draft_token: Option<CancellationToken>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl SessionWorker {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        info!("Session {} started.", self.session_id);
        let shutdown = self.shutdown.clone();
        let idle_timeout = self.settings.idle_timeout;
        let mut deadline = Instant::now() + idle_timeout;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Session {} closed by client.", self.session_id);
                    break;
                }
                _ = tokio::time::sleep_until(deadline) => {
                    info!("Session {} expired after {:?} idle.", self.session_id, idle_timeout);
                    break;
                }
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    deadline = Instant::now() + idle_timeout;
                    self.on_command(command);
                }
                Some(completion) = completions.recv() => self.on_completion(completion),
            }
        }

        self.in_flight.cancel();
    }

    fn on_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Apply { action, reply } => {
                debug!("Session {} applying {:?}.", self.session_id, action);
                match action.into_event() {
                    Some(event) => {
                        let effects = self.funnel.handle(event);
                        self.run_effects(effects);
                    }
                    None => self.restart(),
                }
                let _ = reply.send(self.snapshot());
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        if completion.epoch != self.epoch {
            debug!("Session {} dropped a result from before a restart.", self.session_id);
            return;
        }
        let effects = self.funnel.handle(completion.event);
        self.run_effects(effects);
    }

    fn restart(&mut self) {
        info!("Session {} restarting.", self.session_id);
        self.in_flight.cancel();
        self.in_flight = self.shutdown.child_token();
        self.draft_token = None;
        self.epoch += 1;
        self.funnel = FunnelController::new(self.settings.funnel);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(self.session_id, &self.funnel)
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchCatalog => {
                    let catalog = self.catalog.clone();
                    let timeout = self.settings.catalog_timeout;
                    self.spawn_effect(self.in_flight.clone(), async move {
                        let universities = catalog::load_universities(catalog.as_ref(), timeout).await;
                        FunnelEvent::CatalogLoaded(universities)
                    });
                }
                Effect::RevealAnalysis { round, delay } => {
                    self.spawn_effect(self.in_flight.clone(), async move {
                        tokio::time::sleep(delay).await;
                        FunnelEvent::AnalysisReady { round }
                    });
                }
                Effect::AskCounsellor { profile, text } => {
                    let client = self.client.clone();
                    self.spawn_effect(self.in_flight.clone(), async move {
                        FunnelEvent::ChatReplied(client.ask(&profile, &text).await)
                    });
                }
                Effect::DraftDocument { generation, profile } => {
                    if let Some(superseded) = self.draft_token.take() {
                        superseded.cancel();
                    }
                    let token = self.in_flight.child_token();
                    self.draft_token = Some(token.clone());
                    let client = self.client.clone();
                    self.spawn_effect(token, async move {
                        let text = client.draft_statement(&profile).await;
                        FunnelEvent::DraftSettled { generation, text }
                    });
                }
            }
        }
    }

    fn spawn_effect<F>(&self, token: CancellationToken, work: F)
    where
        F: Future<Output = FunnelEvent> + Send + 'static,
    {
        let completions = self.completions.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                event = work => {
                    let _ = completions.send(Completion { epoch, event });
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::protocol::{QuickPromptDto, ViewDto};
    use crate::web::state::SessionRegistry;
    use async_trait::async_trait;
    use dream_university_core::{
        ports::{CounsellorService, PortResult},
        FunnelSettings, ResilienceSettings, University,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeCatalog;

    #[async_trait]
    impl CatalogService for FakeCatalog {
        async fn fetch_universities(&self) -> PortResult<Vec<University>> {
            Ok(vec![University {
                id: 1,
                name: "University of Toronto".into(),
                country: "Canada".into(),
                tuition_usd: 45_000,
                image_url: String::new(),
                institution_type: None,
                tags: Vec::new(),
                global_rank: Some(21),
                acceptance_rate_percent: None,
            }])
        }
    }

    /// Answers after `delay`, counting every call.
    struct SlowCounsellor {
        delay: Duration,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CounsellorService for SlowCounsellor {
        async fn send_message(&self, _message: &str) -> PortResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok("Consider Canada.".to_string())
        }
    }

    /// The first draft takes 5 s, later ones 1 s. Records the drafts that ran to completion.
    #[derive(Default)]
    struct DraftingCounsellor {
        calls: AtomicUsize,
        finished: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CounsellorService for DraftingCounsellor {
        async fn send_message(&self, _message: &str) -> PortResult<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, text) = if call == 0 {
                (Duration::from_secs(5), "first draft")
            } else {
                (Duration::from_secs(1), "second draft")
            };
            tokio::time::sleep(delay).await;
            self.finished.lock().unwrap().push(text.to_string());
            Ok(text.to_string())
        }
    }

    fn app_state(counsellor: Arc<dyn CounsellorService>, idle_timeout: Duration) -> AppState {
        AppState {
            catalog: Arc::new(FakeCatalog),
            client: ResilientClient::new(counsellor, ResilienceSettings::default()),
            settings: SessionSettings {
                funnel: FunnelSettings { analysis_delay: Duration::from_secs(2) },
                catalog_timeout: Duration::from_secs(5),
                idle_timeout,
            },
            sessions: Arc::new(SessionRegistry::default()),
        }
    }

    fn counsellor(delay: Duration) -> Arc<SlowCounsellor> {
        Arc::new(SlowCounsellor { delay, calls: AtomicUsize::new(0) })
    }

    async fn sign_in(handle: &SessionHandle) {
        handle.apply(ClientAction::Start).await.expect("session alive");
        handle
            .apply(ClientAction::NameInput { value: "Asha".into() })
            .await
            .expect("session alive");
        handle
            .apply(ClientAction::SubmitAuth { email: "asha@example.com".into() })
            .await
            .expect("session alive");
    }

    #[tokio::test(start_paused = true)]
    async fn analysis_reveals_after_delay_with_loaded_catalog() {
        let state = app_state(counsellor(Duration::ZERO), Duration::from_secs(3600));
        let handle = spawn_session(&state);
        sign_in(&handle).await;

        let mut snapshot = None;
        for _ in 0..4 {
            snapshot = Some(handle.apply(ClientAction::NextStep).await.expect("session alive"));
        }
        let snapshot = snapshot.expect("four steps applied");
        assert_eq!(snapshot.view, ViewDto::Analysis);
        assert!(snapshot.analysis.as_ref().is_some_and(|a| a.loading));

        tokio::time::sleep(Duration::from_secs(3)).await;
        let snapshot = handle.snapshot().await.expect("session alive");
        let analysis = snapshot.analysis.expect("analysis present");
        assert!(!analysis.loading);
        assert!(!snapshot.catalog_loading);
        // Toronto plus the three guaranteed Indian entries.
        assert_eq!(snapshot.universities.len(), 4);
        assert_eq!(snapshot.universities[0].name, "University of Toronto");

        handle.apply(ClientAction::ContinueToDashboard).await.expect("session alive");
        let snapshot = handle
            .apply(ClientAction::ShowDetails { university_id: 1 })
            .await
            .expect("session alive");
        assert_eq!(snapshot.view, ViewDto::Dashboard);
        let details = snapshot.details.expect("details open");
        assert_eq!(details.university.name, "University of Toronto");
        assert_eq!(details.university.global_rank, Some(21));
        assert!(details.fit_rationale.contains("The location in Canada"));
        assert!(details.fit_rationale.contains("$45000"));

        let snapshot = handle.apply(ClientAction::HideDetails).await.expect("session alive");
        assert!(snapshot.details.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn retrying_a_draft_cancels_the_one_in_flight() {
        let drafting = Arc::new(DraftingCounsellor::default());
        let state = app_state(drafting.clone(), Duration::from_secs(3600));
        let handle = spawn_session(&state);
        sign_in(&handle).await;

        let snapshot = handle.apply(ClientAction::RequestDraft).await.expect("session alive");
        assert!(snapshot.draft.open && snapshot.draft.generating);
        tokio::time::sleep(Duration::from_millis(500)).await;
        handle.apply(ClientAction::RetryDraft).await.expect("session alive");

        tokio::time::sleep(Duration::from_secs(20)).await;
        let snapshot = handle.snapshot().await.expect("session alive");

        assert_eq!(drafting.calls.load(Ordering::SeqCst), 2);
        assert_eq!(*drafting.finished.lock().unwrap(), vec!["second draft".to_string()]);
        assert!(!snapshot.draft.generating);
        assert_eq!(snapshot.draft.text.as_deref(), Some("second draft"));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_discards_reply_still_in_flight() {
        let slow = counsellor(Duration::from_secs(5));
        let state = app_state(slow.clone(), Duration::from_secs(3600));
        let handle = spawn_session(&state);
        sign_in(&handle).await;

        let snapshot = handle
            .apply(ClientAction::SendChat { text: "Where should I study?".into() })
            .await
            .expect("session alive");
        assert!(snapshot.typing);

        let snapshot = handle.apply(ClientAction::Restart).await.expect("session alive");
        assert_eq!(snapshot.view, ViewDto::Landing);
        assert!(snapshot.profile.is_none());

        tokio::time::sleep(Duration::from_secs(10)).await;
        let snapshot = handle.snapshot().await.expect("session alive");
        assert!(!snapshot.typing);
        assert!(snapshot.chat.iter().all(|m| m.content != "Consider Canada."));
    }

    #[tokio::test(start_paused = true)]
    async fn chat_reply_arrives_after_counsellor_answers() {
        let slow = counsellor(Duration::from_secs(1));
        let state = app_state(slow.clone(), Duration::from_secs(3600));
        let handle = spawn_session(&state);
        sign_in(&handle).await;

        handle
            .apply(ClientAction::QuickPrompt { prompt: QuickPromptDto::VisaHelp })
            .await
            .expect("session alive");
        tokio::time::sleep(Duration::from_secs(2)).await;

        let snapshot = handle.snapshot().await.expect("session alive");
        assert!(!snapshot.typing);
        assert_eq!(snapshot.chat.last().map(|m| m.content.as_str()), Some("Consider Canada."));
        assert_eq!(slow.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_stops_and_rejects_commands() {
        let state = app_state(counsellor(Duration::ZERO), Duration::from_secs(60));
        let handle = spawn_session(&state);
        handle.snapshot().await.expect("session alive");

        tokio::time::sleep(Duration::from_secs(120)).await;

        assert!(handle.snapshot().await.is_err());
        assert!(handle.is_closed());

        state.sessions.insert(handle.clone()).await;
        assert_eq!(state.sessions.prune_closed().await, 1);
        assert_eq!(state.sessions.len().await, 0);
        assert!(handle.age() >= chrono::Duration::zero());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_session_rejects_commands() {
        let state = app_state(counsellor(Duration::ZERO), Duration::from_secs(3600));
        let handle = spawn_session(&state);
        handle.close();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(handle.apply(ClientAction::Start).await.is_err());
    }
}
