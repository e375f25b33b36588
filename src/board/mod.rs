//! The action board: task state, completion feedback, activation routing and
//! the AI prioritization workflow.
//!
//! [`Board`] is driven from a single thread. Mutations are synchronous; the
//! only asynchronous work is the AI call, which runs on a worker thread and is
//! folded back in by [`Board::poll`]. Side effects the caller must carry out
//! (sounds, confetti, notifications) are queued as [`Effect`]s.

mod feedback;
mod models;
mod prioritize;
mod tasks;

pub use feedback::{CompletionFeedback, Edge, is_fully_complete, progress_percent};
pub use models::*;
pub use prioritize::{AiState, Outcome, eligible_labels};
pub use tasks::TaskStore;

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::ai::{self, AiError, Prioritizer};
use crate::store::{self, KeyValue, Persister};
use prioritize::Workflow;

/// What an activation request turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Unknown task, already completed, or request already in flight.
    Ignored,
    Completed,
    /// The caller should show the single-action view for this task.
    Navigate(TaskId),
    /// An AI request was started.
    Prioritizing,
    /// Nothing was eligible; the AI task completed without a request.
    NothingToPrioritize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Play(SoundTrigger),
    Celebrate,
    ClearCelebration,
    Notice(Notice),
    /// A prioritization report is available via [`Board::report`].
    ReportReady,
}

pub struct Board {
    tasks: TaskStore,
    feedback: CompletionFeedback,
    workflow: Workflow,
    prioritizer: Arc<dyn Prioritizer>,
    results_tx: mpsc::Sender<Outcome>,
    results_rx: mpsc::Receiver<Outcome>,
    pending_handoff: Option<TaskId>,
    report: Option<PrioritizationReport>,
    sound_preferences: SoundPreferences,
    effects: Vec<Effect>,
}

impl Board {
    /// Restore saved state from `kv`, then hand `kv` to the background writer.
    pub fn open<K>(kv: K, defaults: DefaultTasks, prioritizer: Arc<dyn Prioritizer>) -> Self
    where
        K: KeyValue + Send + 'static,
    {
        let saved = store::load_tasks(&kv);
        let sound_preferences = store::load_sound_preferences(&kv);
        let tasks = TaskStore::restore(saved, defaults, Persister::spawn(kv));

        let feedback = CompletionFeedback::new(tasks.tasks());
        let (results_tx, results_rx) = mpsc::channel();
        Board {
            tasks,
            feedback,
            workflow: Workflow::default(),
            prioritizer,
            results_tx,
            results_rx,
            pending_handoff: None,
            report: None,
            sound_preferences,
            effects: Vec::new(),
        }
    }

    // ── Derived views ──

    pub fn tasks(&self) -> &TaskCollection {
        self.tasks.tasks()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn progress_percent(&self) -> u16 {
        progress_percent(self.tasks())
    }

    pub fn is_fully_complete(&self) -> bool {
        self.feedback.is_complete()
    }

    pub fn ai_state(&self, id: TaskId) -> &AiState {
        self.workflow.state(id)
    }

    /// Whether the task is waiting on the AI service and must not be activated.
    pub fn is_busy(&self, id: TaskId) -> bool {
        self.workflow.is_requesting(id)
    }

    pub fn report(&self) -> Option<&PrioritizationReport> {
        self.report.as_ref()
    }

    pub fn dismiss_report(&mut self) {
        self.report = None;
    }

    pub fn sound_preferences(&self) -> &SoundPreferences {
        &self.sound_preferences
    }

    pub fn set_sound(&mut self, trigger: SoundTrigger, sound_id: &str) {
        self.sound_preferences.set(trigger, sound_id);
        self.tasks
            .persister()
            .save_sound_preferences(&self.sound_preferences);
    }

    pub fn clear_sound(&mut self, trigger: SoundTrigger) {
        self.sound_preferences.clear(trigger);
        self.tasks
            .persister()
            .save_sound_preferences(&self.sound_preferences);
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    // ── Commands ──

    pub fn activate(&mut self, id: TaskId) -> Activation {
        let Some(task) = self.tasks.get(id) else {
            tracing::debug!(task_id = id, "activation ignored: unknown task");
            return Activation::Ignored;
        };
        if task.completed {
            tracing::debug!(task_id = id, "activation ignored: already completed");
            return Activation::Ignored;
        }

        let behavior = task.behavior;

        match behavior {
            Behavior::Toggle => {
                self.tasks.complete(id);
                self.effects.push(Effect::Play(SoundTrigger::Checkbox));
                self.observe_completion();
                Activation::Completed
            }
            Behavior::NavigateAndComplete => {
                self.effects.push(Effect::Play(SoundTrigger::Trigger));
                Activation::Navigate(id)
            }
            Behavior::AiPrioritize => self.start_prioritization(id),
        }
    }

    /// Completion reported back by the single-action view. Takes effect on the
    /// next [`Board::consume_handoff`].
    pub fn signal_completed(&mut self, id: TaskId) {
        self.pending_handoff = Some(id);
    }

    /// Process and clear the pending completion signal. Returns `true` if a
    /// task was completed; replayed or unknown signals are absorbed.
    pub fn consume_handoff(&mut self) -> bool {
        let Some(id) = self.pending_handoff.take() else {
            return false;
        };
        let navigates = self
            .tasks
            .get(id)
            .is_some_and(|t| t.behavior == Behavior::NavigateAndComplete);
        if !navigates {
            tracing::debug!(task_id = id, "handoff ignored: not a navigation task");
            return false;
        }
        let changed = self.tasks.complete(id);
        if changed {
            self.observe_completion();
        }
        changed
    }

    /// Return every task to incomplete. Abandons in-flight AI requests and
    /// drops any pending handoff or report.
    pub fn reset(&mut self) {
        self.workflow.abandon_all();
        self.pending_handoff = None;
        self.report = None;
        self.tasks.reset();
        self.observe_completion();
    }

    /// Fold in any AI results that have arrived. Never blocks.
    pub fn poll(&mut self) {
        while let Ok(outcome) = self.results_rx.try_recv() {
            self.apply_outcome(outcome);
        }
    }

    /// Block until no AI request is in flight or `timeout` elapses. Returns
    /// `true` if everything settled.
    pub fn wait_for_ai(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.workflow.any_requesting() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results_rx.recv_timeout(remaining) {
                Ok(outcome) => self.apply_outcome(outcome),
                Err(_) => return false,
            }
        }
        true
    }

    /// Wait for queued persistence writes to land.
    pub fn flush(&self) {
        self.tasks.persister().flush();
    }

    // ── Internals ──

    fn start_prioritization(&mut self, id: TaskId) -> Activation {
        if self.workflow.is_requesting(id) {
            tracing::debug!(task_id = id, "prioritization already in flight");
            return Activation::Ignored;
        }

        let request = eligible_labels(self.tasks());
        if request.is_empty() {
            self.workflow.succeed(id);
            self.tasks.complete(id);
            self.notify(NoticeLevel::Info, "Nothing to prioritize");
            self.observe_completion();
            return Activation::NothingToPrioritize;
        }

        let Some(ticket) = self.workflow.begin(id) else {
            return Activation::Ignored;
        };
        tracing::info!(task_id = id, ticket, count = request.len(), "requesting prioritization");
        self.effects.push(Effect::Play(SoundTrigger::Trigger));

        let prioritizer = Arc::clone(&self.prioritizer);
        let tx = self.results_tx.clone();
        thread::spawn(move || {
            // A panicking client still has to settle the request.
            let result = panic::catch_unwind(AssertUnwindSafe(|| prioritizer.prioritize(&request)))
                .unwrap_or_else(|_| Err(AiError::Request("AI client panicked".to_string())));
            // The board may be gone; nothing to do then.
            let _ = tx.send(Outcome {
                task_id: id,
                ticket,
                request,
                result,
            });
        });
        Activation::Prioritizing
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        let Outcome {
            task_id,
            ticket,
            request,
            result,
        } = outcome;

        if self.tasks.get(task_id).is_none() || !self.workflow.is_current(task_id, ticket) {
            tracing::debug!(task_id, ticket, "discarding stale prioritization result");
            return;
        }

        match result.and_then(|r| ai::validate(&request, r)) {
            Ok(prioritized) => {
                tracing::info!(task_id, "prioritization succeeded");
                self.workflow.succeed(task_id);
                self.report = Some(PrioritizationReport {
                    ordered_labels: prioritized.prioritized_tasks,
                    reasoning: prioritized.reasoning,
                    generated_at: Utc::now(),
                });
                self.tasks.complete(task_id);
                self.effects.push(Effect::ReportReady);
                self.observe_completion();
            }
            Err(e) => {
                tracing::warn!(task_id, "prioritization failed: {e}");
                // The AI task is only completed on success, so failing leaves
                // it incomplete and retryable.
                self.workflow.fail(task_id, e.to_string());
                self.notify(NoticeLevel::Error, &e.user_message());
            }
        }
    }

    fn observe_completion(&mut self) {
        match self.feedback.observe(self.tasks.tasks()) {
            Some(Edge::Rising) => {
                tracing::info!("all tasks complete");
                self.effects.push(Effect::Celebrate);
                self.effects.push(Effect::Play(SoundTrigger::Celebration));
            }
            Some(Edge::Falling) => self.effects.push(Effect::ClearCelebration),
            None => {}
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.effects.push(Effect::Notice(Notice {
            level,
            message: message.to_string(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::ai::PrioritizedTasks;
    use crate::store::Store;

    const WAIT: Duration = Duration::from_secs(5);

    /// Replies with a fixed result and counts calls.
    struct Scripted {
        reply: Result<PrioritizedTasks, String>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(order: &[&str], reasoning: &str) -> Arc<Self> {
            Arc::new(Scripted {
                reply: Ok(PrioritizedTasks {
                    prioritized_tasks: order.iter().map(ToString::to_string).collect(),
                    reasoning: reasoning.to_string(),
                }),
                calls: AtomicUsize::new(0),
            })
        }

        fn err(message: &str) -> Arc<Self> {
            Arc::new(Scripted {
                reply: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Prioritizer for Scripted {
        fn prioritize(&self, _tasks: &[String]) -> Result<PrioritizedTasks, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(AiError::Request)
        }
    }

    /// Holds every request until released.
    struct Gated {
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Prioritizer for Gated {
        fn prioritize(&self, tasks: &[String]) -> Result<PrioritizedTasks, AiError> {
            let _ = self.release.lock().unwrap().recv();
            Ok(PrioritizedTasks {
                prioritized_tasks: tasks.iter().rev().cloned().collect(),
                reasoning: "reversed".into(),
            })
        }
    }

    struct Panicking;

    impl Prioritizer for Panicking {
        fn prioritize(&self, _tasks: &[String]) -> Result<PrioritizedTasks, AiError> {
            panic!("client blew up");
        }
    }

    fn ab_board(prioritizer: Arc<dyn Prioritizer>) -> Board {
        let defaults = DefaultTasks::new(vec![
            Task::new(1, "A", ControlKind::Checkbox, Behavior::Toggle),
            Task::new(2, "B", ControlKind::Checkbox, Behavior::Toggle),
            Task::new(3, "Prioritize", ControlKind::Triggerable, Behavior::AiPrioritize),
        ])
        .unwrap();
        Board::open(Store::open_in_memory().unwrap(), defaults, prioritizer)
    }

    fn builtin_board() -> Board {
        Board::open(
            Store::open_in_memory().unwrap(),
            DefaultTasks::builtin(),
            Scripted::ok(&[], ""),
        )
    }

    fn celebrations(effects: &[Effect]) -> usize {
        effects.iter().filter(|e| **e == Effect::Celebrate).count()
    }

    #[test]
    fn toggle_completes_and_plays_checkbox() {
        let mut board = builtin_board();
        assert_eq!(board.activate(1), Activation::Completed);
        assert!(board.task(1).unwrap().completed);
        assert_eq!(
            board.drain_effects(),
            vec![Effect::Play(SoundTrigger::Checkbox)]
        );
    }

    #[test]
    fn activating_completed_or_unknown_is_noop() {
        let mut board = builtin_board();
        board.activate(1);
        board.drain_effects();

        assert_eq!(board.activate(1), Activation::Ignored);
        assert_eq!(board.activate(42), Activation::Ignored);
        assert!(board.drain_effects().is_empty());
    }

    #[test]
    fn navigation_waits_for_handoff() {
        let mut board = builtin_board();
        assert_eq!(board.activate(4), Activation::Navigate(4));
        assert!(!board.task(4).unwrap().completed);

        board.signal_completed(4);
        assert!(board.consume_handoff());
        assert!(board.task(4).unwrap().completed);
    }

    #[test]
    fn handoff_is_consumed_once() {
        let mut board = builtin_board();
        board.signal_completed(4);
        assert!(board.consume_handoff());
        // Re-observing the same navigation state does nothing.
        assert!(!board.consume_handoff());

        // A replayed signal for a completed task is absorbed.
        board.signal_completed(4);
        assert!(!board.consume_handoff());
    }

    #[test]
    fn handoff_ignores_unknown_and_non_navigation_tasks() {
        let mut board = builtin_board();
        board.signal_completed(99);
        assert!(!board.consume_handoff());
        board.signal_completed(1);
        assert!(!board.consume_handoff());
        assert!(!board.task(1).unwrap().completed);
    }

    #[test]
    fn progress_never_decreases_until_reset() {
        let mut board = builtin_board();
        let mut last = board.progress_percent();
        for id in [2, 2, 1, 99, 4] {
            if board.activate(id) == Activation::Navigate(id) {
                board.signal_completed(id);
                board.consume_handoff();
            }
            let now = board.progress_percent();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 75);
        board.reset();
        assert_eq!(board.progress_percent(), 0);
    }

    #[test]
    fn celebration_fires_once_per_rising_edge() {
        let mut board = ab_board(Scripted::ok(&[], ""));
        board.activate(1);
        board.activate(2);
        // Nothing left for the AI: completes without a request.
        assert_eq!(board.activate(3), Activation::NothingToPrioritize);
        let effects = board.drain_effects();
        assert_eq!(celebrations(&effects), 1);
        assert!(board.is_fully_complete());

        // Repeated observation does not re-fire.
        board.activate(1);
        board.poll();
        assert_eq!(celebrations(&board.drain_effects()), 0);

        board.reset();
        let effects = board.drain_effects();
        assert!(effects.contains(&Effect::ClearCelebration));
        assert_eq!(celebrations(&effects), 0);

        board.activate(1);
        board.activate(2);
        board.activate(3);
        assert_eq!(celebrations(&board.drain_effects()), 1);
    }

    #[test]
    fn no_celebration_when_loaded_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.db");
        let open = || {
            let store = Store::open_at(&path).unwrap();
            store.migrate().unwrap();
            Board::open(store, DefaultTasks::builtin(), Scripted::ok(&[], ""))
        };

        let mut board = open();
        board.activate(1);
        board.activate(2);
        board.activate(4);
        board.signal_completed(4);
        board.consume_handoff();
        board.flush();
        drop(board);

        // Only the AI task remains; complete it with nothing eligible.
        let mut board = open();
        assert!(!board.is_fully_complete());
        board.activate(3);
        assert_eq!(celebrations(&board.drain_effects()), 1);
        board.flush();
        drop(board);

        let mut board = open();
        assert!(board.is_fully_complete());
        board.poll();
        assert!(board.drain_effects().is_empty());
    }

    #[test]
    fn prioritization_success_is_advisory() {
        let ai = Scripted::ok(&["B", "A"], "B is more urgent");
        let mut board = ab_board(ai.clone());

        assert_eq!(board.activate(3), Activation::Prioritizing);
        assert!(board.is_busy(3));
        assert!(board.wait_for_ai(WAIT));

        assert!(board.task(3).unwrap().completed);
        assert_eq!(board.ai_state(3), &AiState::Succeeded);
        let report = board.report().unwrap();
        assert_eq!(report.ordered_labels, vec!["B", "A"]);
        assert_eq!(report.reasoning, "B is more urgent");

        let labels: Vec<&str> = board.tasks().iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "Prioritize"]);
        assert!(board.drain_effects().contains(&Effect::ReportReady));
        assert_eq!(ai.calls.load(Ordering::SeqCst), 1);

        board.dismiss_report();
        assert!(board.report().is_none());
    }

    #[test]
    fn prioritization_with_nothing_eligible_skips_service() {
        let ai = Scripted::ok(&["A"], "unused");
        let mut board = ab_board(ai.clone());
        board.activate(1);
        board.activate(2);
        board.drain_effects();

        assert_eq!(board.activate(3), Activation::NothingToPrioritize);
        assert!(board.task(3).unwrap().completed);
        assert_eq!(ai.calls.load(Ordering::SeqCst), 0);
        assert!(board.report().is_none());

        let effects = board.drain_effects();
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notice(Notice {
                level: NoticeLevel::Info,
                ..
            })
        )));
        assert!(
            !effects
                .iter()
                .any(|e| matches!(e, Effect::Notice(n) if n.level == NoticeLevel::Error))
        );
    }

    #[test]
    fn prioritization_failure_rolls_back() {
        let mut board = ab_board(Scripted::err("connection refused"));
        board.activate(3);
        assert!(board.wait_for_ai(WAIT));

        assert!(!board.task(3).unwrap().completed);
        assert!(board.report().is_none());
        assert!(matches!(board.ai_state(3), AiState::Failed { .. }));
        let errors: Vec<Effect> = board
            .drain_effects()
            .into_iter()
            .filter(|e| matches!(e, Effect::Notice(n) if n.level == NoticeLevel::Error))
            .collect();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn failed_prioritization_can_be_retried() {
        let mut board = ab_board(Scripted::err("timeout"));
        board.activate(3);
        board.wait_for_ai(WAIT);
        assert_eq!(board.activate(3), Activation::Prioritizing);
        board.wait_for_ai(WAIT);
    }

    #[test]
    fn panicking_client_leaves_task_retryable() {
        let mut board = ab_board(Arc::new(Panicking));
        assert_eq!(board.activate(3), Activation::Prioritizing);
        assert!(board.wait_for_ai(WAIT));

        assert!(matches!(board.ai_state(3), AiState::Failed { .. }));
        assert!(!board.is_busy(3));
        assert!(!board.task(3).unwrap().completed);
        assert_eq!(board.activate(3), Activation::Prioritizing);
        assert!(board.wait_for_ai(WAIT));
    }

    #[test]
    fn malformed_response_is_a_failure() {
        // Invents a label that was never requested.
        let mut board = ab_board(Scripted::ok(&["A", "C"], "??"));
        board.activate(3);
        board.wait_for_ai(WAIT);
        assert!(!board.task(3).unwrap().completed);
        assert!(board.report().is_none());
    }

    #[test]
    fn reactivation_while_requesting_is_ignored() {
        let (release, gate) = mpsc::channel();
        let mut board = ab_board(Arc::new(Gated {
            release: Mutex::new(gate),
        }));

        assert_eq!(board.activate(3), Activation::Prioritizing);
        assert_eq!(board.activate(3), Activation::Ignored);

        release.send(()).unwrap();
        assert!(board.wait_for_ai(WAIT));
        assert!(board.task(3).unwrap().completed);
    }

    #[test]
    fn reset_abandons_in_flight_request() {
        let (release, gate) = mpsc::channel();
        let mut board = ab_board(Arc::new(Gated {
            release: Mutex::new(gate),
        }));

        board.activate(1);
        board.activate(3);
        board.reset();
        assert!(board.tasks().iter().all(|t| !t.completed));
        assert_eq!(board.ai_state(3), &AiState::Idle);

        // The late answer must not complete the fresh board.
        release.send(()).unwrap();
        let late = board.results_rx.recv_timeout(WAIT).unwrap();
        board.apply_outcome(late);
        assert!(!board.task(3).unwrap().completed);
        assert!(board.report().is_none());
    }

    #[test]
    fn sound_preferences_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.db");
        let store = Store::open_at(&path).unwrap();
        store.migrate().unwrap();

        let mut board = Board::open(store, DefaultTasks::builtin(), Scripted::ok(&[], ""));
        board.set_sound(SoundTrigger::Celebration, "fanfare.wav");
        board.flush();

        let reopened = Board::open(
            Store::open_at(&path).unwrap(),
            DefaultTasks::builtin(),
            Scripted::ok(&[], ""),
        );
        assert_eq!(
            reopened.sound_preferences().get(SoundTrigger::Celebration),
            Some("fanfare.wav")
        );
        assert!(reopened.tasks().iter().all(|t| !t.completed));
    }
}
