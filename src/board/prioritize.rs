//! Per-task state of the AI prioritization workflow.
//!
//! ```text
//! Idle ──begin──▶ Requesting{ticket} ──succeed──▶ Succeeded
//!   ▲                    │
//!   └──── begin ◀── Failed ◀──fail──┘
//! ```
//!
//! A result is only accepted for the ticket that is currently requesting;
//! anything else (a reset happened, the request was superseded) is stale.

use std::collections::HashMap;

use super::models::{Behavior, Task, TaskId};
use crate::ai::{AiError, PrioritizedTasks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiState {
    Idle,
    Requesting { ticket: u64 },
    Succeeded,
    Failed { message: String },
}

/// Result of one service call, sent back from the worker thread.
#[derive(Debug)]
pub struct Outcome {
    pub task_id: TaskId,
    pub ticket: u64,
    pub request: Vec<String>,
    pub result: Result<PrioritizedTasks, AiError>,
}

/// Labels the AI may reorder: incomplete tasks other than AI tasks, in board
/// order.
pub fn eligible_labels(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .filter(|t| !t.completed && t.behavior != Behavior::AiPrioritize)
        .map(|t| t.label.clone())
        .collect()
}

#[derive(Debug, Default)]
pub struct Workflow {
    states: HashMap<TaskId, AiState>,
    next_ticket: u64,
}

static IDLE: AiState = AiState::Idle;

impl Workflow {
    pub fn state(&self, task_id: TaskId) -> &AiState {
        self.states.get(&task_id).unwrap_or(&IDLE)
    }

    pub fn is_requesting(&self, task_id: TaskId) -> bool {
        matches!(self.state(task_id), AiState::Requesting { .. })
    }

    pub fn any_requesting(&self) -> bool {
        self.states
            .values()
            .any(|s| matches!(s, AiState::Requesting { .. }))
    }

    /// Enter `Requesting`. Returns `None` when a request is already in flight.
    pub fn begin(&mut self, task_id: TaskId) -> Option<u64> {
        if self.is_requesting(task_id) {
            return None;
        }
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.states.insert(task_id, AiState::Requesting { ticket });
        Some(ticket)
    }

    pub fn is_current(&self, task_id: TaskId, ticket: u64) -> bool {
        *self.state(task_id) == AiState::Requesting { ticket }
    }

    pub fn succeed(&mut self, task_id: TaskId) {
        self.states.insert(task_id, AiState::Succeeded);
    }

    pub fn fail(&mut self, task_id: TaskId, message: String) {
        self.states.insert(task_id, AiState::Failed { message });
    }

    /// Forget every state; in-flight results become stale.
    pub fn abandon_all(&mut self) {
        self.states.clear();
    }
}
