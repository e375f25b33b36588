//! Progress and completion signals derived from the task list.

use super::models::Task;

pub fn progress_percent(tasks: &[Task]) -> u16 {
    let total = tasks.len();
    if total == 0 {
        return 0;
    }
    let completed = tasks.iter().filter(|t| t.completed).count();
    (completed * 100 / total) as u16
}

pub fn is_fully_complete(tasks: &[Task]) -> bool {
    !tasks.is_empty() && tasks.iter().all(|t| t.completed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Remembers the last observed "all complete" value so celebration fires only
/// on the transition, never on repeated observation.
#[derive(Debug, Clone)]
pub struct CompletionFeedback {
    complete: bool,
}

impl CompletionFeedback {
    /// Seed from the state at mount. A board loaded already complete does not
    /// celebrate again.
    pub fn new(tasks: &[Task]) -> Self {
        CompletionFeedback {
            complete: is_fully_complete(tasks),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn observe(&mut self, tasks: &[Task]) -> Option<Edge> {
        let now = is_fully_complete(tasks);
        let edge = match (self.complete, now) {
            (false, true) => Some(Edge::Rising),
            (true, false) => Some(Edge::Falling),
            _ => None,
        };
        self.complete = now;
        edge
    }
}
