//! AI task prioritization.
//!
//! The board only sees the [`Prioritizer`] trait: a list of task labels goes
//! in, the same labels come back reordered together with an explanation.
//! [`AnthropicPrioritizer`] is the HTTP implementation.

mod anthropic;
mod prompt;

pub use anthropic::AnthropicPrioritizer;
pub use prompt::{build_prompt, parse_response};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedTasks {
    pub prioritized_tasks: Vec<String>,
    pub reasoning: String,
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI service is not configured: {0}")]
    NotConfigured(String),

    #[error("nothing to send: the task list is empty")]
    EmptyRequest,

    #[error("AI request timed out")]
    Timeout,

    #[error("AI request failed: {0}")]
    Request(String),

    #[error("AI service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("AI response was invalid: {0}")]
    InvalidResponse(String),
}

impl AiError {
    /// Message shown to the user in a notification.
    pub fn user_message(&self) -> String {
        format!("Failed to prioritize tasks: {self}")
    }
}

/// External text-completion service that orders task labels.
pub trait Prioritizer: Send + Sync {
    fn prioritize(&self, tasks: &[String]) -> Result<PrioritizedTasks, AiError>;
}

/// Check that a response orders exactly the labels that were requested.
pub fn validate(request: &[String], mut response: PrioritizedTasks) -> Result<PrioritizedTasks, AiError> {
    for label in &mut response.prioritized_tasks {
        *label = label.trim().to_string();
    }

    let mut expected: Vec<&str> = request.iter().map(|s| s.trim()).collect();
    let mut actual: Vec<&str> = response
        .prioritized_tasks
        .iter()
        .map(String::as_str)
        .collect();
    expected.sort_unstable();
    actual.sort_unstable();

    if expected != actual {
        return Err(AiError::InvalidResponse(format!(
            "expected the {} requested tasks in a new order, got {:?}",
            request.len(),
            response.prioritized_tasks
        )));
    }
    Ok(response)
}
