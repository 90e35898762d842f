use crate::infrastructure::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("model output is not a valid {expected}: {reason}")]
    ModelParse {
        expected: &'static str,
        reason: String,
    },
    #[error("agent stopped after {turns} turns with work still pending: {pending}")]
    TurnLimit { turns: usize, pending: String },
}

impl AgentError {
    pub(crate) fn parse(expected: &'static str, reason: impl Into<String>) -> Self {
        Self::ModelParse {
            expected,
            reason: reason.into(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AgentError::Model(err) => format!(
                "Sorry, I could not reach the assistant model. {}",
                err.user_message()
            ),
            AgentError::ModelParse { .. } => {
                "Sorry, the assistant produced a tool request I could not understand. Please rephrase your question."
                    .to_string()
            }
            AgentError::TurnLimit { pending, .. } => format!(
                "Sorry, I could not finish your request within the allowed number of steps. Still pending: {pending}"
            ),
        }
    }
}
