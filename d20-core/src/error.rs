//! Error types shared across the engine.

use crate::world::ActorId;
use thiserror::Error;

/// Why an action could not be performed.
///
/// `Impossible` carries a player-facing message. Either way the engine leaves
/// the world as it found it, so the caller can simply report it and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{0}")]
    Impossible(String),
    #[error("Actor not found: {0}")]
    UnknownActor(ActorId),
}

impl ActionError {
    pub fn impossible(message: impl Into<String>) -> Self {
        ActionError::Impossible(message.into())
    }

    /// True for rule rejections, false for engine defects such as a stale id.
    pub fn is_impossible(&self) -> bool {
        matches!(self, ActionError::Impossible(_))
    }
}

/// Errors raised while loading content or configuration.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Invalid content JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
    #[error(transparent)]
    Builder(#[from] crate::actor_builder::BuilderError),
}
