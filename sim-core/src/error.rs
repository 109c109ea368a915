//! Error type shared by the graph, config and tree builder.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("unknown node `{0}`")]
    UnknownNode(String),

    #[error("self-loop on node `{0}`")]
    SelfLoop(String),

    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SceneError>;
