use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocketError {
    #[error("{id} not found")]
    NotFound { id: String, available: Vec<String> },

    #[error("template not found: {0}")]
    TemplateMissing(String),

    #[error("malformed document {path}: {reason}")]
    MalformedDocument { path: String, reason: String },

    #[error("invalid id '{0}'")]
    InvalidId(String),

    #[error("id already in use: {0}")]
    IdInUse(String),

    #[error("invalid status '{value}' for {kind}")]
    InvalidStatus { kind: String, value: String },

    #[error("invalid priority '{0}': expected low, medium, high or critical")]
    InvalidPriority(String),

    #[error("cannot move {id} from {from} to {to}: {reason}")]
    TransitionBlocked {
        id: String,
        from: String,
        to: String,
        reason: String,
    },

    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DocketError>;
