use thiserror::Error;

use azfn_sdk::SdkError;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("only one deploy target is supported, got {count}")]
    TargetCount { count: usize },

    #[error("application config has no functionManifest")]
    MissingManifest,

    #[error("invalid function manifest: {0}")]
    InvalidManifest(String),

    #[error("cannot build a rollback stage for an empty pipeline")]
    EmptyPipeline,

    #[error("cannot read stage config: {0}")]
    StageConfig(String),

    #[error("unknown stage: {0}")]
    UnknownStage(String),

    #[error("invalid setting {key}: {message}")]
    Settings { key: String, message: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("template deployment failed: {0}")]
    TemplateFailed(String),

    #[error("function app not found: {function_name}")]
    FunctionNotFound { function_name: String },

    #[error("package deployment failed: {0}")]
    PackageFailed(String),

    #[error("operation timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },

    #[error("Azure error: {0}")]
    Azure(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// Prepend resource identity to the error message.
    pub fn with_resource(self, label: &str, name: &str) -> Self {
        match self {
            Self::TemplateFailed(msg) => Self::TemplateFailed(format!("{label} ({name}): {msg}")),
            Self::PackageFailed(msg) => Self::PackageFailed(format!("{label} ({name}): {msg}")),
            Self::Azure(msg) => Self::Azure(format!("{label} ({name}): {msg}")),
            other => other,
        }
    }
}

impl From<DeployError> for SdkError {
    fn from(err: DeployError) -> Self {
        match err {
            DeployError::UnknownStage(name) => SdkError::UnknownStage(name),
            DeployError::EmptyPipeline => SdkError::InvalidInput(err.to_string()),
            other => SdkError::Plugin(format_err_chain(&other)),
        }
    }
}

/// Walk the full error chain and join all causes into one string.
///
/// `reqwest` errors keep the interesting part (DNS, TLS, connect) in the
/// source chain rather than in `Display`.
pub fn format_err_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
