use thiserror::Error;

pub type Result<T> = std::result::Result<T, PostureError>;

#[derive(Error, Debug)]
pub enum PostureError {
    #[error("Unable to instantiate rule type {rule_type}: {source}")]
    CatalogConstruction {
        rule_type: String,
        #[source]
        source: RuleError,
    },

    #[error("Duplicate risk id '{risk_id}' declared by {first} and {second}")]
    DuplicateRiskId {
        risk_id: String,
        first: String,
        second: String,
    },

    #[error("Snapshot error in {file}: {message}")]
    Snapshot { file: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid snapshot pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PostureError {
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Failure raised by a single rule. The executor recovers from these.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("{message}")]
    Analysis {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("rule panicked: {0}")]
    Panicked(String),

    #[error("invalid rule descriptor: {0}")]
    InvalidDescriptor(String),
}

impl RuleError {
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Analysis {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Render an error followed by every error in its `source()` chain.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        out.push_str(": caused by: ");
        out.push_str(&cause.to_string());
        current = cause.source();
    }
    out
}
