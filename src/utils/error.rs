use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransloaditError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request has no auth key; call authenticate() first")]
    MissingAuthKey,

    #[error("Auth secret is empty")]
    MissingSecret,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Assembly failed: {error} ({message})")]
    Assembly { error: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Configuration,
    Remote,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code the CLI uses for a failure of this severity.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl TransloaditError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TransloaditError::Http(_) => ErrorCategory::Network,
            TransloaditError::MissingAuthKey | TransloaditError::MissingSecret => {
                ErrorCategory::Authentication
            }
            TransloaditError::ConfigError { .. }
            | TransloaditError::MissingConfigError { .. }
            | TransloaditError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            TransloaditError::Api { .. } | TransloaditError::Assembly { .. } => {
                ErrorCategory::Remote
            }
            TransloaditError::Io(_) | TransloaditError::Serialization(_) => ErrorCategory::Local,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TransloaditError::Http(_) => ErrorSeverity::Medium,
            TransloaditError::Api { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            TransloaditError::Api { .. } | TransloaditError::Assembly { .. } => ErrorSeverity::High,
            TransloaditError::MissingAuthKey
            | TransloaditError::MissingSecret
            | TransloaditError::ConfigError { .. }
            | TransloaditError::MissingConfigError { .. }
            | TransloaditError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            TransloaditError::Io(_) | TransloaditError::Serialization(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            TransloaditError::Http(_) => "Check network connectivity and the API endpoint, then try again",
            TransloaditError::MissingAuthKey => "Pass --key or set TRANSLOADIT_KEY",
            TransloaditError::MissingSecret => "Pass --secret or set TRANSLOADIT_SECRET",
            TransloaditError::ConfigError { .. } | TransloaditError::MissingConfigError { .. } => {
                "Review the configuration file and command line arguments"
            }
            TransloaditError::InvalidConfigValueError { .. } => {
                "Fix the reported field and run again"
            }
            TransloaditError::Api { status, .. } if *status == 401 || *status == 403 => {
                "Verify the auth key and secret in your Transloadit credentials"
            }
            TransloaditError::Api { .. } => "Inspect the API message; the request may be malformed",
            TransloaditError::Assembly { .. } => {
                "Check the template id and assembly instructions"
            }
            TransloaditError::Io(_) => "Make sure the file exists and is readable",
            TransloaditError::Serialization(_) => "The response could not be decoded as JSON",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TransloaditError::Http(e) if e.is_timeout() => "Upload timed out".to_string(),
            TransloaditError::Http(_) => "Could not reach Transloadit".to_string(),
            TransloaditError::Api { status, message } => {
                format!("Transloadit rejected the request ({}): {}", status, message)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransloaditError>;
