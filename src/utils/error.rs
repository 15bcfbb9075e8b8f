use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelocatorError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Authentication failed: {message}")]
    AuthenticationError { message: String },

    #[error("Mapping file is missing required columns: {}", .missing.join(", "))]
    SchemaError { missing: Vec<String> },

    #[error("Invalid mapping row {row}: {message}")]
    InvalidRowError { row: usize, message: String },

    #[error("Folder not found: {folder}")]
    FolderNotFound { folder: String },

    #[error("Folder name '{folder}' is ambiguous ({count} report folders match)")]
    AmbiguousFolder { folder: String, count: u64 },

    #[error("Folder lookup for '{folder}' failed earlier in this run: {reason}")]
    FolderLookupFailed { folder: String, reason: String },

    #[error("API error ({status}) {error_code}: {message}")]
    ApiError {
        status: u16,
        error_code: String,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Input,
    Remote,
    Lookup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RelocatorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_)
            | Self::UrlError(_) => ErrorCategory::Configuration,
            Self::AuthenticationError { .. } => ErrorCategory::Authentication,
            Self::CsvError(_)
            | Self::IoError(_)
            | Self::SchemaError { .. }
            | Self::InvalidRowError { .. } => ErrorCategory::Input,
            Self::HttpError(_) | Self::ApiError { .. } | Self::SerializationError(_) => {
                ErrorCategory::Remote
            }
            Self::FolderNotFound { .. }
            | Self::AmbiguousFolder { .. }
            | Self::FolderLookupFailed { .. } => ErrorCategory::Lookup,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Authentication => {
                ErrorSeverity::Critical
            }
            ErrorCategory::Input => match self {
                Self::InvalidRowError { .. } => ErrorSeverity::Medium,
                _ => ErrorSeverity::Critical,
            },
            ErrorCategory::Remote if self.is_transient() => ErrorSeverity::Medium,
            ErrorCategory::Remote | ErrorCategory::Lookup => ErrorSeverity::High,
        }
    }

    /// Transport-level failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError(e) => e.is_timeout() || e.is_connect(),
            Self::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::MissingConfigError { .. } => {
                "Set SF_USERNAME, SF_PASSWORD and SF_SECURITY_TOKEN in the environment or a .env file"
            }
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_)
            | Self::UrlError(_) => "Check the configuration file and command-line flags",
            Self::AuthenticationError { .. } => {
                "Verify the credentials, the security token and the login domain (production vs sandbox)"
            }
            Self::SchemaError { .. } => {
                "The mapping file header must contain report_id, destination_folder, is_private and owner_username"
            }
            Self::CsvError(_) | Self::IoError(_) => {
                "Make sure the mapping file exists, is readable and is valid UTF-8 CSV"
            }
            Self::InvalidRowError { .. } => "Fix the row in the mapping file and re-run",
            Self::FolderNotFound { .. } => "Check the folder name; it must match a report folder exactly",
            Self::AmbiguousFolder { .. } => "Rename the duplicate folders or set folders.on_ambiguous = \"first\"",
            Self::FolderLookupFailed { .. } => "See the first error logged for this folder",
            Self::HttpError(_) | Self::ApiError { .. } => {
                "Check connectivity and API limits, then re-run; moves are safe to repeat"
            }
            Self::SerializationError(_) => {
                "Salesforce returned an unexpected response body; check the api_version setting"
            }
        }
    }

    /// Process exit code for a run that ended with this error. A run that
    /// finishes its batch exits 0 no matter how many rows failed.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Critical => 1,
            ErrorSeverity::High => 2,
            ErrorSeverity::Medium | ErrorSeverity::Low => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Authentication => format!("Could not log in to Salesforce: {}", self),
            ErrorCategory::Input => format!("Could not read the mapping file: {}", self),
            ErrorCategory::Remote => format!("Salesforce API call failed: {}", self),
            ErrorCategory::Lookup => format!("Folder lookup failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelocatorError>;
