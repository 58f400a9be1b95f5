use thiserror::Error;

/// Option problems detected before any request is issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Missing required option: {0}")]
    MissingRequiredOption(String),

    #[error("{value} is not a valid GUID")]
    InvalidGuid { option: String, value: String },

    #[error("{value} is not a valid SharePoint Online site URL")]
    InvalidUrl { option: String, value: String },

    #[error("'{value}' is not a valid value for {option}. Allowed values: {}", allowed.join(", "))]
    InvalidEnumValue {
        option: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("'{value}' is not a valid date for {option}. Expected YYYY-MM-DD")]
    InvalidDate { option: String, value: String },

    #[error("You must specify {option} when {condition}")]
    MissingConditionalOption { option: String, condition: String },

    #[error("{}", target_message(first, second, *both))]
    AmbiguousOrMissingTarget {
        first: String,
        second: String,
        both: bool,
    },
}

fn target_message(first: &str, second: &str, both: bool) -> String {
    if both {
        format!("Specify {} or {} but not both (ambiguous target)", first, second)
    } else {
        format!("Specify {} or {}, one is required", first, second)
    }
}

#[derive(Error, Debug)]
pub enum M365Error {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A preliminary lookup (site URL, app catalog) failed.
    #[error("{0}")]
    ContextResolution(String),

    /// The command's primary request failed.
    #[error("{0}")]
    Operation(String),

    #[error("Log in to Microsoft 365 first. Run 'm365ctl login'")]
    NotConnected,

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Interactive prompt error: {0}")]
    DialoguerError(#[from] dialoguer::Error),

    #[error("Token not found. Please run 'm365ctl login' first")]
    TokenNotFound,
}

pub type Result<T> = std::result::Result<T, M365Error>;

/// Normalize a rejected response body into a single user-facing message.
///
/// SharePoint REST errors arrive as `{"odata.error": {"message": {"value": ...}}}`
/// and Graph errors as `{"error": {"message": ...}}`. Anything else is returned
/// as-is.
pub fn translate_odata_error(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = json
            .get("odata.error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.get("value"))
            .and_then(|v| v.as_str())
        {
            return message.to_string();
        }

        if let Some(message) = json
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return message.to_string();
        }
    }

    body.to_string()
}
