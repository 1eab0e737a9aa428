use thiserror::Error;

/// All errors that can occur in novaref-core.
///
/// Scanning and parsing never produce these: unreadable or malformed
/// input is skipped where it is found. Only configuration and explicit
/// filesystem operations surface errors.
#[derive(Debug, Error)]
pub enum RefError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Exit codes used by the command line front end.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidArgs = 3,
    NetworkError = 6,
    ConfirmRequired = 8,
}

pub type Result<T> = std::result::Result<T, RefError>;
