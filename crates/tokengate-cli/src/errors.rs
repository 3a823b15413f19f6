use std::fmt;

/// Enum representing different types of CLI errors
#[derive(Debug)]
pub enum CliError {
    /// Transport failure talking to a limiter service
    Transport(reqwest::Error),
    /// A limiter service answered with an error status
    Server { status: u16, message: String },
    /// Invalid CLI arguments
    Input(String),
    /// Unexpected or general error
    Unexpected(String),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Transport(_) => exitcode::UNAVAILABLE,
            CliError::Server { .. } => exitcode::DATAERR,
            CliError::Input(_) => exitcode::USAGE,
            CliError::Unexpected(_) => exitcode::SOFTWARE,
        }
    }
}

impl From<reqwest::Error> for CliError {
    fn from(error: reqwest::Error) -> Self {
        CliError::Transport(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        CliError::Unexpected(format!("JSON error: {error}"))
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::Unexpected(format!("IO error: {error}"))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Transport(err) => write!(f, "Transport Error: {err}"),
            CliError::Server { status, message } => {
                write!(f, "Server Error ({status}): {message}")
            }
            CliError::Input(err) => write!(f, "Input Error: {err}"),
            CliError::Unexpected(err) => write!(f, "Unexpected Error: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Transport(err) => Some(err),
            _ => None,
        }
    }
}
