use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Error during process spawning or other I/O
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON deserialization of an API response
    #[error("json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    /// Error during UTF-8 conversion.
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
    /// Required executable is not on PATH
    #[error("required tool not found on PATH: '{0}'")]
    MissingTool(String),
    /// Error when executing Git commands
    #[error("git command failed: {0}")]
    GitCommand(String),
    /// Error when executing gh commands
    #[error("gh command failed: {0}")]
    GhCommand(String),
    /// Login or scope refresh did not complete
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl AppError {
    /// Builds a command error from captured stderr, falling back to the exit status.
    pub fn from_stderr(
        make: fn(String) -> AppError,
        stderr: Vec<u8>,
        status: std::process::ExitStatus,
    ) -> AppError {
        let message = String::from_utf8_lossy(&stderr).trim().to_string();
        if message.is_empty() {
            make(format!("exited with {}", status))
        } else {
            make(message)
        }
    }
}
