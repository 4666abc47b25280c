use std::{
    path::PathBuf,
    process::{Command, Output},
};

use tracing::debug;

use crate::error::AppError;

/// Key-value store holding the local identity settings
pub trait ConfigStore {
    /// Returns the value for `key`, or `None` when it is unset or blank
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError>;
    fn unset(&mut self, key: &str) -> Result<(), AppError>;
}

/// The user's global Git configuration (`git config --global`)
#[derive(Debug, Default)]
pub struct GlobalGitConfig {
    /// Replaces the global config file git would otherwise use
    file: Option<PathBuf>,
}

impl GlobalGitConfig {
    /// Global config backed by `file` instead of the user's own
    pub fn with_file(file: impl Into<PathBuf>) -> Self {
        GlobalGitConfig {
            file: Some(file.into()),
        }
    }

    /// Builds a `git config --global` command with `args` appended
    fn git_config(&self, args: &[&str]) -> Command {
        let mut command = Command::new("git");
        command.args(["config", "--global"]).args(args);
        if let Some(file) = &self.file {
            command.env("GIT_CONFIG_GLOBAL", file);
        }
        command
    }
}

impl ConfigStore for GlobalGitConfig {
    /// Executes Git config get command
    ///
    /// # Arguments
    /// * `key` - Git config key (e.g. user.name)
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        debug!(key, "git config --global --get");
        let git_command_output: Output = self.git_config(&["--get", key]).output()?;

        // Exit code 1 means the key is not set
        if git_command_output.status.code() == Some(1) {
            return Ok(None);
        }

        if !git_command_output.status.success() {
            return Err(AppError::from_stderr(
                AppError::GitCommand,
                git_command_output.stderr,
                git_command_output.status,
            ));
        }

        let value = String::from_utf8(git_command_output.stdout)?;
        let value = value.trim();
        if value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(value.to_string()))
        }
    }

    /// Executes a Git config set command
    ///
    /// # Arguments
    /// * `key` - Git config key to set
    /// * `value` - Value to set for key
    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        debug!(key, "git config --global");
        let git_command_output: Output = self.git_config(&[key, value]).output()?;

        if !git_command_output.status.success() {
            return Err(AppError::from_stderr(
                AppError::GitCommand,
                git_command_output.stderr,
                git_command_output.status,
            ));
        }

        Ok(())
    }

    fn unset(&mut self, key: &str) -> Result<(), AppError> {
        debug!(key, "git config --global --unset");
        let git_command_output: Output = self.git_config(&["--unset", key]).output()?;

        // Exit code 5 means the key was already absent
        if git_command_output.status.success() || git_command_output.status.code() == Some(5) {
            return Ok(());
        }

        Err(AppError::from_stderr(
            AppError::GitCommand,
            git_command_output.stderr,
            git_command_output.status,
        ))
    }
}
