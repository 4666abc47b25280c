use std::process::{Command, Output, Stdio};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    config,
    error::AppError,
    profile::{Account, EmailEntry, SigningKeyEntry},
};

/// Captured result of a `gh api` call
#[derive(Debug, Clone, Default)]
pub struct ApiOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Authenticated access to the GitHub API
pub trait GitHubClient {
    fn is_authenticated(&self) -> Result<bool, AppError>;
    /// Interactive web login requesting `scopes`
    fn login(&mut self, scopes: &str) -> Result<(), AppError>;
    /// Adds `scopes` to an existing token
    fn refresh_scopes(&mut self, scopes: &str) -> Result<(), AppError>;
    /// GET `endpoint`, returning output whether or not the call succeeded
    fn api(&self, endpoint: &str) -> Result<ApiOutput, AppError>;
    /// Like `api`, with the HTTP status line and response headers before the body
    fn api_with_headers(&self, endpoint: &str) -> Result<ApiOutput, AppError>;
}

/// `GitHubClient` backed by the `gh` CLI
#[derive(Debug, Default)]
pub struct GhCli;

impl GitHubClient for GhCli {
    fn is_authenticated(&self) -> Result<bool, AppError> {
        debug!("gh auth status");
        let gh_command_output: Output = Command::new("gh").args(["auth", "status"]).output()?;
        Ok(gh_command_output.status.success())
    }

    fn login(&mut self, scopes: &str) -> Result<(), AppError> {
        debug!(scopes, "gh auth login");
        // Inherits the terminal so the device code and browser prompt reach the user
        let status = Command::new("gh")
            .args([
                "auth",
                "login",
                "--web",
                "--git-protocol",
                "https",
                "--scopes",
                scopes,
            ])
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;

        if !status.success() {
            return Err(AppError::Auth(format!("gh auth login exited with {}", status)));
        }
        Ok(())
    }

    fn refresh_scopes(&mut self, scopes: &str) -> Result<(), AppError> {
        debug!(scopes, "gh auth refresh");
        let status = Command::new("gh")
            .args(["auth", "refresh", "--scopes", scopes])
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;

        if !status.success() {
            return Err(AppError::Auth(format!("gh auth refresh exited with {}", status)));
        }
        Ok(())
    }

    fn api(&self, endpoint: &str) -> Result<ApiOutput, AppError> {
        debug!(endpoint, "gh api");
        gh_api(&[endpoint])
    }

    fn api_with_headers(&self, endpoint: &str) -> Result<ApiOutput, AppError> {
        debug!(endpoint, "gh api --include");
        gh_api(&["--include", endpoint])
    }
}

fn gh_api(args: &[&str]) -> Result<ApiOutput, AppError> {
    let gh_command_output: Output = Command::new("gh").arg("api").args(args).output()?;

    Ok(ApiOutput {
        success: gh_command_output.status.success(),
        stdout: String::from_utf8(gh_command_output.stdout)?,
        stderr: String::from_utf8_lossy(&gh_command_output.stderr).into_owned(),
    })
}

/// Calls `endpoint` and deserializes the JSON body
pub fn get_json<T, C>(client: &C, endpoint: &str) -> Result<T, AppError>
where
    T: DeserializeOwned,
    C: GitHubClient + ?Sized,
{
    let output = client.api(endpoint)?;
    if !output.success {
        let message = output.stderr.trim();
        return Err(AppError::GhCommand(if message.is_empty() {
            format!("gh api {} failed", endpoint)
        } else {
            message.to_string()
        }));
    }
    Ok(serde_json::from_str(&output.stdout)?)
}

/// Fetches the authenticated account
pub fn fetch_account<C: GitHubClient + ?Sized>(client: &C) -> Result<Account, AppError> {
    get_json(client, config::USER_ENDPOINT)
}

/// Fetches every email address registered on the account
pub fn fetch_emails<C: GitHubClient + ?Sized>(client: &C) -> Result<Vec<EmailEntry>, AppError> {
    get_json(client, config::EMAILS_ENDPOINT)
}

/// Fetches the SSH signing keys registered on the account, in listing order
pub fn fetch_signing_keys<C: GitHubClient + ?Sized>(
    client: &C,
) -> Result<Vec<SigningKeyEntry>, AppError> {
    get_json(client, config::SIGNING_KEYS_ENDPOINT)
}

/// Checks `gh` output for a hint that the token lacks a scope
///
/// `gh` reports this as e.g. `This API operation needs the "read:ssh_signing_key" scope`.
pub fn reports_missing_scope(output: &ApiOutput) -> bool {
    [&output.stdout, &output.stderr].iter().any(|text| {
        let text = text.to_lowercase();
        text.contains("scope")
            && (text.contains("needs the")
                || text.contains("missing")
                || text.contains("insufficient"))
    })
}

/// Scopes listed in the `X-OAuth-Scopes` header of an `api_with_headers` response
///
/// `None` when the header is absent, as with fine-grained or app tokens.
pub fn granted_scopes(output: &ApiOutput) -> Option<Vec<String>> {
    output
        .stdout
        .lines()
        .take_while(|line| !line.trim().is_empty())
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("x-oauth-scopes"))
        .map(|(_, value)| {
            value
                .split(',')
                .map(str::trim)
                .filter(|scope| !scope.is_empty())
                .map(str::to_string)
                .collect()
        })
}

/// Broader scopes that also grant `scope`
fn implied_by(scope: &str) -> &'static [&'static str] {
    match scope {
        "read:org" => &["write:org", "admin:org"],
        "user:email" => &["user"],
        "read:ssh_signing_key" => &["write:ssh_signing_key", "admin:ssh_signing_key"],
        _ => &[],
    }
}

/// Required scopes not covered by `granted`
pub fn missing_scopes(granted: &[String]) -> Vec<&'static str> {
    config::REQUIRED_SCOPES
        .into_iter()
        .filter(|required| {
            !granted
                .iter()
                .any(|scope| scope == required || implied_by(required).contains(&scope.as_str()))
        })
        .collect()
}
