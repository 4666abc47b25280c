use tracing::{debug, info};

use crate::{
    config,
    error::AppError,
    github::{GitHubClient, granted_scopes, missing_scopes, reports_missing_scope},
    output::print_info,
};

/// What `ensure_authenticated` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    /// Token already carried every scope
    None,
    LoggedIn,
    RefreshedScopes,
}

/// Makes sure `gh` is logged in with every required scope
///
/// Logs in through the browser when there is no session. With an existing
/// session, compares the token's `X-OAuth-Scopes` against the required list
/// (falling back to gh's missing-scope hint when the header is absent) and
/// refreshes scopes only when one is missing. Login and refresh failures are
/// returned as-is.
pub fn ensure_authenticated<C: GitHubClient + ?Sized>(
    client: &mut C,
) -> Result<AuthAction, AppError> {
    let scopes = config::scopes_arg();

    if !client.is_authenticated()? {
        print_info("not logged in to GitHub, starting web login");
        client.login(&scopes)?;
        info!("logged in");
        return Ok(AuthAction::LoggedIn);
    }

    let scope_check = client.api_with_headers(config::SCOPE_PROBE_ENDPOINT)?;
    let needs_refresh = match granted_scopes(&scope_check) {
        Some(granted) => {
            let missing = missing_scopes(&granted);
            debug!(?granted, ?missing, "token scopes");
            !missing.is_empty()
        }
        None => {
            debug!(success = scope_check.success, "no scopes header");
            reports_missing_scope(&scope_check)
        }
    };

    if needs_refresh {
        print_info("GitHub token is missing scopes, refreshing");
        client.refresh_scopes(&scopes)?;
        info!("refreshed scopes");
        return Ok(AuthAction::RefreshedScopes);
    }

    Ok(AuthAction::None)
}
