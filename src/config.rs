/// Executables that must be on PATH before anything else runs
pub const REQUIRED_TOOLS: [&str; 2] = ["gh", "git"];

/// Token scopes requested on login and on scope refresh
pub const REQUIRED_SCOPES: [&str; 5] = [
    "repo",
    "read:org",
    "gist",
    "user:email",
    "read:ssh_signing_key",
];

/// Endpoint used to probe whether the current token carries every scope
pub const SCOPE_PROBE_ENDPOINT: &str = "user";

pub const USER_ENDPOINT: &str = "user";
pub const EMAILS_ENDPOINT: &str = "user/emails";
pub const SIGNING_KEYS_ENDPOINT: &str = "user/ssh_signing_keys";

// Git config keys
pub const KEY_USER_NAME: &str = "user.name";
pub const KEY_USER_EMAIL: &str = "user.email";
pub const KEY_SIGNING_KEY: &str = "user.signingkey";
pub const KEY_GPG_FORMAT: &str = "gpg.format";
pub const KEY_COMMIT_GPGSIGN: &str = "commit.gpgsign";
pub const KEY_TAG_GPGSIGN: &str = "tag.gpgsign";

/// Characters of a signing key shown in status lines
pub const KEY_DISPLAY_LENGTH: usize = 40;

/// Comma-separated scope list as `gh` expects it
pub fn scopes_arg() -> String {
    REQUIRED_SCOPES.join(",")
}
