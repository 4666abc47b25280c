use std::fmt;

use serde::Deserialize;

use crate::config;

/// Account returned by `GET /user`
#[derive(Deserialize, Debug, Clone)]
pub struct Account {
    /// Account handle
    pub login: String,
    /// Display name, null when the user never set one
    pub name: Option<String>,
}

impl Account {
    /// Display name, falling back to the login handle
    pub fn preferred_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => self.login.clone(),
        }
    }
}

/// Entry of `GET /user/emails`
#[derive(Deserialize, Debug, Clone)]
pub struct EmailEntry {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

/// Picks the primary verified address, if any
pub fn primary_verified_email(emails: &[EmailEntry]) -> Option<String> {
    emails
        .iter()
        .find(|entry| entry.primary && entry.verified)
        .map(|entry| entry.email.clone())
}

/// Entry of `GET /user/ssh_signing_keys`
#[derive(Deserialize, Debug, Clone)]
pub struct SigningKeyEntry {
    pub key: String,
}

/// Value written to `gpg.format`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningFormat {
    Ssh,
    OpenPgp,
    X509,
}

impl SigningFormat {
    /// Detects the format from public key material
    pub fn detect(key: &str) -> SigningFormat {
        let key = key.trim_start();
        if key.starts_with("-----BEGIN PGP") {
            SigningFormat::OpenPgp
        } else if key.starts_with("-----BEGIN CERTIFICATE") {
            SigningFormat::X509
        } else {
            SigningFormat::Ssh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SigningFormat::Ssh => "ssh",
            SigningFormat::OpenPgp => "openpgp",
            SigningFormat::X509 => "x509",
        }
    }
}

impl fmt::Display for SigningFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signing key found on the account, together with its format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    pub key: String,
    pub format: SigningFormat,
}

impl SigningKey {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let format = SigningFormat::detect(&key);
        SigningKey { key, format }
    }
}

/// One of the three managed identity settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Name,
    Email,
    SigningKey,
}

impl IdentityField {
    pub const ALL: [IdentityField; 3] = [
        IdentityField::Name,
        IdentityField::Email,
        IdentityField::SigningKey,
    ];

    /// Git config key holding this field
    pub fn config_key(&self) -> &'static str {
        match self {
            IdentityField::Name => config::KEY_USER_NAME,
            IdentityField::Email => config::KEY_USER_EMAIL,
            IdentityField::SigningKey => config::KEY_SIGNING_KEY,
        }
    }
}

/// Identity settings currently present in the local config store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalIdentity {
    pub name: Option<String>,
    pub email: Option<String>,
    pub signing_key: Option<String>,
}

impl LocalIdentity {
    pub fn get(&self, field: IdentityField) -> Option<&str> {
        match field {
            IdentityField::Name => self.name.as_deref(),
            IdentityField::Email => self.email.as_deref(),
            IdentityField::SigningKey => self.signing_key.as_deref(),
        }
    }

    pub fn missing_fields(&self) -> Vec<IdentityField> {
        IdentityField::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Values fetched from the remote account; `None` when absent or unfetchable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub signing_key: Option<SigningKey>,
}

/// Shortens long key material for status lines
pub fn abbreviate(value: &str) -> String {
    if value.chars().count() <= config::KEY_DISPLAY_LENGTH {
        value.to_string()
    } else {
        let head: String = value.chars().take(config::KEY_DISPLAY_LENGTH).collect();
        format!("{}...", head)
    }
}
