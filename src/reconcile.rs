use tracing::{debug, warn};

use crate::{
    config,
    error::AppError,
    git::ConfigStore,
    github::{self, GitHubClient},
    output::{
        print_already_set, print_field_error, print_pending, print_resolved, print_success,
        print_warning,
    },
    profile::{
        IdentityField, LocalIdentity, RemoteProfile, SigningKey, abbreviate,
        primary_verified_email,
    },
};

/// A single step derived from comparing local and remote identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Write a name or email value
    Set { field: IdentityField, value: String },
    /// Field is missing locally and GitHub had no value for it
    Unresolved(IdentityField),
    /// Write the signing key group
    Signing(SigningKey),
    /// Signing key is missing locally and none is registered on GitHub
    NoSigningKey,
}

/// Result of a full reconciliation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every field was already set; nothing was fetched or written
    AlreadyComplete,
    Applied(ApplySummary),
}

/// What `apply` wrote and what it could not resolve
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub written: Vec<IdentityField>,
    pub unresolved: Vec<IdentityField>,
    pub signing_skipped: bool,
}

impl ApplySummary {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty() && !self.signing_skipped
    }
}

/// Reads the three identity fields from the store
pub fn read_local<S: ConfigStore + ?Sized>(store: &S) -> Result<LocalIdentity, AppError> {
    Ok(LocalIdentity {
        name: store.get(config::KEY_USER_NAME)?,
        email: store.get(config::KEY_USER_EMAIL)?,
        signing_key: store.get(config::KEY_SIGNING_KEY)?,
    })
}

/// Reports each field's state and returns whether any field is missing
pub fn check_completeness(local: &LocalIdentity) -> bool {
    for field in IdentityField::ALL {
        let key = field.config_key();
        match local.get(field) {
            Some(value) if field == IdentityField::SigningKey => {
                print_already_set(key, &abbreviate(value))
            }
            Some(value) => print_already_set(key, value),
            None => print_pending(key),
        }
    }
    !local.is_complete()
}

/// Fetches remote values; a failed fetch leaves only its own field empty
pub fn fetch_remote<C: GitHubClient + ?Sized>(client: &C, local: &LocalIdentity) -> RemoteProfile {
    let name = match github::fetch_account(client) {
        Ok(account) => Some(account.preferred_name()),
        Err(err) => {
            report_fetch_failure("account", &err);
            None
        }
    };

    let email = match github::fetch_emails(client) {
        Ok(emails) => primary_verified_email(&emails),
        Err(err) => {
            report_fetch_failure("email addresses", &err);
            None
        }
    };

    let signing_key = if local.signing_key.is_some() {
        None
    } else {
        match github::fetch_signing_keys(client) {
            Ok(keys) => keys.into_iter().next().map(|entry| SigningKey::new(entry.key)),
            Err(err) => {
                report_fetch_failure("signing keys", &err);
                None
            }
        }
    };

    RemoteProfile {
        name,
        email,
        signing_key,
    }
}

fn report_fetch_failure(what: &str, err: &AppError) {
    warn!(%err, "failed to fetch {}", what);
    print_warning(&format!("could not fetch {} from GitHub: {}", what, err));
}

/// Decides which writes a run should perform
///
/// Fields already present locally produce no update at all.
pub fn plan(local: &LocalIdentity, remote: &RemoteProfile) -> Vec<Update> {
    let mut updates = Vec::new();

    for (field, value) in [
        (IdentityField::Name, &remote.name),
        (IdentityField::Email, &remote.email),
    ] {
        if local.get(field).is_some() {
            continue;
        }
        // Blank counts as absent; anything else is written as fetched
        match value {
            Some(value) if !value.trim().is_empty() => updates.push(Update::Set {
                field,
                value: value.clone(),
            }),
            _ => updates.push(Update::Unresolved(field)),
        }
    }

    if local.signing_key.is_none() {
        match &remote.signing_key {
            Some(key) if !key.key.trim().is_empty() => updates.push(Update::Signing(key.clone())),
            _ => updates.push(Update::NoSigningKey),
        }
    }

    updates
}

/// Key/value pairs written together for a signing key
pub fn signing_writes(key: &SigningKey) -> [(&'static str, String); 4] {
    [
        (config::KEY_SIGNING_KEY, key.key.clone()),
        (config::KEY_GPG_FORMAT, key.format.to_string()),
        (config::KEY_COMMIT_GPGSIGN, "true".to_string()),
        (config::KEY_TAG_GPGSIGN, "true".to_string()),
    ]
}

/// Performs the planned writes and reports each outcome
pub fn apply<S: ConfigStore + ?Sized>(
    store: &mut S,
    updates: &[Update],
) -> Result<ApplySummary, AppError> {
    let mut summary = ApplySummary::default();

    for update in updates {
        match update {
            Update::Set { field, value } => {
                store.set(field.config_key(), value)?;
                print_resolved(field.config_key(), value);
                summary.written.push(*field);
            }
            Update::Unresolved(field) => {
                print_field_error(&format!(
                    "could not retrieve {} from GitHub",
                    field.config_key()
                ));
                summary.unresolved.push(*field);
            }
            Update::Signing(key) => {
                write_signing_group(store, key)?;
                print_resolved(config::KEY_SIGNING_KEY, &abbreviate(&key.key));
                print_resolved(config::KEY_GPG_FORMAT, key.format.as_str());
                print_resolved(config::KEY_COMMIT_GPGSIGN, "true");
                print_resolved(config::KEY_TAG_GPGSIGN, "true");
                summary.written.push(IdentityField::SigningKey);
            }
            Update::NoSigningKey => {
                print_warning("no signing key registered on GitHub, commit signing left disabled");
                summary.signing_skipped = true;
            }
        }
    }

    Ok(summary)
}

/// Writes all four signing keys, restoring prior values if any write fails
fn write_signing_group<S: ConfigStore + ?Sized>(
    store: &mut S,
    key: &SigningKey,
) -> Result<(), AppError> {
    let writes = signing_writes(key);
    let mut previous = Vec::with_capacity(writes.len());
    for (config_key, _) in &writes {
        previous.push(store.get(config_key)?);
    }

    for (index, (config_key, value)) in writes.iter().enumerate() {
        if let Err(err) = store.set(config_key, value) {
            for ((written_key, _), prior) in writes[..index].iter().zip(&previous).rev() {
                let restored = match prior {
                    Some(prior) => store.set(written_key, prior),
                    None => store.unset(written_key),
                };
                if let Err(restore_err) = restored {
                    warn!(key = written_key, %restore_err, "failed to roll back signing config");
                }
            }
            return Err(err);
        }
    }

    Ok(())
}

/// Runs check, fetch, plan and apply against the given store and client
pub fn reconcile<S, C>(store: &mut S, client: &C) -> Result<Outcome, AppError>
where
    S: ConfigStore + ?Sized,
    C: GitHubClient + ?Sized,
{
    let local = read_local(store)?;
    if !check_completeness(&local) {
        print_success("git identity already configured");
        return Ok(Outcome::AlreadyComplete);
    }

    let remote = fetch_remote(client, &local);
    let updates = plan(&local, &remote);
    debug!(?updates, "planned updates");
    Ok(Outcome::Applied(apply(store, &updates)?))
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{github::ApiOutput, profile::SigningFormat};

    const ADA_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIGx0c2lnbmluZ2tleWZvcmFkYQ ada@laptop";

    /// In-memory config store that records every mutation
    #[derive(Default)]
    struct MemoryStore {
        values: HashMap<String, String>,
        writes: Vec<String>,
        fail_on: Option<&'static str>,
    }

    impl MemoryStore {
        fn with(pairs: &[(&str, &str)]) -> Self {
            MemoryStore {
                values: pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            }
        }

        fn value(&self, key: &str) -> Option<&str> {
            self.values.get(key).map(String::as_str)
        }
    }

    impl ConfigStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            Ok(self.values.get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
            if self.fail_on == Some(key) {
                return Err(AppError::GitCommand(format!("could not lock config for {}", key)));
            }
            self.writes.push(format!("set {}", key));
            self.values.insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn unset(&mut self, key: &str) -> Result<(), AppError> {
            self.writes.push(format!("unset {}", key));
            self.values.remove(key);
            Ok(())
        }
    }

    /// Serves canned `gh api` responses and records requested endpoints
    #[derive(Default)]
    struct FakeGitHub {
        responses: HashMap<&'static str, ApiOutput>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeGitHub {
        fn respond(mut self, endpoint: &'static str, body: &str) -> Self {
            self.responses.insert(
                endpoint,
                ApiOutput {
                    success: true,
                    stdout: body.to_string(),
                    stderr: String::new(),
                },
            );
            self
        }

        fn fail(mut self, endpoint: &'static str) -> Self {
            self.responses.insert(
                endpoint,
                ApiOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: "HTTP 502: Bad Gateway".to_string(),
                },
            );
            self
        }

        fn ada() -> Self {
            FakeGitHub::default()
                .respond(config::USER_ENDPOINT, r#"{"login":"ada","name":"Ada L."}"#)
                .respond(
                    config::EMAILS_ENDPOINT,
                    r#"[{"email":"ada@users.noreply.github.com","primary":false,"verified":true},
                        {"email":"ada@example.com","primary":true,"verified":true}]"#,
                )
                .respond(
                    config::SIGNING_KEYS_ENDPOINT,
                    &format!(r#"[{{"id":7,"key":"{}","title":"laptop"}}]"#, ADA_KEY),
                )
        }

        fn requested(&self) -> Vec<String> {
            self.requested.borrow().clone()
        }
    }

    impl GitHubClient for FakeGitHub {
        fn is_authenticated(&self) -> Result<bool, AppError> {
            Ok(true)
        }

        fn login(&mut self, _scopes: &str) -> Result<(), AppError> {
            Ok(())
        }

        fn refresh_scopes(&mut self, _scopes: &str) -> Result<(), AppError> {
            Ok(())
        }

        fn api(&self, endpoint: &str) -> Result<ApiOutput, AppError> {
            self.requested.borrow_mut().push(endpoint.to_string());
            Ok(self.responses.get(endpoint).cloned().unwrap_or(ApiOutput {
                success: false,
                stdout: String::new(),
                stderr: "HTTP 404: Not Found".to_string(),
            }))
        }

        fn api_with_headers(&self, endpoint: &str) -> Result<ApiOutput, AppError> {
            self.api(endpoint)
        }
    }

    fn complete_store() -> MemoryStore {
        MemoryStore::with(&[
            (config::KEY_USER_NAME, "Local Name"),
            (config::KEY_USER_EMAIL, "local@example.com"),
            (config::KEY_SIGNING_KEY, "ssh-ed25519 LOCAL"),
        ])
    }

    #[test]
    fn complete_identity_makes_no_calls_and_no_writes() {
        let mut store = complete_store();
        let github = FakeGitHub::ada();

        let outcome = reconcile(&mut store, &github).unwrap();

        assert_eq!(outcome, Outcome::AlreadyComplete);
        assert!(github.requested().is_empty());
        assert!(store.writes.is_empty());
    }

    #[test]
    fn fresh_machine_gets_full_identity() {
        let mut store = MemoryStore::default();
        let github = FakeGitHub::ada();

        let outcome = reconcile(&mut store, &github).unwrap();

        assert_eq!(store.value(config::KEY_USER_NAME), Some("Ada L."));
        assert_eq!(store.value(config::KEY_USER_EMAIL), Some("ada@example.com"));
        assert_eq!(store.value(config::KEY_SIGNING_KEY), Some(ADA_KEY));
        assert_eq!(store.value(config::KEY_GPG_FORMAT), Some("ssh"));
        assert_eq!(store.value(config::KEY_COMMIT_GPGSIGN), Some("true"));
        assert_eq!(store.value(config::KEY_TAG_GPGSIGN), Some("true"));
        assert_eq!(
            outcome,
            Outcome::Applied(ApplySummary {
                written: vec![
                    IdentityField::Name,
                    IdentityField::Email,
                    IdentityField::SigningKey
                ],
                unresolved: vec![],
                signing_skipped: false,
            })
        );
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut store = MemoryStore::default();
        let github = FakeGitHub::ada();
        reconcile(&mut store, &github).unwrap();
        let writes_after_first = store.writes.len();
        let calls_after_first = github.requested().len();

        let outcome = reconcile(&mut store, &github).unwrap();

        assert_eq!(outcome, Outcome::AlreadyComplete);
        assert_eq!(store.writes.len(), writes_after_first);
        assert_eq!(github.requested().len(), calls_after_first);
    }

    #[test]
    fn only_missing_fields_are_written() {
        let mut store = MemoryStore::with(&[
            (config::KEY_USER_NAME, "Local Name"),
            (config::KEY_SIGNING_KEY, "ssh-ed25519 LOCAL"),
        ]);
        let github = FakeGitHub::ada();

        reconcile(&mut store, &github).unwrap();

        assert_eq!(store.writes, vec![format!("set {}", config::KEY_USER_EMAIL)]);
        assert_eq!(store.value(config::KEY_USER_NAME), Some("Local Name"));
        assert_eq!(store.value(config::KEY_SIGNING_KEY), Some("ssh-ed25519 LOCAL"));
    }

    #[test]
    fn signing_keys_not_fetched_when_set_locally() {
        let mut store = MemoryStore::with(&[(config::KEY_SIGNING_KEY, "ssh-ed25519 LOCAL")]);
        let github = FakeGitHub::ada();

        reconcile(&mut store, &github).unwrap();

        assert_eq!(
            github.requested(),
            vec![
                config::USER_ENDPOINT.to_string(),
                config::EMAILS_ENDPOINT.to_string()
            ]
        );
    }

    #[test]
    fn missing_primary_email_is_reported_and_others_continue() {
        let mut store = MemoryStore::default();
        let github = FakeGitHub::ada().respond(
            config::EMAILS_ENDPOINT,
            r#"[{"email":"ada@example.com","primary":true,"verified":false}]"#,
        );

        let outcome = reconcile(&mut store, &github).unwrap();

        assert_eq!(store.value(config::KEY_USER_EMAIL), None);
        assert_eq!(store.value(config::KEY_USER_NAME), Some("Ada L."));
        assert_eq!(store.value(config::KEY_SIGNING_KEY), Some(ADA_KEY));
        match outcome {
            Outcome::Applied(summary) => {
                assert_eq!(summary.unresolved, vec![IdentityField::Email]);
                assert!(!summary.is_complete());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn failed_fetch_only_affects_its_field() {
        let mut store = MemoryStore::default();
        let github = FakeGitHub::ada().fail(config::USER_ENDPOINT);

        reconcile(&mut store, &github).unwrap();

        assert_eq!(store.value(config::KEY_USER_NAME), None);
        assert_eq!(store.value(config::KEY_USER_EMAIL), Some("ada@example.com"));
        assert_eq!(store.value(config::KEY_SIGNING_KEY), Some(ADA_KEY));
    }

    #[test]
    fn no_remote_signing_key_writes_no_signing_config() {
        let mut store = MemoryStore::with(&[
            (config::KEY_USER_NAME, "Local Name"),
            (config::KEY_USER_EMAIL, "local@example.com"),
        ]);
        let github = FakeGitHub::ada().respond(config::SIGNING_KEYS_ENDPOINT, "[]");

        let outcome = reconcile(&mut store, &github).unwrap();

        assert!(store.writes.is_empty());
        for key in [
            config::KEY_SIGNING_KEY,
            config::KEY_GPG_FORMAT,
            config::KEY_COMMIT_GPGSIGN,
            config::KEY_TAG_GPGSIGN,
        ] {
            assert_eq!(store.value(key), None);
        }
        assert_eq!(
            outcome,
            Outcome::Applied(ApplySummary {
                written: vec![],
                unresolved: vec![],
                signing_skipped: true,
            })
        );
    }

    #[test]
    fn failed_signing_write_rolls_back_group() {
        let mut store = MemoryStore::with(&[
            (config::KEY_USER_NAME, "Local Name"),
            (config::KEY_USER_EMAIL, "local@example.com"),
            (config::KEY_GPG_FORMAT, "openpgp"),
        ]);
        store.fail_on = Some(config::KEY_TAG_GPGSIGN);
        let github = FakeGitHub::ada();

        let result = reconcile(&mut store, &github);

        assert!(matches!(result, Err(AppError::GitCommand(_))));
        assert_eq!(store.value(config::KEY_SIGNING_KEY), None);
        assert_eq!(store.value(config::KEY_GPG_FORMAT), Some("openpgp"));
        assert_eq!(store.value(config::KEY_COMMIT_GPGSIGN), None);
        assert_eq!(store.value(config::KEY_TAG_GPGSIGN), None);
    }

    #[test]
    fn plan_skips_present_fields() {
        let local = LocalIdentity {
            name: Some("Local Name".to_string()),
            email: None,
            signing_key: None,
        };
        let remote = RemoteProfile {
            name: Some("Ada L.".to_string()),
            email: Some("  ".to_string()),
            signing_key: Some(SigningKey::new(ADA_KEY)),
        };

        assert_eq!(
            plan(&local, &remote),
            vec![
                Update::Unresolved(IdentityField::Email),
                Update::Signing(SigningKey {
                    key: ADA_KEY.to_string(),
                    format: SigningFormat::Ssh,
                }),
            ]
        );
    }

    #[test]
    fn plan_keeps_fetched_values_verbatim() {
        let remote = RemoteProfile {
            name: Some(" Ada L. ".to_string()),
            email: Some("ada@example.com".to_string()),
            signing_key: None,
        };

        assert_eq!(
            plan(&LocalIdentity::default(), &remote),
            vec![
                Update::Set {
                    field: IdentityField::Name,
                    value: " Ada L. ".to_string(),
                },
                Update::Set {
                    field: IdentityField::Email,
                    value: "ada@example.com".to_string(),
                },
                Update::NoSigningKey,
            ]
        );
    }

    #[test]
    fn plan_for_complete_identity_is_empty() {
        let local = LocalIdentity {
            name: Some("a".to_string()),
            email: Some("b".to_string()),
            signing_key: Some("c".to_string()),
        };
        assert!(plan(&local, &RemoteProfile::default()).is_empty());
    }

    #[test]
    fn plan_reports_missing_signing_key() {
        let local = LocalIdentity {
            name: Some("a".to_string()),
            email: Some("b".to_string()),
            signing_key: None,
        };
        assert_eq!(
            plan(&local, &RemoteProfile::default()),
            vec![Update::NoSigningKey]
        );
    }

    #[test]
    fn name_falls_back_to_login() {
        let mut store = MemoryStore::default();
        let github =
            FakeGitHub::ada().respond(config::USER_ENDPOINT, r#"{"login":"ada","name":null}"#);

        reconcile(&mut store, &github).unwrap();

        assert_eq!(store.value(config::KEY_USER_NAME), Some("ada"));
    }
}
