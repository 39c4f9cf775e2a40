//! Environment synchronization.
//!
//! Secret material travels between members as encrypted [`Message`]s tied
//! to an environment version. `fetch` pulls pending messages when the
//! server's version marker moved past the manifest's; `push` encrypts the
//! local environment's content for every recipient and delivers it. What
//! a fetched message *means* for the local store is behind the
//! [`MessageMerger`] seam; the default merger records without applying.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::api::{Client, EnvironmentMessages};
use crate::core::crypto;
use crate::core::domain::Message;
use crate::core::store::EnvStore;
use crate::error::Result;

/// Server exchange needed by fetch and push.
pub trait SyncRemote {
    fn environment_messages(
        &self,
        project_id: &str,
        environment: &str,
    ) -> Result<EnvironmentMessages>;

    fn write_messages(&self, project_id: &str, messages: &[Message]) -> Result<()>;

    /// Acknowledge a delivered message so the server discards it.
    fn delete_message(&self, message_id: u64) -> Result<()>;
}

impl SyncRemote for Client {
    fn environment_messages(
        &self,
        project_id: &str,
        environment: &str,
    ) -> Result<EnvironmentMessages> {
        Client::environment_messages(self, project_id, environment)
    }

    fn write_messages(&self, project_id: &str, messages: &[Message]) -> Result<()> {
        Client::write_messages(self, project_id, messages)
    }

    fn delete_message(&self, message_id: u64) -> Result<()> {
        Client::delete_message(self, message_id)
    }
}

/// Receives fetched messages for an environment version.
///
/// Implementations decide what a message does to local state; the
/// built-in [`RecordingMerger`] only keeps them for inspection.
pub trait MessageMerger {
    fn merge(&mut self, environment: &str, version_id: &str, messages: &[Message]) -> Result<()>;
}

/// Default merger: records what arrived, applies nothing.
#[derive(Default)]
pub struct RecordingMerger {
    pub versions: Vec<(String, String)>,
    pub messages: Vec<Message>,
}

impl MessageMerger for RecordingMerger {
    fn merge(&mut self, environment: &str, version_id: &str, messages: &[Message]) -> Result<()> {
        self.versions
            .push((environment.to_string(), version_id.to_string()));
        self.messages.extend_from_slice(messages);
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The manifest already carries the server's version marker.
    UpToDate,
    Updated {
        version_id: String,
        message_count: usize,
    },
}

/// Pull pending messages for `environment`.
///
/// When the server's version marker equals the one recorded in the
/// manifest the call is a no-op and the merger is not invoked. Otherwise
/// the messages go through the merger and the manifest records the new
/// marker.
pub fn fetch(
    store: &EnvStore,
    remote: &dyn SyncRemote,
    merger: &mut dyn MessageMerger,
    environment: &str,
) -> Result<FetchOutcome> {
    let mut manifest = store.manifest()?;
    let known_version = manifest
        .environment(environment)
        .map(|e| e.version_id.clone())
        .unwrap_or_default();

    let response = remote.environment_messages(&manifest.project_id, environment)?;

    if !known_version.is_empty() && known_version == response.version_id {
        debug!(environment, version = %known_version, "environment up to date");
        return Ok(FetchOutcome::UpToDate);
    }

    debug!(
        environment,
        version = %response.version_id,
        messages = response.messages.len(),
        "merging fetched messages"
    );
    merger.merge(environment, &response.version_id, &response.messages)?;

    // Merged messages are acknowledged so the server discards them.
    for message in &response.messages {
        remote.delete_message(message.id)?;
    }

    manifest.set_environment_version(environment, &response.environment_id, &response.version_id);
    manifest.save()?;

    Ok(FetchOutcome::Updated {
        version_id: response.version_id,
        message_count: response.messages.len(),
    })
}

/// The content of one environment as carried inside a message payload.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EnvironmentPayload {
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,
    /// Tracked file contents, base64-encoded per path.
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

impl EnvironmentPayload {
    /// Snapshot `environment`'s secrets and cached file contents.
    ///
    /// Tracked files with no cached copy in the environment are skipped.
    pub fn capture(store: &EnvStore, environment: &str) -> Result<Self> {
        let mut payload = Self {
            secrets: store.get_all_secrets(environment)?,
            files: BTreeMap::new(),
        };

        for path in store.list_files()? {
            if let Ok(contents) = store.get_file(environment, &path) {
                payload.files.insert(path, STANDARD.encode(contents));
            }
        }

        Ok(payload)
    }
}

/// A member the push addresses, with their registered cipher key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRecipient {
    pub user_id: String,
    pub public_key: String,
}

/// Encrypt `environment`'s content for every recipient and deliver it.
///
/// One message per recipient, each encrypted to that recipient's key and
/// tagged with the environment's current version marker. Returns the
/// number of messages delivered.
pub fn push(
    store: &EnvStore,
    remote: &dyn SyncRemote,
    sender: &str,
    recipients: &[PushRecipient],
    environment: &str,
) -> Result<usize> {
    let manifest = store.manifest()?;
    let (environment_id, version_id) = manifest
        .environment(environment)
        .map(|e| (e.environment_id.clone(), e.version_id.clone()))
        .unwrap_or_default();

    let payload = EnvironmentPayload::capture(store, environment)?;
    let plaintext = serde_json::to_vec(&payload).map_err(|e| {
        crate::error::RemoteError::Decode(e.to_string())
    })?;

    let mut messages = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        messages.push(Message {
            id: 0,
            payload: crypto::encrypt_for(&recipient.public_key, &plaintext)?,
            sender: sender.to_string(),
            recipient: recipient.user_id.clone(),
            environment_id: environment_id.clone(),
            version_id: version_id.clone(),
            created_at: Utc::now(),
        });
    }

    debug!(environment, recipients = messages.len(), "pushing environment");
    remote.write_messages(&manifest.project_id, &messages)?;

    Ok(messages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use tempfile::TempDir;

    struct FakeRemote {
        version_id: String,
        messages: Vec<Message>,
        written: RefCell<Vec<Message>>,
        acknowledged: RefCell<Vec<u64>>,
    }

    impl FakeRemote {
        fn at_version(version_id: &str) -> Self {
            Self {
                version_id: version_id.into(),
                messages: Vec::new(),
                written: RefCell::new(Vec::new()),
                acknowledged: RefCell::new(Vec::new()),
            }
        }
    }

    impl SyncRemote for FakeRemote {
        fn environment_messages(
            &self,
            _project_id: &str,
            _environment: &str,
        ) -> Result<EnvironmentMessages> {
            Ok(EnvironmentMessages {
                environment_id: "env-1".into(),
                version_id: self.version_id.clone(),
                messages: self.messages.clone(),
            })
        }

        fn write_messages(&self, _project_id: &str, messages: &[Message]) -> Result<()> {
            self.written.borrow_mut().extend_from_slice(messages);
            Ok(())
        }

        fn delete_message(&self, message_id: u64) -> Result<()> {
            self.acknowledged.borrow_mut().push(message_id);
            Ok(())
        }
    }

    fn project() -> (TempDir, EnvStore) {
        let tmp = TempDir::new().unwrap();
        let store = EnvStore::new(tmp.path());
        store.init("proj-1", "backend").unwrap();
        (tmp, store)
    }

    #[test]
    fn fetch_records_the_new_version_marker() {
        let (_tmp, store) = project();
        let remote = FakeRemote::at_version("v-7");
        let mut merger = RecordingMerger::default();

        let outcome = fetch(&store, &remote, &mut merger, "default").unwrap();
        assert_eq!(
            outcome,
            FetchOutcome::Updated {
                version_id: "v-7".into(),
                message_count: 0
            }
        );
        assert_eq!(
            store.manifest().unwrap().environment("default").unwrap().version_id,
            "v-7"
        );
        assert_eq!(merger.versions, vec![("default".to_string(), "v-7".to_string())]);
    }

    #[test]
    fn fetch_with_unchanged_version_is_a_noop() {
        let (_tmp, store) = project();
        let remote = FakeRemote::at_version("v-7");
        let mut merger = RecordingMerger::default();

        fetch(&store, &remote, &mut merger, "default").unwrap();
        let outcome = fetch(&store, &remote, &mut merger, "default").unwrap();

        assert_eq!(outcome, FetchOutcome::UpToDate);
        // The merger ran exactly once.
        assert_eq!(merger.versions.len(), 1);
    }

    #[test]
    fn fetched_messages_are_acknowledged() {
        let (_tmp, store) = project();
        let mut remote = FakeRemote::at_version("v-2");
        remote.messages.push(Message {
            id: 42,
            payload: vec![1, 2, 3],
            sender: "alice@github".into(),
            recipient: "bob@github".into(),
            environment_id: "env-1".into(),
            version_id: "v-2".into(),
            created_at: Utc::now(),
        });

        let mut merger = RecordingMerger::default();
        fetch(&store, &remote, &mut merger, "default").unwrap();

        assert_eq!(merger.messages.len(), 1);
        assert_eq!(*remote.acknowledged.borrow(), vec![42]);
    }

    #[test]
    fn push_addresses_each_recipient_separately() {
        let (_tmp, store) = project();
        store
            .add_secret(
                "PORT",
                &[("default".to_string(), "8080".to_string())].into(),
                false,
            )
            .unwrap();

        let alice = age::x25519::Identity::generate();
        let bob = age::x25519::Identity::generate();
        let recipients = vec![
            PushRecipient {
                user_id: "alice@github".into(),
                public_key: alice.to_public().to_string(),
            },
            PushRecipient {
                user_id: "bob@github".into(),
                public_key: bob.to_public().to_string(),
            },
        ];

        let remote = FakeRemote::at_version("v-1");
        let sent = push(&store, &remote, "carol@github", &recipients, "default").unwrap();
        assert_eq!(sent, 2);

        let written = remote.written.borrow();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].recipient, "alice@github");
        assert_eq!(written[1].recipient, "bob@github");
        assert_ne!(written[0].payload, written[1].payload);

        // Only bob can open bob's copy.
        let resolver = crate::core::crypto::StaticResolver::from_identity(&bob);
        let plaintext = crypto::decrypt_with(
            &resolver,
            &bob.to_public().to_string(),
            &written[1].payload,
        )
        .unwrap();
        let payload: EnvironmentPayload = serde_json::from_slice(&plaintext).unwrap();
        assert_eq!(payload.secrets.get("PORT").unwrap(), "8080");
    }
}
