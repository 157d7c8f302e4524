//! JSON-file settings store

use crate::error::{Error, Result};
use crate::ssh::{ConnectionProfile, Credentials};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Last-used SSH connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(flatten)]
    pub credentials: Credentials,
}

/// Browser-side assistant preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Run generated commands immediately instead of staging them
    #[serde(default)]
    pub auto_execute: bool,
}

/// A named, persisted SSH connection profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedHost {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(flatten)]
    pub credentials: Credentials,
}

/// Everything the settings file holds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant: Option<AssistantSettings>,

    #[serde(default)]
    pub hosts: Vec<SavedHost>,
}

/// Partial settings update from the browser; absent sections are untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub connection: Option<ConnectionSettings>,
    pub assistant: Option<AssistantSettings>,
}

/// File-backed settings store shared by the REST surface and the session core
pub struct SettingsStore {
    path: PathBuf,
    inner: RwLock<StoredSettings>,
}

impl SettingsStore {
    /// Open the store, reading the file when it exists
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("invalid settings file: {}", e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredSettings::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            inner: RwLock::new(settings),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current settings snapshot
    pub async fn get(&self) -> StoredSettings {
        self.inner.read().await.clone()
    }

    /// Merge a browser-supplied update and persist
    pub async fn update(&self, update: SettingsUpdate) -> Result<StoredSettings> {
        let mut settings = self.inner.write().await;
        if let Some(connection) = update.connection {
            settings.connection = Some(connection);
        }
        if let Some(assistant) = update.assistant {
            settings.assistant = Some(assistant);
        }
        self.persist(&settings).await?;
        Ok(settings.clone())
    }

    /// Record the now-working SSH profile after a successful connect
    pub async fn record_connection(&self, profile: &ConnectionProfile) -> Result<()> {
        let mut settings = self.inner.write().await;
        settings.connection = Some(ConnectionSettings {
            host: profile.host.clone(),
            port: profile.port,
            username: profile.username.clone(),
            credentials: profile.credentials.clone(),
        });
        self.persist(&settings).await
    }

    /// Insert or replace a saved host, keyed by name
    pub async fn upsert_host(&self, host: SavedHost) -> Result<()> {
        let mut settings = self.inner.write().await;
        settings.hosts.retain(|h| h.name != host.name);
        settings.hosts.push(host);
        self.persist(&settings).await
    }

    /// All saved hosts
    pub async fn list_hosts(&self) -> Vec<SavedHost> {
        self.inner.read().await.hosts.clone()
    }

    /// Remove a saved host; returns whether it existed
    pub async fn delete_host(&self, name: &str) -> Result<bool> {
        let mut settings = self.inner.write().await;
        let before = settings.hosts.len();
        settings.hosts.retain(|h| h.name != name);
        let removed = settings.hosts.len() != before;
        if removed {
            self.persist(&settings).await?;
        }
        Ok(removed)
    }

    async fn persist(&self, settings: &StoredSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_host(name: &str) -> SavedHost {
        SavedHost {
            name: name.to_string(),
            host: "example.com".to_string(),
            port: 22,
            username: "deploy".to_string(),
            credentials: Credentials {
                password: None,
                key_file: Some("/home/deploy/.ssh/id_ed25519".to_string()),
            },
        }
    }

    async fn store(dir: &TempDir) -> SettingsStore {
        SettingsStore::open(dir.path().join("settings.json"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let settings = store.get().await;
        assert!(settings.connection.is_none());
        assert!(settings.hosts.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_name() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        store.upsert_host(sample_host("prod")).await.unwrap();
        let mut updated = sample_host("prod");
        updated.host = "prod.internal".to_string();
        store.upsert_host(updated).await.unwrap();

        let hosts = store.list_hosts().await;
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].host, "prod.internal");
    }

    #[tokio::test]
    async fn test_delete_host_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        store.upsert_host(sample_host("prod")).await.unwrap();
        assert!(store.delete_host("prod").await.unwrap());
        assert!(!store.delete_host("prod").await.unwrap());
        assert!(store.list_hosts().await.is_empty());
    }

    #[tokio::test]
    async fn test_record_connection_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        {
            let store = SettingsStore::open(&path).await.unwrap();
            let profile = ConnectionProfile {
                host: "10.0.0.5".to_string(),
                port: 2222,
                username: "ops".to_string(),
                credentials: Credentials {
                    password: Some("pw".to_string()),
                    key_file: None,
                },
            };
            store.record_connection(&profile).await.unwrap();
        }

        let store = SettingsStore::open(&path).await.unwrap();
        let connection = store.get().await.connection.unwrap();
        assert_eq!(connection.host, "10.0.0.5");
        assert_eq!(connection.port, 2222);
        assert_eq!(connection.credentials.password.as_deref(), Some("pw"));
    }

    #[tokio::test]
    async fn test_update_merges_sections() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        store.upsert_host(sample_host("prod")).await.unwrap();
        let settings = store
            .update(SettingsUpdate {
                connection: None,
                assistant: Some(AssistantSettings {
                    url: Some("http://localhost:11434".to_string()),
                    model: Some("mistral".to_string()),
                    auto_execute: true,
                }),
            })
            .await
            .unwrap();

        assert!(settings.assistant.unwrap().auto_execute);
        // hosts untouched by a settings update
        assert_eq!(store.list_hosts().await.len(), 1);
    }
}
