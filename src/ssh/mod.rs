//! Remote shell execution
//!
//! One live connection per session, opened and torn down explicitly. The
//! connector/connection split is a trait seam so the session layer can be
//! driven against a mock shell in tests.

mod client;

pub use client::{SshConnection, SshConnector};

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Everything needed to open one SSH connection
#[derive(Debug, Clone)]
pub struct ConnectionProfile {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub credentials: Credentials,
}

/// Password or key-file authentication material.
///
/// At least one of the two must be present; the password is wiped from
/// memory when the profile is dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
}

impl Credentials {
    /// Reject profiles carrying no authentication material at all
    pub fn validate(&self) -> Result<()> {
        let has_password = self.password.as_deref().is_some_and(|p| !p.is_empty());
        let has_key = self.key_file.as_deref().is_some_and(|k| !k.is_empty());
        if has_password || has_key {
            Ok(())
        } else {
            Err(Error::Auth(
                "either a password or a key file is required".to_string(),
            ))
        }
    }
}

/// Captured result of one remote command
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    /// Combined captured output (stdout, falling back to stderr)
    pub output: String,

    /// Remote exit status
    pub exit_status: u32,
}

/// Opens shell connections
#[async_trait]
pub trait ShellConnector: Send + Sync {
    /// Establish a connection, bounded by the configured connect timeout
    async fn connect(&self, profile: &ConnectionProfile) -> Result<Box<dyn ShellConnection>>;
}

/// One live shell connection
#[async_trait]
pub trait ShellConnection: Send + Sync {
    /// Run one command to completion and capture its output.
    ///
    /// Bounded by the configured command timeout. On timeout the wait is
    /// abandoned and the call fails; the remote process is not killed.
    async fn run(&mut self, command: &str) -> Result<CommandOutput>;

    /// Release the connection. Idempotent; always succeeds.
    async fn close(&mut self);
}

impl std::fmt::Debug for dyn ShellConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellConnection").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_require_some_material() {
        let creds = Credentials::default();
        assert!(matches!(creds.validate(), Err(Error::Auth(_))));

        let creds = Credentials {
            password: Some(String::new()),
            key_file: Some(String::new()),
        };
        assert!(creds.validate().is_err());
    }

    #[test]
    fn test_credentials_accept_password_or_key() {
        let creds = Credentials {
            password: Some("hunter2".to_string()),
            key_file: None,
        };
        assert!(creds.validate().is_ok());

        let creds = Credentials {
            password: None,
            key_file: Some("/home/me/.ssh/id_ed25519".to_string()),
        };
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn test_credentials_wire_omits_absent_fields() {
        let creds = Credentials {
            password: Some("s3cret".to_string()),
            key_file: None,
        };
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(json["password"], "s3cret");
        assert!(json.get("key_file").is_none());
    }
}
