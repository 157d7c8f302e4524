//! russh-backed shell connector

use crate::config::SshConfig;
use crate::error::{Error, Result};
use crate::ssh::{CommandOutput, ConnectionProfile, ShellConnection, ShellConnector};
use async_trait::async_trait;
use russh::client;
use russh::{ChannelMsg, Disconnect};
use std::sync::Arc;
use std::time::Duration;

/// Opens SSH connections with the configured timeouts
pub struct SshConnector {
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl SshConnector {
    /// Create a connector from the SSH configuration
    pub fn new(config: &SshConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            command_timeout: Duration::from_secs(config.command_timeout_secs),
        }
    }
}

/// russh client event handler. Host keys are accepted unconditionally; the
/// bridge serves a single trusted user.
struct ClientHandler;

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}

#[async_trait]
impl ShellConnector for SshConnector {
    async fn connect(&self, profile: &ConnectionProfile) -> Result<Box<dyn ShellConnection>> {
        profile.credentials.validate()?;

        let config = Arc::new(client::Config::default());
        let addr = (profile.host.as_str(), profile.port);

        let mut handle =
            match tokio::time::timeout(self.connect_timeout, client::connect(config, addr, ClientHandler))
                .await
            {
                Ok(connected) => connected?,
                Err(_) => {
                    return Err(Error::Timeout(format!(
                        "connecting to {}:{} exceeded {}s",
                        profile.host,
                        profile.port,
                        self.connect_timeout.as_secs()
                    )));
                }
            };

        // Key-file auth wins when both credentials are present, matching the
        // connect form's behavior.
        let authenticated = if let Some(key_file) = profile
            .credentials
            .key_file
            .as_deref()
            .filter(|k| !k.is_empty())
        {
            let key = russh_keys::load_secret_key(key_file, None)
                .map_err(|e| Error::Auth(format!("cannot load key file {}: {}", key_file, e)))?;
            handle
                .authenticate_publickey(profile.username.as_str(), Arc::new(key))
                .await?
        } else {
            let password = profile.credentials.password.as_deref().unwrap_or_default();
            handle
                .authenticate_password(profile.username.as_str(), password)
                .await?
        };

        if !authenticated {
            return Err(Error::Auth(format!(
                "authentication rejected for {}@{}",
                profile.username, profile.host
            )));
        }

        tracing::debug!(
            host = %profile.host,
            port = profile.port,
            username = %profile.username,
            "SSH connection established"
        );

        Ok(Box::new(SshConnection {
            handle: Some(handle),
            command_timeout: self.command_timeout,
        }))
    }
}

/// One live SSH connection
pub struct SshConnection {
    handle: Option<client::Handle<ClientHandler>>,
    command_timeout: Duration,
}

#[async_trait]
impl ShellConnection for SshConnection {
    async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| Error::Network("connection is closed".to_string()))?;

        let mut channel = handle.channel_open_session().await?;
        channel.exec(true, command).await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_status = 0u32;

        let collect = async {
            while let Some(msg) = channel.wait().await {
                match msg {
                    ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                    ChannelMsg::ExtendedData { ref data, ext: 1 } => {
                        stderr.extend_from_slice(data)
                    }
                    ChannelMsg::ExitStatus { exit_status: code } => exit_status = code,
                    _ => {}
                }
            }
        };

        if tokio::time::timeout(self.command_timeout, collect)
            .await
            .is_err()
        {
            // The wait is abandoned; the remote process keeps running.
            return Err(Error::Timeout(format!(
                "command did not complete within {}s",
                self.command_timeout.as_secs()
            )));
        }

        let stdout = String::from_utf8_lossy(&stdout).to_string();
        let stderr = String::from_utf8_lossy(&stderr).to_string();

        if exit_status != 0 {
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(Error::Execution(format!(
                "exit status {}: {}",
                exit_status,
                detail.trim_end()
            )));
        }

        Ok(CommandOutput {
            output: if stdout.is_empty() { stderr } else { stdout },
            exit_status,
        })
    }

    async fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle
                .disconnect(Disconnect::ByApplication, "session closed", "en")
                .await
            {
                tracing::debug!("error during SSH disconnect: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssh::Credentials;

    fn profile(port: u16) -> ConnectionProfile {
        ConnectionProfile {
            host: "127.0.0.1".to_string(),
            port,
            username: "test".to_string(),
            credentials: Credentials {
                password: Some("secret".to_string()),
                key_file: None,
            },
        }
    }

    #[tokio::test]
    async fn test_connect_without_credentials_fails_before_network() {
        let connector = SshConnector::new(&SshConfig::default());
        let mut bad = profile(22);
        bad.credentials = Credentials::default();

        let err = connector.connect(&bad).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_connect_refused_is_network_error() {
        let connector = SshConnector::new(&SshConfig {
            connect_timeout_secs: 2,
            command_timeout_secs: 2,
        });

        // nothing listens on the discard port
        let err = connector.connect(&profile(9)).await.unwrap_err();
        assert!(matches!(err, Error::Network(_) | Error::Timeout(_)));
    }

    #[tokio::test]
    async fn test_run_on_closed_connection_fails() {
        let mut conn = SshConnection {
            handle: None,
            command_timeout: Duration::from_secs(1),
        };
        assert!(conn.run("echo hi").await.is_err());
        // close on an already-closed connection is a no-op
        conn.close().await;
        conn.close().await;
    }
}
