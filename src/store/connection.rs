//! Connection coordinator
//!
//! Owns the bridge lifecycle: install, connect, disconnect, uninstall. Every
//! other component reacts to the events it emits. There is no automatic
//! reconnect; a failed connect leaves the coordinator idle until the next
//! explicit `Connect`.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{ConnectionStatus, ServerInfo};
use crate::error::{Error, Result};

use super::effect::Effect;

/// Connection lifecycle actions
#[derive(Debug)]
pub enum ConnectionAction {
    Connect,
    Disconnect,
    Uninstall,
    InstallFinished(Result<()>),
    ConnectFinished(Result<ServerInfo>),
}

/// Notifications for downstream components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
}

/// Connection state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub server_info: Option<ServerInfo>,
    pub last_error: Option<String>,
    /// Bumped whenever the connection identity changes; in-flight
    /// requests tagged with an older epoch are stale.
    epoch: u64,
    in_flight: usize,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of session invocations awaiting a result
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn reduce(&mut self, action: ConnectionAction) -> (Vec<Effect>, Option<ConnectionEvent>) {
        match action {
            ConnectionAction::Connect => match self.status {
                ConnectionStatus::NotInstalled => {
                    info!("Installing bridge");
                    self.status = ConnectionStatus::Installing;
                    self.last_error = None;
                    (vec![Effect::Install], None)
                }
                ConnectionStatus::Installed => {
                    info!("Connecting to bridge");
                    self.status = ConnectionStatus::Connecting;
                    self.last_error = None;
                    (vec![Effect::Connect], None)
                }
                status => {
                    debug!("Ignoring connect while {:?}", status);
                    (vec![], None)
                }
            },

            ConnectionAction::InstallFinished(result) => {
                if self.status != ConnectionStatus::Installing {
                    debug!("Ignoring install result while {:?}", self.status);
                    return (vec![], None);
                }
                match result {
                    Ok(()) => {
                        info!("Bridge installed, connecting");
                        self.status = ConnectionStatus::Connecting;
                        (vec![Effect::Connect], None)
                    }
                    Err(e) => {
                        warn!("Bridge install failed: {}", e);
                        self.status = ConnectionStatus::NotInstalled;
                        self.last_error = Some(e.to_string());
                        (vec![], None)
                    }
                }
            }

            ConnectionAction::ConnectFinished(result) => {
                if self.status != ConnectionStatus::Connecting {
                    debug!("Ignoring connect result while {:?}", self.status);
                    return (vec![], None);
                }
                match result {
                    Ok(info) => {
                        info!(
                            "Connected to {} {} (protocol {})",
                            info.name, info.version, info.protocol_version
                        );
                        self.status = ConnectionStatus::Connected;
                        self.server_info = Some(info);
                        self.last_error = None;
                        self.epoch += 1;
                        self.in_flight = 0;
                        (vec![], Some(ConnectionEvent::Connected))
                    }
                    Err(e) => {
                        warn!("Bridge connect failed: {}", e);
                        self.status = if matches!(e, Error::Install(_)) {
                            ConnectionStatus::NotInstalled
                        } else {
                            ConnectionStatus::Installed
                        };
                        self.last_error = Some(e.to_string());
                        (vec![], None)
                    }
                }
            }

            ConnectionAction::Disconnect => {
                if !self.status.is_connected() {
                    debug!("Ignoring disconnect while {:?}", self.status);
                    return (vec![], None);
                }
                info!("Disconnecting from bridge");
                self.drop_connection(ConnectionStatus::Installed);
                (vec![Effect::Disconnect], Some(ConnectionEvent::Disconnected))
            }

            ConnectionAction::Uninstall => {
                let was_connected = self.status.is_connected();
                if !was_connected && self.status != ConnectionStatus::Installed {
                    debug!("Ignoring uninstall while {:?}", self.status);
                    return (vec![], None);
                }
                info!("Uninstalling bridge");
                self.drop_connection(ConnectionStatus::NotInstalled);
                let event = was_connected.then_some(ConnectionEvent::Disconnected);
                (vec![Effect::Uninstall], event)
            }
        }
    }

    /// Record a session invocation leaving for the bridge
    pub fn begin_call(&mut self) {
        self.in_flight += 1;
        if self.status == ConnectionStatus::Connected {
            self.status = ConnectionStatus::Executing;
        }
    }

    /// Record a session invocation coming back from the bridge
    pub fn finish_call(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 && self.status == ConnectionStatus::Executing {
            self.status = ConnectionStatus::Connected;
        }
    }

    fn drop_connection(&mut self, status: ConnectionStatus) {
        self.status = status;
        self.server_info = None;
        self.epoch += 1;
        self.in_flight = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> ServerInfo {
        ServerInfo {
            name: "bridge".into(),
            version: "1.0".into(),
            protocol_version: "2024-11-05".into(),
        }
    }

    fn connected() -> ConnectionState {
        let mut state = ConnectionState::new();
        state.reduce(ConnectionAction::Connect);
        state.reduce(ConnectionAction::InstallFinished(Ok(())));
        state.reduce(ConnectionAction::ConnectFinished(Ok(server())));
        state
    }

    #[test]
    fn test_connect_installs_first() {
        let mut state = ConnectionState::new();

        let (effects, event) = state.reduce(ConnectionAction::Connect);
        assert_eq!(effects, vec![Effect::Install]);
        assert_eq!(event, None);
        assert_eq!(state.status, ConnectionStatus::Installing);

        let (effects, _) = state.reduce(ConnectionAction::InstallFinished(Ok(())));
        assert_eq!(effects, vec![Effect::Connect]);
        assert_eq!(state.status, ConnectionStatus::Connecting);

        let (effects, event) = state.reduce(ConnectionAction::ConnectFinished(Ok(server())));
        assert!(effects.is_empty());
        assert_eq!(event, Some(ConnectionEvent::Connected));
        assert_eq!(state.status, ConnectionStatus::Connected);
        assert_eq!(state.server_info, Some(server()));
    }

    #[test]
    fn test_lifecycle_intents_ignored_while_connecting() {
        let mut state = ConnectionState::new();
        state.status = ConnectionStatus::Installed;
        state.reduce(ConnectionAction::Connect);

        for action in [
            ConnectionAction::Connect,
            ConnectionAction::Disconnect,
            ConnectionAction::Uninstall,
        ] {
            let (effects, event) = state.reduce(action);
            assert!(effects.is_empty());
            assert_eq!(event, None);
            assert_eq!(state.status, ConnectionStatus::Connecting);
        }

        let (effects, event) = state.reduce(ConnectionAction::ConnectFinished(Ok(server())));
        assert!(effects.is_empty());
        assert_eq!(event, Some(ConnectionEvent::Connected));
    }

    #[test]
    fn test_install_failure_reverts_to_not_installed() {
        let mut state = ConnectionState::new();
        state.reduce(ConnectionAction::Connect);
        state.reduce(ConnectionAction::InstallFinished(Err(Error::Install(
            "bridge missing".into(),
        ))));

        assert_eq!(state.status, ConnectionStatus::NotInstalled);
        assert_eq!(
            state.last_error.as_deref(),
            Some("Install error: bridge missing")
        );
    }

    #[test]
    fn test_connect_failure_reverts_and_does_not_retry() {
        let mut state = ConnectionState::new();
        state.status = ConnectionStatus::Installed;

        state.reduce(ConnectionAction::Connect);
        let (effects, event) = state.reduce(ConnectionAction::ConnectFinished(Err(
            Error::Connect("protocol mismatch".into()),
        )));

        assert!(effects.is_empty());
        assert_eq!(event, None);
        assert_eq!(state.status, ConnectionStatus::Installed);
        assert!(state.last_error.is_some());

        // Retrying clears the error
        let (effects, _) = state.reduce(ConnectionAction::Connect);
        assert_eq!(effects, vec![Effect::Connect]);
        assert_eq!(state.last_error, None);
    }

    #[test]
    fn test_connect_install_error_reverts_to_not_installed() {
        let mut state = ConnectionState::new();
        state.status = ConnectionStatus::Installed;
        state.reduce(ConnectionAction::Connect);
        state.reduce(ConnectionAction::ConnectFinished(Err(Error::Install(
            "unpack failed".into(),
        ))));
        assert_eq!(state.status, ConnectionStatus::NotInstalled);
    }

    #[test]
    fn test_connect_ignored_when_connected() {
        let mut state = connected();
        let (effects, event) = state.reduce(ConnectionAction::Connect);
        assert!(effects.is_empty());
        assert_eq!(event, None);
    }

    #[test]
    fn test_disconnect() {
        let mut state = connected();
        let epoch = state.epoch();

        let (effects, event) = state.reduce(ConnectionAction::Disconnect);
        assert_eq!(effects, vec![Effect::Disconnect]);
        assert_eq!(event, Some(ConnectionEvent::Disconnected));
        assert_eq!(state.status, ConnectionStatus::Installed);
        assert_eq!(state.server_info, None);
        assert!(state.epoch() > epoch);

        // Not valid twice
        let (effects, event) = state.reduce(ConnectionAction::Disconnect);
        assert!(effects.is_empty());
        assert_eq!(event, None);
    }

    #[test]
    fn test_uninstall_from_connected() {
        let mut state = connected();
        let (effects, event) = state.reduce(ConnectionAction::Uninstall);
        assert_eq!(effects, vec![Effect::Uninstall]);
        assert_eq!(event, Some(ConnectionEvent::Disconnected));
        assert_eq!(state.status, ConnectionStatus::NotInstalled);
    }

    #[test]
    fn test_uninstall_rejected_when_not_installed() {
        let mut state = ConnectionState::new();
        let (effects, _) = state.reduce(ConnectionAction::Uninstall);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_executing_tracks_in_flight_calls() {
        let mut state = connected();

        state.begin_call();
        state.begin_call();
        assert_eq!(state.status, ConnectionStatus::Executing);

        state.finish_call();
        assert_eq!(state.status, ConnectionStatus::Executing);
        state.finish_call();
        assert_eq!(state.status, ConnectionStatus::Connected);
        assert_eq!(state.in_flight(), 0);

        // Extra completions never underflow
        state.finish_call();
        assert_eq!(state.in_flight(), 0);
    }
}
