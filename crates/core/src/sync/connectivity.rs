use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityState {
    Connected,
    #[default]
    Disconnected,
}

/// Kind of link the device is on. Informational only; never used for decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Unmetered,
    Metered,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connectivity {
    pub state: ConnectivityState,
    pub transport: TransportKind,
}

impl Connectivity {
    pub const fn connected(transport: TransportKind) -> Self {
        Self {
            state: ConnectivityState::Connected,
            transport,
        }
    }

    pub const fn disconnected() -> Self {
        Self {
            state: ConnectivityState::Disconnected,
            transport: TransportKind::Unknown,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectivityState::Connected
    }
}
