use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Node lifecycle / sync state, reported to operators and exchanged in
/// peer status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XdagState {
    Init,
    GeneratingKeys,
    ResettingEngine,
    LoadingBlocks,
    Stopped,
    ConnectingDevnet,
    ConnectingTestnet,
    ConnectingMainnet,
    SyncingDevnet,
    SyncingTestnet,
    SyncingMainnet,
    SyncedDevnet,
    SyncedTestnet,
    SyncedMainnet,
    Transfer,
}

impl Display for XdagState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let description = match self {
            XdagState::Init => "Pool initializing....",
            XdagState::GeneratingKeys => "Generating keys...",
            XdagState::ResettingEngine => "The local storage is corrupted. Resetting blocks engine.",
            XdagState::LoadingBlocks => "Loading blocks from the local storage.",
            XdagState::Stopped => "Blocks loaded. Waiting for 'run' command.",
            XdagState::ConnectingDevnet => "Trying to connect to the dev network.",
            XdagState::ConnectingTestnet => "Trying to connect to the test network.",
            XdagState::ConnectingMainnet => "Trying to connect to the main network.",
            XdagState::SyncingDevnet => "Connected to the dev network. Synchronizing.",
            XdagState::SyncingTestnet => "Connected to the test network. Synchronizing.",
            XdagState::SyncingMainnet => "Connected to the main network. Synchronizing.",
            XdagState::SyncedDevnet => "Synchronized with the dev network. Normal testing.",
            XdagState::SyncedTestnet => "Synchronized with the test network. Normal testing.",
            XdagState::SyncedMainnet => "Synchronized with the main network. Normal operation.",
            XdagState::Transfer => "Waiting for transfer to complete.",
        };
        f.write_str(description)
    }
}

/// A state cell with a one-deep rollback slot, used when the node briefly
/// enters a transient state (e.g. transfer) and must restore the previous
/// one afterwards.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: XdagState,
    saved: Option<XdagState>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self { current: XdagState::Init, saved: None }
    }

    pub fn state(&self) -> XdagState {
        self.current
    }

    pub fn set(&mut self, state: XdagState) {
        self.current = state;
        self.saved = None;
    }

    pub fn set_temporary(&mut self, state: XdagState) {
        self.saved = Some(self.current);
        self.current = state;
    }

    pub fn rollback(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.current = saved;
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
