//! Process lifecycle: Created -> Starting -> Started -> Stopping -> Stopped

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Created,
    Starting,
    Started,
    Stopping,
    Stopped,
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HostState::Created => "created",
            HostState::Starting => "starting",
            HostState::Started => "started",
            HostState::Stopping => "stopping",
            HostState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

impl HostState {
    fn next(self) -> Option<HostState> {
        match self {
            HostState::Created => Some(HostState::Starting),
            HostState::Starting => Some(HostState::Started),
            HostState::Started => Some(HostState::Stopping),
            HostState::Stopping => Some(HostState::Stopped),
            HostState::Stopped => None,
        }
    }

    fn log_message(self) -> &'static str {
        match self {
            HostState::Created => "Host created",
            HostState::Starting => "1. Start requested",
            HostState::Started => "2. Host started",
            HostState::Stopping => "3. Host stopping",
            HostState::Stopped => "4. Host stopped",
        }
    }
}

/// Tracks the host state. Only single forward steps are taken; anything else
/// is logged and ignored.
#[derive(Debug)]
pub struct Lifecycle {
    state: HostState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Lifecycle {
            state: HostState::Created,
        }
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    /// Move to `target`; returns whether the transition happened
    pub fn transition(&mut self, target: HostState) -> bool {
        if self.state.next() != Some(target) {
            log::warn!(
                "Ignoring lifecycle transition {} -> {}",
                self.state,
                target
            );
            return false;
        }
        self.state = target;
        log::info!("{}", target.log_message());
        true
    }
}
