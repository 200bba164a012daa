use std::fmt;

use parking_lot::RwLock;

use crate::error::OperatorError;

/// Operator lifecycle.
///
/// Allowed moves: `Starting -> Active`, `Active -> Paused`, and anything to `Error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorState {
    Starting,
    Active,
    Paused,
    Error,
}

impl OperatorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorState::Starting => "STARTING",
            OperatorState::Active => "ACTIVE",
            OperatorState::Paused => "PAUSED",
            OperatorState::Error => "ERROR",
        }
    }

    pub fn can_transition_to(self, next: OperatorState) -> bool {
        use OperatorState::*;
        matches!((self, next), (Starting, Active) | (Active, Paused) | (_, Error))
    }
}

impl fmt::Display for OperatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, thread-safe holder of the current [`OperatorState`].
#[derive(Debug)]
pub struct Lifecycle {
    state: RwLock<OperatorState>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(OperatorState::Starting),
        }
    }

    pub fn current(&self) -> OperatorState {
        *self.state.read()
    }

    /// Move to `next`, returning the previous state.
    pub fn transition(&self, next: OperatorState) -> Result<OperatorState, OperatorError> {
        let mut state = self.state.write();
        let from = *state;
        if !from.can_transition_to(next) {
            return Err(OperatorError::InvalidTransition { from, to: next });
        }
        *state = next;
        Ok(from)
    }

    pub fn fail(&self) -> OperatorState {
        std::mem::replace(&mut *self.state.write(), OperatorState::Error)
    }
}
