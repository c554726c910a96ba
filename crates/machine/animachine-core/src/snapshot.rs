//! JSON snapshot loading for authored graphs.

use thiserror::Error;

use crate::graph::StateMachine;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to parse state machine JSON: {0}")]
    Parse(String),
    #[error("invalid state machine: {0}")]
    Invalid(String),
}

/// Parse an authored graph from its JSON snapshot and run the basic
/// numeric validation pass. Structural checks run later at compile time.
pub fn parse_state_machine_json(json: &str) -> Result<StateMachine, SnapshotError> {
    let machine: StateMachine =
        serde_json::from_str(json).map_err(|e| SnapshotError::Parse(e.to_string()))?;
    machine.validate_basic().map_err(SnapshotError::Invalid)?;
    Ok(machine)
}
