//! Blob publication. Compilation happens off the evaluation path; the host
//! swaps the shared blob atomically, so readers either see the previous
//! complete blob or the new complete blob, never a partial one.

use std::sync::Arc;

use crate::blob::RuntimeBlob;
use crate::compile::{compile_state_machine, CompileError};
use crate::graph::StateMachine;

/// Owner of the currently published blob for one authoring graph.
#[derive(Default)]
pub struct MachineHost {
    current: Option<Arc<RuntimeBlob>>,
}

impl MachineHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last successfully compiled blob, if any. Clones of the `Arc` stay
    /// valid across later recompiles.
    pub fn current(&self) -> Option<Arc<RuntimeBlob>> {
        self.current.clone()
    }

    /// Compile `graph` and publish the result. On failure the previously
    /// published blob stays in place untouched.
    pub fn recompile(&mut self, graph: &StateMachine) -> Result<Arc<RuntimeBlob>, CompileError> {
        let blob = Arc::new(compile_state_machine(graph)?);
        self.current = Some(blob.clone());
        Ok(blob)
    }
}
