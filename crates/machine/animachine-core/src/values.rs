//! Dense per-kind parameter value store, the mutable counterpart of the
//! blob's `ParameterTable`. One store per state-machine instance; evaluators
//! read it by dense index only.
//!
//! Accessors are fail-soft: an out-of-range read returns the kind's zero
//! value and an out-of-range write is ignored, because these run inside a
//! frame loop that must never panic.

use serde::{Deserialize, Serialize};

use crate::blob::ParameterTable;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterValues {
    floats: Vec<f32>,
    bools: Vec<bool>,
    ints: Vec<i32>,
    triggers: Vec<bool>,
}

impl ParameterValues {
    /// Seed a store from a compiled table's defaults. Triggers always start
    /// unset.
    pub fn from_table(table: &ParameterTable) -> Self {
        Self {
            floats: table.floats.iter().map(|s| s.default).collect(),
            bools: table.bools.iter().map(|s| s.default).collect(),
            ints: table.ints.iter().map(|s| s.default).collect(),
            triggers: vec![false; table.triggers.len()],
        }
    }

    #[inline]
    pub fn float(&self, ix: u32) -> f32 {
        self.floats.get(ix as usize).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn bool(&self, ix: u32) -> bool {
        self.bools.get(ix as usize).copied().unwrap_or(false)
    }

    #[inline]
    pub fn int(&self, ix: u32) -> i32 {
        self.ints.get(ix as usize).copied().unwrap_or(0)
    }

    #[inline]
    pub fn trigger(&self, ix: u32) -> bool {
        self.triggers.get(ix as usize).copied().unwrap_or(false)
    }

    pub fn set_float(&mut self, ix: u32, value: f32) {
        if let Some(slot) = self.floats.get_mut(ix as usize) {
            *slot = value;
        }
    }

    pub fn set_bool(&mut self, ix: u32, value: bool) {
        if let Some(slot) = self.bools.get_mut(ix as usize) {
            *slot = value;
        }
    }

    pub fn set_int(&mut self, ix: u32, value: i32) {
        if let Some(slot) = self.ints.get_mut(ix as usize) {
            *slot = value;
        }
    }

    /// Arm a trigger; it stays set until reset by the consumer of the
    /// transition it fired.
    pub fn set_trigger(&mut self, ix: u32) {
        if let Some(slot) = self.triggers.get_mut(ix as usize) {
            *slot = true;
        }
    }

    pub fn reset_trigger(&mut self, ix: u32) {
        if let Some(slot) = self.triggers.get_mut(ix as usize) {
            *slot = false;
        }
    }
}
