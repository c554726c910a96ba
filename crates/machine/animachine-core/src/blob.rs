//! Compiled runtime blob: flat, immutable, index-based tables.
//!
//! The blob is the sole artifact the downstream runtime consumes. Every
//! cross-reference is a dense u32 index valid for the blob's lifetime; no
//! name or pointer lookups remain on any per-frame path. A blob is built
//! once per compile, never mutated, and replaced wholesale on recompile.

use serde::{Deserialize, Serialize};

use crate::curve::{evaluate_curve, CurveKey};
use crate::graph::{LayerBlend, ParamKind};
use crate::ids::IndexRange;
use crate::values::ParameterValues;

/// One compiled parameter slot: name retained for diagnostics, default used
/// to seed a `ParameterValues` store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamSlot<T> {
    pub name: String,
    pub default: T,
}

/// Flattened parameter tables, one dense zero-based index space per
/// primitive kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterTable {
    pub floats: Vec<ParamSlot<f32>>,
    pub bools: Vec<ParamSlot<bool>>,
    pub ints: Vec<ParamSlot<i32>>,
    pub triggers: Vec<ParamSlot<bool>>,
}

impl ParameterTable {
    /// Name lookup for tooling and tests; per-frame code only ever sees the
    /// dense indices baked into states and conditions.
    pub fn find(&self, kind: ParamKind, name: &str) -> Option<u32> {
        fn pos<T>(slots: &[ParamSlot<T>], name: &str) -> Option<u32> {
            slots
                .iter()
                .position(|s| s.name.eq_ignore_ascii_case(name))
                .map(|p| p as u32)
        }
        match kind {
            ParamKind::Float => pos(&self.floats, name),
            ParamKind::Bool => pos(&self.bools, name),
            ParamKind::Int => pos(&self.ints, name),
            ParamKind::Trigger => pos(&self.triggers, name),
        }
    }
}

/// A transition condition with its parameter reference rewritten to a dense
/// per-kind index.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CompiledCondition {
    If { param: u32 },
    IfNot { param: u32 },
    Greater { param: u32, threshold: f32 },
    Less { param: u32, threshold: f32 },
    IntEquals { param: u32, value: i32 },
    IntNotEquals { param: u32, value: i32 },
    Trigger { param: u32 },
}

impl CompiledCondition {
    pub fn evaluate(&self, values: &ParameterValues) -> bool {
        match *self {
            CompiledCondition::If { param } => values.bool(param),
            CompiledCondition::IfNot { param } => !values.bool(param),
            CompiledCondition::Greater { param, threshold } => values.float(param) > threshold,
            CompiledCondition::Less { param, threshold } => values.float(param) < threshold,
            CompiledCondition::IntEquals { param, value } => values.int(param) == value,
            CompiledCondition::IntNotEquals { param, value } => values.int(param) != value,
            CompiledCondition::Trigger { param } => values.trigger(param),
        }
    }
}

/// A compiled transition. `target` is a global state index, or `NO_STATE`
/// for the exit marker. An empty easing range is the identity ramp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledTransition {
    pub target: u32,
    pub duration: f32,
    pub exit_time: Option<f32>,
    pub conditions: IndexRange,
    pub easing: IndexRange,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CompiledStateKind {
    Clip {
        clip: u32,
    },
    /// Clip range into `blend1d_clips`/`blend1d_thresholds`, sorted by
    /// threshold at compile time.
    Blend1D {
        parameter: u32,
        clips: IndexRange,
    },
    /// Clip range into `blend2d_clips`/`blend2d_points`.
    Blend2DSimpleDirectional {
        parameter_x: u32,
        parameter_y: u32,
        clips: IndexRange,
    },
    Blend2DInverseDistance {
        parameter_x: u32,
        parameter_y: u32,
        clips: IndexRange,
    },
    Machine {
        machine: u32,
    },
    Layers {
        layers: IndexRange,
    },
}

/// A compiled state. `speed_parameter` is a float-table index or `NO_PARAM`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledState {
    pub name: String,
    pub kind: CompiledStateKind,
    pub speed: f32,
    pub speed_parameter: u32,
    pub transitions: IndexRange,
}

/// A compiled layer. `mask` is a bone-mask id or `NO_MASK`. Layer 0 of a
/// range always carries weight 1.0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledLayer {
    pub name: String,
    pub machine: u32,
    pub weight: f32,
    pub blend: LayerBlend,
    pub mask: u32,
}

/// Per-scope record: its contiguous state range, entry state, any-state
/// transitions, and the fixed optional any-exit slot (`NO_TRANSITION` when
/// absent).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledMachine {
    pub name: String,
    pub states: IndexRange,
    pub default_state: u32,
    pub any_transitions: IndexRange,
    pub any_exit_transition: u32,
}

/// The compiled output of one authoring graph. `machines[0]` is the root
/// scope; nested scopes follow in depth-first order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeBlob {
    pub parameters: ParameterTable,
    pub machines: Vec<CompiledMachine>,
    pub layers: Vec<CompiledLayer>,
    pub states: Vec<CompiledState>,
    pub transitions: Vec<CompiledTransition>,
    pub conditions: Vec<CompiledCondition>,
    pub blend1d_clips: Vec<u32>,
    pub blend1d_thresholds: Vec<f32>,
    pub blend2d_clips: Vec<u32>,
    pub blend2d_points: Vec<[f32; 2]>,
    pub curve_keys: Vec<CurveKey>,
}

impl RuntimeBlob {
    pub fn root(&self) -> &CompiledMachine {
        &self.machines[0]
    }

    pub fn machine_states(&self, machine: &CompiledMachine) -> &[CompiledState] {
        &self.states[machine.states.as_range()]
    }

    pub fn state_transitions(&self, state: &CompiledState) -> &[CompiledTransition] {
        &self.transitions[state.transitions.as_range()]
    }

    pub fn any_transitions(&self, machine: &CompiledMachine) -> &[CompiledTransition] {
        &self.transitions[machine.any_transitions.as_range()]
    }

    pub fn transition_conditions(&self, tr: &CompiledTransition) -> &[CompiledCondition] {
        &self.conditions[tr.conditions.as_range()]
    }

    pub fn machine_layers(&self, layers: IndexRange) -> &[CompiledLayer] {
        &self.layers[layers.as_range()]
    }

    /// True when every condition on the transition holds (a condition-free
    /// transition is always satisfied).
    pub fn transition_satisfied(&self, tr: &CompiledTransition, values: &ParameterValues) -> bool {
        self.transition_conditions(tr)
            .iter()
            .all(|c| c.evaluate(values))
    }

    /// Ease raw transition progress through the transition's curve. The
    /// empty range takes the identity fast path.
    pub fn transition_progress(&self, tr: &CompiledTransition, raw: f32) -> f32 {
        evaluate_curve(&self.curve_keys[tr.easing.as_range()], raw)
    }

    /// A state's effective playback speed under the given parameter values.
    pub fn state_speed(&self, state: &CompiledState, values: &ParameterValues) -> f32 {
        if state.speed_parameter == crate::ids::NO_PARAM {
            state.speed
        } else {
            state.speed * values.float(state.speed_parameter)
        }
    }

    /// Compute a blend state's per-clip weights into `weights`, resizing it
    /// to the clip count. Non-blend states get a single weight of 1 for
    /// their clip; container states clear the output.
    pub fn state_blend_weights(
        &self,
        state: &CompiledState,
        values: &ParameterValues,
        weights: &mut Vec<f32>,
    ) {
        match state.kind {
            CompiledStateKind::Clip { .. } => {
                weights.resize(1, 0.0);
                weights[0] = 1.0;
            }
            CompiledStateKind::Blend1D { parameter, clips } => {
                let thresholds = &self.blend1d_thresholds[clips.as_range()];
                weights.resize(thresholds.len(), 0.0);
                crate::blend::blend_weights_1d(thresholds, values.float(parameter), weights);
            }
            CompiledStateKind::Blend2DSimpleDirectional {
                parameter_x,
                parameter_y,
                clips,
            } => {
                let points = &self.blend2d_points[clips.as_range()];
                weights.resize(points.len(), 0.0);
                crate::blend::blend_weights_simple_directional(
                    points,
                    [values.float(parameter_x), values.float(parameter_y)],
                    weights,
                );
            }
            CompiledStateKind::Blend2DInverseDistance {
                parameter_x,
                parameter_y,
                clips,
            } => {
                let points = &self.blend2d_points[clips.as_range()];
                weights.resize(points.len(), 0.0);
                crate::blend::blend_weights_inverse_distance(
                    points,
                    [values.float(parameter_x), values.float(parameter_y)],
                    weights,
                );
            }
            CompiledStateKind::Machine { .. } | CompiledStateKind::Layers { .. } => {
                weights.clear();
            }
        }
    }
}
