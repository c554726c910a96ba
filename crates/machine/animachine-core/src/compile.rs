//! Blob compiler: turns an authoring `StateMachine` into an immutable
//! `RuntimeBlob`.
//!
//! Compilation is a synchronous, single-threaded batch transform over a
//! read-only snapshot. Parameter references resolve against a stack of
//! scope frames (nearest enclosing declaration wins); a nested declaration
//! compatible with an enclosing one aliases the same runtime slot, so a
//! sub-machine's `Speed` and its ancestor's `Speed` share one index. Any
//! reference that resolves nowhere is a hard error, never a silent default.

use hashbrown::HashMap;
use thiserror::Error;

use crate::blob::{
    CompiledCondition, CompiledLayer, CompiledMachine, CompiledState, CompiledStateKind,
    CompiledTransition, ParamSlot, ParameterTable, RuntimeBlob,
};
use crate::curve::{simplify_easing, CurveKey};
use crate::graph::{
    Blend2DVariant, Condition, Layer, ParamKind, Parameter, StateKind, StateMachine, Transition,
    TransitionTarget,
};
use crate::ids::{IndexRange, NO_MASK, NO_PARAM, NO_STATE, NO_TRANSITION};
use crate::resolver::ParameterUsage;

/// Structural compile failures. All of these abort the compile attempt and
/// leave any previously published blob untouched.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("scope '{scope}': parameter '{name}' ({usage:?}) does not resolve to any declared parameter")]
    MissingParameter {
        scope: String,
        name: String,
        usage: ParameterUsage,
    },
    #[error("scope '{scope}': '{owner}' transition targets state index {target} outside the scope ({len} states)")]
    TransitionOutOfScope {
        scope: String,
        owner: String,
        target: u32,
        len: u32,
    },
    #[error("scope '{scope}': layer '{layer}' has malformed weight {weight}")]
    MalformedLayerWeight {
        scope: String,
        layer: String,
        weight: f32,
    },
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
}

type SlotKey = (ParamKind, String);

/// Compile a root scope into a self-contained runtime blob.
pub fn compile_state_machine(root: &StateMachine) -> Result<RuntimeBlob, CompileError> {
    root.validate_basic().map_err(CompileError::InvalidGraph)?;
    let mut compiler = Compiler::default();
    compiler.compile_scope(root)?;
    Ok(compiler.finish())
}

#[derive(Default)]
struct Compiler {
    parameters: ParameterTable,
    machines: Vec<CompiledMachine>,
    layers: Vec<CompiledLayer>,
    states: Vec<CompiledState>,
    transitions: Vec<CompiledTransition>,
    conditions: Vec<CompiledCondition>,
    blend1d_clips: Vec<u32>,
    blend1d_thresholds: Vec<f32>,
    blend2d_clips: Vec<u32>,
    blend2d_points: Vec<[f32; 2]>,
    curve_keys: Vec<CurveKey>,
    /// Scope frames, outermost first; lookups scan from the innermost.
    scopes: Vec<HashMap<SlotKey, u32>>,
}

/// Nested scopes discovered during a scope's state pass, compiled after the
/// scope's own tables are contiguous.
enum PendingNested<'a> {
    Machine(&'a StateMachine),
    Layers(&'a [Layer]),
}

impl Compiler {
    fn finish(self) -> RuntimeBlob {
        RuntimeBlob {
            parameters: self.parameters,
            machines: self.machines,
            layers: self.layers,
            states: self.states,
            transitions: self.transitions,
            conditions: self.conditions,
            blend1d_clips: self.blend1d_clips,
            blend1d_thresholds: self.blend1d_thresholds,
            blend2d_clips: self.blend2d_clips,
            blend2d_points: self.blend2d_points,
            curve_keys: self.curve_keys,
        }
    }

    fn lookup(&self, kind: ParamKind, name: &str) -> Option<u32> {
        let key = (kind, name.to_ascii_lowercase());
        self.scopes.iter().rev().find_map(|f| f.get(&key).copied())
    }

    fn alloc_slot(&mut self, p: &Parameter) -> u32 {
        match p.kind {
            ParamKind::Float => {
                self.parameters.floats.push(ParamSlot {
                    name: p.name.clone(),
                    default: p.default_float(),
                });
                self.parameters.floats.len() as u32 - 1
            }
            ParamKind::Bool => {
                self.parameters.bools.push(ParamSlot {
                    name: p.name.clone(),
                    default: p.default_bool(),
                });
                self.parameters.bools.len() as u32 - 1
            }
            ParamKind::Int => {
                self.parameters.ints.push(ParamSlot {
                    name: p.name.clone(),
                    default: p.default_int(),
                });
                self.parameters.ints.len() as u32 - 1
            }
            ParamKind::Trigger => {
                self.parameters.triggers.push(ParamSlot {
                    name: p.name.clone(),
                    default: false,
                });
                self.parameters.triggers.len() as u32 - 1
            }
        }
    }

    /// Enter a scope: each declared parameter either aliases the slot of a
    /// compatible declaration in the nearest enclosing scope, or owns a
    /// fresh slot in its kind's table.
    fn push_scope_frame(&mut self, scope: &StateMachine) {
        let mut frame = HashMap::new();
        for p in &scope.parameters {
            let key: SlotKey = (p.kind, p.name.to_ascii_lowercase());
            if frame.contains_key(&key) {
                continue;
            }
            let slot = match self.lookup(p.kind, &p.name) {
                Some(slot) => slot,
                None => self.alloc_slot(p),
            };
            frame.insert(key, slot);
        }
        self.scopes.push(frame);
    }

    /// Resolve a parameter reference to its dense slot, nearest enclosing
    /// declaration first. No declaration anywhere is a hard failure.
    fn require(
        &self,
        scope: &StateMachine,
        name: &str,
        kind: ParamKind,
        usage: ParameterUsage,
    ) -> Result<u32, CompileError> {
        self.lookup(kind, name)
            .ok_or_else(|| CompileError::MissingParameter {
                scope: scope.name.clone(),
                name: name.to_string(),
                usage,
            })
    }

    fn compile_scope(&mut self, scope: &StateMachine) -> Result<u32, CompileError> {
        self.push_scope_frame(scope);

        let machine_ix = self.machines.len() as u32;
        self.machines.push(CompiledMachine {
            name: scope.name.clone(),
            states: IndexRange::EMPTY,
            default_state: NO_STATE,
            any_transitions: IndexRange::EMPTY,
            any_exit_transition: NO_TRANSITION,
        });

        let state_start = self.states.len();
        let scope_len = scope.states.len() as u32;

        // First pass: this scope's states land contiguously. Nested scopes
        // are queued so their tables append after this range.
        let mut pending: Vec<(usize, PendingNested)> = Vec::new();
        for state in &scope.states {
            let transitions =
                self.compile_transitions(scope, &state.transitions, state_start, &state.name)?;
            let speed_parameter = match &state.speed_parameter {
                Some(name) => {
                    self.require(scope, name, ParamKind::Float, ParameterUsage::SpeedParameter)?
                }
                None => NO_PARAM,
            };
            let kind = match &state.kind {
                StateKind::Clip { clip } => CompiledStateKind::Clip { clip: *clip },
                StateKind::Blend1D { parameter, clips } => {
                    let parameter = self.require(
                        scope,
                        parameter,
                        ParamKind::Float,
                        ParameterUsage::BlendParameter,
                    )?;
                    let start = self.blend1d_clips.len();
                    let mut sorted = clips.clone();
                    sorted.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
                    for c in &sorted {
                        self.blend1d_clips.push(c.clip);
                        self.blend1d_thresholds.push(c.threshold);
                    }
                    CompiledStateKind::Blend1D {
                        parameter,
                        clips: IndexRange::new(start, sorted.len()),
                    }
                }
                StateKind::Blend2D {
                    variant,
                    parameter_x,
                    parameter_y,
                    clips,
                } => {
                    let parameter_x = self.require(
                        scope,
                        parameter_x,
                        ParamKind::Float,
                        ParameterUsage::BlendParameter,
                    )?;
                    let parameter_y = self.require(
                        scope,
                        parameter_y,
                        ParamKind::Float,
                        ParameterUsage::BlendParameter,
                    )?;
                    let start = self.blend2d_clips.len();
                    for c in clips {
                        self.blend2d_clips.push(c.clip);
                        self.blend2d_points.push(c.position);
                    }
                    let clips = IndexRange::new(start, clips.len());
                    match variant {
                        Blend2DVariant::SimpleDirectional => {
                            CompiledStateKind::Blend2DSimpleDirectional {
                                parameter_x,
                                parameter_y,
                                clips,
                            }
                        }
                        Blend2DVariant::InverseDistance => {
                            CompiledStateKind::Blend2DInverseDistance {
                                parameter_x,
                                parameter_y,
                                clips,
                            }
                        }
                    }
                }
                StateKind::SubMachine { machine } => {
                    pending.push((self.states.len(), PendingNested::Machine(machine)));
                    // Patched with the nested machine's index in the second pass.
                    CompiledStateKind::Machine { machine: u32::MAX }
                }
                StateKind::Layers { layers } => {
                    pending.push((self.states.len(), PendingNested::Layers(layers)));
                    CompiledStateKind::Layers {
                        layers: IndexRange::EMPTY,
                    }
                }
            };
            self.states.push(CompiledState {
                name: state.name.clone(),
                kind,
                speed: state.speed,
                speed_parameter,
                transitions,
            });
        }

        let any_transitions =
            self.compile_transitions(scope, &scope.any_transitions, state_start, "any-state")?;
        let any_exit_transition = match &scope.any_exit_transition {
            Some(tr) => {
                let range = self.compile_transitions(
                    scope,
                    core::slice::from_ref(tr),
                    state_start,
                    "any-state-exit",
                )?;
                range.start
            }
            None => NO_TRANSITION,
        };

        // validate_basic already bounds-checked the default state index.
        let default_state = match scope.default_state {
            Some(ix) => state_start as u32 + ix,
            None if scope_len > 0 => state_start as u32,
            None => NO_STATE,
        };

        self.machines[machine_ix as usize] = CompiledMachine {
            name: scope.name.clone(),
            states: IndexRange::new(state_start, scope.states.len()),
            default_state,
            any_transitions,
            any_exit_transition,
        };

        // Second pass: nested scopes, with this scope's frame still on the
        // stack so their parameters resolve nearest-first.
        for (state_ix, nested) in pending {
            match nested {
                PendingNested::Machine(machine) => {
                    let nested_ix = self.compile_scope(machine)?;
                    self.states[state_ix].kind = CompiledStateKind::Machine { machine: nested_ix };
                }
                PendingNested::Layers(layers) => {
                    let mut nested_machines = Vec::with_capacity(layers.len());
                    for layer in layers {
                        nested_machines.push(self.compile_scope(&layer.machine)?);
                    }
                    let layer_start = self.layers.len();
                    for (li, (layer, machine)) in
                        layers.iter().zip(nested_machines).enumerate()
                    {
                        // Layer 0 is structurally fixed at weight 1.
                        let weight = if li == 0 { 1.0 } else { layer.weight };
                        if !(weight.is_finite() && (0.0..=1.0).contains(&weight)) {
                            return Err(CompileError::MalformedLayerWeight {
                                scope: scope.name.clone(),
                                layer: layer.name.clone(),
                                weight,
                            });
                        }
                        self.layers.push(CompiledLayer {
                            name: layer.name.clone(),
                            machine,
                            weight,
                            blend: layer.blend,
                            mask: layer.mask.unwrap_or(NO_MASK),
                        });
                    }
                    self.states[state_ix].kind = CompiledStateKind::Layers {
                        layers: IndexRange::new(layer_start, layers.len()),
                    };
                }
            }
        }

        self.scopes.pop();
        Ok(machine_ix)
    }

    fn compile_transitions(
        &mut self,
        scope: &StateMachine,
        list: &[Transition],
        state_start: usize,
        owner: &str,
    ) -> Result<IndexRange, CompileError> {
        let start = self.transitions.len();
        for tr in list {
            let target = match tr.target {
                TransitionTarget::State(ix) => {
                    if ix as usize >= scope.states.len() {
                        return Err(CompileError::TransitionOutOfScope {
                            scope: scope.name.clone(),
                            owner: owner.to_string(),
                            target: ix,
                            len: scope.states.len() as u32,
                        });
                    }
                    state_start as u32 + ix
                }
                // Exit is a terminal marker, not a state; an any-state
                // transition to Exit is legal and never a cycle error.
                TransitionTarget::Exit => NO_STATE,
            };
            let cond_start = self.conditions.len();
            for c in &tr.conditions {
                let compiled = self.compile_condition(scope, c)?;
                self.conditions.push(compiled);
            }
            let simplified = simplify_easing(&tr.easing);
            let easing = if simplified.is_empty() {
                IndexRange::EMPTY
            } else {
                let s = self.curve_keys.len();
                self.curve_keys.extend(simplified);
                IndexRange::new(s, self.curve_keys.len() - s)
            };
            self.transitions.push(CompiledTransition {
                target,
                duration: tr.duration,
                exit_time: tr.exit_time,
                conditions: IndexRange::new(cond_start, tr.conditions.len()),
                easing,
            });
        }
        Ok(IndexRange::new(start, list.len()))
    }

    fn compile_condition(
        &self,
        scope: &StateMachine,
        c: &Condition,
    ) -> Result<CompiledCondition, CompileError> {
        use crate::graph::ConditionPred::*;
        let param = self.require(
            scope,
            &c.parameter,
            c.pred.implied_kind(),
            ParameterUsage::TransitionCondition,
        )?;
        Ok(match c.pred {
            If => CompiledCondition::If { param },
            IfNot => CompiledCondition::IfNot { param },
            Greater(threshold) => CompiledCondition::Greater { param, threshold },
            Less(threshold) => CompiledCondition::Less { param, threshold },
            IntEquals(value) => CompiledCondition::IntEquals { param, value },
            IntNotEquals(value) => CompiledCondition::IntNotEquals { param, value },
            Trigger => CompiledCondition::Trigger { param },
        })
    }
}
