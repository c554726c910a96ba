//! Authoring-time state machine graph: the editor snapshot the resolver and
//! compiler consume. The compiler treats this model as read-only input;
//! persistence and editing live in the authoring layer.
//!
//! Scopes nest through container states (sub-machines and layers). Both
//! container kinds expose their nested scope through the `NestedContainer`
//! capability trait so the resolver and compiler never match on concrete
//! container types.

use serde::{Deserialize, Serialize};

use crate::curve::CurveKey;

/// Primitive parameter kinds. Floats, bools, ints and triggers occupy
/// separate index spaces in the compiled blob.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Float,
    Bool,
    Int,
    Trigger,
}

/// Authored default value for a parameter. Kept loosely typed; the compiler
/// coerces it to the declared kind when building the blob's default tables.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

/// A named, typed value slot owned by exactly one scope.
/// Identity is `(name, kind)`; compatibility across scopes is
/// case-insensitive on name and exact on kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub default: Option<ParamValue>,
}

impl Parameter {
    pub fn new(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default: None,
        }
    }

    pub fn with_default(name: &str, kind: ParamKind, default: ParamValue) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default: Some(default),
        }
    }

    /// Compatibility rule used for cross-scope linking.
    pub fn is_compatible_with(&self, other: &Parameter) -> bool {
        self.kind == other.kind && self.name.eq_ignore_ascii_case(&other.name)
    }

    pub fn default_float(&self) -> f32 {
        match self.default {
            Some(ParamValue::Float(f)) => f,
            Some(ParamValue::Int(i)) => i as f32,
            _ => 0.0,
        }
    }

    pub fn default_bool(&self) -> bool {
        matches!(self.default, Some(ParamValue::Bool(true)))
    }

    pub fn default_int(&self) -> i32 {
        match self.default {
            Some(ParamValue::Int(i)) => i,
            Some(ParamValue::Float(f)) => f as i32,
            _ => 0,
        }
    }
}

/// Comparison applied by a transition condition. The predicate fixes the
/// parameter kind the referenced name must resolve to.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionPred {
    If,
    IfNot,
    Greater(f32),
    Less(f32),
    IntEquals(i32),
    IntNotEquals(i32),
    Trigger,
}

impl ConditionPred {
    pub fn implied_kind(&self) -> ParamKind {
        match self {
            ConditionPred::If | ConditionPred::IfNot => ParamKind::Bool,
            ConditionPred::Greater(_) | ConditionPred::Less(_) => ParamKind::Float,
            ConditionPred::IntEquals(_) | ConditionPred::IntNotEquals(_) => ParamKind::Int,
            ConditionPred::Trigger => ParamKind::Trigger,
        }
    }
}

/// One transition condition: a parameter reference plus a predicate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub parameter: String,
    pub pred: ConditionPred,
}

impl Condition {
    pub fn new(parameter: &str, pred: ConditionPred) -> Self {
        Self {
            parameter: parameter.to_string(),
            pred,
        }
    }
}

/// Transition destination: a state in the same scope (dense index into the
/// owning scope's state list), or the exit boundary of the enclosing scope.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionTarget {
    State(u32),
    Exit,
}

/// An authored transition. `easing` is an optional Hermite curve shaping the
/// transition progress; an empty list (or a default-shaped linear curve)
/// compiles to the identity ramp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub target: TransitionTarget,
    pub duration: f32,
    #[serde(default)]
    pub exit_time: Option<f32>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub easing: Vec<CurveKey>,
}

impl Transition {
    pub fn to_state(state: u32, duration: f32) -> Self {
        Self {
            target: TransitionTarget::State(state),
            duration,
            exit_time: None,
            conditions: Vec::new(),
            easing: Vec::new(),
        }
    }

    pub fn to_exit(duration: f32) -> Self {
        Self {
            target: TransitionTarget::Exit,
            duration,
            exit_time: None,
            conditions: Vec::new(),
            easing: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// One clip sample on a 1D blend axis.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendClip1D {
    pub clip: u32,
    pub threshold: f32,
}

/// One clip sample in 2D blend-parameter space. A clip at the origin is the
/// idle clip for the simple-directional variant.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendClip2D {
    pub clip: u32,
    pub position: [f32; 2],
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Blend2DVariant {
    SimpleDirectional,
    InverseDistance,
}

/// Layer blend mode for parallel layers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerBlend {
    Override,
    Additive,
}

/// A parallel layer: an independent nested state machine with a weight,
/// blend mode, and optional bone mask. Layer 0 of a layer set is
/// structurally fixed at weight 1; the compiler enforces this.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub weight: f32,
    pub blend: LayerBlend,
    #[serde(default)]
    pub mask: Option<u32>,
    pub machine: StateMachine,
}

/// Closed set of state kinds. The compiler matches exhaustively; adding a
/// kind is a breaking change by design.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Clip {
        clip: u32,
    },
    Blend1D {
        parameter: String,
        clips: Vec<BlendClip1D>,
    },
    Blend2D {
        variant: Blend2DVariant,
        parameter_x: String,
        parameter_y: String,
        clips: Vec<BlendClip2D>,
    },
    SubMachine {
        machine: StateMachine,
    },
    Layers {
        layers: Vec<Layer>,
    },
}

fn default_speed() -> f32 {
    1.0
}

/// A named node in a scope. `speed_parameter` optionally names a float
/// parameter multiplying playback speed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    pub kind: StateKind,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default)]
    pub speed_parameter: Option<String>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl State {
    pub fn new(name: &str, kind: StateKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            speed: 1.0,
            speed_parameter: None,
            transitions: Vec::new(),
        }
    }

    /// View this state as a nested container, if it is a sub-machine.
    pub fn as_container(&self) -> Option<SubMachineState<'_>> {
        match &self.kind {
            StateKind::SubMachine { machine } => Some(SubMachineState {
                name: &self.name,
                machine,
            }),
            _ => None,
        }
    }
}

/// One state machine scope: the root graph, a nested sub-machine, or a
/// layer's machine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub states: Vec<State>,
    /// Source-agnostic transitions evaluated from any active state.
    #[serde(default)]
    pub any_transitions: Vec<Transition>,
    /// At most one any-state transition to the exit boundary.
    #[serde(default)]
    pub any_exit_transition: Option<Transition>,
    /// Entry state; defaults to state 0 when unset.
    #[serde(default)]
    pub default_state: Option<u32>,
}

/// Capability shared by everything that wires a nested scope into its
/// parent: sub-machine states and layers.
pub trait NestedContainer {
    fn nested_scope(&self) -> &StateMachine;
    fn display_name(&self) -> &str;
}

/// Borrowed view pairing a sub-machine state's name with its nested scope.
#[derive(Copy, Clone, Debug)]
pub struct SubMachineState<'a> {
    pub name: &'a str,
    pub machine: &'a StateMachine,
}

impl NestedContainer for SubMachineState<'_> {
    fn nested_scope(&self) -> &StateMachine {
        self.machine
    }
    fn display_name(&self) -> &str {
        self.name
    }
}

impl NestedContainer for Layer {
    fn nested_scope(&self) -> &StateMachine {
        &self.machine
    }
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl StateMachine {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Validate numeric sanity of the authored graph: finite durations and
    /// weights, exit times in [0,1], finite blend coordinates and curve keys,
    /// default state in range, exit slot actually targeting Exit. Structural
    /// checks that need the whole scope tree (transition target bounds,
    /// parameter resolution) belong to the compiler.
    pub fn validate_basic(&self) -> Result<(), String> {
        if let Some(ix) = self.default_state {
            if ix as usize >= self.states.len() {
                return Err(format!(
                    "'{}': default state index {ix} out of range ({} states)",
                    self.name,
                    self.states.len()
                ));
            }
        }
        for tr in self
            .any_transitions
            .iter()
            .chain(self.any_exit_transition.iter())
        {
            validate_transition(&self.name, tr)?;
        }
        if let Some(tr) = &self.any_exit_transition {
            if tr.target != TransitionTarget::Exit {
                return Err(format!(
                    "'{}': any-exit transition must target Exit",
                    self.name
                ));
            }
        }
        for state in &self.states {
            if !state.speed.is_finite() {
                return Err(format!(
                    "'{}': state '{}' has non-finite speed",
                    self.name, state.name
                ));
            }
            for tr in &state.transitions {
                validate_transition(&self.name, tr)?;
            }
            match &state.kind {
                StateKind::Clip { .. } => {}
                StateKind::Blend1D { clips, .. } => {
                    if clips.iter().any(|c| !c.threshold.is_finite()) {
                        return Err(format!(
                            "'{}': blend state '{}' has a non-finite threshold",
                            self.name, state.name
                        ));
                    }
                }
                StateKind::Blend2D { clips, .. } => {
                    if clips
                        .iter()
                        .any(|c| !(c.position[0].is_finite() && c.position[1].is_finite()))
                    {
                        return Err(format!(
                            "'{}': blend state '{}' has a non-finite clip position",
                            self.name, state.name
                        ));
                    }
                }
                StateKind::SubMachine { machine } => machine.validate_basic()?,
                StateKind::Layers { layers } => {
                    for layer in layers {
                        if !layer.weight.is_finite() {
                            return Err(format!(
                                "'{}': layer '{}' has non-finite weight",
                                self.name, layer.name
                            ));
                        }
                        layer.machine.validate_basic()?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn validate_transition(scope: &str, tr: &Transition) -> Result<(), String> {
    if !(tr.duration.is_finite() && tr.duration >= 0.0) {
        return Err(format!("'{scope}': transition duration must be finite and >= 0"));
    }
    if let Some(et) = tr.exit_time {
        if !(et.is_finite() && (0.0..=1.0).contains(&et)) {
            return Err(format!("'{scope}': transition exit time must be in [0,1]"));
        }
    }
    for key in &tr.easing {
        if !(key.time.is_finite()
            && key.value.is_finite()
            && key.in_tangent.is_finite()
            && key.out_tangent.is_finite())
        {
            return Err(format!("'{scope}': transition easing has a non-finite keyframe"));
        }
    }
    Ok(())
}
