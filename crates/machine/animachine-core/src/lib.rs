//! Engine-agnostic animation state machine core.
//!
//! The crate covers the offline half of an animation state machine runtime:
//! an authoring graph model (`graph`), static parameter dependency analysis
//! and cross-scope wiring (`resolver`), a compiler from the authoring graph
//! to an immutable flat runtime blob (`compile`, `blob`), allocation-free
//! blend weight evaluators (`blend`), and Hermite easing curves (`curve`).
//! Playback scheduling, pose sampling and output binding are left to the
//! consuming runtime, which reads the blob by dense index only.

pub mod blend;
pub mod blob;
pub mod compile;
pub mod curve;
pub mod graph;
pub mod host;
pub mod ids;
pub mod resolver;
pub mod snapshot;
pub mod values;

pub use blend::{
    blend_weights_1d, blend_weights_inverse_distance, blend_weights_simple_directional,
};
pub use blob::{
    CompiledCondition, CompiledLayer, CompiledMachine, CompiledState, CompiledStateKind,
    CompiledTransition, ParamSlot, ParameterTable, RuntimeBlob,
};
pub use compile::{compile_state_machine, CompileError};
pub use curve::{evaluate_curve, simplify_easing, CurveKey};
pub use graph::{
    Blend2DVariant, BlendClip1D, BlendClip2D, Condition, ConditionPred, Layer, LayerBlend,
    NestedContainer, ParamKind, ParamValue, Parameter, State, StateKind, StateMachine,
    SubMachineState, Transition, TransitionTarget,
};
pub use host::MachineHost;
pub use ids::{IndexRange, NO_MASK, NO_PARAM, NO_STATE, NO_TRANSITION};
pub use resolver::{
    analyze_required_parameters, find_compatible_parameter, find_orphaned_parameters,
    resolve_parameter_dependencies, resolve_parameter_dependencies_deep, ParameterLink,
    ParameterRequirement, ParameterUsage, ResolutionResult,
};
pub use snapshot::{parse_state_machine_json, SnapshotError};
pub use values::ParameterValues;
