//! Parameter dependency analysis and cross-scope resolution.
//!
//! Static analysis walks a scope's states and transitions to discover which
//! parameters it requires and how it uses them. Resolution then wires a
//! nested scope (behind a `NestedContainer`) to compatible parameters in its
//! ancestor scopes, nearest enclosing scope first, so an intermediate scope
//! can shadow an outer declaration by re-declaring a same-named parameter.
//!
//! Everything here is diagnostics-as-data: missing parameters and orphans
//! are returned in structured results, never raised as errors, so the
//! authoring layer can display them and let the user fix the graph.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::graph::{
    Condition, NestedContainer, ParamKind, Parameter, StateKind, StateMachine, Transition,
};

/// How a scope uses a required parameter.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ParameterUsage {
    SpeedParameter,
    BlendParameter,
    TransitionCondition,
}

/// One discovered requirement: a parameter a scope needs, and why.
/// Purely descriptive; never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterRequirement {
    pub parameter: Parameter,
    pub usage: ParameterUsage,
}

/// A resolved binding from a descendant scope's parameter to a compatible
/// parameter in an ancestor scope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterLink {
    /// The ancestor scope's parameter supplying the value.
    pub source: Parameter,
    /// The descendant scope's parameter (or synthesized requirement).
    pub target: Parameter,
    /// Display name of the container that was wired.
    pub container: String,
}

/// Outcome of wiring one container into its ancestors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub links: Vec<ParameterLink>,
    pub missing: Vec<ParameterRequirement>,
}

impl ResolutionResult {
    pub fn has_links(&self) -> bool {
        !self.links.is_empty()
    }

    pub fn has_missing_parameters(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// The parameter a requirement refers to: the scope's declared parameter of
/// the implied kind when one exists, otherwise a parameter synthesized from
/// the usage site so resolution can still search ancestors for it.
fn requirement_parameter(scope: &StateMachine, name: &str, kind: ParamKind) -> Parameter {
    scope
        .parameters
        .iter()
        .find(|p| p.kind == kind && p.name.eq_ignore_ascii_case(name))
        .cloned()
        .unwrap_or_else(|| Parameter::new(name, kind))
}

fn push_requirement(
    out: &mut Vec<ParameterRequirement>,
    parameter: Parameter,
    usage: ParameterUsage,
) {
    let duplicate = out.iter().any(|r| {
        r.usage == usage
            && r.parameter.kind == parameter.kind
            && r.parameter.name.eq_ignore_ascii_case(&parameter.name)
    });
    if !duplicate {
        out.push(ParameterRequirement { parameter, usage });
    }
}

fn push_condition_requirements(
    scope: &StateMachine,
    conditions: &[Condition],
    out: &mut Vec<ParameterRequirement>,
) {
    for c in conditions {
        let param = requirement_parameter(scope, &c.parameter, c.pred.implied_kind());
        push_requirement(out, param, ParameterUsage::TransitionCondition);
    }
}

/// Walk every state and transition in `scope` and list the parameters it
/// requires, deduplicated by `(name, kind, usage)`. An empty scope yields an
/// empty list. Nested scopes are not descended into; they carry their own
/// requirements and are wired separately.
pub fn analyze_required_parameters(scope: &StateMachine) -> Vec<ParameterRequirement> {
    let mut out = Vec::new();
    for state in &scope.states {
        if let Some(name) = &state.speed_parameter {
            let param = requirement_parameter(scope, name, ParamKind::Float);
            push_requirement(&mut out, param, ParameterUsage::SpeedParameter);
        }
        match &state.kind {
            StateKind::Blend1D { parameter, .. } => {
                let param = requirement_parameter(scope, parameter, ParamKind::Float);
                push_requirement(&mut out, param, ParameterUsage::BlendParameter);
            }
            StateKind::Blend2D {
                parameter_x,
                parameter_y,
                ..
            } => {
                let px = requirement_parameter(scope, parameter_x, ParamKind::Float);
                push_requirement(&mut out, px, ParameterUsage::BlendParameter);
                let py = requirement_parameter(scope, parameter_y, ParamKind::Float);
                push_requirement(&mut out, py, ParameterUsage::BlendParameter);
            }
            _ => {}
        }
        for tr in &state.transitions {
            push_condition_requirements(scope, &tr.conditions, &mut out);
        }
    }
    for tr in &scope.any_transitions {
        push_condition_requirements(scope, &tr.conditions, &mut out);
    }
    if let Some(tr) = &scope.any_exit_transition {
        push_condition_requirements(scope, &tr.conditions, &mut out);
    }
    out
}

/// Linear scan of the ancestor's parameter list: first parameter whose name
/// matches case-insensitively and whose kind matches exactly. Never errors.
pub fn find_compatible_parameter<'a>(
    ancestor: &'a StateMachine,
    child: &Parameter,
) -> Option<&'a Parameter> {
    ancestor.parameters.iter().find(|p| p.is_compatible_with(child))
}

/// Wire a container's nested scope against a chain of ancestor scopes,
/// ordered nearest enclosing scope first. Each requirement that finds a
/// compatible ancestor parameter becomes a link; each that does not is
/// accumulated as missing. The nearest ancestor with a compatible parameter
/// always wins, which is what lets intermediate scopes shadow outer ones.
pub fn resolve_parameter_dependencies_deep(
    ancestors: &[&StateMachine],
    container: &dyn NestedContainer,
) -> ResolutionResult {
    let scope = container.nested_scope();
    let mut result = ResolutionResult::default();
    for req in analyze_required_parameters(scope) {
        let source = ancestors
            .iter()
            .find_map(|ancestor| find_compatible_parameter(ancestor, &req.parameter));
        match source {
            Some(source) => {
                let duplicate = result.links.iter().any(|l| {
                    l.target.kind == req.parameter.kind
                        && l.target.name.eq_ignore_ascii_case(&req.parameter.name)
                });
                if !duplicate {
                    result.links.push(ParameterLink {
                        source: source.clone(),
                        target: req.parameter,
                        container: container.display_name().to_string(),
                    });
                }
            }
            None => result.missing.push(req),
        }
    }
    result
}

/// Wire a container directly against its enclosing scope. This is the gate
/// the authoring layer consults before accepting a sub-machine or layer into
/// a parent graph.
pub fn resolve_parameter_dependencies(
    ancestor: &StateMachine,
    container: &dyn NestedContainer,
) -> ResolutionResult {
    resolve_parameter_dependencies_deep(core::slice::from_ref(&ancestor), container)
}

fn add_name(out: &mut HashSet<String>, name: &str) {
    out.insert(name.to_ascii_lowercase());
}

fn add_condition_names(out: &mut HashSet<String>, tr: &Transition) {
    for c in &tr.conditions {
        add_name(out, &c.parameter);
    }
}

fn collect_referenced_names(scope: &StateMachine, out: &mut HashSet<String>) {
    for state in &scope.states {
        if let Some(name) = &state.speed_parameter {
            add_name(out, name);
        }
        match &state.kind {
            StateKind::Blend1D { parameter, .. } => add_name(out, parameter),
            StateKind::Blend2D {
                parameter_x,
                parameter_y,
                ..
            } => {
                add_name(out, parameter_x);
                add_name(out, parameter_y);
            }
            _ => {}
        }
        for tr in &state.transitions {
            add_condition_names(out, tr);
        }
    }
    for tr in &scope.any_transitions {
        add_condition_names(out, tr);
    }
    if let Some(tr) = &scope.any_exit_transition {
        add_condition_names(out, tr);
    }
}

/// Declared parameters that no state and no transition condition in `scope`
/// references. Diagnostics only; orphans never block compilation.
pub fn find_orphaned_parameters(scope: &StateMachine) -> Vec<Parameter> {
    let mut referenced = HashSet::new();
    collect_referenced_names(scope, &mut referenced);
    scope
        .parameters
        .iter()
        .filter(|p| !referenced.contains(&p.name.to_ascii_lowercase()))
        .cloned()
        .collect()
}
