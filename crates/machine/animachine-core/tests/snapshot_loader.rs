use animachine_core::{
    compile_state_machine, parse_state_machine_json, ParamKind, SnapshotError,
};

const LOCOMOTION_JSON: &str = r#"{
  "name": "locomotion",
  "parameters": [
    { "name": "Speed", "kind": "float", "default": 0.0 },
    { "name": "Jump", "kind": "trigger" }
  ],
  "states": [
    {
      "name": "Idle",
      "kind": { "clip": { "clip": 0 } },
      "transitions": [
        {
          "target": { "state": 1 },
          "duration": 0.25,
          "conditions": [
            { "parameter": "Speed", "pred": { "greater": 0.1 } }
          ]
        }
      ]
    },
    {
      "name": "Move",
      "kind": {
        "blend1d": {
          "parameter": "Speed",
          "clips": [
            { "clip": 1, "threshold": 0.0 },
            { "clip": 2, "threshold": 3.0 }
          ]
        }
      },
      "speed_parameter": "Speed"
    }
  ],
  "any_transitions": [
    {
      "target": { "state": 0 },
      "duration": 0.1,
      "conditions": [
        { "parameter": "Jump", "pred": "trigger" }
      ]
    }
  ]
}"#;

#[test]
fn parses_an_authored_snapshot_and_compiles_it() {
    let machine = parse_state_machine_json(LOCOMOTION_JSON).unwrap();
    assert_eq!(machine.name, "locomotion");
    assert_eq!(machine.parameters.len(), 2);
    assert_eq!(machine.parameters[1].kind, ParamKind::Trigger);
    assert_eq!(machine.states.len(), 2);
    assert_eq!(machine.states[1].speed_parameter.as_deref(), Some("Speed"));

    let blob = compile_state_machine(&machine).unwrap();
    assert_eq!(blob.parameters.floats.len(), 1);
    assert_eq!(blob.blend1d_thresholds, vec![0.0, 3.0]);
}

#[test]
fn malformed_json_is_a_parse_error() {
    match parse_state_machine_json("{ \"name\": ") {
        Err(SnapshotError::Parse(_)) => {}
        other => panic!("expected Parse error, got {other:?}"),
    }
}

#[test]
fn out_of_range_exit_time_is_rejected() {
    let json = r#"{
      "name": "m",
      "states": [
        {
          "name": "Idle",
          "kind": { "clip": { "clip": 0 } },
          "transitions": [
            { "target": "exit", "duration": 0.2, "exit_time": 1.5 }
          ]
        }
      ]
    }"#;
    match parse_state_machine_json(json) {
        Err(SnapshotError::Invalid(msg)) => assert!(msg.contains("exit time")),
        other => panic!("expected Invalid error, got {other:?}"),
    }
}
