//! Scenario documents shared by the suites.

use stride_protocol::{Command, CommandPayload, ScenarioFile, TraciCommand};

/// Two walkers and one wall. Pedestrian 1 walks east at 1 m/s towards
/// target 1; pedestrian 2 starts half a metre from target 2 and arrives in
/// the first step.
pub const CORRIDOR: &str = r#"{
    "name": "corridor",
    "step_length": 0.5,
    "finish_time": 10.0,
    "obstacles": [
        {"id": 7, "shape": [{"x": 2, "y": 2}, {"x": 4, "y": 2}, {"x": 4, "y": 3}, {"x": 2, "y": 3}]}
    ],
    "targets": [
        {"id": 1, "shape": [{"x": 9, "y": 0}, {"x": 10, "y": 0}, {"x": 10, "y": 1}, {"x": 9, "y": 1}]},
        {"id": 2, "shape": [{"x": 0, "y": 4}, {"x": 1, "y": 4}, {"x": 1, "y": 5}, {"x": 0, "y": 5}]}
    ],
    "pedestrians": [
        {"id": 1, "position": {"x": 0.5, "y": 0.5}, "targets": [1], "free_flow_speed": 1.0},
        {"id": 2, "position": {"x": 1.0, "y": 4.5}, "targets": [2]}
    ]
}"#;

/// Finishes after two steps of half a second.
pub const SHORT_RUN: &str = r#"{
    "name": "short-run",
    "step_length": 0.5,
    "finish_time": 1.0,
    "targets": [
        {"id": 1, "shape": [{"x": 9, "y": 0}, {"x": 10, "y": 0}, {"x": 10, "y": 1}, {"x": 9, "y": 1}]}
    ],
    "pedestrians": [
        {"id": 1, "position": {"x": 0.5, "y": 0.5}, "targets": [1], "free_flow_speed": 1.0}
    ]
}"#;

#[must_use]
pub fn scenario_file(content: &str) -> ScenarioFile {
    ScenarioFile {
        name: String::new(),
        content: content.to_owned(),
    }
}

/// `SendFile` command carrying `content` inline.
#[must_use]
pub fn scenario_command(content: &str) -> Command {
    Command::new(TraciCommand::SendFile.id()).with_payload(CommandPayload::Scenario {
        file: scenario_file(content),
        cache: None,
    })
}
