use std::sync::Arc;

use rstest::{fixture, rstest};
use stride_protocol::ScenarioFile;

use super::*;
use crate::world::{JsonScenarioSource, MockScenarioSource, ScenarioError};

const TEN_SECONDS: &str = r#"{
    "name": "ten-seconds",
    "step_length": 0.5,
    "finish_time": 10.0
}"#;

fn inline(content: &str) -> ScenarioRequest {
    ScenarioRequest::inline(
        ScenarioFile {
            name: "test".to_owned(),
            content: content.to_owned(),
        },
        None,
    )
}

#[fixture]
fn running() -> SimulationGateway {
    let mut gateway = SimulationGateway::new(Arc::new(JsonScenarioSource::default()));
    gateway
        .load_scenario(inline(TEN_SECONDS))
        .expect("load scenario");
    gateway.start_simulation().expect("start simulation");
    gateway
}

fn sim_time(gateway: &SimulationGateway) -> f64 {
    gateway
        .access_state(|world| world.sim_time())
        .expect("scenario loaded")
}

#[rstest]
fn advance_steps_to_target(mut running: SimulationGateway) {
    assert!(running.advance(2.0).expect("advance"));
    assert!((sim_time(&running) - 2.0).abs() < 1e-9);
    assert_eq!(running.stopped_early_at(), None);
}

#[rstest]
#[case(0.0)]
#[case(-3.0)]
fn past_targets_advance_one_step(mut running: SimulationGateway, #[case] target: f64) {
    assert!(running.advance(target).expect("advance"));
    assert!((sim_time(&running) - 0.5).abs() < 1e-9);
}

#[rstest]
fn advancing_past_the_end_records_early_stop(mut running: SimulationGateway) {
    assert!(running.advance(25.0).expect("advance"));
    assert_eq!(running.phase(), LifecyclePhase::Finished);
    let stopped = running.stopped_early_at().expect("stopped early");
    assert!((stopped - 10.0).abs() < 1e-9);
}

#[rstest]
fn advance_after_the_end_returns_false(mut running: SimulationGateway) {
    running.advance(10.0).expect("advance to end");
    running.advance(11.0).expect("observe end");
    let before = sim_time(&running);
    assert!(!running.advance(12.0).expect("advance after end"));
    assert!((sim_time(&running) - before).abs() < f64::EPSILON);
}

#[rstest]
fn stopping_is_idempotent(mut running: SimulationGateway) {
    assert!(running.stop_simulation_if_running());
    assert!(!running.stop_simulation_if_running());
    assert_eq!(running.phase(), LifecyclePhase::Stopped);
    assert!(!running.advance(1.0).expect("advance after stop"));
}

#[rstest]
fn finished_simulations_are_not_reported_as_halted(mut running: SimulationGateway) {
    running.advance(30.0).expect("advance to end");
    assert!(!running.stop_simulation_if_running());
}

#[rstest]
fn second_load_is_rejected(mut running: SimulationGateway) {
    let error = running
        .load_scenario(inline(TEN_SECONDS))
        .expect_err("second load");
    assert!(matches!(error, GatewayError::AlreadyLoaded));
}

#[test]
fn access_before_load_reports_missing_scenario() {
    let gateway = SimulationGateway::new(Arc::new(JsonScenarioSource::default()));
    let error = gateway
        .access_state(|world| world.sim_time())
        .expect_err("no scenario");
    assert!(matches!(error, GatewayError::NoScenario));
}

#[test]
fn advance_before_start_is_rejected() {
    let mut gateway = SimulationGateway::new(Arc::new(JsonScenarioSource::default()));
    gateway
        .load_scenario(inline(TEN_SECONDS))
        .expect("load scenario");
    let error = gateway.advance(1.0).expect_err("not started");
    assert!(matches!(error, GatewayError::NotStarted));
}

#[test]
fn source_failures_leave_the_gateway_idle() {
    let mut source = MockScenarioSource::new();
    source
        .expect_load()
        .times(1)
        .returning(|_| Err(ScenarioError::invalid("broken")));
    let mut gateway = SimulationGateway::new(Arc::new(source));

    let error = gateway
        .load_scenario(ScenarioRequest::from_path("broken.json"))
        .expect_err("load fails");
    assert!(error.to_string().contains("broken"));
    assert_eq!(gateway.phase(), LifecyclePhase::Idle);
}

#[rstest]
fn close_flag_is_recorded(running: SimulationGateway) {
    assert!(!running.client_close_received());
    running.mark_client_close_received();
    assert!(running.client_close_received());
}
