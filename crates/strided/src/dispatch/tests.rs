//! Dispatcher behaviour independent of any particular domain.

use std::sync::Arc;

use rstest::rstest;
use stride_protocol::{Command, ResponseData, Status, TraciCommand, Value, ValueKind};

use crate::tests::support::SessionHarness;
use crate::world::JsonScenarioSource;

use super::{
    CommandHandler, Dispatcher, HandlerContext, HandlerError, HandlerOutcome, HandlerRegistry,
    INTERNAL_ERROR_MESSAGE,
};

fn harness_with(command: TraciCommand, handler: Arc<dyn CommandHandler>) -> SessionHarness {
    let registry = HandlerRegistry::builder().register(command, handler).build();
    SessionHarness::with_parts(
        Dispatcher::new(registry),
        Arc::new(JsonScenarioSource::new(None)),
    )
}

fn panicking(
    _command: &Command,
    _context: &mut HandlerContext<'_>,
) -> Result<HandlerOutcome, HandlerError> {
    panic!("handler exploded");
}

fn mislabelled(
    _command: &Command,
    _context: &mut HandlerContext<'_>,
) -> Result<HandlerOutcome, HandlerError> {
    Ok(HandlerOutcome::value(ValueKind::Double, Value::Text("1.5".to_owned())))
}

#[rstest]
#[case(0x42)]
#[case(0xff)]
fn unknown_ids_are_not_found(#[case] command_id: u8) {
    let mut harness = SessionHarness::new();

    let response = harness.execute(&Command::new(command_id));

    assert_eq!(response.status(), Status::Err);
    assert_eq!(response.description(), "ID not found");
    assert_eq!(response.command_id(), command_id);
}

#[rstest]
fn handler_panics_become_error_responses() {
    let mut harness = harness_with(TraciCommand::GetVersion, Arc::new(panicking));

    let response = harness.control(TraciCommand::GetVersion);

    assert_eq!(response.status(), Status::Err);
    assert_eq!(response.description(), INTERNAL_ERROR_MESSAGE);

    let again = harness.control(TraciCommand::GetVersion);
    assert_eq!(again.status(), Status::Err, "session survives the panic");
}

#[rstest]
fn unrenderable_results_are_reported() {
    let mut harness = harness_with(TraciCommand::GetPersonValue, Arc::new(mislabelled));

    let response = harness.get(TraciCommand::GetPersonValue, 0x40, "1");

    assert_eq!(response.status(), Status::Err);
    assert!(
        response.description().starts_with("error building response"),
        "unexpected description: {}",
        response.description()
    );
    assert_eq!(response.data(), None);
}

#[rstest]
fn handler_errors_keep_the_command_context() {
    let mut harness = SessionHarness::new();

    let response = harness.get(TraciCommand::GetPersonValue, 0x42, "1");

    assert_eq!(response.status(), Status::Err);
    assert_eq!(response.description(), "no scenario loaded");
    assert_eq!(response.variable_id(), Some(0x42));
    assert_eq!(response.element_id(), Some("1"));
}

#[rstest]
fn closing_sessions_refuse_every_command() {
    let mut harness = SessionHarness::new();
    assert_eq!(harness.control(TraciCommand::Close).status(), Status::Ok);

    for command in [TraciCommand::GetVersion, TraciCommand::Close] {
        let response = harness.control(command);
        assert_eq!(response.status(), Status::Err);
        assert_eq!(response.description(), "session is closing");
    }
}

#[rstest]
fn version_is_answered_before_any_scenario() {
    let mut harness = SessionHarness::new();

    let response = harness.control(TraciCommand::GetVersion);

    match response.data() {
        Some(ResponseData::Version { version, identifier }) => {
            assert_eq!(*version, 21);
            assert!(identifier.starts_with("stride "));
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[rstest]
fn standard_registry_covers_every_command() {
    let registry = crate::domains::standard_registry();

    let known: Vec<TraciCommand> = (0..=u8::MAX).filter_map(TraciCommand::from_id).collect();

    assert_eq!(registry.len(), known.len());
    for command in known {
        assert!(
            registry.get(command.id()).is_some(),
            "{} has no handler",
            command.name()
        );
    }
}
