//! Per-domain command handlers.
//!
//! Each entity domain has one handler serving its Get and Set commands.
//! Variable ids decode into a closed per-domain enum; ids outside the table
//! are answered `NotImplemented` ("Unknown command"), and variables the server
//! deliberately does not support are answered `NotImplemented` naming the
//! variable.

mod control;
mod misc;
mod person;
mod polygon;
mod simulation;
mod vehicle;

use std::sync::Arc;

use stride_protocol::{Command, CommandPayload, Domain, TraciCommand, Value, ValueKind};

use crate::dispatch::{HandlerError, HandlerRegistry};
use crate::subscription::SubscribeHandler;

pub use self::control::{
    CloseHandler, GetStateHandler, LoadHandler, SERVER_IDENTIFIER, SimStepHandler,
    VersionHandler,
};
pub use self::misc::MiscHandler;
pub use self::person::PersonHandler;
pub use self::polygon::PolygonHandler;
pub use self::simulation::SimulationHandler;
pub use self::vehicle::VehicleHandler;

/// Builds the registry serving every command the server understands.
#[must_use]
pub fn standard_registry() -> HandlerRegistry {
    let person = Arc::new(PersonHandler);
    let polygon = Arc::new(PolygonHandler);
    let vehicle = Arc::new(VehicleHandler);
    let simulation = Arc::new(SimulationHandler);
    let misc = Arc::new(MiscHandler);
    let load = Arc::new(LoadHandler);

    HandlerRegistry::builder()
        .register(TraciCommand::GetVersion, Arc::new(VersionHandler))
        .register(TraciCommand::Load, load.clone())
        .register(TraciCommand::SendFile, load)
        .register(TraciCommand::SimStep, Arc::new(SimStepHandler))
        .register(TraciCommand::GetState, Arc::new(GetStateHandler))
        .register(TraciCommand::Close, Arc::new(CloseHandler))
        .register(TraciCommand::GetPersonValue, person.clone())
        .register(TraciCommand::SetPersonState, person)
        .register(TraciCommand::GetPolygonValue, polygon.clone())
        .register(TraciCommand::SetPolygonState, polygon)
        .register(TraciCommand::GetVehicleValue, vehicle.clone())
        .register(TraciCommand::SetVehicleState, vehicle)
        .register(TraciCommand::GetSimulationValue, simulation.clone())
        .register(TraciCommand::SetSimulationState, simulation)
        .register(TraciCommand::GetMiscValue, misc.clone())
        .register(TraciCommand::SetMiscState, misc)
        .register(
            TraciCommand::SubPersonValue,
            Arc::new(SubscribeHandler::new(Domain::Person)),
        )
        .register(
            TraciCommand::SubPolygonValue,
            Arc::new(SubscribeHandler::new(Domain::Polygon)),
        )
        .register(
            TraciCommand::SubVehicleValue,
            Arc::new(SubscribeHandler::new(Domain::Vehicle)),
        )
        .register(
            TraciCommand::SubSimulationValue,
            Arc::new(SubscribeHandler::new(Domain::Simulation)),
        )
        .register(
            TraciCommand::SubMiscValue,
            Arc::new(SubscribeHandler::new(Domain::Misc)),
        )
        .build()
}

pub(crate) fn variable_id(command: &Command) -> Result<u8, HandlerError> {
    command.variable_id().ok_or(HandlerError::MissingVariable)
}

pub(crate) fn element_id(command: &Command) -> Result<&str, HandlerError> {
    command.element_id().ok_or(HandlerError::MissingElementId)
}

/// Parses a numeric element id. Ids that are not numbers cannot name any
/// element and are reported as missing elements.
pub(crate) fn numeric_element(command: &Command) -> Result<i32, HandlerError> {
    let raw = element_id(command)?;
    raw.trim()
        .parse()
        .map_err(|_| HandlerError::NoElement {
            element_id: raw.to_owned(),
        })
}

pub(crate) fn no_element(command: &Command) -> HandlerError {
    HandlerError::NoElement {
        element_id: command.element_id().unwrap_or_default().to_owned(),
    }
}

/// The typed value carried by a Set command.
pub(crate) fn set_value(command: &Command) -> Result<&Value, HandlerError> {
    match command.payload() {
        Some(CommandPayload::Value(value)) => Ok(value),
        Some(_) => Err(HandlerError::UnexpectedPayload { operation: "set" }),
        None => Err(HandlerError::MissingPayload { operation: "set" }),
    }
}

pub(crate) fn expect_double(value: &Value) -> Result<f64, HandlerError> {
    match value {
        Value::Double(number) => Ok(*number),
        other => Err(payload_kind(ValueKind::Double, other)),
    }
}

pub(crate) fn expect_text(value: &Value) -> Result<&str, HandlerError> {
    value
        .as_text()
        .ok_or_else(|| payload_kind(ValueKind::Text, value))
}

pub(crate) fn payload_kind(expected: ValueKind, found: &Value) -> HandlerError {
    HandlerError::PayloadKind {
        expected,
        found: found.kind(),
    }
}

/// Integer count for `len`, saturating at `i32::MAX`.
pub(crate) fn count(len: usize) -> Value {
    Value::Integer(i32::try_from(len).unwrap_or(i32::MAX))
}

pub(crate) fn id_list(ids: impl IntoIterator<Item = i32>) -> Value {
    Value::TextList(ids.into_iter().map(|id| id.to_string()).collect())
}
