//! Vehicle commands.
//!
//! Pedestrian scenarios contain no vehicles. Gets report an empty domain and
//! Sets are accepted and ignored, so vehicle-aware clients keep working.

use stride_protocol::{Command, OperationKind, Value, ValueKind, VehicleVar};
use tracing::debug;

use crate::dispatch::{CommandHandler, HandlerContext, HandlerError, HandlerOutcome};

use super::{element_id, no_element, variable_id};

const VEHICLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::vehicle");

/// Serves `GetVehicleValue` and `SetVehicleState`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VehicleHandler;

impl CommandHandler for VehicleHandler {
    fn handle(
        &self,
        command: &Command,
        context: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        let raw = variable_id(command)?;
        let Some(variable) = VehicleVar::from_id(raw) else {
            return Ok(HandlerOutcome::unknown_variable(raw));
        };
        context.session().require_scenario()?;

        if command.kind() == Some(OperationKind::Set) {
            debug!(
                target: VEHICLE_TARGET,
                variable = variable.name(),
                "ignoring vehicle update"
            );
            return Ok(HandlerOutcome::ok());
        }

        match variable {
            VehicleVar::IdList => Ok(HandlerOutcome::value(
                ValueKind::TextList,
                Value::TextList(Vec::new()),
            )),
            VehicleVar::Count => Ok(HandlerOutcome::value(ValueKind::Integer, Value::Integer(0))),
            VehicleVar::Speed | VehicleVar::Pos2d | VehicleVar::Route => {
                element_id(command)?;
                Err(no_element(command))
            }
        }
    }
}
