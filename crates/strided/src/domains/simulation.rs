//! Global simulation commands.

use stride_protocol::{Command, OperationKind, SimulationVar, Value, ValueKind};

use crate::dispatch::{CommandHandler, HandlerContext, HandlerError, HandlerOutcome};

use super::{id_list, variable_id};

/// Serves `GetSimulationValue` and `SetSimulationState`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationHandler;

impl CommandHandler for SimulationHandler {
    fn handle(
        &self,
        command: &Command,
        context: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        let raw = variable_id(command)?;
        let Some(variable) = SimulationVar::from_id(raw) else {
            return Ok(HandlerOutcome::unknown_variable(raw));
        };
        if command.kind() == Some(OperationKind::Set) {
            return Ok(HandlerOutcome::unsupported(variable.name()));
        }

        match variable {
            SimulationVar::Time => context.with_world(|world| {
                Ok(HandlerOutcome::value(
                    ValueKind::Double,
                    Value::Double(world.sim_time()),
                ))
            }),
            SimulationVar::TimeMs => context.with_world(|world| {
                // Float to int `as` casts saturate.
                let millis = (world.sim_time() * 1000.0).round() as i32;
                Ok(HandlerOutcome::value(ValueKind::Integer, Value::Integer(millis)))
            }),
            SimulationVar::DeltaT => context.with_world(|world| {
                Ok(HandlerOutcome::value(
                    ValueKind::Double,
                    Value::Double(world.step_length()),
                ))
            }),
            SimulationVar::NetBoundingBox => context.with_world(|world| {
                let bounds = world.bounding_box();
                Ok(HandlerOutcome::value(
                    ValueKind::Polygon,
                    Value::Polygon(vec![bounds.min, bounds.max]),
                ))
            }),
            SimulationVar::DepartedPersonIds => context.with_world(|world| {
                Ok(HandlerOutcome::value(
                    ValueKind::TextList,
                    id_list(world.departed_pedestrians().iter().copied()),
                ))
            }),
            SimulationVar::ArrivedPersonIds => context.with_world(|world| {
                Ok(HandlerOutcome::value(
                    ValueKind::TextList,
                    id_list(world.arrived_pedestrians().iter().copied()),
                ))
            }),
            SimulationVar::ScenarioName => context.with_world(|world| {
                Ok(HandlerOutcome::value(
                    ValueKind::Text,
                    Value::Text(world.scenario_name().to_owned()),
                ))
            }),
            SimulationVar::CacheIds => context.with_world(|world| {
                Ok(HandlerOutcome::value(
                    ValueKind::TextList,
                    Value::TextList(world.cache_ids().to_vec()),
                ))
            }),
            SimulationVar::SimConfig | SimulationVar::CoordRef => {
                Ok(HandlerOutcome::unsupported(variable.name()))
            }
        }
    }
}
