//! Pedestrian commands.

use stride_protocol::{Command, OperationKind, PersonVar, Point3d, Value, ValueKind};

use crate::dispatch::{CommandHandler, HandlerContext, HandlerError, HandlerOutcome};
use crate::world::{NewPedestrian, Pedestrian, World};

use super::{
    count, expect_double, expect_text, id_list, no_element, numeric_element, payload_kind,
    set_value, variable_id,
};

/// Serves `GetPersonValue` and `SetPersonState`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonHandler;

impl CommandHandler for PersonHandler {
    fn handle(
        &self,
        command: &Command,
        context: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        let raw = variable_id(command)?;
        let Some(variable) = PersonVar::from_id(raw) else {
            return Ok(HandlerOutcome::unknown_variable(raw));
        };
        match command.kind() {
            Some(OperationKind::Set) => set(variable, command, context),
            _ => get(variable, command, context),
        }
    }
}

fn get(
    variable: PersonVar,
    command: &Command,
    context: &HandlerContext<'_>,
) -> Result<HandlerOutcome, HandlerError> {
    match variable {
        PersonVar::IdList => context.with_world(|world| {
            Ok(HandlerOutcome::value(
                ValueKind::TextList,
                id_list(world.pedestrian_ids()),
            ))
        }),
        PersonVar::Count => context.with_world(|world| {
            Ok(HandlerOutcome::value(
                ValueKind::Integer,
                count(world.pedestrian_ids().len()),
            ))
        }),
        PersonVar::NextFreeId => context.with_world(|world| {
            Ok(HandlerOutcome::value(
                ValueKind::Integer,
                Value::Integer(world.next_free_pedestrian_id()),
            ))
        }),
        PersonVar::Pos2d => read(command, context, ValueKind::Point2d, |pedestrian| {
            Value::Point2d(pedestrian.position)
        }),
        PersonVar::Pos3d => read(command, context, ValueKind::Point3d, |pedestrian| {
            Value::Point3d(Point3d::new(pedestrian.position.x, pedestrian.position.y, 0.0))
        }),
        PersonVar::Speed => read(command, context, ValueKind::Double, |pedestrian| {
            Value::Double(pedestrian.speed())
        }),
        PersonVar::Velocity => read(command, context, ValueKind::Point2d, |pedestrian| {
            Value::Point2d(pedestrian.velocity)
        }),
        PersonVar::FreeFlowSpeed => read(command, context, ValueKind::Double, |pedestrian| {
            Value::Double(pedestrian.free_flow_speed)
        }),
        PersonVar::Length | PersonVar::Width => {
            read(command, context, ValueKind::Double, |pedestrian| {
                Value::Double(pedestrian.radius * 2.0)
            })
        }
        PersonVar::Type => read(command, context, ValueKind::Text, |pedestrian| {
            Value::Text(pedestrian.kind.clone())
        }),
        PersonVar::TargetList => read(command, context, ValueKind::TextList, |pedestrian| {
            id_list(pedestrian.targets.iter().copied())
        }),
        PersonVar::NextTargetListIndex => {
            read(command, context, ValueKind::Integer, |pedestrian| {
                count(pedestrian.next_target_index)
            })
        }
        PersonVar::HasNextTarget => read(command, context, ValueKind::Integer, |pedestrian| {
            Value::Integer(i32::from(pedestrian.has_next_target()))
        }),
        PersonVar::Angle
        | PersonVar::Color
        | PersonVar::RoadId
        | PersonVar::WaitingTime
        | PersonVar::Add => Ok(HandlerOutcome::unsupported(variable.name())),
    }
}

/// Reads one attribute of the pedestrian named by the command.
fn read(
    command: &Command,
    context: &HandlerContext<'_>,
    kind: ValueKind,
    attribute: impl FnOnce(&Pedestrian) -> Value,
) -> Result<HandlerOutcome, HandlerError> {
    let id = numeric_element(command)?;
    context.with_world(|world| {
        let pedestrian = world.pedestrian(id).ok_or_else(|| no_element(command))?;
        Ok(HandlerOutcome::value(kind, attribute(pedestrian)))
    })
}

fn set(
    variable: PersonVar,
    command: &Command,
    context: &HandlerContext<'_>,
) -> Result<HandlerOutcome, HandlerError> {
    match variable {
        PersonVar::Pos2d => {
            let position = match set_value(command)? {
                Value::Point2d(point) if point.x.is_finite() && point.y.is_finite() => *point,
                Value::Point2d(_) => {
                    return Err(HandlerError::invalid_value("position must be finite"));
                }
                other => return Err(payload_kind(ValueKind::Point2d, other)),
            };
            write(command, context, |pedestrian| {
                pedestrian.position = position;
                Ok(())
            })
        }
        PersonVar::FreeFlowSpeed => {
            let speed = expect_double(set_value(command)?)?;
            if !(speed.is_finite() && speed >= 0.0) {
                return Err(HandlerError::invalid_value(
                    "free-flow speed must be a non-negative number",
                ));
            }
            write(command, context, |pedestrian| {
                pedestrian.free_flow_speed = speed;
                Ok(())
            })
        }
        PersonVar::TargetList => set_targets(command, context),
        PersonVar::NextTargetListIndex => {
            let index = match set_value(command)? {
                Value::Integer(index) => usize::try_from(*index)
                    .map_err(|_| HandlerError::invalid_value("index must not be negative"))?,
                other => return Err(payload_kind(ValueKind::Integer, other)),
            };
            write(command, context, |pedestrian| {
                if index > pedestrian.targets.len() {
                    return Err(HandlerError::invalid_value(format!(
                        "index {index} exceeds target list of length {}",
                        pedestrian.targets.len()
                    )));
                }
                pedestrian.next_target_index = index;
                Ok(())
            })
        }
        PersonVar::Add => add_pedestrian(command, context),
        PersonVar::IdList
        | PersonVar::Count
        | PersonVar::NextFreeId
        | PersonVar::Pos3d
        | PersonVar::Speed
        | PersonVar::Velocity
        | PersonVar::Angle
        | PersonVar::Length
        | PersonVar::Color
        | PersonVar::Width
        | PersonVar::Type
        | PersonVar::RoadId
        | PersonVar::WaitingTime
        | PersonVar::HasNextTarget => Ok(HandlerOutcome::unsupported(variable.name())),
    }
}

/// Applies `update` to the pedestrian named by the command.
fn write(
    command: &Command,
    context: &HandlerContext<'_>,
    update: impl FnOnce(&mut Pedestrian) -> Result<(), HandlerError>,
) -> Result<HandlerOutcome, HandlerError> {
    let id = numeric_element(command)?;
    context.with_world(|world| {
        let pedestrian = world.pedestrian_mut(id).ok_or_else(|| no_element(command))?;
        update(pedestrian)?;
        Ok(HandlerOutcome::ok())
    })
}

fn set_targets(
    command: &Command,
    context: &HandlerContext<'_>,
) -> Result<HandlerOutcome, HandlerError> {
    let targets = match set_value(command)? {
        Value::TextList(items) => items
            .iter()
            .map(|item| {
                item.trim().parse::<i32>().map_err(|_| {
                    HandlerError::invalid_value(format!("target id '{item}' is not a number"))
                })
            })
            .collect::<Result<Vec<i32>, HandlerError>>()?,
        other => return Err(payload_kind(ValueKind::TextList, other)),
    };
    let id = numeric_element(command)?;
    context.with_world(|world| {
        if world.pedestrian(id).is_none() {
            return Err(no_element(command));
        }
        ensure_targets_exist(world, &targets)?;
        let pedestrian = world.pedestrian_mut(id).ok_or_else(|| no_element(command))?;
        pedestrian.targets = targets;
        pedestrian.next_target_index = 0;
        Ok(HandlerOutcome::ok())
    })
}

fn ensure_targets_exist(world: &dyn World, targets: &[i32]) -> Result<(), HandlerError> {
    match targets.iter().find(|target| !world.has_target(**target)) {
        Some(unknown) => Err(crate::world::WorldError::UnknownTarget { id: *unknown }.into()),
        None => Ok(()),
    }
}

/// `ADD`: the element id names the new pedestrian, the payload is a JSON
/// [`NewPedestrian`].
fn add_pedestrian(
    command: &Command,
    context: &HandlerContext<'_>,
) -> Result<HandlerOutcome, HandlerError> {
    let id = numeric_element(command)?;
    let document = expect_text(set_value(command)?)?;
    let attributes: NewPedestrian = serde_json::from_str(document)
        .map_err(|error| HandlerError::invalid_value(format!("pedestrian description: {error}")))?;
    attributes.check().map_err(HandlerError::invalid_value)?;
    context.with_world(|world| {
        world.add_pedestrian(attributes.into_pedestrian(id))?;
        Ok(HandlerOutcome::ok())
    })
}
