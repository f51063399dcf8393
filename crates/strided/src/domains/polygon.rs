//! Obstacle commands. Obstacles are read-only.

use stride_protocol::{Command, OperationKind, PolygonVar, Value, ValueKind};

use crate::dispatch::{CommandHandler, HandlerContext, HandlerError, HandlerOutcome};
use crate::world::Obstacle;
use crate::world::geometry::{bounding_box, centroid};

use super::{count, id_list, no_element, numeric_element, variable_id};

/// Serves `GetPolygonValue` and `SetPolygonState`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonHandler;

impl CommandHandler for PolygonHandler {
    fn handle(
        &self,
        command: &Command,
        context: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        let raw = variable_id(command)?;
        let Some(variable) = PolygonVar::from_id(raw) else {
            return Ok(HandlerOutcome::unknown_variable(raw));
        };
        if command.kind() == Some(OperationKind::Set) {
            return Ok(HandlerOutcome::unsupported(variable.name()));
        }

        match variable {
            PolygonVar::IdList => context.with_world(|world| {
                let ids = world.obstacles().iter().map(|obstacle| obstacle.id);
                Ok(HandlerOutcome::value(ValueKind::TextList, id_list(ids)))
            }),
            PolygonVar::Count => context.with_world(|world| {
                Ok(HandlerOutcome::value(
                    ValueKind::Integer,
                    count(world.obstacles().len()),
                ))
            }),
            PolygonVar::Type => read(command, context, ValueKind::Text, |_| {
                Some(Value::Text("obstacle".to_owned()))
            }),
            PolygonVar::Shape => read(command, context, ValueKind::Polygon, |obstacle| {
                Some(Value::Polygon(obstacle.shape.clone()))
            }),
            PolygonVar::Pos2d => read(command, context, ValueKind::Point2d, |obstacle| {
                centroid(&obstacle.shape).map(Value::Point2d)
            }),
            PolygonVar::Width => read(command, context, ValueKind::Double, |obstacle| {
                bounding_box(&obstacle.shape)
                    .map(|bounds| Value::Double(bounds.max.x - bounds.min.x))
            }),
            PolygonVar::Length => read(command, context, ValueKind::Double, |obstacle| {
                bounding_box(&obstacle.shape)
                    .map(|bounds| Value::Double(bounds.max.y - bounds.min.y))
            }),
            PolygonVar::Color | PolygonVar::Filled | PolygonVar::ImageFile => {
                Ok(HandlerOutcome::unsupported(variable.name()))
            }
        }
    }
}

fn read(
    command: &Command,
    context: &HandlerContext<'_>,
    kind: ValueKind,
    attribute: impl FnOnce(&Obstacle) -> Option<Value>,
) -> Result<HandlerOutcome, HandlerError> {
    let id = numeric_element(command)?;
    context.with_world(|world| {
        let obstacle = world.obstacle(id).ok_or_else(|| no_element(command))?;
        let value = attribute(obstacle)
            .ok_or_else(|| HandlerError::invalid_value(format!("obstacle {id} has no outline")))?;
        Ok(HandlerOutcome::value(kind, value))
    })
}
