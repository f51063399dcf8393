//! Scenario element commands: target changers and stimuli.
//!
//! Structured arguments travel as JSON text values, e.g. a target changer:
//!
//! ```json
//! {"id":"detour","area":[{"x":0,"y":0},{"x":2,"y":0},{"x":2,"y":2}],"targets":[3]}
//! ```

use serde::de::DeserializeOwned;
use stride_protocol::{Command, MiscVar, OperationKind, Value, ValueKind};

use crate::dispatch::{CommandHandler, HandlerContext, HandlerError, HandlerOutcome};
use crate::world::{Stimulus, TargetChanger};

use super::{expect_text, set_value, variable_id};

/// Serves `GetMiscValue` and `SetMiscState`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiscHandler;

impl CommandHandler for MiscHandler {
    fn handle(
        &self,
        command: &Command,
        context: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        let raw = variable_id(command)?;
        let Some(variable) = MiscVar::from_id(raw) else {
            return Ok(HandlerOutcome::unknown_variable(raw));
        };
        match command.kind() {
            Some(OperationKind::Set) => set(variable, command, context),
            _ => get(variable, context),
        }
    }
}

fn get(variable: MiscVar, context: &HandlerContext<'_>) -> Result<HandlerOutcome, HandlerError> {
    match variable {
        MiscVar::TargetChangerIds => context.with_world(|world| {
            Ok(HandlerOutcome::value(
                ValueKind::TextList,
                Value::TextList(world.target_changer_ids()),
            ))
        }),
        MiscVar::StimulusInfos => context.with_world(|world| {
            let encoded = serde_json::to_string(world.pending_stimuli())
                .map_err(|error| HandlerError::invalid_value(error.to_string()))?;
            Ok(HandlerOutcome::value(ValueKind::Text, Value::Text(encoded)))
        }),
        MiscVar::AddTargetChanger
        | MiscVar::RemoveTargetChanger
        | MiscVar::AddStimulusInfos
        | MiscVar::RouteChoice => Ok(HandlerOutcome::unsupported(variable.name())),
    }
}

fn set(
    variable: MiscVar,
    command: &Command,
    context: &HandlerContext<'_>,
) -> Result<HandlerOutcome, HandlerError> {
    match variable {
        MiscVar::AddTargetChanger => {
            let changer: TargetChanger = decode(command, "target changer")?;
            context.with_world(|world| {
                world.add_target_changer(changer)?;
                Ok(HandlerOutcome::ok())
            })
        }
        MiscVar::RemoveTargetChanger => {
            let id = expect_text(set_value(command)?)?;
            context.with_world(|world| {
                world.remove_target_changer(id)?;
                Ok(HandlerOutcome::ok())
            })
        }
        MiscVar::AddStimulusInfos => {
            let stimuli: Vec<Stimulus> = decode(command, "stimulus list")?;
            context.with_world(|world| {
                world.add_stimuli(stimuli)?;
                Ok(HandlerOutcome::ok())
            })
        }
        MiscVar::TargetChangerIds | MiscVar::StimulusInfos | MiscVar::RouteChoice => {
            Ok(HandlerOutcome::unsupported(variable.name()))
        }
    }
}

fn decode<T: DeserializeOwned>(command: &Command, what: &str) -> Result<T, HandlerError> {
    let text = expect_text(set_value(command)?)?;
    serde_json::from_str(text)
        .map_err(|error| HandlerError::invalid_value(format!("{what}: {error}")))
}
