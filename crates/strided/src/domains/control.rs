//! Session control commands.

use stride_protocol::{
    CacheEntry, Command, CommandPayload, ProtocolVersion, ResponseData, ScenarioFile, TraciCommand,
    Value,
};
use tracing::{info, warn};

use crate::dispatch::{CommandHandler, HandlerContext, HandlerError, HandlerOutcome};
use crate::session::SessionPhase;
use crate::world::ScenarioRequest;

const CONTROL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::control");

/// Identifier reported by `GetVersion`.
pub const SERVER_IDENTIFIER: &str = concat!("stride ", env!("CARGO_PKG_VERSION"));

/// `GetVersion`. The first call negotiates the client's protocol version.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionHandler;

impl CommandHandler for VersionHandler {
    fn handle(
        &self,
        command: &Command,
        context: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        let session = context.session_mut();
        if session.negotiated_version().is_none() {
            match ProtocolVersion::from_number(command.protocol_version()) {
                Ok(version) => {
                    info!(
                        target: CONTROL_TARGET,
                        connection = %session.id(),
                        version = version.number(),
                        "protocol version negotiated"
                    );
                    session.negotiate(version);
                }
                Err(error) => {
                    warn!(
                        target: CONTROL_TARGET,
                        connection = %session.id(),
                        %error,
                        "client announced an unsupported protocol version"
                    );
                }
            }
        }
        Ok(HandlerOutcome::data(ResponseData::Version {
            version: ProtocolVersion::CURRENT.number(),
            identifier: SERVER_IDENTIFIER.to_owned(),
        }))
    }
}

/// `Load` (scenario path) and `SendFile` (inline scenario).
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadHandler;

impl LoadHandler {
    fn request(
        command: &Command,
        version: ProtocolVersion,
    ) -> Result<Result<ScenarioRequest, HandlerOutcome>, HandlerError> {
        match (command.traci_command(), command.payload()) {
            (Some(TraciCommand::Load), Some(CommandPayload::Value(Value::Text(path)))) => {
                Ok(Ok(ScenarioRequest::from_path(path.clone())))
            }
            (Some(TraciCommand::SendFile), Some(CommandPayload::Scenario { file, cache })) => {
                Ok(inline_request(version, file, cache.as_deref()))
            }
            (_, None) => Err(HandlerError::MissingPayload { operation: "load" }),
            _ => Err(HandlerError::UnexpectedPayload { operation: "load" }),
        }
    }
}

/// Cache data is only part of the payload from protocol version 21 on.
fn inline_request(
    version: ProtocolVersion,
    file: &ScenarioFile,
    cache: Option<&[CacheEntry]>,
) -> Result<ScenarioRequest, HandlerOutcome> {
    match version {
        ProtocolVersion::V20 => match cache {
            Some(_) => Err(HandlerOutcome::not_implemented(
                "cache data requires protocol version 21",
            )),
            None => Ok(ScenarioRequest::inline(file.clone(), None)),
        },
        ProtocolVersion::V21 => Ok(ScenarioRequest::inline(
            file.clone(),
            cache.map(<[CacheEntry]>::to_vec),
        )),
    }
}

impl CommandHandler for LoadHandler {
    fn handle(
        &self,
        command: &Command,
        context: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        let session = context.session_mut();
        match session.phase() {
            SessionPhase::Unconnected | SessionPhase::VersionNegotiated => {}
            SessionPhase::ScenarioLoaded | SessionPhase::Running | SessionPhase::SteppedPaused => {
                return Err(HandlerError::protocol("scenario already loaded"));
            }
            SessionPhase::ClosingWaitForEof | SessionPhase::Closed => {
                return Err(HandlerError::protocol("session is closing"));
            }
        }

        let version = match session.negotiated_version() {
            Some(version) => version,
            None => ProtocolVersion::from_number(command.protocol_version())?,
        };
        let request = match Self::request(command, version)? {
            Ok(request) => request,
            Err(refusal) => return Ok(refusal),
        };

        session.gateway_mut().load_scenario(request)?;
        session.set_phase(SessionPhase::ScenarioLoaded);
        session.gateway_mut().start_simulation()?;
        let name = session
            .gateway()
            .access_state(|world| world.scenario_name().to_owned())?;
        info!(
            target: CONTROL_TARGET,
            connection = %session.id(),
            scenario = %name,
            "scenario ready"
        );
        Ok(HandlerOutcome::ok().with_description(format!("scenario '{name}' loaded")))
    }
}

/// `SimStep`: advance, then report every subscription.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimStepHandler;

impl CommandHandler for SimStepHandler {
    fn handle(
        &self,
        command: &Command,
        context: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        context.session().require_scenario()?;
        let target = match command.payload() {
            Some(CommandPayload::TargetTime(target)) if target.is_finite() => *target,
            Some(CommandPayload::TargetTime(_)) => {
                return Err(HandlerError::invalid_value("target time must be finite"));
            }
            None => 0.0,
            Some(_) => return Err(HandlerError::UnexpectedPayload { operation: "step" }),
        };

        let session = context.session_mut();
        session.set_phase(SessionPhase::Running);
        let advanced = session.gateway_mut().advance(target);
        session.set_phase(SessionPhase::SteppedPaused);
        if !advanced? {
            return Ok(HandlerOutcome::data(ResponseData::SimulationEnded));
        }
        let ended_early = session.gateway().stopped_early_at().is_some();

        let snapshots = context.evaluate_subscriptions();
        context.session_mut().subscriptions_mut().remove_flagged();
        if ended_early {
            return Ok(HandlerOutcome::data(ResponseData::SimulationEnded));
        }
        Ok(HandlerOutcome::data(ResponseData::Subscriptions { snapshots }))
    }
}

/// `GetState`: report every subscription without stepping.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetStateHandler;

impl CommandHandler for GetStateHandler {
    fn handle(
        &self,
        _command: &Command,
        context: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        context.session().require_scenario()?;
        let snapshots = context.evaluate_subscriptions();
        Ok(HandlerOutcome::data(ResponseData::Subscriptions { snapshots }))
    }
}

/// `Close`: stop the simulation and refuse further commands until EOF.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloseHandler;

impl CommandHandler for CloseHandler {
    fn handle(
        &self,
        _command: &Command,
        context: &mut HandlerContext<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        let session = context.session_mut();
        session.set_phase(SessionPhase::ClosingWaitForEof);
        session.gateway().mark_client_close_received();
        let halted = session.gateway_mut().stop_simulation_if_running();
        let description = if halted {
            "simulation stopped; closing session"
        } else {
            "closing session"
        };
        Ok(HandlerOutcome::ok().with_description(description))
    }
}
