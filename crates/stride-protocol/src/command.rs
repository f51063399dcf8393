//! Decoded commands and the command-id table.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, FromRepr, IntoStaticStr};

use crate::value::Value;
use crate::version::ProtocolVersion;

/// Entity category a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Pedestrians.
    Person,
    /// Static obstacles, exposed as polygons.
    Polygon,
    /// Vehicles, which the simulation does not model.
    Vehicle,
    /// Global simulation facts such as time and bounds.
    Simulation,
    /// Scenario element mutation (target changers, stimuli).
    Misc,
    /// Session control: version, load, step, close.
    Control,
}

impl Domain {
    /// Returns the canonical lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Polygon => "polygon",
            Self::Vehicle => "vehicle",
            Self::Simulation => "simulation",
            Self::Misc => "misc",
            Self::Control => "control",
        }
    }

    /// Command id used for aggregated subscription responses in this domain.
    ///
    /// Returns `None` for [`Domain::Control`], which has no subscriptions.
    #[must_use]
    pub const fn subscription_response_id(self) -> Option<u8> {
        match self {
            Self::Person => Some(0xee),
            Self::Polygon => Some(0xe8),
            Self::Vehicle => Some(0xe4),
            Self::Simulation => Some(0xeb),
            Self::Misc => Some(0xec),
            Self::Control => None,
        }
    }
}

/// What a command asks the domain to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Read a variable.
    Get,
    /// Write a variable.
    Set,
    /// Register a standing interest in a set of variables.
    Subscribe,
    /// Drive the session lifecycle.
    Control,
}

/// Every command id the server recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr, EnumIter)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TraciCommand {
    /// Query the server's protocol version.
    GetVersion = 0x00,
    /// Load a scenario file by path.
    Load = 0x01,
    /// Advance simulated time.
    SimStep = 0x02,
    /// Refresh subscriptions without advancing time.
    GetState = 0x03,
    /// Load a scenario from inline content, optionally with cache data.
    SendFile = 0x75,
    /// End the session.
    Close = 0x7f,
    /// Read a pedestrian variable.
    GetPersonValue = 0xae,
    /// Write a pedestrian variable.
    SetPersonState = 0xce,
    /// Subscribe to pedestrian variables.
    SubPersonValue = 0xde,
    /// Read an obstacle variable.
    GetPolygonValue = 0xa8,
    /// Write an obstacle variable.
    SetPolygonState = 0xc8,
    /// Subscribe to obstacle variables.
    SubPolygonValue = 0xd8,
    /// Read a vehicle variable.
    GetVehicleValue = 0xa4,
    /// Write a vehicle variable.
    SetVehicleState = 0xc4,
    /// Subscribe to vehicle variables.
    SubVehicleValue = 0xd4,
    /// Read a global simulation variable.
    GetSimulationValue = 0xab,
    /// Write a global simulation variable.
    SetSimulationState = 0xcb,
    /// Subscribe to global simulation variables.
    SubSimulationValue = 0xdb,
    /// Read a scenario element variable.
    GetMiscValue = 0xac,
    /// Mutate scenario elements.
    SetMiscState = 0xcc,
    /// Subscribe to scenario element variables.
    SubMiscValue = 0xdc,
}

impl TraciCommand {
    /// Looks up a command by its wire id.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        Self::from_repr(id)
    }

    /// Returns the wire id.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Returns the symbolic name, for diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Returns the domain this command targets.
    #[must_use]
    pub const fn domain(self) -> Domain {
        match self {
            Self::GetVersion
            | Self::Load
            | Self::SimStep
            | Self::GetState
            | Self::SendFile
            | Self::Close => Domain::Control,
            Self::GetPersonValue | Self::SetPersonState | Self::SubPersonValue => Domain::Person,
            Self::GetPolygonValue | Self::SetPolygonState | Self::SubPolygonValue => {
                Domain::Polygon
            }
            Self::GetVehicleValue | Self::SetVehicleState | Self::SubVehicleValue => {
                Domain::Vehicle
            }
            Self::GetSimulationValue | Self::SetSimulationState | Self::SubSimulationValue => {
                Domain::Simulation
            }
            Self::GetMiscValue | Self::SetMiscState | Self::SubMiscValue => Domain::Misc,
        }
    }

    /// Returns the operation kind of this command.
    #[must_use]
    pub const fn kind(self) -> OperationKind {
        match self {
            Self::GetVersion
            | Self::Load
            | Self::SimStep
            | Self::GetState
            | Self::SendFile
            | Self::Close => OperationKind::Control,
            Self::GetPersonValue
            | Self::GetPolygonValue
            | Self::GetVehicleValue
            | Self::GetSimulationValue
            | Self::GetMiscValue => OperationKind::Get,
            Self::SetPersonState
            | Self::SetPolygonState
            | Self::SetVehicleState
            | Self::SetSimulationState
            | Self::SetMiscState => OperationKind::Set,
            Self::SubPersonValue
            | Self::SubPolygonValue
            | Self::SubVehicleValue
            | Self::SubSimulationValue
            | Self::SubMiscValue => OperationKind::Subscribe,
        }
    }

    /// Returns the Get command of a data domain.
    ///
    /// Returns `None` for [`Domain::Control`].
    #[must_use]
    pub const fn get_for(domain: Domain) -> Option<Self> {
        match domain {
            Domain::Person => Some(Self::GetPersonValue),
            Domain::Polygon => Some(Self::GetPolygonValue),
            Domain::Vehicle => Some(Self::GetVehicleValue),
            Domain::Simulation => Some(Self::GetSimulationValue),
            Domain::Misc => Some(Self::GetMiscValue),
            Domain::Control => None,
        }
    }
}

/// Scenario document sent inline with a `SendFile` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFile {
    /// Scenario name as announced by the client.
    pub name: String,
    /// Full scenario document.
    pub content: String,
}

/// Pre-computed data the client ships alongside a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache identifier, usually a content hash.
    pub identifier: String,
    /// Opaque cache bytes.
    #[serde(default)]
    pub data: Vec<u8>,
}

/// Operation-specific argument carried by a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CommandPayload {
    /// Typed value written by a Set command, or the path given to Load.
    Value(Value),
    /// Variable ids requested by a Subscribe command.
    Variables(Vec<u8>),
    /// Target time of a `SimStep` command, in simulated seconds.
    TargetTime(f64),
    /// Inline scenario for `SendFile`; the cache is only valid from version 21.
    Scenario {
        /// The scenario document.
        file: ScenarioFile,
        /// Optional cache entries.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache: Option<Vec<CacheEntry>>,
    },
}

const fn default_protocol_version() -> u32 {
    ProtocolVersion::CURRENT.number()
}

/// A decoded client command.
///
/// Commands are immutable once decoded; the builder methods are meant for
/// codecs and for deriving subscription templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    command_id: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variable_id: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<CommandPayload>,
    #[serde(default = "default_protocol_version")]
    protocol_version: u32,
}

impl Command {
    /// Creates a command with the given id and the current protocol version.
    #[must_use]
    pub const fn new(command_id: u8) -> Self {
        Self {
            command_id,
            variable_id: None,
            element_id: None,
            payload: None,
            protocol_version: default_protocol_version(),
        }
    }

    /// Sets the variable id.
    #[must_use]
    pub const fn with_variable(mut self, variable_id: u8) -> Self {
        self.variable_id = Some(variable_id);
        self
    }

    /// Sets the element id.
    #[must_use]
    pub fn with_element(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: CommandPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sets the protocol version the client announced.
    #[must_use]
    pub const fn with_protocol_version(mut self, version: u32) -> Self {
        self.protocol_version = version;
        self
    }

    /// Raw command id as decoded.
    #[must_use]
    pub const fn command_id(&self) -> u8 {
        self.command_id
    }

    /// Variable id, when the command addresses one.
    #[must_use]
    pub const fn variable_id(&self) -> Option<u8> {
        self.variable_id
    }

    /// Element id, when the command addresses a specific entity.
    #[must_use]
    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    /// Operation payload, if any.
    #[must_use]
    pub const fn payload(&self) -> Option<&CommandPayload> {
        self.payload.as_ref()
    }

    /// Protocol version announced with the command.
    #[must_use]
    pub const fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    /// Resolves the command id against the known command table.
    #[must_use]
    pub const fn traci_command(&self) -> Option<TraciCommand> {
        TraciCommand::from_id(self.command_id)
    }

    /// Domain of the command, if the id is known.
    #[must_use]
    pub const fn domain(&self) -> Option<Domain> {
        match self.traci_command() {
            Some(command) => Some(command.domain()),
            None => None,
        }
    }

    /// Operation kind of the command, if the id is known.
    #[must_use]
    pub const fn kind(&self) -> Option<OperationKind> {
        match self.traci_command() {
            Some(command) => Some(command.kind()),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn command_ids_round_trip_through_lookup() {
        for command in TraciCommand::iter() {
            assert_eq!(TraciCommand::from_id(command.id()), Some(command));
        }
    }

    #[rstest]
    #[case(0xae, Domain::Person, OperationKind::Get)]
    #[case(0xc4, Domain::Vehicle, OperationKind::Set)]
    #[case(0xdb, Domain::Simulation, OperationKind::Subscribe)]
    #[case(0x7f, Domain::Control, OperationKind::Control)]
    fn classifies_commands(
        #[case] id: u8,
        #[case] domain: Domain,
        #[case] kind: OperationKind,
    ) {
        let command = Command::new(id);
        assert_eq!(command.domain(), Some(domain));
        assert_eq!(command.kind(), Some(kind));
    }

    #[test]
    fn unknown_ids_have_no_domain() {
        let command = Command::new(0x42);
        assert_eq!(command.traci_command(), None);
        assert_eq!(command.domain(), None);
    }

    #[test]
    fn every_data_domain_has_a_get_command_and_response_id() {
        for domain in Domain::iter().filter(|domain| *domain != Domain::Control) {
            let get = TraciCommand::get_for(domain).expect("data domain has a get command");
            assert_eq!(get.domain(), domain);
            assert_eq!(get.kind(), OperationKind::Get);
            assert!(domain.subscription_response_id().is_some());
        }
    }

    #[test]
    fn decodes_minimal_json_command_with_default_version() {
        let command: Command =
            serde_json::from_str(r#"{"command_id":174,"variable_id":1}"#).expect("decode");
        assert_eq!(command.command_id(), 0xae);
        assert_eq!(command.variable_id(), Some(0x01));
        assert_eq!(command.element_id(), None);
        assert_eq!(command.protocol_version(), ProtocolVersion::CURRENT.number());
    }

    #[test]
    fn decodes_scenario_payload_without_cache() {
        let json = r#"{"command_id":117,"payload":{"kind":"scenario","data":{"file":{"name":"s","content":"{}"}}},"protocol_version":20}"#;
        let command: Command = serde_json::from_str(json).expect("decode");
        assert!(matches!(
            command.payload(),
            Some(CommandPayload::Scenario { cache: None, .. })
        ));
    }
}
