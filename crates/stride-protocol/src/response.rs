//! Responses produced for every command.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Outcome class of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The request succeeded; any payload is valid.
    Ok,
    /// The request is recognised but deliberately unsupported.
    NotImplemented,
    /// The request failed; the description explains why.
    Err,
}

impl Status {
    /// Returns the wire status code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Ok => 0x00,
            Self::NotImplemented => 0x01,
            Self::Err => 0xff,
        }
    }
}

/// Typed payload attached to a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseData {
    /// A variable value.
    Value {
        /// The value read.
        value: Value,
    },
    /// Server version information.
    Version {
        /// Protocol version number.
        version: u32,
        /// Human-readable server identifier.
        identifier: String,
    },
    /// Aggregated subscription results.
    Subscriptions {
        /// One snapshot per active subscription.
        snapshots: Vec<SubscriptionSnapshot>,
    },
    /// The simulation's own termination condition has fired.
    SimulationEnded,
}

impl ResponseData {
    /// Wraps a value.
    #[must_use]
    pub const fn value(value: Value) -> Self {
        Self::Value { value }
    }
}

/// Aggregated result of evaluating one subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    /// Command id identifying the subscription domain's response.
    pub response_command_id: u8,
    /// Entity the subscription targets.
    pub element_id: String,
    /// Per-variable responses in the order the variables were requested.
    pub responses: Vec<Response>,
}

impl SubscriptionSnapshot {
    /// Returns the response for a variable id, if it was subscribed.
    #[must_use]
    pub fn response_for(&self, variable_id: u8) -> Option<&Response> {
        self.responses
            .iter()
            .find(|response| response.variable_id() == Some(variable_id))
    }

    /// Variable ids in request order.
    #[must_use]
    pub fn variable_ids(&self) -> Vec<u8> {
        self.responses
            .iter()
            .filter_map(Response::variable_id)
            .collect()
    }
}

/// Answer to exactly one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    status: Status,
    #[serde(default)]
    description: String,
    command_id: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variable_id: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<ResponseData>,
}

impl Response {
    /// Builds a successful response.
    #[must_use]
    pub const fn ok(command_id: u8, data: Option<ResponseData>) -> Self {
        Self {
            status: Status::Ok,
            description: String::new(),
            command_id,
            variable_id: None,
            element_id: None,
            data,
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn err(command_id: u8, description: impl Into<String>) -> Self {
        Self {
            status: Status::Err,
            description: description.into(),
            command_id,
            variable_id: None,
            element_id: None,
            data: None,
        }
    }

    /// Builds a not-implemented response.
    #[must_use]
    pub fn not_implemented(command_id: u8, description: impl Into<String>) -> Self {
        Self {
            status: Status::NotImplemented,
            description: description.into(),
            command_id,
            variable_id: None,
            element_id: None,
            data: None,
        }
    }

    /// Attaches the variable id the response answers.
    #[must_use]
    pub const fn with_variable(mut self, variable_id: Option<u8>) -> Self {
        self.variable_id = variable_id;
        self
    }

    /// Attaches the element id the response answers.
    #[must_use]
    pub fn with_element(mut self, element_id: Option<String>) -> Self {
        self.element_id = element_id;
        self
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Status of the response.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Human-readable, non-authoritative description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Id of the command this response answers.
    #[must_use]
    pub const fn command_id(&self) -> u8 {
        self.command_id
    }

    /// Variable id the response answers, if any.
    #[must_use]
    pub const fn variable_id(&self) -> Option<u8> {
        self.variable_id
    }

    /// Element id the response answers, if any.
    #[must_use]
    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    /// Typed payload, present only for successful responses.
    #[must_use]
    pub const fn data(&self) -> Option<&ResponseData> {
        self.data.as_ref()
    }

    /// Convenience accessor for a [`ResponseData::Value`] payload.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match &self.data {
            Some(ResponseData::Value { value }) => Some(value),
            _ => None,
        }
    }

    /// Convenience accessor for a [`ResponseData::Subscriptions`] payload.
    #[must_use]
    pub fn snapshots(&self) -> &[SubscriptionSnapshot] {
        match &self.data {
            Some(ResponseData::Subscriptions { snapshots }) => snapshots,
            _ => &[],
        }
    }

    /// Returns `true` when the response carries the simulation-ended sentinel.
    #[must_use]
    pub const fn is_simulation_ended(&self) -> bool {
        matches!(self.data, Some(ResponseData::SimulationEnded))
    }
}
