//! Handler results and their conversion into protocol responses.

use stride_protocol::{Command, Response, ResponseData, Status, Value, ValueKind};
use thiserror::Error;

/// A response could not be built from a handler result.
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("declared {declared} but produced {produced}")]
    KindMismatch {
        declared: ValueKind,
        produced: ValueKind,
    },
    #[error("declared {declared} but produced no value")]
    MissingValue { declared: ValueKind },
    #[error("value contains a non-finite number")]
    NonFinite,
    #[error("{status:?} response cannot carry a payload")]
    PayloadOnFailure { status: Status },
}

/// What a handler produced, before it is rendered into a [`Response`].
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutcome {
    status: Status,
    description: String,
    data: Option<ResponseData>,
    declared: Option<ValueKind>,
}

impl HandlerOutcome {
    /// Success without payload, as answered by Set commands.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            description: String::new(),
            data: None,
            declared: None,
        }
    }

    /// Success carrying `value`, which must be of kind `declared`.
    #[must_use]
    pub fn value(declared: ValueKind, value: Value) -> Self {
        Self {
            declared: Some(declared),
            data: Some(ResponseData::value(value)),
            ..Self::ok()
        }
    }

    #[must_use]
    pub fn data(data: ResponseData) -> Self {
        Self {
            data: Some(data),
            ..Self::ok()
        }
    }

    /// A variable id outside the domain's table.
    #[must_use]
    pub fn unknown_variable(variable_id: u8) -> Self {
        Self::not_implemented(format!("Unknown command (variable 0x{variable_id:02x})"))
    }

    /// A known variable this server deliberately does not support.
    #[must_use]
    pub fn unsupported(name: &str) -> Self {
        Self::not_implemented(format!("{name} is not implemented"))
    }

    #[must_use]
    pub fn not_implemented(description: impl Into<String>) -> Self {
        Self {
            status: Status::NotImplemented,
            description: description.into(),
            data: None,
            declared: None,
        }
    }

    #[must_use]
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            status: Status::Err,
            description: description.into(),
            data: None,
            declared: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Builds the response to `command`.
    ///
    /// # Errors
    ///
    /// Fails when a declared value kind does not match the produced value,
    /// when a value contains NaN or infinity, or when a non-OK outcome carries
    /// data.
    pub fn render(self, command: &Command) -> Result<Response, RenderError> {
        let Self {
            status,
            description,
            data,
            declared,
        } = self;

        let response = match status {
            Status::Ok => {
                check_value(declared, data.as_ref())?;
                Response::ok(command.command_id(), data)
            }
            Status::NotImplemented | Status::Err if data.is_some() => {
                return Err(RenderError::PayloadOnFailure { status });
            }
            Status::NotImplemented => Response::not_implemented(command.command_id(), ""),
            Status::Err => Response::err(command.command_id(), ""),
        };

        Ok(response
            .with_description(description)
            .with_variable(command.variable_id())
            .with_element(command.element_id().map(str::to_owned)))
    }
}

fn check_value(
    declared: Option<ValueKind>,
    data: Option<&ResponseData>,
) -> Result<(), RenderError> {
    let value = match data {
        Some(ResponseData::Value { value }) => Some(value),
        _ => None,
    };
    match (declared, value) {
        (Some(declared), None) => return Err(RenderError::MissingValue { declared }),
        (Some(declared), Some(value)) if value.kind() != declared => {
            return Err(RenderError::KindMismatch {
                declared,
                produced: value.kind(),
            });
        }
        _ => {}
    }
    if value.is_some_and(|value| !value.is_finite()) {
        return Err(RenderError::NonFinite);
    }
    Ok(())
}
