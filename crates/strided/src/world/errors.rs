use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Rejected mutations of scenario state.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("pedestrian {id} already exists")]
    DuplicatePedestrian { id: i32 },
    #[error("unknown target {id}")]
    UnknownTarget { id: i32 },
    #[error("target changer '{id}' already exists")]
    DuplicateTargetChanger { id: String },
    #[error("unknown target changer '{id}'")]
    UnknownTargetChanger { id: String },
    #[error("invalid stimulus: {message}")]
    InvalidStimulus { message: String },
}

/// Failure while advancing the model.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("simulation step failed: {message}")]
    Step { message: String },
}

/// Failure while turning a scenario into a simulation.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario '{path}': {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid scenario: {message}")]
    Invalid { message: String },
}

impl ScenarioError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
