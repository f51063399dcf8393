//! Decoded message types shared by the stride daemon and its codecs.
//!
//! A wire codec turns raw bytes into a [`Command`] and encodes the
//! [`Response`] the daemon produces for it. This crate fixes the vocabulary
//! both sides agree on: the command-id table, the per-domain variable
//! identifiers, the typed [`Value`] model, and the protocol versions the
//! server understands. Numeric identifiers are wire constants and must not be
//! renumbered.

mod command;
mod response;
mod value;
mod variables;
mod version;

pub use command::{
    CacheEntry, Command, CommandPayload, Domain, OperationKind, ScenarioFile, TraciCommand,
};
pub use response::{Response, ResponseData, Status, SubscriptionSnapshot};
pub use value::{Point2d, Point3d, Value, ValueKind};
pub use variables::{MiscVar, PersonVar, PolygonVar, SimulationVar, VehicleVar};
pub use version::{ProtocolVersion, UnsupportedVersion};
