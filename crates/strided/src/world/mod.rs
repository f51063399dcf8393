//! Simulation model seams.
//!
//! The control protocol never reaches into a concrete simulator. Domain
//! handlers read and mutate a [`World`], the gateway advances a
//! [`Simulation`], and scenarios are turned into simulations by a
//! [`ScenarioSource`]. The bundled [`memory`] implementation is a small
//! kinematic model used by the daemon and its tests.

mod errors;
pub mod geometry;
pub mod memory;
mod scenario;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use stride_protocol::{CacheEntry, Point2d, ScenarioFile};

pub use self::errors::{ScenarioError, SimulationError, WorldError};
pub use self::scenario::{JsonScenarioSource, NewPedestrian, PedestrianSpec, ScenarioDocument};

/// Slack used when comparing simulated times.
pub const TIME_EPSILON: f64 = 1e-9;

/// A pedestrian agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Pedestrian {
    pub id: i32,
    pub position: Point2d,
    pub velocity: Point2d,
    pub free_flow_speed: f64,
    pub radius: f64,
    pub kind: String,
    /// Ordered target ids; `next_target_index` points at the active one.
    pub targets: Vec<i32>,
    pub next_target_index: usize,
    /// Simulated time until which the pedestrian stands still.
    pub waiting_until: Option<f64>,
}

impl Pedestrian {
    /// Id of the target the pedestrian is walking towards.
    #[must_use]
    pub fn current_target(&self) -> Option<i32> {
        self.targets.get(self.next_target_index).copied()
    }

    /// Whether another target follows the current one.
    #[must_use]
    pub fn has_next_target(&self) -> bool {
        self.next_target_index + 1 < self.targets.len()
    }

    #[must_use]
    pub fn speed(&self) -> f64 {
        self.velocity.x.hypot(self.velocity.y)
    }
}

/// A static polygonal obstacle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: i32,
    pub shape: Vec<Point2d>,
}

/// A polygonal area pedestrians walk towards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: i32,
    pub shape: Vec<Point2d>,
}

/// Rewrites the target list of every pedestrian standing inside `area`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetChanger {
    pub id: String,
    pub area: Vec<Point2d>,
    pub targets: Vec<i32>,
}

/// What a stimulus asks pedestrians to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusKind {
    /// Stand still for the stimulus duration.
    Wait,
    /// Abandon the remaining targets.
    Stop,
}

/// A timed instruction delivered to pedestrians in an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    pub kind: StimulusKind,
    /// Simulated time at which the stimulus fires.
    pub time: f64,
    #[serde(default)]
    pub duration: f64,
    /// Area of effect; every pedestrian when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<Vec<Point2d>>,
}

/// Axis-aligned rectangle enclosing the scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point2d,
    pub max: Point2d,
}

/// Read and write access to scenario state between steps.
pub trait World: Send {
    fn scenario_name(&self) -> &str;

    /// Current simulated time in seconds.
    fn sim_time(&self) -> f64;

    /// Simulated seconds covered by one step.
    fn step_length(&self) -> f64;

    fn bounding_box(&self) -> BoundingBox;

    /// Pedestrian ids in ascending order.
    fn pedestrian_ids(&self) -> Vec<i32>;

    fn pedestrian(&self, id: i32) -> Option<&Pedestrian>;

    fn pedestrian_mut(&mut self, id: i32) -> Option<&mut Pedestrian>;

    /// Smallest id greater than every pedestrian id ever used.
    fn next_free_pedestrian_id(&self) -> i32;

    /// Inserts a pedestrian; it is reported as departed after the next step.
    fn add_pedestrian(&mut self, pedestrian: Pedestrian) -> Result<(), WorldError>;

    /// Pedestrians that entered during the last completed step.
    fn departed_pedestrians(&self) -> &[i32];

    /// Pedestrians that reached their final target during the last completed step.
    fn arrived_pedestrians(&self) -> &[i32];

    fn obstacles(&self) -> &[Obstacle];

    fn obstacle(&self, id: i32) -> Option<&Obstacle> {
        self.obstacles().iter().find(|obstacle| obstacle.id == id)
    }

    fn has_target(&self, id: i32) -> bool;

    fn target_changer_ids(&self) -> Vec<String>;

    fn add_target_changer(&mut self, changer: TargetChanger) -> Result<(), WorldError>;

    fn remove_target_changer(&mut self, id: &str) -> Result<(), WorldError>;

    /// Stimuli that have not fired yet.
    fn pending_stimuli(&self) -> &[Stimulus];

    fn add_stimuli(&mut self, stimuli: Vec<Stimulus>) -> Result<(), WorldError>;

    /// Identifiers of cache entries shipped with the scenario.
    fn cache_ids(&self) -> &[String];
}

/// A steppable simulation owning its [`World`].
pub trait Simulation: Send {
    fn world(&self) -> &dyn World;

    fn world_mut(&mut self) -> &mut dyn World;

    /// Advances the model by exactly one step.
    fn step(&mut self) -> Result<(), SimulationError>;

    /// Whether the simulation's own termination condition has fired.
    fn is_finished(&self) -> bool;
}

/// Where a scenario document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOrigin {
    /// A file on the server's filesystem.
    Path(Utf8PathBuf),
    /// A document shipped by the client.
    Inline(ScenarioFile),
}

/// A request to build a simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioRequest {
    pub origin: ScenarioOrigin,
    pub cache: Option<Vec<CacheEntry>>,
}

impl ScenarioRequest {
    #[must_use]
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            origin: ScenarioOrigin::Path(path.into()),
            cache: None,
        }
    }

    #[must_use]
    pub fn inline(file: ScenarioFile, cache: Option<Vec<CacheEntry>>) -> Self {
        Self {
            origin: ScenarioOrigin::Inline(file),
            cache,
        }
    }
}

/// Builds simulations from scenario requests.
#[cfg_attr(test, mockall::automock)]
pub trait ScenarioSource: Send + Sync {
    /// Parses the scenario and returns a simulation paused at time zero.
    fn load(&self, request: ScenarioRequest) -> Result<Box<dyn Simulation>, ScenarioError>;
}
