//! JSON scenario documents and the filesystem-backed scenario source.

use std::collections::BTreeSet;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::info;

use stride_protocol::Point2d;

use super::memory::MemorySimulation;
use super::{
    BoundingBox, Obstacle, Pedestrian, ScenarioError, ScenarioOrigin, ScenarioRequest,
    ScenarioSource, Simulation, Stimulus, Target, TargetChanger,
};

const SCENARIO_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::scenario");

const fn default_step_length() -> f64 {
    0.4
}

const fn default_finish_time() -> f64 {
    100.0
}

const fn default_free_flow_speed() -> f64 {
    1.34
}

const fn default_radius() -> f64 {
    0.2
}

fn default_kind() -> String {
    "pedestrian".to_owned()
}

/// Attributes of a pedestrian, without its id.
///
/// Used both inside scenario documents and as the JSON payload of the
/// pedestrian `ADD` variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPedestrian {
    pub position: Point2d,
    #[serde(default)]
    pub targets: Vec<i32>,
    #[serde(default = "default_free_flow_speed")]
    pub free_flow_speed: f64,
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default = "default_kind")]
    pub kind: String,
}

impl NewPedestrian {
    /// Rejects attributes the model cannot walk with.
    pub fn check(&self) -> Result<(), &'static str> {
        if !(self.position.x.is_finite() && self.position.y.is_finite()) {
            return Err("position must be finite");
        }
        if !(self.free_flow_speed.is_finite() && self.free_flow_speed >= 0.0) {
            return Err("free-flow speed must be a non-negative number");
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err("radius must be a positive number");
        }
        Ok(())
    }

    #[must_use]
    pub fn into_pedestrian(self, id: i32) -> Pedestrian {
        Pedestrian {
            id,
            position: self.position,
            velocity: Point2d::default(),
            free_flow_speed: self.free_flow_speed,
            radius: self.radius,
            kind: self.kind,
            targets: self.targets,
            next_target_index: 0,
            waiting_until: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedestrianSpec {
    pub id: i32,
    #[serde(flatten)]
    pub attributes: NewPedestrian,
}

/// A scenario as stored on disk or shipped inline by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_step_length")]
    pub step_length: f64,
    /// The simulation terminates on its own once this time is reached.
    #[serde(default = "default_finish_time")]
    pub finish_time: f64,
    /// Explicit scenario bounds; derived from the elements when absent.
    #[serde(default)]
    pub bounds: Option<BoundingBox>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub pedestrians: Vec<PedestrianSpec>,
    #[serde(default)]
    pub target_changers: Vec<TargetChanger>,
    #[serde(default)]
    pub stimuli: Vec<Stimulus>,
}

impl ScenarioDocument {
    /// Parses and validates a JSON scenario.
    pub fn parse(content: &str) -> Result<Self, ScenarioError> {
        let document: Self = serde_json::from_str(content)?;
        document.validate()?;
        Ok(document)
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.step_length.is_finite() && self.step_length > 0.0) {
            return Err(ScenarioError::invalid("step_length must be positive"));
        }
        if !(self.finish_time.is_finite() && self.finish_time >= 0.0) {
            return Err(ScenarioError::invalid("finish_time must not be negative"));
        }

        for pedestrian in &self.pedestrians {
            pedestrian.attributes.check().map_err(|reason| {
                ScenarioError::invalid(format!("pedestrian {}: {reason}", pedestrian.id))
            })?;
        }

        let target_ids = unique_ids(self.targets.iter().map(|target| target.id), "target")?;
        unique_ids(self.obstacles.iter().map(|obstacle| obstacle.id), "obstacle")?;
        unique_ids(
            self.pedestrians.iter().map(|pedestrian| pedestrian.id),
            "pedestrian",
        )?;

        let referenced = self
            .pedestrians
            .iter()
            .flat_map(|pedestrian| pedestrian.attributes.targets.iter())
            .chain(
                self.target_changers
                    .iter()
                    .flat_map(|changer| changer.targets.iter()),
            );
        for id in referenced {
            if !target_ids.contains(id) {
                return Err(ScenarioError::invalid(format!(
                    "reference to unknown target {id}"
                )));
            }
        }
        Ok(())
    }
}

fn unique_ids(
    ids: impl Iterator<Item = i32>,
    element: &str,
) -> Result<BTreeSet<i32>, ScenarioError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ScenarioError::invalid(format!("duplicate {element} id {id}")));
        }
    }
    Ok(seen)
}

/// Loads JSON scenarios from disk or from inline client documents.
///
/// Relative paths resolve against the configured scenario root, or the
/// daemon's working directory when none is set.
#[derive(Debug, Clone, Default)]
pub struct JsonScenarioSource {
    root: Option<Utf8PathBuf>,
}

impl JsonScenarioSource {
    #[must_use]
    pub fn new(root: Option<Utf8PathBuf>) -> Self {
        Self { root }
    }

    fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn read(&self, origin: ScenarioOrigin) -> Result<(String, String), ScenarioError> {
        match origin {
            ScenarioOrigin::Path(path) => {
                let resolved = self.resolve(&path);
                let content =
                    fs::read_to_string(&resolved).map_err(|source| ScenarioError::Read {
                        path: resolved.clone(),
                        source,
                    })?;
                let name = resolved.file_stem().unwrap_or_default().to_owned();
                Ok((name, content))
            }
            ScenarioOrigin::Inline(file) => Ok((file.name, file.content)),
        }
    }
}

impl ScenarioSource for JsonScenarioSource {
    fn load(&self, request: ScenarioRequest) -> Result<Box<dyn Simulation>, ScenarioError> {
        let ScenarioRequest { origin, cache } = request;
        let (fallback_name, content) = self.read(origin)?;
        let mut document = ScenarioDocument::parse(&content)?;
        if document.name.is_empty() {
            document.name = fallback_name;
        }
        let cache_ids = cache
            .unwrap_or_default()
            .into_iter()
            .map(|entry| entry.identifier)
            .collect();

        info!(
            target: SCENARIO_TARGET,
            scenario = %document.name,
            pedestrians = document.pedestrians.len(),
            obstacles = document.obstacles.len(),
            "scenario loaded"
        );
        Ok(Box::new(MemorySimulation::new(document, cache_ids)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rstest::rstest;
    use stride_protocol::{CacheEntry, ScenarioFile};

    use super::*;

    const CORRIDOR: &str = r#"{
        "name": "corridor",
        "step_length": 0.5,
        "finish_time": 10.0,
        "targets": [{"id": 1, "shape": [{"x": 9, "y": 0}, {"x": 10, "y": 0}, {"x": 10, "y": 1}, {"x": 9, "y": 1}]}],
        "pedestrians": [{"id": 1, "position": {"x": 0.5, "y": 0.5}, "targets": [1]}]
    }"#;

    #[test]
    fn parses_defaults_for_omitted_fields() {
        let document = ScenarioDocument::parse(r#"{"name": "empty"}"#).expect("parse");
        assert!((document.step_length - 0.4).abs() < f64::EPSILON);
        assert!(document.pedestrians.is_empty());
    }

    #[rstest]
    #[case(r#"{"step_length": 0}"#, "step_length")]
    #[case(r#"{"targets": [{"id": 1, "shape": []}, {"id": 1, "shape": []}]}"#, "duplicate target id 1")]
    #[case(r#"{"pedestrians": [{"id": 3, "position": {"x": 0, "y": 0}, "targets": [7]}]}"#, "unknown target 7")]
    #[case(r#"{"pedestrians": [{"id": 4, "position": {"x": 0, "y": 0}, "free_flow_speed": -1.0}]}"#, "pedestrian 4: free-flow speed")]
    #[case(r#"{"pedestrians": [{"id": 5, "position": {"x": 0, "y": 0}, "radius": -0.2}]}"#, "pedestrian 5: radius")]
    fn rejects_inconsistent_documents(#[case] content: &str, #[case] fragment: &str) {
        let error = ScenarioDocument::parse(content).expect_err("invalid scenario");
        assert!(
            error.to_string().contains(fragment),
            "unexpected error: {error}"
        );
    }

    #[test]
    fn inline_scenarios_record_cache_ids() {
        let source = JsonScenarioSource::default();
        let request = ScenarioRequest::inline(
            ScenarioFile {
                name: "inline".to_owned(),
                content: CORRIDOR.to_owned(),
            },
            Some(vec![CacheEntry {
                identifier: "floorfield-1".to_owned(),
                data: vec![1, 2, 3],
            }]),
        );
        let simulation = source.load(request).expect("load inline scenario");
        assert_eq!(simulation.world().scenario_name(), "corridor");
        assert_eq!(simulation.world().cache_ids(), ["floorfield-1".to_owned()]);
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut file =
            fs::File::create(dir.path().join("corridor.json")).expect("create scenario file");
        file.write_all(CORRIDOR.as_bytes()).expect("write scenario");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");

        let source = JsonScenarioSource::new(Some(root));
        let simulation = source
            .load(ScenarioRequest::from_path("corridor.json"))
            .expect("load from root");
        assert_eq!(simulation.world().pedestrian_ids(), vec![1]);
    }

    #[test]
    fn missing_files_report_the_resolved_path() {
        let source = JsonScenarioSource::new(Some(Utf8PathBuf::from("/nonexistent")));
        let error = source
            .load(ScenarioRequest::from_path("missing.json"))
            .err()
            .expect("missing file");
        assert!(error.to_string().contains("/nonexistent/missing.json"));
    }
}
