//! In-process kinematic reference model.
//!
//! Pedestrians walk in a straight line towards the centroid of their current
//! target at their free-flow speed. Reaching a target advances the target
//! list; reaching the last target removes the pedestrian. There is no
//! collision avoidance.

use std::collections::BTreeMap;

use stride_protocol::Point2d;

use super::geometry::{self, centroid, contains, distance};
use super::{
    BoundingBox, Obstacle, Pedestrian, ScenarioDocument, Simulation, SimulationError, Stimulus,
    StimulusKind, TIME_EPSILON, Target, TargetChanger, World, WorldError,
};

/// Scenario state of the [`MemorySimulation`].
#[derive(Debug, Clone)]
pub struct MemoryWorld {
    name: String,
    time: f64,
    step_length: f64,
    bounds: BoundingBox,
    obstacles: Vec<Obstacle>,
    targets: Vec<Target>,
    pedestrians: BTreeMap<i32, Pedestrian>,
    highest_id: i32,
    pending_departures: Vec<i32>,
    departed: Vec<i32>,
    arrived: Vec<i32>,
    target_changers: Vec<TargetChanger>,
    stimuli: Vec<Stimulus>,
    cache_ids: Vec<String>,
}

impl MemoryWorld {
    fn from_document(document: ScenarioDocument, cache_ids: Vec<String>) -> Self {
        let ScenarioDocument {
            name,
            step_length,
            bounds,
            obstacles,
            targets,
            pedestrians,
            target_changers,
            stimuli,
            ..
        } = document;

        let pedestrians: BTreeMap<i32, Pedestrian> = pedestrians
            .into_iter()
            .map(|spec| (spec.id, spec.attributes.into_pedestrian(spec.id)))
            .collect();
        let bounds = bounds.unwrap_or_else(|| derive_bounds(&obstacles, &targets, &pedestrians));
        let highest_id = pedestrians.keys().next_back().copied().unwrap_or(0);
        let pending_departures = pedestrians.keys().copied().collect();

        Self {
            name,
            time: 0.0,
            step_length,
            bounds,
            obstacles,
            targets,
            pedestrians,
            highest_id,
            pending_departures,
            departed: Vec::new(),
            arrived: Vec::new(),
            target_changers,
            stimuli,
            cache_ids,
        }
    }

    fn target_point(&self, id: i32) -> Option<Point2d> {
        self.targets
            .iter()
            .find(|target| target.id == id)
            .and_then(|target| centroid(&target.shape))
    }

    fn fire_stimuli(&mut self) {
        let now = self.time;
        let (due, pending): (Vec<Stimulus>, Vec<Stimulus>) = self
            .stimuli
            .drain(..)
            .partition(|stimulus| stimulus.time <= now + TIME_EPSILON);
        self.stimuli = pending;

        for stimulus in due {
            let affected = self.pedestrians.values_mut().filter(|pedestrian| {
                stimulus
                    .area
                    .as_deref()
                    .is_none_or(|area| contains(area, pedestrian.position))
            });
            for pedestrian in affected {
                match stimulus.kind {
                    StimulusKind::Wait => {
                        pedestrian.waiting_until = Some(stimulus.time + stimulus.duration);
                    }
                    StimulusKind::Stop => {
                        pedestrian.targets.clear();
                        pedestrian.next_target_index = 0;
                    }
                }
            }
        }
    }

    fn apply_target_changers(&mut self) {
        for changer in &self.target_changers {
            for pedestrian in self.pedestrians.values_mut() {
                if contains(&changer.area, pedestrian.position)
                    && pedestrian.targets != changer.targets
                {
                    pedestrian.targets.clone_from(&changer.targets);
                    pedestrian.next_target_index = 0;
                }
            }
        }
    }

    fn move_pedestrians(&mut self) {
        let now = self.time;
        let dt = self.step_length;
        let goals: BTreeMap<i32, Option<Point2d>> = self
            .pedestrians
            .values()
            .map(|pedestrian| {
                let goal = pedestrian
                    .current_target()
                    .and_then(|target| self.target_point(target));
                (pedestrian.id, goal)
            })
            .collect();

        for pedestrian in self.pedestrians.values_mut() {
            let waiting = pedestrian
                .waiting_until
                .is_some_and(|until| until > now + TIME_EPSILON);
            let goal = goals.get(&pedestrian.id).copied().flatten();
            let Some(goal) = goal.filter(|_| !waiting) else {
                pedestrian.velocity = Point2d::default();
                continue;
            };

            let start = pedestrian.position;
            let remaining = distance(start, goal);
            let reach = pedestrian.free_flow_speed * dt;
            if remaining <= reach {
                pedestrian.position = goal;
                pedestrian.next_target_index += 1;
                if pedestrian.next_target_index >= pedestrian.targets.len() {
                    self.arrived.push(pedestrian.id);
                }
            } else {
                let scale = reach / remaining;
                pedestrian.position = Point2d::new(
                    start.x + (goal.x - start.x) * scale,
                    start.y + (goal.y - start.y) * scale,
                );
            }
            pedestrian.velocity = Point2d::new(
                (pedestrian.position.x - start.x) / dt,
                (pedestrian.position.y - start.y) / dt,
            );
        }

        for id in &self.arrived {
            self.pedestrians.remove(id);
        }
    }
}

fn derive_bounds(
    obstacles: &[Obstacle],
    targets: &[Target],
    pedestrians: &BTreeMap<i32, Pedestrian>,
) -> BoundingBox {
    let points: Vec<Point2d> = obstacles
        .iter()
        .flat_map(|obstacle| obstacle.shape.iter().copied())
        .chain(targets.iter().flat_map(|target| target.shape.iter().copied()))
        .chain(pedestrians.values().map(|pedestrian| pedestrian.position))
        .collect();
    geometry::bounding_box(&points).unwrap_or(BoundingBox {
        min: Point2d::default(),
        max: Point2d::default(),
    })
}

impl World for MemoryWorld {
    fn scenario_name(&self) -> &str {
        &self.name
    }

    fn sim_time(&self) -> f64 {
        self.time
    }

    fn step_length(&self) -> f64 {
        self.step_length
    }

    fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }

    fn pedestrian_ids(&self) -> Vec<i32> {
        self.pedestrians.keys().copied().collect()
    }

    fn pedestrian(&self, id: i32) -> Option<&Pedestrian> {
        self.pedestrians.get(&id)
    }

    fn pedestrian_mut(&mut self, id: i32) -> Option<&mut Pedestrian> {
        self.pedestrians.get_mut(&id)
    }

    fn next_free_pedestrian_id(&self) -> i32 {
        self.highest_id.saturating_add(1)
    }

    fn add_pedestrian(&mut self, pedestrian: Pedestrian) -> Result<(), WorldError> {
        let id = pedestrian.id;
        if self.pedestrians.contains_key(&id) {
            return Err(WorldError::DuplicatePedestrian { id });
        }
        if let Some(unknown) = pedestrian
            .targets
            .iter()
            .find(|target| !self.has_target(**target))
        {
            return Err(WorldError::UnknownTarget { id: *unknown });
        }
        self.highest_id = self.highest_id.max(id);
        self.pending_departures.push(id);
        self.pedestrians.insert(id, pedestrian);
        Ok(())
    }

    fn departed_pedestrians(&self) -> &[i32] {
        &self.departed
    }

    fn arrived_pedestrians(&self) -> &[i32] {
        &self.arrived
    }

    fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    fn has_target(&self, id: i32) -> bool {
        self.targets.iter().any(|target| target.id == id)
    }

    fn target_changer_ids(&self) -> Vec<String> {
        self.target_changers
            .iter()
            .map(|changer| changer.id.clone())
            .collect()
    }

    fn add_target_changer(&mut self, changer: TargetChanger) -> Result<(), WorldError> {
        if self
            .target_changers
            .iter()
            .any(|existing| existing.id == changer.id)
        {
            return Err(WorldError::DuplicateTargetChanger { id: changer.id });
        }
        if let Some(unknown) = changer
            .targets
            .iter()
            .find(|target| !self.has_target(**target))
        {
            return Err(WorldError::UnknownTarget { id: *unknown });
        }
        self.target_changers.push(changer);
        Ok(())
    }

    fn remove_target_changer(&mut self, id: &str) -> Result<(), WorldError> {
        let before = self.target_changers.len();
        self.target_changers.retain(|changer| changer.id != id);
        if self.target_changers.len() == before {
            return Err(WorldError::UnknownTargetChanger { id: id.to_owned() });
        }
        Ok(())
    }

    fn pending_stimuli(&self) -> &[Stimulus] {
        &self.stimuli
    }

    fn add_stimuli(&mut self, stimuli: Vec<Stimulus>) -> Result<(), WorldError> {
        for stimulus in &stimuli {
            if !stimulus.time.is_finite() || !stimulus.duration.is_finite() {
                return Err(WorldError::InvalidStimulus {
                    message: "time and duration must be finite".to_owned(),
                });
            }
            if stimulus.duration < 0.0 {
                return Err(WorldError::InvalidStimulus {
                    message: "duration must not be negative".to_owned(),
                });
            }
        }
        self.stimuli.extend(stimuli);
        Ok(())
    }

    fn cache_ids(&self) -> &[String] {
        &self.cache_ids
    }
}

/// Fixed-step simulation over a [`MemoryWorld`].
#[derive(Debug, Clone)]
pub struct MemorySimulation {
    world: MemoryWorld,
    finish_time: f64,
    steps: u32,
}

impl MemorySimulation {
    #[must_use]
    pub fn new(document: ScenarioDocument, cache_ids: Vec<String>) -> Self {
        let finish_time = document.finish_time;
        Self {
            world: MemoryWorld::from_document(document, cache_ids),
            finish_time,
            steps: 0,
        }
    }
}

impl Simulation for MemorySimulation {
    fn world(&self) -> &dyn World {
        &self.world
    }

    fn world_mut(&mut self) -> &mut dyn World {
        &mut self.world
    }

    fn step(&mut self) -> Result<(), SimulationError> {
        if self.is_finished() {
            return Err(SimulationError::Step {
                message: format!("simulation already finished at t={}", self.world.time),
            });
        }
        self.steps = self.steps.saturating_add(1);
        // Derived from the step count so repeated additions do not drift.
        self.world.time = f64::from(self.steps) * self.world.step_length;
        self.world.arrived.clear();
        self.world.departed = std::mem::take(&mut self.world.pending_departures);

        self.world.fire_stimuli();
        self.world.apply_target_changers();
        self.world.move_pedestrians();
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.world.time + TIME_EPSILON >= self.finish_time
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn corridor() -> MemorySimulation {
        let document = ScenarioDocument::parse(
            r#"{
                "name": "corridor",
                "step_length": 1.0,
                "finish_time": 5.0,
                "targets": [
                    {"id": 1, "shape": [{"x": 2, "y": 0}, {"x": 2, "y": 0}]},
                    {"id": 2, "shape": [{"x": 2, "y": 4}, {"x": 2, "y": 4}]}
                ],
                "pedestrians": [
                    {"id": 1, "position": {"x": 0, "y": 0}, "targets": [1], "free_flow_speed": 1.0},
                    {"id": 5, "position": {"x": 0, "y": 0}, "targets": [1, 2], "free_flow_speed": 1.0}
                ]
            }"#,
        )
        .expect("parse corridor");
        MemorySimulation::new(document, Vec::new())
    }

    #[rstest]
    fn pedestrians_walk_at_free_flow_speed(mut corridor: MemorySimulation) {
        corridor.step().expect("step");
        let pedestrian = corridor.world().pedestrian(1).expect("pedestrian 1");
        assert_eq!(pedestrian.position, Point2d::new(1.0, 0.0));
        assert!((pedestrian.speed() - 1.0).abs() < 1e-9);
        assert_eq!(corridor.world().departed_pedestrians(), [1, 5]);
    }

    #[rstest]
    fn arrival_removes_pedestrians_after_last_target(mut corridor: MemorySimulation) {
        corridor.step().expect("first step");
        corridor.step().expect("second step");
        assert_eq!(corridor.world().arrived_pedestrians(), [1]);
        assert_eq!(corridor.world().pedestrian_ids(), vec![5]);
        let walker = corridor.world().pedestrian(5).expect("pedestrian 5");
        assert_eq!(walker.current_target(), Some(2));
        assert!(!walker.has_next_target());
    }

    #[rstest]
    fn wait_stimulus_halts_pedestrians(mut corridor: MemorySimulation) {
        corridor
            .world_mut()
            .add_stimuli(vec![Stimulus {
                kind: StimulusKind::Wait,
                time: 1.0,
                duration: 2.0,
                area: None,
            }])
            .expect("schedule stimulus");
        corridor.step().expect("step");
        let pedestrian = corridor.world().pedestrian(1).expect("pedestrian 1");
        assert_eq!(pedestrian.position, Point2d::new(0.0, 0.0));
        assert!(corridor.world().pending_stimuli().is_empty());
    }

    #[rstest]
    fn target_changer_rewrites_targets(mut corridor: MemorySimulation) {
        corridor
            .world_mut()
            .add_target_changer(TargetChanger {
                id: "detour".to_owned(),
                area: vec![
                    Point2d::new(-1.0, -1.0),
                    Point2d::new(1.0, -1.0),
                    Point2d::new(1.0, 1.0),
                    Point2d::new(-1.0, 1.0),
                ],
                targets: vec![2],
            })
            .expect("install changer");
        corridor.step().expect("step");
        let pedestrian = corridor.world().pedestrian(1).expect("pedestrian 1");
        assert_eq!(pedestrian.targets, vec![2]);
    }

    #[rstest]
    fn terminates_at_finish_time(mut corridor: MemorySimulation) {
        for _ in 0..5 {
            corridor.step().expect("step");
        }
        assert!(corridor.is_finished());
        assert!(corridor.step().is_err());
    }

    #[rstest]
    fn duplicate_pedestrians_are_rejected(mut corridor: MemorySimulation) {
        let world = corridor.world_mut();
        let existing = world.pedestrian(1).cloned().expect("pedestrian 1");
        let error = world.add_pedestrian(existing).expect_err("duplicate id");
        assert!(matches!(error, WorldError::DuplicatePedestrian { id: 1 }));
        assert_eq!(world.next_free_pedestrian_id(), 6);
    }
}
