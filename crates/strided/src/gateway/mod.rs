//! Simulation access gateway.
//!
//! The gateway owns one connection's simulation. Stepping happens on a
//! dedicated `simulation-loop` thread; protocol handlers read and mutate the
//! scenario through [`SimulationGateway::access_state`], which takes the same
//! mutex the loop holds while stepping. Handlers therefore never observe a
//! half-applied step, and the loop never steps while a handler holds the
//! state.

mod errors;
mod stepping;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::world::{ScenarioRequest, ScenarioSource, Simulation, World};

pub use self::errors::GatewayError;
use self::stepping::{AdvanceReport, SteppingLoop};

pub(crate) const GATEWAY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::gateway");

/// Lifecycle of the simulation behind a gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// No scenario loaded.
    Idle,
    /// Scenario loaded, stepping loop not yet started.
    Loaded,
    /// Stepping loop running and paused between advance requests.
    Running,
    /// The simulation's own termination condition fired.
    Finished,
    /// The stepping loop was halted by the client.
    Stopped,
}

pub(crate) struct GatewayState {
    simulation: Option<Box<dyn Simulation>>,
    phase: LifecyclePhase,
    stopped_early_at: Option<f64>,
    client_close_received: bool,
}

pub(crate) fn lock_state(state: &Mutex<GatewayState>) -> MutexGuard<'_, GatewayState> {
    state.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        warn!(
            target: GATEWAY_TARGET,
            "simulation state lock poisoned; continuing with recovered state"
        );
        poisoned.into_inner()
    })
}

/// Synchronises one client session with its simulation.
pub struct SimulationGateway {
    source: Arc<dyn ScenarioSource>,
    state: Arc<Mutex<GatewayState>>,
    stepping: Option<SteppingLoop>,
}

impl SimulationGateway {
    #[must_use]
    pub fn new(source: Arc<dyn ScenarioSource>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(GatewayState {
                simulation: None,
                phase: LifecyclePhase::Idle,
                stopped_early_at: None,
                client_close_received: false,
            })),
            stepping: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GatewayState> {
        lock_state(&self.state)
    }

    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.lock().phase
    }

    /// Simulated time at which the simulation ended before a requested target.
    #[must_use]
    pub fn stopped_early_at(&self) -> Option<f64> {
        self.lock().stopped_early_at
    }

    #[must_use]
    pub fn client_close_received(&self) -> bool {
        self.lock().client_close_received
    }

    /// Builds the simulation for `request`.
    ///
    /// # Errors
    ///
    /// Fails when a scenario is already loaded or the source rejects the
    /// request.
    pub fn load_scenario(&mut self, request: ScenarioRequest) -> Result<(), GatewayError> {
        if self.lock().phase != LifecyclePhase::Idle {
            return Err(GatewayError::AlreadyLoaded);
        }
        let simulation = self.source.load(request)?;
        let mut state = self.lock();
        state.simulation = Some(simulation);
        state.phase = LifecyclePhase::Loaded;
        Ok(())
    }

    /// Spawns the stepping loop. The simulation stays at its current time
    /// until [`advance`](Self::advance) is called.
    ///
    /// # Errors
    ///
    /// Fails without a loaded scenario or when the thread cannot be spawned.
    pub fn start_simulation(&mut self) -> Result<(), GatewayError> {
        match self.phase() {
            LifecyclePhase::Idle => return Err(GatewayError::NoScenario),
            LifecyclePhase::Loaded => {}
            LifecyclePhase::Running | LifecyclePhase::Finished | LifecyclePhase::Stopped => {
                return Ok(());
            }
        }
        self.stepping = Some(SteppingLoop::spawn(Arc::clone(&self.state))?);
        self.lock().phase = LifecyclePhase::Running;
        info!(target: GATEWAY_TARGET, "simulation started");
        Ok(())
    }

    /// Steps until the simulated time reaches `target_time`.
    ///
    /// A target at or before the current time advances exactly one step.
    /// Returns `false` without touching the simulation when it has already
    /// ended; a run that ends before the target records
    /// [`stopped_early_at`](Self::stopped_early_at) and still returns `true`.
    ///
    /// # Errors
    ///
    /// Fails when the simulation was never started, the model fails to step,
    /// or the stepping thread died.
    pub fn advance(&mut self, target_time: f64) -> Result<bool, GatewayError> {
        let (now, step_length) = {
            let state = self.lock();
            match state.phase {
                LifecyclePhase::Idle => return Err(GatewayError::NoScenario),
                LifecyclePhase::Loaded => return Err(GatewayError::NotStarted),
                LifecyclePhase::Finished | LifecyclePhase::Stopped => return Ok(false),
                LifecyclePhase::Running => {}
            }
            let world = state
                .simulation
                .as_ref()
                .ok_or(GatewayError::NoScenario)?
                .world();
            (world.sim_time(), world.step_length())
        };
        let target = if target_time <= now {
            now + step_length
        } else {
            target_time
        };

        let stepping = self.stepping.as_ref().ok_or(GatewayError::NotStarted)?;
        match stepping.advance(target)? {
            AdvanceReport::Reached { at } => {
                debug!(target: GATEWAY_TARGET, sim_time = at, "advanced");
            }
            AdvanceReport::Terminated { at, early } => {
                debug!(target: GATEWAY_TARGET, sim_time = at, early, "advanced to end");
            }
        }
        Ok(true)
    }

    /// Halts the stepping loop if one is running.
    ///
    /// Idempotent. Returns whether a running simulation was actually halted;
    /// a simulation that already ended on its own is not counted.
    pub fn stop_simulation_if_running(&mut self) -> bool {
        let Some(stepping) = self.stepping.take() else {
            return false;
        };
        stepping.stop();
        let mut state = self.lock();
        let was_running = state.phase == LifecyclePhase::Running;
        if was_running {
            state.phase = LifecyclePhase::Stopped;
            info!(target: GATEWAY_TARGET, "simulation stopped");
        }
        was_running
    }

    /// Records that the client asked to close the session.
    pub fn mark_client_close_received(&self) {
        self.lock().client_close_received = true;
    }

    /// Runs `callback` with exclusive access to the scenario state.
    ///
    /// The stepping loop cannot advance while the callback runs.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NoScenario`] before a scenario is loaded.
    pub fn access_state<R>(
        &self,
        callback: impl FnOnce(&mut dyn World) -> R,
    ) -> Result<R, GatewayError> {
        let mut state = self.lock();
        let simulation = state.simulation.as_mut().ok_or(GatewayError::NoScenario)?;
        Ok(callback(simulation.world_mut()))
    }
}

impl Drop for SimulationGateway {
    fn drop(&mut self) {
        self.stop_simulation_if_running();
    }
}

impl std::fmt::Debug for SimulationGateway {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SimulationGateway")
            .field("phase", &self.phase())
            .field("stepping", &self.stepping.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
