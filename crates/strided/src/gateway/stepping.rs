//! Background thread that advances the simulation on request.
//!
//! The loop holds the state mutex for one step at a time, so readers
//! using [`super::SimulationGateway::access_state`] only ever observe state at
//! a step boundary.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::{GATEWAY_TARGET, GatewayError, GatewayState, LifecyclePhase, lock_state};
use crate::world::TIME_EPSILON;

/// How an advance request ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum AdvanceReport {
    /// The target time was reached with the simulation still running.
    Reached { at: f64 },
    /// The simulation's own termination condition fired.
    Terminated { at: f64, early: bool },
}

pub(crate) enum LoopRequest {
    Advance {
        target: f64,
        reply: Sender<Result<AdvanceReport, GatewayError>>,
    },
    Stop,
}

/// Handle to the running stepping thread.
pub(crate) struct SteppingLoop {
    requests: Sender<LoopRequest>,
    handle: JoinHandle<()>,
}

impl SteppingLoop {
    pub(crate) fn spawn(state: Arc<Mutex<GatewayState>>) -> Result<Self, GatewayError> {
        let (requests, inbox) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("simulation-loop".to_owned())
            .spawn(move || run(&state, &inbox))
            .map_err(GatewayError::Spawn)?;
        Ok(Self { requests, handle })
    }

    /// Blocks until the loop has stepped to `target` or the simulation ended.
    pub(crate) fn advance(&self, target: f64) -> Result<AdvanceReport, GatewayError> {
        let (reply, outcome) = mpsc::channel();
        self.requests
            .send(LoopRequest::Advance { target, reply })
            .map_err(|_| GatewayError::LoopTerminated)?;
        outcome.recv().map_err(|_| GatewayError::LoopTerminated)?
    }

    /// Asks the loop to exit and waits for the thread.
    pub(crate) fn stop(self) {
        // A closed channel means the loop already exited.
        let _ = self.requests.send(LoopRequest::Stop);
        if self.handle.join().is_err() {
            warn!(target: GATEWAY_TARGET, "simulation loop panicked");
        }
    }
}

fn run(state: &Mutex<GatewayState>, inbox: &Receiver<LoopRequest>) {
    info!(target: GATEWAY_TARGET, "simulation loop started");
    while let Ok(request) = inbox.recv() {
        match request {
            LoopRequest::Advance { target, reply } => {
                let outcome = step_until(state, target);
                if reply.send(outcome).is_err() {
                    debug!(target: GATEWAY_TARGET, "advance requester went away");
                }
            }
            LoopRequest::Stop => break,
        }
    }
    info!(target: GATEWAY_TARGET, "simulation loop stopped");
}

fn step_until(state: &Mutex<GatewayState>, target: f64) -> Result<AdvanceReport, GatewayError> {
    loop {
        let mut guard = lock_state(state);
        let (now, finished) = {
            let simulation = guard.simulation.as_ref().ok_or(GatewayError::NoScenario)?;
            (simulation.world().sim_time(), simulation.is_finished())
        };

        if finished {
            let early = now + TIME_EPSILON < target;
            guard.phase = LifecyclePhase::Finished;
            if early {
                guard.stopped_early_at = Some(now);
            }
            info!(
                target: GATEWAY_TARGET,
                sim_time = now,
                requested = target,
                early,
                "simulation reached its end"
            );
            return Ok(AdvanceReport::Terminated { at: now, early });
        }
        if now + TIME_EPSILON >= target {
            return Ok(AdvanceReport::Reached { at: now });
        }

        if let Some(simulation) = guard.simulation.as_mut() {
            simulation.step()?;
        }
        // The guard drops here, releasing the state between steps.
    }
}
