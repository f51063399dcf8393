//! Behavioural tests for the daemon bootstrap sequence.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::bootstrap::{BootstrapError, ConfigLoader, bootstrap_with};
use crate::process::{LaunchError, ShutdownError, ShutdownSignal, run_daemon_with};

use super::support::{FailingConfigLoader, HealthEvent, RecordingHealthReporter, TestConfigLoader};

type StepResult = Result<(), String>;

/// Releases the daemon as soon as it starts waiting.
struct ImmediateShutdown;

impl ShutdownSignal for ImmediateShutdown {
    fn wait(&self) -> Result<(), ShutdownError> {
        Ok(())
    }
}

struct BootstrapWorld {
    loader: Option<Box<dyn ConfigLoader>>,
    reporter: Arc<RecordingHealthReporter>,
    bootstrap: Option<Result<(), BootstrapError>>,
    run: Option<Result<(), LaunchError>>,
}

impl BootstrapWorld {
    fn new() -> Self {
        Self {
            loader: None,
            reporter: Arc::new(RecordingHealthReporter::default()),
            bootstrap: None,
            run: None,
        }
    }

    fn loader(&self) -> Result<&dyn ConfigLoader, String> {
        self.loader
            .as_deref()
            .ok_or_else(|| "no configuration loader selected".to_owned())
    }

    fn has(&self, wanted: impl Fn(&HealthEvent) -> bool) -> StepResult {
        let events = self.reporter.events();
        if events.iter().any(wanted) {
            Ok(())
        } else {
            Err(format!("expected health event missing: {events:?}"))
        }
    }
}

#[fixture]
fn world() -> RefCell<BootstrapWorld> {
    RefCell::new(BootstrapWorld::new())
}

#[given("a healthy configuration loader")]
fn given_healthy_loader(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().loader = Some(Box::new(TestConfigLoader::tcp()));
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().loader = Some(Box::new(FailingConfigLoader));
}

#[when("the daemon bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<BootstrapWorld>) -> StepResult {
    let mut world = world.borrow_mut();
    let result = bootstrap_with(world.loader()?, world.reporter.clone()).map(drop);
    world.bootstrap = Some(result);
    Ok(())
}

#[when("the daemon runs until shutdown is requested")]
fn when_daemon_runs(world: &RefCell<BootstrapWorld>) -> StepResult {
    let mut world = world.borrow_mut();
    let result = run_daemon_with(world.loader()?, world.reporter.clone(), &ImmediateShutdown);
    world.run = Some(result);
    Ok(())
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<BootstrapWorld>) -> StepResult {
    match &world.borrow().bootstrap {
        Some(Ok(())) => Ok(()),
        Some(Err(error)) => Err(format!("bootstrap error: {error}")),
        None => Err("bootstrap did not run".to_owned()),
    }
}

#[then("bootstrap fails")]
fn then_bootstrap_fails(world: &RefCell<BootstrapWorld>) -> StepResult {
    match &world.borrow().bootstrap {
        Some(Err(BootstrapError::Configuration { .. })) => Ok(()),
        other => Err(format!("expected a configuration failure, got {other:?}")),
    }
}

#[then("the health reporter records the bootstrap succeeding")]
fn then_reporter_success(world: &RefCell<BootstrapWorld>) -> StepResult {
    world
        .borrow()
        .has(|event| *event == HealthEvent::BootstrapSucceeded)
}

#[then("the health reporter records the bootstrap failure")]
fn then_reporter_failure(world: &RefCell<BootstrapWorld>) -> StepResult {
    world
        .borrow()
        .has(|event| matches!(event, HealthEvent::BootstrapFailed(_)))
}

#[then("the health reporter records the listener becoming ready")]
fn then_reporter_listener(world: &RefCell<BootstrapWorld>) -> StepResult {
    let world = world.borrow();
    if let Some(Err(error)) = &world.run {
        return Err(format!("daemon run failed: {error}"));
    }
    world.has(|event| {
        matches!(event, HealthEvent::ListenerReady(endpoint) if endpoint.starts_with("tcp://"))
    })
}

#[scenario(path = "tests/features/daemon_bootstrap.feature")]
fn daemon_bootstrap(world: RefCell<BootstrapWorld>) -> Result<(), String> {
    let _ = world;
    Ok(())
}
