//! Test suites for the stride daemon.

mod bootstrap_behaviour;
pub(crate) mod support;
