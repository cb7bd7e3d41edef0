#![forbid(unsafe_code)]

//! Runtime: the fit-convergence controller and its trigger wiring.
//!
//! A [`FitController`] keeps a container's rendered content inside its
//! visible extent by calling host-supplied grow/shrink callbacks, one step per
//! rendering tick. Size-change and content-change [`Notifier`]s request
//! passes; a single-flag gate keeps passes from overlapping.
//!
//! The controller never blocks and never spawns threads. The host drives it:
//!
//! 1. [`FitController::pump`] after notifications were delivered.
//! 2. [`FitController::on_tick`] once per rendering tick.
//! 3. [`FitController::update`] when the callbacks change.
//! 4. [`FitController::detach`] on teardown.

pub mod config;
pub mod container;
pub mod controller;
pub mod notifier;
pub mod report;

pub use config::{ConfigError, FitConfig, MutationObserveConfig};
pub use container::{Container, FitCallbacks};
pub use controller::FitController;
pub use notifier::{HostNotifier, Notifier, NotifierSet};
pub use report::{FitStats, PassMode, PassOutcome, PassReport};

pub use domfit_core::{CoalescePolicy, ScrollMetrics, TriggerDisposition, TriggerSink, TriggerSource};
