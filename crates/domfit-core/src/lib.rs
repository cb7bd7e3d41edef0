#![forbid(unsafe_code)]

//! Core: scroll metrics, trigger sources, reentrancy gating, and mutation kinds.
//!
//! `domfit-core` is the vocabulary layer. The runtime (`domfit-runtime`) owns
//! the fit-convergence controller; the host document (`domfit-web`) produces
//! the size and content notifications. Both speak in the types defined here.

pub mod geometry;
pub mod logging;
pub mod mutation;
pub mod trigger;

pub use geometry::{BoxSize, ScrollMetrics};
pub use mutation::{MutationFilter, MutationKinds};
pub use trigger::{CoalescePolicy, TriggerDisposition, TriggerGate, TriggerSink, TriggerSource};
