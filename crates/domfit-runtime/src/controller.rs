#![forbid(unsafe_code)]

//! Fit-convergence controller.
//!
//! [`FitController`] keeps a container's rendered content extent within its
//! visible extent by calling grow/shrink callbacks, waiting one rendering
//! tick between calls to observe each step's effect.
//!
//! # Pass algorithm
//!
//! At entry the pass reads the container once and commits to a direction:
//!
//! - **Shrink mode** (overflowing at entry): call `shrink()`, wait a tick,
//!   repeat until the container fits ([`PassOutcome::Fit`]) or `shrink()`
//!   returns `false` ([`PassOutcome::IrreducibleOverflow`]).
//! - **Grow mode** (fitting at entry): call `grow()` and wait a tick while the
//!   container fits and `grow()` returns `true`. This overshoots by one step.
//!   Then wait one more tick; if the container now overflows, call `shrink()`
//!   exactly once and wait a tick ([`PassOutcome::Corrected`]), otherwise end
//!   ([`PassOutcome::Settled`]).
//!
//! # Suspension
//!
//! A pass is a state machine. Every grow/shrink call is followed by a
//! suspension; the host resumes the pass by calling
//! [`on_tick`](FitController::on_tick) once layout has been flushed. Between
//! suspensions callbacks run synchronously.
//!
//! # Invariants
//!
//! - At most one pass runs at a time ([`TriggerGate`]).
//! - A pass never mixes callback pairs: [`update`](FitController::update)
//!   during a pass stages the new pair for the next pass.
//! - After [`detach`](FitController::detach) neither callback is invoked
//!   again; a suspended pass ends with [`PassOutcome::Detached`] at its next
//!   tick.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use domfit_runtime::{FitCallbacks, FitConfig, FitController, PassOutcome, TriggerSource};
//! use domfit_core::ScrollMetrics;
//!
//! let extents = Rc::new(Cell::new(ScrollMetrics::new(150, 100)));
//! let shrink_target = Rc::clone(&extents);
//! let callbacks = FitCallbacks::new(
//!     || false,
//!     move || {
//!         let m = shrink_target.get();
//!         shrink_target.set(ScrollMetrics::new(m.scroll_width - 25, m.client_width));
//!         true
//!     },
//! );
//!
//! let mut ctl = FitController::attach(Rc::clone(&extents), callbacks, FitConfig::default(), Vec::new());
//! ctl.request(TriggerSource::Manual);
//! while ctl.is_running() {
//!     ctl.on_tick();
//! }
//! assert_eq!(ctl.last_report().map(|r| r.outcome), Some(PassOutcome::Fit));
//! assert_eq!(extents.get().scroll_width, 100);
//! ```

use std::collections::VecDeque;

use domfit_core::{ScrollMetrics, TriggerDisposition, TriggerGate, TriggerSink, TriggerSource};

use crate::config::FitConfig;
use crate::container::{Container, FitCallbacks};
use crate::notifier::{Notifier, NotifierSet};
use crate::report::{FitStats, PassMode, PassOutcome, PassReport};

/// Where a suspended pass resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Shrink mode, after a `shrink()` call.
    Shrinking,
    /// Grow mode, after a `grow()` call.
    Growing,
    /// Grow loop exited; waiting the extra tick before the overflow re-check.
    Settling,
    /// After the single corrective `shrink()`.
    Correcting,
}

/// Result of advancing a pass by one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Suspend(Phase),
    Finish(PassOutcome),
}

#[derive(Debug)]
struct ActivePass {
    idx: u64,
    trigger: TriggerSource,
    mode: Option<PassMode>,
    phase: Phase,
    grow_calls: u32,
    shrink_calls: u32,
    ticks: u32,
    shrink_exhausted: bool,
}

impl ActivePass {
    fn new(idx: u64, trigger: TriggerSource) -> Self {
        Self {
            idx,
            trigger,
            mode: None,
            phase: Phase::Shrinking,
            grow_calls: 0,
            shrink_calls: 0,
            ticks: 0,
            shrink_exhausted: false,
        }
    }

    fn shrink(&mut self, callbacks: &mut FitCallbacks) -> bool {
        self.shrink_calls += 1;
        let more = callbacks.shrink();
        self.shrink_exhausted = !more;
        more
    }

    fn grow(&mut self, callbacks: &mut FitCallbacks) -> bool {
        self.grow_calls += 1;
        callbacks.grow()
    }

    /// One iteration of the shrink loop.
    fn shrink_step(&mut self, metrics: ScrollMetrics, callbacks: &mut FitCallbacks) -> Step {
        if !metrics.is_overflowing() {
            return Step::Finish(PassOutcome::Fit);
        }
        if !self.shrink(callbacks) {
            return Step::Finish(PassOutcome::IrreducibleOverflow);
        }
        Step::Suspend(Phase::Shrinking)
    }

    /// One iteration of the grow loop. `grow()` is only called while fitting.
    fn grow_step(&mut self, metrics: ScrollMetrics, callbacks: &mut FitCallbacks) -> Step {
        if !metrics.is_overflowing() && self.grow(callbacks) {
            Step::Suspend(Phase::Growing)
        } else {
            Step::Suspend(Phase::Settling)
        }
    }

    /// Resume after a rendering tick.
    fn resume(&mut self, metrics: ScrollMetrics, callbacks: &mut FitCallbacks) -> Step {
        self.ticks += 1;
        match self.phase {
            Phase::Shrinking => self.shrink_step(metrics, callbacks),
            Phase::Growing => self.grow_step(metrics, callbacks),
            Phase::Settling => {
                if metrics.is_overflowing() {
                    self.shrink(callbacks);
                    Step::Suspend(Phase::Correcting)
                } else {
                    Step::Finish(PassOutcome::Settled)
                }
            }
            Phase::Correcting => Step::Finish(PassOutcome::Corrected),
        }
    }

    fn into_report(self, outcome: PassOutcome, final_metrics: Option<ScrollMetrics>) -> PassReport {
        PassReport {
            pass_idx: self.idx,
            trigger: self.trigger,
            mode: self.mode,
            outcome,
            grow_calls: self.grow_calls,
            shrink_calls: self.shrink_calls,
            ticks: self.ticks,
            shrink_exhausted: self.shrink_exhausted,
            final_metrics,
        }
    }
}

/// Observer-driven grow/shrink convergence for one container.
///
/// # Lifecycle
///
/// 1. [`FitController::attach`]: connect notifiers; no pass runs yet.
/// 2. [`FitController::pump`] / [`FitController::request`]: start passes.
/// 3. [`FitController::on_tick`]: resume the in-flight pass once per tick.
/// 4. [`FitController::update`]: swap callbacks and request a pass.
/// 5. [`FitController::detach`] (or drop): disconnect notifiers.
pub struct FitController<C: Container> {
    container: C,
    callbacks: FitCallbacks,
    staged: Option<FitCallbacks>,
    config: FitConfig,
    notifiers: NotifierSet<C>,
    sink: TriggerSink,
    gate: TriggerGate,
    pass: Option<ActivePass>,
    attached: bool,
    next_pass_idx: u64,
    last_report: Option<PassReport>,
    stats: FitStats,
    evidence: VecDeque<String>,
}

impl<C: Container> FitController<C> {
    /// Attach to `container` with a callback pair and notifiers.
    ///
    /// Every notifier starts observing immediately and writes into this
    /// controller's mailbox. No pass is started; notifiers that fire on
    /// observe (as a browser resize observer does) cause the first pass on
    /// the next [`pump`](Self::pump).
    pub fn attach(
        container: C,
        callbacks: FitCallbacks,
        config: FitConfig,
        notifiers: Vec<Box<dyn Notifier<C>>>,
    ) -> Self {
        let sink = TriggerSink::new();
        let mut notifiers = NotifierSet::new(notifiers);
        notifiers.observe_all(&container, &sink);
        tracing::debug!(
            notifiers = notifiers.len(),
            coalesce = config.coalesce.as_str(),
            "fit controller attached"
        );
        Self {
            container,
            callbacks,
            staged: None,
            gate: TriggerGate::new(config.coalesce),
            config,
            notifiers,
            sink,
            pass: None,
            attached: true,
            next_pass_idx: 0,
            last_report: None,
            stats: FitStats::default(),
            evidence: VecDeque::new(),
        }
    }

    /// Request a pass.
    ///
    /// When the controller is idle the pass starts immediately and runs
    /// synchronously up to its first suspension (or to completion).
    pub fn request(&mut self, source: TriggerSource) -> TriggerDisposition {
        if !self.attached {
            self.stats.triggers_after_detach += 1;
            tracing::trace!(source = source.as_str(), "trigger after detach ignored");
            return TriggerDisposition::Detached;
        }
        let disposition = self.gate.offer(source);
        match disposition {
            TriggerDisposition::Started => self.begin(source),
            TriggerDisposition::Dropped => self.stats.triggers_dropped += 1,
            TriggerDisposition::Deferred => self.stats.triggers_deferred += 1,
            TriggerDisposition::Detached => {}
        }
        disposition
    }

    /// Drain the notifier mailbox and request a pass for what it held.
    ///
    /// Returns `None` when no notification was pending.
    pub fn pump(&mut self) -> Option<TriggerDisposition> {
        let source = self.sink.take()?;
        Some(self.request(source))
    }

    /// Rendering tick completed: resume the in-flight pass by one step.
    ///
    /// Returns the report of a pass that completed during this call. When a
    /// trailing follow-up starts and itself completes synchronously, the
    /// follow-up's report is available from [`last_report`](Self::last_report).
    pub fn on_tick(&mut self) -> Option<PassReport> {
        let mut pass = self.pass.take()?;
        let metrics = if self.attached {
            self.container.metrics()
        } else {
            None
        };
        let Some(metrics) = metrics else {
            pass.ticks += 1;
            return Some(self.finish(pass, PassOutcome::Detached, None));
        };
        let step = pass.resume(metrics, &mut self.callbacks);
        self.apply(pass, step)
    }

    /// Replace the callbacks and request a pass.
    ///
    /// If a pass is running the new pair is staged and installed when the
    /// next pass starts, so the running pass keeps the pair it began with.
    pub fn update(&mut self, callbacks: FitCallbacks) -> TriggerDisposition {
        if !self.attached {
            self.stats.triggers_after_detach += 1;
            return TriggerDisposition::Detached;
        }
        if self.pass.is_some() {
            self.staged = Some(callbacks);
        } else {
            self.callbacks = callbacks;
        }
        self.request(TriggerSource::ParamUpdate)
    }

    /// Tear down: disconnect notifiers and refuse further triggers.
    ///
    /// A suspended pass is not resumed; it ends with
    /// [`PassOutcome::Detached`] at its next tick without touching the
    /// container. Idempotent.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.notifiers.disconnect_all();
        self.sink.close();
        self.gate.cancel_followup();
        self.staged = None;
        tracing::debug!(in_flight = self.pass.is_some(), "fit controller detached");
    }

    /// Whether a pass is in flight.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.pass.is_some()
    }

    /// Whether the controller is still attached.
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Report of the most recently completed pass.
    pub fn last_report(&self) -> Option<&PassReport> {
        self.last_report.as_ref()
    }

    /// Lifetime counters.
    pub fn stats(&self) -> FitStats {
        self.stats
    }

    /// Active configuration.
    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// The managed container.
    pub fn container(&self) -> &C {
        &self.container
    }

    /// Change the coalesce policy. Takes effect for the next trigger.
    pub fn set_coalesce(&mut self, policy: domfit_core::CoalescePolicy) {
        self.config.coalesce = policy;
        self.gate.set_policy(policy);
    }

    /// Retained JSONL evidence lines, oldest first.
    pub fn evidence(&self) -> impl Iterator<Item = &str> {
        self.evidence.iter().map(String::as_str)
    }

    /// Take all retained evidence lines.
    pub fn take_evidence(&mut self) -> Vec<String> {
        self.evidence.drain(..).collect()
    }

    /// Handle to this controller's mailbox, for hosts that deliver triggers
    /// without a [`Notifier`].
    pub fn sink(&self) -> TriggerSink {
        self.sink.clone()
    }

    // -------------------------------------------------------------------------
    // Pass plumbing
    // -------------------------------------------------------------------------

    fn begin(&mut self, trigger: TriggerSource) {
        if let Some(staged) = self.staged.take() {
            self.callbacks = staged;
        }
        let idx = self.next_pass_idx;
        self.next_pass_idx += 1;
        self.stats.passes_started += 1;

        let mut pass = ActivePass::new(idx, trigger);
        let metrics = self.container.metrics();
        let step = match metrics {
            None => Step::Finish(PassOutcome::Detached),
            Some(m) if m.is_overflowing() => {
                pass.mode = Some(PassMode::Shrink);
                pass.shrink_step(m, &mut self.callbacks)
            }
            Some(m) => {
                pass.mode = Some(PassMode::Grow);
                pass.grow_step(m, &mut self.callbacks)
            }
        };
        tracing::trace!(
            pass_idx = idx,
            trigger = trigger.as_str(),
            mode = pass.mode.map(PassMode::as_str),
            "fit pass started"
        );
        self.apply(pass, step);
    }

    /// Park a suspended pass until the next tick, or finish it.
    fn apply(&mut self, mut pass: ActivePass, step: Step) -> Option<PassReport> {
        match step {
            Step::Suspend(phase) => {
                pass.phase = phase;
                self.pass = Some(pass);
                None
            }
            Step::Finish(outcome) => {
                let metrics = self.container.metrics();
                Some(self.finish(pass, outcome, metrics))
            }
        }
    }

    fn finish(
        &mut self,
        pass: ActivePass,
        outcome: PassOutcome,
        final_metrics: Option<ScrollMetrics>,
    ) -> PassReport {
        let report = pass.into_report(outcome, final_metrics);
        self.stats.record(&report);

        tracing::debug!(
            pass_idx = report.pass_idx,
            trigger = report.trigger.as_str(),
            outcome = report.outcome.as_str(),
            grow_calls = report.grow_calls,
            shrink_calls = report.shrink_calls,
            ticks = report.ticks,
            "fit pass complete"
        );
        if report.outcome == PassOutcome::IrreducibleOverflow {
            tracing::trace!(
                overflow = report.final_metrics.map(|m| m.overflow()),
                "shrink exhausted while overflowing"
            );
        }
        if self.config.evidence_logging {
            if self.evidence.len() >= self.config.evidence_capacity.max(1) {
                self.evidence.pop_front();
            }
            self.evidence.push_back(report.to_jsonl());
        }
        self.last_report = Some(report.clone());

        if let Some(next) = self.gate.complete() {
            if self.attached {
                tracing::trace!(trigger = next.as_str(), "running trailing follow-up");
                self.request(next);
            }
        }
        report
    }
}

impl<C: Container> Drop for FitController<C> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<C: Container> std::fmt::Debug for FitController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FitController")
            .field("attached", &self.attached)
            .field("running", &self.pass.is_some())
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
