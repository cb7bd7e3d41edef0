#![forbid(unsafe_code)]

//! Step-based host for document-bound fit controllers.
//!
//! [`FitHost`] owns a shared [`Document`] and the [`SizeToFit`] bindings
//! attached to it. The embedder controls the frame loop:
//!
//! 1. Mutate the document (content, geometry, viewport).
//! 2. Call [`FitHost::step`] once per rendering tick.
//! 3. Inspect [`StepResult`] or per-binding reports.
//!
//! Each step flushes document observers into trigger mailboxes, pumps every
//! binding, then resumes every pass that was already suspended when the step
//! began. A pass started during a step therefore waits for the next step
//! before observing the effect of its first callback.
//!
//! Scroll requests queued on the document since the previous step are
//! drained during the flush and exposed through [`FitHost::take_scrolls`].
//!
//! # Example
//!
//! ```
//! use domfit_runtime::FitConfig;
//! use domfit_web::{Document, FitHost};
//!
//! let mut host = FitHost::new(Document::new());
//! let nav = {
//!     let mut doc = host.document().borrow_mut();
//!     let nav = doc.create_element("nav");
//!     let body = doc.body();
//!     doc.append_child(body, nav).unwrap();
//!     doc.set_client_width(nav, Some(100)).unwrap();
//!     nav
//! };
//! let fit = host.attach(nav, || false, || false, FitConfig::default()).unwrap();
//!
//! let result = host.step();
//! assert_eq!(result.frame_idx, 1);
//! assert_eq!(result.passes_started, 1);
//! host.run_until_idle(16);
//! assert!(!host.get(fit).unwrap().is_running());
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use domfit_runtime::{FitConfig, PassReport};

use crate::document::{Document, DomError, NodeId};
use crate::scroll_into_view::ScrollRequest;
use crate::size_to_fit::{SharedDocument, SizeToFit};

/// Handle to a binding owned by a [`FitHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FitHandle(usize);

/// Result of a single [`FitHost::step`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepResult {
    /// Current frame index (monotonically increasing).
    pub frame_idx: u64,
    /// Observer notifications delivered during the flush.
    pub notifications: usize,
    /// Passes started during this step, including trailing follow-ups.
    pub passes_started: u64,
    /// Passes completed during this step.
    pub passes_completed: u64,
    /// Bindings with a pass suspended after this step.
    pub running: usize,
    /// Scroll requests drained from the document during this step.
    pub scrolls: usize,
}

impl StepResult {
    /// Nothing happened and nothing is waiting.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.notifications == 0
            && self.passes_started == 0
            && self.running == 0
            && self.scrolls == 0
    }
}

/// Host-driven, non-blocking driver for [`SizeToFit`] bindings.
#[derive(Debug)]
pub struct FitHost {
    doc: SharedDocument,
    fits: Vec<Option<SizeToFit>>,
    frame_idx: u64,
    reports: Vec<(FitHandle, PassReport)>,
    scrolls: Vec<ScrollRequest>,
}

impl FitHost {
    /// Create a host owning `doc`.
    #[must_use]
    pub fn new(doc: Document) -> Self {
        Self {
            doc: Rc::new(RefCell::new(doc)),
            fits: Vec::new(),
            frame_idx: 0,
            reports: Vec::new(),
            scrolls: Vec::new(),
        }
    }

    /// The shared document. Release any borrow before calling [`step`](Self::step).
    #[must_use]
    pub fn document(&self) -> &SharedDocument {
        &self.doc
    }

    /// Current frame index.
    #[must_use]
    pub const fn frame_idx(&self) -> u64 {
        self.frame_idx
    }

    /// Attach a [`SizeToFit`] binding to `node`.
    pub fn attach<G, S>(
        &mut self,
        node: NodeId,
        grow: G,
        shrink: S,
        config: FitConfig,
    ) -> Result<FitHandle, DomError>
    where
        G: FnMut() -> bool + 'static,
        S: FnMut() -> bool + 'static,
    {
        let fit = SizeToFit::attach(&self.doc, node, grow, shrink, config)?;
        self.fits.push(Some(fit));
        Ok(FitHandle(self.fits.len() - 1))
    }

    /// Binding for `handle`, unless destroyed.
    #[must_use]
    pub fn get(&self, handle: FitHandle) -> Option<&SizeToFit> {
        self.fits.get(handle.0).and_then(Option::as_ref)
    }

    /// Mutable binding for `handle`, unless destroyed.
    pub fn get_mut(&mut self, handle: FitHandle) -> Option<&mut SizeToFit> {
        self.fits.get_mut(handle.0).and_then(Option::as_mut)
    }

    /// Swap a binding's callbacks. Returns `false` for destroyed handles.
    pub fn update<G, S>(&mut self, handle: FitHandle, grow: G, shrink: S) -> bool
    where
        G: FnMut() -> bool + 'static,
        S: FnMut() -> bool + 'static,
    {
        match self.get_mut(handle) {
            Some(fit) => {
                fit.update(grow, shrink);
                true
            }
            None => false,
        }
    }

    /// Destroy a binding. Returns `false` if it was already gone.
    pub fn destroy(&mut self, handle: FitHandle) -> bool {
        match self.fits.get_mut(handle.0).and_then(Option::take) {
            Some(mut fit) => {
                fit.destroy();
                true
            }
            None => false,
        }
    }

    /// Reports of passes completed since the last call, in completion order.
    ///
    /// Passes that finish synchronously when a trigger is pumped are
    /// included alongside those finished by a tick.
    pub fn take_reports(&mut self) -> Vec<(FitHandle, PassReport)> {
        std::mem::take(&mut self.reports)
    }

    /// Scroll requests applied since the last call, in queue order.
    pub fn take_scrolls(&mut self) -> Vec<ScrollRequest> {
        std::mem::take(&mut self.scrolls)
    }

    fn totals(&self) -> (u64, u64) {
        self.fits.iter().flatten().fold((0, 0), |(s, c), fit| {
            let stats = fit.controller().stats();
            (s + stats.passes_started, c + stats.passes_completed)
        })
    }

    /// Process one rendering tick.
    pub fn step(&mut self) -> StepResult {
        self.frame_idx += 1;
        let (started_before, completed_before) = self.totals();

        let (flush, scrolls) = {
            let mut doc = self.doc.borrow_mut();
            (doc.flush_observers(), doc.take_scroll_requests())
        };
        for request in &scrolls {
            tracing::trace!(node = %request.node, block = request.block.as_str(), "scroll into view");
        }
        let scroll_count = scrolls.len();
        self.scrolls.extend(scrolls);
        let suspended: Vec<bool> = self
            .fits
            .iter()
            .map(|f| f.as_ref().is_some_and(SizeToFit::is_running))
            .collect();

        for (idx, slot) in self.fits.iter_mut().enumerate() {
            let Some(fit) = slot.as_mut() else {
                continue;
            };
            let before = last_pass_idx(fit);
            fit.pump();
            if let Some(report) = completed_since(fit, before) {
                self.reports.push((FitHandle(idx), report));
            }
        }
        for (idx, was_suspended) in suspended.into_iter().enumerate() {
            if !was_suspended {
                continue;
            }
            let Some(fit) = self.fits[idx].as_mut() else {
                continue;
            };
            if let Some(report) = fit.on_tick() {
                let finished = Some(report.pass_idx);
                self.reports.push((FitHandle(idx), report));
                // A trailing follow-up may have run to completion inside the tick.
                if let Some(followup) = completed_since(fit, finished) {
                    self.reports.push((FitHandle(idx), followup));
                }
            }
        }

        let (started_after, completed_after) = self.totals();
        let result = StepResult {
            frame_idx: self.frame_idx,
            notifications: flush.notifications,
            passes_started: started_after - started_before,
            passes_completed: completed_after - completed_before,
            running: self.fits.iter().flatten().filter(|f| f.is_running()).count(),
            scrolls: scroll_count,
        };
        tracing::trace!(
            frame_idx = result.frame_idx,
            notifications = result.notifications,
            passes_started = result.passes_started,
            passes_completed = result.passes_completed,
            running = result.running,
            scrolls = result.scrolls,
            "fit host step"
        );
        result
    }

    /// Step until a step is idle or `max_steps` steps ran. Returns the
    /// number of steps taken.
    pub fn run_until_idle(&mut self, max_steps: usize) -> usize {
        for taken in 1..=max_steps {
            if self.step().is_idle() {
                return taken;
            }
        }
        tracing::warn!(max_steps, "fit host did not go idle");
        max_steps
    }
}

fn last_pass_idx(fit: &SizeToFit) -> Option<u64> {
    fit.controller().last_report().map(|r| r.pass_idx)
}

/// The binding's latest report, if it is newer than pass `before`.
fn completed_since(fit: &SizeToFit, before: Option<u64>) -> Option<PassReport> {
    fit.controller()
        .last_report()
        .filter(|r| Some(r.pass_idx) != before)
        .cloned()
}

impl Drop for FitHost {
    fn drop(&mut self) {
        for fit in self.fits.iter_mut().flatten() {
            fit.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll_into_view::{ScrollBlock, scroll_into_view_on_mount};
    use domfit_runtime::{CoalescePolicy, PassOutcome, TriggerSource};
    use pretty_assertions::assert_eq;

    fn host_with_strip(widths: &[i32], client: i32) -> (FitHost, NodeId, Vec<NodeId>) {
        let host = FitHost::new(Document::new());
        let (nav, items) = {
            let mut doc = host.document().borrow_mut();
            let nav = doc.create_element("nav");
            let body = doc.body();
            doc.append_child(body, nav).unwrap();
            doc.set_client_width(nav, Some(client)).unwrap();
            let items = widths
                .iter()
                .map(|w| {
                    let a = doc.create_element("a");
                    doc.set_intrinsic_width(a, *w).unwrap();
                    doc.append_child(nav, a).unwrap();
                    a
                })
                .collect();
            (nav, items)
        };
        (host, nav, items)
    }

    #[test]
    fn idle_host_steps_quietly() {
        let mut host = FitHost::new(Document::new());
        let result = host.step();
        assert_eq!(
            result,
            StepResult {
                frame_idx: 1,
                ..StepResult::default()
            }
        );
        assert!(result.is_idle());
        assert_eq!(host.run_until_idle(4), 1);
    }

    #[test]
    fn shrink_pass_spans_steps() {
        let (mut host, nav, items) = host_with_strip(&[40, 40, 40], 100);
        let doc = Rc::downgrade(host.document());
        let last = items[2];
        let fit = host
            .attach(
                nav,
                || false,
                move || {
                    let Some(doc) = doc.upgrade() else {
                        return false;
                    };
                    let hidden = doc.borrow_mut().set_attribute(last, "hidden", "").is_ok();
                    hidden
                },
                FitConfig::default(),
            )
            .unwrap();

        let first = host.step();
        assert_eq!(first.passes_started, 1);
        assert_eq!(first.running, 1);

        let second = host.step();
        assert_eq!(second.passes_completed, 1);
        assert_eq!(second.passes_started, 0);
        assert_eq!(second.running, 0);

        let reports = host.take_reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, fit);
        assert_eq!(reports[0].1.outcome, PassOutcome::Fit);

        assert!(host.step().is_idle());
    }

    #[test]
    fn destroyed_bindings_are_skipped() {
        let (mut host, nav, _) = host_with_strip(&[10], 100);
        let fit = host
            .attach(nav, || false, || false, FitConfig::default())
            .unwrap();
        assert!(host.destroy(fit));
        assert!(!host.destroy(fit));
        assert!(host.get(fit).is_none());
        assert!(!host.update(fit, || false, || false));
        assert_eq!(host.document().borrow().observer_count(), 0);
        assert!(host.step().is_idle());
    }

    #[test]
    fn pass_finished_on_pump_is_reported() {
        let (mut host, nav, _) = host_with_strip(&[50], 10);
        let fit = host
            .attach(nav, || false, || false, FitConfig::default())
            .unwrap();

        let result = host.step();
        assert_eq!(result.passes_started, 1);
        assert_eq!(result.passes_completed, 1);
        assert_eq!(result.running, 0);

        let reports = host.take_reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, fit);
        assert_eq!(reports[0].1.outcome, PassOutcome::IrreducibleOverflow);
        assert_eq!(reports[0].1.shrink_calls, 1);
    }

    #[test]
    fn synchronous_followup_is_reported_after_its_pass() {
        let (mut host, nav, items) = host_with_strip(&[40, 40, 40], 100);
        let doc = Rc::downgrade(host.document());
        let last = items[2];
        let mut hid_one = false;
        let config = FitConfig::default().with_coalesce(CoalescePolicy::Trailing);
        host.attach(
            nav,
            || false,
            move || {
                if hid_one {
                    return false;
                }
                let Some(doc) = doc.upgrade() else {
                    return false;
                };
                hid_one = doc.borrow_mut().set_attribute(last, "hidden", "").is_ok();
                hid_one
            },
            config,
        )
        .unwrap();

        let first = host.step();
        assert_eq!(first.running, 1);
        host.document()
            .borrow_mut()
            .set_client_width(nav, Some(50))
            .unwrap();

        let second = host.step();
        assert_eq!(second.passes_started, 1);
        assert_eq!(second.passes_completed, 2);
        assert_eq!(second.running, 0);

        let reports = host.take_reports();
        let summary: Vec<(u64, PassOutcome)> = reports
            .iter()
            .map(|(_, r)| (r.pass_idx, r.outcome))
            .collect();
        assert_eq!(
            summary,
            [
                (0, PassOutcome::IrreducibleOverflow),
                (1, PassOutcome::IrreducibleOverflow),
            ]
        );
        assert_eq!(reports[1].1.trigger, TriggerSource::SizeChange);
    }

    #[test]
    fn scroll_requests_wait_for_the_next_step() {
        let (mut host, _, items) = host_with_strip(&[10, 10], 100);
        {
            let mut doc = host.document().borrow_mut();
            assert!(scroll_into_view_on_mount(&mut doc, items[1], true).unwrap());
            assert!(!scroll_into_view_on_mount(&mut doc, items[0], false).unwrap());
        }
        assert!(host.take_scrolls().is_empty());

        let result = host.step();
        assert_eq!(result.scrolls, 1);
        assert!(!result.is_idle());
        assert_eq!(
            host.take_scrolls(),
            [ScrollRequest {
                node: items[1],
                block: ScrollBlock::Center,
            }]
        );
        assert!(host.step().is_idle());
    }
}
