#![forbid(unsafe_code)]

//! Trigger delivery and reentrancy gating for fit passes.
//!
//! Two pieces sit between the notifiers and a fit controller:
//!
//! - [`TriggerSink`]: a depth-1 mailbox the notifiers write into. A new
//!   trigger overwrites the pending one, so a storm of notifications collapses
//!   into a single request.
//! - [`TriggerGate`]: the single-flag reentrancy guard. At most one pass runs at
//!   a time; what happens to a trigger that arrives mid-pass is decided by the
//!   [`CoalescePolicy`].
//!
//! # Usage
//!
//! ```
//! use domfit_core::trigger::{CoalescePolicy, TriggerDisposition, TriggerGate, TriggerSource};
//!
//! let mut gate = TriggerGate::new(CoalescePolicy::Drop);
//! assert_eq!(gate.offer(TriggerSource::SizeChange), TriggerDisposition::Started);
//! // A second trigger while the pass runs is discarded.
//! assert_eq!(gate.offer(TriggerSource::ContentChange), TriggerDisposition::Dropped);
//! assert_eq!(gate.complete(), None);
//! assert!(!gate.is_running());
//! ```
//!
//! Both types are single-threaded (`Rc` / `Cell`), matching the host-driven
//! model where every notification arrives on the UI thread.

use std::cell::Cell;
use std::rc::Rc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What asked for a fit pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TriggerSource {
    /// The container's box dimensions changed.
    SizeChange,
    /// Attributes, children or text changed inside the container.
    ContentChange,
    /// The grow/shrink callbacks were replaced.
    ParamUpdate,
    /// The host asked explicitly.
    Manual,
}

impl TriggerSource {
    /// Get the stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SizeChange => "size_change",
            Self::ContentChange => "content_change",
            Self::ParamUpdate => "param_update",
            Self::Manual => "manual",
        }
    }

    /// Content changes are what grow/shrink themselves produce, so one
    /// arriving during a pass cannot be told apart from the pass's own edits.
    #[must_use]
    pub const fn is_self_induced(self) -> bool {
        matches!(self, Self::ContentChange)
    }
}

/// Policy for triggers that arrive while a pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CoalescePolicy {
    /// Discard the trigger. Later triggers correct any missed change.
    #[default]
    Drop,
    /// Remember one non-content trigger and run a single follow-up pass when
    /// the current one completes. Content changes are still discarded.
    Trailing,
}

impl CoalescePolicy {
    /// Get the stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::Trailing => "trailing",
        }
    }
}

/// Outcome of offering a trigger to a [`TriggerGate`] (or to a controller).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDisposition {
    /// A new pass was started.
    Started,
    /// A pass was running; the trigger was discarded.
    Dropped,
    /// A pass was running; a follow-up pass is scheduled.
    Deferred,
    /// The controller is detached; nothing will run.
    Detached,
}

impl TriggerDisposition {
    /// Get the stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Dropped => "dropped",
            Self::Deferred => "deferred",
            Self::Detached => "detached",
        }
    }
}

// =============================================================================
// Mailbox
// =============================================================================

#[derive(Debug, Default)]
struct Mailbox {
    pending: Cell<Option<TriggerSource>>,
    received: Cell<u64>,
    overwritten: Cell<u64>,
    closed: Cell<bool>,
}

/// Depth-1 trigger mailbox shared between notifiers and one controller.
///
/// Cloning yields another handle to the same mailbox. Sending never blocks
/// and never queues: a pending trigger is overwritten by the next one, except
/// that a content change never displaces a pending size or parameter trigger.
#[derive(Debug, Clone, Default)]
pub struct TriggerSink {
    inner: Rc<Mailbox>,
}

impl TriggerSink {
    /// Create an open, empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a trigger. Returns `false` when the mailbox is closed.
    pub fn notify(&self, source: TriggerSource) -> bool {
        if self.inner.closed.get() {
            crate::fit_trace!(source = source.as_str(), "trigger sink closed");
            return false;
        }
        self.inner.received.set(self.inner.received.get() + 1);
        let next = match self.inner.pending.get() {
            Some(prev) => {
                self.inner.overwritten.set(self.inner.overwritten.get() + 1);
                if source.is_self_induced() && !prev.is_self_induced() {
                    prev
                } else {
                    source
                }
            }
            None => source,
        };
        self.inner.pending.set(Some(next));
        true
    }

    /// Take the pending trigger, leaving the mailbox empty.
    pub fn take(&self) -> Option<TriggerSource> {
        self.inner.pending.take()
    }

    /// Whether a trigger is waiting.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.inner.pending.get().is_some()
    }

    /// Close the mailbox. Pending and future triggers are discarded.
    pub fn close(&self) {
        self.inner.closed.set(true);
        self.inner.pending.set(None);
    }

    /// Whether [`close`](Self::close) was called on any handle.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Total triggers accepted since creation.
    #[must_use]
    pub fn received(&self) -> u64 {
        self.inner.received.get()
    }

    /// Triggers that landed on an already-pending slot.
    #[must_use]
    pub fn overwritten(&self) -> u64 {
        self.inner.overwritten.get()
    }
}

// =============================================================================
// Gate
// =============================================================================

/// Single-flag reentrancy guard with a pluggable coalesce policy.
///
/// # Invariants
///
/// - At most one pass is running between a `Started` offer and the matching
///   [`complete`](Self::complete).
/// - Under [`CoalescePolicy::Drop`] no follow-up is ever returned.
/// - Under [`CoalescePolicy::Trailing`] at most one follow-up is held; later
///   deferred triggers overwrite it.
#[derive(Debug, Clone, Default)]
pub struct TriggerGate {
    policy: CoalescePolicy,
    running: bool,
    followup: Option<TriggerSource>,
    dropped: u64,
    deferred: u64,
}

impl TriggerGate {
    /// Create an idle gate.
    #[must_use]
    pub const fn new(policy: CoalescePolicy) -> Self {
        Self {
            policy,
            running: false,
            followup: None,
            dropped: 0,
            deferred: 0,
        }
    }

    /// Current policy.
    #[must_use]
    pub const fn policy(&self) -> CoalescePolicy {
        self.policy
    }

    /// Change the policy. A held follow-up is discarded when switching to `Drop`.
    pub fn set_policy(&mut self, policy: CoalescePolicy) {
        self.policy = policy;
        if policy == CoalescePolicy::Drop {
            if self.followup.take().is_some() {
                crate::fit_debug!("follow-up discarded by policy change");
            }
        }
    }

    /// Whether a pass currently holds the gate.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Follow-up held for the running pass, if any.
    #[must_use]
    pub const fn pending_followup(&self) -> Option<TriggerSource> {
        self.followup
    }

    /// Offer a trigger.
    ///
    /// Returns [`TriggerDisposition::Started`] when the caller now owns the
    /// gate and must run a pass, then call [`complete`](Self::complete).
    pub fn offer(&mut self, source: TriggerSource) -> TriggerDisposition {
        if !self.running {
            self.running = true;
            return TriggerDisposition::Started;
        }
        match self.policy {
            CoalescePolicy::Trailing if !source.is_self_induced() => {
                self.followup = Some(source);
                self.deferred += 1;
                crate::fit_trace!(source = source.as_str(), "trigger deferred");
                TriggerDisposition::Deferred
            }
            _ => {
                self.dropped += 1;
                crate::fit_trace!(source = source.as_str(), "trigger dropped");
                TriggerDisposition::Dropped
            }
        }
    }

    /// Release the gate after a pass, returning the follow-up to run, if any.
    ///
    /// The gate is idle on return; offer the follow-up to start it.
    pub fn complete(&mut self) -> Option<TriggerSource> {
        if !self.running {
            crate::fit_warn!("gate completed while idle");
        }
        self.running = false;
        self.followup.take()
    }

    /// Drop any held follow-up without releasing the gate.
    pub fn cancel_followup(&mut self) {
        if self.followup.take().is_some() {
            crate::fit_debug!("follow-up cancelled");
        }
    }

    /// Triggers discarded while running.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Triggers turned into a follow-up while running.
    #[must_use]
    pub const fn deferred(&self) -> u64 {
        self.deferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_latest_wins() {
        let sink = TriggerSink::new();
        assert!(sink.notify(TriggerSource::Manual));
        assert!(sink.notify(TriggerSource::SizeChange));
        assert_eq!(sink.take(), Some(TriggerSource::SizeChange));
        assert_eq!(sink.take(), None);
        assert_eq!(sink.received(), 2);
        assert_eq!(sink.overwritten(), 1);
    }

    #[test]
    fn content_change_does_not_displace_size_change() {
        let sink = TriggerSink::new();
        sink.notify(TriggerSource::SizeChange);
        sink.notify(TriggerSource::ContentChange);
        assert_eq!(sink.take(), Some(TriggerSource::SizeChange));

        sink.notify(TriggerSource::ContentChange);
        sink.notify(TriggerSource::ParamUpdate);
        assert_eq!(sink.take(), Some(TriggerSource::ParamUpdate));
    }

    #[test]
    fn closed_sink_rejects_and_clears() {
        let sink = TriggerSink::new();
        let other = sink.clone();
        sink.notify(TriggerSource::SizeChange);
        other.close();
        assert!(sink.is_closed());
        assert!(!sink.has_pending());
        assert!(!sink.notify(TriggerSource::SizeChange));
        assert_eq!(sink.received(), 1);
    }

    #[test]
    fn drop_policy_discards_while_running() {
        let mut gate = TriggerGate::new(CoalescePolicy::Drop);
        assert_eq!(gate.offer(TriggerSource::Manual), TriggerDisposition::Started);
        assert_eq!(gate.offer(TriggerSource::SizeChange), TriggerDisposition::Dropped);
        assert_eq!(gate.offer(TriggerSource::ParamUpdate), TriggerDisposition::Dropped);
        assert_eq!(gate.complete(), None);
        assert_eq!(gate.dropped(), 2);
        assert_eq!(gate.offer(TriggerSource::Manual), TriggerDisposition::Started);
    }

    #[test]
    fn trailing_policy_holds_one_followup() {
        let mut gate = TriggerGate::new(CoalescePolicy::Trailing);
        gate.offer(TriggerSource::Manual);
        assert_eq!(gate.offer(TriggerSource::SizeChange), TriggerDisposition::Deferred);
        assert_eq!(gate.offer(TriggerSource::ParamUpdate), TriggerDisposition::Deferred);
        assert_eq!(gate.pending_followup(), Some(TriggerSource::ParamUpdate));
        assert_eq!(gate.complete(), Some(TriggerSource::ParamUpdate));
        assert!(!gate.is_running());
        assert_eq!(gate.complete(), None);
    }

    #[test]
    fn trailing_policy_still_drops_content_changes() {
        let mut gate = TriggerGate::new(CoalescePolicy::Trailing);
        gate.offer(TriggerSource::SizeChange);
        assert_eq!(
            gate.offer(TriggerSource::ContentChange),
            TriggerDisposition::Dropped
        );
        assert_eq!(gate.complete(), None);
    }

    #[test]
    fn switching_to_drop_forgets_followup() {
        let mut gate = TriggerGate::new(CoalescePolicy::Trailing);
        gate.offer(TriggerSource::SizeChange);
        gate.offer(TriggerSource::SizeChange);
        gate.set_policy(CoalescePolicy::Drop);
        assert_eq!(gate.complete(), None);
    }

    #[test]
    fn cancelled_followup_keeps_gate_running() {
        let mut gate = TriggerGate::new(CoalescePolicy::Trailing);
        gate.offer(TriggerSource::SizeChange);
        gate.offer(TriggerSource::Manual);
        assert_eq!(gate.pending_followup(), Some(TriggerSource::Manual));

        gate.cancel_followup();
        assert!(gate.is_running());
        assert_eq!(gate.pending_followup(), None);
        assert_eq!(gate.complete(), None);
        assert!(!gate.is_running());
    }

    #[test]
    fn completing_an_idle_gate_is_harmless() {
        let mut gate = TriggerGate::new(CoalescePolicy::Drop);
        assert_eq!(gate.complete(), None);
        assert_eq!(
            gate.offer(TriggerSource::SizeChange),
            TriggerDisposition::Started
        );
    }
}
