#![forbid(unsafe_code)]

//! Pass reports, counters, and JSONL evidence.

use domfit_core::{ScrollMetrics, TriggerSource};

/// Schema tag written into every evidence line.
pub const EVIDENCE_SCHEMA_VERSION: &str = "domfit-pass-v1";

/// Direction a pass committed to at entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    /// The container overflowed at entry; shrink until it fits.
    Shrink,
    /// The container fit at entry; grow until it overflows, then settle.
    Grow,
}

impl PassMode {
    /// Get the stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shrink => "shrink",
            Self::Grow => "grow",
        }
    }
}

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Shrink mode reached a non-overflowing state.
    Fit,
    /// Shrink mode ran out of steps while still overflowing. Terminal, not an error.
    IrreducibleOverflow,
    /// Grow mode stopped and the settle tick found no overflow.
    Settled,
    /// Grow mode overshot; one corrective shrink was applied.
    Corrected,
    /// The controller was detached, or the container went away, mid-pass.
    Detached,
}

impl PassOutcome {
    /// Get the stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::IrreducibleOverflow => "irreducible_overflow",
            Self::Settled => "settled",
            Self::Corrected => "corrected",
            Self::Detached => "detached",
        }
    }
}

/// Summary of one completed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Monotonic pass index for this controller, starting at 0.
    pub pass_idx: u64,
    /// Trigger that started the pass.
    pub trigger: TriggerSource,
    /// Direction chosen at entry. `None` if the container was gone at entry.
    pub mode: Option<PassMode>,
    /// Terminal state.
    pub outcome: PassOutcome,
    /// `grow()` invocations during the pass.
    pub grow_calls: u32,
    /// `shrink()` invocations during the pass.
    pub shrink_calls: u32,
    /// Rendering ticks consumed.
    pub ticks: u32,
    /// Whether the most recent `shrink()` returned `false`.
    pub shrink_exhausted: bool,
    /// Container extents when the pass ended, if still readable.
    pub final_metrics: Option<ScrollMetrics>,
}

impl PassReport {
    /// Whether the container still overflowed when the pass ended.
    #[must_use]
    pub fn ended_overflowing(&self) -> bool {
        self.final_metrics.is_some_and(|m| m.is_overflowing())
    }

    /// Serialize to one JSONL evidence line.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mode = self
            .mode
            .map_or_else(|| "null".to_string(), |m| format!(r#""{}""#, m.as_str()));
        let (scroll, client) = match self.final_metrics {
            Some(m) => (m.scroll_width.to_string(), m.client_width.to_string()),
            None => ("null".to_string(), "null".to_string()),
        };
        format!(
            r#"{{"schema_version":"{}","event":"fit_pass","pass_idx":{},"trigger":"{}","mode":{},"outcome":"{}","grow_calls":{},"shrink_calls":{},"ticks":{},"shrink_exhausted":{},"scroll_width":{},"client_width":{}}}"#,
            EVIDENCE_SCHEMA_VERSION,
            self.pass_idx,
            self.trigger.as_str(),
            mode,
            self.outcome.as_str(),
            self.grow_calls,
            self.shrink_calls,
            self.ticks,
            self.shrink_exhausted,
            scroll,
            client,
        )
    }
}

/// Lifetime counters for one controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FitStats {
    /// Passes started.
    pub passes_started: u64,
    /// Passes completed (any outcome).
    pub passes_completed: u64,
    /// Triggers discarded because a pass was running.
    pub triggers_dropped: u64,
    /// Triggers turned into a follow-up pass.
    pub triggers_deferred: u64,
    /// Triggers refused after detach.
    pub triggers_after_detach: u64,
    /// Total `grow()` invocations.
    pub grow_calls: u64,
    /// Total `shrink()` invocations.
    pub shrink_calls: u64,
}

impl FitStats {
    pub(crate) fn record(&mut self, report: &PassReport) {
        self.passes_completed += 1;
        self.grow_calls += u64::from(report.grow_calls);
        self.shrink_calls += u64::from(report.shrink_calls);
    }
}
