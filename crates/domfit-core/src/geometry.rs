#![forbid(unsafe_code)]

//! Extents read from a managed container.

/// Horizontal scroll extents of a container.
///
/// Mirrors the pair a browser exposes as `scrollWidth` / `clientWidth`:
/// `scroll_width` is the rendered content extent, `client_width` the visible
/// one. Values are in CSS pixels (or any consistent unit the host picks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    /// Rendered content extent.
    pub scroll_width: i32,
    /// Visible extent.
    pub client_width: i32,
}

impl ScrollMetrics {
    /// Create metrics from a rendered and a visible extent.
    #[inline]
    pub const fn new(scroll_width: i32, client_width: i32) -> Self {
        Self {
            scroll_width,
            client_width,
        }
    }

    /// Whether the rendered content extent exceeds the visible extent.
    #[inline]
    pub const fn is_overflowing(&self) -> bool {
        self.scroll_width > self.client_width
    }

    /// Amount of overflow, zero when the content fits.
    #[inline]
    pub const fn overflow(&self) -> i32 {
        let delta = self.scroll_width.saturating_sub(self.client_width);
        if delta > 0 { delta } else { 0 }
    }
}

/// Observed box dimensions of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoxSize {
    /// Border-box width.
    pub width: i32,
    /// Border-box height.
    pub height: i32,
}

impl BoxSize {
    /// Create a box size.
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}
