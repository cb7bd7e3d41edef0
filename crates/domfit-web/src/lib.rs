#![forbid(unsafe_code)]

//! `domfit-web` binds fit controllers to a host-driven document.
//!
//! Design goals:
//! - **Host-driven layout**: the embedder assigns widths, heights, offsets and
//!   the viewport; the [`Document`] only records mutations and delivers them
//!   to observers on flush.
//! - **One tick per step**: [`FitHost::step`] is the rendering tick that
//!   suspended fit passes wait for.
//! - **No blocking / no threads**: shared state is `Rc`/`RefCell`.
//!
//! Besides [`SizeToFit`], the crate carries the small element actions that
//! surround it in a navigation UI: sibling navigation, click-outside,
//! viewport height capping, fitting item counts, managed class lists,
//! portals, scroll-into-view on mount, and accessible IDs.

pub mod class_names;
pub mod click_outside;
pub mod compute_fit;
pub mod document;
pub mod host;
pub mod portal;
pub mod scroll_into_view;
pub mod selector;
pub mod siblings;
pub mod size_to_fit;
pub mod unique_id;
pub mod viewport;

pub use class_names::{ClassNames, clean_classes};
pub use click_outside::{ClickOutside, ClickOutsideEvent};
pub use compute_fit::{ComputeFit, FitEvent};
pub use document::{Document, DomError, FlushStats, MutationRecord, NodeId, ObserverId};
pub use host::{FitHandle, FitHost, StepResult};
pub use portal::Portal;
pub use scroll_into_view::{ScrollBlock, ScrollRequest, scroll_into_view_on_mount};
pub use selector::Selector;
pub use siblings::{next_sibling, previous_sibling};
pub use size_to_fit::{DomContainer, DomMutationNotifier, DomResizeNotifier, SharedDocument, SizeToFit};
pub use unique_id::{IdGenerator, unique_id};
pub use viewport::{MAX_HEIGHT, RestrictToViewport, viewport_max_height};
