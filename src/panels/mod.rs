//! Language panels and their synchronization
//!
//! - `surface`: the browser surface seam implemented by the host
//! - `session`: per-load completion accounting and generations
//! - `controller`: the `Idle -> Loading -> Settled` state machine

pub mod controller;
pub mod session;
pub mod surface;

pub use controller::{
    missing_article_base_url, missing_article_html, BackOutcome, ControllerState,
    NavigationDecision, PageOutcome, Panel, PanelController,
};
pub use session::{Generation, LoadSession, SlotState};
pub use surface::{BrowserSurface, SurfaceFactory};
