//! Browser surface seam
//!
//! A panel drives one embedded browser view. The host implements
//! [`BrowserSurface`] on top of its web view and forwards the view's
//! callbacks (page started/finished, navigation intercept, find results)
//! to the [`crate::Reader`].

/// Commands the reader issues to one embedded browser view
///
/// # Implementation Notes
///
/// - All methods are fire-and-forget; load completion comes back through
///   the host's page callbacks, script results through the find bridge
/// - `load_static_content` must still produce page callbacks; they are
///   ignored for completion accounting
pub trait BrowserSurface: Send {
    fn load_url(&mut self, url: &str);

    /// Render an inline document with the given base URL
    fn load_static_content(&mut self, html: &str, base_url: &str);

    fn evaluate_script(&mut self, script: &str);

    fn can_go_back(&self) -> bool;

    fn go_back(&mut self);

    fn set_progress_visible(&mut self, visible: bool);

    fn set_content_visible(&mut self, visible: bool);
}

/// Creates one surface per display language when panels are (re)built
pub trait SurfaceFactory: Send {
    type Surface: BrowserSurface;

    fn create(&mut self, lang: &str) -> Self::Surface;
}
