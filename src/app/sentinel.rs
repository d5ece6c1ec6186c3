//! Viewport sentinel: turns visibility reports into page requests.
//!
//! The host reports whether the off-screen marker below the list is in the
//! viewport. Only a hidden → visible edge counts; a stream of "visible"
//! reports while the marker stays on screen triggers at most once. Whether
//! the edge actually produces a fetch is decided by the cache (more pages,
//! nothing in flight). A page that lands while the marker is still visible
//! asks for the next one itself, so an edge seen during a load is not lost.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sentinel {
    visible: bool,
}

impl Sentinel {
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Records a visibility report. Returns `true` on a hidden → visible
    /// transition.
    pub fn observe(&mut self, visible: bool) -> bool {
        let entered = visible && !self.visible;
        self.visible = visible;
        entered
    }
}
