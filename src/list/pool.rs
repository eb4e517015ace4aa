//! Render List Pool
//!
//! Frame aggregates are expensive to warm up (dozens of backing arrays), so
//! they are recycled instead of rebuilt. The pool is process-lifetime shared
//! state; a mutex guards it because draw-call *collection* may happen on
//! worker threads that each borrow the acquired list through an external
//! merge barrier, while acquire/release themselves stay on the render
//! thread.
//!
//! Ownership makes the 1:1 acquire/release contract structural: `release`
//! consumes the box, so a double release does not compile.

use parking_lot::Mutex;

use super::render_list::RenderList;

/// Reuse cache for [`RenderList`] frame aggregates.
#[derive(Default)]
pub struct RenderListPool {
    free: Mutex<Vec<Box<RenderList>>>,
}

impl RenderListPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a recycled or newly constructed frame aggregate. Every count
    /// is zero; backing capacity from previous frames is retained.
    #[must_use]
    pub fn acquire(&self) -> Box<RenderList> {
        let recycled = self.free.lock().pop();
        recycled.unwrap_or_default()
    }

    /// Returns a frame aggregate to the pool. The list is cleared here so
    /// the next `acquire` hands out a ready-to-fill object.
    pub fn release(&self, mut list: Box<RenderList>) {
        list.clear();
        self.free.lock().push(list);
    }

    /// Drops all cached aggregates to reduce memory pressure.
    pub fn cleanup(&self) {
        self.free.lock().clear();
    }

    /// Number of aggregates currently cached.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.free.lock().len()
    }
}
