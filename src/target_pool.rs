//! Render Target Pool
//!
//! GPU-backed intermediate textures (light buffer, LUTs, blur temporaries)
//! are requested per frame and expensive to allocate, so they are recycled
//! by descriptor. `get` returns a matching free texture or allocates one;
//! `release` returns it to the free set.
//!
//! # Memory Strategy
//!
//! - Textures are never destroyed during normal rendering; they stay in the
//!   free set for reuse.
//! - The pool grows on demand when no compatible free texture exists.
//! - Call [`RenderTargetPool::trim`] after resolution changes to destroy
//!   entries that sat idle for several frames.
//!
//! The pool tracks live handles: releasing an unknown or already-released
//! handle is a correctness defect and is reported (debug builds assert).
//! A texture is never aliased to two live requests, and descriptors match
//! exactly; usage-agnostic recycling would trade pool hits for backend
//! validation errors.

use log::error;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::gpu::{GpuDevice, TextureDesc, TextureHandle};

struct PooledTarget {
    texture: TextureHandle,
    /// Frames spent in the free set without reuse; drives [`trim`](RenderTargetPool::trim).
    idle_frames: u32,
}

/// Reuse cache for pooled intermediate render targets.
#[derive(Default)]
pub struct RenderTargetPool {
    free: FxHashMap<TextureDesc, Vec<PooledTarget>>,
    live: FxHashMap<TextureHandle, TextureDesc>,
}

impl RenderTargetPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a free texture matching `desc` exactly, or allocates one.
    ///
    /// The returned handle stays stable until [`release`](Self::release).
    pub fn get(
        &mut self,
        device: &dyn GpuDevice,
        desc: &TextureDesc,
        label: &'static str,
    ) -> Result<TextureHandle> {
        let texture = match self.free.get_mut(desc).and_then(Vec::pop) {
            Some(pooled) => pooled.texture,
            None => device.create_texture(desc, label)?,
        };
        self.live.insert(texture, *desc);
        Ok(texture)
    }

    /// Returns a live texture to the free set.
    ///
    /// Must be called exactly once per `get`; a frame that exits early still
    /// owes every release.
    pub fn release(&mut self, texture: TextureHandle) {
        let Some(desc) = self.live.remove(&texture) else {
            debug_assert!(false, "released render target {texture:?} is not live");
            error!("Render target {texture:?} released twice or never acquired");
            return;
        };
        self.free.entry(desc).or_default().push(PooledTarget {
            texture,
            idle_frames: 0,
        });
    }

    /// Ages the free set and destroys entries idle longer than
    /// `max_idle_frames`. Call once per frame or after resolution changes.
    pub fn trim(&mut self, device: &dyn GpuDevice, max_idle_frames: u32) {
        for bucket in self.free.values_mut() {
            for target in bucket.iter_mut() {
                target.idle_frames += 1;
            }
            bucket.retain(|target| {
                let keep = target.idle_frames <= max_idle_frames;
                if !keep {
                    device.destroy_texture(target.texture);
                }
                keep
            });
        }
        self.free.retain(|_, bucket| !bucket.is_empty());
    }

    /// Number of textures currently handed out.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total textures managed (live plus free).
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.live.len() + self.free.values().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::null::NullDevice;
    use crate::gpu::TextureFormat;

    #[test]
    fn get_reuses_released_textures() {
        let device = NullDevice::new();
        let mut pool = RenderTargetPool::new();
        let desc = TextureDesc::render_target(64, 64, TextureFormat::Rgba16Float);

        let first = pool.get(device.as_ref(), &desc, "t").unwrap();
        pool.release(first);
        let second = pool.get(device.as_ref(), &desc, "t").unwrap();
        assert_eq!(first, second);
        assert_eq!(pool.total_count(), 1);
    }

    #[test]
    fn different_descriptors_never_alias() {
        let device = NullDevice::new();
        let mut pool = RenderTargetPool::new();
        let desc_a = TextureDesc::render_target(64, 64, TextureFormat::Rgba16Float);
        let desc_b = TextureDesc::render_target(64, 64, TextureFormat::Rgba8Unorm);

        let a = pool.get(device.as_ref(), &desc_a, "a").unwrap();
        pool.release(a);
        let b = pool.get(device.as_ref(), &desc_b, "b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn trim_destroys_long_idle_entries() {
        let device = NullDevice::new();
        let mut pool = RenderTargetPool::new();
        let desc = TextureDesc::render_target(32, 32, TextureFormat::Rgba16Float);

        let texture = pool.get(device.as_ref(), &desc, "t").unwrap();
        pool.release(texture);
        assert_eq!(device.texture_count(), 1);

        pool.trim(device.as_ref(), 2);
        pool.trim(device.as_ref(), 2);
        assert_eq!(pool.total_count(), 1, "still within the idle limit");
        pool.trim(device.as_ref(), 2);
        assert_eq!(pool.total_count(), 0);
        assert_eq!(device.texture_count(), 0);
    }
}
