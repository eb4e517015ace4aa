//! Batch Sorter
//!
//! Turns a stage's unordered index list into sorted indices plus contiguous
//! [`DrawBatch`] runs ready for instanced submission.
//!
//! The 64-bit sort key packs two concerns:
//!
//! - **High 32 bits**: a batch-compatibility signature from the pluggable
//!   [`BatchPolicy`] (same signature = candidates for one instanced
//!   submission). Grouping compatible state together minimizes GPU state
//!   changes on opaque stages.
//! - **Low 32 bits**: the ordering policy. Translucent stages (reverse
//!   order) use the bit-complemented monotonic image of the view distance,
//!   yielding back-to-front order required for alpha blending. Opaque
//!   stages use the biased sort-order hint with a coarse front-to-back
//!   distance below it.
//!
//! The sort itself is stable, so identical keys keep their insertion order
//! and re-sorting a sorted list is a no-op. Batches always partition the
//! index range: `sum(batch.len) == indices.len()`, no gaps, no overlap.

use xxhash_rust::xxh3::xxh3_64;

use crate::gpu::DeviceLimits;
use crate::list::draw_call::{DrawBatch, DrawCall, DrawCallsList};
use crate::view::RenderView;

/// The "can these two draw calls merge" predicate, family-specific per
/// renderable kind. The default [`SurfacePolicy`] covers static surfaces;
/// embedders supply their own for terrain, foliage or skinned families.
pub trait BatchPolicy {
    /// Batch-compatibility signature; equal signatures group adjacently
    /// after sorting.
    fn signature(&self, draw_call: &DrawCall) -> u32;

    /// True when two adjacent draw calls may share one instanced
    /// submission.
    fn can_batch(&self, a: &DrawCall, b: &DrawCall) -> bool;
}

/// Default policy for static surface geometry: identical geometry and
/// material, both sides willing to instance.
#[derive(Default)]
pub struct SurfacePolicy;

impl BatchPolicy for SurfacePolicy {
    fn signature(&self, draw_call: &DrawCall) -> u32 {
        let bytes = [
            draw_call.geometry.0.to_le_bytes(),
            draw_call.material.0.to_le_bytes(),
        ];
        let hash = xxh3_64(bytes.as_flattened());
        (hash >> 32) as u32 ^ hash as u32
    }

    fn can_batch(&self, a: &DrawCall, b: &DrawCall) -> bool {
        a.geometry == b.geometry
            && a.material == b.material
            && a.allow_instancing
            && b.allow_instancing
            && a.world_determinant_sign == b.world_determinant_sign
    }
}

/// Monotonic mapping of a non-negative distance onto `u32`.
#[inline]
fn distance_key(distance: f32) -> u32 {
    distance.max(0.0).to_bits()
}

/// Packs signature and ordering policy into the 64-bit sort key.
#[inline]
#[must_use]
pub fn compute_sort_key(
    signature: u32,
    distance: f32,
    sort_order: i16,
    reverse_distance: bool,
) -> u64 {
    let dist = distance_key(distance);
    let low = if reverse_distance {
        // Back-to-front: larger distances sort first.
        !dist
    } else {
        // Front-to-back with the coarse draw-order hint dominating.
        let order = (i32::from(sort_order) + 0x8000) as u32;
        (order << 16) | (dist >> 16)
    };
    (u64::from(signature) << 32) | u64::from(low)
}

/// Sorts a stage list and rebuilds its batches.
///
/// `reverse_distance` selects back-to-front ordering (translucency); the
/// default is front-to-back. Zero draw calls and lists containing only
/// pre-batched external calls return immediately.
pub fn sort_draw_calls(
    view: &RenderView,
    reverse_distance: bool,
    list: &mut DrawCallsList,
    draw_calls: &[DrawCall],
    policy: &dyn BatchPolicy,
    limits: &DeviceLimits,
) {
    let DrawCallsList {
        indices,
        batches,
        can_use_instancing,
        sort_scratch,
        ..
    } = list;

    batches.clear();
    if indices.is_empty() {
        return;
    }

    // 1. Key computation.
    sort_scratch.clear();
    sort_scratch.reserve(indices.len());
    let mut instancable = limits.supports_instancing;
    for &index in indices.iter() {
        let call = &draw_calls[index as usize];
        instancable &= call.allow_instancing;
        let key = compute_sort_key(
            policy.signature(call),
            view.distance(call.bounds_center),
            call.sort_order,
            reverse_distance,
        );
        sort_scratch.push((key, index));
    }
    *can_use_instancing = instancable;

    // 2. Stable sort; ties keep insertion order, making the result
    //    deterministic and the operation idempotent.
    sort_scratch.sort_by_key(|&(key, _)| key);
    for (slot, &(_, index)) in sort_scratch.iter().enumerate() {
        indices[slot] = index;
    }

    // 3. Contiguous batch grouping.
    let mut start = 0u32;
    let mut instance_count = draw_calls[indices[0] as usize].instance_count;
    for i in 1..=sort_scratch.len() {
        let split = if i == sort_scratch.len() {
            true
        } else {
            let previous = &draw_calls[indices[i - 1] as usize];
            let current = &draw_calls[indices[i] as usize];
            (sort_scratch[i].0 >> 32) != (sort_scratch[i - 1].0 >> 32)
                || !policy.can_batch(previous, current)
        };
        if split {
            batches.push(DrawBatch {
                sort_key: sort_scratch[start as usize].0,
                start,
                len: i as u32 - start,
                instance_count,
            });
            if i < sort_scratch.len() {
                start = i as u32;
                instance_count = 0;
            }
        }
        if i < sort_scratch.len() {
            instance_count += draw_calls[indices[i] as usize].instance_count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_key_is_monotonic() {
        let samples = [0.0f32, 0.001, 0.5, 1.0, 10.0, 1e6];
        for pair in samples.windows(2) {
            assert!(distance_key(pair[0]) < distance_key(pair[1]));
        }
    }

    #[test]
    fn reverse_key_inverts_distance_order() {
        let near = compute_sort_key(7, 1.0, 0, true);
        let far = compute_sort_key(7, 100.0, 0, true);
        assert!(far < near, "back-to-front places the far call first");
    }

    #[test]
    fn sort_order_hint_dominates_distance() {
        let early = compute_sort_key(7, 100.0, -1, false);
        let late = compute_sort_key(7, 1.0, 0, false);
        assert!(early < late);
    }
}
