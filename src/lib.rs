//! # Ember
//!
//! Per-frame rendering orchestrator: collects draw-call contributions from
//! a scene, sorts and batches them for efficient GPU submission, and
//! drives a fixed multi-stage pipeline threading intermediate buffers
//! through interchangeable passes with pooled resources.
//!
//! The crate sits strictly above the GPU backend boundary: everything the
//! hardware does is reached through the [`gpu`] traits, and a headless
//! command-recording backend ([`gpu::null`]) runs the whole pipeline
//! without a GPU.
//!
//! # Frame Anatomy
//!
//! 1. Acquire a [`RenderList`] frame aggregate from the pool.
//! 2. Traversal fills it through [`RenderList::add_draw_call`] and the
//!    light snapshot arrays (external merge barrier before step 3).
//! 3. Per-stage lists are stable-sorted and grouped into instanced
//!    [`DrawBatch`] runs.
//! 4. [`Renderer::render`] executes the canonical stage sequence, swapping
//!    the ping-pong color slots and branching for debug view modes.
//! 5. The aggregate is cleared and returned; no steady-state allocations.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::too_many_lines)]

pub mod buffers;
pub mod error;
pub mod gpu;
pub mod list;
pub mod passes;
pub mod renderer;
pub mod settings;
pub mod sort;
pub mod target_pool;
pub mod task;
pub mod view;

pub use buffers::{PingPong, RenderBuffers};
pub use error::{RenderError, Result};
pub use list::{
    BatchedDrawCall, BlendableSettings, DrawBatch, DrawCall, DrawCallsList, DrawListType,
    InstanceData, RenderList, RenderListPool,
};
pub use renderer::Renderer;
pub use settings::{AntialiasingMode, GlobalIlluminationMode, PostProcessSettings};
pub use sort::{BatchPolicy, SurfacePolicy};
pub use target_pool::RenderTargetPool;
pub use task::{PostFxEffect, PostFxLocation, RenderTask, SceneSource};
pub use view::{DrawPass, RenderView, StaticFlags, ViewFlags, ViewMode};
