//! Draw-Call Collection
//!
//! The per-frame data model: draw calls, batches, stage lists, light
//! snapshots, the [`RenderList`] frame aggregate and its pool.

pub mod draw_call;
pub mod lights;
pub mod pool;
pub mod render_list;

pub use draw_call::{
    BatchedDrawCall, DrawBatch, DrawCall, DrawCallsList, DrawListType, InstanceData,
};
pub use lights::{
    DirectionalLightSnapshot, FogParams, PointLightSnapshot, ShadowParams, ShadowsCastingMode,
    SkyLightSnapshot, SpotLightSnapshot,
};
pub use pool::RenderListPool;
pub use render_list::{BlendableSettings, RenderList};
