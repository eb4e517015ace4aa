//! Render View
//!
//! [`RenderView`] is the per-frame camera/output description handed to the
//! orchestrator: matrices, viewport size, feature flags, debug view mode and
//! the draw-pass mask driving collection. It is plain data; the scene
//! collaborator fills it, [`RenderView::prepare`] derives the cached
//! matrices before collection starts.

use bitflags::bitflags;
use glam::{Mat4, Vec3, Vec4};

bitflags! {
    /// Pass-applicability mask of a renderable. Collection routes a draw
    /// call into every stage list whose bit intersects the object's mask.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct DrawPass: u32 {
        /// Hardware depth-only rendering.
        const DEPTH = 1 << 0;
        /// Opaque geometry-buffer fill.
        const GBUFFER = 1 << 1;
        /// Forward/translucency rendering.
        const FORWARD = 1 << 2;
        /// Distortion accumulation.
        const DISTORTION = 1 << 3;
        /// Motion vectors rendering.
        const MOTION_VECTORS = 1 << 4;
    }
}

bitflags! {
    /// Static baking flags of the originating object, carried along for
    /// shadow/lightmap cache decisions.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct StaticFlags: u32 {
        const REFLECTION_PROBE = 1 << 0;
        const LIGHTMAP = 1 << 1;
        const TRANSFORM = 1 << 2;
        const SHADOW = 1 << 3;
    }
}

bitflags! {
    /// Feature toggles of a view. A cleared bit skips the matching stage;
    /// everything else in the pipeline keeps its ordering.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct ViewFlags: u32 {
        const SHADOWS = 1 << 0;
        const AO = 1 << 1;
        const GI = 1 << 2;
        const REFLECTIONS = 1 << 3;
        const SSR = 1 << 4;
        const FOG = 1 << 5;
        const MOTION_BLUR = 1 << 6;
        const DEPTH_OF_FIELD = 1 << 7;
        const TONE_MAPPING = 1 << 8;
        const EYE_ADAPTATION = 1 << 9;
        const ANTI_ALIASING = 1 << 10;
        const CUSTOM_POST_PROCESS = 1 << 11;
        const GLOBAL_SDF = 1 << 12;
        const DECALS = 1 << 13;
    }
}

impl Default for ViewFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Output mode of a view. Anything other than `Default` either skips part
/// of the pipeline or takes an early-exit branch writing a debug
/// visualization straight to the task output.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ViewMode {
    /// Full lit pipeline.
    #[default]
    Default,
    /// Lit scene without any post-processing.
    NoPostFx,
    /// Geometry-buffer diffuse color.
    Diffuse,
    /// Geometry-buffer world-space normals.
    Normals,
    /// Scene depth.
    Depth,
    /// Ambient occlusion term.
    AmbientOcclusion,
    /// Raw lighting accumulation buffer.
    LightBuffer,
    /// Reflections contribution.
    Reflections,
    /// Per-pixel motion vectors.
    MotionVectors,
    /// Global signed-distance-field visualization.
    GlobalSdf,
}

/// Per-frame camera and output description.
#[derive(Clone, Debug)]
pub struct RenderView {
    /// World-to-view matrix.
    pub view: Mat4,
    /// View-to-clip matrix.
    pub projection: Mat4,
    /// Cached `projection * view`, derived by [`prepare`](Self::prepare).
    pub view_projection: Mat4,
    /// Cached inverse of `view_projection`.
    pub inv_view_projection: Mat4,
    /// Cached inverse of `projection`.
    pub inv_projection: Mat4,

    /// Camera position in world space.
    pub position: Vec3,
    /// Camera forward direction in world space.
    pub direction: Vec3,
    pub near: f32,
    pub far: f32,
    /// Internal rendering resolution in pixels.
    pub screen_size: (u32, u32),
    /// True for orthographic projections (disables temporal jitter).
    pub is_orthographic: bool,

    pub flags: ViewFlags,
    pub mode: ViewMode,
    /// Stage mask used during collection; set by the orchestrator.
    pub pass: DrawPass,
    /// Clear/background color of the frame.
    pub background_color: [f32; 4],
    /// Frame counter for temporal effects, advanced by the TAA stage.
    pub temporal_frame_index: u32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            inv_view_projection: Mat4::IDENTITY,
            inv_projection: Mat4::IDENTITY,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            near: 0.1,
            far: 1000.0,
            screen_size: (0, 0),
            is_orthographic: false,
            flags: ViewFlags::default(),
            mode: ViewMode::Default,
            pass: DrawPass::empty(),
            background_color: [0.0, 0.0, 0.0, 1.0],
            temporal_frame_index: 0,
        }
    }
}

impl RenderView {
    /// Derives the cached matrices. Must run before collection and again
    /// after any change to `view` / `projection`.
    pub fn prepare(&mut self, screen_size: (u32, u32)) {
        self.screen_size = screen_size;
        self.view_projection = self.projection * self.view;
        self.inv_view_projection = self.view_projection.inverse();
        self.inv_projection = self.projection.inverse();
        let inv_view = self.view.inverse();
        self.position = inv_view.w_axis.truncate();
        self.direction = -Vec3::new(self.view.x_axis.z, self.view.y_axis.z, self.view.z_axis.z);
    }

    /// View-space distance from the camera to a world-space point.
    #[must_use]
    #[inline]
    pub fn distance(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }

    /// Frustum corners in world space: near plane then far plane, each as
    /// (-x,-y), (+x,-y), (+x,+y), (-x,+y). Depth convention is 0 = near,
    /// 1 = far in NDC.
    #[must_use]
    pub fn frustum_corners_world(&self) -> [Vec3; 8] {
        Self::unproject_corners(self.inv_view_projection)
    }

    /// Frustum corners in view space, same ordering as
    /// [`frustum_corners_world`](Self::frustum_corners_world).
    #[must_use]
    pub fn frustum_corners_view(&self) -> [Vec3; 8] {
        Self::unproject_corners(self.inv_projection)
    }

    fn unproject_corners(inverse: Mat4) -> [Vec3; 8] {
        let mut corners = [Vec3::ZERO; 8];
        let ndc = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        for (plane, z) in [0.0f32, 1.0].into_iter().enumerate() {
            for (i, (x, y)) in ndc.into_iter().enumerate() {
                let clip = inverse * Vec4::new(x, y, z, 1.0);
                corners[plane * 4 + i] = clip.truncate() / clip.w;
            }
        }
        corners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_recovers_camera_position() {
        let eye = Vec3::new(3.0, 2.0, 5.0);
        let mut view = RenderView {
            view: Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0),
            ..Default::default()
        };
        view.prepare((640, 480));
        assert!(view.position.distance(eye) < 1e-4);
    }

    #[test]
    fn frustum_corners_straddle_the_camera_axis() {
        let mut view = RenderView {
            view: Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y),
            projection: Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0),
            ..Default::default()
        };
        view.prepare((640, 480));
        let corners = view.frustum_corners_world();
        // Near corners are closer than far corners.
        assert!(corners[0].length() < corners[4].length());
        // Left/right corners are symmetric around the axis.
        assert!((corners[0].x + corners[1].x).abs() < 1e-3);
    }
}
