//! Per-Frame Light Snapshots
//!
//! Scene lights are copied into the frame aggregate as plain-data
//! snapshots. Each snapshot carries a stable [`Uuid`] correlating it with
//! the originating light across frames, which is what lets the shadow
//! mapper and temporal history caches reuse per-light state without holding
//! references into the scene graph.

use glam::Vec3;
use uuid::Uuid;

use crate::view::StaticFlags;

/// Which object categories a light's shadows apply to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ShadowsCastingMode {
    None,
    StaticOnly,
    DynamicOnly,
    #[default]
    All,
}

/// Shadow parameters shared by every shadow-casting light type.
#[derive(Clone, Copy, Debug)]
pub struct ShadowParams {
    pub mode: ShadowsCastingMode,
    pub strength: f32,
    pub distance: f32,
    pub fade_distance: f32,
    pub depth_bias: f32,
    pub normal_offset_scale: f32,
    pub sharpness: f32,
    pub contact_shadows_length: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            mode: ShadowsCastingMode::All,
            strength: 1.0,
            distance: 50.0,
            fade_distance: 5.0,
            depth_bias: 0.005,
            normal_offset_scale: 10.0,
            sharpness: 1.0,
            contact_shadows_length: 0.0,
        }
    }
}

impl ShadowParams {
    /// True when this light contributes shadow maps this frame.
    #[must_use]
    #[inline]
    pub fn casts_shadows(&self) -> bool {
        self.mode != ShadowsCastingMode::None && self.strength > f32::EPSILON
    }
}

/// Per-frame copy of a directional light.
#[derive(Clone, Copy, Debug)]
pub struct DirectionalLightSnapshot {
    /// Stable identifier of the originating light.
    pub id: Uuid,
    pub color: Vec3,
    pub direction: Vec3,
    pub position: Vec3,
    pub min_roughness: f32,
    pub cascade_count: u32,
    pub shadow: ShadowParams,
    pub volumetric_scattering_intensity: f32,
    pub indirect_lighting_intensity: f32,
    pub cast_volumetric_shadow: bool,
    pub static_flags: StaticFlags,
}

impl DirectionalLightSnapshot {
    /// Snapshot with neutral parameters; callers override fields as the
    /// source light dictates.
    #[must_use]
    pub fn new(id: Uuid, color: Vec3, direction: Vec3) -> Self {
        Self {
            id,
            color,
            direction,
            position: Vec3::ZERO,
            min_roughness: 0.04,
            cascade_count: 4,
            shadow: ShadowParams::default(),
            volumetric_scattering_intensity: 1.0,
            indirect_lighting_intensity: 1.0,
            cast_volumetric_shadow: true,
            static_flags: StaticFlags::empty(),
        }
    }
}

/// Per-frame copy of a point light.
#[derive(Clone, Copy, Debug)]
pub struct PointLightSnapshot {
    pub id: Uuid,
    pub color: Vec3,
    pub position: Vec3,
    pub direction: Vec3,
    pub radius: f32,
    pub fall_off_exponent: f32,
    pub use_inverse_squared_falloff: bool,
    pub source_radius: f32,
    pub source_length: f32,
    pub min_roughness: f32,
    pub shadow: ShadowParams,
    pub volumetric_scattering_intensity: f32,
    pub indirect_lighting_intensity: f32,
    pub cast_volumetric_shadow: bool,
    pub static_flags: StaticFlags,
}

impl PointLightSnapshot {
    #[must_use]
    pub fn new(id: Uuid, color: Vec3, position: Vec3, radius: f32) -> Self {
        Self {
            id,
            color,
            position,
            direction: Vec3::NEG_Z,
            radius,
            fall_off_exponent: 8.0,
            use_inverse_squared_falloff: true,
            source_radius: 0.0,
            source_length: 0.0,
            min_roughness: 0.04,
            shadow: ShadowParams::default(),
            volumetric_scattering_intensity: 1.0,
            indirect_lighting_intensity: 1.0,
            cast_volumetric_shadow: true,
            static_flags: StaticFlags::empty(),
        }
    }
}

/// Per-frame copy of a spot light.
#[derive(Clone, Copy, Debug)]
pub struct SpotLightSnapshot {
    pub id: Uuid,
    pub color: Vec3,
    pub position: Vec3,
    pub direction: Vec3,
    pub up_vector: Vec3,
    pub radius: f32,
    pub fall_off_exponent: f32,
    pub use_inverse_squared_falloff: bool,
    pub source_radius: f32,
    pub outer_cone_angle: f32,
    pub cos_outer_cone: f32,
    pub inv_cos_cone_difference: f32,
    pub min_roughness: f32,
    pub shadow: ShadowParams,
    pub volumetric_scattering_intensity: f32,
    pub indirect_lighting_intensity: f32,
    pub cast_volumetric_shadow: bool,
    pub static_flags: StaticFlags,
}

impl SpotLightSnapshot {
    #[must_use]
    pub fn new(id: Uuid, color: Vec3, position: Vec3, direction: Vec3, radius: f32) -> Self {
        let outer_cone_angle = 45f32.to_radians();
        let inner_cone_angle = 35f32.to_radians();
        Self {
            id,
            color,
            position,
            direction,
            up_vector: Vec3::Y,
            radius,
            fall_off_exponent: 8.0,
            use_inverse_squared_falloff: true,
            source_radius: 0.0,
            outer_cone_angle,
            cos_outer_cone: outer_cone_angle.cos(),
            inv_cos_cone_difference: 1.0 / (inner_cone_angle.cos() - outer_cone_angle.cos()),
            min_roughness: 0.04,
            shadow: ShadowParams::default(),
            volumetric_scattering_intensity: 1.0,
            indirect_lighting_intensity: 1.0,
            cast_volumetric_shadow: true,
            static_flags: StaticFlags::empty(),
        }
    }
}

/// Per-frame copy of a sky light.
#[derive(Clone, Copy, Debug)]
pub struct SkyLightSnapshot {
    pub id: Uuid,
    pub color: Vec3,
    pub additive_color: Vec3,
    pub position: Vec3,
    pub radius: f32,
    pub indirect_lighting_intensity: f32,
    pub volumetric_scattering_intensity: f32,
    pub cast_volumetric_shadow: bool,
    pub static_flags: StaticFlags,
}

impl SkyLightSnapshot {
    #[must_use]
    pub fn new(id: Uuid, color: Vec3) -> Self {
        Self {
            id,
            color,
            additive_color: Vec3::ZERO,
            position: Vec3::ZERO,
            radius: f32::MAX,
            indirect_lighting_intensity: 1.0,
            volumetric_scattering_intensity: 1.0,
            cast_volumetric_shadow: false,
            static_flags: StaticFlags::empty(),
        }
    }
}

/// Atmospheric/height fog registration; at most one per frame.
#[derive(Clone, Copy, Debug)]
pub struct FogParams {
    pub color: Vec3,
    pub density: f32,
    pub height_falloff: f32,
    pub start_distance: f32,
    /// Enables the froxel-based volumetric stage in addition to the
    /// analytic fullscreen fog.
    pub volumetric: bool,
}

impl Default for FogParams {
    fn default() -> Self {
        Self {
            color: Vec3::new(0.5, 0.6, 0.7),
            density: 0.02,
            height_falloff: 0.2,
            start_distance: 0.0,
            volumetric: false,
        }
    }
}
