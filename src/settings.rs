//! Post-Process Settings
//!
//! Configuration of the frame pipeline's optional stages. A task carries a
//! base [`PostProcessSettings`]; overlapping post-effect volumes contribute
//! weighted overrides through the [`PostFxSettingsProvider`] contract, and
//! the frame aggregate blends them into the final per-frame values (see
//! `RenderList::blend_settings`).
//!
//! All types derive `serde` so embedders can load them from config files.

use serde::{Deserialize, Serialize};

/// Final anti-aliasing technique applied at the end of the frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum AntialiasingMode {
    /// No anti-aliasing; the pre-AA buffer is copied to the output.
    None,
    /// Fast approximate AA (single fullscreen pass).
    #[default]
    Fxaa,
    /// Subpixel morphological AA.
    Smaa,
    /// Temporal AA; requires motion vectors and runs before the
    /// post-process chain instead of at the end.
    TemporalAntialiasing,
}

/// Global illumination technique.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum GlobalIlluminationMode {
    #[default]
    None,
    /// Dynamic diffuse GI (probe volumes).
    Ddgi,
}

/// Tone mapping operator.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum ToneMappingMode {
    None,
    Neutral,
    #[default]
    AcesFilmic,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct AmbientOcclusionSettings {
    pub enabled: bool,
    pub intensity: f32,
    pub radius: f32,
    pub power: f32,
}

impl Default for AmbientOcclusionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 0.8,
            radius: 0.7,
            power: 0.75,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct GlobalIlluminationSettings {
    pub mode: GlobalIlluminationMode,
    pub intensity: f32,
}

impl Default for GlobalIlluminationSettings {
    fn default() -> Self {
        Self {
            mode: GlobalIlluminationMode::None,
            intensity: 1.0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct ScreenSpaceReflectionsSettings {
    pub intensity: f32,
    /// Surfaces rougher than this receive no screen-space reflections.
    pub roughness_threshold: f32,
}

impl Default for ScreenSpaceReflectionsSettings {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            roughness_threshold: 0.45,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct MotionBlurSettings {
    pub enabled: bool,
    pub scale: f32,
    pub sample_count: u32,
}

impl Default for MotionBlurSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            scale: 1.0,
            sample_count: 10,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct DepthOfFieldSettings {
    pub enabled: bool,
    pub focal_distance: f32,
    pub blur_strength: f32,
}

impl Default for DepthOfFieldSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            focal_distance: 10.0,
            blur_strength: 1.0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct EyeAdaptationSettings {
    pub enabled: bool,
    /// Adaptation speed in f-stops per second.
    pub speed: f32,
    pub min_luminance: f32,
    pub max_luminance: f32,
}

impl Default for EyeAdaptationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: 3.0,
            min_luminance: 0.01,
            max_luminance: 10.0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct ColorGradingSettings {
    pub exposure: f32,
    pub saturation: f32,
    pub contrast: f32,
    pub tone_mapping: ToneMappingMode,
}

impl Default for ColorGradingSettings {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            saturation: 1.0,
            contrast: 1.0,
            tone_mapping: ToneMappingMode::AcesFilmic,
        }
    }
}

/// The blended per-frame pipeline configuration.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct PostProcessSettings {
    pub anti_aliasing: AntialiasingMode,
    pub ambient_occlusion: AmbientOcclusionSettings,
    pub global_illumination: GlobalIlluminationSettings,
    pub screen_space_reflections: ScreenSpaceReflectionsSettings,
    pub motion_blur: MotionBlurSettings,
    pub depth_of_field: DepthOfFieldSettings,
    pub eye_adaptation: EyeAdaptationSettings,
    pub color_grading: ColorGradingSettings,
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl PostProcessSettings {
    /// Blends `other` over `self` with the given weight. Continuous fields
    /// interpolate; discrete fields (modes, enables) switch once the weight
    /// crosses one half.
    pub fn blend_with(&mut self, other: &Self, weight: f32) {
        let weight = weight.clamp(0.0, 1.0);
        let switch = weight >= 0.5;

        if switch {
            self.anti_aliasing = other.anti_aliasing;
            self.global_illumination.mode = other.global_illumination.mode;
            self.ambient_occlusion.enabled = other.ambient_occlusion.enabled;
            self.motion_blur.enabled = other.motion_blur.enabled;
            self.depth_of_field.enabled = other.depth_of_field.enabled;
            self.eye_adaptation.enabled = other.eye_adaptation.enabled;
            self.color_grading.tone_mapping = other.color_grading.tone_mapping;
            self.motion_blur.sample_count = other.motion_blur.sample_count;
        }

        let ao = &mut self.ambient_occlusion;
        ao.intensity = lerp(ao.intensity, other.ambient_occlusion.intensity, weight);
        ao.radius = lerp(ao.radius, other.ambient_occlusion.radius, weight);
        ao.power = lerp(ao.power, other.ambient_occlusion.power, weight);

        self.global_illumination.intensity = lerp(
            self.global_illumination.intensity,
            other.global_illumination.intensity,
            weight,
        );

        let ssr = &mut self.screen_space_reflections;
        ssr.intensity = lerp(ssr.intensity, other.screen_space_reflections.intensity, weight);
        ssr.roughness_threshold = lerp(
            ssr.roughness_threshold,
            other.screen_space_reflections.roughness_threshold,
            weight,
        );

        self.motion_blur.scale = lerp(self.motion_blur.scale, other.motion_blur.scale, weight);

        let dof = &mut self.depth_of_field;
        dof.focal_distance = lerp(dof.focal_distance, other.depth_of_field.focal_distance, weight);
        dof.blur_strength = lerp(dof.blur_strength, other.depth_of_field.blur_strength, weight);

        let eye = &mut self.eye_adaptation;
        eye.speed = lerp(eye.speed, other.eye_adaptation.speed, weight);
        eye.min_luminance = lerp(eye.min_luminance, other.eye_adaptation.min_luminance, weight);
        eye.max_luminance = lerp(eye.max_luminance, other.eye_adaptation.max_luminance, weight);

        let grading = &mut self.color_grading;
        grading.exposure = lerp(grading.exposure, other.color_grading.exposure, weight);
        grading.saturation = lerp(grading.saturation, other.color_grading.saturation, weight);
        grading.contrast = lerp(grading.contrast, other.color_grading.contrast, weight);
    }
}

/// Contract of a post-effect volume contributing blendable settings.
///
/// Implementors are owned by the scene side; the frame aggregate only stores
/// a provider *index* (never a reference), and the scene dispatches the
/// blend call back to the right provider.
pub trait PostFxSettingsProvider {
    /// Applies this provider's overrides onto `target` with a 0..1 weight.
    /// Most implementations forward to [`PostProcessSettings::blend_with`].
    fn blend(&self, target: &mut PostProcessSettings, weight: f32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_interpolates_continuous_fields() {
        let mut base = PostProcessSettings::default();
        let over = PostProcessSettings {
            color_grading: ColorGradingSettings {
                exposure: 2.0,
                ..Default::default()
            },
            ..Default::default()
        };
        base.blend_with(&over, 0.25);
        assert!((base.color_grading.exposure - 0.5).abs() < 1e-6);
    }

    #[test]
    fn blend_switches_discrete_fields_past_half_weight() {
        let mut base = PostProcessSettings::default();
        let over = PostProcessSettings {
            anti_aliasing: AntialiasingMode::TemporalAntialiasing,
            ..Default::default()
        };
        base.blend_with(&over, 0.4);
        assert_eq!(base.anti_aliasing, AntialiasingMode::Fxaa);
        base.blend_with(&over, 0.6);
        assert_eq!(base.anti_aliasing, AntialiasingMode::TemporalAntialiasing);
    }
}
