//! Settings Tests
//!
//! Tests for:
//! - Config (de)serialization round-trip
//! - Weighted blend semantics across volume stacks

use ember::settings::{
    AntialiasingMode, ColorGradingSettings, GlobalIlluminationMode, PostProcessSettings,
};

#[test]
fn settings_round_trip_through_json() {
    let mut settings = PostProcessSettings {
        anti_aliasing: AntialiasingMode::Smaa,
        ..Default::default()
    };
    settings.global_illumination.mode = GlobalIlluminationMode::Ddgi;
    settings.color_grading.exposure = 1.5;
    settings.motion_blur.enabled = false;

    let json = serde_json::to_string(&settings).expect("serialize");
    let restored: PostProcessSettings = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored, settings);
}

#[test]
fn defaults_deserialize_from_an_empty_overlay() {
    // Embedders ship partial config files; every field carries a default.
    let restored: PostProcessSettings =
        serde_json::from_str(&serde_json::to_string(&PostProcessSettings::default()).unwrap())
            .unwrap();
    assert_eq!(restored, PostProcessSettings::default());
}

#[test]
fn stacked_blends_accumulate_toward_the_override() {
    let mut settings = PostProcessSettings::default();
    let over = PostProcessSettings {
        color_grading: ColorGradingSettings {
            exposure: 4.0,
            ..Default::default()
        },
        ..Default::default()
    };

    settings.blend_with(&over, 0.5);
    settings.blend_with(&over, 0.5);
    // 0 -> 2 -> 3: each application halves the remaining distance.
    assert!((settings.color_grading.exposure - 3.0).abs() < 1e-5);
}

#[test]
fn blend_weight_is_clamped() {
    let mut settings = PostProcessSettings::default();
    let over = PostProcessSettings {
        color_grading: ColorGradingSettings {
            exposure: 2.0,
            ..Default::default()
        },
        ..Default::default()
    };
    settings.blend_with(&over, 7.5);
    assert!((settings.color_grading.exposure - 2.0).abs() < 1e-6);
}
