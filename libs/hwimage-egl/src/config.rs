// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Platform configuration.

use serde::Deserialize;

use crate::error::{PlatformError, Result};

/// 60 Hz frame budget, used when the caller supplies no refresh interval.
pub const DEFAULT_FRAME_INTERVAL_NS: i64 = 16_666_667;

/// Configuration for [`PlatformEglAndroid`](crate::PlatformEglAndroid).
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfig {
    /// Target duration pushed to the hint session when `begin_frame` is
    /// called without a positive refresh interval.
    pub default_frame_interval_ns: i64,
    /// Target duration the hint session is created with. Replaced on the
    /// first `begin_frame`.
    pub initial_target_duration_ns: i64,
    /// Set `ANGLE_FEATURE_OVERRIDES_DISABLED=preferSubmitAtFBOBoundary` at
    /// construction (never overwrites an existing value).
    pub disable_angle_submit_at_fbo_boundary: bool,
    /// Request an sRGB transfer (`EGL_GL_COLORSPACE_SRGB`) for images bound
    /// through `create_external_image_texture`.
    pub srgb_external_textures: bool,
    /// Mark images from protected-content buffers with
    /// `EGL_PROTECTED_CONTENT_EXT` when the OS supports it.
    pub protected_content: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            default_frame_interval_ns: DEFAULT_FRAME_INTERVAL_NS,
            initial_target_duration_ns: DEFAULT_FRAME_INTERVAL_NS,
            disable_angle_submit_at_fbo_boundary: true,
            srgb_external_textures: false,
            protected_content: true,
        }
    }
}

impl PlatformConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_frame_interval_ns <= 0 {
            return Err(PlatformError::Configuration(format!(
                "default_frame_interval_ns must be positive, got {}",
                self.default_frame_interval_ns
            )));
        }
        if self.initial_target_duration_ns <= 0 {
            return Err(PlatformError::Configuration(format!(
                "initial_target_duration_ns must be positive, got {}",
                self.initial_target_duration_ns
            )));
        }
        Ok(())
    }
}
