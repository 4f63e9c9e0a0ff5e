// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Sampling-target classification for hardware buffer formats.
//!
//! The NDK offers no way to enumerate every YUV or vendor format a producer
//! may hand us (e.g. `YCbCr_420_SP_VENUS_UBWC`), so the classification is an
//! allow-list: formats known to hold linear RGB, depth, or stencil data are
//! sampled as `GL_TEXTURE_2D`; everything else goes through
//! `GL_TEXTURE_EXTERNAL_OES` and lets the driver convert. A format that is
//! neither RGB nor YUV is misclassified as external.

use hwimage_abi::HardwareBufferFormat;

use crate::constants::gles;

const TEXTURE_2D_FORMATS: [HardwareBufferFormat; 12] = [
    HardwareBufferFormat::R8G8B8A8_UNORM,
    HardwareBufferFormat::R8G8B8X8_UNORM,
    HardwareBufferFormat::R8G8B8_UNORM,
    HardwareBufferFormat::R5G6B5_UNORM,
    HardwareBufferFormat::R16G16B16A16_FLOAT,
    HardwareBufferFormat::R10G10B10A2_UNORM,
    HardwareBufferFormat::D16_UNORM,
    HardwareBufferFormat::D24_UNORM,
    HardwareBufferFormat::D24_UNORM_S8_UINT,
    HardwareBufferFormat::D32_FLOAT,
    HardwareBufferFormat::D32_FLOAT_S8_UINT,
    HardwareBufferFormat::S8_UINT,
];

/// Whether `format` must be sampled through `GL_TEXTURE_EXTERNAL_OES`.
pub fn requires_external_sampling(format: HardwareBufferFormat) -> bool {
    !TEXTURE_2D_FORMATS.contains(&format)
}

/// Texture target an external image is bound to. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplingTarget {
    /// `GL_TEXTURE_2D`: mipmaps and min/mag filters apply.
    Texture2D,
    /// `GL_TEXTURE_EXTERNAL_OES`: driver-converted sampling, no mipmaps, no
    /// filter state.
    ExternalOpaque,
}

impl SamplingTarget {
    pub fn for_format(format: HardwareBufferFormat) -> Self {
        let target = if requires_external_sampling(format) {
            Self::ExternalOpaque
        } else {
            Self::Texture2D
        };
        tracing::debug!(?format, ?target, "Classified hardware buffer format");
        target
    }

    pub fn gl_target(self) -> u32 {
        match self {
            Self::Texture2D => gl::TEXTURE_2D,
            Self::ExternalOpaque => gles::TEXTURE_EXTERNAL_OES,
        }
    }

    pub fn is_external(self) -> bool {
        matches!(self, Self::ExternalOpaque)
    }
}
