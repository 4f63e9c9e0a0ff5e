// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Android EGL platform bridge.
//!
//! Imports `AHardwareBuffer`s as `EGLImageKHR`s and binds them to
//! `GL_TEXTURE_2D` or `GL_TEXTURE_EXTERNAL_OES` textures, re-wraps acquired
//! producer images so the image is destroyed before the producer gets its
//! buffer back, feeds per-frame timings to the performance-hint session, and
//! forwards external stream calls to a stream registry.
//!
//! All EGL and GLES calls go through the traits in [`ops`], so the bridge
//! runs on hosts with recording back-ends.

#[cfg(target_os = "android")]
pub mod android;
pub mod config;
pub mod constants;
pub mod egl_runtime;
pub mod error;
pub mod extensions;
pub mod format;
pub mod gles;
pub mod handles;
pub mod hint;
pub mod image;
pub mod ops;
pub mod pacing;
pub mod platform;
pub mod release;
pub mod stream;
pub mod system;
pub mod texture;

pub use config::{DEFAULT_FRAME_INTERVAL_NS, PlatformConfig};
pub use error::{BindStage, PlatformError, Result};
pub use extensions::{ExtensionSet, ExtensionTable};
pub use format::{SamplingTarget, requires_external_sampling};
pub use handles::{ClientBuffer, ContextHandle, DisplayHandle, DriverImage, SurfaceHandle};
pub use hint::{
    HintSession, InvalidHintSession, NdkPerformanceHint, NoThreadRegistration,
    PerformanceHintManager, ThreadRegistration,
};
pub use image::{ImageAttributes, ImageRequest, acquire_described_image, acquire_image};
pub use ops::{EglEntryPoints, GlOps, ImageOps};
pub use pacing::{FramePacer, MonotonicClock, SystemMonotonicClock};
pub use platform::{EglPlatform, PlatformBuilder, PlatformEglAndroid};
pub use release::DeferredRelease;
pub use stream::{ExternalStreams, NativeStream, Stream, StreamHandle, StreamRegistry};
pub use system::{Capabilities, OsVersion};
pub use texture::{ExternalTexture, bind_external_texture, destroy_external_texture};

pub use hwimage_abi;
