// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Producer-facing contract for hwimage.
//!
//! Buffer producers (camera, video decoders, compositors) hand the renderer
//! an [`AcquiredImage`]: an opaque `AHardwareBuffer` handle plus a one-shot
//! [`ImageRelease`] that tells the producer the buffer is free again. The
//! descriptor types in [`buffer`] mirror `AHardwareBuffer_Desc` so the
//! renderer can decide how to sample a buffer without linking the NDK.

pub mod acquired;
pub mod buffer;

pub use acquired::{AcquiredImage, DispatchHandler, ImageHandle, ImageRelease, RawReleaseFn};
pub use buffer::{BufferHandle, HardwareBufferDesc, HardwareBufferFormat, HardwareBufferUsage};
