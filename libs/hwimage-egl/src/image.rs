// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! `AHardwareBuffer` → `EGLImageKHR`.

use hwimage_abi::{BufferHandle, HardwareBufferDesc, HardwareBufferUsage};

use crate::constants::egl;
use crate::error::Result;
use crate::handles::{DisplayHandle, DriverImage};
use crate::ops::ImageOps;
use crate::system::{Capabilities, ImageAttribute};

/// Per-acquisition hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageRequest {
    /// Sample through an sRGB transfer function.
    pub srgb: bool,
    /// Honor the buffer's protected-content usage bit.
    pub protected_content: bool,
}

/// Ordered `eglCreateImageKHR` attribute list.
///
/// Always starts with `EGL_IMAGE_PRESERVED_KHR = EGL_TRUE`; `as_slice`
/// appends the `EGL_NONE` terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttributes {
    list: Vec<i32>,
}

impl Default for ImageAttributes {
    fn default() -> Self {
        Self {
            list: vec![egl::IMAGE_PRESERVED_KHR, egl::TRUE, egl::NONE],
        }
    }
}

impl ImageAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attribute: ImageAttribute) {
        let terminator = self.list.len() - 1;
        self.list
            .splice(terminator..terminator, [attribute.key, attribute.value]);
    }

    pub fn with_srgb(mut self) -> Self {
        self.push(ImageAttribute {
            key: egl::GL_COLORSPACE,
            value: egl::GL_COLORSPACE_SRGB,
        });
        self
    }

    pub fn get(&self, key: i32) -> Option<i32> {
        self.list[..self.list.len() - 1]
            .chunks_exact(2)
            .find(|pair| pair[0] == key)
            .map(|pair| pair[1])
    }

    /// `EGL_NONE`-terminated list.
    pub fn as_slice(&self) -> &[i32] {
        &self.list
    }
}

/// Build the attribute list for one image.
///
/// The protected-content attribute is added only when requested, the buffer
/// usage is protected, and `capabilities` allow it. `usage` is only asked
/// for in that case.
pub fn image_attributes(
    request: &ImageRequest,
    capabilities: &Capabilities,
    usage: impl FnOnce() -> HardwareBufferUsage,
) -> ImageAttributes {
    let mut attributes = ImageAttributes::new();
    if request.srgb {
        attributes = attributes.with_srgb();
    }
    if request.protected_content && capabilities.supports_protected_content() {
        if let Some(protected) = capabilities.protected_content_attribute(usage()) {
            tracing::debug!("Marking EGLImage as protected content");
            attributes.push(protected);
        }
    }
    attributes
}

/// Create an `EGLImageKHR` over `buffer`.
///
/// Fails with `NativeBufferUnavailable` when no client-buffer view can be
/// obtained, and with `ImageCreationFailed` when the driver rejects the
/// buffer or attributes. Touches no GL state. `buffer` is described only
/// when the protected-content check needs its usage.
pub fn acquire_image(
    ops: &dyn ImageOps,
    display: DisplayHandle,
    buffer: BufferHandle,
    request: &ImageRequest,
    capabilities: &Capabilities,
) -> Result<DriverImage> {
    create_image(ops, display, buffer, request, capabilities, || {
        ops.describe(buffer).usage
    })
}

/// [`acquire_image`] for a buffer the caller has already described.
pub fn acquire_described_image(
    ops: &dyn ImageOps,
    display: DisplayHandle,
    buffer: BufferHandle,
    desc: &HardwareBufferDesc,
    request: &ImageRequest,
    capabilities: &Capabilities,
) -> Result<DriverImage> {
    create_image(ops, display, buffer, request, capabilities, || desc.usage)
}

fn create_image(
    ops: &dyn ImageOps,
    display: DisplayHandle,
    buffer: BufferHandle,
    request: &ImageRequest,
    capabilities: &Capabilities,
    usage: impl FnOnce() -> HardwareBufferUsage,
) -> Result<DriverImage> {
    let client = ops.native_client_buffer(buffer).inspect_err(|e| {
        tracing::error!("Unable to get EGLClientBuffer from AHardwareBuffer: {}", e);
    })?;

    let attributes = image_attributes(request, capabilities, usage);

    let image = ops
        .create_image(display, client, attributes.as_slice())
        .inspect_err(|e| {
            tracing::error!(?attributes, "eglCreateImageKHR returned no image: {}", e);
        })?;

    tracing::trace!(?buffer, ?image, "Created EGLImage");
    Ok(image)
}
