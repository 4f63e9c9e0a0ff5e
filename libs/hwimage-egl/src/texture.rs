// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! `EGLImageKHR` → GL texture.

use crate::error::{BindStage, PlatformError, Result};
use crate::format::SamplingTarget;
use crate::handles::{DisplayHandle, DriverImage};
use crate::ops::{GlOps, ImageOps};

/// GL texture backed by an `EGLImageKHR`.
///
/// Owns the image; release both with [`destroy_external_texture`].
#[derive(Debug)]
pub struct ExternalTexture {
    id: u32,
    target: SamplingTarget,
    image: DriverImage,
}

impl ExternalTexture {
    /// GL texture name. Never 0.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn target(&self) -> SamplingTarget {
        self.target
    }

    pub fn image(&self) -> &DriverImage {
        &self.image
    }
}

/// Bind `image` to a fresh texture name on `GL_TEXTURE0`.
///
/// `Texture2D` targets get trilinear filtering and a mipmap chain;
/// `ExternalOpaque` targets get no filter or mipmap calls. On any GL error the
/// texture name is deleted and `image` destroyed before returning.
pub fn bind_external_texture(
    gl: &mut dyn GlOps,
    images: &dyn ImageOps,
    display: DisplayHandle,
    image: DriverImage,
    target: SamplingTarget,
) -> Result<ExternalTexture> {
    let id = gl.gen_texture();
    if id == 0 {
        tracing::error!("glGenTextures returned no texture name");
        destroy_image_logged(images, display, image);
        return Err(PlatformError::AllocationFailed(
            "glGenTextures returned 0".into(),
        ));
    }

    match configure(gl, id, &image, target) {
        Ok(()) => {
            tracing::trace!(id, ?target, ?image, "Bound EGLImage to texture");
            Ok(ExternalTexture { id, target, image })
        }
        Err(err) => {
            tracing::error!(id, ?target, "Binding EGLImage failed: {}", err);
            gl.delete_texture(id);
            destroy_image_logged(images, display, image);
            Err(err)
        }
    }
}

fn configure(
    gl: &mut dyn GlOps,
    id: u32,
    image: &DriverImage,
    target: SamplingTarget,
) -> Result<()> {
    let gl_target = target.gl_target();

    gl.active_texture(gl::TEXTURE0);
    gl.bind_texture(gl_target, id);
    check(gl, BindStage::BindTexture)?;

    gl.image_target_texture(gl_target, image);
    check(gl, BindStage::ImageTarget)?;

    if target.is_external() {
        return Ok(());
    }

    gl.tex_parameter(
        gl_target,
        gl::TEXTURE_MIN_FILTER,
        gl::LINEAR_MIPMAP_LINEAR as i32,
    );
    check(gl, BindStage::MinFilter)?;

    gl.tex_parameter(gl_target, gl::TEXTURE_MAG_FILTER, gl::LINEAR as i32);
    check(gl, BindStage::MagFilter)?;

    gl.generate_mipmap(gl_target);
    check(gl, BindStage::GenerateMipmap)
}

fn check(gl: &mut dyn GlOps, stage: BindStage) -> Result<()> {
    match gl.get_error() {
        gl::NO_ERROR => Ok(()),
        code => Err(PlatformError::BindingFailed { stage, code }),
    }
}

/// Delete the texture name, then destroy the backing image.
pub fn destroy_external_texture(
    gl: &mut dyn GlOps,
    images: &dyn ImageOps,
    display: DisplayHandle,
    texture: ExternalTexture,
) {
    let ExternalTexture { id, image, .. } = texture;
    gl.delete_texture(id);
    destroy_image_logged(images, display, image);
}

pub(crate) fn destroy_image_logged(
    images: &dyn ImageOps,
    display: DisplayHandle,
    image: DriverImage,
) {
    let ptr = image.as_ptr();
    if !images.destroy_image(display, image) {
        tracing::warn!("eglDestroyImageKHR failed for {:p}", ptr);
    }
}
