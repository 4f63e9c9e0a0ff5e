// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! [`GlOps`] over the `gl` bindings.

use std::ffi::c_void;

use crate::extensions::ExtensionTable;
use crate::handles::DriverImage;
use crate::ops::GlOps;

/// Texture calls on the thread's current GLES context.
///
/// `glEGLImageTargetTexture2DOES` comes from the [`ExtensionTable`]; when it
/// is unresolved the next [`get_error`](GlOps::get_error) reports
/// `GL_INVALID_OPERATION`.
#[derive(Debug)]
pub struct GlesTextures {
    extensions: ExtensionTable,
    pending_error: Option<u32>,
}

impl GlesTextures {
    /// Load the core GLES entry points through `loader` (normally
    /// `eglGetProcAddress`).
    pub fn load(
        extensions: ExtensionTable,
        mut loader: impl FnMut(&str) -> Option<*const c_void>,
    ) -> Self {
        gl::load_with(|name| loader(name).unwrap_or(std::ptr::null()));
        if !gl::GenTextures::is_loaded() || extensions.image_target_texture_2d.is_none() {
            tracing::warn!("GLES texture entry points are incomplete");
        }
        Self {
            extensions,
            pending_error: None,
        }
    }
}

impl GlOps for GlesTextures {
    fn gen_texture(&mut self) -> u32 {
        let mut name = 0;
        // SAFETY: one name into a valid out-pointer; a context is current.
        unsafe { gl::GenTextures(1, &mut name) };
        name
    }

    fn delete_texture(&mut self, name: u32) {
        // SAFETY: one name from a valid pointer; a context is current.
        unsafe { gl::DeleteTextures(1, &name) };
    }

    fn active_texture(&mut self, unit: u32) {
        // SAFETY: a context is current.
        unsafe { gl::ActiveTexture(unit) };
    }

    fn bind_texture(&mut self, target: u32, name: u32) {
        // SAFETY: a context is current.
        unsafe { gl::BindTexture(target, name) };
    }

    fn image_target_texture(&mut self, target: u32, image: &DriverImage) {
        if !self.extensions.image_target_texture(target, image) {
            tracing::error!("glEGLImageTargetTexture2DOES is not resolved");
            self.pending_error = Some(gl::INVALID_OPERATION);
        }
    }

    fn tex_parameter(&mut self, target: u32, pname: u32, param: i32) {
        // SAFETY: a context is current.
        unsafe { gl::TexParameteri(target, pname, param) };
    }

    fn generate_mipmap(&mut self, target: u32) {
        // SAFETY: a context is current.
        unsafe { gl::GenerateMipmap(target) };
    }

    fn get_error(&mut self) -> u32 {
        if let Some(code) = self.pending_error.take() {
            return code;
        }
        // SAFETY: a context is current.
        unsafe { gl::GetError() }
    }
}
