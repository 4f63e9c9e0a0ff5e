// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Driver-facing seams.
//!
//! Every EGL/GLES call the bridge makes goes through one of these traits.
//! Production implementations live in [`crate::egl_runtime`],
//! [`crate::gles`] and the Android back-end; tests substitute recorders.

use std::ffi::c_void;

use hwimage_abi::{BufferHandle, HardwareBufferDesc};

use crate::error::Result;
use crate::handles::{ClientBuffer, DisplayHandle, DriverImage, SurfaceHandle};

/// Core EGL entry points of the current process.
///
/// # Safety
///
/// [`proc_address`](Self::proc_address) must return `None`, null, or the
/// address of the named entry point: the result is transmuted to that entry
/// point's Khronos signature.
pub unsafe trait EglEntryPoints {
    /// `eglGetProcAddress`.
    fn proc_address(&self, name: &str) -> Option<*const c_void>;

    /// `eglQueryString(display, EGL_EXTENSIONS)`. Empty when the query fails.
    fn extensions(&self, display: DisplayHandle) -> String;

    /// `eglGetCurrentSurface(EGL_DRAW)`.
    fn current_draw_surface(&self) -> Option<SurfaceHandle>;
}

/// Hardware buffer → EGLImage operations.
///
/// Must be `Send + Sync`: the deferred release closure calls
/// [`destroy_image`](Self::destroy_image) from whichever thread the driver
/// completes on.
pub trait ImageOps: Send + Sync {
    /// `AHardwareBuffer_describe`.
    fn describe(&self, buffer: BufferHandle) -> HardwareBufferDesc;

    /// `eglGetNativeClientBufferANDROID`.
    fn native_client_buffer(&self, buffer: BufferHandle) -> Result<ClientBuffer>;

    /// `eglCreateImageKHR(display, EGL_NO_CONTEXT, EGL_NATIVE_BUFFER_ANDROID, ..)`.
    ///
    /// `attribs` is terminated by `EGL_NONE`.
    fn create_image(
        &self,
        display: DisplayHandle,
        buffer: ClientBuffer,
        attribs: &[i32],
    ) -> Result<DriverImage>;

    /// `eglDestroyImageKHR`. Returns `false` on `EGL_FALSE`.
    fn destroy_image(&self, display: DisplayHandle, image: DriverImage) -> bool;
}

/// GLES texture calls. Requires a current context on the calling thread.
pub trait GlOps {
    fn gen_texture(&mut self) -> u32;
    fn delete_texture(&mut self, name: u32);
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, target: u32, name: u32);
    /// `glEGLImageTargetTexture2DOES`.
    fn image_target_texture(&mut self, target: u32, image: &DriverImage);
    fn tex_parameter(&mut self, target: u32, pname: u32, param: i32);
    fn generate_mipmap(&mut self, target: u32);
    fn get_error(&mut self) -> u32;
}
