// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! EGL and GLES enums not exposed by the `gl` / `khronos-egl` bindings.

/// EGL constants (`EGLint`).
pub mod egl {
    pub const NONE: i32 = 0x3038;
    pub const TRUE: i32 = 1;
    pub const FALSE: u32 = 0;
    /// EGL_KHR_image_base
    pub const IMAGE_PRESERVED_KHR: i32 = 0x30D2;
    /// EGL_KHR_gl_colorspace
    pub const GL_COLORSPACE: i32 = 0x309D;
    pub const GL_COLORSPACE_SRGB: i32 = 0x3089;
    /// EGL_EXT_protected_content
    pub const PROTECTED_CONTENT_EXT: i32 = 0x32C0;
    /// EGL_ANDROID_image_native_buffer
    pub const NATIVE_BUFFER_ANDROID: u32 = 0x3140;
}

/// GLES constants (`GLenum`).
pub mod gles {
    /// GL_OES_EGL_image_external
    pub const TEXTURE_EXTERNAL_OES: u32 = 0x8D65;
}

/// Extension names checked before resolving optional entry points.
pub mod extension_names {
    pub const PRESENTATION_TIME: &str = "EGL_ANDROID_presentation_time";
    pub const FRAME_TIMESTAMPS: &str = "EGL_ANDROID_get_frame_timestamps";
}
