// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! [`EglEntryPoints`] over the system `libEGL`, loaded with `khronos-egl`.

use std::ffi::c_void;

use khronos_egl as egl;

use crate::error::{PlatformError, Result};
use crate::handles::{DisplayHandle, SurfaceHandle};
use crate::ops::EglEntryPoints;

pub struct KhronosEgl {
    instance: egl::DynamicInstance<egl::EGL1_4>,
}

impl KhronosEgl {
    /// Load `libEGL` and require EGL 1.4.
    pub fn load() -> Result<Self> {
        // SAFETY: libEGL has no load-time preconditions on the caller.
        let instance = unsafe { egl::DynamicInstance::<egl::EGL1_4>::load_required() }
            .map_err(|e| PlatformError::DriverCreation(format!("Failed to load libEGL: {}", e)))?;
        tracing::debug!("Loaded libEGL (EGL 1.4)");
        Ok(Self { instance })
    }

    pub fn instance(&self) -> &egl::DynamicInstance<egl::EGL1_4> {
        &self.instance
    }
}

// SAFETY: `eglGetProcAddress` returns null or the named entry point.
unsafe impl EglEntryPoints for KhronosEgl {
    fn proc_address(&self, name: &str) -> Option<*const c_void> {
        self.instance
            .get_proc_address(name)
            .map(|f| f as *const c_void)
    }

    fn extensions(&self, display: DisplayHandle) -> String {
        if display.is_none() {
            return String::new();
        }
        // SAFETY: `display` is the base platform's initialized EGLDisplay.
        let display = unsafe { egl::Display::from_ptr(display.as_ptr()) };
        match self.instance.query_string(Some(display), egl::EXTENSIONS) {
            Ok(extensions) => extensions.to_string_lossy().into_owned(),
            Err(e) => {
                tracing::warn!("eglQueryString(EGL_EXTENSIONS) failed: {}", e);
                String::new()
            }
        }
    }

    fn current_draw_surface(&self) -> Option<SurfaceHandle> {
        self.instance
            .get_current_surface(egl::DRAW)
            .and_then(|surface| SurfaceHandle::from_ptr(surface.as_ptr()))
    }
}

impl std::fmt::Debug for KhronosEgl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KhronosEgl").finish_non_exhaustive()
    }
}
