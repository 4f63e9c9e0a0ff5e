// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Opaque EGL handle wrappers.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

use hwimage_abi::ImageHandle;

/// `EGLDisplay`. `EGL_NO_DISPLAY` is representable.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayHandle(*mut c_void);

impl DisplayHandle {
    pub const NONE: Self = Self(std::ptr::null_mut());

    pub fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0.is_null()
    }
}

impl fmt::Debug for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayHandle({:p})", self.0)
    }
}

// SAFETY: EGLDisplay is a process-wide connection token; EGL allows it to be
// used from any thread.
unsafe impl Send for DisplayHandle {}
unsafe impl Sync for DisplayHandle {}

/// `EGLContext` shared with a new driver. `EGL_NO_CONTEXT` is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextHandle(pub *mut c_void);

impl ContextHandle {
    pub const NONE: Self = Self(std::ptr::null_mut());
}

/// Non-null `EGLSurface`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceHandle(NonNull<c_void>);

impl SurfaceHandle {
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Non-null `EGLClientBuffer` view of an `AHardwareBuffer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientBuffer(NonNull<c_void>);

impl ClientBuffer {
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Owned `EGLImageKHR`.
///
/// Move-only: the value is consumed by
/// [`ImageOps::destroy_image`](crate::ops::ImageOps::destroy_image), so a
/// destroyed image cannot be referenced again.
#[derive(PartialEq, Eq, Hash)]
pub struct DriverImage(NonNull<c_void>);

impl DriverImage {
    /// Take ownership of an `EGLImageKHR`. `None` for `EGL_NO_IMAGE_KHR`.
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }

    /// The image as the handle slot of an [`AcquiredImage`](hwimage_abi::AcquiredImage).
    pub fn image_handle(&self) -> ImageHandle {
        ImageHandle::from_non_null(self.0)
    }
}

impl fmt::Debug for DriverImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DriverImage({:p})", self.0)
    }
}

// SAFETY: EGLImages are display-scoped, not context- or thread-scoped;
// eglDestroyImageKHR may be called from any thread.
unsafe impl Send for DriverImage {}
unsafe impl Sync for DriverImage {}
