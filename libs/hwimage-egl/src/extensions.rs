// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! EGL/GLES extension entry points.
//!
//! The NDK does not export extension functions, so they are resolved with
//! `eglGetProcAddress` once per driver and kept in an [`ExtensionTable`]
//! owned by the platform object. Components receive the table explicitly.

use std::collections::HashSet;
use std::ffi::c_void;
use std::fmt;

use hwimage_abi::BufferHandle;

use crate::constants::{egl, extension_names};
use crate::error::{PlatformError, Result};
use crate::handles::{ClientBuffer, DisplayHandle, DriverImage, SurfaceHandle};

type Display = *mut c_void;
type Surface = *mut c_void;

pub type GetNativeClientBufferFn = unsafe extern "C" fn(buffer: *const c_void) -> *mut c_void;
pub type CreateImageFn = unsafe extern "C" fn(
    display: Display,
    context: *mut c_void,
    target: u32,
    buffer: *mut c_void,
    attribs: *const i32,
) -> *mut c_void;
pub type DestroyImageFn = unsafe extern "C" fn(display: Display, image: *mut c_void) -> u32;
pub type ImageTargetTexture2dFn = unsafe extern "C" fn(target: u32, image: *mut c_void);
pub type PresentationTimeFn =
    unsafe extern "C" fn(display: Display, surface: Surface, time_ns: i64) -> u32;
pub type GetCompositorTimingSupportedFn =
    unsafe extern "C" fn(display: Display, surface: Surface, name: i32) -> u32;
pub type GetCompositorTimingFn = unsafe extern "C" fn(
    display: Display,
    surface: Surface,
    count: i32,
    names: *const i32,
    values: *mut i64,
) -> u32;
pub type GetNextFrameIdFn =
    unsafe extern "C" fn(display: Display, surface: Surface, frame_id: *mut u64) -> u32;
pub type GetFrameTimestampSupportedFn =
    unsafe extern "C" fn(display: Display, surface: Surface, timestamp: i32) -> u32;
pub type GetFrameTimestampsFn = unsafe extern "C" fn(
    display: Display,
    surface: Surface,
    frame_id: u64,
    count: i32,
    timestamps: *const i32,
    values: *mut i64,
) -> u32;

/// Parsed `EGL_EXTENSIONS` string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSet {
    names: HashSet<String>,
}

impl ExtensionSet {
    pub fn parse(extensions: &str) -> Self {
        Self {
            names: extensions.split_whitespace().map(str::to_owned).collect(),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// `EGL_ANDROID_get_frame_timestamps` entry points.
#[derive(Clone, Copy)]
pub struct FrameTimestampFns {
    pub compositor_timing_supported: GetCompositorTimingSupportedFn,
    pub compositor_timing: GetCompositorTimingFn,
    pub next_frame_id: GetNextFrameIdFn,
    pub frame_timestamp_supported: GetFrameTimestampSupportedFn,
    pub frame_timestamps: GetFrameTimestampsFn,
}

/// Resolved extension entry points. Every entry is optional.
#[derive(Clone, Copy, Default)]
pub struct ExtensionTable {
    pub get_native_client_buffer: Option<GetNativeClientBufferFn>,
    pub create_image: Option<CreateImageFn>,
    pub destroy_image: Option<DestroyImageFn>,
    pub image_target_texture_2d: Option<ImageTargetTexture2dFn>,
    pub presentation_time: Option<PresentationTimeFn>,
    pub frame_timestamps: Option<FrameTimestampFns>,
}

/// # Safety
///
/// `resolver` must return null or the address of `name` with signature `F`.
unsafe fn lookup<F: Copy>(
    resolver: &mut impl FnMut(&str) -> Option<*const c_void>,
    name: &str,
) -> Option<F> {
    let ptr = resolver(name).filter(|ptr| !ptr.is_null());
    if ptr.is_none() {
        tracing::debug!("Extension entry point {} not resolved", name);
    }
    let ptr = ptr?;
    debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<*const c_void>());
    // SAFETY: function contract; every `F` used here is an `extern "C"` fn pointer.
    Some(unsafe { std::mem::transmute_copy::<*const c_void, F>(&ptr) })
}

impl ExtensionTable {
    /// Resolve the entry points the bridge uses.
    ///
    /// `eglGetNativeClientBufferANDROID`, `eglCreateImageKHR`,
    /// `eglDestroyImageKHR` and `glEGLImageTargetTexture2DOES` are always
    /// attempted; the presentation-time and frame-timestamp entry points only
    /// when `extensions` advertises them.
    ///
    /// # Safety
    ///
    /// `resolver` must behave like `eglGetProcAddress`: return null or the
    /// address of the named entry point.
    pub unsafe fn resolve(
        extensions: &ExtensionSet,
        mut resolver: impl FnMut(&str) -> Option<*const c_void>,
    ) -> Self {
        let r = &mut resolver;
        // SAFETY: forwarded resolver contract; each name is paired with its
        // Khronos signature.
        unsafe {
            let mut table = Self {
                get_native_client_buffer: lookup(r, "eglGetNativeClientBufferANDROID"),
                create_image: lookup(r, "eglCreateImageKHR"),
                destroy_image: lookup(r, "eglDestroyImageKHR"),
                image_target_texture_2d: lookup(r, "glEGLImageTargetTexture2DOES"),
                presentation_time: None,
                frame_timestamps: None,
            };

            if extensions.has(extension_names::PRESENTATION_TIME) {
                table.presentation_time = lookup(r, "eglPresentationTimeANDROID");
            }

            if extensions.has(extension_names::FRAME_TIMESTAMPS) {
                let fns = (
                    lookup(r, "eglGetCompositorTimingSupportedANDROID"),
                    lookup(r, "eglGetCompositorTimingANDROID"),
                    lookup(r, "eglGetNextFrameIdANDROID"),
                    lookup(r, "eglGetFrameTimestampSupportedANDROID"),
                    lookup(r, "eglGetFrameTimestampsANDROID"),
                );
                if let (Some(a), Some(b), Some(c), Some(d), Some(e)) = fns {
                    table.frame_timestamps = Some(FrameTimestampFns {
                        compositor_timing_supported: a,
                        compositor_timing: b,
                        next_frame_id: c,
                        frame_timestamp_supported: d,
                        frame_timestamps: e,
                    });
                }
            }

            tracing::debug!(table = ?table, "Resolved EGL extension table");
            table
        }
    }

    /// Client-buffer view of `buffer`.
    pub fn native_client_buffer(&self, buffer: BufferHandle) -> Result<ClientBuffer> {
        let get = self.get_native_client_buffer.ok_or_else(|| {
            PlatformError::NativeBufferUnavailable(
                "eglGetNativeClientBufferANDROID is not resolved".into(),
            )
        })?;
        // SAFETY: resolved entry point; `buffer` is a live AHardwareBuffer
        // for the duration of the call.
        let client = unsafe { get(buffer.as_ptr()) };
        ClientBuffer::from_ptr(client).ok_or_else(|| {
            PlatformError::NativeBufferUnavailable(format!(
                "eglGetNativeClientBufferANDROID returned null for {buffer:?}"
            ))
        })
    }

    pub fn create_image(
        &self,
        display: DisplayHandle,
        buffer: ClientBuffer,
        attribs: &[i32],
    ) -> Result<DriverImage> {
        let create = self.create_image.ok_or_else(|| {
            PlatformError::ImageCreationFailed("eglCreateImageKHR is not resolved".into())
        })?;
        if attribs.last() != Some(&egl::NONE) {
            return Err(PlatformError::ImageCreationFailed(
                "attribute list is not EGL_NONE-terminated".into(),
            ));
        }
        // SAFETY: resolved entry point; `attribs` is EGL_NONE-terminated.
        let image = unsafe {
            create(
                display.as_ptr(),
                std::ptr::null_mut(),
                egl::NATIVE_BUFFER_ANDROID,
                buffer.as_ptr(),
                attribs.as_ptr(),
            )
        };
        DriverImage::from_ptr(image).ok_or_else(|| {
            PlatformError::ImageCreationFailed("eglCreateImageKHR returned EGL_NO_IMAGE_KHR".into())
        })
    }

    pub fn destroy_image(&self, display: DisplayHandle, image: DriverImage) -> bool {
        let Some(destroy) = self.destroy_image else {
            tracing::error!("eglDestroyImageKHR is not resolved; leaking {:?}", image);
            return false;
        };
        // SAFETY: resolved entry point; `image` is consumed here.
        unsafe { destroy(display.as_ptr(), image.as_ptr()) != egl::FALSE }
    }

    /// `glEGLImageTargetTexture2DOES`. Returns `false` when unresolved.
    pub fn image_target_texture(&self, target: u32, image: &DriverImage) -> bool {
        match self.image_target_texture_2d {
            Some(attach) => {
                // SAFETY: resolved entry point; a context is current.
                unsafe { attach(target, image.as_ptr()) };
                true
            }
            None => false,
        }
    }

    /// `eglPresentationTimeANDROID`. Returns `false` when unavailable or
    /// rejected.
    pub fn set_presentation_time(
        &self,
        display: DisplayHandle,
        surface: SurfaceHandle,
        time_ns: i64,
    ) -> bool {
        match self.presentation_time {
            // SAFETY: resolved entry point.
            Some(present) => unsafe { present(display.as_ptr(), surface.as_ptr(), time_ns) != egl::FALSE },
            None => false,
        }
    }

    pub fn supports_frame_timestamps(&self) -> bool {
        self.frame_timestamps.is_some()
    }

    /// `eglGetNextFrameIdANDROID`.
    pub fn next_frame_id(&self, display: DisplayHandle, surface: SurfaceHandle) -> Option<u64> {
        let fns = self.frame_timestamps?;
        let mut frame_id = 0u64;
        // SAFETY: resolved entry point; out-pointer is valid.
        let ok = unsafe { (fns.next_frame_id)(display.as_ptr(), surface.as_ptr(), &mut frame_id) };
        (ok != egl::FALSE).then_some(frame_id)
    }

    /// `eglGetFrameTimestampsANDROID` for `names`, skipping the query when
    /// any requested timestamp is unsupported.
    pub fn frame_timestamps(
        &self,
        display: DisplayHandle,
        surface: SurfaceHandle,
        frame_id: u64,
        names: &[i32],
    ) -> Option<Vec<i64>> {
        let fns = self.frame_timestamps?;
        let (dpy, surf) = (display.as_ptr(), surface.as_ptr());
        // SAFETY: resolved entry points; slices outlive the calls.
        unsafe {
            if names
                .iter()
                .any(|&name| (fns.frame_timestamp_supported)(dpy, surf, name) == egl::FALSE)
            {
                return None;
            }
            let mut values = vec![0i64; names.len()];
            let ok = (fns.frame_timestamps)(
                dpy,
                surf,
                frame_id,
                names.len() as i32,
                names.as_ptr(),
                values.as_mut_ptr(),
            );
            (ok != egl::FALSE).then_some(values)
        }
    }

    /// `eglGetCompositorTimingANDROID` for `names`.
    pub fn compositor_timing(
        &self,
        display: DisplayHandle,
        surface: SurfaceHandle,
        names: &[i32],
    ) -> Option<Vec<i64>> {
        let fns = self.frame_timestamps?;
        let (dpy, surf) = (display.as_ptr(), surface.as_ptr());
        // SAFETY: resolved entry points; slices outlive the calls.
        unsafe {
            if names
                .iter()
                .any(|&name| (fns.compositor_timing_supported)(dpy, surf, name) == egl::FALSE)
            {
                return None;
            }
            let mut values = vec![0i64; names.len()];
            let ok = (fns.compositor_timing)(
                dpy,
                surf,
                names.len() as i32,
                names.as_ptr(),
                values.as_mut_ptr(),
            );
            (ok != egl::FALSE).then_some(values)
        }
    }
}

impl fmt::Debug for ExtensionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionTable")
            .field("get_native_client_buffer", &self.get_native_client_buffer.is_some())
            .field("create_image", &self.create_image.is_some())
            .field("destroy_image", &self.destroy_image.is_some())
            .field("image_target_texture_2d", &self.image_target_texture_2d.is_some())
            .field("presentation_time", &self.presentation_time.is_some())
            .field("frame_timestamps", &self.frame_timestamps.is_some())
            .finish()
    }
}
