// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! External stream facade.
//!
//! Per-stream state (a `SurfaceTexture` and its attachment) is owned by a
//! [`StreamRegistry`]. This module only converts identities and forwards.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

/// Producer-side stream object (a `SurfaceTexture` jobject on Android).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeStream(*mut c_void);

impl NativeStream {
    pub fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }
}

/// Registry-side stream record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamHandle(NonNull<c_void>);

impl StreamHandle {
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Engine-side stream identity. Consumed by
/// [`ExternalStreams::destroy_stream`].
#[derive(PartialEq, Eq, Hash)]
pub struct Stream {
    handle: StreamHandle,
}

impl Stream {
    pub fn handle(&self) -> StreamHandle {
        self.handle
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stream({:p})", self.handle.as_ptr())
    }
}

/// Owner of per-stream state.
pub trait StreamRegistry {
    fn acquire(&mut self, native: NativeStream) -> Option<StreamHandle>;
    fn release(&mut self, stream: StreamHandle);
    /// Attach to the GL texture `texture_name`.
    fn attach(&mut self, stream: StreamHandle, texture_name: isize);
    fn detach(&mut self, stream: StreamHandle);
    /// Latch the newest frame. Returns its timestamp in nanoseconds.
    fn update_tex_image(&mut self, stream: StreamHandle) -> Option<i64>;
    fn shutdown(&mut self);
}

/// Forwards stream operations to a [`StreamRegistry`].
///
/// After [`terminate`](Self::terminate), or when built without a registry,
/// every call is a logged no-op.
#[derive(Default)]
pub struct ExternalStreams {
    registry: Option<Box<dyn StreamRegistry>>,
}

impl ExternalStreams {
    pub fn new(registry: Box<dyn StreamRegistry>) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    pub fn is_available(&self) -> bool {
        self.registry.is_some()
    }

    fn registry(&mut self, op: &str) -> Option<&mut (dyn StreamRegistry + 'static)> {
        if self.registry.is_none() {
            tracing::warn!("{} ignored: no external stream registry", op);
        }
        self.registry.as_deref_mut()
    }

    pub fn create_stream(&mut self, native: NativeStream) -> Option<Stream> {
        let handle = self.registry("create_stream")?.acquire(native)?;
        tracing::debug!(?handle, "Created external stream");
        Some(Stream { handle })
    }

    pub fn destroy_stream(&mut self, stream: Stream) {
        if let Some(registry) = self.registry("destroy_stream") {
            registry.release(stream.handle);
        }
    }

    pub fn attach(&mut self, stream: &Stream, texture_name: u32) {
        if let Some(registry) = self.registry("attach") {
            registry.attach(stream.handle, texture_name as isize);
        }
    }

    pub fn detach(&mut self, stream: &Stream) {
        if let Some(registry) = self.registry("detach") {
            registry.detach(stream.handle);
        }
    }

    pub fn update_tex_image(&mut self, stream: &Stream) -> Option<i64> {
        self.registry("update_tex_image")?
            .update_tex_image(stream.handle)
    }

    /// Shut the registry down. Idempotent.
    pub fn terminate(&mut self) {
        if let Some(mut registry) = self.registry.take() {
            registry.shutdown();
            tracing::debug!("External stream registry shut down");
        }
    }
}

impl fmt::Debug for ExternalStreams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalStreams")
            .field("available", &self.is_available())
            .finish()
    }
}
