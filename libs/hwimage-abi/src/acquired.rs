// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Acquired images and their one-shot release.
//!
//! A producer lends the renderer an image together with a callback that
//! returns the buffer to the producer. The callback must run exactly once,
//! and only once nothing on the GPU side can still reference the image.
//! [`ImageRelease`] is move-only and [`ImageRelease::fire`] consumes it, so a
//! second invocation does not type-check.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

use crate::buffer::BufferHandle;

/// C producer callback: `callback(image, user_data)`.
pub type RawReleaseFn = unsafe extern "C" fn(image: *mut c_void, user_data: *mut c_void);

/// Non-null image handle carried by an [`AcquiredImage`].
///
/// Producers hand out `AHardwareBuffer*`; after the EGL transform the same
/// slot carries an `EGLImageKHR`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(NonNull<c_void>);

impl ImageHandle {
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub const fn from_non_null(ptr: NonNull<c_void>) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

impl From<BufferHandle> for ImageHandle {
    fn from(buffer: BufferHandle) -> Self {
        Self(buffer.as_non_null())
    }
}

/// A producer image handle is the `AHardwareBuffer*` it lends.
impl From<ImageHandle> for BufferHandle {
    fn from(image: ImageHandle) -> Self {
        BufferHandle::from_non_null(image.0)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageHandle({:p})", self.0)
    }
}

// SAFETY: opaque token, never dereferenced here.
unsafe impl Send for ImageHandle {}
unsafe impl Sync for ImageHandle {}

/// Opaque dispatch handler (the producer's `CallbackHandler*`).
///
/// Passed through unchanged; may be null.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DispatchHandler(*mut c_void);

impl DispatchHandler {
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

impl Default for DispatchHandler {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Debug for DispatchHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DispatchHandler({:p})", self.0)
    }
}

// SAFETY: opaque token owned by the producer; never dereferenced here.
unsafe impl Send for DispatchHandler {}
unsafe impl Sync for DispatchHandler {}

type BoxedRelease = Box<dyn FnOnce(ImageHandle) + Send>;
type DetachedRelease = Box<dyn FnOnce() + Send>;

enum Callback {
    Raw {
        callback: RawReleaseFn,
        user_data: *mut c_void,
    },
    Boxed(BoxedRelease),
    Detached(DetachedRelease),
}

/// One-shot release callback.
///
/// A default-constructed `ImageRelease` is disarmed and does nothing.
#[derive(Default)]
pub struct ImageRelease {
    callback: Option<Callback>,
}

// SAFETY: the producer contract allows the release callback to run on any
// thread (typically the GPU driver's completion thread); `user_data` is only
// handed back to that callback.
unsafe impl Send for ImageRelease {}

impl ImageRelease {
    /// Wrap a C producer callback.
    ///
    /// # Safety
    ///
    /// `callback` must be safe to call once, from any thread, with the image
    /// handle it will be fired with and `user_data`.
    pub unsafe fn from_raw(callback: RawReleaseFn, user_data: *mut c_void) -> Self {
        Self {
            callback: Some(Callback::Raw {
                callback,
                user_data,
            }),
        }
    }

    pub fn new(release: impl FnOnce(ImageHandle) + Send + 'static) -> Self {
        Self {
            callback: Some(Callback::Boxed(Box::new(release))),
        }
    }

    /// A release that does not look at the image it is fired with.
    ///
    /// Unlike [`new`](Self::new), its raw pair still runs when a driver
    /// fires it with a null image.
    pub fn detached(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            callback: Some(Callback::Detached(Box::new(release))),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.callback.is_some()
    }

    /// Run the callback with `image`.
    pub fn fire(mut self, image: ImageHandle) {
        match self.callback.take() {
            Some(Callback::Raw {
                callback,
                user_data,
            }) => {
                // SAFETY: `from_raw` contract; the callback is taken out of
                // `self`, so it runs at most once.
                unsafe { callback(image.as_ptr(), user_data) }
            }
            Some(Callback::Boxed(release)) => release(image),
            Some(Callback::Detached(release)) => release(),
            None => {}
        }
    }

    /// Lower into a C callback pair for a driver that only speaks the C
    /// contract.
    ///
    /// Boxed callbacks are moved onto the heap behind a trampoline that frees
    /// them on invocation. The returned pair must be invoked exactly once;
    /// never invoking it leaks the boxed callback.
    pub fn into_raw(mut self) -> (RawReleaseFn, *mut c_void) {
        match self.callback.take() {
            Some(Callback::Raw {
                callback,
                user_data,
            }) => (callback, user_data),
            Some(Callback::Boxed(release)) => {
                let user_data = Box::into_raw(Box::new(release)) as *mut c_void;
                (boxed_trampoline, user_data)
            }
            Some(Callback::Detached(release)) => {
                let user_data = Box::into_raw(Box::new(release)) as *mut c_void;
                (detached_trampoline, user_data)
            }
            None => (noop_release, std::ptr::null_mut()),
        }
    }
}

impl Drop for ImageRelease {
    fn drop(&mut self) {
        if self.callback.is_some() {
            tracing::warn!("ImageRelease dropped without firing");
        }
    }
}

impl fmt::Debug for ImageRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.callback {
            Some(Callback::Raw { .. }) => "raw",
            Some(Callback::Boxed(_)) => "boxed",
            Some(Callback::Detached(_)) => "detached",
            None => "disarmed",
        };
        f.debug_struct("ImageRelease").field("callback", &kind).finish()
    }
}

unsafe extern "C" fn boxed_trampoline(image: *mut c_void, user_data: *mut c_void) {
    // SAFETY: `user_data` was produced by `into_raw` from a `Box<BoxedRelease>`
    // and the pair is invoked exactly once.
    let release = unsafe { Box::from_raw(user_data as *mut BoxedRelease) };
    match ImageHandle::from_ptr(image) {
        Some(image) => release(image),
        None => tracing::error!("Release trampoline invoked with a null image; callback dropped"),
    }
}

unsafe extern "C" fn detached_trampoline(_image: *mut c_void, user_data: *mut c_void) {
    // SAFETY: `user_data` was produced by `into_raw` from a
    // `Box<DetachedRelease>` and the pair is invoked exactly once.
    let release = unsafe { Box::from_raw(user_data as *mut DetachedRelease) };
    release();
}

unsafe extern "C" fn noop_release(_image: *mut c_void, _user_data: *mut c_void) {}

/// An image lent by a producer, with its release obligation.
///
/// Dropping an `AcquiredImage` that was neither released nor split with
/// [`into_parts`](Self::into_parts) fires the release, so the producer always
/// gets its buffer back.
pub struct AcquiredImage {
    image: ImageHandle,
    release: ImageRelease,
    handler: DispatchHandler,
}

impl AcquiredImage {
    pub fn new(image: ImageHandle, release: ImageRelease, handler: DispatchHandler) -> Self {
        Self {
            image,
            release,
            handler,
        }
    }

    /// Build from the C producer contract.
    ///
    /// # Safety
    ///
    /// Same contract as [`ImageRelease::from_raw`].
    pub unsafe fn from_raw(
        image: ImageHandle,
        callback: RawReleaseFn,
        user_data: *mut c_void,
        handler: DispatchHandler,
    ) -> Self {
        // SAFETY: forwarded contract.
        let release = unsafe { ImageRelease::from_raw(callback, user_data) };
        Self::new(image, release, handler)
    }

    pub fn image(&self) -> ImageHandle {
        self.image
    }

    pub fn handler(&self) -> DispatchHandler {
        self.handler
    }

    /// Return the image to its producer.
    pub fn release(mut self) {
        let release = std::mem::take(&mut self.release);
        release.fire(self.image);
    }

    /// Split into parts. The caller takes over the release obligation.
    pub fn into_parts(mut self) -> (ImageHandle, ImageRelease, DispatchHandler) {
        let release = std::mem::take(&mut self.release);
        (self.image, release, self.handler)
    }
}

impl Drop for AcquiredImage {
    fn drop(&mut self) {
        if self.release.is_armed() {
            tracing::warn!(image = ?self.image, "AcquiredImage dropped unreleased; releasing now");
            std::mem::take(&mut self.release).fire(self.image);
        }
    }
}

impl fmt::Debug for AcquiredImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcquiredImage")
            .field("image", &self.image)
            .field("release", &self.release)
            .field("handler", &self.handler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn handle(slot: &mut u64) -> ImageHandle {
        ImageHandle::from_ptr(slot as *mut u64 as *mut c_void).unwrap()
    }

    unsafe extern "C" fn count_release(_image: *mut c_void, user_data: *mut c_void) {
        let counter = unsafe { &*(user_data as *const AtomicUsize) };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_raw_release_fires_once_with_user_data() {
        let counter = AtomicUsize::new(0);
        let mut slot = 0u64;
        let image = unsafe {
            AcquiredImage::from_raw(
                handle(&mut slot),
                count_release,
                &counter as *const AtomicUsize as *mut c_void,
                DispatchHandler::NONE,
            )
        };

        image.release();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_boxed_release_receives_original_image() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut slot = 0u64;
        let h = handle(&mut slot);

        let sink = Arc::clone(&seen);
        let image = AcquiredImage::new(
            h,
            ImageRelease::new(move |img| sink.lock().push(img)),
            DispatchHandler::NONE,
        );
        image.release();

        assert_eq!(*seen.lock(), vec![h]);
    }

    #[test]
    fn test_drop_unreleased_image_fires_release() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut slot = 0u64;
        {
            let f = Arc::clone(&fired);
            let _image = AcquiredImage::new(
                handle(&mut slot),
                ImageRelease::new(move |_| {
                    f.fetch_add(1, Ordering::SeqCst);
                }),
                DispatchHandler::NONE,
            );
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_into_parts_disarms_image() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut slot = 0u64;
        let f = Arc::clone(&fired);
        let image = AcquiredImage::new(
            handle(&mut slot),
            ImageRelease::new(move |_| {
                f.fetch_add(1, Ordering::SeqCst);
            }),
            DispatchHandler::from_ptr(0x40 as *mut c_void),
        );

        let (img, release, handler) = image.into_parts();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(handler.as_ptr() as usize, 0x40);

        release.fire(img);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_boxed_release_lowers_to_raw_pair() {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        let release = ImageRelease::new(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });

        let (callback, user_data) = release.into_raw();
        let mut slot = 0u64;
        unsafe { callback(handle(&mut slot).as_ptr(), user_data) };

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detached_release_runs_for_null_image() {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        let release = ImageRelease::detached(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        assert!(release.is_armed());

        let (callback, user_data) = release.into_raw();
        unsafe { callback(std::ptr::null_mut(), user_data) };

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detached_release_fires_directly() {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        let mut slot = 0u64;
        ImageRelease::detached(move || {
            f.fetch_add(1, Ordering::SeqCst);
        })
        .fire(handle(&mut slot));

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_release_is_disarmed() {
        let release = ImageRelease::default();
        assert!(!release.is_armed());
        let mut slot = 0u64;
        release.fire(handle(&mut slot));
    }
}
