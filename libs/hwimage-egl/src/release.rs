// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Deferred release of transformed images.
//!
//! When an acquired `AHardwareBuffer` is handed to the driver as an
//! `EGLImageKHR`, the producer may only get its buffer back after that image
//! is gone. [`DeferredRelease`] carries both obligations and discharges them
//! in that order when the driver releases the transformed image, or when
//! the release is dropped without being fired.

use std::fmt;
use std::sync::Arc;

use hwimage_abi::{AcquiredImage, ImageHandle, ImageRelease};

use crate::handles::{DisplayHandle, DriverImage};
use crate::ops::ImageOps;
use crate::texture::destroy_image_logged;

struct Pending {
    source_image: ImageHandle,
    source_release: ImageRelease,
    image: DriverImage,
    display: DisplayHandle,
    ops: Arc<dyn ImageOps>,
}

/// Destroy-then-release closure for one transformed image.
///
/// Runs at most once: either through [`run`](Self::run) or on drop.
pub struct DeferredRelease {
    pending: Option<Pending>,
}

impl DeferredRelease {
    /// Re-wrap `source` so that it carries `image`.
    ///
    /// The returned image keeps the source's dispatch handler. Releasing it
    /// destroys `image`, then fires the source release with the original
    /// buffer handle.
    pub fn wrap(
        source: AcquiredImage,
        image: DriverImage,
        display: DisplayHandle,
        ops: Arc<dyn ImageOps>,
    ) -> AcquiredImage {
        let (source_image, source_release, handler) = source.into_parts();
        let handle = image.image_handle();
        let closure = Self {
            pending: Some(Pending {
                source_image,
                source_release,
                image,
                display,
                ops,
            }),
        };
        AcquiredImage::new(
            handle,
            ImageRelease::detached(move || closure.run()),
            handler,
        )
    }

    /// Destroy the driver image, then return the buffer to its producer.
    pub fn run(mut self) {
        self.discharge();
    }

    fn discharge(&mut self) {
        let Some(Pending {
            source_image,
            source_release,
            image,
            display,
            ops,
        }) = self.pending.take()
        else {
            return;
        };

        tracing::trace!(?image, buffer = ?source_image, "Running deferred release");
        destroy_image_logged(ops.as_ref(), display, image);
        source_release.fire(source_image);
    }
}

impl Drop for DeferredRelease {
    fn drop(&mut self) {
        if self.pending.is_some() {
            tracing::warn!("Deferred release dropped unfired; discharging now");
            self.discharge();
        }
    }
}

impl fmt::Debug for DeferredRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("DeferredRelease");
        match &self.pending {
            Some(p) => s
                .field("source_image", &p.source_image)
                .field("image", &p.image)
                .field("display", &p.display),
            None => s.field("discharged", &true),
        };
        s.finish_non_exhaustive()
    }
}
