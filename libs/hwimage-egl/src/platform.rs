// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Android EGL platform.
//!
//! [`PlatformEglAndroid`] wraps a generic [`EglPlatform`] (context, surface
//! and swap management) and adds what is Android-specific: hardware buffer
//! import, deferred image release, performance hints, presentation time and
//! external streams.

use std::sync::Arc;

use hwimage_abi::{AcquiredImage, BufferHandle};

use crate::config::PlatformConfig;
use crate::error::{PlatformError, Result};
use crate::extensions::{ExtensionSet, ExtensionTable};
use crate::format::SamplingTarget;
use crate::handles::{ContextHandle, DisplayHandle};
use crate::hint::{NdkPerformanceHint, NoThreadRegistration, PerformanceHintManager, ThreadRegistration};
use crate::image::{ImageRequest, acquire_described_image, acquire_image};
use crate::ops::{EglEntryPoints, GlOps, ImageOps};
use crate::pacing::{FramePacer, MonotonicClock, SystemMonotonicClock};
use crate::release::DeferredRelease;
use crate::stream::{ExternalStreams, NativeStream, Stream, StreamRegistry};
use crate::system::{
    ANGLE_FEATURE_OVERRIDES_DISABLED, Capabilities, OsVersion, current_thread_id, set_env_default,
};
use crate::texture::{ExternalTexture, bind_external_texture, destroy_external_texture};

/// Cross-platform EGL platform this one extends.
pub trait EglPlatform {
    type Driver;
    type DriverConfig;

    /// Create the display, context and driver. Leaves [`display`](Self::display)
    /// initialized on success.
    fn create_driver(
        &mut self,
        shared_context: ContextHandle,
        config: &Self::DriverConfig,
    ) -> Result<Self::Driver>;

    fn display(&self) -> DisplayHandle;

    fn begin_frame(&mut self, monotonic_clock_ns: i64, refresh_interval_ns: i64, frame_id: u32);

    fn pre_commit(&mut self);

    fn terminate(&mut self);
}

/// Builder for [`PlatformEglAndroid`].
///
/// Every collaborator has a production default; tests inject fakes.
pub struct PlatformBuilder<B> {
    base: B,
    config: PlatformConfig,
    egl: Option<Box<dyn EglEntryPoints>>,
    hints: Option<Box<dyn PerformanceHintManager>>,
    registration: Box<dyn ThreadRegistration>,
    clock: Box<dyn MonotonicClock>,
    streams: Option<Box<dyn StreamRegistry>>,
    images: Option<Arc<dyn ImageOps>>,
    gl: Option<Box<dyn GlOps>>,
    os_version: Option<OsVersion>,
}

impl<B: EglPlatform> PlatformBuilder<B> {
    pub fn new(base: B) -> Self {
        Self {
            base,
            config: PlatformConfig::default(),
            egl: None,
            hints: None,
            registration: Box::new(NoThreadRegistration),
            clock: Box::new(SystemMonotonicClock),
            streams: None,
            images: None,
            gl: None,
            os_version: None,
        }
    }

    pub fn config(mut self, config: PlatformConfig) -> Self {
        self.config = config;
        self
    }

    pub fn egl(mut self, egl: Box<dyn EglEntryPoints>) -> Self {
        self.egl = Some(egl);
        self
    }

    pub fn hint_manager(mut self, hints: Box<dyn PerformanceHintManager>) -> Self {
        self.hints = Some(hints);
        self
    }

    pub fn thread_registration(mut self, registration: Box<dyn ThreadRegistration>) -> Self {
        self.registration = registration;
        self
    }

    pub fn clock(mut self, clock: Box<dyn MonotonicClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn stream_registry(mut self, registry: Box<dyn StreamRegistry>) -> Self {
        self.streams = Some(registry);
        self
    }

    /// Replace the EGL image back-end installed by `create_driver`.
    pub fn image_ops(mut self, images: Arc<dyn ImageOps>) -> Self {
        self.images = Some(images);
        self
    }

    /// Replace the GLES back-end installed by `create_driver`.
    pub fn gl_ops(mut self, gl: Box<dyn GlOps>) -> Self {
        self.gl = Some(gl);
        self
    }

    pub fn os_version(mut self, version: OsVersion) -> Self {
        self.os_version = Some(version);
        self
    }

    pub fn build(self) -> Result<PlatformEglAndroid<B>> {
        self.config.validate()?;

        // Must precede context creation.
        if self.config.disable_angle_submit_at_fbo_boundary {
            let (key, value) = ANGLE_FEATURE_OVERRIDES_DISABLED;
            set_env_default(key, value);
        }

        let egl: Box<dyn EglEntryPoints> = match self.egl {
            Some(egl) => egl,
            None => Box::new(crate::egl_runtime::KhronosEgl::load()?),
        };

        let hints: Box<dyn PerformanceHintManager> = match self.hints {
            Some(hints) => hints,
            None => Box::new(NdkPerformanceHint::load()),
        };
        if hints.is_supported() {
            if let Err(e) = self.registration.ensure_registered() {
                tracing::warn!("Thread registration for performance hints failed: {}", e);
            }
        }

        let os_version = self.os_version.unwrap_or_else(OsVersion::detect);
        let capabilities = Capabilities::for_version(os_version);
        tracing::debug!(api_level = os_version.api_level(), ?capabilities, "Android EGL platform created");

        Ok(PlatformEglAndroid {
            base: self.base,
            pacer: FramePacer::new(self.clock, self.config.default_frame_interval_ns),
            config: self.config,
            egl,
            hints,
            streams: self
                .streams
                .map(ExternalStreams::new)
                .unwrap_or_default(),
            extensions: ExtensionTable::default(),
            images: self.images,
            gl: self.gl,
            os_version,
            capabilities,
            terminated: false,
        })
    }
}

pub struct PlatformEglAndroid<B: EglPlatform> {
    base: B,
    config: PlatformConfig,
    egl: Box<dyn EglEntryPoints>,
    hints: Box<dyn PerformanceHintManager>,
    pacer: FramePacer,
    streams: ExternalStreams,
    extensions: ExtensionTable,
    images: Option<Arc<dyn ImageOps>>,
    gl: Option<Box<dyn GlOps>>,
    os_version: OsVersion,
    capabilities: Capabilities,
    terminated: bool,
}

impl<B: EglPlatform> PlatformEglAndroid<B> {
    pub fn builder(base: B) -> PlatformBuilder<B> {
        PlatformBuilder::new(base)
    }

    /// Create the driver on the calling thread, which becomes the hinted
    /// render thread.
    pub fn create_driver(
        &mut self,
        shared_context: ContextHandle,
        driver_config: &B::DriverConfig,
    ) -> Result<B::Driver> {
        // The initial target is replaced on the first begin_frame.
        let tid = current_thread_id();
        let session = self
            .hints
            .create_session(&[tid], self.config.initial_target_duration_ns);
        self.pacer.set_session(session);

        let driver = self
            .base
            .create_driver(shared_context, driver_config)
            .inspect_err(|e| tracing::error!("Base EGL platform failed to create driver: {}", e))?;

        let extensions = ExtensionSet::parse(&self.egl.extensions(self.base.display()));
        let egl = &self.egl;
        // SAFETY: `EglEntryPoints` implementors return null or the named
        // entry point.
        self.extensions = unsafe { ExtensionTable::resolve(&extensions, |name| egl.proc_address(name)) };

        #[cfg(target_os = "android")]
        {
            let table = self.extensions;
            if self.images.is_none() {
                self.images = Some(Arc::new(crate::android::EglImageBridge::new(table)));
            }
            if self.gl.is_none() {
                self.gl = Some(Box::new(crate::gles::GlesTextures::load(table, |name| {
                    egl.proc_address(name)
                })));
            }
        }

        tracing::debug!(
            tid,
            extensions = extensions.len(),
            hinting = self.pacer.is_active(),
            "Created Android EGL driver"
        );
        Ok(driver)
    }

    pub fn begin_frame(&mut self, monotonic_clock_ns: i64, refresh_interval_ns: i64, frame_id: u32) {
        let interval = self.pacer.begin_frame(monotonic_clock_ns, refresh_interval_ns);
        self.base.begin_frame(monotonic_clock_ns, interval, frame_id);
    }

    pub fn pre_commit(&mut self) {
        self.pacer.pre_commit();
        self.base.pre_commit();
    }

    fn image_ops(&self) -> Result<Arc<dyn ImageOps>> {
        self.images.clone().ok_or_else(|| {
            PlatformError::NotSupported("no EGL image back-end; create the driver first".into())
        })
    }

    /// Import `buffer` as a texture on the current context.
    ///
    /// The sampling target follows the buffer format. The returned texture
    /// owns its `EGLImageKHR`; release it with
    /// [`destroy_external_image_texture`](Self::destroy_external_image_texture).
    pub fn create_external_image_texture(&mut self, buffer: BufferHandle) -> Result<ExternalTexture> {
        let images = self.image_ops()?;
        let display = self.base.display();
        let request = ImageRequest {
            srgb: self.config.srgb_external_textures,
            protected_content: self.config.protected_content,
        };

        let desc = images.describe(buffer);
        let target = SamplingTarget::for_format(desc.format);
        let image = acquire_described_image(
            images.as_ref(),
            display,
            buffer,
            &desc,
            &request,
            &self.capabilities,
        )?;

        let Some(gl) = self.gl.as_deref_mut() else {
            crate::texture::destroy_image_logged(images.as_ref(), display, image);
            return Err(PlatformError::NotSupported(
                "no GLES back-end; create the driver first".into(),
            ));
        };
        let texture = bind_external_texture(gl, images.as_ref(), display, image, target)?;
        tracing::debug!(id = texture.id(), ?target, format = ?desc.format, "Created external image texture");
        Ok(texture)
    }

    pub fn destroy_external_image_texture(&mut self, texture: ExternalTexture) {
        let display = self.base.display();
        match (self.gl.as_deref_mut(), self.images.as_deref()) {
            (Some(gl), Some(images)) => destroy_external_texture(gl, images, display, texture),
            _ => tracing::error!(?texture, "No back-end to destroy external texture; leaking it"),
        }
    }

    /// Re-express a producer image as an `EGLImageKHR` the driver can sample.
    ///
    /// The returned image's release destroys the `EGLImageKHR`, then returns
    /// the buffer to the producer. On failure the producer's release has
    /// already fired.
    pub fn transform_acquired_image(&mut self, source: AcquiredImage) -> Result<AcquiredImage> {
        let display = self.base.display();
        let request = ImageRequest {
            srgb: false,
            protected_content: self.config.protected_content,
        };

        let acquired = self.image_ops().and_then(|images| {
            let buffer = BufferHandle::from(source.image());
            acquire_image(images.as_ref(), display, buffer, &request, &self.capabilities)
                .map(|image| (images, image))
        });

        match acquired {
            Ok((images, image)) => Ok(DeferredRelease::wrap(source, image, display, images)),
            Err(e) => {
                tracing::warn!(image = ?source.image(), "Transform failed, returning buffer to producer: {}", e);
                source.release();
                Err(e)
            }
        }
    }

    /// Set the presentation time of the frame being drawn to the current
    /// draw surface. Returns `false` when there is no surface or the
    /// extension is unavailable.
    pub fn set_presentation_time(&mut self, presentation_time_ns: i64) -> bool {
        let Some(surface) = self.egl.current_draw_surface() else {
            return false;
        };
        self.extensions
            .set_presentation_time(self.base.display(), surface, presentation_time_ns)
    }

    /// `eglGetNextFrameIdANDROID` on the current draw surface.
    pub fn next_frame_id(&self) -> Option<u64> {
        let surface = self.egl.current_draw_surface()?;
        self.extensions.next_frame_id(self.base.display(), surface)
    }

    /// `eglGetFrameTimestampsANDROID` on the current draw surface.
    pub fn frame_timestamps(&self, frame_id: u64, names: &[i32]) -> Option<Vec<i64>> {
        let surface = self.egl.current_draw_surface()?;
        self.extensions
            .frame_timestamps(self.base.display(), surface, frame_id, names)
    }

    /// `eglGetCompositorTimingANDROID` on the current draw surface.
    pub fn compositor_timing(&self, names: &[i32]) -> Option<Vec<i64>> {
        let surface = self.egl.current_draw_surface()?;
        self.extensions
            .compositor_timing(self.base.display(), surface, names)
    }

    pub fn create_stream(&mut self, native: NativeStream) -> Option<Stream> {
        self.streams.create_stream(native)
    }

    pub fn destroy_stream(&mut self, stream: Stream) {
        self.streams.destroy_stream(stream);
    }

    pub fn attach(&mut self, stream: &Stream, texture_name: u32) {
        self.streams.attach(stream, texture_name);
    }

    pub fn detach(&mut self, stream: &Stream) {
        self.streams.detach(stream);
    }

    pub fn update_tex_image(&mut self, stream: &Stream) -> Option<i64> {
        self.streams.update_tex_image(stream)
    }

    /// Shut down the stream registry, then the base platform. Idempotent.
    pub fn terminate(&mut self) {
        if self.terminated {
            tracing::debug!("Android EGL platform already terminated");
            return;
        }
        self.terminated = true;
        self.streams.terminate();
        self.base.terminate();
    }

    pub fn os_version(&self) -> OsVersion {
        self.os_version
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn extensions(&self) -> &ExtensionTable {
        &self.extensions
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut B {
        &mut self.base
    }
}

impl<B: EglPlatform> std::fmt::Debug for PlatformEglAndroid<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformEglAndroid")
            .field("os_version", &self.os_version)
            .field("pacer", &self.pacer)
            .field("streams", &self.streams)
            .field("extensions", &self.extensions)
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}
