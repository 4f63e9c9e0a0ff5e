//! Recording back-ends shared by the integration tests.
//!
//! Every fake appends to one [`Journal`], so tests can assert on the
//! interleaving of base-platform, EGL, GL, hint and stream calls.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::ffi::c_void;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use hwimage_egl::hwimage_abi::{
    AcquiredImage, BufferHandle, DispatchHandler, HardwareBufferDesc, HardwareBufferFormat,
    HardwareBufferUsage, ImageHandle, ImageRelease,
};
use hwimage_egl::{
    ClientBuffer, ContextHandle, DisplayHandle, DriverImage, EglEntryPoints, EglPlatform, GlOps,
    HintSession, ImageOps, MonotonicClock, NativeStream, OsVersion, PerformanceHintManager,
    PlatformBuilder, PlatformConfig, PlatformError, Result, StreamHandle, StreamRegistry,
    SurfaceHandle, ThreadRegistration,
};

pub const DISPLAY: usize = 0xD150;
pub const SURFACE: usize = 0x5F00;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BaseCreateDriver,
    BaseBeginFrame {
        monotonic_clock_ns: i64,
        refresh_interval_ns: i64,
        frame_id: u32,
    },
    BasePreCommit,
    BaseTerminate,
    ProcAddress(String),
    ClientBuffer(usize),
    CreateImage {
        image: usize,
        attribs: Vec<i32>,
    },
    DestroyImage(usize),
    GenTexture(u32),
    DeleteTexture(u32),
    ActiveTexture(u32),
    BindTexture(u32, u32),
    ImageTarget(u32, usize),
    TexParameter(u32, u32, i32),
    GenerateMipmap(u32),
    HintSession {
        thread_ids: Vec<i32>,
        initial_target_ns: i64,
    },
    HintTarget(i64),
    HintActual(i64),
    Registered,
    StreamAcquire(usize),
    StreamRelease(usize),
    StreamAttach(usize, isize),
    StreamDetach(usize),
    StreamUpdate(usize),
    StreamShutdown,
    ProducerReleased(usize),
}

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub fn push(&self, event: Event) {
        self.0.lock().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.0.lock().iter().filter(|e| pred(e)).count()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.0.lock().iter().position(|e| e == event)
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

// =============================================================================
// Base platform
// =============================================================================

pub struct FakeBase {
    pub journal: Journal,
    pub fail_create: bool,
}

impl EglPlatform for FakeBase {
    type Driver = &'static str;
    type DriverConfig = ();

    fn create_driver(&mut self, _shared_context: ContextHandle, _config: &()) -> Result<&'static str> {
        self.journal.push(Event::BaseCreateDriver);
        if self.fail_create {
            return Err(PlatformError::DriverCreation("no EGL config".into()));
        }
        Ok("gl-driver")
    }

    fn display(&self) -> DisplayHandle {
        DisplayHandle::from_ptr(DISPLAY as *mut c_void)
    }

    fn begin_frame(&mut self, monotonic_clock_ns: i64, refresh_interval_ns: i64, frame_id: u32) {
        self.journal.push(Event::BaseBeginFrame {
            monotonic_clock_ns,
            refresh_interval_ns,
            frame_id,
        });
    }

    fn pre_commit(&mut self) {
        self.journal.push(Event::BasePreCommit);
    }

    fn terminate(&mut self) {
        self.journal.push(Event::BaseTerminate);
    }
}

// =============================================================================
// EGL entry points
// =============================================================================

pub static LAST_PRESENTATION_NS: AtomicI64 = AtomicI64::new(0);

pub unsafe extern "C" fn fake_presentation_time(
    _display: *mut c_void,
    _surface: *mut c_void,
    time_ns: i64,
) -> u32 {
    LAST_PRESENTATION_NS.store(time_ns, Ordering::SeqCst);
    1
}

pub struct FakeEgl {
    pub journal: Journal,
    pub extensions: String,
    pub surface: bool,
}

impl FakeEgl {
    pub fn new(journal: &Journal, extensions: &str) -> Self {
        Self {
            journal: journal.clone(),
            extensions: extensions.to_string(),
            surface: true,
        }
    }
}

// SAFETY: returns null or a function with the named entry point's signature.
unsafe impl EglEntryPoints for FakeEgl {
    fn proc_address(&self, name: &str) -> Option<*const c_void> {
        self.journal.push(Event::ProcAddress(name.to_string()));
        match name {
            "eglPresentationTimeANDROID" => Some(fake_presentation_time as *const c_void),
            _ => None,
        }
    }

    fn extensions(&self, display: DisplayHandle) -> String {
        assert_eq!(display.as_ptr() as usize, DISPLAY);
        self.extensions.clone()
    }

    fn current_draw_surface(&self) -> Option<SurfaceHandle> {
        self.surface
            .then(|| SurfaceHandle::from_ptr(SURFACE as *mut c_void))
            .flatten()
    }
}

// =============================================================================
// Image and GL back-ends
// =============================================================================

pub struct FakeImages {
    pub journal: Journal,
    pub format: HardwareBufferFormat,
    pub usage: HardwareBufferUsage,
    pub client_available: bool,
    pub accept_images: bool,
    pub describes: AtomicUsize,
    next_image: AtomicUsize,
}

impl FakeImages {
    pub fn new(journal: &Journal, format: HardwareBufferFormat) -> Self {
        Self {
            journal: journal.clone(),
            format,
            usage: HardwareBufferUsage::GPU_SAMPLED_IMAGE,
            client_available: true,
            accept_images: true,
            describes: AtomicUsize::new(0),
            next_image: AtomicUsize::new(0xE000),
        }
    }
}

impl ImageOps for FakeImages {
    fn describe(&self, _buffer: BufferHandle) -> HardwareBufferDesc {
        self.describes.fetch_add(1, Ordering::SeqCst);
        HardwareBufferDesc {
            width: 1920,
            height: 1080,
            layers: 1,
            format: self.format,
            usage: self.usage,
            stride: 1920,
        }
    }

    fn native_client_buffer(&self, buffer: BufferHandle) -> Result<ClientBuffer> {
        if !self.client_available {
            return Err(PlatformError::NativeBufferUnavailable(
                "eglGetNativeClientBufferANDROID returned null".into(),
            ));
        }
        self.journal.push(Event::ClientBuffer(buffer.as_ptr() as usize));
        Ok(ClientBuffer::from_ptr(buffer.as_ptr()).unwrap())
    }

    fn create_image(
        &self,
        display: DisplayHandle,
        _buffer: ClientBuffer,
        attribs: &[i32],
    ) -> Result<DriverImage> {
        assert_eq!(display.as_ptr() as usize, DISPLAY);
        if !self.accept_images {
            return Err(PlatformError::ImageCreationFailed(
                "eglCreateImageKHR returned EGL_NO_IMAGE_KHR".into(),
            ));
        }
        let image = self.next_image.fetch_add(0x10, Ordering::SeqCst);
        self.journal.push(Event::CreateImage {
            image,
            attribs: attribs.to_vec(),
        });
        Ok(DriverImage::from_ptr(image as *mut c_void).unwrap())
    }

    fn destroy_image(&self, display: DisplayHandle, image: DriverImage) -> bool {
        assert_eq!(display.as_ptr() as usize, DISPLAY);
        self.journal.push(Event::DestroyImage(image.as_ptr() as usize));
        true
    }
}

pub struct FakeGl {
    pub journal: Journal,
    pub name: u32,
    pub errors: VecDeque<u32>,
}

impl FakeGl {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            name: 42,
            errors: VecDeque::new(),
        }
    }
}

impl GlOps for FakeGl {
    fn gen_texture(&mut self) -> u32 {
        self.journal.push(Event::GenTexture(self.name));
        self.name
    }
    fn delete_texture(&mut self, name: u32) {
        self.journal.push(Event::DeleteTexture(name));
    }
    fn active_texture(&mut self, unit: u32) {
        self.journal.push(Event::ActiveTexture(unit));
    }
    fn bind_texture(&mut self, target: u32, name: u32) {
        self.journal.push(Event::BindTexture(target, name));
    }
    fn image_target_texture(&mut self, target: u32, image: &DriverImage) {
        self.journal
            .push(Event::ImageTarget(target, image.as_ptr() as usize));
    }
    fn tex_parameter(&mut self, target: u32, pname: u32, param: i32) {
        self.journal.push(Event::TexParameter(target, pname, param));
    }
    fn generate_mipmap(&mut self, target: u32) {
        self.journal.push(Event::GenerateMipmap(target));
    }
    fn get_error(&mut self) -> u32 {
        self.errors.pop_front().unwrap_or(0)
    }
}

// =============================================================================
// Hints, clock, registration
// =============================================================================

pub struct FakeHints {
    pub journal: Journal,
    pub supported: bool,
}

struct FakeSession {
    journal: Journal,
}

impl HintSession for FakeSession {
    fn is_valid(&self) -> bool {
        true
    }
    fn update_target_work_duration(&mut self, target_ns: i64) {
        self.journal.push(Event::HintTarget(target_ns));
    }
    fn report_actual_work_duration(&mut self, actual_ns: i64) {
        self.journal.push(Event::HintActual(actual_ns));
    }
}

impl PerformanceHintManager for FakeHints {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create_session(&self, thread_ids: &[i32], initial_target_ns: i64) -> Box<dyn HintSession> {
        if !self.supported {
            return Box::new(hwimage_egl::InvalidHintSession);
        }
        self.journal.push(Event::HintSession {
            thread_ids: thread_ids.to_vec(),
            initial_target_ns,
        });
        Box::new(FakeSession {
            journal: self.journal.clone(),
        })
    }
}

#[derive(Clone, Default)]
pub struct ManualClock(pub Arc<Mutex<i64>>);

impl ManualClock {
    pub fn set(&self, ns: i64) {
        *self.0.lock() = ns;
    }
}

impl MonotonicClock for ManualClock {
    fn now_ns(&self) -> i64 {
        *self.0.lock()
    }
}

pub struct FakeRegistration {
    pub journal: Journal,
}

impl ThreadRegistration for FakeRegistration {
    fn ensure_registered(&self) -> Result<()> {
        self.journal.push(Event::Registered);
        Ok(())
    }
}

// =============================================================================
// Streams
// =============================================================================

pub struct FakeStreams {
    pub journal: Journal,
}

impl StreamRegistry for FakeStreams {
    fn acquire(&mut self, native: NativeStream) -> Option<StreamHandle> {
        self.journal
            .push(Event::StreamAcquire(native.as_ptr() as usize));
        StreamHandle::from_ptr(native.as_ptr())
    }
    fn release(&mut self, stream: StreamHandle) {
        self.journal
            .push(Event::StreamRelease(stream.as_ptr() as usize));
    }
    fn attach(&mut self, stream: StreamHandle, texture_name: isize) {
        self.journal
            .push(Event::StreamAttach(stream.as_ptr() as usize, texture_name));
    }
    fn detach(&mut self, stream: StreamHandle) {
        self.journal
            .push(Event::StreamDetach(stream.as_ptr() as usize));
    }
    fn update_tex_image(&mut self, stream: StreamHandle) -> Option<i64> {
        self.journal
            .push(Event::StreamUpdate(stream.as_ptr() as usize));
        Some(33_333_333)
    }
    fn shutdown(&mut self) {
        self.journal.push(Event::StreamShutdown);
    }
}

// =============================================================================
// Helpers
// =============================================================================

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hwimage_egl=trace")),
        )
        .with_test_writer()
        .try_init();
}

/// Builder with every collaborator faked. Images are RGBA unless replaced.
pub fn builder(journal: &Journal, clock: &ManualClock) -> PlatformBuilder<FakeBase> {
    init_tracing();
    PlatformBuilder::new(FakeBase {
        journal: journal.clone(),
        fail_create: false,
    })
    .config(PlatformConfig::default())
    .egl(Box::new(FakeEgl::new(journal, "EGL_KHR_image_base")))
    .hint_manager(Box::new(FakeHints {
        journal: journal.clone(),
        supported: true,
    }))
    .thread_registration(Box::new(FakeRegistration {
        journal: journal.clone(),
    }))
    .clock(Box::new(clock.clone()))
    .stream_registry(Box::new(FakeStreams {
        journal: journal.clone(),
    }))
    .image_ops(Arc::new(FakeImages::new(
        journal,
        HardwareBufferFormat::R8G8B8A8_UNORM,
    )))
    .gl_ops(Box::new(FakeGl::new(journal)))
    .os_version(OsVersion::from_api_level(34))
}

/// Producer image over a fake `AHardwareBuffer*` at `addr` whose release
/// records [`Event::ProducerReleased`].
pub fn producer_image(journal: &Journal, addr: usize) -> AcquiredImage {
    let sink = journal.clone();
    AcquiredImage::new(
        ImageHandle::from_ptr(addr as *mut c_void).unwrap(),
        ImageRelease::new(move |image| {
            sink.push(Event::ProducerReleased(image.as_ptr() as usize));
        }),
        DispatchHandler::from_ptr(0xCA11 as *mut c_void),
    )
}

pub fn buffer(addr: usize) -> BufferHandle {
    BufferHandle::from_ptr(addr as *mut c_void).unwrap()
}
