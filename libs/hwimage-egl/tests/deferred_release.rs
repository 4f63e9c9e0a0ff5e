//! Deferred release integration tests.
//!
//! A transformed image must destroy its `EGLImageKHR` before the producer's
//! release runs, exactly once, whichever thread the driver releases it on.

mod common;

use std::ffi::c_void;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{Event, FakeImages, Journal, ManualClock, builder, producer_image};
use hwimage_egl::hwimage_abi::{
    AcquiredImage, DispatchHandler, HardwareBufferFormat, HardwareBufferUsage, ImageHandle,
};
use hwimage_egl::{ContextHandle, OsVersion, PlatformError};

const EGL_IMAGE_PRESERVED_KHR: i32 = 0x30D2;
const EGL_PROTECTED_CONTENT_EXT: i32 = 0x32C0;
const EGL_NONE: i32 = 0x3038;

fn released(journal: &Journal) -> usize {
    journal.count(|e| matches!(e, Event::ProducerReleased(_)))
}

#[test]
fn test_transform_destroys_image_before_producer_release() {
    let journal = Journal::default();
    let clock = ManualClock::default();
    let mut platform = builder(&journal, &clock).build().unwrap();
    platform.create_driver(ContextHandle::NONE, &()).unwrap();
    journal.clear();

    let transformed = platform
        .transform_acquired_image(producer_image(&journal, 0xA000))
        .unwrap();

    assert_eq!(transformed.image().as_ptr() as usize, 0xE000);
    assert_eq!(transformed.handler().as_ptr() as usize, 0xCA11);
    assert_eq!(released(&journal), 0);
    assert_eq!(
        journal.count(|e| matches!(e, Event::CreateImage { .. })),
        1
    );

    transformed.release();

    let destroyed = journal.position(&Event::DestroyImage(0xE000)).unwrap();
    let returned = journal.position(&Event::ProducerReleased(0xA000)).unwrap();
    assert!(destroyed < returned, "{:?}", journal.events());
    assert_eq!(released(&journal), 1);
}

#[test]
fn test_release_from_driver_thread() {
    let journal = Journal::default();
    let clock = ManualClock::default();
    let mut platform = builder(&journal, &clock).build().unwrap();

    let transformed = platform
        .transform_acquired_image(producer_image(&journal, 0xA100))
        .unwrap();

    std::thread::spawn(move || transformed.release())
        .join()
        .unwrap();

    let events = journal.events();
    let tail = &events[events.len() - 2..];
    assert_eq!(
        tail,
        &[Event::DestroyImage(0xE000), Event::ProducerReleased(0xA100)]
    );
}

#[test]
fn test_missing_client_buffer_returns_buffer_immediately() {
    let journal = Journal::default();
    let clock = ManualClock::default();
    let mut images = FakeImages::new(&journal, HardwareBufferFormat::R8G8B8A8_UNORM);
    images.client_available = false;
    let mut platform = builder(&journal, &clock)
        .image_ops(Arc::new(images))
        .build()
        .unwrap();

    let err = platform
        .transform_acquired_image(producer_image(&journal, 0xA200))
        .unwrap_err();

    assert!(matches!(err, PlatformError::NativeBufferUnavailable(_)));
    assert_eq!(
        journal.count(|e| matches!(e, Event::CreateImage { .. })),
        0
    );
    assert_eq!(
        journal.events().last(),
        Some(&Event::ProducerReleased(0xA200))
    );
    assert_eq!(released(&journal), 1);
}

#[test]
fn test_rejected_image_returns_buffer_immediately() {
    let journal = Journal::default();
    let clock = ManualClock::default();
    let mut images = FakeImages::new(&journal, HardwareBufferFormat::R8G8B8A8_UNORM);
    images.accept_images = false;
    let mut platform = builder(&journal, &clock)
        .image_ops(Arc::new(images))
        .build()
        .unwrap();

    let err = platform
        .transform_acquired_image(producer_image(&journal, 0xA300))
        .unwrap_err();

    assert!(matches!(err, PlatformError::ImageCreationFailed(_)));
    assert_eq!(released(&journal), 1);
    assert_eq!(
        journal.count(|e| matches!(e, Event::DestroyImage(_))),
        0
    );
}

#[test]
fn test_protected_buffer_marks_transformed_image() {
    let journal = Journal::default();
    let clock = ManualClock::default();
    let mut images = FakeImages::new(&journal, HardwareBufferFormat::Y8CB8CR8_420);
    images.usage = HardwareBufferUsage::PROTECTED_CONTENT | HardwareBufferUsage::GPU_SAMPLED_IMAGE;
    let mut platform = builder(&journal, &clock)
        .image_ops(Arc::new(images))
        .os_version(OsVersion::from_api_level(29))
        .build()
        .unwrap();

    platform
        .transform_acquired_image(producer_image(&journal, 0xA400))
        .unwrap()
        .release();

    let expected = Event::CreateImage {
        image: 0xE000,
        attribs: vec![
            EGL_IMAGE_PRESERVED_KHR,
            1,
            EGL_PROTECTED_CONTENT_EXT,
            1,
            EGL_NONE,
        ],
    };
    assert!(journal.position(&expected).is_some(), "{:?}", journal.events());
}

#[test]
fn test_dropped_transformed_image_still_discharges_both() {
    let journal = Journal::default();
    let clock = ManualClock::default();
    let mut platform = builder(&journal, &clock).build().unwrap();

    drop(
        platform
            .transform_acquired_image(producer_image(&journal, 0xA500))
            .unwrap(),
    );

    assert_eq!(
        journal.count(|e| matches!(e, Event::DestroyImage(_))),
        1
    );
    assert_eq!(released(&journal), 1);
}

static C_RELEASES: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn c_producer_release(image: *mut c_void, user_data: *mut c_void) {
    if image as usize == 0xA600 && user_data as usize == 0x0DA7A {
        C_RELEASES.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_c_producer_through_c_driver() {
    let journal = Journal::default();
    let clock = ManualClock::default();
    let mut platform = builder(&journal, &clock).build().unwrap();

    let source = unsafe {
        AcquiredImage::from_raw(
            ImageHandle::from_ptr(0xA600 as *mut c_void).unwrap(),
            c_producer_release,
            0x0DA7A as *mut c_void,
            DispatchHandler::NONE,
        )
    };
    let transformed = platform.transform_acquired_image(source).unwrap();

    // A driver that only speaks the C contract.
    let (image, release, handler) = transformed.into_parts();
    assert!(handler.is_none());
    let (callback, user_data) = release.into_raw();
    unsafe { callback(image.as_ptr(), user_data) };

    assert_eq!(C_RELEASES.load(Ordering::SeqCst), 1);
    assert!(journal.position(&Event::DestroyImage(0xE000)).is_some());
}

#[test]
fn test_split_release_dropped_by_driver_still_discharges_both() {
    let journal = Journal::default();
    let clock = ManualClock::default();
    let mut platform = builder(&journal, &clock).build().unwrap();

    let transformed = platform
        .transform_acquired_image(producer_image(&journal, 0xA700))
        .unwrap();
    let (_, release, _) = transformed.into_parts();
    assert_eq!(released(&journal), 0);

    drop(release);

    let destroyed = journal.position(&Event::DestroyImage(0xE000)).unwrap();
    let returned = journal.position(&Event::ProducerReleased(0xA700)).unwrap();
    assert!(destroyed < returned, "{:?}", journal.events());
    assert_eq!(released(&journal), 1);
}

#[test]
fn test_c_driver_firing_with_null_image_still_discharges_both() {
    let journal = Journal::default();
    let clock = ManualClock::default();
    let mut platform = builder(&journal, &clock).build().unwrap();

    let transformed = platform
        .transform_acquired_image(producer_image(&journal, 0xA800))
        .unwrap();
    let (_, release, _) = transformed.into_parts();
    let (callback, user_data) = release.into_raw();
    unsafe { callback(std::ptr::null_mut(), user_data) };

    assert!(journal.position(&Event::DestroyImage(0xE000)).is_some());
    assert_eq!(
        journal.events().last(),
        Some(&Event::ProducerReleased(0xA800))
    );
    assert_eq!(released(&journal), 1);
}
