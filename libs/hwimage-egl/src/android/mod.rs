// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Android back-ends: system properties and the NDK-backed [`ImageOps`].

use std::ffi::{CStr, CString, c_char};

use hwimage_abi::{BufferHandle, HardwareBufferDesc, HardwareBufferFormat, HardwareBufferUsage};

use crate::error::Result;
use crate::extensions::ExtensionTable;
use crate::handles::{ClientBuffer, DisplayHandle, DriverImage};
use crate::ops::ImageOps;

/// `__system_property_get`. `None` when the property is unset or the name is
/// not a valid C string.
pub fn system_property(name: &str) -> Option<String> {
    let name = CString::new(name).ok()?;
    let mut value = [0 as c_char; libc::PROP_VALUE_MAX as usize + 1];
    // SAFETY: `value` holds PROP_VALUE_MAX bytes plus a terminator.
    let len = unsafe { libc::__system_property_get(name.as_ptr(), value.as_mut_ptr()) };
    if len <= 0 {
        return None;
    }
    // SAFETY: the property API always NUL-terminates within PROP_VALUE_MAX.
    let value = unsafe { CStr::from_ptr(value.as_ptr()) };
    Some(value.to_string_lossy().into_owned())
}

/// [`ImageOps`] over `AHardwareBuffer_describe` and the resolved EGL image
/// entry points.
#[derive(Debug, Clone, Copy)]
pub struct EglImageBridge {
    extensions: ExtensionTable,
}

impl EglImageBridge {
    pub fn new(extensions: ExtensionTable) -> Self {
        Self { extensions }
    }
}

impl ImageOps for EglImageBridge {
    fn describe(&self, buffer: BufferHandle) -> HardwareBufferDesc {
        // SAFETY: plain C struct; all-zero is a valid value.
        let mut desc: ndk_sys::AHardwareBuffer_Desc = unsafe { std::mem::zeroed() };
        // SAFETY: `buffer` is a live AHardwareBuffer for the duration of the call.
        unsafe {
            ndk_sys::AHardwareBuffer_describe(
                buffer.as_ptr() as *const ndk_sys::AHardwareBuffer,
                &mut desc,
            );
        }
        HardwareBufferDesc {
            width: desc.width,
            height: desc.height,
            layers: desc.layers,
            format: HardwareBufferFormat(desc.format),
            usage: HardwareBufferUsage::from_bits_retain(desc.usage),
            stride: desc.stride,
        }
    }

    fn native_client_buffer(&self, buffer: BufferHandle) -> Result<ClientBuffer> {
        self.extensions.native_client_buffer(buffer)
    }

    fn create_image(
        &self,
        display: DisplayHandle,
        buffer: ClientBuffer,
        attribs: &[i32],
    ) -> Result<DriverImage> {
        self.extensions.create_image(display, buffer, attribs)
    }

    fn destroy_image(&self, display: DisplayHandle, image: DriverImage) -> bool {
        self.extensions.destroy_image(display, image)
    }
}
