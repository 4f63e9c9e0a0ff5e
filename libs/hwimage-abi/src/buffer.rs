// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! `AHardwareBuffer` handle and descriptor types.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

/// Non-null `AHardwareBuffer*`.
///
/// The handle is borrowed: hwimage never acquires or releases a reference on
/// the underlying buffer. The producer keeps it alive until its release
/// callback fires.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(NonNull<c_void>);

impl BufferHandle {
    /// Wrap a raw `AHardwareBuffer*`. Returns `None` for null.
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub const fn from_non_null(ptr: NonNull<c_void>) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    pub fn as_non_null(self) -> NonNull<c_void> {
        self.0
    }
}

impl fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferHandle({:p})", self.0)
    }
}

// SAFETY: the handle is an opaque token. AHardwareBuffer references are
// documented as usable from any thread; this type never dereferences it.
unsafe impl Send for BufferHandle {}
unsafe impl Sync for BufferHandle {}

/// `AHARDWAREBUFFER_FORMAT_*` value.
///
/// A newtype rather than an enum: vendors ship undocumented formats (e.g.
/// `YCbCr_420_SP_VENUS_UBWC`) and every value must survive the round trip
/// through `AHardwareBuffer_describe`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HardwareBufferFormat(pub u32);

impl HardwareBufferFormat {
    pub const R8G8B8A8_UNORM: Self = Self(1);
    pub const R8G8B8X8_UNORM: Self = Self(2);
    pub const R8G8B8_UNORM: Self = Self(3);
    pub const R5G6B5_UNORM: Self = Self(4);
    pub const R16G16B16A16_FLOAT: Self = Self(0x16);
    pub const R10G10B10A2_UNORM: Self = Self(0x2b);
    pub const BLOB: Self = Self(0x21);
    pub const Y8CB8CR8_420: Self = Self(0x23);
    pub const D16_UNORM: Self = Self(0x30);
    pub const D24_UNORM: Self = Self(0x31);
    pub const D24_UNORM_S8_UINT: Self = Self(0x32);
    pub const D32_FLOAT: Self = Self(0x33);
    pub const D32_FLOAT_S8_UINT: Self = Self(0x34);
    pub const S8_UINT: Self = Self(0x35);
    pub const YCBCR_P010: Self = Self(0x36);
    pub const R8_UNORM: Self = Self(0x38);

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Symbolic name for logging. `None` for values without a public NDK name.
    pub const fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            1 => "R8G8B8A8_UNORM",
            2 => "R8G8B8X8_UNORM",
            3 => "R8G8B8_UNORM",
            4 => "R5G6B5_UNORM",
            0x16 => "R16G16B16A16_FLOAT",
            0x2b => "R10G10B10A2_UNORM",
            0x21 => "BLOB",
            0x23 => "Y8Cb8Cr8_420",
            0x30 => "D16_UNORM",
            0x31 => "D24_UNORM",
            0x32 => "D24_UNORM_S8_UINT",
            0x33 => "D32_FLOAT",
            0x34 => "D32_FLOAT_S8_UINT",
            0x35 => "S8_UINT",
            0x36 => "YCbCr_P010",
            0x38 => "R8_UNORM",
            _ => return None,
        })
    }
}

impl fmt::Debug for HardwareBufferFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "0x{:x}", self.0),
        }
    }
}

bitflags::bitflags! {
    /// `AHARDWAREBUFFER_USAGE_*` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HardwareBufferUsage: u64 {
        const CPU_READ_RARELY = 2;
        const CPU_READ_OFTEN = 3;
        const CPU_WRITE_RARELY = 2 << 4;
        const CPU_WRITE_OFTEN = 3 << 4;
        const GPU_SAMPLED_IMAGE = 1 << 8;
        const GPU_FRAMEBUFFER = 1 << 9;
        const COMPOSER_OVERLAY = 1 << 11;
        const PROTECTED_CONTENT = 1 << 14;
        const VIDEO_ENCODE = 1 << 16;
        const SENSOR_DIRECT_DATA = 1 << 23;
        const GPU_DATA_BUFFER = 1 << 24;
        const GPU_CUBE_MAP = 1 << 25;
        const GPU_MIPMAP_COMPLETE = 1 << 26;

        // Vendor bits are preserved as-is.
        const _ = !0;
    }
}

/// Mirror of `AHardwareBuffer_Desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HardwareBufferDesc {
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub format: HardwareBufferFormat,
    pub usage: HardwareBufferUsage,
    pub stride: u32,
}

impl Default for HardwareBufferFormat {
    fn default() -> Self {
        Self::R8G8B8A8_UNORM
    }
}

impl HardwareBufferDesc {
    pub fn is_protected(&self) -> bool {
        self.usage.contains(HardwareBufferUsage::PROTECTED_CONTENT)
    }
}
