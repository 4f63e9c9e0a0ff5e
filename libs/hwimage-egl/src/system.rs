// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! OS version, capabilities, and process environment.

use hwimage_abi::HardwareBufferUsage;

use crate::constants::egl;

/// Android API level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OsVersion(u32);

impl OsVersion {
    /// Reported when `ro.build.version.release` parses to 0 (preview builds).
    pub const FUTURE: Self = Self(1000);

    pub const fn from_api_level(level: u32) -> Self {
        Self(level)
    }

    pub const fn api_level(self) -> u32 {
        self.0
    }

    /// Derive the API level from `ro.build.version.release` and
    /// `ro.build.version.sdk`.
    ///
    /// Both are parsed like `atoi`. A release that parses to 0 (missing, or a
    /// codename) means a future release.
    pub fn from_properties(release: Option<&str>, sdk: Option<&str>) -> Self {
        if leading_int(release.unwrap_or("")) == 0 {
            return Self::FUTURE;
        }
        Self(leading_int(sdk.unwrap_or("")))
    }

    /// Read the running device's system properties.
    #[cfg(target_os = "android")]
    pub fn detect() -> Self {
        let release = crate::android::system_property("ro.build.version.release");
        let sdk = crate::android::system_property("ro.build.version.sdk");
        let version = Self::from_properties(release.as_deref(), sdk.as_deref());
        tracing::debug!(?release, ?sdk, api_level = version.0, "Detected OS version");
        version
    }

    /// Hosts have no system properties; report the newest release.
    #[cfg(not(target_os = "android"))]
    pub fn detect() -> Self {
        Self::FUTURE
    }
}

fn leading_int(s: &str) -> u32 {
    let digits = s.trim_start();
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().unwrap_or(0)
}

/// An `(attribute, value)` pair for `eglCreateImageKHR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageAttribute {
    pub key: i32,
    pub value: i32,
}

/// OS-gated features, evaluated once from the [`OsVersion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    protected_content: bool,
}

impl Capabilities {
    /// First API level where `AHardwareBuffer_describe` reports usage bits
    /// for the protected-content check.
    pub const PROTECTED_CONTENT_API_LEVEL: u32 = 26;

    pub fn for_version(version: OsVersion) -> Self {
        Self {
            protected_content: version.api_level() >= Self::PROTECTED_CONTENT_API_LEVEL,
        }
    }

    pub fn supports_protected_content(&self) -> bool {
        self.protected_content
    }

    /// `EGL_PROTECTED_CONTENT_EXT = EGL_TRUE` when the OS supports it and
    /// `usage` marks the buffer as protected.
    pub fn protected_content_attribute(
        &self,
        usage: HardwareBufferUsage,
    ) -> Option<ImageAttribute> {
        (self.protected_content && usage.contains(HardwareBufferUsage::PROTECTED_CONTENT)).then_some(
            ImageAttribute {
                key: egl::PROTECTED_CONTENT_EXT,
                value: egl::TRUE,
            },
        )
    }
}

/// Kernel thread id of the caller (`gettid`).
pub fn current_thread_id() -> i32 {
    #[cfg(any(target_os = "android", target_os = "linux"))]
    {
        // SAFETY: gettid has no preconditions.
        unsafe { libc::syscall(libc::SYS_gettid) as i32 }
    }
    #[cfg(not(any(target_os = "android", target_os = "linux")))]
    {
        0
    }
}

/// Disables ANGLE's `preferSubmitAtFBOBoundary`, which costs more than it
/// saves for this renderer on ARM. Must run before any GL context exists.
pub const ANGLE_FEATURE_OVERRIDES_DISABLED: (&str, &str) =
    ("ANGLE_FEATURE_OVERRIDES_DISABLED", "preferSubmitAtFBOBoundary");

/// Set `key=value` unless `key` is already present. Returns whether the
/// variable was written.
pub fn set_env_default(key: &str, value: &str) -> bool {
    if std::env::var_os(key).is_some() {
        tracing::debug!("{} already set; leaving it unchanged", key);
        return false;
    }
    // SAFETY: called from platform construction, before the driver spawns
    // threads or creates a context.
    unsafe { std::env::set_var(key, value) };
    tracing::debug!("Set {}={}", key, value);
    true
}
