// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Performance-hint sessions.
//!
//! `APerformanceHint_*` lives in `libandroid.so` from API 33 on. It is
//! resolved at runtime so the crate loads on older devices and on hosts; a
//! missing library or symbol leaves hinting unsupported.

use std::ffi::{OsStr, c_int, c_void};
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use libloading::Library;

use crate::error::{PlatformError, Result};

/// A hint session bound to a set of threads.
pub trait HintSession: Send {
    fn is_valid(&self) -> bool;
    fn update_target_work_duration(&mut self, target_ns: i64);
    fn report_actual_work_duration(&mut self, actual_ns: i64);
}

/// Source of hint sessions.
pub trait PerformanceHintManager {
    fn is_supported(&self) -> bool;

    /// Never fails: an unsupported manager hands out an
    /// [`InvalidHintSession`].
    fn create_session(&self, thread_ids: &[i32], initial_target_ns: i64) -> Box<dyn HintSession>;
}

/// Session for which every call is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct InvalidHintSession;

impl HintSession for InvalidHintSession {
    fn is_valid(&self) -> bool {
        false
    }

    fn update_target_work_duration(&mut self, _target_ns: i64) {}

    fn report_actual_work_duration(&mut self, _actual_ns: i64) {}
}

/// Precondition for creating hint sessions on the calling thread.
///
/// Some hint back-ends only accept threads known to a managed runtime. The
/// platform calls [`ensure_registered`](Self::ensure_registered) once at
/// construction when hinting is supported.
pub trait ThreadRegistration {
    fn ensure_registered(&self) -> Result<()>;
}

/// Registration for threads that need none.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoThreadRegistration;

impl ThreadRegistration for NoThreadRegistration {
    fn ensure_registered(&self) -> Result<()> {
        Ok(())
    }
}

type GetManagerFn = unsafe extern "C" fn() -> *mut c_void;
type CreateSessionFn = unsafe extern "C" fn(*mut c_void, *const i32, usize, i64) -> *mut c_void;
type UpdateDurationFn = unsafe extern "C" fn(*mut c_void, i64) -> c_int;
type CloseSessionFn = unsafe extern "C" fn(*mut c_void);

struct HintApi {
    manager: NonNull<c_void>,
    create_session: CreateSessionFn,
    update_target: UpdateDurationFn,
    report_actual: UpdateDurationFn,
    close_session: CloseSessionFn,
    // Keeps the function pointers above valid.
    _library: Library,
}

// SAFETY: the NDK manager is a process-wide singleton usable from any thread.
unsafe impl Send for HintApi {}
unsafe impl Sync for HintApi {}

impl HintApi {
    fn load(path: &OsStr) -> Result<Self> {
        // SAFETY: libandroid.so has no load-time initializers with
        // preconditions on the caller.
        let library = unsafe { Library::new(path) }
            .map_err(|e| PlatformError::NotSupported(format!("{}: {}", path.to_string_lossy(), e)))?;

        // SAFETY: symbol types match the NDK declarations in
        // <android/performance_hint.h>.
        unsafe {
            let get_manager = *symbol::<GetManagerFn>(&library, b"APerformanceHint_getManager\0")?;
            let create_session =
                *symbol::<CreateSessionFn>(&library, b"APerformanceHint_createSession\0")?;
            let update_target =
                *symbol::<UpdateDurationFn>(&library, b"APerformanceHint_updateTargetWorkDuration\0")?;
            let report_actual =
                *symbol::<UpdateDurationFn>(&library, b"APerformanceHint_reportActualWorkDuration\0")?;
            let close_session =
                *symbol::<CloseSessionFn>(&library, b"APerformanceHint_closeSession\0")?;

            let manager = NonNull::new(get_manager()).ok_or_else(|| {
                PlatformError::NotSupported("APerformanceHint_getManager returned null".into())
            })?;

            Ok(Self {
                manager,
                create_session,
                update_target,
                report_actual,
                close_session,
                _library: library,
            })
        }
    }
}

unsafe fn symbol<'lib, T>(
    library: &'lib Library,
    name: &[u8],
) -> Result<libloading::Symbol<'lib, T>> {
    // SAFETY: forwarded to the caller.
    unsafe { library.get::<T>(name) }.map_err(|e| {
        PlatformError::NotSupported(format!(
            "{}: {}",
            String::from_utf8_lossy(&name[..name.len().saturating_sub(1)]),
            e
        ))
    })
}

/// [`PerformanceHintManager`] over the NDK `APerformanceHint` API.
#[derive(Clone)]
pub struct NdkPerformanceHint {
    api: Option<Arc<HintApi>>,
}

impl NdkPerformanceHint {
    pub const LIBRARY: &'static str = "libandroid.so";

    /// Load from the system `libandroid.so`.
    pub fn load() -> Self {
        Self::load_from(Self::LIBRARY)
    }

    /// Load from `path`. Failure is logged and leaves hinting unsupported.
    pub fn load_from(path: impl AsRef<OsStr>) -> Self {
        match HintApi::load(path.as_ref()) {
            Ok(api) => {
                tracing::debug!("APerformanceHint available");
                Self {
                    api: Some(Arc::new(api)),
                }
            }
            Err(e) => {
                tracing::debug!("Performance hints unsupported: {}", e);
                Self::unsupported()
            }
        }
    }

    pub fn unsupported() -> Self {
        Self { api: None }
    }
}

impl fmt::Debug for NdkPerformanceHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdkPerformanceHint")
            .field("supported", &self.api.is_some())
            .finish()
    }
}

impl PerformanceHintManager for NdkPerformanceHint {
    fn is_supported(&self) -> bool {
        self.api.is_some()
    }

    fn create_session(&self, thread_ids: &[i32], initial_target_ns: i64) -> Box<dyn HintSession> {
        let Some(api) = &self.api else {
            return Box::new(InvalidHintSession);
        };

        // SAFETY: `manager` came from APerformanceHint_getManager; the thread
        // id slice outlives the call.
        let session = unsafe {
            (api.create_session)(
                api.manager.as_ptr(),
                thread_ids.as_ptr(),
                thread_ids.len(),
                initial_target_ns,
            )
        };

        match NonNull::new(session) {
            Some(session) => {
                tracing::debug!(?thread_ids, initial_target_ns, "Created performance hint session");
                Box::new(NdkHintSession {
                    api: Arc::clone(api),
                    session,
                })
            }
            None => {
                tracing::warn!(?thread_ids, "APerformanceHint_createSession returned null");
                Box::new(InvalidHintSession)
            }
        }
    }
}

struct NdkHintSession {
    api: Arc<HintApi>,
    session: NonNull<c_void>,
}

// SAFETY: a session may be used from any thread, one at a time; `&mut self`
// on every call enforces the latter.
unsafe impl Send for NdkHintSession {}

impl HintSession for NdkHintSession {
    fn is_valid(&self) -> bool {
        true
    }

    fn update_target_work_duration(&mut self, target_ns: i64) {
        // SAFETY: live session from APerformanceHint_createSession.
        let status = unsafe { (self.api.update_target)(self.session.as_ptr(), target_ns) };
        if status != 0 {
            tracing::trace!(status, target_ns, "updateTargetWorkDuration rejected");
        }
    }

    fn report_actual_work_duration(&mut self, actual_ns: i64) {
        // SAFETY: live session from APerformanceHint_createSession.
        let status = unsafe { (self.api.report_actual)(self.session.as_ptr(), actual_ns) };
        if status != 0 {
            tracing::trace!(status, actual_ns, "reportActualWorkDuration rejected");
        }
    }
}

impl Drop for NdkHintSession {
    fn drop(&mut self) {
        // SAFETY: closed exactly once.
        unsafe { (self.api.close_session)(self.session.as_ptr()) };
    }
}
