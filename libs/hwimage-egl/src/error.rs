// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

/// GL call after which a texture binding failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindStage {
    BindTexture,
    ImageTarget,
    MinFilter,
    MagFilter,
    GenerateMipmap,
}

impl std::fmt::Display for BindStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::BindTexture => "glBindTexture",
            Self::ImageTarget => "glEGLImageTargetTexture2DOES",
            Self::MinFilter => "glTexParameteri(GL_TEXTURE_MIN_FILTER)",
            Self::MagFilter => "glTexParameteri(GL_TEXTURE_MAG_FILTER)",
            Self::GenerateMipmap => "glGenerateMipmap",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Native client buffer unavailable: {0}")]
    NativeBufferUnavailable(String),

    #[error("EGL image creation failed: {0}")]
    ImageCreationFailed(String),

    #[error("Texture binding failed after {stage}: GL error 0x{code:04X}")]
    BindingFailed { stage: BindStage, code: u32 },

    #[error("Allocation failed: {0}")]
    AllocationFailed(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Driver creation failed: {0}")]
    DriverCreation(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl From<toml::de::Error> for PlatformError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;
