//! Error type shared by configuration, texture loading and GPU setup.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("invalid value {value} for {name}: {reason}")]
    InvalidSetting {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("failed to load texture {}: {source}", path.display())]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("dial texture must be square and non-empty, got {width}x{height}")]
    TextureSize { width: u32, height: u32 },

    #[error("shader validation failed: {0}")]
    Shader(String),

    #[error(transparent)]
    Iced(#[from] iced::Error),
}
