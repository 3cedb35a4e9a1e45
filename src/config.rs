//! Command line options and the validated settings derived from them.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use image::RgbaImage;

use crate::error::Error;
use crate::scene::Stage;
use crate::texture;

pub(crate) const MAX_HALF_TWISTS: u32 = 12;
pub(crate) const MIN_SEGMENTS: u32 = 4;
pub(crate) const MAX_SEGMENTS: u32 = 360;
const MAX_UTC_OFFSET: f32 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum StageArg {
    Plain,
    Colored,
    Lit,
    Textured,
    Reflective,
}

impl From<StageArg> for Stage {
    fn from(stage: StageArg) -> Self {
        match stage {
            StageArg::Plain => Stage::Plain,
            StageArg::Colored => Stage::Colored,
            StageArg::Lit => Stage::Lit,
            StageArg::Textured => Stage::Textured,
            StageArg::Reflective => Stage::Reflective,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "mobius-clock", about = "A twisted-strip clock rendered with wgpu")]
pub(crate) struct Cli {
    /// Rendering stage to start in
    #[arg(long, value_enum, default_value_t = StageArg::Reflective)]
    pub(crate) stage: StageArg,

    /// Half twists of the strip (odd values give a Möbius band)
    #[arg(long, default_value_t = 3)]
    pub(crate) twists: u32,

    /// Tessellation steps per half loop of the strip
    #[arg(long, default_value_t = 30)]
    pub(crate) segments: u32,

    /// Square PNG used as the dial instead of the generated one
    #[arg(long)]
    pub(crate) face_texture: Option<PathBuf>,

    /// Time zone offset of the hands, in hours from UTC
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub(crate) utc_offset: f32,

    /// Start with the animation stopped
    #[arg(long)]
    pub(crate) paused: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

/// Validated start-up settings.
#[derive(Debug, Clone)]
pub(crate) struct ClockSettings {
    pub(crate) stage: Stage,
    pub(crate) half_twists: u32,
    pub(crate) segments: u32,
    pub(crate) utc_offset: f32,
    pub(crate) animate: bool,
    /// Dial image shared with the renderer.
    pub(crate) dial: Arc<RgbaImage>,
}

impl Cli {
    /// Checks ranges and loads the dial texture.
    pub(crate) fn validate(&self) -> Result<ClockSettings, Error> {
        if self.twists > MAX_HALF_TWISTS {
            return Err(Error::InvalidSetting {
                name: "twists",
                value: self.twists.to_string(),
                reason: "at most 12 half twists are supported",
            });
        }
        if !(MIN_SEGMENTS..=MAX_SEGMENTS).contains(&self.segments) {
            return Err(Error::InvalidSetting {
                name: "segments",
                value: self.segments.to_string(),
                reason: "must be between 4 and 360",
            });
        }
        if !self.utc_offset.is_finite() || self.utc_offset.abs() > MAX_UTC_OFFSET {
            return Err(Error::InvalidSetting {
                name: "utc-offset",
                value: self.utc_offset.to_string(),
                reason: "must be within 14 hours of UTC",
            });
        }

        let dial = match &self.face_texture {
            Some(path) => texture::load_dial_face(path)?,
            None => texture::dial_face(texture::DIAL_SIZE),
        };

        Ok(ClockSettings {
            stage: self.stage.into(),
            half_twists: self.twists,
            segments: self.segments,
            utc_offset: self.utc_offset,
            animate: !self.paused,
            dial: Arc::new(dial),
        })
    }

    pub(crate) fn log_filter(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}
