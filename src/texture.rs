//! Dial image and environment map synthesis.
//!
//! Both textures are generated procedurally so the application runs without
//! any asset files; a dial image can still be loaded from a PNG.

use std::f32::consts::TAU;
use std::path::Path;

use image::{Rgba, RgbaImage};
use nalgebra::Vector3;

use crate::error::Error;

pub(crate) const DIAL_SIZE: u32 = 512;
pub(crate) const ENVIRONMENT_SIZE: u32 = 128;

const DIAL_FACE: Rgba<u8> = Rgba([246, 240, 222, 255]);
const DIAL_INK: Rgba<u8> = Rgba([30, 30, 36, 255]);

const SKY: [f32; 3] = [0.32, 0.55, 0.92];
const HORIZON: [f32; 3] = [0.95, 0.95, 0.92];
const GROUND: [f32; 3] = [0.28, 0.22, 0.16];
const SUN: [f32; 3] = [1.0, 0.96, 0.85];
/// Direction towards the sun, opposite to the light's travel direction.
const SUN_DIRECTION: [f32; 3] = [0.4, 0.6, 1.0];

/// Faces of a cube map in wgpu layer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub(crate) const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];
}

/// Procedural clock dial: minute ticks, heavier hour ticks and a border.
///
/// Everything is measured relative to the image so any size works. The
/// outside of the dial circle is filled with the face colour as well, since
/// the disc's planar mapping never samples it.
pub(crate) fn dial_face(size: u32) -> RgbaImage {
    let half = size as f32 * 0.5;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = (x as f32 + 0.5 - half) / half;
        let dy = (half - y as f32 - 0.5) / half;
        let r = dx.hypot(dy);

        if (0.95..=0.99).contains(&r) {
            return DIAL_INK;
        }

        // Clockwise from twelve, in minutes.
        let minutes = dx.atan2(dy).rem_euclid(TAU) / TAU * 60.0;
        let nearest = minutes.round();
        let arc = (minutes - nearest).abs() / 60.0 * TAU * r;
        let hour_mark = nearest as u32 % 5 == 0;

        let (inner, width) = if hour_mark { (0.74, 0.022) } else { (0.84, 0.008) };
        if (inner..0.92).contains(&r) && arc < width {
            DIAL_INK
        } else {
            DIAL_FACE
        }
    })
}

/// Loads a dial image from disk; it must be square and non-empty.
pub(crate) fn load_dial_face(path: &Path) -> Result<RgbaImage, Error> {
    let image = image::open(path)
        .map_err(|source| Error::Texture {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    check_dial_size(&image)?;
    Ok(image)
}

fn check_dial_size(image: &RgbaImage) -> Result<(), Error> {
    let (width, height) = image.dimensions();
    if width == 0 || width != height {
        return Err(Error::TextureSize { width, height });
    }
    Ok(())
}

/// World direction through texel `(u, v)` of `face`, with `u`, `v` in `-1..=1`
/// and `v` growing downwards as in image rows.
pub(crate) fn cube_direction(face: CubeFace, u: f32, v: f32) -> Vector3<f32> {
    let direction = match face {
        CubeFace::PositiveX => Vector3::new(1.0, -v, -u),
        CubeFace::NegativeX => Vector3::new(-1.0, -v, u),
        CubeFace::PositiveY => Vector3::new(u, 1.0, v),
        CubeFace::NegativeY => Vector3::new(u, -1.0, -v),
        CubeFace::PositiveZ => Vector3::new(u, -v, 1.0),
        CubeFace::NegativeZ => Vector3::new(-u, -v, -1.0),
    };
    direction.normalize()
}

fn environment_color(direction: &Vector3<f32>) -> [f32; 3] {
    let lerp = |a: [f32; 3], b: [f32; 3], t: f32| -> [f32; 3] {
        std::array::from_fn(|c| a[c] + (b[c] - a[c]) * t)
    };

    let elevation = direction.y;
    let base = if elevation >= 0.0 {
        lerp(HORIZON, SKY, elevation.sqrt())
    } else {
        lerp(HORIZON, GROUND, (-elevation * 4.0).min(1.0))
    };

    let sun = Vector3::from(SUN_DIRECTION).normalize();
    let glow = direction.dot(&sun).max(0.0).powf(64.0);
    lerp(base, SUN, glow)
}

/// The six faces of the environment cube map, in [`CubeFace::ALL`] order.
pub(crate) fn environment_faces(size: u32) -> Vec<RgbaImage> {
    let scale = 2.0 / size as f32;
    CubeFace::ALL
        .iter()
        .map(|&face| {
            RgbaImage::from_fn(size, size, |x, y| {
                let u = (x as f32 + 0.5) * scale - 1.0;
                let v = (y as f32 + 0.5) * scale - 1.0;
                let [r, g, b] = environment_color(&cube_direction(face, u, v));
                let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
                Rgba([channel(r), channel(g), channel(b), 255])
            })
        })
        .collect()
}
