//! Per-frame scene assembly.
//!
//! Nothing here outlives a frame: [`build`] regenerates every visible shape
//! from the frame parameters and hands the meshes to the renderer, which
//! uploads and then discards them.

use crate::clock::ClockTime;
use crate::geometry::hands::{self, HOUR_HAND, MINUTE_HAND, SECOND_HAND};
use crate::geometry::lathe;
use crate::geometry::mobius::{self, BACK_PALETTE_OFFSET, StripParams};
use crate::geometry::Mesh;

const STRIP_RADIUS: f32 = 1.0;
const STRIP_HALF_WIDTH: f32 = 0.1;
const DISC_RADIUS: f32 = 0.88;
const DISC_Z: f32 = -0.005;
const RIM_RADIUS: f32 = 1.2;
const RIM_TUBE: f32 = 0.035;
const HUBCAP_RADIUS: f32 = 0.04;
const HUBCAP_Z: f32 = 0.03;
const CASE_RADIUS: f32 = 1.3;
const CASE_DEPTH: f32 = 0.3;
const CASE_LIP: f32 = 0.04;

/// Lathed shapes use this many segments per strip step, capped below.
const LATHE_SEGMENTS_PER_STEP: u32 = 2;
const MAX_LATHE_SEGMENTS: u32 = 256;

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
const CHROME: [f32; 3] = [0.78, 0.8, 0.84];
const CASE_COLOR: [f32; 3] = [0.9, 0.35, 0.15];

/// Progression of the demo, each stage adding to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Stage {
    /// A single white strip.
    Plain,
    /// Two-sided gradient strip and the hands.
    Colored,
    /// Face disc, rim and hubcap, with lighting.
    Lit,
    /// Dial texture on the face and the frisbee case.
    Textured,
    /// Environment reflections on the metal parts.
    Reflective,
}

impl Stage {
    pub(crate) const ALL: [Stage; 5] = [
        Stage::Plain,
        Stage::Colored,
        Stage::Lit,
        Stage::Textured,
        Stage::Reflective,
    ];
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Plain => write!(f, "Plain"),
            Stage::Colored => write!(f, "Colored"),
            Stage::Lit => write!(f, "Lit"),
            Stage::Textured => write!(f, "Textured"),
            Stage::Reflective => write!(f, "Reflective"),
        }
    }
}

/// Which faces the rasterizer discards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Cull {
    Back,
    Front,
    None,
}

impl Cull {
    pub(crate) const ALL: [Cull; 3] = [Cull::Back, Cull::Front, Cull::None];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shading {
    /// Vertex colour only.
    Unlit,
    /// Ambient, diffuse and specular terms.
    Lit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Material {
    pub(crate) tint: [f32; 4],
    pub(crate) shading: Shading,
    pub(crate) shininess: f32,
    /// Blend factor towards the environment reflection.
    pub(crate) reflectivity: f32,
    /// Modulate by the dial texture.
    pub(crate) textured: bool,
}

impl Material {
    fn unlit() -> Self {
        Self {
            tint: [1.0; 4],
            shading: Shading::Unlit,
            shininess: 1.0,
            reflectivity: 0.0,
            textured: false,
        }
    }

    fn lit(shininess: f32) -> Self {
        Self {
            shading: Shading::Lit,
            shininess,
            ..Self::unlit()
        }
    }

    fn reflective(mut self, stage: Stage, reflectivity: f32) -> Self {
        if stage >= Stage::Reflective {
            self.reflectivity = reflectivity;
        }
        self
    }
}

/// Material block as laid out in `shader.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct MaterialUniform {
    tint: [f32; 4],
    lit: u32,
    shininess: f32,
    reflectivity: f32,
    textured: u32,
}

impl From<&Material> for MaterialUniform {
    fn from(material: &Material) -> Self {
        Self {
            tint: material.tint,
            lit: u32::from(material.shading == Shading::Lit),
            shininess: material.shininess,
            reflectivity: material.reflectivity,
            textured: u32::from(material.textured),
        }
    }
}

/// One draw call: a mesh plus the state it is drawn with.
#[derive(Debug, Clone)]
pub(crate) struct Shape {
    pub(crate) label: &'static str,
    pub(crate) mesh: Mesh,
    pub(crate) cull: Cull,
    pub(crate) material: Material,
}

/// Inputs that determine a frame's geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FrameParams {
    pub(crate) stage: Stage,
    pub(crate) half_twists: u32,
    /// Strip samples per half loop; the lathed parts scale with it.
    pub(crate) steps: u32,
    pub(crate) torsion: f32,
    pub(crate) time: ClockTime,
}

/// Regenerates every shape visible at `params.stage`, in draw order.
pub(crate) fn build(params: &FrameParams) -> Vec<Shape> {
    let stage = params.stage;
    let lit = |shininess| {
        if stage >= Stage::Lit {
            Material::lit(shininess)
        } else {
            Material::unlit()
        }
    };
    let strip_params = StripParams {
        radius: STRIP_RADIUS,
        half_width: STRIP_HALF_WIDTH,
        half_twists: params.half_twists,
        steps: params.steps,
        torsion: params.torsion,
        palette_offset: 0,
    };
    let segments = (params.steps * LATHE_SEGMENTS_PER_STEP).clamp(8, MAX_LATHE_SEGMENTS);
    let rings = (params.steps / 6).max(2);

    let mut shapes = Vec::with_capacity(9);

    if stage == Stage::Plain {
        shapes.push(Shape {
            label: "strip",
            mesh: mobius::strip(&strip_params).with_color(WHITE),
            cull: Cull::None,
            material: Material::unlit(),
        });
        return shapes;
    }

    shapes.push(Shape {
        label: "strip front",
        mesh: mobius::strip(&strip_params),
        cull: Cull::Back,
        material: lit(24.0),
    });
    shapes.push(Shape {
        label: "strip back",
        mesh: mobius::strip(&StripParams {
            palette_offset: BACK_PALETTE_OFFSET,
            ..strip_params
        }),
        cull: Cull::Front,
        material: lit(24.0),
    });

    let angles = params.time.hand_angles();
    for (label, shape, angle) in [
        ("hour hand", &HOUR_HAND, angles.hour),
        ("minute hand", &MINUTE_HAND, angles.minute),
        ("second hand", &SECOND_HAND, angles.second),
    ] {
        shapes.push(Shape {
            label,
            mesh: hands::hand(shape, angle),
            cull: Cull::None,
            material: lit(48.0),
        });
    }

    if stage < Stage::Lit {
        return shapes;
    }

    shapes.push(Shape {
        label: "face",
        mesh: lathe::disc(DISC_RADIUS, DISC_Z, rings, segments),
        cull: Cull::Back,
        material: Material {
            textured: stage >= Stage::Textured,
            ..Material::lit(8.0)
        },
    });
    shapes.push(Shape {
        label: "rim",
        mesh: lathe::rim(RIM_RADIUS, RIM_TUBE, 0.0, segments, 12).with_color(CHROME),
        cull: Cull::Back,
        material: Material::lit(96.0).reflective(stage, 0.7),
    });
    shapes.push(Shape {
        label: "hubcap",
        mesh: lathe::hubcap(HUBCAP_RADIUS, HUBCAP_Z, 24, 6).with_color(CHROME),
        cull: Cull::Back,
        material: Material::lit(96.0).reflective(stage, 0.7),
    });

    if stage >= Stage::Textured {
        shapes.push(Shape {
            label: "case",
            mesh: lathe::frisbee(CASE_RADIUS, CASE_DEPTH, CASE_LIP, segments, rings * 2)
                .with_color(CASE_COLOR),
            cull: Cull::None,
            material: Material::lit(32.0).reflective(stage, 0.25),
        });
    }

    shapes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(stage: Stage) -> FrameParams {
        FrameParams {
            stage,
            half_twists: 3,
            steps: 30,
            torsion: 0.0,
            time: ClockTime::from_hms(10, 10, 30.0),
        }
    }

    fn labels(stage: Stage) -> Vec<&'static str> {
        build(&params(stage)).iter().map(|shape| shape.label).collect()
    }

    #[test]
    fn stages_add_parts_in_order() {
        assert_eq!(labels(Stage::Plain), ["strip"]);
        assert_eq!(
            labels(Stage::Colored),
            ["strip front", "strip back", "hour hand", "minute hand", "second hand"]
        );
        assert_eq!(labels(Stage::Lit).len(), 8);
        assert_eq!(labels(Stage::Textured).last(), Some(&"case"));
        assert_eq!(labels(Stage::Reflective), labels(Stage::Textured));
    }

    #[test]
    fn plain_strip_is_white_and_unlit() {
        let shapes = build(&params(Stage::Plain));
        assert!(shapes[0].mesh.vertices.iter().all(|v| v.color == WHITE));
        assert_eq!(shapes[0].material.shading, Shading::Unlit);
        // Both sides of the band stay visible without lighting.
        assert_eq!(shapes[0].cull, Cull::None);
        assert_eq!(shapes.len(), 1);
    }

    #[test]
    fn strip_sides_are_culled_oppositely() {
        let shapes = build(&params(Stage::Colored));
        assert_eq!(shapes[0].cull, Cull::Back);
        assert_eq!(shapes[1].cull, Cull::Front);
        assert_ne!(shapes[0].mesh.vertices[0].color, shapes[1].mesh.vertices[0].color);
        assert_eq!(shapes[0].mesh.vertices[0].position, shapes[1].mesh.vertices[0].position);
    }

    #[test]
    fn lighting_starts_at_the_lit_stage() {
        assert!(build(&params(Stage::Colored))
            .iter()
            .all(|shape| shape.material.shading == Shading::Unlit));
        assert!(build(&params(Stage::Lit))
            .iter()
            .all(|shape| shape.material.shading == Shading::Lit));
    }

    #[test]
    fn only_the_reflective_stage_reflects() {
        let reflecting = |stage| {
            build(&params(stage))
                .iter()
                .filter(|shape| shape.material.reflectivity > 0.0)
                .count()
        };
        assert_eq!(reflecting(Stage::Textured), 0);
        assert_eq!(reflecting(Stage::Reflective), 3);
    }

    #[test]
    fn face_is_textured_from_the_textured_stage() {
        let face = |stage| {
            build(&params(stage))
                .into_iter()
                .find(|shape| shape.label == "face")
                .map(|shape| shape.material.textured)
        };
        assert_eq!(face(Stage::Lit), Some(false));
        assert_eq!(face(Stage::Textured), Some(true));
    }

    #[test]
    fn torsion_moves_the_strip() {
        let still = build(&params(Stage::Colored));
        let moved = build(&FrameParams { torsion: 1.0, ..params(Stage::Colored) });
        assert_ne!(still[0].mesh, moved[0].mesh);
        assert_eq!(still[2].mesh, moved[2].mesh);
    }

    #[test]
    fn hands_follow_the_time() {
        let ten = build(&params(Stage::Colored));
        let later = build(&FrameParams {
            time: ClockTime::from_hms(10, 40, 30.0),
            ..params(Stage::Colored)
        });
        assert_ne!(ten[3].mesh, later[3].mesh);
        assert_eq!(ten[4].mesh.len(), later[4].mesh.len());
    }

    #[test]
    fn material_uniform_packs_flags() {
        let uniform = MaterialUniform::from(&Material {
            textured: true,
            ..Material::lit(16.0)
        });
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 32);
        assert_eq!(uniform.lit, 1);
        assert_eq!(uniform.textured, 1);
        assert_eq!(uniform.shininess, 16.0);
    }
}
