use std::fmt;
use std::str::FromStr;

use brush_kernel::{Point3d, Vec3};
use nalgebra::{Rotation3, Unit, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::BrushError;

/// Material name of faces that have none.
pub const NO_MATERIAL: &str = "__empty";

// ─── Map formats ─────────────────────────────────────────────────────────────

/// The closed set of map dialects a face can be written in.
///
/// Capabilities are plain `match` tables; there is no per-format behaviour
/// beyond what the predicates expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MapFormat {
    #[default]
    Standard,
    Quake2,
    Quake2Valve,
    Quake3,
    Quake3Valve,
    Quake3Legacy,
    Valve,
    Hexen2,
    Daikatana,
}

impl MapFormat {
    pub const ALL: [MapFormat; 9] = [
        MapFormat::Standard,
        MapFormat::Quake2,
        MapFormat::Quake2Valve,
        MapFormat::Quake3,
        MapFormat::Quake3Valve,
        MapFormat::Quake3Legacy,
        MapFormat::Valve,
        MapFormat::Hexen2,
        MapFormat::Daikatana,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Quake2 => "Quake2",
            Self::Quake2Valve => "Quake2 (Valve)",
            Self::Quake3 => "Quake3",
            Self::Quake3Valve => "Quake3 (Valve)",
            Self::Quake3Legacy => "Quake3 (legacy)",
            Self::Valve => "Valve",
            Self::Hexen2 => "Hexen2",
            Self::Daikatana => "Daikatana",
        }
    }

    /// Whether faces store explicit UV axes (Valve 220 style).
    pub fn is_parallel(self) -> bool {
        matches!(self, Self::Valve | Self::Quake2Valve | Self::Quake3Valve)
    }

    /// Whether faces carry surface contents, flags and value.
    pub fn has_surface_attributes(self) -> bool {
        matches!(
            self,
            Self::Quake2 | Self::Quake2Valve | Self::Quake3 | Self::Quake3Valve | Self::Quake3Legacy | Self::Daikatana
        )
    }

    /// Whether faces carry an RGB tint.
    pub fn has_color(self) -> bool {
        matches!(self, Self::Daikatana)
    }
}

impl fmt::Display for MapFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MapFormat {
    type Err = BrushError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BrushError::UnknownFormat { name: s.to_string() })
    }
}

// ─── Face attributes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Surface properties of one brush face. Plain value data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushFaceAttributes {
    pub material: String,
    pub offset: Vector2<f32>,
    pub scale: Vector2<f32>,
    /// Degrees, counter-clockwise.
    pub rotation: f32,
    pub surface_contents: Option<i32>,
    pub surface_flags: Option<i32>,
    pub surface_value: Option<f32>,
    pub color: Option<Color>,
}

impl Default for BrushFaceAttributes {
    fn default() -> Self {
        Self::new(NO_MATERIAL)
    }
}

impl BrushFaceAttributes {
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            offset: Vector2::zeros(),
            scale: Vector2::new(1.0, 1.0),
            rotation: 0.0,
            surface_contents: None,
            surface_flags: None,
            surface_value: None,
            color: None,
        }
    }

    pub fn has_material(&self) -> bool {
        self.material != NO_MATERIAL
    }

    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset = Vector2::new(x, y);
        self
    }

    pub fn with_scale(mut self, x: f32, y: f32) -> Self {
        self.scale = Vector2::new(x, y);
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_surface(mut self, contents: i32, flags: i32, value: f32) -> Self {
        self.surface_contents = Some(contents);
        self.surface_flags = Some(flags);
        self.surface_value = Some(value);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Drop the fields `format` cannot store.
    pub fn restricted_to(mut self, format: MapFormat) -> Self {
        if !format.has_surface_attributes() {
            self.surface_contents = None;
            self.surface_flags = None;
            self.surface_value = None;
        }
        if !format.has_color() {
            self.color = None;
        }
        self
    }
}

// ─── UV coordinate systems ───────────────────────────────────────────────────

/// `(normal, u, v)` for each paraxial projection, in selection order.
const PARAXIAL_BASE_AXES: [[[f64; 3]; 3]; 6] = [
    [[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0]],
    [[0.0, 0.0, -1.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0]],
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]],
    [[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]],
    [[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]],
    [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]],
];

/// Index of the paraxial projection whose normal is closest to `normal`.
///
/// Earlier entries win ties, so a 45° face between +Z and +X projects along Z.
pub fn paraxial_index(normal: &Vec3) -> usize {
    let mut best = (0, 0.0);
    for (i, [axis, _, _]) in PARAXIAL_BASE_AXES.iter().enumerate() {
        let dot = normal.dot(&Vec3::from(*axis));
        if dot > best.1 {
            best = (i, dot);
        }
    }
    best.0
}

/// `(normal, u, v)` of paraxial projection `index`.
pub fn paraxial_axes(index: usize) -> (Vec3, Vec3, Vec3) {
    let [n, u, v] = PARAXIAL_BASE_AXES[index % PARAXIAL_BASE_AXES.len()];
    (Vec3::from(n), Vec3::from(u), Vec3::from(v))
}

/// How a face derives its texture axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UvCoordSystem {
    /// Axes locked to the world axis nearest the face normal, rotated by the
    /// face's rotation attribute.
    Paraxial { index: usize },
    /// Axes stored on the face.
    Parallel { u_axis: Vec3, v_axis: Vec3 },
}

impl UvCoordSystem {
    pub fn paraxial(normal: &Vec3) -> Self {
        Self::Paraxial {
            index: paraxial_index(normal),
        }
    }

    /// Parallel axes lying in the plane with `normal`, matching the paraxial
    /// axes for axis-aligned planes.
    pub fn parallel(normal: &Vec3) -> Self {
        let (u_axis, v_axis) = initial_parallel_axes(normal);
        Self::Parallel { u_axis, v_axis }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, Self::Parallel { .. })
    }

    /// Effective `(u, v)` axes for a face rotated by `rotation` degrees.
    pub fn axes(&self, rotation: f32) -> (Vec3, Vec3) {
        match *self {
            Self::Parallel { u_axis, v_axis } => (u_axis, v_axis),
            Self::Paraxial { index } => {
                let (_, u, v) = paraxial_axes(index);
                if rotation == 0.0 {
                    return (u, v);
                }
                let axis = Unit::new_normalize(v.cross(&u));
                let rot = Rotation3::from_axis_angle(&axis, f64::from(rotation).to_radians());
                (rot * u, rot * v)
            }
        }
    }

    /// Texture coordinates of `point` before division by the texture size.
    pub fn uv_coords(&self, point: &Point3d, attributes: &BrushFaceAttributes) -> Vector2<f64> {
        let (u, v) = self.axes(attributes.rotation);
        let scale = |s: f32| if s == 0.0 { 1.0 } else { f64::from(s) };
        Vector2::new(
            point.coords.dot(&u) / scale(attributes.scale.x) + f64::from(attributes.offset.x),
            point.coords.dot(&v) / scale(attributes.scale.y) + f64::from(attributes.offset.y),
        )
    }

    /// The same system re-derived for a face whose normal is now `normal`.
    ///
    /// Paraxial systems pick a new projection; parallel axes are mapped
    /// through `map` and pushed back into the plane.
    pub fn reoriented(&self, normal: &Vec3, map: impl Fn(&Vec3) -> Vec3) -> Self {
        match self {
            Self::Paraxial { .. } => Self::paraxial(normal),
            Self::Parallel { u_axis, v_axis } => {
                let project = |axis: &Vec3| (axis - normal * axis.dot(normal)).try_normalize(1e-9);
                match (project(&map(u_axis)), project(&map(v_axis))) {
                    (Some(u_axis), Some(v_axis)) => Self::Parallel { u_axis, v_axis },
                    _ => Self::parallel(normal),
                }
            }
        }
    }

    pub fn to_parallel(&self, normal: &Vec3, rotation: f32) -> Self {
        let (u_axis, v_axis) = self.axes(rotation);
        Self::Parallel { u_axis, v_axis }.reoriented(normal, |a| *a)
    }

    pub fn to_paraxial(&self, normal: &Vec3) -> Self {
        Self::paraxial(normal)
    }
}

fn initial_parallel_axes(normal: &Vec3) -> (Vec3, Vec3) {
    let down = if normal.z.abs() >= normal.x.abs() && normal.z.abs() >= normal.y.abs() {
        -Vec3::y()
    } else {
        -Vec3::z()
    };
    let u = normal.cross(&down).normalize();
    let v = u.cross(normal).normalize();
    (u, v)
}
