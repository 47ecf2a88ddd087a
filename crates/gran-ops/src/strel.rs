//! Flat structuring elements.
//!
//! A [`Strel`] is a list of integer offsets `[dx, dy, dz]` relative to the
//! element origin. Every element built here contains the origin, which keeps
//! erosion anti-extensive and dilation extensive.
//!
//! # Sizing
//!
//! Elements are sized either by radius or by diameter ([`SizeKind`]):
//!
//! | shape          | radius `r`                         | diameter `d`                     |
//! |----------------|------------------------------------|----------------------------------|
//! | square / cube  | side `2r + 1`                      | side `d`                         |
//! | lines          | length `2r + 1`                    | length `d`                       |
//! | disk / ball    | `dx² + dy² (+ dz²) <= (r + 0.5)²`  | radius `(d - 1) / 2`             |
//! | diamond        | `|dx| + |dy| <= r`                 | radius `(d - 1) / 2`, `d` odd    |
//! | octagon        | square `r` cut at `|dx| + |dy| <= round(r·√2)` | radius `(d - 1) / 2` |
//!
//! Even diameters of square, line and cube elements place the extra sample on
//! the positive side of the origin.
//!
//! # Example
//!
//! ```rust
//! use gran_ops::strel::{Shape, SizeKind, Strel};
//!
//! let se = Strel::new(Shape::Square, 3, SizeKind::Diameter).unwrap();
//! assert_eq!(se.len(), 9);
//! assert!(Strel::new(Shape::Diamond, 4, SizeKind::Diameter).is_err());
//! ```

use crate::{OpsError, OpsResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shape of a flat structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    /// Square (planar).
    Square,
    /// Discrete disk (planar).
    Disk,
    /// Octagon, between square and disk (planar).
    Octagon,
    /// Diamond, the L1 ball (planar).
    Diamond,
    /// Horizontal line segment.
    LineHoriz,
    /// Vertical line segment.
    LineVert,
    /// Diagonal segment rising to the right (45 degrees).
    LineDiagUp,
    /// Diagonal segment falling to the right (135 degrees).
    LineDiagDown,
    /// Cube (volumetric).
    Cube,
    /// Discrete ball (volumetric).
    Ball,
}

impl Shape {
    /// All shapes, in display order.
    pub const ALL: [Shape; 10] = [
        Shape::Square,
        Shape::Disk,
        Shape::Octagon,
        Shape::Diamond,
        Shape::LineHoriz,
        Shape::LineVert,
        Shape::LineDiagUp,
        Shape::LineDiagDown,
        Shape::Cube,
        Shape::Ball,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Shape::Square => "Square",
            Shape::Disk => "Disk",
            Shape::Octagon => "Octagon",
            Shape::Diamond => "Diamond",
            Shape::LineHoriz => "Horizontal Line",
            Shape::LineVert => "Vertical Line",
            Shape::LineDiagUp => "Line 45 degrees",
            Shape::LineDiagDown => "Line 135 degrees",
            Shape::Cube => "Cube",
            Shape::Ball => "Ball",
        }
    }

    /// Short code used in result file names.
    pub fn code(self) -> &'static str {
        match self {
            Shape::Square => "Sq",
            Shape::Disk => "Dsk",
            Shape::Octagon => "Oct",
            Shape::Diamond => "Dmd",
            Shape::LineHoriz => "LinH",
            Shape::LineVert => "LinV",
            Shape::LineDiagUp => "LinU",
            Shape::LineDiagDown => "LinD",
            Shape::Cube => "Cub",
            Shape::Ball => "Bal",
        }
    }

    /// Labels of all shapes.
    pub fn all_labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.label()).collect()
    }

    /// Returns `true` for shapes with a z extent.
    pub fn is_3d(self) -> bool {
        matches!(self, Shape::Cube | Shape::Ball)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Shape {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        let shape = match key.as_str() {
            "square" | "sq" => Shape::Square,
            "disk" | "dsk" => Shape::Disk,
            "octagon" | "oct" => Shape::Octagon,
            "diamond" | "dmd" => Shape::Diamond,
            "horizontal line" | "line-horiz" | "line-h" | "linh" => Shape::LineHoriz,
            "vertical line" | "line-vert" | "line-v" | "linv" => Shape::LineVert,
            "line 45 degrees" | "line-diag-up" | "line-45" | "linu" => Shape::LineDiagUp,
            "line 135 degrees" | "line-diag-down" | "line-135" | "lind" => Shape::LineDiagDown,
            "cube" | "cub" => Shape::Cube,
            "ball" | "bal" => Shape::Ball,
            _ => {
                return Err(OpsError::UnknownLabel {
                    kind: "shape",
                    label: s.to_string(),
                })
            }
        };
        Ok(shape)
    }
}

/// How a structuring element size is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeKind {
    /// Full extent in pixels; diameter 1 is the identity element.
    #[default]
    Diameter,
    /// Half extent in pixels; radius 0 is the identity element.
    Radius,
}

impl SizeKind {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            SizeKind::Diameter => "Diameter",
            SizeKind::Radius => "Radius",
        }
    }

    /// Size at which the element reduces to the origin.
    pub fn identity_size(self) -> u32 {
        match self {
            SizeKind::Diameter => 1,
            SizeKind::Radius => 0,
        }
    }
}

impl fmt::Display for SizeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SizeKind {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "diameter" | "diam" | "d" => Ok(SizeKind::Diameter),
            "radius" | "r" => Ok(SizeKind::Radius),
            _ => Err(OpsError::UnknownLabel {
                kind: "size kind",
                label: s.to_string(),
            }),
        }
    }
}

/// Flat structuring element as a list of offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct Strel {
    shape: Shape,
    size: u32,
    kind: SizeKind,
    offsets: Vec<[i32; 3]>,
}

impl Strel {
    /// Builds the element for `shape` at `size`, interpreted per `kind`.
    ///
    /// # Errors
    ///
    /// - diameter 0 (the smallest element has diameter 1)
    /// - even diameter for [`Shape::Diamond`]
    pub fn new(shape: Shape, size: u32, kind: SizeKind) -> OpsResult<Self> {
        if kind == SizeKind::Diameter && size == 0 {
            return Err(OpsError::InvalidParameter(
                "structuring element diameter must be at least 1".into(),
            ));
        }
        if kind == SizeKind::Diameter && shape == Shape::Diamond && size % 2 == 0 {
            return Err(OpsError::InvalidParameter(format!(
                "diamond diameter must be odd, got {}",
                size
            )));
        }

        // (lo, hi) offsets along the principal axes
        let (lo, hi) = match kind {
            SizeKind::Radius => (-(size as i32), size as i32),
            SizeKind::Diameter => {
                let lo = -(((size - 1) / 2) as i32);
                (lo, lo + size as i32 - 1)
            }
        };
        // radius for the isotropic shapes, rounding even diameters down
        let r = match kind {
            SizeKind::Radius => size as i32,
            SizeKind::Diameter => ((size - 1) / 2) as i32,
        };

        let mut offsets = Vec::new();
        match shape {
            Shape::Square => {
                for dy in lo..=hi {
                    for dx in lo..=hi {
                        offsets.push([dx, dy, 0]);
                    }
                }
            }
            Shape::Cube => {
                for dz in lo..=hi {
                    for dy in lo..=hi {
                        for dx in lo..=hi {
                            offsets.push([dx, dy, dz]);
                        }
                    }
                }
            }
            Shape::Disk => {
                let limit = (r as f64 + 0.5).powi(2);
                for dy in -r..=r {
                    for dx in -r..=r {
                        if ((dx * dx + dy * dy) as f64) <= limit {
                            offsets.push([dx, dy, 0]);
                        }
                    }
                }
            }
            Shape::Ball => {
                let limit = (r as f64 + 0.5).powi(2);
                for dz in -r..=r {
                    for dy in -r..=r {
                        for dx in -r..=r {
                            if ((dx * dx + dy * dy + dz * dz) as f64) <= limit {
                                offsets.push([dx, dy, dz]);
                            }
                        }
                    }
                }
            }
            Shape::Diamond => {
                for dy in -r..=r {
                    for dx in -r..=r {
                        if dx.abs() + dy.abs() <= r {
                            offsets.push([dx, dy, 0]);
                        }
                    }
                }
            }
            Shape::Octagon => {
                let cut = (r as f64 * std::f64::consts::SQRT_2).round() as i32;
                for dy in -r..=r {
                    for dx in -r..=r {
                        if dx.abs() + dy.abs() <= cut {
                            offsets.push([dx, dy, 0]);
                        }
                    }
                }
            }
            Shape::LineHoriz => offsets.extend((lo..=hi).map(|k| [k, 0, 0])),
            Shape::LineVert => offsets.extend((lo..=hi).map(|k| [0, k, 0])),
            // image y grows downward, so "up" means -y
            Shape::LineDiagUp => offsets.extend((lo..=hi).map(|k| [k, -k, 0])),
            Shape::LineDiagDown => offsets.extend((lo..=hi).map(|k| [k, k, 0])),
        }

        Ok(Self {
            shape,
            size,
            kind,
            offsets,
        })
    }

    /// Builds the element from a radius.
    pub fn from_radius(shape: Shape, radius: u32) -> OpsResult<Self> {
        Self::new(shape, radius, SizeKind::Radius)
    }

    /// Builds the element from a diameter.
    pub fn from_diameter(shape: Shape, diameter: u32) -> OpsResult<Self> {
        Self::new(shape, diameter, SizeKind::Diameter)
    }

    /// Element shape.
    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Requested size.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// How [`size`](Self::size) is interpreted.
    #[inline]
    pub fn size_kind(&self) -> SizeKind {
        self.kind
    }

    /// Offsets `[dx, dy, dz]` of the active cells.
    #[inline]
    pub fn offsets(&self) -> &[[i32; 3]] {
        &self.offsets
    }

    /// Number of active cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Always `false`: every element contains its origin.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Returns `true` if any offset leaves the z = 0 plane.
    pub fn is_3d(&self) -> bool {
        self.offsets.iter().any(|o| o[2] != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_offsets() {
        let se = Strel::from_radius(Shape::Square, 1).unwrap();
        assert_eq!(se.len(), 9);
        assert!(se.offsets().contains(&[0, 0, 0]));
        assert!(se.offsets().contains(&[-1, -1, 0]));
        assert!(se.offsets().contains(&[1, 1, 0]));
    }

    #[test]
    fn test_even_diameter_square() {
        let se = Strel::from_diameter(Shape::Square, 2).unwrap();
        assert_eq!(se.len(), 4);
        assert!(se.offsets().contains(&[0, 0, 0]));
        assert!(se.offsets().contains(&[1, 1, 0]));
        assert!(!se.offsets().contains(&[-1, 0, 0]));
    }

    #[test]
    fn test_identity_sizes() {
        for shape in Shape::ALL {
            let by_diam = Strel::from_diameter(shape, 1).unwrap();
            let by_radius = Strel::from_radius(shape, 0).unwrap();
            assert_eq!(by_diam.offsets(), &[[0, 0, 0]], "{shape}");
            assert_eq!(by_radius.offsets(), &[[0, 0, 0]], "{shape}");
        }
    }

    #[test]
    fn test_every_element_contains_origin() {
        for shape in Shape::ALL {
            for size in 1..6 {
                let kind = if shape == Shape::Diamond {
                    SizeKind::Radius
                } else {
                    SizeKind::Diameter
                };
                let se = Strel::new(shape, size, kind).unwrap();
                assert!(se.offsets().contains(&[0, 0, 0]), "{shape} {size}");
            }
        }
    }

    #[test]
    fn test_diamond_offsets() {
        let se = Strel::from_diameter(Shape::Diamond, 3).unwrap();
        assert_eq!(se.len(), 5);
        assert!(!se.offsets().contains(&[1, 1, 0]));
        assert!(Strel::from_diameter(Shape::Diamond, 4).is_err());
    }

    #[test]
    fn test_zero_diameter_rejected() {
        assert!(matches!(
            Strel::from_diameter(Shape::Square, 0),
            Err(OpsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_lines() {
        let h = Strel::from_diameter(Shape::LineHoriz, 5).unwrap();
        assert_eq!(h.len(), 5);
        assert!(h.offsets().iter().all(|o| o[1] == 0));

        let up = Strel::from_radius(Shape::LineDiagUp, 2).unwrap();
        assert!(up.offsets().contains(&[2, -2, 0]));
        let down = Strel::from_radius(Shape::LineDiagDown, 2).unwrap();
        assert!(down.offsets().contains(&[2, 2, 0]));
    }

    #[test]
    fn test_disk_between_diamond_and_square() {
        let disk = Strel::from_radius(Shape::Disk, 3).unwrap();
        let diamond = Strel::from_radius(Shape::Diamond, 3).unwrap();
        let square = Strel::from_radius(Shape::Square, 3).unwrap();
        let octagon = Strel::from_radius(Shape::Octagon, 3).unwrap();
        assert!(diamond.len() < disk.len() && disk.len() < square.len());
        assert!(diamond.len() < octagon.len() && octagon.len() < square.len());
    }

    #[test]
    fn test_3d_shapes() {
        let cube = Strel::from_radius(Shape::Cube, 1).unwrap();
        assert_eq!(cube.len(), 27);
        assert!(cube.is_3d());
        let ball = Strel::from_radius(Shape::Ball, 1).unwrap();
        assert!(ball.is_3d());
        assert!(!Strel::from_radius(Shape::Disk, 2).unwrap().is_3d());
    }

    #[test]
    fn test_shape_labels_roundtrip() {
        for shape in Shape::ALL {
            assert_eq!(shape.label().parse::<Shape>().unwrap(), shape);
            assert_eq!(shape.code().parse::<Shape>().unwrap(), shape);
        }
        assert_eq!("LINE-H".parse::<Shape>().unwrap(), Shape::LineHoriz);
        assert!(matches!(
            "hexagon".parse::<Shape>(),
            Err(OpsError::UnknownLabel { kind: "shape", .. })
        ));
    }

    #[test]
    fn test_size_kind_parse() {
        assert_eq!("Radius".parse::<SizeKind>().unwrap(), SizeKind::Radius);
        assert_eq!("diameter".parse::<SizeKind>().unwrap(), SizeKind::Diameter);
        assert!("width".parse::<SizeKind>().is_err());
        assert_eq!(SizeKind::Diameter.identity_size(), 1);
        assert_eq!(SizeKind::Radius.identity_size(), 0);
    }
}
