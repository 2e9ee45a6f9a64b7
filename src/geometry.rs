//! Vector geometry shared by every generator, on top of [`kurbo`].
//!
//! Paths are plain [`BezPath`]s so two renders can be compared element by
//! element and a canvas can replay them as-is. Filling uses the nonzero
//! winding rule. Every builder here winds clockwise in y-down space, so a
//! hole is an inner subpath added with [`PathExt::add_reversed`].
//!
//! Outlines are mostly authored in the unit square ([`UNIT`]) and mapped
//! into place with an [`Affine`].

use std::f64::consts::PI;

pub use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape, Size};
use kurbo::{Ellipse, Insets, RoundedRect, RoundedRectRadii};

/// Arc flattening tolerance. Unit-space outlines are scaled up by the cell
/// size afterwards, so this sits well below a module.
pub const TOLERANCE: f64 = 1e-4;

/// The unit square outlines are authored in.
pub const UNIT: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

/// Mirrors the unit square left to right.
pub const MIRROR_X: Affine = Affine::new([-1.0, 0.0, 0.0, 1.0, 1.0, 0.0]);

/// Mirrors the unit square top to bottom.
pub const MIRROR_Y: Affine = Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, 1.0]);

/// Per-corner rounding flags. Bit layout: top-left 1, top-right 2,
/// bottom-left 4, bottom-right 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CornerMask(u8);

impl CornerMask {
    pub const NONE: CornerMask = CornerMask(0);
    pub const TOP_LEFT: CornerMask = CornerMask(1);
    pub const TOP_RIGHT: CornerMask = CornerMask(2);
    pub const BOTTOM_LEFT: CornerMask = CornerMask(4);
    pub const BOTTOM_RIGHT: CornerMask = CornerMask(8);
    pub const ALL: CornerMask = CornerMask(15);

    /// Returns `None` when bits outside the low nibble are set.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits > 15 {
            None
        } else {
            Some(CornerMask(bits))
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: CornerMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: CornerMask) -> CornerMask {
        CornerMask(self.0 | other.0)
    }

    /// `radius` on the corners in the mask, square elsewhere.
    pub fn radii(self, radius: f64) -> RoundedRectRadii {
        let r = |corner: CornerMask| if self.contains(corner) { radius } else { 0.0 };
        RoundedRectRadii::new(
            r(CornerMask::TOP_LEFT),
            r(CornerMask::TOP_RIGHT),
            r(CornerMask::BOTTOM_RIGHT),
            r(CornerMask::BOTTOM_LEFT),
        )
    }
}

impl Default for CornerMask {
    fn default() -> Self {
        CornerMask::ALL
    }
}

/// Rect from its top-left corner and extent.
pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::from_origin_size((x, y), (width, height))
}

/// Moves every edge inwards by `dx`/`dy`. `None` once nothing is left.
pub fn shrink(r: Rect, dx: f64, dy: f64) -> Option<Rect> {
    let out = r.inset(Insets::uniform_xy(-dx, -dy));
    (out.width() > 0.0 && out.height() > 0.0).then_some(out)
}

/// Strict overlap: rects that only share an edge do not overlap.
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.intersect(b).area() > 0.0
}

/// Maps a rect given in unit space into `outer`.
pub fn map_unit(outer: Rect, unit: Rect) -> Rect {
    Affine::map_unit_square(outer).transform_rect_bbox(unit)
}

/// Rotation by `fraction` of a half turn around `center`.
pub fn rotate_about(fraction: f64, center: Point) -> Affine {
    let c = center.to_vec2();
    Affine::translate(c) * Affine::rotate(fraction * PI) * Affine::translate(-c)
}

/// Builders and queries the generators need on top of [`BezPath`].
pub trait PathExt {
    fn add_rect(&mut self, r: Rect);

    fn add_ellipse(&mut self, r: Rect);

    /// Rounds only the corners in `corners`, by `radius` clamped to half the
    /// short side. A zero radius or an empty mask gives a plain rect.
    fn add_rounded_rect(&mut self, r: Rect, radius: f64, corners: CornerMask);

    fn add_path(&mut self, other: &BezPath);

    fn add_transformed(&mut self, other: &BezPath, t: Affine);

    /// Appends `other` with the direction of every subpath flipped.
    fn add_reversed(&mut self, other: &BezPath);

    /// Number of subpaths (one per `MoveTo`).
    fn subpath_count(&self) -> usize;

    /// Bounding box, `None` for an empty path.
    fn bounds(&self) -> Option<Rect>;

    /// SVG path data with coordinates rounded to three decimals.
    fn to_svg_data(&self) -> String;
}

impl PathExt for BezPath {
    fn add_rect(&mut self, r: Rect) {
        for el in r.path_elements(TOLERANCE) {
            self.push(el);
        }
    }

    fn add_ellipse(&mut self, r: Rect) {
        for el in Ellipse::from_rect(r).path_elements(TOLERANCE) {
            self.push(el);
        }
    }

    fn add_rounded_rect(&mut self, r: Rect, radius: f64, corners: CornerMask) {
        let radius = radius.clamp(0.0, r.width().min(r.height()) / 2.0);
        if radius <= 0.0 || corners == CornerMask::NONE {
            self.add_rect(r);
            return;
        }
        for el in RoundedRect::from_rect(r, corners.radii(radius)).path_elements(TOLERANCE) {
            self.push(el);
        }
    }

    fn add_path(&mut self, other: &BezPath) {
        for &el in other.elements() {
            self.push(el);
        }
    }

    fn add_transformed(&mut self, other: &BezPath, t: Affine) {
        let mut mapped = other.clone();
        mapped.apply_affine(t);
        self.add_path(&mapped);
    }

    fn add_reversed(&mut self, other: &BezPath) {
        self.add_path(&other.reverse_subpaths());
    }

    fn subpath_count(&self) -> usize {
        self.elements()
            .iter()
            .filter(|el| matches!(el, PathEl::MoveTo(_)))
            .count()
    }

    fn bounds(&self) -> Option<Rect> {
        (!self.is_empty()).then(|| self.bounding_box())
    }

    fn to_svg_data(&self) -> String {
        let rounded: BezPath = self.elements().iter().map(|&el| round_el(el)).collect();
        rounded.to_svg()
    }
}

/// Three decimals, with negative zero folded into zero.
fn round3(v: f64) -> f64 {
    let r = (v * 1000.0).round() / 1000.0;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

fn round_el(el: PathEl) -> PathEl {
    let p = |p: Point| Point::new(round3(p.x), round3(p.y));
    match el {
        PathEl::MoveTo(a) => PathEl::MoveTo(p(a)),
        PathEl::LineTo(a) => PathEl::LineTo(p(a)),
        PathEl::QuadTo(a, b) => PathEl::QuadTo(p(a), p(b)),
        PathEl::CurveTo(a, b, c) => PathEl::CurveTo(p(a), p(b), p(c)),
        PathEl::ClosePath => PathEl::ClosePath,
    }
}

/// Number formatting for SVG attributes, matching [`PathExt::to_svg_data`].
pub(crate) fn num(v: f64) -> String {
    format!("{}", round3(v))
}
