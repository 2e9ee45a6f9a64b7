//! Eye (finder ring) and pupil (finder center) generators.
//!
//! Outlines are authored once in a unit square oriented for the top-left
//! eye, then mirrored for the other corners so that rounded "outer" corners
//! always face away from the symbol. The [`CornerMask`] therefore names
//! corners in that top-left local space.

use strum_macros::{EnumIter, EnumMessage, EnumString, IntoStaticStr};

use crate::error::{QrRenderError, Result};
use crate::geometry::{self, Affine, BezPath, CornerMask, PathExt, Rect, Size, MIRROR_X, MIRROR_Y, UNIT};
use crate::matrix::{BoolMatrix, CellLayout, EyePosition, EYE_SIZE, PUPIL_SIZE};
use crate::registry::Generator;
use crate::settings::{self, SettingKey, SettingValue};

/// Corners a leaf rounds by default: top-left and bottom-right.
const LEAF_CORNERS: CornerMask = CornerMask::TOP_LEFT.union(CornerMask::BOTTOM_RIGHT);
const LEAF_RADIUS: f64 = 0.76;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter, EnumMessage)]
#[strum(serialize_all = "camelCase")]
pub enum EyeShape {
    #[strum(message = "Square")]
    Square,
    #[strum(message = "Circle")]
    Circle,
    #[strum(message = "Rounded rectangle")]
    RoundedRect,
    #[strum(message = "Leaf")]
    Leaf,
    #[strum(message = "Squircle")]
    Squircle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter, EnumMessage)]
#[strum(serialize_all = "camelCase")]
pub enum PupilShape {
    #[strum(message = "Square")]
    Square,
    #[strum(message = "Circle")]
    Circle,
    #[strum(message = "Rounded rectangle")]
    RoundedRect,
    #[strum(message = "Leaf")]
    Leaf,
    #[strum(message = "Squircle")]
    Squircle,
    #[strum(message = "Cross")]
    Cross,
    #[strum(message = "Horizontal bars")]
    BarsHorizontal,
}

const FLIP_KEYS: &[SettingKey] = &[SettingKey::IsFlipped];
const ROUNDED_KEYS: &[SettingKey] = &[SettingKey::CornerRadiusFraction, SettingKey::Corners, SettingKey::IsFlipped];
const LEAF_KEYS: &[SettingKey] = &[SettingKey::Corners, SettingKey::IsFlipped];
const NO_KEYS: &[SettingKey] = &[];

/// Configuration shared by eye and pupil outlines.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Outline {
    corner_radius_fraction: f64,
    corners: CornerMask,
    is_flipped: bool,
}

impl Outline {
    fn get(&self, key: SettingKey) -> Option<SettingValue> {
        match key {
            SettingKey::CornerRadiusFraction => Some(self.corner_radius_fraction.into()),
            SettingKey::Corners => Some(self.corners.bits().into()),
            SettingKey::IsFlipped => Some(self.is_flipped.into()),
            _ => None,
        }
    }

    fn set(&mut self, key: SettingKey, value: &SettingValue, owner: &str) -> Result<()> {
        match key {
            SettingKey::CornerRadiusFraction => self.corner_radius_fraction = settings::fraction(key, value)?,
            SettingKey::IsFlipped => self.is_flipped = settings::boolean(key, value)?,
            SettingKey::Corners => {
                self.corners = value
                    .as_f64()
                    .filter(|v| v.fract() == 0.0 && (0.0..=15.0).contains(v))
                    .and_then(|v| CornerMask::from_bits(v as u8))
                    .ok_or_else(|| QrRenderError::invalid_setting(key.name(), "expected an integer mask 0..=15"))?
            }
            _ => return Err(settings::unsupported(key, owner)),
        }
        Ok(())
    }
}

/// Maps the unit square onto the `span`-module square `offset` modules into
/// the eye at `position`, mirrored for that corner.
fn placement(
    matrix: &BoolMatrix,
    layout: &CellLayout,
    position: EyePosition,
    offset: usize,
    span: usize,
    flipped: bool,
) -> Option<Affine> {
    let (r0, c0) = matrix.eye_origin(position)?;
    let rect = layout.span(r0 + offset, c0 + offset, span, span);
    let local = if flipped { MIRROR_X } else { Affine::IDENTITY };
    let corner = match position {
        EyePosition::TopLeft => Affine::IDENTITY,
        EyePosition::TopRight => MIRROR_X,
        EyePosition::BottomLeft => MIRROR_Y,
    };
    Some(Affine::map_unit_square(rect) * corner * local)
}

/// Maps `unit` through `t`, keeping clockwise winding when `t` mirrors.
fn placed(unit: &BezPath, t: Affine) -> BezPath {
    let mut out = BezPath::new();
    if t.determinant() < 0.0 {
        out.add_transformed(&unit.reverse_subpaths(), t);
    } else {
        out.add_transformed(unit, t);
    }
    out
}

fn squircle(r: Rect) -> BezPath {
    let mut p = BezPath::new();
    p.move_to((0.5, 0.0));
    p.curve_to((0.85, 0.0), (1.0, 0.15), (1.0, 0.5));
    p.curve_to((1.0, 0.85), (0.85, 1.0), (0.5, 1.0));
    p.curve_to((0.15, 1.0), (0.0, 0.85), (0.0, 0.5));
    p.curve_to((0.0, 0.15), (0.15, 0.0), (0.5, 0.0));
    p.close_path();
    p.apply_affine(Affine::map_unit_square(r));
    p
}

/*---- Eyes ----*/

#[derive(Debug, Clone, PartialEq)]
pub struct EyeGenerator {
    shape: EyeShape,
    outline: Outline,
}

impl Default for EyeGenerator {
    fn default() -> Self {
        Self::from_kind(EyeShape::Square)
    }
}

impl EyeGenerator {
    pub fn new(shape: EyeShape) -> Self {
        Self::from_kind(shape)
    }

    /// The pupil drawn when a design does not pick one explicitly.
    pub fn default_pupil(&self) -> PupilGenerator {
        let mut pupil = PupilGenerator::from_kind(match self.shape {
            EyeShape::Square => PupilShape::Square,
            EyeShape::Circle => PupilShape::Circle,
            EyeShape::RoundedRect => PupilShape::RoundedRect,
            EyeShape::Leaf => PupilShape::Leaf,
            EyeShape::Squircle => PupilShape::Squircle,
        });
        pupil.outline.corners = self.outline.corners;
        pupil.outline.is_flipped = self.outline.is_flipped;
        pupil
    }

    /// The ring in unit space: outer outline plus a reversed hole one module in.
    fn unit_ring(&self) -> BezPath {
        let outer = UNIT;
        let m = 1.0 / EYE_SIZE as f64;
        let inner = geometry::rect(m, m, 1.0 - 2.0 * m, 1.0 - 2.0 * m);
        let ratio = inner.width();
        let mut ring = BezPath::new();
        let mut hole = BezPath::new();
        match self.shape {
            EyeShape::Square => {
                ring.add_rect(outer);
                hole.add_rect(inner);
            }
            EyeShape::Circle => {
                ring.add_ellipse(outer);
                hole.add_ellipse(inner);
            }
            EyeShape::RoundedRect | EyeShape::Leaf => {
                let fraction = if self.shape == EyeShape::Leaf {
                    LEAF_RADIUS
                } else {
                    self.outline.corner_radius_fraction
                };
                let radius = fraction / 2.0;
                ring.add_rounded_rect(outer, radius, self.outline.corners);
                hole.add_rounded_rect(inner, radius * ratio, self.outline.corners);
            }
            EyeShape::Squircle => {
                ring.add_path(&squircle(outer));
                hole.add_path(&squircle(inner));
            }
        }
        ring.add_reversed(&hole);
        ring
    }

    /// Ring outline for a single eye, or `None` if the matrix has no eyes.
    pub fn path_at(&self, matrix: &BoolMatrix, size: Size, position: EyePosition) -> Option<BezPath> {
        let layout = CellLayout::new(matrix.dimension(), size);
        let t = placement(matrix, &layout, position, 0, EYE_SIZE, self.outline.is_flipped)?;
        Some(placed(&self.unit_ring(), t))
    }

    /// All three eye rings.
    pub fn generate_path(&self, matrix: &BoolMatrix, size: Size) -> BezPath {
        let mut path = BezPath::new();
        for position in EyePosition::ALL {
            if let Some(p) = self.path_at(matrix, size, position) {
                path.add_path(&p);
            }
        }
        path
    }
}

impl Generator for EyeGenerator {
    type Kind = EyeShape;
    const FAMILY: &'static str = "eye";

    fn from_kind(shape: EyeShape) -> Self {
        let corners = if shape == EyeShape::Leaf { LEAF_CORNERS } else { CornerMask::ALL };
        Self {
            shape,
            outline: Outline {
                corner_radius_fraction: 0.65,
                corners,
                is_flipped: false,
            },
        }
    }

    fn kind(&self) -> EyeShape {
        self.shape
    }

    fn supported_keys(&self) -> &'static [SettingKey] {
        match self.shape {
            EyeShape::Square => FLIP_KEYS,
            EyeShape::RoundedRect => ROUNDED_KEYS,
            EyeShape::Leaf => LEAF_KEYS,
            EyeShape::Circle | EyeShape::Squircle => NO_KEYS,
        }
    }

    fn get_setting(&self, key: SettingKey) -> Option<SettingValue> {
        if !self.supports_setting(key) {
            return None;
        }
        self.outline.get(key)
    }

    fn try_set_setting(&mut self, key: SettingKey, value: &SettingValue) -> Result<()> {
        if !self.supports_setting(key) {
            return Err(settings::unsupported(key, self.name()));
        }
        self.outline.set(key, value, self.name())
    }

    fn sample_path(&self, size: Size) -> BezPath {
        let side = size.min_side();
        let t = Affine::map_unit_square(geometry::rect(0.0, 0.0, side, side));
        let mut path = placed(&self.unit_ring(), t);
        let m = PUPIL_SIZE as f64 / EYE_SIZE as f64;
        let pupil_rect = geometry::rect(2.0 / EYE_SIZE as f64, 2.0 / EYE_SIZE as f64, m, m);
        path.add_transformed(&self.default_pupil().unit_outline(), t * Affine::map_unit_square(pupil_rect));
        path
    }
}

/*---- Pupils ----*/

#[derive(Debug, Clone, PartialEq)]
pub struct PupilGenerator {
    shape: PupilShape,
    outline: Outline,
}

impl Default for PupilGenerator {
    fn default() -> Self {
        Self::from_kind(PupilShape::Square)
    }
}

impl PupilGenerator {
    pub fn new(shape: PupilShape) -> Self {
        Self::from_kind(shape)
    }

    fn unit_outline(&self) -> BezPath {
        let mut p = BezPath::new();
        match self.shape {
            PupilShape::Square => p.add_rect(UNIT),
            PupilShape::Circle => p.add_ellipse(UNIT),
            PupilShape::RoundedRect => {
                p.add_rounded_rect(UNIT, self.outline.corner_radius_fraction / 2.0, self.outline.corners)
            }
            PupilShape::Leaf => p.add_rounded_rect(UNIT, LEAF_RADIUS / 2.0, self.outline.corners),
            PupilShape::Squircle => p.add_path(&squircle(UNIT)),
            PupilShape::Cross => {
                let third = 1.0 / 3.0;
                p.add_rect(geometry::rect(third, 0.0, third, 1.0));
                p.add_rect(geometry::rect(0.0, third, 1.0, third));
            }
            PupilShape::BarsHorizontal => {
                let gap = 0.04;
                let h = (1.0 - 2.0 * gap) / 3.0;
                for i in 0..3 {
                    let bar = geometry::rect(0.0, i as f64 * (h + gap), 1.0, h);
                    p.add_rounded_rect(bar, self.outline.corner_radius_fraction * h / 2.0, CornerMask::ALL);
                }
            }
        }
        p
    }

    pub fn path_at(&self, matrix: &BoolMatrix, size: Size, position: EyePosition) -> Option<BezPath> {
        let layout = CellLayout::new(matrix.dimension(), size);
        let t = placement(matrix, &layout, position, 2, PUPIL_SIZE, self.outline.is_flipped)?;
        Some(placed(&self.unit_outline(), t))
    }

    /// All three pupils.
    pub fn generate_path(&self, matrix: &BoolMatrix, size: Size) -> BezPath {
        let mut path = BezPath::new();
        for position in EyePosition::ALL {
            if let Some(p) = self.path_at(matrix, size, position) {
                path.add_path(&p);
            }
        }
        path
    }
}

impl Generator for PupilGenerator {
    type Kind = PupilShape;
    const FAMILY: &'static str = "pupil";

    fn from_kind(shape: PupilShape) -> Self {
        let corners = if shape == PupilShape::Leaf { LEAF_CORNERS } else { CornerMask::ALL };
        let corner_radius_fraction = if shape == PupilShape::BarsHorizontal { 1.0 } else { 0.65 };
        Self {
            shape,
            outline: Outline {
                corner_radius_fraction,
                corners,
                is_flipped: false,
            },
        }
    }

    fn kind(&self) -> PupilShape {
        self.shape
    }

    fn supported_keys(&self) -> &'static [SettingKey] {
        match self.shape {
            PupilShape::Square => FLIP_KEYS,
            PupilShape::RoundedRect => ROUNDED_KEYS,
            PupilShape::Leaf => LEAF_KEYS,
            PupilShape::BarsHorizontal => &[SettingKey::CornerRadiusFraction],
            PupilShape::Circle | PupilShape::Squircle | PupilShape::Cross => NO_KEYS,
        }
    }

    fn get_setting(&self, key: SettingKey) -> Option<SettingValue> {
        if !self.supports_setting(key) {
            return None;
        }
        self.outline.get(key)
    }

    fn try_set_setting(&mut self, key: SettingKey, value: &SettingValue) -> Result<()> {
        if !self.supports_setting(key) {
            return Err(settings::unsupported(key, self.name()));
        }
        self.outline.set(key, value, self.name())
    }

    fn sample_path(&self, size: Size) -> BezPath {
        let side = size.min_side();
        placed(&self.unit_outline(), Affine::map_unit_square(geometry::rect(0.0, 0.0, side, side)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{rect, Shape};
    use crate::registry::Factory;
    use pretty_assertions::assert_eq;

    fn close(a: Rect, b: Rect) -> bool {
        let eps = 1e-6;
        (a.x0 - b.x0).abs() < eps && (a.y0 - b.y0).abs() < eps && (a.x1 - b.x1).abs() < eps && (a.y1 - b.y1).abs() < eps
    }

    #[test]
    fn test_eyes_land_on_finder_patterns() {
        let m = BoolMatrix::new(21);
        let eye = EyeGenerator::new(EyeShape::Square);
        let size = Size::new(210.0, 210.0);
        let tl = eye.path_at(&m, size, EyePosition::TopLeft).unwrap();
        let tr = eye.path_at(&m, size, EyePosition::TopRight).unwrap();
        let bl = eye.path_at(&m, size, EyePosition::BottomLeft).unwrap();
        assert!(close(tl.bounds().unwrap(), rect(0.0, 0.0, 70.0, 70.0)));
        assert!(close(tr.bounds().unwrap(), rect(140.0, 0.0, 70.0, 70.0)));
        assert!(close(bl.bounds().unwrap(), rect(0.0, 140.0, 70.0, 70.0)));
        assert_eq!(eye.generate_path(&m, size).subpath_count(), 6);
    }

    #[test]
    fn test_ring_leaves_a_hole() {
        let m = BoolMatrix::new(21);
        let size = Size::new(210.0, 210.0);
        for position in EyePosition::ALL {
            let ring = EyeGenerator::new(EyeShape::Square).path_at(&m, size, position).unwrap();
            // 70x70 outline minus the 50x50 hole, whichever way the corner mirrors.
            assert!((ring.area().abs() - (4900.0 - 2500.0)).abs() < 1e-6, "{:?}", position);
        }
    }

    #[test]
    fn test_pupils_sit_inside_eyes() {
        let m = BoolMatrix::new(25).expanded(2).unwrap();
        let pupil = PupilGenerator::new(PupilShape::Circle);
        let p = pupil.path_at(&m, Size::new(290.0, 290.0), EyePosition::BottomLeft).unwrap();
        // 29 modules of 10 units; the bottom-left eye starts at (20, 2).
        let b = p.bounds().unwrap();
        assert!((b.x0 - 40.0).abs() < 1e-3 && (b.y0 - 220.0).abs() < 1e-3);
        assert!((b.width() - 30.0).abs() < 1e-3 && (b.height() - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_no_eyes_on_small_matrix() {
        let m = BoolMatrix::new(9);
        assert!(EyeGenerator::default().generate_path(&m, Size::new(90.0, 90.0)).is_empty());
    }

    #[test]
    fn test_leaf_is_mirrored_per_corner() {
        let m = BoolMatrix::new(21);
        let eye = EyeGenerator::new(EyeShape::Leaf);
        let size = Size::new(210.0, 210.0);
        let tl = eye.path_at(&m, size, EyePosition::TopLeft).unwrap();
        let tr = eye.path_at(&m, size, EyePosition::TopRight).unwrap();
        let mirror = Affine::new([-1.0, 0.0, 0.0, 1.0, 210.0, 0.0]);
        assert!(close((mirror * tl.clone()).bounds().unwrap(), tr.bounds().unwrap()));
        // Mirrored placement still winds the same way round.
        assert!((tl.area() - tr.area()).abs() < 1e-6);
    }

    #[test]
    fn test_flip_changes_leaf() {
        let m = BoolMatrix::new(21);
        let mut eye = EyeGenerator::new(EyeShape::Leaf);
        let before = eye.generate_path(&m, Size::new(210.0, 210.0));
        assert!(eye.set_setting(SettingKey::IsFlipped, true));
        assert_ne!(before, eye.generate_path(&m, Size::new(210.0, 210.0)));
    }

    #[test]
    fn test_corner_mask_setting() {
        let mut eye = EyeGenerator::new(EyeShape::RoundedRect);
        assert!(eye.set_setting(SettingKey::Corners, 5u8));
        assert_eq!(eye.get_setting(SettingKey::Corners), Some(SettingValue::Number(5.0)));
        assert!(!eye.set_setting(SettingKey::Corners, 16u8));
        assert!(!eye.set_setting(SettingKey::Corners, 2.5));
        assert_eq!(eye.get_setting(SettingKey::Corners), Some(SettingValue::Number(5.0)));
        assert!(!EyeGenerator::new(EyeShape::Circle).set_setting(SettingKey::Corners, 1u8));
    }

    #[test]
    fn test_default_pupil_follows_eye() {
        let factory = Factory::<EyeGenerator>::new();
        for name in factory.available_names() {
            let eye = factory.create(name, None).unwrap();
            assert_eq!(eye.default_pupil().name(), name);
        }
    }
}
