//! Pixel generators: the shapes drawn for content modules.
//!
//! A [`PixelGenerator`] draws every `true` content cell of the matrix it is
//! given. Eye, pupil and margin cells are skipped, so the same generator
//! serves the on-pixel pass (the partitioned matrix) and the off-pixel pass
//! (its inverse).

use strum_macros::{EnumIter, EnumMessage, EnumString, IntoStaticStr};

use crate::error::{QrRenderError, Result};
use crate::geometry::{self, Affine, BezPath, CornerMask, PathExt, Point, Size, UNIT};
use crate::matrix::{BoolMatrix, CellKind, CellLayout};
use crate::registry::{Factory, Generator};
use crate::settings::{self, SettingKey, SettingValue};
use crate::value::{ValueGenerator, ValueKind};

const KAPPA: f64 = 0.552_284_749_8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter, EnumMessage)]
#[strum(serialize_all = "camelCase")]
pub enum PixelShape {
    #[strum(message = "Square")]
    Square,
    #[strum(message = "Circle")]
    Circle,
    #[strum(message = "Rounded rectangle")]
    RoundedRect,
    /// Same-row runs merged into one shape.
    #[strum(message = "Horizontal")]
    Horizontal,
    /// Same-column runs merged into one shape.
    #[strum(message = "Vertical")]
    Vertical,
    /// Corners round away where a cell has no neighbours.
    #[strum(message = "Curve pixel")]
    CurvePixel,
    #[strum(message = "Squircle")]
    Squircle,
    #[strum(message = "Star")]
    Star,
    #[strum(message = "Flower")]
    Flower,
}

use SettingKey::*;

const INSET_AND_ROTATION: &[SettingKey] = &[
    InsetFraction,
    UseRandomInset,
    InsetGenerator,
    RotationFraction,
    UseRandomRotation,
    RotationGenerator,
];
const ROUNDED_KEYS: &[SettingKey] = &[
    InsetFraction,
    CornerRadiusFraction,
    UseRandomInset,
    InsetGenerator,
    RotationFraction,
    UseRandomRotation,
    RotationGenerator,
];
const CIRCLE_KEYS: &[SettingKey] = &[InsetFraction, UseRandomInset, InsetGenerator];
const RUN_KEYS: &[SettingKey] = &[InsetFraction, CornerRadiusFraction];
const CURVE_KEYS: &[SettingKey] = &[CornerRadiusFraction, HasInnerCorners];

#[derive(Debug, Clone, PartialEq)]
pub struct PixelGenerator {
    shape: PixelShape,
    inset_fraction: f64,
    corner_radius_fraction: f64,
    rotation_fraction: f64,
    use_random_inset: bool,
    use_random_rotation: bool,
    has_inner_corners: bool,
    inset_generator: ValueGenerator,
    rotation_generator: ValueGenerator,
}

impl Default for PixelGenerator {
    fn default() -> Self {
        Self::from_kind(PixelShape::Square)
    }
}

impl PixelGenerator {
    pub fn new(shape: PixelShape) -> Self {
        Self::from_kind(shape)
    }

    pub fn shape(&self) -> PixelShape {
        self.shape
    }

    /// Path covering every `true` content cell of `matrix`, letterboxed into `size`.
    ///
    /// Random inset/rotation streams restart at the beginning of every call
    /// and advance once per content cell in row-major order, drawn or not.
    /// A cell's inset and rotation therefore depend only on its position, so
    /// clearing cells for a logo or negating leaves every other cell as it was.
    pub fn generate_path(&mut self, matrix: &BoolMatrix, size: Size) -> BezPath {
        self.inset_generator.reset();
        self.rotation_generator.reset();
        let layout = CellLayout::new(matrix.dimension(), size);
        let path = match self.shape {
            PixelShape::Horizontal => self.runs(matrix, &layout, false),
            PixelShape::Vertical => self.runs(matrix, &layout, true),
            PixelShape::CurvePixel => self.curves(matrix, &layout),
            _ => self.cells(matrix, &layout),
        };
        log::trace!(
            "{} pixels: {} subpaths for {}x{}",
            self.name(),
            path.subpath_count(),
            matrix.dimension(),
            matrix.dimension()
        );
        path
    }

    fn cells(&mut self, matrix: &BoolMatrix, layout: &CellLayout) -> BezPath {
        let unit = unit_shape(self.shape, self.corner_radius_fraction);
        let mut path = BezPath::new();
        for (row, col, on) in matrix.cells() {
            if matrix.cell_kind(row, col) != CellKind::Content {
                continue;
            }
            let inset = if self.use_random_inset {
                self.inset_generator.value(matrix, row, col, self.inset_fraction)
            } else {
                self.inset_fraction
            };
            let rotation = if self.use_random_rotation {
                self.rotation_generator.value(matrix, row, col, self.rotation_fraction)
            } else {
                self.rotation_fraction
            };
            if !on {
                continue;
            }
            let half = inset * layout.cell / 2.0;
            let Some(r) = geometry::shrink(layout.rect(row, col), half, half) else {
                continue;
            };
            let mut t = Affine::map_unit_square(r);
            if rotation != 0.0 {
                t = geometry::rotate_about(rotation, r.center()) * t;
            }
            path.add_transformed(&unit, t);
        }
        path
    }

    /// Merges runs of consecutive cells before applying inset and radius.
    fn runs(&self, matrix: &BoolMatrix, layout: &CellLayout, vertical: bool) -> BezPath {
        let dim = matrix.dimension();
        let mut path = BezPath::new();
        let half = self.inset_fraction * layout.cell / 2.0;
        for line in 0..dim {
            let mut start: Option<usize> = None;
            for i in 0..=dim {
                let (row, col) = if vertical { (i, line) } else { (line, i) };
                let on = i < dim && is_drawn(matrix, row, col, matrix.get(row, col));
                match (on, start) {
                    (true, None) => start = Some(i),
                    (false, Some(s)) => {
                        let len = i - s;
                        let merged = if vertical {
                            layout.span(s, line, len, 1)
                        } else {
                            layout.span(line, s, 1, len)
                        };
                        if let Some(r) = geometry::shrink(merged, half, half) {
                            let radius = self.corner_radius_fraction * r.width().min(r.height()) / 2.0;
                            path.add_rounded_rect(r, radius, CornerMask::ALL);
                        }
                        start = None;
                    }
                    _ => {}
                }
            }
        }
        path
    }

    fn curves(&self, matrix: &BoolMatrix, layout: &CellLayout) -> BezPath {
        let on = |row: isize, col: isize| {
            row >= 0
                && col >= 0
                && is_drawn(matrix, row as usize, col as usize, matrix.get_signed(row, col))
        };
        let radius = self.corner_radius_fraction * layout.cell / 2.0;
        let mut path = BezPath::new();
        for (row, col, value) in matrix.cells() {
            let (r, c) = (row as isize, col as isize);
            let rect = layout.rect(row, col);
            let (top, bottom, left, right) = (on(r - 1, c), on(r + 1, c), on(r, c - 1), on(r, c + 1));
            if is_drawn(matrix, row, col, value) {
                let mut mask = CornerMask::NONE;
                if !top && !left {
                    mask = mask.union(CornerMask::TOP_LEFT);
                }
                if !top && !right {
                    mask = mask.union(CornerMask::TOP_RIGHT);
                }
                if !bottom && !left {
                    mask = mask.union(CornerMask::BOTTOM_LEFT);
                }
                if !bottom && !right {
                    mask = mask.union(CornerMask::BOTTOM_RIGHT);
                }
                path.add_rounded_rect(rect, radius, mask);
            } else if self.has_inner_corners && radius > 0.0 && matrix.cell_kind(row, col) == CellKind::Content {
                // Concave fillets where two orthogonal neighbours and their diagonal are set.
                let corners = [
                    (top && left && on(r - 1, c - 1), Point::new(rect.min_x(), rect.min_y()), 1.0, 1.0),
                    (top && right && on(r - 1, c + 1), Point::new(rect.max_x(), rect.min_y()), -1.0, 1.0),
                    (bottom && left && on(r + 1, c - 1), Point::new(rect.min_x(), rect.max_y()), 1.0, -1.0),
                    (bottom && right && on(r + 1, c + 1), Point::new(rect.max_x(), rect.max_y()), -1.0, -1.0),
                ];
                for (present, corner, sx, sy) in corners {
                    if present {
                        let t = Affine::translate(corner.to_vec2()) * Affine::scale_non_uniform(sx * radius, sy * radius);
                        let mut piece = fillet();
                        // Mirroring on one axis flips the winding back.
                        if sx * sy < 0.0 {
                            piece = piece.reverse_subpaths();
                        }
                        path.add_transformed(&piece, t);
                    }
                }
            }
        }
        path
    }

    fn value_generator(name: &str, key: SettingKey) -> Result<ValueGenerator> {
        Factory::<ValueGenerator>::new()
            .create(name, None)
            .map_err(|e| QrRenderError::invalid_setting(key.name(), e.to_string()))
    }
}

/// True for content cells the generator should draw.
fn is_drawn(matrix: &BoolMatrix, row: usize, col: usize, value: bool) -> bool {
    value && matrix.cell_kind(row, col) == CellKind::Content
}

/// Unit-square outline of a per-cell shape.
fn unit_shape(shape: PixelShape, corner_radius_fraction: f64) -> BezPath {
    let mut p = BezPath::new();
    match shape {
        PixelShape::Circle => p.add_ellipse(UNIT),
        PixelShape::RoundedRect => p.add_rounded_rect(UNIT, corner_radius_fraction / 2.0, CornerMask::ALL),
        PixelShape::Squircle => {
            p.move_to((0.5, 0.0));
            p.curve_to((0.9, 0.0), (1.0, 0.1), (1.0, 0.5));
            p.curve_to((1.0, 0.9), (0.9, 1.0), (0.5, 1.0));
            p.curve_to((0.1, 1.0), (0.0, 0.9), (0.0, 0.5));
            p.curve_to((0.0, 0.1), (0.1, 0.0), (0.5, 0.0));
            p.close_path();
        }
        PixelShape::Star => {
            p.move_to((0.5, 0.0));
            p.quad_to((0.58, 0.42), (1.0, 0.5));
            p.quad_to((0.58, 0.58), (0.5, 1.0));
            p.quad_to((0.42, 0.58), (0.0, 0.5));
            p.quad_to((0.42, 0.42), (0.5, 0.0));
            p.close_path();
        }
        PixelShape::Flower => {
            for (x, y) in [(0.25, 0.0), (0.5, 0.25), (0.25, 0.5), (0.0, 0.25), (0.25, 0.25)] {
                p.add_ellipse(geometry::rect(x, y, 0.5, 0.5));
            }
        }
        _ => p.add_rect(UNIT),
    }
    p
}

/// Unit fillet for a top-left concave corner: the square between the corner
/// and a quarter circle centred at (1, 1).
fn fillet() -> BezPath {
    let k = 1.0 - KAPPA;
    let mut p = BezPath::new();
    p.move_to((0.0, 0.0));
    p.line_to((1.0, 0.0));
    p.curve_to((k, 0.0), (0.0, k), (0.0, 1.0));
    p.close_path();
    p
}

impl Generator for PixelGenerator {
    type Kind = PixelShape;
    const FAMILY: &'static str = "pixel";

    fn from_kind(shape: PixelShape) -> Self {
        let corner_radius_fraction = match shape {
            PixelShape::RoundedRect => 0.65,
            PixelShape::Horizontal | PixelShape::Vertical | PixelShape::CurvePixel => 1.0,
            _ => 0.0,
        };
        Self {
            shape,
            inset_fraction: 0.0,
            corner_radius_fraction,
            rotation_fraction: 0.0,
            use_random_inset: false,
            use_random_rotation: false,
            has_inner_corners: false,
            inset_generator: ValueGenerator::from_kind(ValueKind::Random),
            rotation_generator: ValueGenerator::from_kind(ValueKind::Random),
        }
    }

    fn kind(&self) -> PixelShape {
        self.shape
    }

    fn supported_keys(&self) -> &'static [SettingKey] {
        match self.shape {
            PixelShape::Circle => CIRCLE_KEYS,
            PixelShape::RoundedRect => ROUNDED_KEYS,
            PixelShape::Horizontal | PixelShape::Vertical => RUN_KEYS,
            PixelShape::CurvePixel => CURVE_KEYS,
            _ => INSET_AND_ROTATION,
        }
    }

    fn get_setting(&self, key: SettingKey) -> Option<SettingValue> {
        if !self.supports_setting(key) {
            return None;
        }
        Some(match key {
            InsetFraction => self.inset_fraction.into(),
            CornerRadiusFraction => self.corner_radius_fraction.into(),
            RotationFraction => self.rotation_fraction.into(),
            UseRandomInset => self.use_random_inset.into(),
            UseRandomRotation => self.use_random_rotation.into(),
            HasInnerCorners => self.has_inner_corners.into(),
            InsetGenerator => self.inset_generator.name().into(),
            RotationGenerator => self.rotation_generator.name().into(),
            Corners | IsFlipped => return None,
        })
    }

    fn try_set_setting(&mut self, key: SettingKey, value: &SettingValue) -> Result<()> {
        if !self.supports_setting(key) {
            return Err(settings::unsupported(key, self.name()));
        }
        match key {
            InsetFraction => self.inset_fraction = settings::fraction(key, value)?,
            CornerRadiusFraction => self.corner_radius_fraction = settings::fraction(key, value)?,
            RotationFraction => self.rotation_fraction = settings::fraction(key, value)?,
            UseRandomInset => self.use_random_inset = settings::boolean(key, value)?,
            UseRandomRotation => self.use_random_rotation = settings::boolean(key, value)?,
            HasInnerCorners => self.has_inner_corners = settings::boolean(key, value)?,
            InsetGenerator | RotationGenerator => {
                let name = value
                    .as_str()
                    .ok_or_else(|| QrRenderError::invalid_setting(key.name(), "expected a generator name"))?;
                let generator = Self::value_generator(name, key)?;
                if key == InsetGenerator {
                    self.inset_generator = generator;
                } else {
                    self.rotation_generator = generator;
                }
            }
            Corners | IsFlipped => return Err(settings::unsupported(key, self.name())),
        }
        Ok(())
    }

    fn sample_path(&self, size: Size) -> BezPath {
        const SAMPLE: [&str; 5] = ["#.##.", "##.##", "..#..", "##.#.", "#.###"];
        match BoolMatrix::from_rows(&SAMPLE) {
            Ok(matrix) => self.copy().generate_path(&matrix, size),
            Err(_) => BezPath::new(),
        }
    }
}
