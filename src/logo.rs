//! Logo overlay and the content cells it clears.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::error::{QrRenderError, Result};
use crate::fill::ImageRef;
use crate::geometry::{self, Affine, BezPath, PathExt, Rect, Size};
use crate::matrix::{BoolMatrix, CellKind, CellLayout};

/// Float slack when checking that a region stays inside unit space.
const EPSILON: f64 = 1e-9;

/// An image placed over the symbol, with the unit-space (0..1) region it
/// covers and an extra margin of cleared modules around it.
///
/// The region must stay clear of the eyes; that is up to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoTemplate {
    image: ImageRef,
    region: BezPath,
    inset: f64,
}

impl LogoTemplate {
    /// # Errors
    ///
    /// [`QrRenderError::InvalidRegion`] if the region is empty, has zero area
    /// or reaches outside unit space, or if `inset` is negative.
    pub fn new(image: ImageRef, region: BezPath, inset: f64) -> Result<Self> {
        let bounds = region
            .bounds()
            .ok_or_else(|| QrRenderError::InvalidRegion("region path is empty".to_string()))?;
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(QrRenderError::InvalidRegion("region has zero area".to_string()));
        }
        if bounds.min_x() < -EPSILON
            || bounds.min_y() < -EPSILON
            || bounds.max_x() > 1.0 + EPSILON
            || bounds.max_y() > 1.0 + EPSILON
        {
            return Err(QrRenderError::InvalidRegion(format!(
                "region {:?} is outside unit space",
                bounds
            )));
        }
        if !(inset.is_finite() && inset >= 0.0) {
            return Err(QrRenderError::InvalidRegion(format!("inset {} must be >= 0", inset)));
        }
        Ok(Self { image, region, inset })
    }

    /// Square of side `fraction` in the middle of the symbol.
    pub fn square_center(image: ImageRef, fraction: f64, inset: f64) -> Result<Self> {
        let o = (1.0 - fraction) / 2.0;
        let mut region = BezPath::new();
        region.add_rect(geometry::rect(o, o, fraction, fraction));
        Self::new(image, region, inset)
    }

    pub fn circle_center(image: ImageRef, fraction: f64, inset: f64) -> Result<Self> {
        let o = (1.0 - fraction) / 2.0;
        let mut region = BezPath::new();
        region.add_ellipse(geometry::rect(o, o, fraction, fraction));
        Self::new(image, region, inset)
    }

    /// Square of side `fraction` tucked into the bottom-right corner, where
    /// there is no eye.
    pub fn square_bottom_right(image: ImageRef, fraction: f64, inset: f64) -> Result<Self> {
        let mut region = BezPath::new();
        region.add_rect(geometry::rect(0.9 - fraction, 0.9 - fraction, fraction, fraction));
        Self::new(image, region, inset)
    }

    pub fn circle_bottom_right(image: ImageRef, fraction: f64, inset: f64) -> Result<Self> {
        let mut region = BezPath::new();
        region.add_ellipse(geometry::rect(0.9 - fraction, 0.9 - fraction, fraction, fraction));
        Self::new(image, region, inset)
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn region(&self) -> &BezPath {
        &self.region
    }

    pub fn inset(&self) -> f64 {
        self.inset
    }

    /// Where the image is drawn for a matrix of `dimension` in `size`.
    pub fn image_rect(&self, dimension: usize, size: Size) -> Rect {
        let unit = self.region.bounds().unwrap_or(Rect::ZERO);
        geometry::map_unit(CellLayout::new(dimension, size).bounds(), unit)
    }

    /// The region outline mapped into draw space.
    pub fn region_path(&self, dimension: usize, size: Size) -> BezPath {
        let mut path = self.region.clone();
        path.apply_affine(Affine::map_unit_square(CellLayout::new(dimension, size).bounds()));
        path
    }

    pub fn excluded_cells(&self, matrix: &BoolMatrix, size: Size) -> BTreeSet<(usize, usize)> {
        excluded_cells(matrix, &self.region, self.inset, size)
    }

    pub fn settings(&self) -> Result<Value> {
        Ok(json!({
            "image": self.image.to_base64_png()?,
            "region": self.region.to_svg(),
            "inset": self.inset,
        }))
    }

    pub fn from_settings(value: &Value) -> Result<Self> {
        let image = value
            .get("image")
            .and_then(Value::as_str)
            .ok_or_else(|| QrRenderError::Malformed("logo template has no image".to_string()))?;
        let data = value
            .get("region")
            .and_then(Value::as_str)
            .ok_or_else(|| QrRenderError::Malformed("logo template has no region".to_string()))?;
        let region = BezPath::from_svg(data).map_err(|e| QrRenderError::InvalidRegion(e.to_string()))?;
        let inset = value.get("inset").and_then(Value::as_f64).unwrap_or(0.0);
        Self::new(ImageRef::from_base64_png(image)?, region, inset)
    }
}

/// Content cells whose destination rect overlaps the region's bounds grown
/// by `inset` (unit space), using the same letterboxing as the pixel pass.
pub fn excluded_cells(matrix: &BoolMatrix, region: &BezPath, inset: f64, size: Size) -> BTreeSet<(usize, usize)> {
    let Some(unit) = region.bounds() else {
        return BTreeSet::new();
    };
    let layout = CellLayout::new(matrix.dimension(), size);
    let mask = geometry::map_unit(layout.bounds(), unit.inset(inset));
    matrix
        .cells()
        .filter(|&(row, col, _)| matrix.cell_kind(row, col) == CellKind::Content)
        .filter(|&(row, col, _)| geometry::overlaps(layout.rect(row, col), mask))
        .map(|(row, col, _)| (row, col))
        .collect()
}
