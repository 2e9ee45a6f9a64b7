//! Partitioning and draw-list composition.
//!
//! [`render`] is a pure function of the encoded matrix, the design, the
//! optional logo and the draw size. Generators are copied before use so the
//! caller's instances are never advanced.

use std::collections::BTreeSet;

use crate::design::{Design, MAX_QUIET_ZONE};
use crate::error::{QrRenderError, Result};
use crate::fill::{Canvas, Fill, ImageRef};
use crate::geometry::{BezPath, CornerMask, PathExt, Rect, Size};
use crate::logo::LogoTemplate;
use crate::matrix::{BoolMatrix, CellKind, CellLayout};
use crate::registry::Generator;

/// Z-order of the draw list, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Background,
    OffPixels,
    OnPixels,
    Eyes,
    Pupils,
    Logo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Paint `path` with `fill`, gradients and images laid out over `region`.
    Fill {
        layer: Layer,
        path: BezPath,
        fill: Fill,
        region: Rect,
    },
    /// The logo bitmap, always last.
    Image { image: ImageRef, rect: Rect },
}

impl DrawOp {
    pub fn layer(&self) -> Layer {
        match self {
            DrawOp::Fill { layer, .. } => *layer,
            DrawOp::Image { .. } => Layer::Logo,
        }
    }
}

/// The output of a render: draw operations in paint order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawList {
    size: Size,
    ops: Vec<DrawOp>,
}

impl DrawList {
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The fill op on `layer`, if that layer produced anything.
    pub fn get(&self, layer: Layer) -> Option<&DrawOp> {
        self.ops.iter().find(|op| op.layer() == layer)
    }

    /// The path drawn on `layer`.
    pub fn path(&self, layer: Layer) -> Option<&BezPath> {
        match self.get(layer)? {
            DrawOp::Fill { path, .. } => Some(path),
            DrawOp::Image { .. } => None,
        }
    }

    /// The fill used on `layer`.
    pub fn fill(&self, layer: Layer) -> Option<&Fill> {
        match self.get(layer)? {
            DrawOp::Fill { fill, .. } => Some(fill),
            DrawOp::Image { .. } => None,
        }
    }

    /// Hands every op to `canvas`, back to front.
    pub fn replay(&self, canvas: &mut dyn Canvas) {
        for op in &self.ops {
            match op {
                DrawOp::Fill { path, fill, region, .. } => fill.apply(canvas, *region, path),
                DrawOp::Image { image, rect } => canvas.draw_image(image, *rect),
            }
        }
    }

    fn push_fill(&mut self, layer: Layer, path: BezPath, fill: &Fill, region: Rect) {
        if path.is_empty() {
            return;
        }
        self.ops.push(DrawOp::Fill {
            layer,
            path,
            fill: fill.clone(),
            region,
        });
    }
}

/// The matrix split into what each generator draws.
///
/// `on` and `off` hold only content cells; eyes, pupils and the margin are
/// always `false` in both.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// The encoded matrix with the quiet zone added.
    pub matrix: BoolMatrix,
    pub on: BoolMatrix,
    pub off: BoolMatrix,
    /// Content cells cleared for the logo.
    pub excluded: BTreeSet<(usize, usize)>,
}

/// Expands `matrix` by the design's quiet zone and splits its content cells
/// into on and off, honouring negation and the logo mask.
///
/// # Errors
///
/// [`QrRenderError::InvalidSetting`] when the quiet zone is above
/// [`MAX_QUIET_ZONE`], [`QrRenderError::InvalidMatrix`] when the expanded
/// matrix would be too large.
pub fn partition(matrix: &BoolMatrix, design: &Design, logo: Option<&LogoTemplate>, size: Size) -> Result<Partition> {
    let quiet_zone = design.shape.quiet_zone;
    if quiet_zone > MAX_QUIET_ZONE {
        return Err(QrRenderError::invalid_setting(
            "quietZonePixelCount",
            format!("{} is above the limit of {}", quiet_zone, MAX_QUIET_ZONE),
        ));
    }
    let expanded = matrix.expanded(quiet_zone)?;
    let excluded = logo
        .map(|logo| logo.excluded_cells(&expanded, size))
        .unwrap_or_default();
    let dim = expanded.dimension();
    let mut on = BoolMatrix::new(dim).with_margin(expanded.margin());
    let mut off = BoolMatrix::new(dim).with_margin(expanded.margin());
    for (row, col, value) in expanded.cells() {
        if expanded.cell_kind(row, col) != CellKind::Content || excluded.contains(&(row, col)) {
            continue;
        }
        let lit = value != design.shape.negated;
        on.set(row, col, lit);
        off.set(row, col, !lit);
    }
    log::debug!(
        "Partitioned {}x{}: {} on, {} off, {} under logo",
        dim,
        dim,
        on.count_on(),
        off.count_on(),
        excluded.len()
    );
    Ok(Partition {
        matrix: expanded,
        on,
        off,
        excluded,
    })
}

/// Renders `matrix` into a draw list for a `size` area.
///
/// Layers are background, off pixels, on pixels, eyes, pupils and then the
/// logo. Empty layers are left out. Fails the way [`partition`] does.
pub fn render(matrix: &BoolMatrix, design: &Design, logo: Option<&LogoTemplate>, size: Size) -> Result<DrawList> {
    let parts = partition(matrix, design, logo, size)?;
    let shape = &design.shape;
    let style = &design.style;
    let layout = CellLayout::new(parts.matrix.dimension(), size);
    let region = layout.bounds();
    let mut list = DrawList {
        size,
        ops: Vec::new(),
    };

    if let Some(fill) = &style.background {
        let mut path = BezPath::new();
        let radius = shape.background_corner_radius() * region.width().min(region.height()) / 2.0;
        path.add_rounded_rect(region, radius, CornerMask::ALL);
        list.push_fill(Layer::Background, path, fill, region);
    }

    if let (Some(generator), Some(fill)) = (&shape.off_pixels, &style.off_pixels) {
        let path = generator.copy().generate_path(&parts.off, size);
        list.push_fill(Layer::OffPixels, path, fill, region);
    }

    let path = shape.on_pixels.copy().generate_path(&parts.on, size);
    list.push_fill(Layer::OnPixels, path, &style.on_pixels, region);

    let path = shape.eye.generate_path(&parts.matrix, size);
    list.push_fill(Layer::Eyes, path, style.resolved_eye(), region);

    let path = shape.resolved_pupil().generate_path(&parts.matrix, size);
    list.push_fill(Layer::Pupils, path, style.resolved_pupil(), region);

    if let Some(logo) = logo {
        list.ops.push(DrawOp::Image {
            image: logo.image().clone(),
            rect: logo.image_rect(parts.matrix.dimension(), size),
        });
    }

    log::debug!("Draw list for {:?}: {} ops", size, list.len());
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::Color;
    use crate::pixel::{PixelGenerator, PixelShape};
    use image::RgbaImage;
    use pretty_assertions::assert_eq;

    fn symbol() -> BoolMatrix {
        let mut m = BoolMatrix::new(21);
        for (row, col) in [(10, 10), (10, 11), (12, 9), (20, 20), (8, 0)] {
            m.set(row, col, true);
        }
        m
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Canvas for Recorder {
        fn fill_path(&mut self, path: &BezPath, fill: &Fill, _region: Rect) {
            self.calls.push(format!("{}:{}", fill.name(), path.subpath_count()));
        }

        fn draw_image(&mut self, _image: &ImageRef, _rect: Rect) {
            self.calls.push("image".to_string());
        }
    }

    #[test]
    fn test_layer_order() {
        let mut design = Design::default();
        design.shape.off_pixels = Some(PixelGenerator::new(PixelShape::Circle));
        design.style.off_pixels = Some(Fill::Solid(Color::rgb(200, 200, 200)));
        let logo = LogoTemplate::square_bottom_right(ImageRef::new(RgbaImage::new(2, 2)), 0.1, 0.0).unwrap();
        let list = render(&symbol(), &design, Some(&logo), Size::new(210.0, 210.0)).unwrap();
        let layers: Vec<Layer> = list.ops().iter().map(DrawOp::layer).collect();
        assert_eq!(
            layers,
            vec![Layer::Background, Layer::OffPixels, Layer::OnPixels, Layer::Eyes, Layer::Pupils, Layer::Logo]
        );
    }

    #[test]
    fn test_off_layer_needs_generator_and_fill() {
        let mut design = Design::default();
        design.shape.off_pixels = Some(PixelGenerator::default());
        let list = render(&symbol(), &design, None, Size::new(210.0, 210.0)).unwrap();
        assert!(list.get(Layer::OffPixels).is_none());
    }

    #[test]
    fn test_partition_excludes_eyes_and_margin() {
        let mut design = Design::default();
        design.shape.quiet_zone = 2;
        let parts = partition(&symbol(), &design, None, Size::new(100.0, 100.0)).unwrap();
        assert_eq!(parts.matrix.dimension(), 25);
        assert_eq!(parts.on.count_on(), 5);
        // Content cells minus the three 7x7 finders, all inside the margin.
        assert_eq!(parts.on.count_on() + parts.off.count_on(), 21 * 21 - 3 * 49);
        assert!(!parts.off.get(0, 0));
        assert!(!parts.off.get(2, 2));
    }

    #[test]
    fn test_negate_swaps_content_only() {
        let plain = Design::default();
        let mut negated = Design::default();
        negated.shape.negated = true;
        let a = partition(&symbol(), &plain, None, Size::new(210.0, 210.0)).unwrap();
        let b = partition(&symbol(), &negated, None, Size::new(210.0, 210.0)).unwrap();
        assert_eq!(a.on, b.off);
        assert_eq!(a.off, b.on);

        let size = Size::new(210.0, 210.0);
        let ra = render(&symbol(), &plain, None, size).unwrap();
        let rb = render(&symbol(), &negated, None, size).unwrap();
        assert_eq!(ra.path(Layer::Eyes), rb.path(Layer::Eyes));
        assert_eq!(ra.path(Layer::Pupils), rb.path(Layer::Pupils));
        assert_ne!(ra.path(Layer::OnPixels), rb.path(Layer::OnPixels));
    }

    #[test]
    fn test_render_leaves_design_untouched() {
        let mut design = Design::default();
        design.shape.on_pixels.set_setting(crate::settings::SettingKey::UseRandomInset, true);
        design.shape.on_pixels.set_setting(crate::settings::SettingKey::InsetFraction, 0.5);
        let before = design.clone();
        let first = render(&symbol(), &design, None, Size::new(210.0, 210.0)).unwrap();
        let second = render(&symbol(), &design, None, Size::new(210.0, 210.0)).unwrap();
        assert_eq!(design, before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_background_corner_radius() {
        let mut design = Design::default();
        design.shape.set_background_corner_radius(0.0).unwrap();
        let square = render(&symbol(), &design, None, Size::new(210.0, 210.0)).unwrap();
        design.shape.set_background_corner_radius(0.5).unwrap();
        let rounded = render(&symbol(), &design, None, Size::new(210.0, 210.0)).unwrap();
        assert_ne!(square.path(Layer::Background), rounded.path(Layer::Background));
        assert_eq!(square.path(Layer::OnPixels), rounded.path(Layer::OnPixels));
    }

    #[test]
    fn test_replay_order() {
        let design = Design::default();
        let mut canvas = Recorder::default();
        render(&symbol(), &design, None, Size::new(210.0, 210.0)).unwrap().replay(&mut canvas);
        // Square eyes are an outline plus a hole each.
        assert_eq!(canvas.calls, vec!["solid:1", "solid:5", "solid:6", "solid:3"]);
    }

    #[test]
    fn test_quiet_zone_above_limit_is_an_error() {
        let mut design = Design::default();
        design.shape.quiet_zone = MAX_QUIET_ZONE + 1;
        let err = render(&symbol(), &design, None, Size::new(210.0, 210.0)).unwrap_err();
        assert!(matches!(err, QrRenderError::InvalidSetting { .. }));
        design.shape.quiet_zone = usize::MAX / 2;
        assert!(partition(&symbol(), &design, None, Size::new(210.0, 210.0)).is_err());
        design.shape.quiet_zone = MAX_QUIET_ZONE;
        assert_eq!(partition(&symbol(), &design, None, Size::new(210.0, 210.0)).unwrap().matrix.dimension(), 149);
    }
}
