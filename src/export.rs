//! Reference output adapters: SVG markup, ASCII and module bitmaps.
//!
//! Only [`SvgCanvas`] consumes a [`DrawList`]; the text and bitmap helpers
//! work straight from a matrix and ignore the design.

use image::{GrayImage, ImageBuffer, Luma};

use crate::error::{QrRenderError, Result};
use crate::fill::{Canvas, Color, ColorStop, Fill, ImageRef};
use crate::geometry::{num, BezPath, PathExt, Point, Rect, Size};
use crate::matrix::BoolMatrix;
use crate::render::DrawList;

/*---- SVG ----*/

/// A [`Canvas`] that accumulates SVG markup.
///
/// Gradients and image fills become `<defs>` entries laid out in user space
/// over the region they were given. Bitmaps are embedded as PNG data URIs.
#[derive(Debug, Clone)]
pub struct SvgCanvas {
	size: Size,
	defs: String,
	body: String,
	next_id: usize,
}

impl SvgCanvas {
	pub fn new(size: Size) -> Self {
		Self {
			size,
			defs: String::new(),
			body: String::new(),
			next_id: 0,
		}
	}

	fn id(&mut self, prefix: &str) -> String {
		self.next_id += 1;
		format!("{}{}", prefix, self.next_id)
	}

	/// Value for a `fill` attribute, plus its opacity attribute if any.
	fn paint(&mut self, fill: &Fill, region: Rect) -> String {
		match fill {
			Fill::Solid(color) => color_attr("fill", "fill-opacity", color),
			Fill::LinearGradient { stops, start, end } => {
				let id = self.id("linear");
				let (a, b) = (unit_point(region, *start), unit_point(region, *end));
				self.defs += &format!(
					"\t\t<linearGradient id=\"{}\" gradientUnits=\"userSpaceOnUse\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">\n",
					id,
					num(a.x),
					num(a.y),
					num(b.x),
					num(b.y)
				);
				self.defs += &stop_tags(stops);
				self.defs += "\t\t</linearGradient>\n";
				format!("fill=\"url(#{})\"", id)
			}
			Fill::RadialGradient { stops, center } => {
				let id = self.id("radial");
				let c = unit_point(region, *center);
				// Reach the farthest corner of the region.
				let r = [
					Point::new(region.x0, region.y0),
					Point::new(region.x1, region.y0),
					Point::new(region.x0, region.y1),
					Point::new(region.x1, region.y1),
				]
				.iter()
				.map(|corner| corner.distance(c))
				.fold(0.0, f64::max);
				self.defs += &format!(
					"\t\t<radialGradient id=\"{}\" gradientUnits=\"userSpaceOnUse\" cx=\"{}\" cy=\"{}\" r=\"{}\">\n",
					id,
					num(c.x),
					num(c.y),
					num(r)
				);
				self.defs += &stop_tags(stops);
				self.defs += "\t\t</radialGradient>\n";
				format!("fill=\"url(#{})\"", id)
			}
			Fill::Image(image) => {
				let id = self.id("pattern");
				self.defs += &format!(
					"\t\t<pattern id=\"{}\" patternUnits=\"userSpaceOnUse\" {}>\n\t\t\t{}\n\t\t</pattern>\n",
					id,
					rect_attrs(region),
					image_tag(image, region)
				);
				format!("fill=\"url(#{})\"", id)
			}
		}
	}

	/// The finished document.
	pub fn into_svg(self) -> String {
		let mut result = String::new();
		result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
		result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
		result += &format!(
			"<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {} {}\" stroke=\"none\">\n",
			num(self.size.width),
			num(self.size.height)
		);
		if !self.defs.is_empty() {
			result += "\t<defs>\n";
			result += &self.defs;
			result += "\t</defs>\n";
		}
		result += &self.body;
		result += "</svg>\n";
		result
	}
}

impl Canvas for SvgCanvas {
	fn fill_path(&mut self, path: &BezPath, fill: &Fill, region: Rect) {
		let paint = self.paint(fill, region);
		self.body += &format!("\t<path d=\"{}\" {} fill-rule=\"nonzero\"/>\n", path.to_svg_data(), paint);
	}

	fn draw_image(&mut self, image: &ImageRef, rect: Rect) {
		self.body += &format!("\t{}\n", image_tag(image, rect));
	}
}

fn unit_point(region: Rect, p: Point) -> Point {
	Point::new(region.x0 + p.x * region.width(), region.y0 + p.y * region.height())
}

/// `fill="#rrggbb"` style attributes, with a separate opacity when translucent.
fn color_attr(attr: &str, opacity: &str, color: &Color) -> String {
	let hex = format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b);
	if color.a >= 1.0 {
		format!("{}=\"{}\"", attr, hex)
	} else {
		format!("{}=\"{}\" {}=\"{}\"", attr, hex, opacity, num(f64::from(color.a)))
	}
}

fn stop_tags(stops: &[ColorStop]) -> String {
	stops
		.iter()
		.map(|s| format!("\t\t\t<stop offset=\"{}\" {}/>\n", num(s.position), color_attr("stop-color", "stop-opacity", &s.color)))
		.collect()
}

fn rect_attrs(r: Rect) -> String {
	format!(
		"x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"",
		num(r.x0),
		num(r.y0),
		num(r.width()),
		num(r.height())
	)
}

fn image_tag(image: &ImageRef, rect: Rect) -> String {
	match image.to_base64_png() {
		Ok(data) => format!(
			"<image {} preserveAspectRatio=\"none\" href=\"data:image/png;base64,{}\"/>",
			rect_attrs(rect),
			data
		),
		Err(e) => {
			log::warn!("Skipping image that failed to encode: {}", e);
			String::new()
		}
	}
}

/// Replays `list` onto a fresh [`SvgCanvas`].
pub fn to_svg_string(list: &DrawList) -> String {
	let mut canvas = SvgCanvas::new(list.size());
	list.replay(&mut canvas);
	canvas.into_svg()
}

/*---- Text and bitmaps ----*/

/// Two characters per module, with `quiet_zone` extra light modules around.
///
/// # Errors
///
/// [`QrRenderError::InvalidMatrix`] when the quiet zone makes the matrix too large.
pub fn to_ascii(matrix: &BoolMatrix, quiet_zone: usize) -> Result<String> {
	Ok(matrix.expanded(quiet_zone)?.ascii())
}

/// Prints the matrix to the console.
pub fn print_matrix(matrix: &BoolMatrix, quiet_zone: usize) -> Result<()> {
	println!("{}", to_ascii(matrix, quiet_zone)?);
	Ok(())
}

/// One `scale`-pixel black square per dark module, white elsewhere.
///
/// # Errors
///
/// [`QrRenderError::InvalidMatrix`] when the quiet zone or the bitmap side is too large.
pub fn to_image_buffer(matrix: &BoolMatrix, quiet_zone: usize, scale: u32) -> Result<GrayImage> {
	let expanded = matrix.expanded(quiet_zone)?;
	let scale = scale.max(1);
	let side = u32::try_from(expanded.dimension())
		.ok()
		.and_then(|d| d.checked_mul(scale))
		.ok_or_else(|| {
			QrRenderError::InvalidMatrix(format!("{} modules at scale {} is too large", expanded.dimension(), scale))
		})?;
	Ok(ImageBuffer::from_fn(side, side, |x, y| {
		if expanded.get((y / scale) as usize, (x / scale) as usize) {
			Luma([0u8])
		} else {
			Luma([255u8])
		}
	}))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::design::Design;
	use crate::geometry::rect;
	use crate::render::render;
	use image::RgbaImage;

	fn symbol() -> BoolMatrix {
		let mut m = BoolMatrix::new(21);
		m.set(10, 10, true);
		m
	}

	#[test]
	fn test_svg_document() {
		let list = render(&symbol(), &Design::default(), None, Size::new(210.0, 210.0)).unwrap();
		let svg = to_svg_string(&list);
		assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
		assert!(svg.contains("viewBox=\"0 0 210 210\""));
		assert!(svg.contains("<path d=\"M100,100 L110,100 L110,110 L100,110 Z\" fill=\"#000000\""));
		assert!(svg.contains("fill=\"#ffffff\""));
		assert!(!svg.contains("<defs>"));
		assert!(svg.trim_end().ends_with("</svg>"));
	}

	#[test]
	fn test_gradient_and_image_defs() {
		let mut canvas = SvgCanvas::new(Size::new(100.0, 100.0));
		let mut square = BezPath::new();
		square.add_rect(rect(0.0, 0.0, 10.0, 10.0));
		let gradient = Fill::linear_gradient(
			vec![ColorStop::new(0.0, Color::BLACK), ColorStop::new(1.0, Color::rgba(255, 0, 0, 0.5))],
			Point::new(0.0, 0.0),
			Point::new(1.0, 0.0),
		)
		.unwrap();
		let region = rect(0.0, 0.0, 100.0, 100.0);
		canvas.fill_path(&square, &gradient, region);
		canvas.fill_path(&square, &Fill::Image(ImageRef::new(RgbaImage::new(1, 1))), region);
		canvas.draw_image(&ImageRef::new(RgbaImage::new(1, 1)), rect(40.0, 40.0, 20.0, 20.0));
		let svg = canvas.into_svg();
		assert!(svg.contains("<linearGradient id=\"linear1\" gradientUnits=\"userSpaceOnUse\" x1=\"0\" y1=\"0\" x2=\"100\" y2=\"0\">"));
		assert!(svg.contains("stop-color=\"#ff0000\" stop-opacity=\"0.5\""));
		assert!(svg.contains("fill=\"url(#linear1)\""));
		assert!(svg.contains("<pattern id=\"pattern2\""));
		assert!(svg.contains("href=\"data:image/png;base64,"));
		assert!(svg.contains("x=\"40\" y=\"40\" width=\"20\" height=\"20\""));
	}

	#[test]
	fn test_radial_gradient_reaches_far_corner() {
		let mut canvas = SvgCanvas::new(Size::new(100.0, 100.0));
		let mut square = BezPath::new();
		square.add_rect(rect(0.0, 0.0, 10.0, 10.0));
		let fill = Fill::radial_gradient(vec![ColorStop::new(0.0, Color::BLACK)], Point::new(0.0, 0.0)).unwrap();
		canvas.fill_path(&square, &fill, rect(0.0, 0.0, 30.0, 40.0));
		assert!(canvas.into_svg().contains("cx=\"0\" cy=\"0\" r=\"50\""));
	}

	#[test]
	fn test_ascii_and_bitmap() {
		let m = symbol();
		let text = to_ascii(&m, 1).unwrap();
		assert_eq!(text.lines().count(), 23);
		assert_eq!(text.lines().nth(11).map(|l| l.chars().filter(|&c| c == '█').count()), Some(2));

		let img = to_image_buffer(&m, 4, 2).unwrap();
		assert_eq!(img.dimensions(), (58, 58));
		assert_eq!(img.get_pixel(28, 28), &Luma([0u8]));
		assert_eq!(img.get_pixel(0, 0), &Luma([255u8]));
	}

	#[test]
	fn test_oversized_exports_are_errors() {
		let m = symbol();
		assert!(to_ascii(&m, usize::MAX / 2).is_err());
		assert!(to_image_buffer(&m, 1 << 40, 1).is_err());
		assert!(matches!(to_image_buffer(&m, 0, u32::MAX), Err(QrRenderError::InvalidMatrix(_))));
	}
}
