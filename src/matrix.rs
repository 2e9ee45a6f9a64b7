//! The module grid a render works from.
//!
//! A [`BoolMatrix`] is always square. It records how many of its outer rows and
//! columns are quiet-zone margin (always light), which is what fixes the
//! location of the three finder patterns ("eyes") and their inner 3×3
//! "pupils".

use crate::error::{QrRenderError, Result};
use crate::geometry::{rect, Point, Rect, Size};

/// Side length of a finder pattern in modules.
pub const EYE_SIZE: usize = 7;
/// Side length of a finder pattern's center in modules.
pub const PUPIL_SIZE: usize = 3;
/// Largest matrix side accepted, quiet zone included.
pub const MAX_DIMENSION: usize = 1024;
/// Smallest symbol (version 1) that carries finder patterns.
const MIN_SYMBOL_SIZE: usize = 21;

/*---- Cell classification ----*/

/// One of the three finder pattern corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EyePosition {
	TopLeft,
	TopRight,
	BottomLeft,
}

impl EyePosition {
	pub const ALL: [EyePosition; 3] = [EyePosition::TopLeft, EyePosition::TopRight, EyePosition::BottomLeft];
}

/// What a single cell belongs to for partitioning purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
	Margin,
	Eye(EyePosition),
	Pupil(EyePosition),
	Content,
}

/*---- BoolMatrix ----*/

/// A square grid of dark (`true`) and light (`false`) modules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoolMatrix {
	dimension: usize,
	margin: usize,
	cells: Vec<bool>,
}

impl BoolMatrix {
	/// Creates an all-light matrix with no margin.
	///
	/// # Panics
	///
	/// If `dimension` is larger than [`MAX_DIMENSION`]. Use
	/// [`try_new`](Self::try_new) for sizes that come from input.
	pub fn new(dimension: usize) -> Self {
		assert!(dimension <= MAX_DIMENSION, "Dimension {} exceeds {}", dimension, MAX_DIMENSION);
		Self {
			dimension,
			margin: 0,
			cells: vec![false; dimension * dimension],
		}
	}

	/// Fallible [`new`](Self::new).
	///
	/// # Errors
	///
	/// [`QrRenderError::InvalidMatrix`] above [`MAX_DIMENSION`].
	pub fn try_new(dimension: usize) -> Result<Self> {
		if dimension > MAX_DIMENSION {
			return Err(QrRenderError::InvalidMatrix(format!(
				"{} modules per side exceeds the limit of {}",
				dimension, MAX_DIMENSION
			)));
		}
		Ok(Self::new(dimension))
	}

	/// Builds a matrix from text rows, `'#'` (or `'1'`, `'X'`) for dark and
	/// anything else for light.
	///
	/// # Errors
	///
	/// Returns [`QrRenderError::InvalidMatrix`] if the rows are empty, do
	/// not form a square or exceed [`MAX_DIMENSION`].
	///
	/// # Example
	///
	/// ```rust
	/// use qirender::matrix::BoolMatrix;
	///
	/// let m = BoolMatrix::from_rows(&["#.", ".#"]).unwrap();
	/// assert!(m.get(1, 1));
	/// ```
	pub fn from_rows(rows: &[&str]) -> Result<Self> {
		let dimension = rows.len();
		if dimension == 0 {
			return Err(QrRenderError::InvalidMatrix("no rows".to_string()));
		}
		let mut matrix = BoolMatrix::try_new(dimension)?;
		for (row, line) in rows.iter().enumerate() {
			let chars: Vec<char> = line.chars().collect();
			if chars.len() != dimension {
				return Err(QrRenderError::InvalidMatrix(format!(
					"row {} has {} modules, expected {}",
					row,
					chars.len(),
					dimension
				)));
			}
			for (col, c) in chars.into_iter().enumerate() {
				matrix.set(row, col, matches!(c, '#' | '1' | 'X'));
			}
		}
		Ok(matrix)
	}

	/// Declares how many outer modules are quiet zone. Used by encoding
	/// engines that already add the standard's own margin.
	pub fn with_margin(mut self, margin: usize) -> Self {
		self.margin = margin.min(self.dimension / 2);
		self
	}

	pub fn dimension(&self) -> usize {
		self.dimension
	}

	pub fn margin(&self) -> usize {
		self.margin
	}

	/// Returns the module at the given coordinates. Out of range reads as light.
	pub fn get(&self, row: usize, col: usize) -> bool {
		row < self.dimension && col < self.dimension && self.cells[row * self.dimension + col]
	}

	/// Signed variant of [`get`](Self::get) for neighbour lookups.
	pub fn get_signed(&self, row: isize, col: isize) -> bool {
		row >= 0 && col >= 0 && self.get(row as usize, col as usize)
	}

	pub fn set(&mut self, row: usize, col: usize, value: bool) {
		if row < self.dimension && col < self.dimension {
			self.cells[row * self.dimension + col] = value;
		}
	}

	/// Number of dark modules.
	pub fn count_on(&self) -> usize {
		self.cells.iter().filter(|&&c| c).count()
	}

	/// Row-major iteration over `(row, col, value)`.
	pub fn cells(&self) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
		let dim = self.dimension;
		self.cells
			.iter()
			.enumerate()
			.map(move |(i, &v)| (i / dim, i % dim, v))
	}

	/// Returns a copy surrounded by `quiet_zone` additional light modules on
	/// every side.
	///
	/// # Errors
	///
	/// [`QrRenderError::InvalidMatrix`] when the result would be larger than
	/// [`MAX_DIMENSION`].
	pub fn expanded(&self, quiet_zone: usize) -> Result<BoolMatrix> {
		if quiet_zone == 0 {
			return Ok(self.clone());
		}
		let dimension = quiet_zone
			.checked_mul(2)
			.and_then(|border| border.checked_add(self.dimension))
			.ok_or_else(|| QrRenderError::InvalidMatrix(format!("quiet zone {} overflows", quiet_zone)))?;
		let mut out = BoolMatrix::try_new(dimension)?;
		out.margin = self.margin + quiet_zone;
		for (row, col, v) in self.cells() {
			out.set(row + quiet_zone, col + quiet_zone, v);
		}
		Ok(out)
	}

	/// Returns a copy with every module flipped, keeping the margin.
	pub fn inverted(&self) -> BoolMatrix {
		BoolMatrix {
			dimension: self.dimension,
			margin: self.margin,
			cells: self.cells.iter().map(|c| !c).collect(),
		}
	}

	/// Whether the symbol is large enough to carry finder patterns.
	pub fn has_eyes(&self) -> bool {
		self.dimension >= 2 * self.margin + MIN_SYMBOL_SIZE
	}

	/// Top-left module of the given eye, or `None` if this matrix has no eyes.
	pub fn eye_origin(&self, position: EyePosition) -> Option<(usize, usize)> {
		if !self.has_eyes() {
			return None;
		}
		let near = self.margin;
		let far = self.dimension - self.margin - EYE_SIZE;
		Some(match position {
			EyePosition::TopLeft => (near, near),
			EyePosition::TopRight => (near, far),
			EyePosition::BottomLeft => (far, near),
		})
	}

	pub fn cell_kind(&self, row: usize, col: usize) -> CellKind {
		let lo = self.margin;
		let hi = self.dimension.saturating_sub(self.margin);
		if row < lo || col < lo || row >= hi || col >= hi {
			return CellKind::Margin;
		}
		for position in EyePosition::ALL {
			if let Some((r0, c0)) = self.eye_origin(position) {
				if (r0..r0 + EYE_SIZE).contains(&row) && (c0..c0 + EYE_SIZE).contains(&col) {
					let inner = 2..2 + PUPIL_SIZE;
					return if inner.contains(&(row - r0)) && inner.contains(&(col - c0)) {
						CellKind::Pupil(position)
					} else {
						CellKind::Eye(position)
					};
				}
			}
		}
		CellKind::Content
	}

	/// True for cells that belong to an eye ring or pupil.
	pub fn is_eye_or_pupil(&self, row: usize, col: usize) -> bool {
		matches!(self.cell_kind(row, col), CellKind::Eye(_) | CellKind::Pupil(_))
	}

	/// Two-characters-per-module text rendering, margin included.
	pub fn ascii(&self) -> String {
		let mut out = String::with_capacity(self.dimension * (self.dimension * 2 + 1));
		for row in 0..self.dimension {
			for col in 0..self.dimension {
				let c = if self.get(row, col) { '█' } else { ' ' };
				out.push(c);
				out.push(c);
			}
			out.push('\n');
		}
		out
	}
}

/*---- Layout ----*/

/// Maps matrix cells into a draw area, letterboxed so cells stay square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellLayout {
	pub cell: f64,
	pub origin: Point,
	pub dimension: usize,
}

impl CellLayout {
	pub fn new(dimension: usize, size: Size) -> Self {
		let side = size.min_side();
		let cell = if dimension == 0 { 0.0 } else { side / dimension as f64 };
		let used = cell * dimension as f64;
		Self {
			cell,
			origin: Point::new((size.width - used) / 2.0, (size.height - used) / 2.0),
			dimension,
		}
	}

	pub fn rect(&self, row: usize, col: usize) -> Rect {
		self.span(row, col, 1, 1)
	}

	/// Rect covering `rows × cols` cells from `(row, col)`.
	pub fn span(&self, row: usize, col: usize, rows: usize, cols: usize) -> Rect {
		rect(
			self.origin.x + col as f64 * self.cell,
			self.origin.y + row as f64 * self.cell,
			cols as f64 * self.cell,
			rows as f64 * self.cell,
		)
	}

	/// The square area covered by the whole matrix.
	pub fn bounds(&self) -> Rect {
		self.span(0, 0, self.dimension, self.dimension)
	}
}
