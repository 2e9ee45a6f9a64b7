//! # qirender
//!
//! A Rust library for turning an encoded QR module matrix into fully customizable vector art.
//!
//! `qirender` does not encode QR symbols itself. An [`engine::EncodingEngine`] supplies the
//! module matrix; this crate partitions it into eyes, pupils and content modules, draws each
//! partition with a pluggable generator, paints it with a fill and hands the result over as a
//! z-ordered [`render::DrawList`] that any canvas can replay.
//!
//! ## Features
//!
//! - Pixel shapes: square, circle, rounded rectangle, merged horizontal/vertical runs, curved
//!   pixels, squircle, star and flower, with inset, rotation and corner-radius settings.
//! - Deterministic random, punch and wave inset/rotation strategies.
//! - Eye and pupil shapes with per-corner rounding masks and mirroring.
//! - Solid, linear-gradient, radial-gradient and image fills with an eye/pupil fallback chain.
//! - Logo overlays that clear the modules underneath them.
//! - Quiet zone, negation and rounded backgrounds.
//! - JSON persistence of whole documents, tolerant of unknown generator names.
//! - SVG, ASCII and module-bitmap export.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qirender = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Render a matrix produced elsewhere with circular pixels and a gradient:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use qirender::document::Document;
//! use qirender::engine::StaticEngine;
//! use qirender::export::to_svg_string;
//! use qirender::fill::{Color, ColorStop, Fill};
//! use qirender::geometry::{Point, Size};
//! use qirender::matrix::BoolMatrix;
//! use qirender::pixel::{PixelGenerator, PixelShape};
//!
//! let mut matrix = BoolMatrix::new(21);
//! matrix.set(10, 10, true);
//! let mut doc = Document::new("Hello, World!", Arc::new(StaticEngine::new(matrix)));
//! doc.design_mut().shape.on_pixels = PixelGenerator::new(PixelShape::Circle);
//! doc.design_mut().shape.quiet_zone = 2;
//! doc.design_mut().style.on_pixels = Fill::linear_gradient(
//!     vec![ColorStop::new(0.0, Color::BLACK), ColorStop::new(1.0, Color::rgb(0, 0, 160))],
//!     Point::new(0.0, 0.0),
//!     Point::new(1.0, 1.0),
//! )
//! .unwrap();
//!
//! let list = doc.render(Size::new(400.0, 400.0)).unwrap();
//! let svg = to_svg_string(&list);
//! assert!(svg.contains("<linearGradient"));
//! ```
//!
//! Print a matrix to the console with a two-module border:
//!
//! ```rust
//! use qirender::export::print_matrix;
//! use qirender::matrix::BoolMatrix;
//!
//! let m = BoolMatrix::from_rows(&["##.", ".#.", "#.#"]).unwrap();
//! print_matrix(&m, 2).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`matrix`]: The module grid, quiet zone and eye geometry.
//! - [`engine`]: The seam to the external encoder and error correction levels.
//! - [`pixel`], [`eye`], [`value`]: Built-in generators.
//! - [`registry`], [`settings`]: Name-based lookup and typed settings.
//! - [`fill`], [`style`], [`design`], [`logo`]: What gets painted where.
//! - [`render`], [`document`]: Partitioning, draw lists and the document lifecycle.
//! - [`export`]: SVG, ASCII and bitmap output.

pub mod design;
pub mod document;
pub mod engine;
pub mod error;
pub mod export;
pub mod eye;
pub mod fill;
pub mod geometry;
pub mod logo;
pub mod matrix;
pub mod pixel;
pub mod registry;
pub mod render;
pub mod settings;
pub mod style;
pub mod value;

pub use error::{Loaded, QrRenderError, Result};
