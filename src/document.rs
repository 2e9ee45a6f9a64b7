//! Documents: content plus design, with a lazily encoded matrix.
//!
//! A [`Document`] only calls its [`EncodingEngine`] when the content, level
//! or engine changed since the last successful encode. Design and logo edits
//! reuse the cached matrix.

use std::fmt;
use std::fs;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Map, Value};

use crate::design::{Design, Shape};
use crate::engine::{EncodingEngine, ErrorCorrection};
use crate::error::{Loaded, QrRenderError, Result};
use crate::geometry::Size;
use crate::logo::LogoTemplate;
use crate::matrix::BoolMatrix;
use crate::render::{self, DrawList};
use crate::style::Style;

/// Where a document is in its encode/render lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderState {
    /// The cached matrix matches the content and level.
    Clean,
    /// Content, level or engine changed; the next render re-encodes.
    Dirty,
    Rendering,
    Rendered,
    /// The last render failed with this message.
    Failed(String),
}

pub struct Document {
    content: Vec<u8>,
    error_correction: ErrorCorrection,
    design: Design,
    logo: Option<LogoTemplate>,
    engine: Arc<dyn EncodingEngine>,
    matrix: Option<BoolMatrix>,
    state: RenderState,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("content", &String::from_utf8_lossy(&self.content))
            .field("error_correction", &self.error_correction)
            .field("design", &self.design)
            .field("logo", &self.logo)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Encodes into `cache` unless it already holds a matrix.
fn encode<'a>(
    cache: &'a mut Option<BoolMatrix>,
    engine: &dyn EncodingEngine,
    content: &[u8],
    level: ErrorCorrection,
) -> Result<&'a BoolMatrix> {
    let matrix = match cache.take() {
        Some(matrix) => matrix,
        None => {
            log::debug!("Encoding {} bytes at level {}", content.len(), level);
            let matrix = engine.generate(content, level)?;
            if matrix.dimension() == 0 {
                return Err(QrRenderError::EncodingFailed("engine returned an empty matrix".to_string()));
            }
            matrix
        }
    };
    Ok(cache.insert(matrix))
}

impl Document {
    pub fn new(content: impl Into<Vec<u8>>, engine: Arc<dyn EncodingEngine>) -> Self {
        Self {
            content: content.into(),
            error_correction: ErrorCorrection::default(),
            design: Design::default(),
            logo: None,
            engine,
            matrix: None,
            state: RenderState::Dirty,
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<Vec<u8>>) {
        let content = content.into();
        if content != self.content {
            self.content = content;
            self.invalidate();
        }
    }

    pub fn error_correction(&self) -> ErrorCorrection {
        self.error_correction
    }

    pub fn set_error_correction(&mut self, level: ErrorCorrection) {
        if level != self.error_correction {
            self.error_correction = level;
            self.invalidate();
        }
    }

    pub fn set_engine(&mut self, engine: Arc<dyn EncodingEngine>) {
        self.engine = engine;
        self.invalidate();
    }

    pub fn design(&self) -> &Design {
        &self.design
    }

    pub fn design_mut(&mut self) -> &mut Design {
        self.touch();
        &mut self.design
    }

    pub fn set_design(&mut self, design: Design) {
        self.design = design;
        self.touch();
    }

    pub fn logo(&self) -> Option<&LogoTemplate> {
        self.logo.as_ref()
    }

    pub fn set_logo(&mut self, logo: Option<LogoTemplate>) {
        self.logo = logo;
        self.touch();
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// The encoded matrix, encoding first if needed. Quiet zone not included.
    pub fn matrix(&mut self) -> Result<&BoolMatrix> {
        let result = encode(&mut self.matrix, self.engine.as_ref(), &self.content, self.error_correction);
        match result {
            Ok(matrix) => {
                if self.state == RenderState::Dirty {
                    self.state = RenderState::Clean;
                }
                Ok(matrix)
            }
            Err(e) => {
                self.state = RenderState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Renders into a `size` area.
    ///
    /// # Errors
    ///
    /// [`QrRenderError::EncodingFailed`] if the engine rejects the content;
    /// the document is left in [`RenderState::Failed`] and the next render
    /// asks the engine again. [`QrRenderError::InvalidSetting`] for a size
    /// that is not positive.
    pub fn render(&mut self, size: Size) -> Result<DrawList> {
        if !(size.width > 0.0 && size.height > 0.0 && size.width.is_finite() && size.height.is_finite()) {
            return Err(QrRenderError::invalid_setting(
                "size",
                format!("{}x{} is not a positive area", size.width, size.height),
            ));
        }
        self.state = RenderState::Rendering;
        let rendered = encode(&mut self.matrix, self.engine.as_ref(), &self.content, self.error_correction)
            .and_then(|matrix| render::render(matrix, &self.design, self.logo.as_ref(), size));
        match rendered {
            Ok(list) => {
                self.state = RenderState::Rendered;
                Ok(list)
            }
            Err(e) => {
                log::warn!("Render failed: {}", e);
                self.state = RenderState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Independent copy sharing only the engine.
    pub fn copy(&self) -> Document {
        Document {
            content: self.content.clone(),
            error_correction: self.error_correction,
            design: self.design.copy(),
            logo: self.logo.clone(),
            engine: Arc::clone(&self.engine),
            matrix: self.matrix.clone(),
            state: self.state.clone(),
        }
    }

    fn invalidate(&mut self) {
        self.matrix = None;
        self.state = RenderState::Dirty;
    }

    fn touch(&mut self) {
        self.state = if self.matrix.is_some() {
            RenderState::Clean
        } else {
            RenderState::Dirty
        };
    }

    pub fn to_json(&self) -> Result<Value> {
        let content = match std::str::from_utf8(&self.content) {
            Ok(text) => Value::String(text.to_string()),
            Err(_) => json!({ "base64": STANDARD.encode(&self.content) }),
        };
        let mut map = Map::new();
        map.insert("content".to_string(), content);
        map.insert("errorCorrection".to_string(), serde_json::to_value(self.error_correction)?);
        map.insert("shape".to_string(), self.design.shape.settings());
        map.insert("style".to_string(), self.design.style.settings()?);
        if let Some(logo) = &self.logo {
            map.insert("logoTemplate".to_string(), logo.settings()?);
        }
        Ok(Value::Object(map))
    }

    /// Rebuilds a document from [`Document::to_json`] output.
    ///
    /// Only missing or undecodable content fails the load. Every other field
    /// that cannot be read keeps its default and is listed in the issues.
    pub fn from_json(value: &Value, engine: Arc<dyn EncodingEngine>) -> Result<Loaded<Document>> {
        let map = value
            .as_object()
            .ok_or_else(|| QrRenderError::Malformed("document is not an object".to_string()))?;
        let content = match map.get("content") {
            Some(Value::String(text)) => text.as_bytes().to_vec(),
            Some(Value::Object(o)) => {
                let text = o
                    .get("base64")
                    .and_then(Value::as_str)
                    .ok_or_else(|| QrRenderError::Malformed("content object has no base64 field".to_string()))?;
                STANDARD.decode(text)?
            }
            _ => return Err(QrRenderError::Malformed("document has no content".to_string())),
        };

        let mut issues = Vec::new();
        let mut doc = Document::new(content, engine);

        if let Some(v) = map.get("errorCorrection") {
            match v.as_str().map(str::parse::<ErrorCorrection>) {
                Some(Ok(level)) => doc.error_correction = level,
                Some(Err(e)) => issues.push(e),
                None => issues.push(QrRenderError::invalid_setting("errorCorrection", "expected a letter")),
            }
        }
        if let Some(v) = map.get("shape") {
            let loaded = Shape::from_settings(v);
            issues.extend(loaded.issues);
            doc.design.shape = loaded.value;
        }
        if let Some(v) = map.get("style") {
            let loaded = Style::from_settings(v);
            issues.extend(loaded.issues);
            doc.design.style = loaded.value;
        }
        if let Some(v) = map.get("logoTemplate") {
            match LogoTemplate::from_settings(v) {
                Ok(logo) => doc.logo = Some(logo),
                Err(e) => {
                    log::warn!("Dropping logo template: {}", e);
                    issues.push(e);
                }
            }
        }
        for issue in &issues {
            log::warn!("Document load: {}", issue);
        }
        Ok(Loaded { value: doc, issues })
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.to_json()?)?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<std::path::Path>, engine: Arc<dyn EncodingEngine>) -> Result<Loaded<Document>> {
        let text = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        Document::from_json(&value, engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::StaticEngine;
    use crate::fill::{Color, Fill, ImageRef};
    use crate::pixel::{PixelGenerator, PixelShape};
    use crate::render::Layer;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_engine(calls: Arc<AtomicUsize>) -> Arc<dyn EncodingEngine> {
        Arc::new(move |content: &[u8], _level: ErrorCorrection| -> Result<BoolMatrix> {
            calls.fetch_add(1, Ordering::SeqCst);
            if content.len() > 8 {
                return Err(QrRenderError::EncodingFailed("data too long".to_string()));
            }
            Ok(BoolMatrix::new(21))
        })
    }

    #[test]
    fn test_lazy_encoding() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut doc = Document::new("hi", counting_engine(calls.clone()));
        assert_eq!(doc.state(), &RenderState::Dirty);

        doc.render(Size::new(100.0, 100.0)).unwrap();
        doc.design_mut().shape.quiet_zone = 2;
        doc.render(Size::new(100.0, 100.0)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(doc.state(), &RenderState::Rendered);

        doc.set_error_correction(ErrorCorrection::High);
        assert_eq!(doc.state(), &RenderState::Dirty);
        doc.render(Size::new(100.0, 100.0)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        doc.set_content("hi");
        doc.render(Size::new(100.0, 100.0)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_encoding_failure_is_reported() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut doc = Document::new("far too long", counting_engine(calls));
        let err = doc.render(Size::new(100.0, 100.0)).unwrap_err();
        assert!(matches!(err, QrRenderError::EncodingFailed(_)));
        assert!(matches!(doc.state(), RenderState::Failed(_)));

        doc.set_content("ok");
        assert!(doc.render(Size::new(100.0, 100.0)).is_ok());
    }

    #[test]
    fn test_rejects_empty_size() {
        let mut doc = Document::new("hi", Arc::new(StaticEngine::new(BoolMatrix::new(21))));
        assert!(doc.render(Size::new(0.0, 100.0)).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let engine: Arc<dyn EncodingEngine> = Arc::new(StaticEngine::new(BoolMatrix::new(21)));
        let mut doc = Document::new("https://example.com", engine.clone());
        doc.set_error_correction(ErrorCorrection::High);
        doc.design_mut().shape.on_pixels = PixelGenerator::new(PixelShape::Star);
        doc.design_mut().style.eye = Some(Fill::Solid(Color::rgb(0, 80, 160)));
        let logo = LogoTemplate::circle_center(ImageRef::new(image::RgbaImage::new(3, 3)), 0.2, 0.0).unwrap();
        doc.set_logo(Some(logo));

        let json = doc.to_json().unwrap();
        assert_eq!(json["content"], json!("https://example.com"));
        assert_eq!(json["errorCorrection"], json!("H"));

        let loaded = Document::from_json(&json, engine).unwrap();
        assert!(loaded.is_clean(), "{:?}", loaded.issues);
        let back = loaded.value;
        assert_eq!(back.content(), doc.content());
        assert_eq!(back.error_correction(), ErrorCorrection::High);
        assert_eq!(back.design(), doc.design());
        assert_eq!(back.logo(), doc.logo());
    }

    #[test]
    fn test_binary_content_uses_base64() {
        let engine: Arc<dyn EncodingEngine> = Arc::new(StaticEngine::new(BoolMatrix::new(21)));
        let doc = Document::new(vec![0xff, 0x00, 0xfe], engine.clone());
        let json = doc.to_json().unwrap();
        assert_eq!(json["content"], json!({"base64": "/wD+"}));
        let back = Document::from_json(&json, engine).unwrap().value;
        assert_eq!(back.content(), &[0xff, 0x00, 0xfe]);
    }

    #[test]
    fn test_missing_content_fails() {
        let engine: Arc<dyn EncodingEngine> = Arc::new(StaticEngine::new(BoolMatrix::new(21)));
        assert!(Document::from_json(&json!({"errorCorrection": "L"}), engine.clone()).is_err());
        assert!(Document::from_json(&json!([1, 2]), engine).is_err());
    }

    #[test]
    fn test_copy_is_independent() {
        let engine: Arc<dyn EncodingEngine> = Arc::new(StaticEngine::new(BoolMatrix::new(21)));
        let mut doc = Document::new("a", engine);
        let first = doc.render(Size::new(42.0, 42.0)).unwrap();
        let mut other = doc.copy();
        other.design_mut().shape.negated = true;
        assert_eq!(doc.render(Size::new(42.0, 42.0)).unwrap(), first);
        assert_ne!(other.render(Size::new(42.0, 42.0)).unwrap().path(Layer::OnPixels), first.path(Layer::OnPixels));
    }

    #[test]
    fn test_bad_color_text_falls_back() {
        let engine: Arc<dyn EncodingEngine> = Arc::new(StaticEngine::new(BoolMatrix::new(21)));
        let saved = json!({
            "content": "a",
            "style": {"onPixels": {"name": "solid", "settings": {"color": "#éa"}}}
        });
        let loaded = Document::from_json(&saved, engine).unwrap();
        assert_eq!(loaded.issues.len(), 1);
        assert_eq!(loaded.value.design().style.on_pixels, Fill::default());
    }

    #[test]
    fn test_oversized_quiet_zone() {
        let engine: Arc<dyn EncodingEngine> = Arc::new(StaticEngine::new(BoolMatrix::new(21)));
        let saved = json!({"content": "a", "shape": {"quietZonePixelCount": 1u64 << 40}});
        let loaded = Document::from_json(&saved, engine.clone()).unwrap();
        assert_eq!(loaded.issues.len(), 1);
        assert_eq!(loaded.value.design().shape.quiet_zone, 0);

        let mut doc = Document::new("a", engine);
        doc.design_mut().shape.quiet_zone = usize::MAX / 2;
        assert!(doc.render(Size::new(100.0, 100.0)).is_err());
        assert!(matches!(doc.state(), RenderState::Failed(_)));
        doc.design_mut().shape.quiet_zone = 4;
        assert!(doc.render(Size::new(100.0, 100.0)).is_ok());
    }
}
