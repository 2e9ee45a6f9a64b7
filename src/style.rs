//! Which fill paints which partition.

use serde_json::{Map, Value};

use crate::error::{Loaded, QrRenderError, Result};
use crate::fill::{Color, Fill};

#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub on_pixels: Fill,
    /// Unset means off pixels are not drawn.
    pub off_pixels: Option<Fill>,
    pub eye: Option<Fill>,
    pub pupil: Option<Fill>,
    pub background: Option<Fill>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            on_pixels: Fill::Solid(Color::BLACK),
            off_pixels: None,
            eye: None,
            pupil: None,
            background: Some(Fill::Solid(Color::WHITE)),
        }
    }
}

impl Style {
    /// Solid foreground on a solid background.
    pub fn solid(foreground: Color, background: Option<Color>) -> Self {
        Self {
            on_pixels: Fill::Solid(foreground),
            background: background.map(Fill::Solid),
            ..Self::default()
        }
    }

    /// Eye fill, falling back to the on-pixel fill.
    pub fn resolved_eye(&self) -> &Fill {
        self.eye.as_ref().unwrap_or(&self.on_pixels)
    }

    /// Pupil fill, falling back to the eye fill and then the on-pixel fill.
    pub fn resolved_pupil(&self) -> &Fill {
        self.pupil.as_ref().unwrap_or_else(|| self.resolved_eye())
    }

    pub fn settings(&self) -> Result<Value> {
        let mut map = Map::new();
        map.insert("onPixels".to_string(), self.on_pixels.settings()?);
        let optional = [
            ("offPixels", &self.off_pixels),
            ("eye", &self.eye),
            ("pupil", &self.pupil),
            ("background", &self.background),
        ];
        for (key, fill) in optional {
            if let Some(fill) = fill {
                map.insert(key.to_string(), fill.settings()?);
            }
        }
        Ok(Value::Object(map))
    }

    /// Rebuilds a style field by field; a field that fails to load keeps its
    /// default and the failure is reported.
    pub fn from_settings(value: &Value) -> Loaded<Style> {
        let mut style = Style::default();
        let mut issues = Vec::new();
        let Some(map) = value.as_object() else {
            issues.push(QrRenderError::Malformed("style is not an object".to_string()));
            return Loaded { value: style, issues };
        };
        let mut load = |key: &str| -> Option<Fill> {
            let raw = map.get(key)?;
            match Fill::from_settings(raw) {
                Ok(fill) => Some(fill),
                Err(e) => {
                    log::warn!("Style field '{}' falls back to its default: {}", key, e);
                    issues.push(e);
                    None
                }
            }
        };
        if let Some(fill) = load("onPixels") {
            style.on_pixels = fill;
        }
        style.off_pixels = load("offPixels");
        style.eye = load("eye");
        style.pupil = load("pupil");
        // Background defaults to white only when the key is absent altogether.
        if map.contains_key("background") {
            style.background = load("background").or(style.background);
        } else {
            style.background = None;
        }
        Loaded { value: style, issues }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_fallback_chain() {
        let red = Fill::Solid(Color::rgb(255, 0, 0));
        let blue = Fill::Solid(Color::rgb(0, 0, 255));
        let green = Fill::Solid(Color::rgb(0, 255, 0));

        let mut style = Style { on_pixels: red.clone(), ..Style::default() };
        assert_eq!(style.resolved_eye(), &red);
        assert_eq!(style.resolved_pupil(), &red);

        style.eye = Some(blue.clone());
        assert_eq!(style.resolved_eye(), &blue);
        assert_eq!(style.resolved_pupil(), &blue);

        style.pupil = Some(green.clone());
        assert_eq!(style.resolved_pupil(), &green);
        assert_eq!(style.resolved_eye(), &blue);
    }

    #[test]
    fn test_round_trip() {
        let style = Style {
            eye: Some(Fill::Solid(Color::rgb(1, 2, 3))),
            ..Style::default()
        };
        let loaded = Style::from_settings(&style.settings().unwrap());
        assert!(loaded.is_clean());
        assert_eq!(loaded.value, style);
    }

    #[test]
    fn test_bad_field_keeps_default() {
        let loaded = Style::from_settings(&json!({
            "onPixels": {"name": "plaid", "settings": {}},
            "eye": {"name": "solid", "settings": {"color": "#00ff00"}},
        }));
        assert_eq!(loaded.issues.len(), 1);
        assert_eq!(loaded.value.on_pixels, Fill::Solid(Color::BLACK));
        assert_eq!(loaded.value.eye, Some(Fill::Solid(Color::rgb(0, 255, 0))));
        assert_eq!(loaded.value.background, None);
    }
}
