//! The design model: which generators draw which partition ([`Shape`]) and
//! which fills paint them ([`Style`]).

use serde_json::{json, Value};

use crate::error::{Loaded, QrRenderError, Result};
use crate::eye::{EyeGenerator, PupilGenerator};
use crate::pixel::PixelGenerator;
use crate::registry::{Factory, Generator};
use crate::style::Style;

/// Largest quiet zone a design accepts, in modules per side.
pub const MAX_QUIET_ZONE: usize = 64;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub on_pixels: PixelGenerator,
    /// Unset means off pixels are not drawn.
    pub off_pixels: Option<PixelGenerator>,
    pub eye: EyeGenerator,
    /// Unset means the eye generator's own default pupil.
    pub pupil: Option<PupilGenerator>,
    /// Extra light modules added around the encoded matrix. Rendering
    /// fails above [`MAX_QUIET_ZONE`].
    pub quiet_zone: usize,
    background_corner_radius: f64,
    /// Swap on/off for content cells only.
    pub negated: bool,
}

impl Shape {
    pub fn background_corner_radius(&self) -> f64 {
        self.background_corner_radius
    }

    /// Corner radius of the background, as a fraction of half its side.
    ///
    /// # Errors
    ///
    /// [`QrRenderError::InvalidSetting`] outside 0..1; the previous value is kept.
    pub fn set_background_corner_radius(&mut self, fraction: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(QrRenderError::invalid_setting(
                "backgroundCornerRadius",
                format!("{} is outside 0..1", fraction),
            ));
        }
        self.background_corner_radius = fraction;
        Ok(())
    }

    pub fn resolved_pupil(&self) -> PupilGenerator {
        self.pupil.clone().unwrap_or_else(|| self.eye.default_pupil())
    }

    /// Deep copy whose seeded generators are independent of this one.
    pub fn copy(&self) -> Shape {
        Shape {
            on_pixels: self.on_pixels.copy(),
            off_pixels: self.off_pixels.as_ref().map(Generator::copy),
            eye: self.eye.copy(),
            pupil: self.pupil.as_ref().map(Generator::copy),
            ..*self
        }
    }

    pub fn settings(&self) -> Value {
        let pixels = Factory::<PixelGenerator>::new();
        let mut out = json!({
            "onPixels": pixels.serialize(&self.on_pixels),
            "eye": Factory::<EyeGenerator>::new().serialize(&self.eye),
            "quietZonePixelCount": self.quiet_zone,
            "backgroundCornerRadius": self.background_corner_radius,
            "negatedOnPixelsOnly": self.negated,
        });
        if let Some(off) = &self.off_pixels {
            out["offPixels"] = pixels.serialize(off);
        }
        if let Some(pupil) = &self.pupil {
            out["pupil"] = Factory::<PupilGenerator>::new().serialize(pupil);
        }
        out
    }

    /// Rebuilds a shape field by field. Unknown generators and bad values are
    /// replaced by defaults and reported; nothing here aborts the load.
    pub fn from_settings(value: &Value) -> Loaded<Shape> {
        let mut shape = Shape::default();
        let mut issues = Vec::new();
        if !value.is_object() {
            issues.push(QrRenderError::Malformed("shape is not an object".to_string()));
            return Loaded { value: shape, issues };
        }
        let pixels = Factory::<PixelGenerator>::new();

        if let Some(v) = value.get("onPixels") {
            let loaded = pixels.deserialize_or(v, PixelGenerator::default);
            issues.extend(loaded.issues);
            shape.on_pixels = loaded.value;
        }
        if let Some(v) = value.get("offPixels") {
            let loaded = pixels.deserialize_or(v, PixelGenerator::default);
            issues.extend(loaded.issues);
            shape.off_pixels = Some(loaded.value);
        }
        if let Some(v) = value.get("eye") {
            let loaded = Factory::<EyeGenerator>::new().deserialize_or(v, EyeGenerator::default);
            issues.extend(loaded.issues);
            shape.eye = loaded.value;
        }
        if let Some(v) = value.get("pupil") {
            // An unknown pupil falls back to the eye's own pupil.
            match Factory::<PupilGenerator>::new().deserialize(v) {
                Ok(loaded) => {
                    issues.extend(loaded.issues);
                    shape.pupil = Some(loaded.value);
                }
                Err(e) => {
                    log::warn!("Pupil falls back to the eye's default: {}", e);
                    issues.push(e);
                }
            }
        }
        if let Some(v) = value.get("quietZonePixelCount") {
            match v.as_u64() {
                Some(n) if n <= MAX_QUIET_ZONE as u64 => shape.quiet_zone = n as usize,
                Some(n) => issues.push(QrRenderError::invalid_setting(
                    "quietZonePixelCount",
                    format!("{} is above the limit of {}", n, MAX_QUIET_ZONE),
                )),
                None => issues.push(QrRenderError::invalid_setting("quietZonePixelCount", "expected a count")),
            }
        }
        if let Some(v) = value.get("backgroundCornerRadius") {
            let result = v
                .as_f64()
                .ok_or_else(|| QrRenderError::invalid_setting("backgroundCornerRadius", "expected a number"))
                .and_then(|f| shape.set_background_corner_radius(f));
            if let Err(e) = result {
                issues.push(e);
            }
        }
        if let Some(v) = value.get("negatedOnPixelsOnly") {
            match v.as_bool() {
                Some(b) => shape.negated = b,
                None => issues.push(QrRenderError::invalid_setting("negatedOnPixelsOnly", "expected a boolean")),
            }
        }
        Loaded { value: shape, issues }
    }
}

/// Everything about how a symbol looks, independent of its content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Design {
    pub shape: Shape,
    pub style: Style,
}

impl Design {
    pub fn new(shape: Shape, style: Style) -> Self {
        Self { shape, style }
    }

    pub fn copy(&self) -> Design {
        Design {
            shape: self.shape.copy(),
            style: self.style.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eye::{EyeShape, PupilShape};
    use crate::pixel::PixelShape;
    use crate::settings::SettingKey;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip() {
        let mut on = PixelGenerator::new(PixelShape::Flower);
        on.set_setting(SettingKey::RotationFraction, 0.3);
        let mut shape = Shape {
            on_pixels: on,
            off_pixels: Some(PixelGenerator::new(PixelShape::Circle)),
            eye: EyeGenerator::new(EyeShape::Leaf),
            pupil: Some(PupilGenerator::new(PupilShape::Cross)),
            quiet_zone: 3,
            negated: true,
            ..Shape::default()
        };
        shape.set_background_corner_radius(0.4).unwrap();
        let loaded = Shape::from_settings(&shape.settings());
        assert!(loaded.is_clean(), "{:?}", loaded.issues);
        assert_eq!(loaded.value, shape);
    }

    #[test]
    fn test_unknown_generators_substitute_defaults() {
        let loaded = Shape::from_settings(&json!({
            "onPixels": {"name": "hexagon", "settings": {}},
            "eye": {"name": "circle"},
            "pupil": {"name": "triangle"},
            "quietZonePixelCount": 2,
        }));
        assert_eq!(loaded.issues.len(), 2);
        assert!(loaded
            .issues
            .iter()
            .all(|e| matches!(e, QrRenderError::UnknownGenerator { .. })));
        assert_eq!(loaded.value.on_pixels, PixelGenerator::default());
        assert_eq!(loaded.value.eye, EyeGenerator::new(EyeShape::Circle));
        assert_eq!(loaded.value.pupil, None);
        assert_eq!(loaded.value.resolved_pupil().name(), "circle");
        assert_eq!(loaded.value.quiet_zone, 2);
    }

    #[test]
    fn test_background_radius_validation() {
        let mut shape = Shape::default();
        shape.set_background_corner_radius(0.5).unwrap();
        assert!(shape.set_background_corner_radius(1.5).is_err());
        assert_eq!(shape.background_corner_radius(), 0.5);
    }

    #[test]
    fn test_quiet_zone_limit() {
        let loaded = Shape::from_settings(&json!({"quietZonePixelCount": 1u64 << 40}));
        assert_eq!(loaded.issues.len(), 1);
        assert!(matches!(&loaded.issues[0], QrRenderError::InvalidSetting { key, .. } if key == "quietZonePixelCount"));
        assert_eq!(loaded.value.quiet_zone, 0);

        let loaded = Shape::from_settings(&json!({"quietZonePixelCount": MAX_QUIET_ZONE}));
        assert!(loaded.is_clean());
        assert_eq!(loaded.value.quiet_zone, MAX_QUIET_ZONE);
    }
}
