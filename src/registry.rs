//! Name → generator lookup for every generator family.
//!
//! Each family is a closed set of shapes described by a `Kind` enum. The
//! enum's strum derives supply the static name table (`EnumString`,
//! `IntoStaticStr`), enumeration order (`EnumIter`) and display titles
//! (`EnumMessage`), so a [`Factory`] needs no runtime registration.
//!
//! # Example
//!
//! ```rust
//! use qirender::registry::{Factory, Generator};
//! use qirender::pixel::PixelGenerator;
//! use qirender::settings::{GeneratorSettings, SettingKey};
//!
//! let factory = Factory::<PixelGenerator>::new();
//! let settings = GeneratorSettings::new().with(SettingKey::InsetFraction, 0.2);
//! let circle = factory.create("circle", Some(&settings)).unwrap();
//! assert_eq!(circle.name(), "circle");
//!
//! let stored = factory.serialize(&circle);
//! let restored = factory.deserialize(&stored).unwrap().value;
//! assert_eq!(restored.settings(), circle.settings());
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde_json::{json, Value};
use strum::{EnumMessage, IntoEnumIterator};

use crate::error::{Loaded, QrRenderError, Result};
use crate::geometry::{BezPath, Size};
use crate::settings::{GeneratorSettings, SettingKey, SettingValue};

/// The closed set of shapes a generator family can take.
pub trait GeneratorKind:
    Copy + PartialEq + fmt::Debug + IntoEnumIterator + FromStr + Into<&'static str> + EnumMessage + 'static
{
}

impl<T> GeneratorKind for T where
    T: Copy + PartialEq + fmt::Debug + IntoEnumIterator + FromStr + Into<&'static str> + EnumMessage + 'static
{
}

/// Common protocol of pixel, eye, pupil and value generators.
pub trait Generator: Clone + fmt::Debug {
    type Kind: GeneratorKind;

    /// Family label used in error messages ("pixel", "eye", ...).
    const FAMILY: &'static str;

    /// A generator of the given kind with its declared defaults.
    fn from_kind(kind: Self::Kind) -> Self;

    fn kind(&self) -> Self::Kind;

    fn supported_keys(&self) -> &'static [SettingKey];

    fn get_setting(&self, key: SettingKey) -> Option<SettingValue>;

    /// Applies one setting. On error nothing changes.
    fn try_set_setting(&mut self, key: SettingKey, value: &SettingValue) -> Result<()>;

    /// Small preview geometry in a `size` square, for building thumbnails.
    fn sample_path(&self, size: Size) -> BezPath;

    fn name(&self) -> &'static str {
        self.kind().into()
    }

    fn title(&self) -> &'static str {
        let kind = self.kind();
        kind.get_message().unwrap_or_else(|| kind.into())
    }

    fn supports_setting(&self, key: SettingKey) -> bool {
        self.supported_keys().contains(&key)
    }

    /// Applies one setting, returning `false` (and keeping the prior value)
    /// for an unsupported key or invalid value.
    fn set_setting(&mut self, key: SettingKey, value: impl Into<SettingValue>) -> bool {
        match self.try_set_setting(key, &value.into()) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("{} '{}': {}", Self::FAMILY, self.name(), e);
                false
            }
        }
    }

    /// Every supported setting with its current value.
    fn settings(&self) -> GeneratorSettings {
        let mut out = GeneratorSettings::new();
        for &key in self.supported_keys() {
            if let Some(v) = self.get_setting(key) {
                out.insert(key, v);
            }
        }
        out
    }

    /// Applies a whole settings map, returning the rejected entries.
    fn apply_settings(&mut self, settings: &GeneratorSettings) -> Vec<QrRenderError> {
        settings
            .iter()
            .filter_map(|(key, value)| self.try_set_setting(key, value).err())
            .collect()
    }

    /// An independent clone. Seeded state is never shared with the original.
    fn copy(&self) -> Self {
        self.clone()
    }
}

/// Lookup, enumeration and persistence for one generator family.
pub struct Factory<G> {
    marker: PhantomData<fn() -> G>,
}

impl<G> fmt::Debug for Factory<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory").finish()
    }
}

impl<G: Generator> Default for Factory<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Generator> Factory<G> {
    pub const fn new() -> Self {
        Self { marker: PhantomData }
    }

    /// Registered names, in registration order.
    pub fn available_names(&self) -> Vec<&'static str> {
        G::Kind::iter().map(Into::into).collect()
    }

    pub fn available_titles(&self) -> Vec<&'static str> {
        G::Kind::iter().map(|k| G::from_kind(k).title()).collect()
    }

    fn lookup(&self, name: &str) -> Result<G::Kind> {
        G::Kind::from_str(name).map_err(|_| QrRenderError::UnknownGenerator {
            family: G::FAMILY,
            name: name.to_string(),
        })
    }

    /// Creates the named generator. Invalid settings are skipped.
    ///
    /// # Errors
    ///
    /// [`QrRenderError::UnknownGenerator`] if `name` is not registered.
    pub fn create(&self, name: &str, settings: Option<&GeneratorSettings>) -> Result<G> {
        let mut generator = G::from_kind(self.lookup(name)?);
        if let Some(settings) = settings {
            for issue in generator.apply_settings(settings) {
                log::warn!("{} '{}': {}", G::FAMILY, name, issue);
            }
        }
        Ok(generator)
    }

    /// `{"name": ..., "settings": {...}}`
    pub fn serialize(&self, generator: &G) -> Value {
        json!({
            "name": generator.name(),
            "settings": generator.settings().to_json(),
        })
    }

    /// Rebuilds a generator from [`serialize`](Self::serialize) output.
    ///
    /// Missing or invalid settings keep the generator's defaults and are
    /// reported in [`Loaded::issues`]; only an unknown or missing name fails.
    pub fn deserialize(&self, value: &Value) -> Result<Loaded<G>> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| QrRenderError::Malformed(format!("{} generator has no name", G::FAMILY)))?;
        let mut generator = G::from_kind(self.lookup(name)?);
        let settings = value
            .get("settings")
            .map(GeneratorSettings::from_json)
            .unwrap_or_default();
        let issues = generator.apply_settings(&settings);
        Ok(Loaded { value: generator, issues })
    }

    /// Like [`deserialize`](Self::deserialize), but substitutes `fallback`
    /// for an unknown generator and records the failure.
    pub fn deserialize_or(&self, value: &Value, fallback: impl FnOnce() -> G) -> Loaded<G> {
        match self.deserialize(value) {
            Ok(loaded) => loaded,
            Err(e) => {
                log::warn!("Substituting default {} generator: {}", G::FAMILY, e);
                Loaded {
                    value: fallback(),
                    issues: vec![e],
                }
            }
        }
    }

    pub fn sample_path(&self, generator: &G, size: Size) -> BezPath {
        generator.sample_path(size)
    }
}
