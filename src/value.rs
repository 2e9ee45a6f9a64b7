//! Per-cell scalar strategies for inset and rotation.
//!
//! A pixel generator with `useRandomInset` or `useRandomRotation` turned on
//! asks one of these for each cell instead of using its fixed fraction.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strum_macros::{EnumIter, EnumMessage, EnumString, IntoStaticStr};

use crate::error::Result;
use crate::geometry::{self, BezPath, PathExt, Size};
use crate::matrix::BoolMatrix;
use crate::registry::Generator;
use crate::settings::{self, SettingKey, SettingValue};

/// Seed every [`ValueKind::Random`] stream restarts from.
const RANDOM_SEED: u64 = 0x5152_434F_4445;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter, EnumMessage)]
#[strum(serialize_all = "camelCase")]
pub enum ValueKind {
    #[strum(message = "Fixed")]
    Fixed,
    #[strum(message = "Random")]
    Random,
    #[strum(message = "Punch")]
    Punch,
    #[strum(message = "Horizontal wave")]
    HorizontalWave,
    #[strum(message = "Vertical wave")]
    VerticalWave,
}

#[derive(Debug, Clone)]
pub struct ValueGenerator {
    kind: ValueKind,
    rng: StdRng,
}

impl Default for ValueGenerator {
    fn default() -> Self {
        Self::from_kind(ValueKind::Fixed)
    }
}

impl PartialEq for ValueGenerator {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

/// 1 at the middle of `0..dimension`, falling linearly to 0 at both ends.
fn triangle(index: usize, dimension: usize) -> f64 {
    if dimension < 2 {
        return 1.0;
    }
    let half = (dimension - 1) as f64 / 2.0;
    1.0 - ((index as f64 - half).abs() / half)
}

impl ValueGenerator {
    /// Value for the cell at `(row, col)`, in `0..=max_fraction`.
    ///
    /// Random variants advance their stream by one step per call, so callers
    /// must visit cells in the same order every traversal.
    pub fn value(&mut self, matrix: &BoolMatrix, row: usize, col: usize, max_fraction: f64) -> f64 {
        let dim = matrix.dimension();
        match self.kind {
            ValueKind::Fixed => max_fraction,
            ValueKind::Random => self.rng.random::<f64>() * max_fraction,
            ValueKind::Punch => max_fraction * triangle(col, dim).min(triangle(row, dim)),
            ValueKind::HorizontalWave => max_fraction * triangle(col, dim),
            ValueKind::VerticalWave => max_fraction * triangle(row, dim),
        }
    }

    /// Restarts the random stream from its fixed seed.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(RANDOM_SEED);
    }
}

const NO_KEYS: &[SettingKey] = &[];

impl Generator for ValueGenerator {
    type Kind = ValueKind;
    const FAMILY: &'static str = "value";

    fn from_kind(kind: ValueKind) -> Self {
        Self {
            kind,
            rng: StdRng::seed_from_u64(RANDOM_SEED),
        }
    }

    fn kind(&self) -> ValueKind {
        self.kind
    }

    fn supported_keys(&self) -> &'static [SettingKey] {
        NO_KEYS
    }

    fn get_setting(&self, _key: SettingKey) -> Option<SettingValue> {
        None
    }

    fn try_set_setting(&mut self, key: SettingKey, _value: &SettingValue) -> Result<()> {
        Err(settings::unsupported(key, self.name()))
    }

    /// A 9×9 grid of squares shrunk by the generated value.
    fn sample_path(&self, size: Size) -> BezPath {
        let mut g = self.copy();
        g.reset();
        let matrix = BoolMatrix::new(9);
        let cell = size.min_side() / 9.0;
        let mut path = BezPath::new();
        for (row, col, _) in matrix.cells() {
            let inset = g.value(&matrix, row, col, 0.45) * cell;
            if let Some(r) = geometry::shrink(geometry::rect(col as f64 * cell, row as f64 * cell, cell, cell), inset, inset) {
                path.add_rect(r);
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(g: &mut ValueGenerator, m: &BoolMatrix) -> Vec<f64> {
        m.cells().map(|(r, c, _)| g.value(m, r, c, 1.0)).collect()
    }

    #[test]
    fn test_fixed_returns_max() {
        let m = BoolMatrix::new(5);
        let mut g = ValueGenerator::from_kind(ValueKind::Fixed);
        assert_eq!(g.value(&m, 2, 3, 0.4), 0.4);
    }

    #[test]
    fn test_random_resets_to_same_stream() {
        let m = BoolMatrix::new(6);
        let mut g = ValueGenerator::from_kind(ValueKind::Random);
        let first = stream(&mut g, &m);
        let drifted = stream(&mut g, &m);
        assert_ne!(first, drifted);
        g.reset();
        assert_eq!(stream(&mut g, &m), first);
        assert!(first.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_copy_is_independent() {
        let m = BoolMatrix::new(4);
        let mut a = ValueGenerator::from_kind(ValueKind::Random);
        let mut b = a.copy();
        let _ = a.value(&m, 0, 0, 1.0);
        let from_a = a.value(&m, 0, 1, 1.0);
        let from_b = b.value(&m, 0, 0, 1.0);
        assert_ne!(from_a, from_b);
    }

    #[test]
    fn test_punch_and_waves() {
        let m = BoolMatrix::new(5);
        let mut punch = ValueGenerator::from_kind(ValueKind::Punch);
        assert_eq!(punch.value(&m, 2, 2, 1.0), 1.0);
        assert_eq!(punch.value(&m, 0, 2, 1.0), 0.0);
        assert_eq!(punch.value(&m, 1, 2, 1.0), 0.5);
        let mut h = ValueGenerator::from_kind(ValueKind::HorizontalWave);
        assert_eq!(h.value(&m, 0, 2, 1.0), 1.0);
        assert_eq!(h.value(&m, 2, 0, 1.0), 0.0);
        let mut v = ValueGenerator::from_kind(ValueKind::VerticalWave);
        assert_eq!(v.value(&m, 2, 0, 1.0), 1.0);
    }
}
