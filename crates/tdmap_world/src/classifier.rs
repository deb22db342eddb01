//! # Tile Classification
//!
//! Maps a noise sample to one of five discrete tile categories.
//!
//! With the default cut points:
//!
//! | sample          | category |
//! |-----------------|----------|
//! | `< -0.5`        | 0        |
//! | `< -0.25`       | 1        |
//! | `< 0.25`        | 2        |
//! | `< 0.5`         | 3        |
//! | otherwise       | 4        |
//!
//! Each interval is half-open: a sample exactly on a cut point belongs to
//! the category above it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FormatError, MapError, MapResult};
use crate::resource::TileId;

/// Number of tile categories.
pub const CATEGORY_COUNT: usize = 5;

/// A discrete classification bucket, `0..=4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileCategory(u8);

impl TileCategory {
    /// Lowest category.
    pub const MIN: Self = Self(0);
    /// Highest category.
    pub const MAX: Self = Self(CATEGORY_COUNT as u8 - 1);

    /// Creates a category, or `None` if `value` is out of range.
    #[inline]
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if (value as usize) < CATEGORY_COUNT {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the raw category value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Position in `0..CATEGORY_COUNT`, for table lookups.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// All categories, lowest first.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..CATEGORY_COUNT as u8).map(Self)
    }

    /// The tile identifier for this category: `tile@{namespace}:{value}`.
    ///
    /// # Errors
    ///
    /// Returns an error if `namespace` is not a valid word.
    pub fn tile_id(self, namespace: &str) -> Result<TileId, FormatError> {
        TileId::new(namespace, &self.0.to_string())
    }
}

impl fmt::Display for TileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upper bounds (exclusive) of categories `0..=3`, ascending.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thresholds([f32; CATEGORY_COUNT - 1]);

impl Thresholds {
    /// The reference cut points.
    pub const DEFAULT: Self = Self([-0.5, -0.25, 0.25, 0.5]);

    /// Creates a threshold set.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] unless every cut point is finite
    /// and strictly greater than the one before it.
    pub fn new(cuts: [f32; CATEGORY_COUNT - 1]) -> MapResult<Self> {
        let thresholds = Self(cuts);
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Checks the cut points are finite and strictly ascending.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidConfig`] describing the first bad cut.
    pub fn validate(&self) -> MapResult<()> {
        if let Some(bad) = self.0.iter().find(|cut| !cut.is_finite()) {
            return Err(MapError::InvalidConfig(format!(
                "threshold {bad} is not finite"
            )));
        }
        if let Some(pair) = self.0.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(MapError::InvalidConfig(format!(
                "thresholds must ascend, found {} before {}",
                pair[0], pair[1]
            )));
        }
        Ok(())
    }

    /// The raw cut points.
    #[must_use]
    pub const fn cuts(&self) -> [f32; CATEGORY_COUNT - 1] {
        self.0
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Pure step function from noise sample to tile category.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NoiseClassifier {
    thresholds: Thresholds,
}

impl NoiseClassifier {
    /// Creates a classifier with custom cut points.
    ///
    /// # Errors
    ///
    /// Returns an error if the thresholds are not finite and ascending.
    pub fn new(thresholds: Thresholds) -> MapResult<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    /// Classifies a noise sample.
    ///
    /// Cut points are checked in ascending order and the first one the
    /// sample lies strictly below wins. NaN compares below nothing and
    /// lands in the top category.
    #[inline]
    #[must_use]
    pub fn classify(&self, sample: f32) -> TileCategory {
        let below = self
            .thresholds
            .0
            .iter()
            .position(|&cut| sample < cut)
            .unwrap_or(CATEGORY_COUNT - 1);
        TileCategory(below as u8)
    }

    /// The cut points in use.
    #[must_use]
    pub const fn thresholds(&self) -> Thresholds {
        self.thresholds
    }
}

/// The tile identifier for every category, resolved once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTiles {
    tiles: [TileId; CATEGORY_COUNT],
}

impl CategoryTiles {
    /// Resolves `tile@{namespace}:0` through `tile@{namespace}:4`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidFormat`] if `namespace` is not a word.
    pub fn new(namespace: &str) -> MapResult<Self> {
        let tile = |value| TileCategory(value).tile_id(namespace);
        Ok(Self {
            tiles: [tile(0)?, tile(1)?, tile(2)?, tile(3)?, tile(4)?],
        })
    }

    /// The tile for `category`.
    #[inline]
    #[must_use]
    pub fn get(&self, category: TileCategory) -> &TileId {
        &self.tiles[category.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_half_open() {
        let classifier = NoiseClassifier::default();

        assert_eq!(classifier.classify(-0.5).value(), 1);
        assert_eq!(classifier.classify(-0.5 - f32::EPSILON).value(), 0);
        assert_eq!(classifier.classify(-0.25).value(), 2);
        assert_eq!(classifier.classify(0.25).value(), 3);
        assert_eq!(classifier.classify(0.5).value(), 4);
        assert_eq!(classifier.classify(0.49999).value(), 3);
    }

    #[test]
    fn test_full_range() {
        let classifier = NoiseClassifier::default();

        assert_eq!(classifier.classify(-1.0), TileCategory::MIN);
        assert_eq!(classifier.classify(0.0).value(), 2);
        assert_eq!(classifier.classify(1.0), TileCategory::MAX);
        assert_eq!(classifier.classify(f32::NEG_INFINITY), TileCategory::MIN);
        assert_eq!(classifier.classify(f32::INFINITY), TileCategory::MAX);
        assert_eq!(classifier.classify(f32::NAN), TileCategory::MAX);
    }

    #[test]
    fn test_classification_is_monotonic() {
        let classifier = NoiseClassifier::default();
        let mut previous = TileCategory::MIN;
        for step in 0..=2000 {
            let sample = -1.0 + step as f32 * 0.001;
            let category = classifier.classify(sample);
            assert!(category >= previous, "category dropped at {sample}");
            previous = category;
        }
        assert_eq!(previous, TileCategory::MAX);
    }

    #[test]
    fn test_custom_thresholds() {
        let classifier =
            NoiseClassifier::new(Thresholds::new([-0.9, -0.1, 0.0, 0.1]).unwrap()).unwrap();
        assert_eq!(classifier.classify(-0.5).value(), 1);
        assert_eq!(classifier.classify(0.05).value(), 3);
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        assert!(Thresholds::new([-0.5, -0.5, 0.25, 0.5]).is_err());
        assert!(Thresholds::new([0.5, 0.25, -0.25, -0.5]).is_err());
        assert!(Thresholds::new([f32::NAN, 0.0, 0.1, 0.2]).is_err());
    }

    #[test]
    fn test_category_tiles() {
        let tiles = CategoryTiles::new("builtin").unwrap();
        for category in TileCategory::all() {
            let tile = tiles.get(category);
            assert_eq!(tile.to_string(), format!("tile@builtin:{category}"));
        }
        assert!(CategoryTiles::new("not valid").is_err());
    }

    #[test]
    fn test_category_bounds() {
        assert_eq!(TileCategory::new(4), Some(TileCategory::MAX));
        assert_eq!(TileCategory::new(5), None);
        assert_eq!(TileCategory::all().count(), CATEGORY_COUNT);
    }
}
