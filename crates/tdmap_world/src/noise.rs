//! # Noise Sources
//!
//! The map never generates noise itself. It drives any [`NoiseSource`]:
//! seed it, set its frequency, sample it at integer tile coordinates.
//!
//! [`SimplexNoiseSource`] is the stock implementation: 2D simplex noise
//! with optional fractal octaves.
//!
//! ## Determinism Guarantee
//!
//! Given the same seed and settings, [`SimplexNoiseSource`] produces
//! **exactly** the same values on any platform, any time.

use crate::error::NoiseError;

/// A seedable 2D noise field.
///
/// Implementations must be deterministic: after the same `set_seed` and
/// `set_frequency` calls, `sample_2d` returns the same value for the same
/// coordinates.
pub trait NoiseSource {
    /// Reseeds the field.
    ///
    /// # Errors
    ///
    /// Returns [`NoiseError::InvalidSeed`] if the source cannot use `seed`.
    fn set_seed(&mut self, seed: i32) -> Result<(), NoiseError>;

    /// Sets the sampling frequency (coordinate scale).
    ///
    /// # Errors
    ///
    /// Returns [`NoiseError::InvalidFrequency`] if `frequency` is rejected.
    fn set_frequency(&mut self, frequency: f32) -> Result<(), NoiseError>;

    /// Samples the field. The result lies in `[-1, 1]`.
    fn sample_2d(&self, x: f32, y: f32) -> f32;
}

impl<N: NoiseSource + ?Sized> NoiseSource for Box<N> {
    fn set_seed(&mut self, seed: i32) -> Result<(), NoiseError> {
        (**self).set_seed(seed)
    }

    fn set_frequency(&mut self, frequency: f32) -> Result<(), NoiseError> {
        (**self).set_frequency(frequency)
    }

    fn sample_2d(&self, x: f32, y: f32) -> f32 {
        (**self).sample_2d(x, y)
    }
}

/// Seed for the permutation table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Widens a signed map seed. Negative seeds stay distinct from positive
    /// ones.
    #[inline]
    #[must_use]
    pub const fn from_map_seed(seed: i32) -> Self {
        Self(seed as u32 as u64)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g. one octave).
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        // FNV-1a style mixing
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

/// Pre-computed permutation table, rebuilt on every reseed.
#[derive(Clone)]
struct PermutationTable {
    /// 512-entry permutation table (256 entries, doubled for overflow handling).
    perm: [u8; 512],
}

impl PermutationTable {
    /// 12 gradient vectors for 2D simplex.
    const GRADIENTS: [[i8; 2]; 12] = [
        [1, 0], [1, 1], [0, 1], [-1, 1],
        [-1, 0], [-1, -1], [0, -1], [1, -1],
        [1, 0], [0, 1], [-1, 0], [0, -1],
    ];

    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates with xorshift64; a zero state would never move.
        let mut rng_state = seed.derive(0x7464_6d61_70).value() | 1;
        for i in (1..256).rev() {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;

            let j = (rng_state % (i as u64 + 1)) as usize;
            perm.swap(i, j);
        }

        perm.copy_within(0..256, 256);
        Self { perm }
    }

    #[inline]
    fn get(&self, index: usize) -> u8 {
        self.perm[index & 511]
    }

    #[inline]
    fn gradient(hash: u8) -> [i8; 2] {
        Self::GRADIENTS[(hash % 12) as usize]
    }
}

/// 2D Simplex noise over a fixed permutation table.
///
/// Produces smooth, continuous values in `[-1, 1]`.
#[derive(Clone)]
pub struct SimplexNoise {
    perm_table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor for 2D simplex grid.
    const F2: f64 = 0.366_025_403_784_439; // (sqrt(3) - 1) / 2
    /// Unskewing factor for 2D simplex grid.
    const G2: f64 = 0.211_324_865_405_187; // (3 - sqrt(3)) / 6

    /// Creates a noise field from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples 2D simplex noise, in `[-1, 1]`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        // Skew input coordinates to simplex grid
        let skew = (x + y) * Self::F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        let unskew = f64::from(i + j) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        // Upper or lower triangle
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + Self::G2;
        let y1 = y0 - f64::from(j1) + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let table = &self.perm_table;

        let gi0 = table.get(ii + table.get(jj) as usize);
        let gi1 = table.get(ii + i1 as usize + table.get(jj + j1 as usize) as usize);
        let gi2 = table.get(ii + 1 + table.get(jj + 1) as usize);

        let n0 = Self::contribution(x0, y0, gi0);
        let n1 = Self::contribution(x1, y1, gi1);
        let n2 = Self::contribution(x2, y2, gi2);

        // 70.0 normalizes the corner sum to [-1, 1]
        (70.0 * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }

    #[inline]
    fn contribution(x: f64, y: f64, gradient_index: u8) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            0.0
        } else {
            let grad = PermutationTable::gradient(gradient_index);
            let t2 = t * t;
            t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]))
        }
    }

    /// Fractal (fBm) noise: `octaves` layers at rising frequency and
    /// falling amplitude, normalized back to `[-1, 1]`.
    #[must_use]
    pub fn octaved(&self, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves.max(1) {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / max_amplitude
    }
}

#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) {
        xi - 1
    } else {
        xi
    }
}

/// Fractal layering settings for [`SimplexNoiseSource`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fractal {
    /// Number of layers, at least 1.
    pub octaves: u32,
    /// Amplitude multiplier per layer.
    pub persistence: f32,
    /// Frequency multiplier per layer.
    pub lacunarity: f32,
}

impl Default for Fractal {
    fn default() -> Self {
        Self {
            octaves: 1,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Simplex noise behind the [`NoiseSource`] interface.
///
/// # Example
///
/// ```
/// use tdmap_world::{NoiseSource, SimplexNoiseSource};
///
/// let mut noise = SimplexNoiseSource::default();
/// noise.set_seed(42)?;
/// noise.set_frequency(0.1)?;
/// let value = noise.sample_2d(10.0, 20.0);
/// assert!((-1.0..=1.0).contains(&value));
/// # Ok::<(), tdmap_world::NoiseError>(())
/// ```
#[derive(Clone)]
pub struct SimplexNoiseSource {
    seed: i32,
    frequency: f32,
    fractal: Fractal,
    noise: SimplexNoise,
}

impl SimplexNoiseSource {
    /// Frequency used until `set_frequency` is called.
    pub const DEFAULT_FREQUENCY: f32 = 0.01;

    /// Creates a source with the given seed and fractal settings.
    #[must_use]
    pub fn new(seed: i32, fractal: Fractal) -> Self {
        Self {
            seed,
            frequency: Self::DEFAULT_FREQUENCY,
            fractal: Fractal {
                octaves: fractal.octaves.max(1),
                ..fractal
            },
            noise: SimplexNoise::new(WorldSeed::from_map_seed(seed)),
        }
    }

    /// Current seed.
    #[must_use]
    pub const fn seed(&self) -> i32 {
        self.seed
    }

    /// Current frequency.
    #[must_use]
    pub const fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Current fractal settings.
    #[must_use]
    pub const fn fractal(&self) -> Fractal {
        self.fractal
    }
}

impl Default for SimplexNoiseSource {
    fn default() -> Self {
        Self::new(0, Fractal::default())
    }
}

impl NoiseSource for SimplexNoiseSource {
    fn set_seed(&mut self, seed: i32) -> Result<(), NoiseError> {
        if seed != self.seed {
            self.seed = seed;
            self.noise = SimplexNoise::new(WorldSeed::from_map_seed(seed));
        }
        Ok(())
    }

    fn set_frequency(&mut self, frequency: f32) -> Result<(), NoiseError> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(NoiseError::InvalidFrequency(frequency));
        }
        self.frequency = frequency;
        Ok(())
    }

    fn sample_2d(&self, x: f32, y: f32) -> f32 {
        let scale = f64::from(self.frequency);
        let (x, y) = (f64::from(x) * scale, f64::from(y) * scale);
        let value = if self.fractal.octaves == 1 {
            self.noise.sample(x, y)
        } else {
            self.noise.octaved(
                x,
                y,
                self.fractal.octaves,
                f64::from(self.fractal.persistence),
                f64::from(self.fractal.lacunarity),
            )
        };
        value.clamp(-1.0, 1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: i32) -> SimplexNoiseSource {
        let mut noise = SimplexNoiseSource::default();
        noise.set_seed(seed).unwrap();
        noise.set_frequency(0.1).unwrap();
        noise
    }

    #[test]
    fn test_determinism() {
        let noise1 = seeded(12345);
        let noise2 = seeded(12345);

        for i in 0..100 {
            let x = i as f32;
            let y = i as f32 * 1.7;
            assert_eq!(noise1.sample_2d(x, y), noise2.sample_2d(x, y));
        }
    }

    #[test]
    fn test_reseed_matches_fresh_source() {
        let mut reused = seeded(1);
        reused.set_seed(99).unwrap();
        let fresh = seeded(99);

        for i in 0..50 {
            let (x, y) = (i as f32 * 3.0, i as f32 * 5.0);
            assert_eq!(reused.sample_2d(x, y), fresh.sample_2d(x, y));
        }
    }

    #[test]
    fn test_different_seeds_different_results() {
        let noise1 = seeded(1);
        let noise2 = seeded(2);

        let differs = (0..64).any(|i| {
            let (x, y) = (i as f32 * 1.3, i as f32 * 0.7);
            noise1.sample_2d(x, y) != noise2.sample_2d(x, y)
        });
        assert!(differs, "Different seeds should produce different fields");
    }

    #[test]
    fn test_negative_seed_is_distinct() {
        let positive = seeded(7);
        let negative = seeded(-7);
        let differs = (0..64).any(|i| {
            let x = i as f32 * 2.1;
            positive.sample_2d(x, x) != negative.sample_2d(x, x)
        });
        assert!(differs);
    }

    #[test]
    fn test_range() {
        for octaves in [1, 5] {
            let mut noise = SimplexNoiseSource::new(
                42,
                Fractal {
                    octaves,
                    ..Fractal::default()
                },
            );
            noise.set_frequency(0.1).unwrap();

            for i in 0..10_000 {
                let x = (i % 100) as f32 - 50.0;
                let y = (i / 100) as f32 - 50.0;
                let value = noise.sample_2d(x, y);
                assert!(
                    (-1.0..=1.0).contains(&value),
                    "Value {value} out of range at ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn test_continuity() {
        let noise = SimplexNoise::new(WorldSeed::new(42));

        let v1 = noise.sample(100.0, 100.0);
        let v2 = noise.sample(100.001, 100.0);
        let v3 = noise.sample(100.0, 100.001);

        assert!((v1 - v2).abs() < 0.01, "Noise should be continuous");
        assert!((v1 - v3).abs() < 0.01, "Noise should be continuous");
    }

    #[test]
    fn test_rejects_bad_frequency() {
        let mut noise = SimplexNoiseSource::default();
        assert_eq!(noise.set_frequency(0.0), Err(NoiseError::InvalidFrequency(0.0)));
        assert!(noise.set_frequency(-0.1).is_err());
        assert!(noise.set_frequency(f32::NAN).is_err());
        assert!(noise.set_frequency(f32::INFINITY).is_err());
        assert_eq!(noise.frequency(), SimplexNoiseSource::DEFAULT_FREQUENCY);
    }

    #[test]
    fn test_zero_octaves_treated_as_one() {
        let noise = SimplexNoiseSource::new(
            3,
            Fractal {
                octaves: 0,
                ..Fractal::default()
            },
        );
        assert_eq!(noise.fractal().octaves, 1);
    }

    #[test]
    fn test_seed_derivation() {
        let base = WorldSeed::new(42);
        assert_ne!(base.derive(1), base.derive(2));
        assert_eq!(base.derive(1), base.derive(1));
        assert_ne!(base.derive(1), base);
    }

    #[test]
    fn test_boxed_source_forwards() {
        let mut boxed: Box<dyn NoiseSource> = Box::new(SimplexNoiseSource::default());
        boxed.set_seed(5).unwrap();
        boxed.set_frequency(0.1).unwrap();
        assert_eq!(boxed.sample_2d(3.0, 4.0), seeded(5).sample_2d(3.0, 4.0));
    }
}
