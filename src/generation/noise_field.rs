//! # Noise Fields
//!
//! Deterministic scalar fields over world coordinates. Terrain generation
//! samples several of these at different scales (regions, detail, water,
//! lava) and thresholds the results.
//!
//! Raw octave sums pile up around zero, so every field is calibrated at
//! construction: a seeded grid of raw samples gives quantile knots, and
//! `sample` maps raw values through that empirical CDF. Output is roughly
//! uniform over `[-1, 1]`, which lets thresholds and band weights read as
//! area fractions.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Which algorithm backs a [`NoiseField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseBackend {
    /// Sum of seeded, rotated periodic waves.
    #[default]
    Harmonic,
    /// Fractal Perlin noise from the `noise` crate.
    Perlin,
}

/// Calibration samples per axis.
const CALIBRATION_GRID: usize = 40;

/// Quantile knots kept from the calibration samples.
const CALIBRATION_KNOTS: usize = 41;

#[derive(Debug, Clone, Copy)]
struct Octave {
    cos: f32,
    sin: f32,
    phase_u: f32,
    phase_v: f32,
    frequency: f32,
    amplitude: f32,
}

#[derive(Clone)]
enum Backend {
    Harmonic { octaves: Vec<Octave>, norm: f32 },
    Perlin(Fbm<Perlin>),
}

/// A seeded, continuous field returning values in `[-1, 1]`.
///
/// # Examples
///
/// ```
/// use emberfall::{NoiseBackend, NoiseField};
///
/// let field = NoiseField::new(7, 24.0, 4, NoiseBackend::Harmonic);
/// let value = field.sample(10.0, -3.5);
/// assert!((-1.0..=1.0).contains(&value));
/// assert_eq!(value, NoiseField::new(7, 24.0, 4, NoiseBackend::Harmonic).sample(10.0, -3.5));
/// ```
#[derive(Clone)]
pub struct NoiseField {
    scale: f32,
    backend: Backend,
    /// Ascending raw values at evenly spaced quantiles
    knots: Vec<f32>,
}

impl NoiseField {
    /// Creates a field. `scale` is the feature size in tiles; larger means
    /// smoother. At least one octave is always used.
    pub fn new(seed: u64, scale: f32, octaves: u32, backend: NoiseBackend) -> Self {
        let octaves = octaves.clamp(1, 8);
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };

        let backend = match backend {
            NoiseBackend::Harmonic => {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut layers = Vec::with_capacity(octaves as usize);
                let mut amplitude = 1.0;
                let mut frequency = 1.0;
                let mut norm = 0.0;
                for _ in 0..octaves {
                    let angle = rng.gen_range(0.0..TAU);
                    layers.push(Octave {
                        cos: angle.cos(),
                        sin: angle.sin(),
                        phase_u: rng.gen_range(0.0..TAU),
                        phase_v: rng.gen_range(0.0..TAU),
                        frequency,
                        amplitude,
                    });
                    norm += amplitude;
                    amplitude *= 0.5;
                    frequency *= 2.0;
                }
                Backend::Harmonic {
                    octaves: layers,
                    norm,
                }
            }
            NoiseBackend::Perlin => {
                let fbm: Fbm<Perlin> = Fbm::new(seed as u32)
                    .set_octaves(octaves as usize)
                    .set_frequency(1.0);
                Backend::Perlin(fbm)
            }
        };

        let mut field = Self {
            scale,
            backend,
            knots: Vec::new(),
        };
        field.knots = field.calibrate();
        field
    }

    /// Samples the field at a world coordinate.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let raw = self.raw(x / self.scale, y / self.scale);
        self.rank(raw) * 2.0 - 1.0
    }

    /// Samples and remaps into `[0, 1]`.
    pub fn sample_unit(&self, x: f32, y: f32) -> f32 {
        (self.sample(x, y) + 1.0) * 0.5
    }

    /// Quantile knots from a skewed grid wide enough to cover many periods
    /// of the lowest octave. The offsets keep Perlin off its zero lattice.
    fn calibrate(&self) -> Vec<f32> {
        let mut samples: Vec<f32> = (0..CALIBRATION_GRID * CALIBRATION_GRID)
            .map(|i| {
                let (a, b) = ((i % CALIBRATION_GRID) as f32, (i / CALIBRATION_GRID) as f32);
                self.raw(a * 1.37 + b * 0.173 + 0.31, b * 1.29 + a * 0.097 + 0.53)
            })
            .collect();
        samples.sort_by(f32::total_cmp);

        let last = samples.len() - 1;
        (0..CALIBRATION_KNOTS)
            .map(|k| samples[k * last / (CALIBRATION_KNOTS - 1)])
            .collect()
    }

    /// Empirical CDF of a raw value, linear between knots.
    fn rank(&self, raw: f32) -> f32 {
        let knots = &self.knots;
        let (Some(first), Some(last)) = (knots.first(), knots.last()) else {
            return 0.5;
        };
        if raw <= *first {
            return 0.0;
        }
        if raw >= *last {
            return 1.0;
        }
        // first < raw < last, so 1 <= below <= len - 1
        let below = knots.partition_point(|k| *k <= raw);
        let (lo, hi) = (knots[below - 1], knots[below]);
        let t = if hi > lo { (raw - lo) / (hi - lo) } else { 0.0 };
        ((below - 1) as f32 + t) / (knots.len() - 1) as f32
    }

    /// Backend output at scaled coordinates, before calibration.
    fn raw(&self, x: f32, y: f32) -> f32 {
        match &self.backend {
            Backend::Harmonic { octaves, norm } => {
                let mut total = 0.0;
                for octave in octaves {
                    let u = (x * octave.cos - y * octave.sin) * octave.frequency;
                    let v = (x * octave.sin + y * octave.cos) * octave.frequency;
                    let wave = 0.5
                        * ((u + octave.phase_u).sin() * (v + octave.phase_v).cos()
                            + (v * 1.3 + octave.phase_u).sin() * (u * 0.7 + octave.phase_v).cos());
                    total += wave * octave.amplitude;
                }
                (total / norm).clamp(-1.0, 1.0)
            }
            Backend::Perlin(fbm) => (fbm.get([x as f64, y as f64]) as f32).clamp(-1.0, 1.0),
        }
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match self.backend {
            Backend::Harmonic { .. } => "harmonic",
            Backend::Perlin(_) => "perlin",
        };
        f.debug_struct("NoiseField")
            .field("scale", &self.scale)
            .field("backend", &backend)
            .finish()
    }
}

/// Per-cell hash in `[0, 1)`, stable for a seed and coordinate.
///
/// Used for probability rolls that must not depend on iteration order.
pub fn cell_hash(seed: u64, x: i32, y: i32) -> f32 {
    let mut h = seed
        ^ (x as u32 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as u32 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    h ^= h >> 30;
    h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;
    (h >> 40) as f32 / (1u64 << 24) as f32
}

/// Derives an independent seed for a named sub-field.
pub fn derive_seed(seed: u64, salt: u64) -> u64 {
    let mut h = seed.wrapping_add(salt.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    h
}
