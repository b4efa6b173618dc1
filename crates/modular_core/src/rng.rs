//! Random number sources for the solver.
//!
//! - `StdRandom`: `rand::rngs::StdRng`, drives cell selection and collapse.
//! - `DotNetRandom`: `clr_random::CLRRandom`, a .NET `System.Random`
//!   compatible stream. Variant choice seeds one per cell from the cell's
//!   global position, so layouts reproduce across runs and hosts.
//!
//! Both implement [`SolverRng`], the only interface the scheduler and the
//! variant resolver see.

use clr_random::CLRRandom;
use glam::IVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_core::SeedableRng as RandCoreSeedableRng;

/// Random source used by the solver.
pub trait SolverRng {
    /// Returns a random double in [0.0, 1.0).
    fn next_double(&mut self) -> f64;

    /// Returns a random integer in [0, max).
    fn next_int_max(&mut self, max: i32) -> i32;

    /// Returns a random usize in [0, max). Convenience for indexing.
    fn next_usize_max(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        ((self.next_double() * max as f64) as usize).min(max - 1)
    }
}

/// Standard Rust RNG wrapper.
#[derive(Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_u64_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from OS entropy; runs are not reproducible.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic when `seed` is given, entropy-seeded otherwise.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_u64_seed(seed),
            None => Self::from_entropy(),
        }
    }
}

impl SolverRng for StdRandom {
    fn next_double(&mut self) -> f64 {
        self.rng.gen()
    }

    fn next_int_max(&mut self, max: i32) -> i32 {
        if max <= 0 {
            return 0;
        }
        self.rng.gen_range(0..max)
    }
}

/// .NET-compatible RNG wrapper.
///
/// Produces the same sequence as `new System.Random(seed)`.
pub struct DotNetRandom {
    rng: CLRRandom,
}

impl DotNetRandom {
    pub fn from_seed(seed: i32) -> Self {
        Self {
            rng: CLRRandom::from_seed(clr_random::Seed::from(seed)),
        }
    }

    /// Generator for the cell at `global`.
    pub fn for_position(global: IVec3) -> Self {
        Self::from_seed(position_seed(global))
    }
}

impl SolverRng for DotNetRandom {
    fn next_double(&mut self) -> f64 {
        self.rng.next_f64()
    }

    fn next_int_max(&mut self, max: i32) -> i32 {
        if max <= 0 {
            return 0;
        }
        // (int)(Sample() * maxValue)
        (self.rng.next_f64() * max as f64) as i32
    }
}

/// Stable 32-bit hash of an integer position.
///
/// Same mixing as a Unity `Vector3Int` hash code, so seeds match positions
/// authored in the editor: `x ^ (y << 4) ^ (y >> 28) ^ (z >> 4) ^ (z << 28)`.
pub fn position_seed(p: IVec3) -> i32 {
    let y = p.y as u32;
    let z = p.z as u32;
    let mixed = (p.x as u32) ^ (y << 4) ^ (y >> 28) ^ (z >> 4) ^ (z << 28);
    mixed as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_random_ranges() {
        let mut rng = StdRandom::from_u64_seed(42);
        for _ in 0..100 {
            let v = rng.next_double();
            assert!((0.0..1.0).contains(&v));
            let i = rng.next_int_max(10);
            assert!((0..10).contains(&i));
            assert!(rng.next_usize_max(3) < 3);
        }
        assert_eq!(rng.next_usize_max(0), 0);
    }

    #[test]
    fn test_std_random_is_deterministic() {
        let mut a = StdRandom::from_u64_seed(7);
        let mut b = StdRandom::from_optional_seed(Some(7));
        for _ in 0..50 {
            assert_eq!(a.next_double(), b.next_double());
        }
    }

    #[test]
    fn test_dotnet_random_next_double_matches_csharp() {
        let mut rng = DotNetRandom::from_seed(42);

        // C# new Random(42).NextDouble()
        let expected = 0.6681064659115423;
        let got = rng.next_double();
        assert!(
            (got - expected).abs() < 1e-15,
            "NextDouble mismatch: expected {}, got {}",
            expected,
            got
        );
    }

    #[test]
    fn test_dotnet_random_next_max_bounds() {
        let mut rng = DotNetRandom::from_seed(42);
        for _ in 0..100 {
            let v = rng.next_int_max(10);
            assert!((0..10).contains(&v), "Value {} out of range [0, 10)", v);
        }
    }

    #[test]
    fn test_position_seed() {
        assert_eq!(position_seed(IVec3::ZERO), 0);
        assert_eq!(position_seed(IVec3::new(5, 0, 0)), 5);
        assert_eq!(position_seed(IVec3::new(0, 1, 0)), 16);
        assert_eq!(position_seed(IVec3::new(0, 0, 1)), 1 << 28);
        assert_ne!(
            position_seed(IVec3::new(1, 2, 3)),
            position_seed(IVec3::new(3, 2, 1))
        );
    }

    #[test]
    fn test_same_position_same_stream() {
        let p = IVec3::new(-12, 3, 40);
        let mut a = DotNetRandom::for_position(p);
        let mut b = DotNetRandom::for_position(p);
        for _ in 0..10 {
            assert_eq!(a.next_double(), b.next_double());
        }
    }
}
