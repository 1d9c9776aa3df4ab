//!
//! kiln-std-random - Random Number Holder
//!
//! `random()`, `random(seed)` and `random_with_seed64_offset(seed, offset)`
//! produce doubles in [0.0, 1.0) from a xorshift64 generator.
//!
//! ## Seeding
//!
//! - fixed seed: the seed passes through splitmix64, so the sequence is
//!   reproducible and nearby seeds diverge immediately
//! - null seed: seed 0
//! - no seed: one draw from the process RNG at construction
//!
//! ## Thread Safety
//!
//! The state lives in an `AtomicU64` advanced with a compare-exchange loop.
//! Concurrent callers on one holder each receive a distinct element of the
//! same sequence.
//!

use std::sync::atomic::{AtomicU64, Ordering};

use kiln_std_core::{handle, HolderError, Literal, LiteralArgs, StubSignature};

/// Substitute for an all-zero state, which xorshift can never leave.
const NONZERO_STATE: u64 = 0x9E37_79B9_7F4A_7C15;

fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn xorshift(mut s: u64) -> u64 {
    s ^= s << 13;
    s ^= s >> 7;
    s ^= s << 17;
    s
}

#[derive(Debug)]
pub struct RandomGeneratorHolder {
    state: AtomicU64,
}

impl RandomGeneratorHolder {
    pub fn with_seed(seed: i64) -> Self {
        let state = match splitmix64(seed as u64) {
            0 => NONZERO_STATE,
            s => s,
        };
        Self {
            state: AtomicU64::new(state),
        }
    }

    /// `random()` or `random(seed)`.
    pub fn make(args: &LiteralArgs<'_>) -> Result<Self, HolderError> {
        args.expect_arity(0, 1)?;
        let seed = match args.get(0) {
            None => rand::random::<i64>(),
            Some(Literal::Null) => 0,
            Some(_) => args.int64(0)?,
        };
        tracing::debug!(seeded = !args.is_empty(), "random holder ready");
        Ok(Self::with_seed(seed))
    }

    /// `random_with_seed64_offset(seed, offset)`.
    pub fn make_with_offset(args: &LiteralArgs<'_>) -> Result<Self, HolderError> {
        args.expect_arity(2, 2)?;
        let seed = args.int64(0)?;
        let offset = args.int64(1)?;
        tracing::debug!(seed, offset, "random holder ready");
        Ok(Self::with_seed(seed.wrapping_add(offset)))
    }

    pub fn next_u64(&self) -> u64 {
        let mut current = self.state.load(Ordering::Relaxed);
        loop {
            let next = xorshift(current);
            match self
                .state
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Uniform in [0.0, 1.0) with 53 bits of precision.
    pub fn call(&self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn kiln_random(holder_ptr: i64) -> f64 {
    unsafe { handle::holder::<RandomGeneratorHolder>(holder_ptr).call() }
}

pub fn signatures() -> Vec<StubSignature> {
    use kiln_std_core::stub;
    vec![stub!(kiln_random, [I64] -> F64)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn seeded(seed: i64) -> RandomGeneratorHolder {
        let args = [Literal::Int64(seed)];
        RandomGeneratorHolder::make(&LiteralArgs::new("random", &args)).unwrap()
    }

    #[test]
    fn test_range() {
        let h = seeded(42);
        for _ in 0..10_000 {
            let v = h.call();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let a = seeded(7);
        let b = seeded(7);
        let first: Vec<f64> = (0..16).map(|_| a.call()).collect();
        let second: Vec<f64> = (0..16).map(|_| b.call()).collect();
        assert_eq!(first, second);
        assert_ne!(seeded(8).call(), seeded(7).call());
    }

    #[test]
    fn test_null_seed_is_zero() {
        let args = [Literal::Null];
        let h = RandomGeneratorHolder::make(&LiteralArgs::new("random", &args)).unwrap();
        assert_eq!(h.call(), seeded(0).call());
    }

    #[test]
    fn test_offset() {
        let args = [Literal::Int64(100), Literal::Int32(5)];
        let h = RandomGeneratorHolder::make_with_offset(&LiteralArgs::new("random_with_seed64_offset", &args)).unwrap();
        assert_eq!(h.call(), seeded(105).call());
    }

    #[test]
    fn test_unseeded_constructs() {
        let h = RandomGeneratorHolder::make(&LiteralArgs::new("random", &[])).unwrap();
        assert!((0.0..1.0).contains(&h.call()));
    }

    #[test]
    fn test_bad_seed_literal() {
        let args = [Literal::Utf8("x".into())];
        assert!(RandomGeneratorHolder::make(&LiteralArgs::new("random", &args)).is_err());
    }

    #[test]
    fn test_concurrent_callers_split_one_sequence() {
        const THREADS: usize = 4;
        const DRAWS: usize = 2_000;

        let expected: HashSet<u64> = {
            let h = seeded(99);
            (0..THREADS * DRAWS).map(|_| h.next_u64()).collect()
        };

        let shared = seeded(99);
        let drawn: Vec<Vec<u64>> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..THREADS)
                .map(|_| s.spawn(|| (0..DRAWS).map(|_| shared.next_u64()).collect::<Vec<_>>()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        let got: HashSet<u64> = drawn.into_iter().flatten().collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_stub() {
        let h = seeded(1);
        let v = unsafe { kiln_random(handle::to_handle(&h)) };
        assert_eq!(v, seeded(1).call());
    }
}
