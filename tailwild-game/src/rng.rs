//! Random sources used by every resolver.
//!
//! Resolvers are generic over [`RandomSource`], which any `rand::Rng`
//! satisfies. Tests substitute [`ScriptedRng`] to replay exact samples.
use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use sha2::Sha256;
use std::cell::{RefCell, RefMut};
use std::collections::VecDeque;

use crate::bounds::Bounds;

/// Uniform sampling interface consumed by the engine.
pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Uniform integer in `lo..=hi`; returns `lo` when the range is empty.
    fn range(&mut self, lo: u32, hi: u32) -> u32;

    fn roll(&mut self, bounds: Bounds) -> u32 {
        self.range(bounds.min, bounds.max)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.unit() < probability
    }
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn unit(&mut self) -> f64 {
        self.r#gen::<f64>()
    }

    fn range(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            lo
        } else {
            self.gen_range(lo..=hi)
        }
    }
}

/// Replays a fixed list of unit samples, then keeps returning `fallback`.
///
/// Integer draws map a sample `u` onto `lo + floor(u * (hi - lo + 1))`, so
/// `0.0` always selects the low end and `0.999` the high end.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRng {
    samples: VecDeque<f64>,
    fallback: f64,
    draws: u64,
}

impl ScriptedRng {
    #[must_use]
    pub fn new(samples: impl IntoIterator<Item = f64>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            fallback: 0.0,
            draws: 0,
        }
    }

    #[must_use]
    pub const fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl RandomSource for ScriptedRng {
    fn unit(&mut self) -> f64 {
        self.draws = self.draws.saturating_add(1);
        let sample = self.samples.pop_front().unwrap_or(self.fallback);
        sample.clamp(0.0, 1.0 - f64::EPSILON)
    }

    fn range(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        let span = f64::from(hi - lo) + 1.0;
        let offset = crate::numbers::floor_f64_to_u32(self.unit() * span);
        lo.saturating_add(offset).min(hi)
    }
}

/// Weighted pick over `entries`; entries with a zero weight never win.
///
/// Returns `None` when no entry carries positive weight.
pub fn pick_weighted<'a, T, R>(
    entries: &'a [T],
    weight: impl Fn(&T) -> u32,
    rng: &mut R,
) -> Option<&'a T>
where
    R: RandomSource + ?Sized,
{
    let total: u64 = entries.iter().map(|entry| u64::from(weight(entry))).sum();
    if total == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let roll = rng.unit() * total as f64;
    let mut cumulative = 0.0_f64;
    let mut last_positive = None;
    for entry in entries {
        let w = weight(entry);
        if w == 0 {
            continue;
        }
        cumulative += f64::from(w);
        last_positive = Some(entry);
        if roll < cumulative {
            return Some(entry);
        }
    }
    last_positive
}

/// Deterministic bundle of RNG streams segregated by action domain.
#[derive(Debug, Clone)]
pub struct RngBundle {
    journey: RefCell<CountingRng<SmallRng>>,
    harvest: RefCell<CountingRng<SmallRng>>,
    battle: RefCell<CountingRng<SmallRng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            journey: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"journey"))),
            harvest: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"harvest"))),
            battle: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"battle"))),
        }
    }

    /// Access the journey RNG stream.
    #[must_use]
    pub fn journey(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.journey.borrow_mut()
    }

    /// Access the harvest RNG stream.
    #[must_use]
    pub fn harvest(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.harvest.borrow_mut()
    }

    /// Access the battle RNG stream.
    #[must_use]
    pub fn battle(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.battle.borrow_mut()
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    digest
        .get(..8)
        .and_then(|bytes| <[u8; 8]>::try_from(bytes).ok())
        .map_or(user_seed, u64::from_le_bytes)
}
