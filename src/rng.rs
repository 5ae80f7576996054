use serde::{Deserialize, Serialize};
use std::sync::{Mutex, OnceLock};

/// Deterministic generator used by the seeded and system variants.
///
/// splitmix64: a single 64-bit counter state with an avalanche output mix.
/// For any seed, two instances produce bit-identical sequences, which is the
/// property the replay/trace tooling depends on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SeededRng {
    seed: u64,
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> SeededRng {
        SeededRng { seed, state: seed }
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.state = seed;
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        // 53 high bits make an f64 in [0, 1)
        (z >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Test double: cycles a fixed script of `[0, 1)` values forever.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScriptedRng {
    values: Vec<f64>,
    cursor: usize,
    calls: u64,
}

impl ScriptedRng {
    /// # Panics
    ///
    /// Panics if `values` is empty; a script with nothing to cycle cannot
    /// satisfy `next_f64`.
    pub fn new(values: Vec<f64>) -> ScriptedRng {
        assert!(!values.is_empty(), "scripted rng needs at least one value");
        ScriptedRng {
            values,
            cursor: 0,
            calls: 0,
        }
    }

    pub fn next_f64(&mut self) -> f64 {
        let value = self.values[self.cursor];
        self.cursor = (self.cursor + 1) % self.values.len();
        self.calls += 1;
        value
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.calls = 0;
    }

    pub fn call_count(&self) -> u64 {
        self.calls
    }
}

/// The engine's uniform `[0, 1)` source. A closed set of three variants;
/// consumers match on capability through the methods here rather than via
/// dynamic dispatch.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", tag = "variant")]
pub enum RandomSource {
    System(SeededRng),
    Seeded(SeededRng),
    Scripted(ScriptedRng),
}

impl RandomSource {
    /// Nondeterministic variant, seeded once from OS entropy.
    pub fn system() -> RandomSource {
        RandomSource::System(SeededRng::new(entropy_seed()))
    }

    pub fn seeded(seed: u64) -> RandomSource {
        RandomSource::Seeded(SeededRng::new(seed))
    }

    pub fn scripted(values: Vec<f64>) -> RandomSource {
        RandomSource::Scripted(ScriptedRng::new(values))
    }

    pub fn next_f64(&mut self) -> f64 {
        match self {
            RandomSource::System(rng) | RandomSource::Seeded(rng) => rng.next_f64(),
            RandomSource::Scripted(rng) => rng.next_f64(),
        }
    }

    /// Uniform integer in `[lo, hi)`. Returns `lo` when the range is empty.
    pub fn random_int(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo) as f64;
        lo + (self.next_f64() * span).floor() as i64
    }

    /// Uniform integer in `[lo, hi]`.
    pub fn random_int_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        self.random_int(lo, hi.saturating_add(1))
    }

    /// The seed this source replays from, when it has one.
    pub fn seed(&self) -> Option<u64> {
        match self {
            RandomSource::Seeded(rng) => Some(rng.seed()),
            RandomSource::System(_) | RandomSource::Scripted(_) => None,
        }
    }
}

impl Default for RandomSource {
    fn default() -> RandomSource {
        RandomSource::system()
    }
}

fn entropy_seed() -> u64 {
    let mut buf = [0; 8];
    getrandom::getrandom(&mut buf).expect("failed to get random seed");
    u64::from_le_bytes(buf)
}

fn default_provider() -> &'static Mutex<RandomSource> {
    static DEFAULT: OnceLock<Mutex<RandomSource>> = OnceLock::new();
    DEFAULT.get_or_init(|| Mutex::new(RandomSource::system()))
}

/// Install a process-wide default provider for call sites that do not thread
/// an explicit source.
pub fn install_default(source: RandomSource) {
    *lock_default() = source;
}

/// Reset the process-wide default back to the system variant.
pub fn reset_default() {
    *lock_default() = RandomSource::system();
}

/// Run `op` against the process-wide default provider.
pub fn with_default<T>(op: impl FnOnce(&mut RandomSource) -> T) -> T {
    op(&mut lock_default())
}

fn lock_default() -> std::sync::MutexGuard<'static, RandomSource> {
    default_provider()
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::{with_default, RandomSource, ScriptedRng, SeededRng};

    #[test]
    fn seeded_sequences_are_bit_identical() {
        let mut a = SeededRng::new(0xdead_beef);
        let mut b = SeededRng::new(0xdead_beef);
        for _ in 0..256 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn set_seed_restarts_the_sequence() {
        let mut rng = SeededRng::new(7);
        let first: Vec<f64> = (0..8).map(|_| rng.next_f64()).collect();
        rng.set_seed(7);
        let second: Vec<f64> = (0..8).map(|_| rng.next_f64()).collect();
        assert_eq!(first, second);
        assert_eq!(rng.seed(), 7);
    }

    #[test]
    fn seeded_outputs_stay_in_unit_interval() {
        let mut rng = SeededRng::new(99);
        for _ in 0..10_000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn seeded_is_roughly_uniform() {
        let mut rng = SeededRng::new(424_242);
        let mut buckets = [0u32; 10];
        for _ in 0..10_000 {
            buckets[(rng.next_f64() * 10.0) as usize] += 1;
        }
        // 10 buckets over 10k draws: each within ±20% of 1000.
        for count in buckets {
            assert!((800..=1200).contains(&count), "bucket count {count}");
        }
    }

    #[test]
    fn scripted_cycles_and_counts() {
        let mut rng = ScriptedRng::new(vec![0.1, 0.5, 0.9]);
        let drawn: Vec<f64> = (0..7).map(|_| rng.next_f64()).collect();
        assert_eq!(drawn, vec![0.1, 0.5, 0.9, 0.1, 0.5, 0.9, 0.1]);
        assert_eq!(rng.call_count(), 7);
        rng.reset();
        assert_eq!(rng.call_count(), 0);
        assert_eq!(rng.next_f64(), 0.1);
    }

    #[test]
    #[should_panic(expected = "at least one value")]
    fn scripted_rejects_empty_script() {
        let _ = ScriptedRng::new(Vec::new());
    }

    #[test]
    fn random_int_covers_half_open_range() {
        let mut rng = RandomSource::seeded(3);
        for _ in 0..1_000 {
            let n = rng.random_int(2, 5);
            assert!((2..5).contains(&n));
        }
        assert_eq!(rng.random_int(4, 4), 4);
    }

    #[test]
    fn random_int_inclusive_reaches_the_upper_bound() {
        let mut rng = RandomSource::seeded(11);
        let mut saw_hi = false;
        for _ in 0..1_000 {
            let n = rng.random_int_inclusive(0, 3);
            assert!((0..=3).contains(&n));
            saw_hi |= n == 3;
        }
        assert!(saw_hi);
    }

    #[test]
    fn seed_is_reported_only_for_the_seeded_variant() {
        assert_eq!(RandomSource::seeded(5).seed(), Some(5));
        assert_eq!(RandomSource::system().seed(), None);
        assert_eq!(RandomSource::scripted(vec![0.5]).seed(), None);
    }

    #[test]
    fn default_provider_installs_and_resets() {
        super::install_default(RandomSource::scripted(vec![0.25]));
        let x = with_default(RandomSource::next_f64);
        assert_eq!(x, 0.25);
        super::reset_default();
        let reset_is_system = with_default(|rng| matches!(rng, RandomSource::System(_)));
        assert!(reset_is_system);
    }
}
