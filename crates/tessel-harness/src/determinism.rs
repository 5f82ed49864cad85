#![forbid(unsafe_code)]

//! Deterministic fixtures for tests, fuzz seeds, and recorded demos.
//!
//! Seed selection and deterministic mode come from the environment so a
//! failing run can be reproduced exactly:
//!
//! - `TESSEL_SEED` / `TESSEL_TEST_SEED`: base seed for gesture generation.
//! - `TESSEL_DETERMINISTIC=1`: stable run ids and logical debug clocks.

/// Shared deterministic fixture for a harness run.
#[derive(Debug, Clone)]
pub struct DeterminismFixture {
    seed: u64,
    deterministic: bool,
    run_id: String,
}

impl DeterminismFixture {
    /// Create a fixture from the environment, falling back to `default_seed`.
    pub fn new(prefix: &str, default_seed: u64) -> Self {
        Self::new_with(prefix, fixture_seed(default_seed), deterministic_mode())
    }

    /// Create a fixture with explicit configuration (used by tests).
    pub fn new_with(prefix: &str, seed: u64, deterministic: bool) -> Self {
        let run_id = if deterministic {
            format!("{prefix}_seed{seed}")
        } else {
            format!("{prefix}_{}_{seed}", std::process::id())
        };
        Self {
            seed,
            deterministic,
            run_id,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn deterministic(&self) -> bool {
        self.deterministic
    }

    /// Stable run identifier for logs.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Fresh generator seeded from this fixture.
    pub fn rng(&self) -> Lcg {
        Lcg::new(self.seed)
    }
}

/// Small linear congruential generator; enough to drive gesture streams
/// reproducibly without pulling in an RNG crate.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state >> 11
    }

    /// Uniform-ish index in `0..len`. `len` must be non-zero.
    pub fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    /// Value in `min..=max`.
    pub fn next_i32_range(&mut self, min: i32, max: i32) -> i32 {
        debug_assert!(min <= max);
        let span = u64::from(max.abs_diff(min)) + 1;
        min.saturating_add((self.next_u64() % span) as i32)
    }

    /// True with probability `percent / 100`.
    pub fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

/// True when deterministic mode is enabled via environment.
pub fn deterministic_mode() -> bool {
    env_flag("TESSEL_TEST_DETERMINISTIC") || env_flag("TESSEL_DETERMINISTIC")
}

/// Choose a seed from environment or use the provided default.
pub fn fixture_seed(default_seed: u64) -> u64 {
    env_u64("TESSEL_TEST_SEED")
        .or_else(|| env_u64("TESSEL_SEED"))
        .unwrap_or(default_seed)
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_flag(key: &str) -> bool {
    matches!(
        std::env::var(key).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE")
    )
}
