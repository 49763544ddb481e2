//! Explicitly seeded shuffle for the seed-pool fallback.
//!
//! The same `(member, day, locale)` key yields the same order on every deployment;
//! no platform RNG is involved.

const LCG_MULTIPLIER: u32 = 1_664_525;
const LCG_INCREMENT: u32 = 1_013_904_223;
const LCG_MODULUS: f64 = 4_294_967_296.0;

/// 31-multiplier string hash over UTF-16 code units, as a 32-bit signed accumulator.
pub fn string_hash(input: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in input.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32);
    }
    hash.unsigned_abs()
}

/// Linear-congruential generator (Numerical Recipes constants, modulus 2^32).
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn from_key(key: &str) -> Self {
        Self::new(string_hash(key))
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state as f64 / LCG_MODULUS
    }
}

pub fn shuffle_key(member_id: &str, day_index: i32, locale: &str) -> String {
    format!("{member_id}:{day_index}:{locale}")
}

/// Fisher–Yates from the back, drawing indices from the keyed LCG.
pub fn seeded_shuffle<T>(items: &mut [T], key: &str) {
    let mut rng = Lcg::from_key(key);
    for i in (1..items.len()).rev() {
        let j = (rng.next_f64() * (i + 1) as f64).floor() as usize;
        items.swap(i, j.min(i));
    }
}
