//! Random string generation for ID fragments and signing-key names.

use rand::{rngs::StdRng, Rng, SeedableRng};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of generated ID fragments and key-name suffixes.
pub const FRAGMENT_LEN: usize = 10;

/// A pluggable random-string generator. Non-cryptographic: generated fragments only need to be
/// unique within one document, and collisions are caught by the duplicate-ID checks. Tests
/// substitute a deterministic stub.
pub type Generator = fn() -> String;

/// Random base-36 string generator.
#[must_use]
pub fn rand_base36(n: usize) -> String {
    let mut rng = StdRng::from_entropy();
    (0..n).map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char).collect()
}

/// Default fragment generator.
#[must_use]
pub fn rand_fragment() -> String {
    rand_base36(FRAGMENT_LEN)
}
