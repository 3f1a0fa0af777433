//! The Stevens fast identical-prefix MD5 collision search.
//!
//! [`collide_block0`] finds a first block that perturbs a chaining value by
//! a fixed difference; [`collide_block1`], run against the IV that results
//! from compressing that block, finds a second block that cancels it. Run
//! in sequence, the two accepted blocks and their Δ-paired siblings give two
//! distinct 128-byte messages with an identical MD5 hash. See the crate
//! documentation for the end-to-end shape.

mod badchars;
mod block0;
mod block1;
mod qtable;
mod rng;
mod step;

pub use badchars::BadChars;

use rng::Xorshift64Star;

/// Seed constant mixed into block 0's PRNG state.
const BLOCK0_SEED_CONST: u64 = 0xFEED_FACE;
/// Seed constant mixed into block 1's PRNG state.
const BLOCK1_SEED_CONST: u64 = 0xDEAD_F00D;

/// Finds a first block `B0` such that compressing `iv ∥ B0` and
/// `iv ∥ (B0 ⊕ Δ0)` lands on chaining values differing by the fixed
/// block-0 output difference. Blocking, with no timeout; under a
/// saturating `badchars` table this may never return.
///
/// Seeds its PRNG from the wall clock, so two calls will essentially never
/// search the same trail twice. For deterministic, reproducible search
/// (tests, fuzzing harnesses) use [`collide_block0_seeded`].
#[cfg(feature = "std")]
pub fn collide_block0(iv: [u32; 4], badchars: Option<&BadChars>) -> [u32; 16] {
    let seed = rng::wall_clock_seed(BLOCK0_SEED_CONST);
    collide_block0_seeded(iv, badchars, seed)
}

/// As [`collide_block0`], but seeded explicitly rather than from the wall
/// clock; available without the `std` feature.
pub fn collide_block0_seeded(iv: [u32; 4], badchars: Option<&BadChars>, seed: u64) -> [u32; 16] {
    let none = BadChars::none();
    let badchars = badchars.unwrap_or(&none);
    let mut rng = Xorshift64Star::seeded(seed);
    block0::collide_block0(iv, badchars, &mut rng)
}

/// Finds a second block `B1` such that, given `iv` produced by compressing
/// a [`collide_block0`] output, `MD5Compress(iv + Δ_IV, B1 ⊕ Δ1) ==
/// MD5Compress(iv, B1)`: the block-0 difference is cancelled and the two
/// resulting two-block messages hash identically.
///
/// Blocking, with no timeout; under a saturating `badchars` table this may
/// never return.
#[cfg(feature = "std")]
pub fn collide_block1(iv: [u32; 4], badchars: Option<&BadChars>) -> [u32; 16] {
    let seed = rng::wall_clock_seed(BLOCK1_SEED_CONST);
    collide_block1_seeded(iv, badchars, seed)
}

/// As [`collide_block1`], but seeded explicitly; available without `std`.
pub fn collide_block1_seeded(iv: [u32; 4], badchars: Option<&BadChars>, seed: u64) -> [u32; 16] {
    let none = BadChars::none();
    let badchars = badchars.unwrap_or(&none);
    let mut rng = Xorshift64Star::seeded(seed);
    block1::collide_block1(iv, badchars, &mut rng)
}

/// The fixed message difference applied to the second of a block-0 pair:
/// `block2[i] = block[i] + delta`, word-indexed.
pub const BLOCK0_DELTA: [(usize, u32); 3] = [(4, 1 << 31), (11, 1 << 15), (14, 1 << 31)];

/// The fixed message difference applied to the second of a block-1 pair:
/// `block2[i] = block[i] - delta`, word-indexed (subtractive, the mirror of
/// [`BLOCK0_DELTA`]).
pub const BLOCK1_DELTA: [(usize, u32); 3] = [(4, 1 << 31), (11, 1 << 15), (14, 1 << 31)];

/// Checks the IV precondition block 0 requires for a block-1 path to exist:
/// `((IV[2]>>25)&1) != ((IV[2]>>24)&1)` and `((IV[3]>>25)&1) ==
/// ((IV[3]>>24)&1)`. Callers seeding their own IVs should resample until
/// this holds rather than invoking [`collide_block0`] on an IV that can
/// never reach an IV from which any block-1 path is feasible.
pub fn iv_precondition_holds(iv: [u32; 4]) -> bool {
    let c_high = (iv[2] >> 25) & 1;
    let c_low = (iv[2] >> 24) & 1;
    let d_high = (iv[3] >> 25) & 1;
    let d_low = (iv[3] >> 24) & 1;
    c_high != c_low && d_high == d_low
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_md5_iv_satisfies_the_precondition() {
        let iv = [0x6745_2301, 0xefcd_ab89, 0x98ba_dcfe, 0x1032_5476];
        assert!(iv_precondition_holds(iv));
    }

    #[test]
    fn flags_an_iv_with_no_feasible_block1_path() {
        // c's bits 24/25 equal (violates the first clause)
        let iv = [0, 0, 0x0000_0000, 0x1032_5476];
        assert!(!iv_precondition_holds(iv));
    }
}
