//! The xorshift64* generator driving both collision engines.
//!
//! No statistical quality claim is made beyond "good enough to avoid
//! adversarial degeneracies in the search" — this is not a CSPRNG and must
//! never be used for anything but picking candidate register trails.

const MULTIPLIER: u64 = 0x2545_F491_4F6C_DD1D;

pub(crate) struct Xorshift64Star {
    state: u64,
}

impl Xorshift64Star {
    /// One xorshift64* transition: mixes `state` and returns the scrambled
    /// output, without the final multiply, alongside the full output.
    #[inline]
    fn transition(state: u64) -> (u64, u64) {
        let mut x = state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        let out = x.wrapping_mul(MULTIPLIER);
        (x, out)
    }

    #[inline]
    pub(crate) fn next_u64(&mut self) -> u64 {
        let (x, out) = Self::transition(self.state);
        self.state = x;
        out
    }

    #[inline]
    pub(crate) fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    /// Seeds from an arbitrary 64-bit value. The reference implementation
    /// seeds `state` directly from `time ^ const` and then overwrites it
    /// with the *output* (not just the mixed internal state) of one
    /// xorshift64* call before the first real draw; that quirk is preserved
    /// here bit-for-bit since later draws depend on it.
    pub(crate) fn seeded(seed: u64) -> Self {
        let mut rng = Self { state: seed };
        rng.state = rng.next_u64();
        rng
    }
}

#[cfg(feature = "std")]
pub(crate) fn wall_clock_seed(constant: u64) -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    secs ^ constant
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_deterministic_given_a_seed() {
        let mut a = Xorshift64Star::seeded(0x1234_5678_9abc_def0);
        let mut b = Xorshift64Star::seeded(0x1234_5678_9abc_def0);
        for _ in 0..64 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn does_not_immediately_repeat() {
        let mut rng = Xorshift64Star::seeded(1);
        let first = rng.next_u64();
        let second = rng.next_u64();
        assert_ne!(first, second);
    }
}
