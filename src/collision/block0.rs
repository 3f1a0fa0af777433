//! The first-block collision engine.
//!
//! Finds a 64-byte block `B0` such that, compressed on top of a caller's IV,
//! it and `B0 ⊕ Δ0` land on chaining values differing by the fixed block-0
//! output difference. See the module-level documentation in
//! [`crate::collision`] for the two-block picture this fits into.

use super::badchars::BadChars;
use super::qtable::QCONDS;
use super::rng::Xorshift64Star;
use super::step::{f1, f2, f3, f4, step_fn, QTrail};

/// Block-0 message difference: `block2[i] = block[i] + delta`.
const DELTA4: u32 = 1u32 << 31;
const DELTA11: u32 = 1u32 << 15;
const DELTA14: u32 = 1u32 << 31;

/// Runs the block-0 search to completion, sampling from `rng` and rejecting
/// any candidate word that fails `badchars`. Never returns without a result:
/// under a saturating `badchars` table this may loop indefinitely, which is
/// documented behavior rather than a bug.
pub(crate) fn collide_block0(iv: [u32; 4], badchars: &BadChars, rng: &mut Xorshift64Star) -> [u32; 16] {
    let mut trail = QTrail::new(iv);
    let mut block = [0u32; 16];

    'outer: loop {
        for i in 1..=16i32 {
            let r = rng.next_u32();
            trail.sample(i, &QCONDS[i as usize], r);
        }

        block[0] = trail.unstep(0, 0xd76aa478, 7);
        if badchars.rejects(block[0]) {
            continue 'outer;
        }
        block[6] = trail.unstep(6, 0xa8304613, 17);
        if badchars.rejects(block[6]) {
            continue 'outer;
        }
        block[11] = trail.unstep(11, 0x895cd7be, 22);
        if badchars.rejects_pair(block[11], DELTA11) {
            continue 'outer;
        }
        block[14] = trail.unstep(14, 0xa679438e, 17);
        if badchars.rejects_pair(block[14], DELTA14) {
            continue 'outer;
        }
        block[15] = trail.unstep(15, 0x49b40821, 22);
        if badchars.rejects(block[15]) {
            continue 'outer;
        }

        let mut success = false;
        'retry17: for _ in 0..100 {
            let r = rng.next_u32();
            let q17 = ((r & 0x3ffd7ff7) | (trail.get(16) & 0x40008008)) ^ 0xc0000000;
            trail.set(17, q17);

            trail.set(18, trail.step(17, f2, 0xc040b340, 9));
            if trail.condition_violated(18, &QCONDS[18]) {
                continue 'retry17;
            }

            trail.set(19, trail.step(18, f2, 0x265e5a51, 14));
            if trail.condition_violated(19, &QCONDS[19]) {
                continue 'retry17;
            }

            trail.set(20, trail.step(19, f2, 0xe9b6c7aa, 20));
            if trail.condition_violated(20, &QCONDS[20]) {
                continue 'retry17;
            }

            block[1] = trail.unstep2(16, 0xf61e2562, 5);
            // Q[2] was only a random placeholder in the trail-1..16 sampling
            // pass (its condition row is unconstrained); now that block[1]
            // is known, recompute the real Q[2] from the round-1 equation.
            trail.set(2, trail.step(1, f1, block[1].wrapping_add(0xe8c7b756), 12));
            if badchars.rejects(block[1]) {
                continue 'retry17;
            }

            block[5] = trail.unstep(5, 0x4787c62a, 12);
            trail.set(21, trail.step(20, f2, block[5].wrapping_add(0xd62f105d), 5));
            if trail.condition_violated(21, &QCONDS[21]) {
                continue 'retry17;
            }
            if badchars.rejects(block[5]) {
                continue 'retry17;
            }

            block[2] = trail.unstep(2, 0x242070db, 17);
            if badchars.rejects(block[2]) {
                continue 'retry17;
            }
            success = true;
            break;
        }
        if !success {
            continue 'outer;
        }

        'tunnel1: for q10ctr in 0u32..8 {
            trail.set(9, (trail.get(9) & !0x0000_2000) | ((q10ctr << 13) & 0x0000_2000));
            trail.set(10, (trail.get(10) & !0x0000_0060) | ((q10ctr << 4) & 0x0000_0060));

            block[10] = trail.unstep(10, 0xffff5bb1, 17);
            if badchars.rejects(block[10]) {
                continue 'tunnel1;
            }
            block[13] = trail.unstep(13, 0xfd987193, 12);
            if badchars.rejects(block[13]) {
                continue 'tunnel1;
            }

            trail.set(22, trail.step(21, f2, block[10].wrapping_add(0x02441453), 9));
            if trail.get(22) & 0x8000_0000 == 0 {
                continue 'tunnel1;
            }

            trail.set(23, trail.step(22, f2, block[15].wrapping_add(0xd8a1e681), 14));
            if trail.get(23) & 0x8000_0000 != 0 {
                continue 'tunnel1;
            }
            let t = trail
                .get(19)
                .wrapping_add(f2(trail.get(22), trail.get(21), trail.get(20)))
                .wrapping_add(block[15])
                .wrapping_add(0xd8a1e681);
            if t & (1 << 17) != 0 {
                continue 'tunnel1;
            }

            // Precomputed once per Q[9,10] tunnel setting: the parts of
            // block[8], block[9] and block[12] that don't depend on the
            // 16-bit Q[9] tunnel counter, and the base value of Q[9] with
            // that tunnel's free bits cleared.
            let part8 = f1(trail.get(8), trail.get(7), trail.get(6))
                .wrapping_add(0x698098d8)
                .wrapping_add(trail.get(5));
            let part9 = 0x8b44f7afu32.wrapping_add(trail.get(6));
            let part12 = trail
                .get(13)
                .wrapping_sub(trail.get(12))
                .rotate_right(7)
                .wrapping_sub(f1(trail.get(12), trail.get(11), trail.get(10)))
                .wrapping_sub(0x6b901122);
            let q9base = trail.get(9) & !super::qtable::Q9M9MASK_BLOCK0;

            'tunnel2: for q4ctr in 0u32..16 {
                trail.set(
                    4,
                    (trail.get(4) & !0x3800_0004) | (((q4ctr << 2) | (q4ctr << 26)) & 0x3800_0004),
                );

                block[3] = trail.unstep(3, 0xc1bdceee, 22);
                if badchars.rejects(block[3]) {
                    continue 'tunnel2;
                }
                block[4] = trail.unstep(4, 0xf57c0faf, 7);
                if badchars.rejects_pair(block[4], DELTA4) {
                    continue 'tunnel2;
                }
                block[7] = trail.unstep(7, 0xfd469501, 22);
                if badchars.rejects(block[7]) {
                    continue 'tunnel2;
                }

                trail.set(24, trail.step(23, f2, block[4].wrapping_add(0xe7d3fbc8), 20));
                if trail.get(24) & 0x8000_0000 == 0 {
                    continue 'tunnel2;
                }

                'tunnel3: for q9ctr in 0u32..(1 << 16) {
                    trail.set(
                        9,
                        q9base | ((q9ctr ^ (q9ctr << 8) ^ (q9ctr << 14)) & super::qtable::Q9M9MASK_BLOCK0),
                    );

                    block[8] = trail
                        .get(9)
                        .wrapping_sub(trail.get(8))
                        .rotate_right(7)
                        .wrapping_sub(part8);
                    if badchars.rejects(block[8]) {
                        continue 'tunnel3;
                    }

                    block[9] = trail
                        .get(10)
                        .wrapping_sub(trail.get(9))
                        .rotate_right(12)
                        .wrapping_sub(f1(trail.get(9), trail.get(8), trail.get(7)))
                        .wrapping_sub(part9);
                    if badchars.rejects(block[9]) {
                        continue 'tunnel3;
                    }

                    block[12] = part12.wrapping_sub(trail.get(9));
                    if badchars.rejects(block[12]) {
                        continue 'tunnel3;
                    }

                    let mut a = trail.get(21);
                    let mut b = trail.get(24);
                    let mut c = trail.get(23);
                    let mut d = trail.get(22);

                    a = step_fn(f2, a, b, c, d, block[9].wrapping_add(0x21e1cde6), 5); // 25
                    d = step_fn(f2, d, a, b, c, block[14].wrapping_add(0xc33707d6), 9);
                    c = step_fn(f2, c, d, a, b, block[3].wrapping_add(0xf4d50d87), 14);
                    b = step_fn(f2, b, c, d, a, block[8].wrapping_add(0x455a14ed), 20);
                    a = step_fn(f2, a, b, c, d, block[13].wrapping_add(0xa9e3e905), 5);
                    d = step_fn(f2, d, a, b, c, block[2].wrapping_add(0xfcefa3f8), 9);
                    c = step_fn(f2, c, d, a, b, block[7].wrapping_add(0x676f02d9), 14);
                    b = step_fn(f2, b, c, d, a, block[12].wrapping_add(0x8d2a4c8a), 20);

                    a = step_fn(f3, a, b, c, d, block[5].wrapping_add(0xfffa3942), 4); // 33
                    d = step_fn(f3, d, a, b, c, block[8].wrapping_add(0x8771f681), 11); // 34

                    // step 35 by hand: need the pre-rotate carry bit, which
                    // is the block-0/block-1 differential's pivot point.
                    let mut t35 = c.wrapping_add(f3(d, a, b)).wrapping_add(block[11]).wrapping_add(0x6d9d6122);
                    if t35 & (1 << 15) != 0 {
                        continue 'tunnel3;
                    }
                    t35 = t35.rotate_left(16).wrapping_add(d);
                    c = t35;

                    b = step_fn(f3, b, c, d, a, block[14].wrapping_add(0xfde5380c), 23);
                    a = step_fn(f3, a, b, c, d, block[1].wrapping_add(0xa4beea44), 4);
                    d = step_fn(f3, d, a, b, c, block[4].wrapping_add(0x4bdecfa9), 11);
                    c = step_fn(f3, c, d, a, b, block[7].wrapping_add(0xf6bb4b60), 16);
                    b = step_fn(f3, b, c, d, a, block[10].wrapping_add(0xbebfbc70), 23);
                    a = step_fn(f3, a, b, c, d, block[13].wrapping_add(0x289b7ec6), 4);
                    d = step_fn(f3, d, a, b, c, block[0].wrapping_add(0xeaa127fa), 11);
                    c = step_fn(f3, c, d, a, b, block[3].wrapping_add(0xd4ef3085), 16);
                    b = step_fn(f3, b, c, d, a, block[6].wrapping_add(0x04881d05), 23);
                    a = step_fn(f3, a, b, c, d, block[9].wrapping_add(0xd9d4d039), 4);
                    d = step_fn(f3, d, a, b, c, block[12].wrapping_add(0xe6db99e5), 11); // 46
                    c = step_fn(f3, c, d, a, b, block[15].wrapping_add(0x1fa27cf8), 16); // 47
                    b = step_fn(f3, b, c, d, a, block[2].wrapping_add(0xc4ac5665), 23); // 48
                    if (d ^ b) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }

                    a = step_fn(f4, a, b, c, d, block[0].wrapping_add(0xf4292244), 6); // 49
                    if (a ^ c) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }
                    d = step_fn(f4, d, a, b, c, block[7].wrapping_add(0x432aff97), 10); // 50
                    if (d ^ b) & 0x8000_0000 == 0 {
                        continue 'tunnel3;
                    }
                    c = step_fn(f4, c, d, a, b, block[14].wrapping_add(0xab9423a7), 15); // 51
                    if (a ^ c) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }
                    b = step_fn(f4, b, c, d, a, block[5].wrapping_add(0xfc93a039), 21); // 52
                    if (d ^ b) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }
                    a = step_fn(f4, a, b, c, d, block[12].wrapping_add(0x655b59c3), 6); // 53
                    if (a ^ c) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }
                    d = step_fn(f4, d, a, b, c, block[3].wrapping_add(0x8f0ccc92), 10); // 54
                    if (d ^ b) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }
                    c = step_fn(f4, c, d, a, b, block[10].wrapping_add(0xffeff47d), 15); // 55
                    if (a ^ c) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }
                    b = step_fn(f4, b, c, d, a, block[1].wrapping_add(0x85845dd1), 21); // 56
                    if (d ^ b) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }
                    a = step_fn(f4, a, b, c, d, block[8].wrapping_add(0x6fa87e4f), 6); // 57
                    if (a ^ c) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }
                    d = step_fn(f4, d, a, b, c, block[15].wrapping_add(0xfe2ce6e0), 10); // 58
                    if (d ^ b) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }
                    c = step_fn(f4, c, d, a, b, block[6].wrapping_add(0xa3014314), 15); // 59
                    if (a ^ c) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }
                    b = step_fn(f4, b, c, d, a, block[13].wrapping_add(0x4e0811a1), 21); // 60
                    if (d ^ b) & 0x8000_0000 == 0 {
                        continue 'tunnel3;
                    }
                    a = step_fn(f4, a, b, c, d, block[4].wrapping_add(0xf7537e82), 6); // 61
                    if (a ^ c) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }
                    d = step_fn(f4, d, a, b, c, block[11].wrapping_add(0xbd3af235), 10); // 62
                    if (d ^ b) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }
                    c = step_fn(f4, c, d, a, b, block[2].wrapping_add(0x2ad7d2bb), 15); // 63
                    if (a ^ c) & 0x8000_0000 != 0 {
                        continue 'tunnel3;
                    }
                    b = step_fn(f4, b, c, d, a, block[9].wrapping_add(0xeb86d391), 21); // 64

                    let new_b = iv[1].wrapping_add(b);
                    let new_c = iv[2].wrapping_add(c);
                    let new_d = iv[3].wrapping_add(d);
                    if new_b & 0x0200_0000 != 0
                        || (new_c ^ new_b) & 0x8200_0000 != 0
                        || (new_d ^ new_c) & 0x8200_0000 != 0
                        || (new_c ^ new_b) & 1 != 0
                    {
                        continue 'tunnel3;
                    }

                    let mut block2 = block;
                    block2[4] = block2[4].wrapping_add(DELTA4);
                    block2[11] = block2[11].wrapping_add(DELTA11);
                    block2[14] = block2[14].wrapping_add(DELTA14);

                    let iv1 = crate::hashing::md5::compress_words(iv, &block);
                    let iv2 = crate::hashing::md5::compress_words(iv, &block2);
                    if iv2[0] == iv1[0].wrapping_add(0x8000_0000)
                        && iv2[1] == iv1[1].wrapping_add(0x8200_0000)
                        && iv2[2] == iv1[2].wrapping_add(0x8200_0000)
                        && iv2[3] == iv1[3].wrapping_add(0x8200_0000)
                    {
                        return block;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::md5::compress_words;

    const STD_IV: [u32; 4] = [0x6745_2301, 0xefcd_ab89, 0x98ba_dcfe, 0x1032_5476];

    #[test]
    fn finds_a_differential_closing_block() {
        let mut rng = Xorshift64Star::seeded(0x0102_0304_0506_0708);
        let block = collide_block0(STD_IV, &BadChars::none(), &mut rng);

        let mut block2 = block;
        block2[4] = block2[4].wrapping_add(DELTA4);
        block2[11] = block2[11].wrapping_add(DELTA11);
        block2[14] = block2[14].wrapping_add(DELTA14);

        let iv1 = compress_words(STD_IV, &block);
        let iv2 = compress_words(STD_IV, &block2);
        assert_eq!(iv2[0], iv1[0].wrapping_add(0x8000_0000));
        assert_eq!(iv2[1], iv1[1].wrapping_add(0x8200_0000));
        assert_eq!(iv2[2], iv1[2].wrapping_add(0x8200_0000));
        assert_eq!(iv2[3], iv1[3].wrapping_add(0x8200_0000));
        assert_ne!(block, block2);
    }

    #[test]
    fn respects_a_nontrivial_badchars_table() {
        // A handful of forbidden bytes, deliberately excluding 0x00 and 0x0a
        // (NUL and newline) so the search still terminates promptly.
        let badchars = BadChars::new(&[0xff, 0x7f, 0x80, 0x01]);
        let mut rng = Xorshift64Star::seeded(0x0A0B_0C0D_0E0F_1011);
        let block = collide_block0(STD_IV, &badchars, &mut rng);
        for &w in block.iter() {
            for shift in [0, 8, 16, 24] {
                let byte = (w >> shift) & 0xff;
                assert!(
                    byte != 0xff && byte != 0x7f && byte != 0x80 && byte != 0x01,
                    "byte {byte:#x} should have been rejected"
                );
            }
        }
    }
}
