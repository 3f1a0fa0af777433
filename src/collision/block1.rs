//! The second-block collision engine.
//!
//! Given the chaining value produced by compressing a first block found by
//! [`crate::collision::collide_block0`], finds a second 64-byte block `B1`
//! such that the block-0 difference is cancelled: the two full two-block
//! messages hash identically under plain MD5.

use alloc::vec::Vec;

use super::badchars::BadChars;
use super::qtable::{select_path, Q10MASK, QCONDS2, Q9M9MASKS, Q9Q10MASKS};
use super::rng::Xorshift64Star;
use super::step::{f1, f2, f3, f4, step_fn, QTrail};

/// Block-1 message difference: `block2[i] = block[i] - delta` (subtractive,
/// the mirror image of block 0's additive `Δ0`).
const DELTA4: u32 = 1u32 << 31;
const DELTA11: u32 = 1u32 << 15;
const DELTA14: u32 = 1u32 << 31;

/// IV difference that block 1 must cancel: the block-0 output difference.
const DELTA_IV: [u32; 4] = [0, 0x8000_0000, 0x8200_0000, 0x8200_0000];

fn set_bit_positions(mask: u32) -> Vec<u32> {
    (0..32).filter(|b| mask & (1 << b) != 0).collect()
}

/// Enumerates, in increasing integer order, `count` subsets of `mask`
/// representable in as many bits, assigning the j-th set bit of `mask` to
/// counter bit `j`.
fn enumerate_tunnel_bits(mask: u32, count: usize) -> Vec<u32> {
    let positions = set_bit_positions(mask);
    (0..count as u32)
        .map(|i| {
            let mut bits = 0u32;
            for (j, &pos) in positions.iter().enumerate() {
                if i & (1 << j) != 0 {
                    bits |= 1 << pos;
                }
            }
            bits
        })
        .collect()
}

/// Runs the block-1 search to completion. `iv` must be the chaining value
/// produced by compressing a block-0 output of [`super::collide_block0`].
/// Like block 0, this never returns without a result; under a saturating
/// `badchars` table it may loop indefinitely.
pub(crate) fn collide_block1(iv: [u32; 4], badchars: &BadChars, rng: &mut Xorshift64Star) -> [u32; 16] {
    let path = select_path(iv);
    let qc = QCONDS2[path];
    let m9mask = Q9M9MASKS[path];
    let m9m10mask = Q9Q10MASKS[path];

    let q9m9bits = enumerate_tunnel_bits(m9mask, 1 << 9);
    let q9q10_positions = set_bit_positions(m9m10mask).len();
    let q9q10bits = enumerate_tunnel_bits(m9m10mask, 1 << q9q10_positions);

    let mut trail = QTrail::new(iv);
    let mut block = [0u32; 16];

    'outer: loop {
        let r = rng.next_u32();
        trail.sample(2, &qc[2], r);
        for i in 3..=16i32 {
            let r = rng.next_u32();
            trail.sample(i, &qc[i as usize], r);
        }

        block[5] = trail.unstep(5, 0x4787c62a, 12);
        if badchars.rejects(block[5]) {
            continue 'outer;
        }
        block[6] = trail.unstep(6, 0xa8304613, 17);
        if badchars.rejects(block[6]) {
            continue 'outer;
        }
        block[7] = trail.unstep(7, 0xfd469501, 22);
        if badchars.rejects(block[7]) {
            continue 'outer;
        }
        block[11] = trail.unstep(11, 0x895cd7be, 22);
        if badchars.rejects(block[11]) || badchars.rejects(block[11].wrapping_sub(DELTA11)) {
            continue 'outer;
        }
        block[14] = trail.unstep(14, 0xa679438e, 17);
        if badchars.rejects(block[14]) || badchars.rejects(block[14].wrapping_sub(DELTA14)) {
            continue 'outer;
        }
        block[15] = trail.unstep(15, 0x49b40821, 22);
        if badchars.rejects(block[15]) {
            continue 'outer;
        }

        let mut success = false;
        'retry1: for _ in 0..2000 {
            let r = rng.next_u32();
            trail.sample(1, &qc[1], r);

            block[0] = trail.unstep(0, 0xd76aa478, 7);
            if badchars.rejects(block[0]) {
                continue 'retry1;
            }
            block[1] = trail.unstep(1, 0xe8c7b756, 12);
            if badchars.rejects(block[1]) {
                continue 'retry1;
            }
            block[3] = trail.unstep(3, 0xc1bdceee, 22);
            if badchars.rejects(block[3]) {
                continue 'retry1;
            }
            block[4] = trail.unstep(4, 0xf57c0faf, 7);
            if badchars.rejects(block[4]) || badchars.rejects(block[4].wrapping_sub(DELTA4)) {
                continue 'retry1;
            }

            trail.set(17, trail.step(16, f2, block[1].wrapping_add(0xf61e2562), 5));
            if trail.condition_violated(17, &qc[17]) {
                continue 'retry1;
            }
            trail.set(18, trail.step(17, f2, block[6].wrapping_add(0xc040b340), 9));
            if trail.condition_violated(18, &qc[18]) {
                continue 'retry1;
            }
            trail.set(19, trail.step(18, f2, block[11].wrapping_add(0x265e5a51), 14));
            if trail.condition_violated(19, &qc[19]) {
                continue 'retry1;
            }
            trail.set(20, trail.step(19, f2, block[0].wrapping_add(0xe9b6c7aa), 20));
            if trail.condition_violated(20, &qc[20]) {
                continue 'retry1;
            }
            trail.set(21, trail.step(20, f2, block[5].wrapping_add(0xd62f105d), 5));
            if trail.condition_violated(21, &qc[21]) {
                continue 'retry1;
            }

            block[2] = trail.unstep(2, 0x242070db, 17);
            if badchars.rejects(block[2]) {
                continue 'retry1;
            }
            success = true;
            break;
        }
        if !success {
            continue 'outer;
        }

        let q9base = trail.get(9);
        let q10base = trail.get(10);

        'tunnel_a: for q10ctr in 0..q9q10bits.len() {
            let bits = q9q10bits[q10ctr];
            let q9save = q9base | (bits & !Q10MASK);
            trail.set(9, q9save);
            trail.set(10, q10base | (bits & Q10MASK));

            block[10] = trail.unstep(10, 0xffff5bb1, 17);
            if badchars.rejects(block[10]) {
                continue 'tunnel_a;
            }

            let a2 = trail.get(21);
            let b2 = trail.get(20);
            let c2 = trail.get(19);
            let mut d2 = trail.get(18);
            d2 = step_fn(f2, d2, a2, b2, c2, block[10].wrapping_add(0x02441453), 9); // 22
            if (d2 & 0x8000_0000) != (qc[22].inv & 0x8000_0000) {
                continue 'tunnel_a;
            }

            let mut c2 = c2.wrapping_add(f2(d2, a2, b2)).wrapping_add(block[15]).wrapping_add(0xd8a1e681);
            if c2 & (1 << 17) == 0 {
                continue 'tunnel_a;
            }
            c2 = c2.rotate_left(14).wrapping_add(d2);
            if (c2 & 0x8000_0000) != (qc[23].inv & 0x8000_0000) {
                continue 'tunnel_a;
            }

            let mut b2 = b2;
            b2 = step_fn(f2, b2, c2, d2, a2, block[4].wrapping_add(0xe7d3fbc8), 20); // 24
            if b2 & 0x8000_0000 == 0 {
                continue 'tunnel_a;
            }

            block[13] = trail.unstep(13, 0xfd987193, 12);
            if badchars.rejects(block[13]) {
                continue 'tunnel_a;
            }

            'tunnel_b: for q9ctr in 0..q9m9bits.len() {
                trail.set(9, q9save | q9m9bits[q9ctr]);

                block[8] = trail.unstep(8, 0x698098d8, 7);
                if badchars.rejects(block[8]) {
                    continue 'tunnel_b;
                }
                block[9] = trail.unstep(9, 0x8b44f7af, 12);
                if badchars.rejects(block[9]) {
                    continue 'tunnel_b;
                }
                block[12] = trail.unstep(12, 0x6b901122, 7);
                if badchars.rejects(block[12]) {
                    continue 'tunnel_b;
                }

                let mut a = a2;
                let mut b = b2;
                let mut c = c2;
                let mut d = d2;

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

                let mut t35 = c.wrapping_add(f3(d, a, b)).wrapping_add(block[11]).wrapping_add(0x6d9d6122);
                if t35 & (1 << 15) == 0 {
                    continue 'tunnel_b;
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
                    continue 'tunnel_b;
                }

                a = step_fn(f4, a, b, c, d, block[0].wrapping_add(0xf4292244), 6); // 49
                if (a ^ c) & 0x8000_0000 != 0 {
                    continue 'tunnel_b;
                }
                d = step_fn(f4, d, a, b, c, block[7].wrapping_add(0x432aff97), 10); // 50
                if (d ^ b) & 0x8000_0000 == 0 {
                    continue 'tunnel_b;
                }
                c = step_fn(f4, c, d, a, b, block[14].wrapping_add(0xab9423a7), 15); // 51
                if (a ^ c) & 0x8000_0000 != 0 {
                    continue 'tunnel_b;
                }
                b = step_fn(f4, b, c, d, a, block[5].wrapping_add(0xfc93a039), 21); // 52
                if (d ^ b) & 0x8000_0000 != 0 {
                    continue 'tunnel_b;
                }
                a = step_fn(f4, a, b, c, d, block[12].wrapping_add(0x655b59c3), 6); // 53
                if (a ^ c) & 0x8000_0000 != 0 {
                    continue 'tunnel_b;
                }
                d = step_fn(f4, d, a, b, c, block[3].wrapping_add(0x8f0ccc92), 10); // 54
                if (d ^ b) & 0x8000_0000 != 0 {
                    continue 'tunnel_b;
                }
                c = step_fn(f4, c, d, a, b, block[10].wrapping_add(0xffeff47d), 15); // 55
                if (a ^ c) & 0x8000_0000 != 0 {
                    continue 'tunnel_b;
                }
                b = step_fn(f4, b, c, d, a, block[1].wrapping_add(0x85845dd1), 21); // 56
                if (d ^ b) & 0x8000_0000 != 0 {
                    continue 'tunnel_b;
                }
                a = step_fn(f4, a, b, c, d, block[8].wrapping_add(0x6fa87e4f), 6); // 57
                if (a ^ c) & 0x8000_0000 != 0 {
                    continue 'tunnel_b;
                }
                d = step_fn(f4, d, a, b, c, block[15].wrapping_add(0xfe2ce6e0), 10); // 58
                if (d ^ b) & 0x8000_0000 != 0 {
                    continue 'tunnel_b;
                }
                c = step_fn(f4, c, d, a, b, block[6].wrapping_add(0xa3014314), 15); // 59
                if (a ^ c) & 0x8000_0000 != 0 {
                    continue 'tunnel_b;
                }
                b = step_fn(f4, b, c, d, a, block[13].wrapping_add(0x4e0811a1), 21); // 60
                if (d ^ b) & 0x8000_0000 == 0 {
                    continue 'tunnel_b;
                }
                a = step_fn(f4, a, b, c, d, block[4].wrapping_add(0xf7537e82), 6); // 61
                if (a ^ c) & 0x8000_0000 != 0 {
                    continue 'tunnel_b;
                }
                d = step_fn(f4, d, a, b, c, block[11].wrapping_add(0xbd3af235), 10); // 62
                if (d ^ b) & 0x8000_0000 != 0 {
                    continue 'tunnel_b;
                }
                c = step_fn(f4, c, d, a, b, block[2].wrapping_add(0x2ad7d2bb), 15); // 63
                if (a ^ c) & 0x8000_0000 != 0 {
                    continue 'tunnel_b;
                }
                b = step_fn(f4, b, c, d, a, block[9].wrapping_add(0xeb86d391), 21); // 64

                let mut block2 = block;
                block2[4] = block2[4].wrapping_sub(DELTA4);
                block2[11] = block2[11].wrapping_sub(DELTA11);
                block2[14] = block2[14].wrapping_sub(DELTA14);

                let iv2 = [
                    iv[0].wrapping_add(DELTA_IV[0]),
                    iv[1].wrapping_add(DELTA_IV[1]),
                    iv[2].wrapping_add(DELTA_IV[2]),
                    iv[3].wrapping_add(DELTA_IV[3]),
                ];

                let out1 = crate::hashing::md5::compress_words(iv, &block);
                let out2 = crate::hashing::md5::compress_words(iv2, &block2);
                debug_assert_eq!(
                    [iv[0].wrapping_add(a), iv[1].wrapping_add(b), iv[2].wrapping_add(c), iv[3].wrapping_add(d)],
                    out1,
                    "locally derived registers disagree with the compression function"
                );
                if out1 == out2 {
                    return block;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::block0::collide_block0;
    use crate::hashing::md5::compress_words;

    const STD_IV: [u32; 4] = [0x6745_2301, 0xefcd_ab89, 0x98ba_dcfe, 0x1032_5476];

    #[test]
    fn cancels_the_block0_difference_end_to_end() {
        let mut rng0 = Xorshift64Star::seeded(0x1111_2222_3333_4444);
        let block0 = collide_block0(STD_IV, &BadChars::none(), &mut rng0);
        let iv1 = compress_words(STD_IV, &block0);

        let mut rng1 = Xorshift64Star::seeded(0x5555_6666_7777_8888);
        let block1 = collide_block1(iv1, &BadChars::none(), &mut rng1);

        let mut block0_alt = block0;
        block0_alt[4] = block0_alt[4].wrapping_add(1 << 31);
        block0_alt[11] = block0_alt[11].wrapping_add(1 << 15);
        block0_alt[14] = block0_alt[14].wrapping_add(1 << 31);

        let mut block1_alt = block1;
        block1_alt[4] = block1_alt[4].wrapping_sub(1 << 31);
        block1_alt[11] = block1_alt[11].wrapping_sub(1 << 15);
        block1_alt[14] = block1_alt[14].wrapping_sub(1 << 31);

        assert_ne!((block0, block1), (block0_alt, block1_alt));

        let hash_a = crate::md5::hash(&full_message(&block0, &block1));
        let hash_b = crate::md5::hash(&full_message(&block0_alt, &block1_alt));
        assert_eq!(hash_a, hash_b);
    }

    fn full_message(b0: &[u32; 16], b1: &[u32; 16]) -> Vec<u8> {
        let mut out = Vec::with_capacity(128);
        for w in b0.iter().chain(b1.iter()) {
            out.extend_from_slice(&w.to_le_bytes());
        }
        out
    }

    #[test]
    fn each_of_the_four_paths_is_reachable() {
        for b5 in [0u32, 1] {
            for b6 in [0u32, 1] {
                let mut iv = STD_IV;
                iv[1] = (iv[1] & !0x41) | b5 | (b6 << 6);
                let expected = b5 | (b6 << 1);
                assert_eq!(select_path(iv), expected as usize);
            }
        }
    }
}
