// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A pure-rust implementation of the Stevens (2006) fast identical-prefix MD5
//! collision attack, with the second-block differential paths from his 2007
//! MSc thesis.
//!
//! Given a chaining value this crate searches for a pair of 64-byte message
//! blocks that drive `MD5Compress` to the same output while differing in a
//! handful of words, by construction of a nonlinear differential path and a
//! system of per-step bit conditions (`Q`-conditions). Two blocks are needed:
//! the first ([`collision::collide_block0`]) perturbs the chaining value by a
//! fixed difference, and the second ([`collision::collide_block1`]) cancels it,
//! so that the two resulting two-block messages hash identically under plain
//! MD5.
//!
//! ```no_run
//! use md5collide::collision::{self, BadChars};
//! use md5collide::hashing::md5;
//!
//! let iv = [0x6745_2301, 0xefcd_ab89, 0x98ba_dcfe, 0x1032_5476];
//! let block0 = collision::collide_block0(iv, None);
//! let iv1 = md5::compress_words(iv, &block0);
//! let block1 = collision::collide_block1(iv1, None);
//!
//! let _ = BadChars::none();
//! ```
//!
//! This crate does not implement chosen-prefix collisions, does not parse or
//! authenticate any file format, and makes no guarantee about worst-case
//! running time: the search is probabilistic and, under a hostile
//! bad-character table, may never terminate.

#![allow(unknown_lints)]
#![warn(clippy::all)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::new_without_default)]
#![allow(clippy::let_and_return)]
#![allow(clippy::redundant_field_names)]
#![allow(clippy::wrong_self_convention)]
#![allow(clippy::identity_op)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::many_single_char_names)]
#![no_std]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
#[macro_use]
extern crate std;

pub mod collision;
mod cryptoutil;
pub mod digest;
pub mod hashing;
pub mod md5;
