//! An implementation of the MD5 cryptographic hash algorithm.
//!
//! MD5 is broken: practical collisions (this crate's own subject) have been
//! known since 2004, and chosen-prefix attacks are practical too. It is
//! provided here only to hash messages for verification purposes — e.g.
//! confirming that two colliding messages built with [`crate::collision`]
//! do in fact hash identically — never for any integrity or authentication
//! purpose.
//!
//! # Example
//!
//! ```
//! use md5collide::{digest::Digest, md5::Md5};
//!
//! let mut digest = [0u8; 16];
//! let mut context = Md5::new();
//! context.input(b"hello world");
//! context.result(&mut digest);
//! ```

use crate::digest::Digest;
use crate::hashing::md5;

/// Structure representing the state of an MD5 computation
#[derive(Clone)]
pub struct Md5 {
    ctx: md5::Context,
    computed: bool,
}

impl Md5 {
    /// Construct an `Md5` object
    pub const fn new() -> Md5 {
        Md5 {
            ctx: md5::Md5::new(),
            computed: false,
        }
    }
}

impl Default for Md5 {
    fn default() -> Self {
        Self::new()
    }
}

impl Digest for Md5 {
    fn reset(&mut self) {
        self.ctx.reset();
        self.computed = false;
    }
    fn input(&mut self, msg: &[u8]) {
        assert!(!self.computed, "context is already finalized, needs reset");
        self.ctx.update_mut(msg);
    }
    fn result(&mut self, slice: &mut [u8]) {
        assert!(!self.computed, "context is already finalized, needs reset");
        self.computed = true;
        slice.copy_from_slice(&self.ctx.finalize_reset());
    }
    fn output_bits(&self) -> usize {
        md5::Md5::OUTPUT_BITS
    }
    fn block_size(&self) -> usize {
        md5::Md5::BLOCK_BYTES
    }
}

/// Convenience one-shot MD5 of a byte slice, used by the collision engines
/// to verify that a constructed pair of messages actually hashes identically.
pub(crate) fn hash(msg: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    let mut ctx = Md5::new();
    ctx.input(msg);
    ctx.result(&mut out);
    out
}
