//! # Multi-Precision Integers
//!
//! Arbitrary-precision signed integers over 64-bit limbs, with the operations
//! public-key cryptography needs: add/sub, schoolbook multiply, long division,
//! shifts and bit access, binary GCD, modular inverse, and modular
//! exponentiation via Montgomery multiplication with a sliding window.
//!
//! Values that may hold key material are zeroised when dropped, and the
//! conditional assign/swap primitives never branch on their flag.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod limb;
pub mod mpi;

mod div;
mod exp;

pub use exp::ExpScratch;
pub use limb::{LIMB_BITS, LIMB_BYTES, Limb};
pub use mpi::Mpi;

/// Errors from bignum operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// An argument is outside the operation's domain (division by zero,
    /// negative modulus, non-invertible element, ...).
    #[error("bad input value")]
    BadInput,
    /// The output buffer cannot hold the value's magnitude.
    #[error("output buffer too small")]
    BufferTooSmall,
}
