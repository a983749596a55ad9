//! # Elliptic Curves over Prime Fields
//!
//! Curve group representation and Jacobian point arithmetic for the
//! well-known NIST and Brainpool curves plus Curve25519, with a
//! constant-time comb scalar multiplication (point-randomised), the
//! Montgomery ladder for Curve25519, and the TLS wire encodings for
//! points and named groups.
//!
//! Groups are immutable once constructed: the generator comb table is
//! precomputed eagerly by [`Group::new`], so a `Group` can be shared
//! freely between connections.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod curves;
pub mod group;
pub mod point;

mod codec;
mod mul;

pub use codec::tls_read_group;
pub use curves::CurveId;
pub use group::{CurveKind, Group};
pub use point::Point;

/// Tunable width of the comb method for generator multiples, in bits.
/// Must stay within `[2, 7]`; the table holds `2^(WINDOW_SIZE - 1)` points.
pub const WINDOW_SIZE: usize = 6;

/// Errors from curve operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Arithmetic error from the bignum layer.
    #[error(transparent)]
    Bignum(#[from] bignum::Error),
    /// A point or scalar fails validation for the group.
    #[error("invalid point or key")]
    InvalidKey,
    /// The curve is not in the registry, or the operation does not apply
    /// to this curve type.
    #[error("unknown or unsupported curve")]
    FeatureUnavailable,
    /// A point encoding does not parse.
    #[error("malformed point encoding")]
    BadInput,
    /// Output buffer cannot hold the encoding.
    #[error("output buffer too small")]
    BufferTooSmall,
    /// The RNG kept producing out-of-range values.
    #[error("randomness failed to produce a usable value")]
    RandomFailed,
}
