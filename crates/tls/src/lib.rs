//! # Server-Side TLS 1.2 Handshake Core
//!
//! The protocol half of a TLS 1.2 terminator: an incremental,
//! restartable server handshake state machine with its ciphersuite
//! registry, extension codecs, and key-exchange helpers (ECDHE over the
//! `ecp` crate, DHE and the RSA premaster over `bignum`).
//!
//! Record encryption, X.509, the PRF, tickets, and I/O stay outside;
//! the [`collab`] module defines the narrow traits they are reached
//! through. The state machine suspends on arbitrary byte boundaries:
//! [`server::ServerHandshake::feed`] accepts any fragmentation of the
//! input and resumes exactly where the previous chunk ran out.

#![forbid(unsafe_code)]

pub mod alert;
pub mod collab;
pub mod context;
pub mod error;
pub mod extensions;
pub mod kx;
pub mod messages;
pub mod server;
pub mod suites;

mod client_hello;

pub use alert::{AlertDescription, AlertLevel};
pub use collab::{HashAlg, PkAlg, Session};
pub use context::{DhParams, ServerCert, ServerConfig, SniResolver, Vhost};
pub use error::Error;
pub use server::{Collaborators, HandshakeState, RecordContent, ServerHandshake, Status};

/// Result of feeding a chunk to an incremental sub-parser: either the
/// structure is complete, or the parser saved its position and needs
/// more bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    Complete,
    NeedMore,
}
