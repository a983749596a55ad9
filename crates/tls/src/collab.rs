//! External collaborator contracts.
//!
//! The core never performs symmetric crypto, hashing, X.509 parsing, or
//! I/O itself; each of those concerns is reached through one of the
//! narrow traits here. Tests plug in lightweight doubles, production
//! glue plugs in the real record layer and key store.

use rand_core::RngCore;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::alert::{AlertDescription, AlertLevel};
use crate::error::Error;
use crate::suites::SuiteInfo;

/// Asymmetric key algorithm selector for the `pk_*` operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkAlg {
    Rsa,
    Ecdsa,
}

impl PkAlg {
    /// The TLS SignatureAlgorithm code point.
    pub fn tls_id(self) -> u8 {
        match self {
            PkAlg::Rsa => 1,
            PkAlg::Ecdsa => 3,
        }
    }

    pub fn from_tls_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(PkAlg::Rsa),
            3 => Some(PkAlg::Ecdsa),
            _ => None,
        }
    }
}

/// Hash algorithm selector for signatures and the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlg {
    /// The TLS HashAlgorithm code point.
    pub fn tls_id(self) -> u8 {
        match self {
            HashAlg::Sha1 => 2,
            HashAlg::Sha256 => 4,
            HashAlg::Sha384 => 5,
            HashAlg::Sha512 => 6,
        }
    }

    pub fn from_tls_id(id: u8) -> Option<Self> {
        match id {
            2 => Some(HashAlg::Sha1),
            4 => Some(HashAlg::Sha256),
            5 => Some(HashAlg::Sha384),
            6 => Some(HashAlg::Sha512),
            _ => None,
        }
    }
}

/// Wall-clock source; feeds the server random prefix and ticket
/// lifetimes.
pub trait Clock {
    /// Seconds since the Unix epoch.
    fn unix_time(&self) -> u64;
}

/// Incremental hash over the handshake transcript.
///
/// The state machine feeds every handshake message (header included,
/// ChangeCipherSpec excluded) in order; `finish` forks the running
/// state and returns the digest for the requested algorithm.
pub trait HandshakeHash {
    fn update(&mut self, data: &[u8]);
    fn finish(&self, alg: HashAlg) -> Vec<u8>;
}

/// One-shot message digests (ServerKeyExchange signature input).
pub trait Md {
    fn digest(&self, alg: HashAlg, data: &[u8]) -> Vec<u8>;
}

/// Master-secret and key-block derivation (the TLS 1.2 PRF lives
/// behind this trait, together with the record-layer key switch).
pub trait KeySource {
    /// Derive the 48-byte master secret from the premaster.
    /// `session_hash` is present when the extended-master-secret
    /// extension was negotiated and replaces the randoms in the PRF.
    fn derive_master(
        &mut self,
        suite: &SuiteInfo,
        premaster: &[u8],
        randoms: &[u8; 64],
        session_hash: Option<&[u8]>,
    ) -> Result<[u8; 48], Error>;

    /// Expand the key block and install record keys.
    fn derive_keys(
        &mut self,
        suite: &SuiteInfo,
        master: &[u8; 48],
        randoms: &[u8; 64],
    ) -> Result<(), Error>;

    /// The 12-byte Finished verify data for the given label.
    fn finished(
        &self,
        suite: &SuiteInfo,
        master: &[u8; 48],
        label: &'static str,
        transcript: &[u8],
    ) -> [u8; 12];
}

/// Server private-key operations, keyed by algorithm.
pub trait PrivateKey {
    fn can_do(&self, alg: PkAlg) -> bool;
    /// Key size in bytes (RSA modulus length; 0 where not meaningful).
    fn len(&self) -> usize;
    /// Sign a digest that was computed with `hash_alg`.
    fn sign(
        &self,
        hash_alg: HashAlg,
        digest: &[u8],
        rng: &mut dyn RngCore,
    ) -> Result<Vec<u8>, Error>;
    /// PKCS#1 v1.5 decrypt into `out`; returns the plaintext length.
    /// Any padding problem must surface as an error without writing
    /// secrets into `out`.
    fn decrypt(&self, ciphertext: &[u8], out: &mut [u8]) -> Result<usize, Error>;
}

/// Peer public-key verification (CertificateVerify).
pub trait PublicKey {
    fn can_do(&self, alg: PkAlg) -> bool;
    fn verify(&self, hash_alg: HashAlg, digest: &[u8], sig: &[u8]) -> Result<(), Error>;
}

/// Turns a client Certificate message body into a verification key.
pub trait PeerCertificateParser {
    fn parse(&self, body: &[u8]) -> Result<Box<dyn PublicKey>, Error>;
}

/// Session state captured for resumption.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Session {
    #[zeroize(skip)]
    pub suite_id: u16,
    pub master: [u8; 48],
    #[zeroize(skip)]
    pub extended_ms: bool,
    #[zeroize(skip)]
    pub session_id: Vec<u8>,
}

/// Sealed session tickets (RFC 5077). Implementations own the ticket
/// keys; the core only moves opaque blobs.
pub trait TicketKeys {
    /// Unseal a ticket into a session. Failure is not fatal to the
    /// handshake; a fresh ticket will be issued instead.
    fn parse(&self, blob: &[u8]) -> Result<Session, Error>;
    /// Seal a session; returns the blob and its lifetime hint in
    /// seconds.
    fn write(&self, session: &Session) -> Result<(Vec<u8>, u32), Error>;
}

/// Server-side session cache for session-id resumption.
pub trait SessionCache {
    fn get(&self, session_id: &[u8]) -> Option<Session>;
    fn put(&self, session: Session);
}

/// Where the assembled flight goes: one scatter-gather segment per
/// handshake message, plus the two record types the core does not
/// frame itself.
pub trait RecordSink {
    fn send_handshake(&mut self, msg: &[u8]) -> Result<(), Error>;
    fn send_change_cipher_spec(&mut self) -> Result<(), Error>;
    fn send_alert(&mut self, level: AlertLevel, desc: AlertDescription) -> Result<(), Error>;
}
