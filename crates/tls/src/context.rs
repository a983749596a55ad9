//! Server configuration and the per-connection handshake scratch state.

use std::sync::Arc;

use bignum::Mpi;
use ecp::CurveId;
use zeroize::Zeroizing;

use crate::collab::{HashAlg, PkAlg, PrivateKey, Session, SessionCache, TicketKeys};
use crate::kx::KxContext;
use crate::suites;

/// Hard cap on stored ciphersuite code points per ClientHello; excess
/// entries are scanned for SCSVs but otherwise dropped.
pub const MAX_CIPHERSUITES: usize = 64;

/// Hard cap on accepted named curves per ClientHello.
pub const MAX_CURVES: usize = 16;

/// Hard cap on ALPN protocol names considered per ClientHello.
pub const MAX_ALPN: usize = 16;

/// Hard cap on a single buffered extension body.
pub const MAX_EXT_BODY: usize = 2048;

/// A server certificate chain with its private key.
#[derive(Clone)]
pub struct ServerCert {
    /// DER certificates, leaf first.
    pub chain: Vec<Vec<u8>>,
    pub key: Arc<dyn PrivateKey + Send + Sync>,
    /// Key algorithm of the leaf.
    pub alg: PkAlg,
    /// Curve of the leaf key, for ECDSA certificates.
    pub curve: Option<CurveId>,
}

/// Per-hostname configuration bound by the SNI callback.
pub struct Vhost {
    pub certs: Vec<ServerCert>,
    /// Overrides the global ALPN preference list when set.
    pub alpn: Option<Vec<Vec<u8>>>,
}

/// Resolves an SNI host name to a virtual-host configuration.
pub trait SniResolver {
    fn resolve(&self, name: &[u8]) -> Option<Arc<Vhost>>;
}

/// Finite-field Diffie-Hellman domain parameters for the DHE suites.
#[derive(Clone)]
pub struct DhParams {
    pub p: Mpi,
    pub g: Mpi,
}

/// Immutable server-side handshake configuration, shared between
/// connections.
pub struct ServerConfig {
    /// Ciphersuite code points in server preference order.
    pub suites: Vec<u16>,
    /// Curves in server preference order.
    pub curves: Vec<CurveId>,
    /// ALPN protocol names in server preference order; empty disables
    /// ALPN negotiation.
    pub alpn: Vec<Vec<u8>>,
    /// Certificates used when no SNI match applies.
    pub default_vhost: Option<Arc<Vhost>>,
    pub sni: Option<Arc<dyn SniResolver + Send + Sync>>,
    /// Enables session tickets.
    pub tickets: Option<Arc<dyn TicketKeys + Send + Sync>>,
    pub session_cache: Option<Arc<dyn SessionCache + Send + Sync>>,
    /// Domain parameters for the DHE suites.
    pub dh: Option<DhParams>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            suites: suites::default_preference(),
            curves: CurveId::PREFERRED.to_vec(),
            alpn: Vec::new(),
            default_vhost: None,
            sni: None,
            tickets: None,
            session_cache: None,
            dh: None,
        }
    }
}

/// The hash the client accepts for each signature algorithm; one hash
/// per signature is kept (the first supported one offered).
#[derive(Debug, Clone, Copy, Default)]
pub struct SigHashSet {
    pub rsa: Option<HashAlg>,
    pub ecdsa: Option<HashAlg>,
}

impl SigHashSet {
    pub fn get(&self, alg: PkAlg) -> Option<HashAlg> {
        match alg {
            PkAlg::Rsa => self.rsa,
            PkAlg::Ecdsa => self.ecdsa,
        }
    }

    pub fn offer(&mut self, alg: PkAlg, hash: HashAlg) {
        let slot = match alg {
            PkAlg::Rsa => &mut self.rsa,
            PkAlg::Ecdsa => &mut self.ecdsa,
        };
        if slot.is_none() {
            *slot = Some(hash);
        }
    }
}

/// Per-connection scratch collected while parsing the ClientHello and
/// consumed by selection and the flight writers. Secrets it owns are
/// wiped when the connection context goes away.
pub struct HandshakeContext {
    /// Client random then server random.
    pub randoms: [u8; 64],
    pub client_version: [u8; 2],
    /// Offered suites, clamped at [`MAX_CIPHERSUITES`].
    pub offered_suites: Vec<u16>,
    /// Client-offered curves we also support, in client order.
    pub curves: Vec<CurveId>,
    pub sig_hash: SigHashSet,
    pub session_id: Vec<u8>,
    /// Client ALPN names, bounded by [`MAX_ALPN`].
    pub alpn_offered: Vec<Vec<u8>>,
    pub alpn_chosen: Option<Vec<u8>>,

    // Flags accumulated from the hello.
    pub secure_renegotiation: bool,
    pub extended_ms: bool,
    pub new_session_ticket: bool,
    pub resume: bool,
    pub curves_ext: bool,
    pub sig_algs_ext: bool,
    pub point_formats_ext: bool,
    pub compressed_points: bool,
    pub fallback_scsv: bool,
    pub bad_version: bool,
    pub null_compression: bool,
    pub alpn_ext: bool,

    pub sni_vhost: Option<Arc<Vhost>>,
    pub ticket_session: Option<Session>,
    pub chosen_suite: Option<&'static suites::SuiteInfo>,
    pub chosen_cert: Option<ServerCert>,
    pub chosen_curve: Option<CurveId>,
    pub kx: Option<KxContext>,
    pub master: Zeroizing<[u8; 48]>,
}

impl HandshakeContext {
    pub fn new() -> Self {
        HandshakeContext {
            randoms: [0; 64],
            client_version: [0; 2],
            offered_suites: Vec::new(),
            curves: Vec::new(),
            sig_hash: SigHashSet::default(),
            session_id: Vec::new(),
            alpn_offered: Vec::new(),
            alpn_chosen: None,
            secure_renegotiation: false,
            extended_ms: false,
            new_session_ticket: false,
            resume: false,
            curves_ext: false,
            sig_algs_ext: false,
            point_formats_ext: false,
            compressed_points: false,
            fallback_scsv: false,
            bad_version: false,
            null_compression: false,
            alpn_ext: false,
            sni_vhost: None,
            ticket_session: None,
            chosen_suite: None,
            chosen_cert: None,
            chosen_curve: None,
            kx: None,
            master: Zeroizing::new([0; 48]),
        }
    }

    /// The signature hash negotiated for a certificate algorithm; the
    /// RFC 5246 default applies when the client sent no
    /// signature-algorithms extension.
    pub fn sig_hash_for(&self, alg: PkAlg) -> Option<HashAlg> {
        if !self.sig_algs_ext {
            return Some(HashAlg::Sha1);
        }
        self.sig_hash.get(alg)
    }
}

impl Default for HandshakeContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sig_hash_set_keeps_first() {
        let mut s = SigHashSet::default();
        s.offer(PkAlg::Rsa, HashAlg::Sha384);
        s.offer(PkAlg::Rsa, HashAlg::Sha256);
        assert_eq!(s.get(PkAlg::Rsa), Some(HashAlg::Sha384));
        assert_eq!(s.get(PkAlg::Ecdsa), None);
    }

    #[test]
    fn test_default_sig_hash_without_extension() {
        let ctx = HandshakeContext::new();
        assert_eq!(ctx.sig_hash_for(PkAlg::Rsa), Some(HashAlg::Sha1));
        let mut ctx = HandshakeContext::new();
        ctx.sig_algs_ext = true;
        assert_eq!(ctx.sig_hash_for(PkAlg::Rsa), None);
    }

    #[test]
    fn test_default_config_prefers_all_suites() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.suites.len(), suites::SUITES.len());
        assert!(cfg.alpn.is_empty());
    }
}
