//! Ciphersuite registry and the signalling code points recognised
//! inline while scanning the client's list.

use crate::collab::{HashAlg, PkAlg};

/// Fallback protection SCSV (RFC 7507).
pub const FALLBACK_SCSV: u16 = 0x5600;

/// Empty renegotiation-info SCSV (RFC 5746).
pub const EMPTY_RENEGOTIATION_INFO_SCSV: u16 = 0x00FF;

/// Key-exchange family of a suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExchange {
    /// Ephemeral ECDH, signed server params.
    Ecdhe,
    /// Ephemeral finite-field DH, signed server params.
    Dhe,
    /// RSA-encrypted premaster, no ServerKeyExchange.
    Rsa,
}

/// Static attributes of a ciphersuite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteInfo {
    pub id: u16,
    pub name: &'static str,
    pub kx: KeyExchange,
    /// Algorithm the server certificate key must support.
    pub cert_alg: PkAlg,
    /// PRF and MAC hash.
    pub mac: HashAlg,
}

impl SuiteInfo {
    /// Whether the suite sends a ServerKeyExchange with ephemeral keys.
    pub fn ephemeral(&self) -> bool {
        matches!(self.kx, KeyExchange::Ecdhe | KeyExchange::Dhe)
    }
}

/// Supported suites; [`crate::context::ServerConfig::suites`] orders a
/// subset of these by server preference.
pub const SUITES: &[SuiteInfo] = &[
    SuiteInfo {
        id: 0xC02B,
        name: "TLS-ECDHE-ECDSA-WITH-AES-128-GCM-SHA256",
        kx: KeyExchange::Ecdhe,
        cert_alg: PkAlg::Ecdsa,
        mac: HashAlg::Sha256,
    },
    SuiteInfo {
        id: 0xC02C,
        name: "TLS-ECDHE-ECDSA-WITH-AES-256-GCM-SHA384",
        kx: KeyExchange::Ecdhe,
        cert_alg: PkAlg::Ecdsa,
        mac: HashAlg::Sha384,
    },
    SuiteInfo {
        id: 0xC02F,
        name: "TLS-ECDHE-RSA-WITH-AES-128-GCM-SHA256",
        kx: KeyExchange::Ecdhe,
        cert_alg: PkAlg::Rsa,
        mac: HashAlg::Sha256,
    },
    SuiteInfo {
        id: 0xC030,
        name: "TLS-ECDHE-RSA-WITH-AES-256-GCM-SHA384",
        kx: KeyExchange::Ecdhe,
        cert_alg: PkAlg::Rsa,
        mac: HashAlg::Sha384,
    },
    SuiteInfo {
        id: 0x009E,
        name: "TLS-DHE-RSA-WITH-AES-128-GCM-SHA256",
        kx: KeyExchange::Dhe,
        cert_alg: PkAlg::Rsa,
        mac: HashAlg::Sha256,
    },
    SuiteInfo {
        id: 0x009F,
        name: "TLS-DHE-RSA-WITH-AES-256-GCM-SHA384",
        kx: KeyExchange::Dhe,
        cert_alg: PkAlg::Rsa,
        mac: HashAlg::Sha384,
    },
    SuiteInfo {
        id: 0x009C,
        name: "TLS-RSA-WITH-AES-128-GCM-SHA256",
        kx: KeyExchange::Rsa,
        cert_alg: PkAlg::Rsa,
        mac: HashAlg::Sha256,
    },
    SuiteInfo {
        id: 0x009D,
        name: "TLS-RSA-WITH-AES-256-GCM-SHA384",
        kx: KeyExchange::Rsa,
        cert_alg: PkAlg::Rsa,
        mac: HashAlg::Sha384,
    },
];

/// Look up a suite by code point.
pub fn find(id: u16) -> Option<&'static SuiteInfo> {
    SUITES.iter().find(|s| s.id == id)
}

/// The default server preference: every supported suite, strongest
/// key exchange first.
pub fn default_preference() -> Vec<u16> {
    SUITES.iter().map(|s| s.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find() {
        assert_eq!(find(0xC02B).unwrap().cert_alg, PkAlg::Ecdsa);
        assert_eq!(find(0x009E).unwrap().kx, KeyExchange::Dhe);
        assert_eq!(find(0x009C).unwrap().kx, KeyExchange::Rsa);
        assert!(find(0x1301).is_none());
    }

    #[test]
    fn test_scsvs_are_not_suites() {
        assert!(find(FALLBACK_SCSV).is_none());
        assert!(find(EMPTY_RENEGOTIATION_INFO_SCSV).is_none());
    }

    #[test]
    fn test_ephemeral_flags() {
        assert!(find(0xC02F).unwrap().ephemeral());
        assert!(!find(0x009D).unwrap().ephemeral());
    }
}
