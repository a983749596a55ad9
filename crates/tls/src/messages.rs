//! Handshake message types, extension code points, and header framing.

use common::put_u24;

/// TLS 1.2 on the wire.
pub const TLS12: [u8; 2] = [3, 3];

/// Fixed length of a TLS 1.2 Finished body.
pub const FINISHED_LEN: usize = 12;

/// Handshake message types (RFC 5246 §7.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandshakeType {
    HelloRequest = 0,
    ClientHello = 1,
    ServerHello = 2,
    NewSessionTicket = 4,
    Certificate = 11,
    ServerKeyExchange = 12,
    CertificateRequest = 13,
    ServerHelloDone = 14,
    CertificateVerify = 15,
    ClientKeyExchange = 16,
    Finished = 20,
}

impl HandshakeType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::HelloRequest),
            1 => Some(Self::ClientHello),
            2 => Some(Self::ServerHello),
            4 => Some(Self::NewSessionTicket),
            11 => Some(Self::Certificate),
            12 => Some(Self::ServerKeyExchange),
            13 => Some(Self::CertificateRequest),
            14 => Some(Self::ServerHelloDone),
            15 => Some(Self::CertificateVerify),
            16 => Some(Self::ClientKeyExchange),
            20 => Some(Self::Finished),
            _ => None,
        }
    }
}

// Extension code points (IANA TLS ExtensionType registry).
pub const EXT_SERVER_NAME: u16 = 0x0000;
pub const EXT_SUPPORTED_GROUPS: u16 = 0x000A;
pub const EXT_EC_POINT_FORMATS: u16 = 0x000B;
pub const EXT_SIGNATURE_ALGORITHMS: u16 = 0x000D;
pub const EXT_ALPN: u16 = 0x0010;
pub const EXT_ENCRYPT_THEN_MAC: u16 = 0x0016;
pub const EXT_EXTENDED_MASTER_SECRET: u16 = 0x0017;
pub const EXT_SESSION_TICKET: u16 = 0x0023;
pub const EXT_RENEGOTIATION_INFO: u16 = 0xFF01;

/// SNI name type for a DNS host name.
pub const SNI_TYPE_HOST_NAME: u8 = 0;

/// EC point format identifiers (RFC 8422 §5.1.2).
pub const POINT_FORMAT_UNCOMPRESSED: u8 = 0;

/// Frame a handshake body with its 4-byte header.
pub fn handshake_message(typ: HandshakeType, body: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(4 + body.len());
    msg.push(typ as u8);
    put_u24(&mut msg, body.len() as u32);
    msg.extend_from_slice(body);
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_type_roundtrip() {
        for t in [
            HandshakeType::ClientHello,
            HandshakeType::ServerHello,
            HandshakeType::NewSessionTicket,
            HandshakeType::ServerKeyExchange,
            HandshakeType::ClientKeyExchange,
            HandshakeType::Finished,
        ] {
            assert_eq!(HandshakeType::from_u8(t as u8), Some(t));
        }
        assert_eq!(HandshakeType::from_u8(3), None);
        assert_eq!(HandshakeType::from_u8(21), None);
    }

    #[test]
    fn test_handshake_framing() {
        let msg = handshake_message(HandshakeType::ServerHelloDone, &[]);
        assert_eq!(msg, vec![14, 0, 0, 0]);
        let msg = handshake_message(HandshakeType::Finished, &[0xAB; 12]);
        assert_eq!(&msg[..4], &[20, 0, 0, 12]);
        assert_eq!(msg.len(), 16);
    }
}
