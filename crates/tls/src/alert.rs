//! TLS alert levels and descriptions (RFC 5246 §7.2).

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertLevel {
    Warning = 1,
    Fatal = 2,
}

/// Alert descriptions; only the codes the server core emits or
/// recognises are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertDescription {
    CloseNotify = 0,
    UnexpectedMessage = 10,
    BadRecordMac = 20,
    HandshakeFailure = 40,
    IllegalParameter = 47,
    DecodeError = 50,
    DecryptError = 51,
    ProtocolVersion = 70,
    InternalError = 80,
    InappropriateFallback = 86,
    UnsupportedExtension = 110,
    UnrecognizedName = 112,
    NoApplicationProtocol = 120,
}

impl AlertDescription {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::CloseNotify),
            10 => Some(Self::UnexpectedMessage),
            20 => Some(Self::BadRecordMac),
            40 => Some(Self::HandshakeFailure),
            47 => Some(Self::IllegalParameter),
            50 => Some(Self::DecodeError),
            51 => Some(Self::DecryptError),
            70 => Some(Self::ProtocolVersion),
            80 => Some(Self::InternalError),
            86 => Some(Self::InappropriateFallback),
            110 => Some(Self::UnsupportedExtension),
            112 => Some(Self::UnrecognizedName),
            120 => Some(Self::NoApplicationProtocol),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u8_roundtrip() {
        for d in [
            AlertDescription::CloseNotify,
            AlertDescription::HandshakeFailure,
            AlertDescription::InappropriateFallback,
            AlertDescription::NoApplicationProtocol,
        ] {
            assert_eq!(AlertDescription::from_u8(d as u8), Some(d));
        }
        assert_eq!(AlertDescription::from_u8(99), None);
    }
}
