//! Error codes for the handshake core, and their mapping to fatal alerts.

use thiserror::Error;

use crate::alert::AlertDescription;

/// Errors surfaced by the server handshake and its helpers.
///
/// Each fatal protocol error maps to the TLS alert the state machine
/// emits before giving up; see [`Error::alert`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The ClientHello was malformed or unacceptable.
    #[error("bad client hello")]
    BadClientHello,
    /// The ClientKeyExchange was malformed or unacceptable.
    #[error("bad client key exchange")]
    BadClientKeyExchange,
    /// The CertificateVerify signature did not check out.
    #[error("bad certificate verify")]
    BadCertificateVerify,
    /// The ChangeCipherSpec payload was not the single byte 1.
    #[error("bad change cipher spec")]
    BadChangeCipherSpec,
    /// The Finished payload had the wrong size or verify data.
    #[error("bad finished message")]
    BadFinished,
    /// The client offered a protocol version other than TLS 1.2.
    #[error("unsupported protocol version")]
    ProtocolVersion,
    /// No common ciphersuite, curve, or usable certificate.
    #[error("no usable ciphersuite")]
    HandshakeFailure,
    /// A handshake structure did not decode.
    #[error("malformed handshake structure")]
    DecodeError,
    /// FALLBACK_SCSV seen together with a downgraded version offer.
    #[error("inappropriate fallback")]
    InappropriateFallback,
    /// The SNI callback did not recognise the requested host.
    #[error("server name not recognised")]
    UnrecognizedName,
    /// The ALPN intersection with the server list is empty.
    #[error("no overlapping application protocol")]
    NoApplicationProtocol,
    /// A parameter value is illegal (duplicate curve, bad point, ...).
    #[error("illegal parameter")]
    IllegalParameter,
    /// A peer signature failed verification.
    #[error("signature verification failed")]
    VerifyFailed,
    /// A signature length field is inconsistent with its payload.
    #[error("signature length mismatch")]
    SigLenMismatch,
    /// A message arrived in a state that does not accept it.
    #[error("unexpected message")]
    UnexpectedMessage,
    /// The operation needs a feature this build or config lacks.
    #[error("feature unavailable")]
    FeatureUnavailable,
    /// An output buffer cannot hold the value.
    #[error("buffer too small")]
    BufferTooSmall,
    /// A key failed validation.
    #[error("invalid key")]
    InvalidKey,
    /// An external collaborator failed.
    #[error("collaborator failed: {0}")]
    External(&'static str),
    /// Bignum arithmetic error.
    #[error(transparent)]
    Bignum(#[from] bignum::Error),
    /// Curve arithmetic error.
    #[error(transparent)]
    Ecp(#[from] ecp::Error),
}

impl Error {
    /// The fatal alert to emit for this error, if any.
    pub fn alert(&self) -> Option<AlertDescription> {
        use AlertDescription as A;
        Some(match self {
            Error::ProtocolVersion => A::ProtocolVersion,
            Error::DecodeError | Error::SigLenMismatch | Error::BadClientKeyExchange => {
                A::DecodeError
            }
            Error::InappropriateFallback => A::InappropriateFallback,
            Error::UnrecognizedName => A::UnrecognizedName,
            Error::NoApplicationProtocol => A::NoApplicationProtocol,
            Error::IllegalParameter | Error::InvalidKey => A::IllegalParameter,
            Error::HandshakeFailure | Error::BadClientHello | Error::FeatureUnavailable => {
                A::HandshakeFailure
            }
            Error::VerifyFailed | Error::BadCertificateVerify | Error::BadFinished => {
                A::DecryptError
            }
            Error::UnexpectedMessage | Error::BadChangeCipherSpec => A::UnexpectedMessage,
            Error::BufferTooSmall
            | Error::External(_)
            | Error::Bignum(_)
            | Error::Ecp(_) => A::InternalError,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_mapping() {
        assert_eq!(Error::ProtocolVersion.alert(), Some(AlertDescription::ProtocolVersion));
        assert_eq!(
            Error::InappropriateFallback.alert(),
            Some(AlertDescription::InappropriateFallback)
        );
        assert_eq!(Error::DecodeError.alert(), Some(AlertDescription::DecodeError));
        assert_eq!(
            Error::NoApplicationProtocol.alert(),
            Some(AlertDescription::NoApplicationProtocol)
        );
        assert_eq!(Error::UnrecognizedName.alert(), Some(AlertDescription::UnrecognizedName));
        assert_eq!(Error::BadFinished.alert(), Some(AlertDescription::DecryptError));
    }
}
