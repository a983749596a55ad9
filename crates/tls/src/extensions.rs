//! ClientHello extension codecs and the ServerHello extension writer.
//!
//! Each parser receives one complete extension body (the hello parser
//! assembles it into a bounded buffer first) and deposits its findings
//! in the handshake context. Unknown extensions never reach this
//! module; the hello parser skips them.

use common::{Cursor, put_u16, put_vec8};
use ecp::CurveId;
use log::debug;

use crate::collab::{HashAlg, PkAlg};
use crate::context::{HandshakeContext, MAX_ALPN, MAX_CURVES, ServerConfig};
use crate::error::Error;
use crate::messages::{
    EXT_ALPN, EXT_EC_POINT_FORMATS, EXT_ENCRYPT_THEN_MAC, EXT_EXTENDED_MASTER_SECRET,
    EXT_RENEGOTIATION_INFO, EXT_SERVER_NAME, EXT_SESSION_TICKET, EXT_SIGNATURE_ALGORITHMS,
    EXT_SUPPORTED_GROUPS, POINT_FORMAT_UNCOMPRESSED, SNI_TYPE_HOST_NAME,
};

/// Whether the server buffers and dispatches this extension type.
pub(crate) fn is_recognized(ext_type: u16) -> bool {
    matches!(
        ext_type,
        EXT_SERVER_NAME
            | EXT_SUPPORTED_GROUPS
            | EXT_EC_POINT_FORMATS
            | EXT_SIGNATURE_ALGORITHMS
            | EXT_ALPN
            | EXT_ENCRYPT_THEN_MAC
            | EXT_EXTENDED_MASTER_SECRET
            | EXT_SESSION_TICKET
            | EXT_RENEGOTIATION_INFO
    )
}

/// Dispatch one assembled extension body.
pub(crate) fn dispatch(
    ext_type: u16,
    body: &[u8],
    ctx: &mut HandshakeContext,
    cfg: &ServerConfig,
) -> Result<(), Error> {
    match ext_type {
        EXT_SERVER_NAME => parse_server_name(body, ctx, cfg),
        EXT_SUPPORTED_GROUPS => parse_supported_groups(body, ctx),
        EXT_EC_POINT_FORMATS => parse_point_formats(body, ctx),
        EXT_SIGNATURE_ALGORITHMS => parse_signature_algorithms(body, ctx),
        EXT_ALPN => parse_alpn(body, ctx),
        EXT_EXTENDED_MASTER_SECRET => parse_extended_ms(body, ctx),
        EXT_SESSION_TICKET => parse_session_ticket(body, ctx, cfg),
        EXT_RENEGOTIATION_INFO => parse_renegotiation_info(body, ctx),
        EXT_ENCRYPT_THEN_MAC => {
            // Parsed and ignored: the record layer here is AEAD-only.
            debug!("ignoring encrypt-then-mac extension");
            Ok(())
        }
        _ => Ok(()),
    }
}

fn parse_server_name(
    body: &[u8],
    ctx: &mut HandshakeContext,
    cfg: &ServerConfig,
) -> Result<(), Error> {
    let Some(resolver) = cfg.sni.as_ref() else {
        debug!("no SNI resolver configured, ignoring server_name");
        return Ok(());
    };
    let mut c = Cursor::new(body);
    let list = c.vec16().map_err(|_| Error::DecodeError)?;
    if !c.is_empty() {
        return Err(Error::DecodeError);
    }
    let mut c = Cursor::new(list);
    while !c.is_empty() {
        let name_type = c.u8().map_err(|_| Error::DecodeError)?;
        let name = c.vec16().map_err(|_| Error::DecodeError)?;
        if name_type != SNI_TYPE_HOST_NAME {
            debug!("skipping server_name entry of type {name_type}");
            continue;
        }
        match resolver.resolve(name) {
            Some(vhost) => {
                ctx.sni_vhost = Some(vhost);
                return Ok(());
            }
            None => return Err(Error::UnrecognizedName),
        }
    }
    Ok(())
}

fn parse_supported_groups(body: &[u8], ctx: &mut HandshakeContext) -> Result<(), Error> {
    let mut c = Cursor::new(body);
    let list = c.vec16().map_err(|_| Error::DecodeError)?;
    if !c.is_empty() || list.len() % 2 != 0 {
        return Err(Error::DecodeError);
    }
    let mut seen = Vec::with_capacity(list.len() / 2);
    for pair in list.chunks_exact(2) {
        let id = u16::from_be_bytes([pair[0], pair[1]]);
        if seen.contains(&id) {
            return Err(Error::IllegalParameter);
        }
        seen.push(id);
        if let Some(curve) = CurveId::from_tls_id(id) {
            if ctx.curves.len() < MAX_CURVES {
                ctx.curves.push(curve);
            }
        } else {
            debug!("client offered unknown curve {id}");
        }
    }
    ctx.curves_ext = true;
    Ok(())
}

fn parse_point_formats(body: &[u8], ctx: &mut HandshakeContext) -> Result<(), Error> {
    let mut c = Cursor::new(body);
    let formats = c.vec8().map_err(|_| Error::DecodeError)?;
    if !c.is_empty() || formats.is_empty() {
        return Err(Error::DecodeError);
    }
    ctx.point_formats_ext = true;
    // Prefer uncompressed; remember when the client can only do
    // compressed points.
    ctx.compressed_points = !formats.contains(&POINT_FORMAT_UNCOMPRESSED);
    Ok(())
}

fn parse_signature_algorithms(body: &[u8], ctx: &mut HandshakeContext) -> Result<(), Error> {
    let mut c = Cursor::new(body);
    let list = c.vec16().map_err(|_| Error::DecodeError)?;
    if !c.is_empty() || list.len() % 2 != 0 {
        return Err(Error::DecodeError);
    }
    for pair in list.chunks_exact(2) {
        let (hash, sig) = (HashAlg::from_tls_id(pair[0]), PkAlg::from_tls_id(pair[1]));
        match (hash, sig) {
            (Some(hash), Some(sig)) => ctx.sig_hash.offer(sig, hash),
            _ => debug!("skipping unknown sig/hash pair {:02x}/{:02x}", pair[0], pair[1]),
        }
    }
    ctx.sig_algs_ext = true;
    Ok(())
}

fn parse_alpn(body: &[u8], ctx: &mut HandshakeContext) -> Result<(), Error> {
    let mut c = Cursor::new(body);
    let list = c.vec16().map_err(|_| Error::DecodeError)?;
    if !c.is_empty() || list.is_empty() {
        return Err(Error::DecodeError);
    }
    let mut c = Cursor::new(list);
    while !c.is_empty() {
        let name = c.vec8().map_err(|_| Error::DecodeError)?;
        if name.is_empty() {
            return Err(Error::DecodeError);
        }
        if ctx.alpn_offered.len() < MAX_ALPN {
            ctx.alpn_offered.push(name.to_vec());
        } else {
            debug!("ALPN list clamped at {MAX_ALPN} entries");
        }
    }
    ctx.alpn_ext = true;
    Ok(())
}

fn parse_extended_ms(body: &[u8], ctx: &mut HandshakeContext) -> Result<(), Error> {
    if !body.is_empty() {
        return Err(Error::DecodeError);
    }
    ctx.extended_ms = true;
    Ok(())
}

fn parse_session_ticket(
    body: &[u8],
    ctx: &mut HandshakeContext,
    cfg: &ServerConfig,
) -> Result<(), Error> {
    let Some(keys) = cfg.tickets.as_ref() else {
        debug!("tickets disabled, ignoring session_ticket extension");
        return Ok(());
    };
    if body.is_empty() {
        ctx.new_session_ticket = true;
        return Ok(());
    }
    match keys.parse(body) {
        Ok(session) => {
            ctx.ticket_session = Some(session);
        }
        Err(e) => {
            // Undecryptable tickets are tolerated; the client gets a
            // fresh one.
            debug!("ticket did not unseal ({e}), will issue a new one");
            ctx.new_session_ticket = true;
        }
    }
    Ok(())
}

fn parse_renegotiation_info(body: &[u8], ctx: &mut HandshakeContext) -> Result<(), Error> {
    // Initial handshake: renegotiated_connection must be empty, so the
    // body is exactly one zero byte.
    if body != [0x00] {
        return Err(Error::HandshakeFailure);
    }
    ctx.secure_renegotiation = true;
    Ok(())
}

/// Server-preference ALPN intersection.
pub(crate) fn alpn_select(server: &[Vec<u8>], client: &[Vec<u8>]) -> Option<Vec<u8>> {
    server.iter().find(|s| client.iter().any(|c| c == *s)).cloned()
}

/// Build the ServerHello extension block (without the outer length).
pub(crate) fn write_server_extensions(ctx: &HandshakeContext, ec_suite: bool) -> Vec<u8> {
    let mut out = Vec::new();

    if ctx.secure_renegotiation {
        put_u16(&mut out, EXT_RENEGOTIATION_INFO);
        put_u16(&mut out, 1);
        out.push(0x00);
    }
    if ctx.extended_ms {
        put_u16(&mut out, EXT_EXTENDED_MASTER_SECRET);
        put_u16(&mut out, 0);
    }
    if ctx.new_session_ticket {
        put_u16(&mut out, EXT_SESSION_TICKET);
        put_u16(&mut out, 0);
    }
    if ec_suite && ctx.point_formats_ext {
        put_u16(&mut out, EXT_EC_POINT_FORMATS);
        put_u16(&mut out, 2);
        out.push(1);
        out.push(POINT_FORMAT_UNCOMPRESSED);
    }
    if let Some(proto) = &ctx.alpn_chosen {
        put_u16(&mut out, EXT_ALPN);
        put_u16(&mut out, proto.len() as u16 + 3);
        put_u16(&mut out, proto.len() as u16 + 1);
        put_vec8(&mut out, proto);
    }
    out
}
