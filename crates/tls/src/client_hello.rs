//! Incremental ClientHello parser.
//!
//! The parser is a nested state machine over the hello's fields: every
//! substate consumes at most the bytes it needs, suspends when the
//! input chunk runs dry, and re-enters at the same point on the next
//! chunk, so any fragmentation of the message parses identically to a
//! single-shot feed. The current substate is a tagged variant carrying
//! its partial payload.

use core::mem;

use log::{debug, trace};

use crate::context::{HandshakeContext, MAX_CIPHERSUITES, MAX_EXT_BODY, ServerConfig};
use crate::error::Error;
use crate::extensions;
use crate::messages::{EXT_SESSION_TICKET, TLS12};
use crate::suites::{EMPTY_RENEGOTIATION_INFO_SCSV, FALLBACK_SCSV};
use crate::ParseStatus;

/// Accumulator for a fixed-width field that may arrive split across
/// chunks.
#[derive(Debug)]
struct Partial<const N: usize> {
    buf: [u8; N],
    filled: usize,
}

impl<const N: usize> Partial<N> {
    fn new() -> Self {
        Partial { buf: [0; N], filled: 0 }
    }

    /// Consume bytes from `chunk` (decrementing `budget`) until the
    /// field is complete; `None` means the chunk ran out first.
    fn feed(&mut self, chunk: &mut &[u8], budget: &mut usize) -> Option<[u8; N]> {
        let n = (N - self.filled).min(chunk.len());
        self.buf[self.filled..self.filled + n].copy_from_slice(&chunk[..n]);
        self.filled += n;
        *chunk = &chunk[n..];
        *budget -= n;
        (self.filled == N).then_some(self.buf)
    }
}

/// The parser's position inside the ClientHello body.
#[derive(Debug)]
enum HelloState {
    Version(Partial<2>),
    Random(Partial<32>),
    SessionIdLen,
    SessionId { remaining: usize },
    SuitesLen(Partial<2>),
    Suites { remaining: usize, half: Option<u8> },
    /// Ciphersuites past the storage cap: still scanned for SCSVs,
    /// otherwise dropped.
    SuitesOverflow { remaining: usize, half: Option<u8> },
    CompressionLen,
    Compressions { remaining: usize },
    ExtensionsLen(Partial<2>),
    ExtHeader(Partial<4>),
    ExtBody { ext_type: u16, remaining: usize, buf: Vec<u8>, discard: bool },
    Done,
}

pub(crate) struct HelloParser {
    state: HelloState,
    /// Unconsumed bytes of the ClientHello body.
    msg_remaining: usize,
    /// Unconsumed bytes of the extension block.
    ext_remaining: usize,
}

impl HelloParser {
    pub fn new(body_len: usize) -> Self {
        HelloParser {
            state: HelloState::Version(Partial::new()),
            msg_remaining: body_len,
            ext_remaining: 0,
        }
    }

    /// Feed a chunk. Consumes at most the rest of the hello body from
    /// `input`, leaving any following message bytes untouched.
    pub fn feed(
        &mut self,
        input: &mut &[u8],
        ctx: &mut HandshakeContext,
        cfg: &ServerConfig,
    ) -> Result<ParseStatus, Error> {
        let avail = input.len().min(self.msg_remaining);
        let mut chunk = &input[..avail];
        let result = self.run(&mut chunk, ctx, cfg);
        let consumed = avail - chunk.len();
        *input = &input[consumed..];
        result?;

        if matches!(self.state, HelloState::Done) {
            if self.msg_remaining != 0 {
                return Err(Error::DecodeError);
            }
            return Ok(ParseStatus::Complete);
        }
        if self.msg_remaining == 0 {
            // The header promised fewer bytes than the fields need.
            return Err(Error::DecodeError);
        }
        Ok(ParseStatus::NeedMore)
    }

    fn run(
        &mut self,
        chunk: &mut &[u8],
        ctx: &mut HandshakeContext,
        cfg: &ServerConfig,
    ) -> Result<(), Error> {
        loop {
            if chunk.is_empty() || matches!(self.state, HelloState::Done) {
                return Ok(());
            }
            let state = mem::replace(&mut self.state, HelloState::Done);
            self.state = self.step(state, chunk, ctx, cfg)?;
        }
    }

    fn take_u8(&mut self, chunk: &mut &[u8]) -> u8 {
        let b = chunk[0];
        *chunk = &chunk[1..];
        self.msg_remaining -= 1;
        b
    }

    fn step(
        &mut self,
        state: HelloState,
        chunk: &mut &[u8],
        ctx: &mut HandshakeContext,
        cfg: &ServerConfig,
    ) -> Result<HelloState, Error> {
        Ok(match state {
            HelloState::Version(mut p) => match p.feed(chunk, &mut self.msg_remaining) {
                Some(v) => {
                    ctx.client_version = v;
                    if v != TLS12 {
                        trace!("client version {}.{} is not TLS 1.2", v[0], v[1]);
                        ctx.bad_version = true;
                    }
                    HelloState::Random(Partial::new())
                }
                None => HelloState::Version(p),
            },

            HelloState::Random(mut p) => match p.feed(chunk, &mut self.msg_remaining) {
                Some(r) => {
                    ctx.randoms[..32].copy_from_slice(&r);
                    HelloState::SessionIdLen
                }
                None => HelloState::Random(p),
            },

            HelloState::SessionIdLen => {
                let len = self.take_u8(chunk) as usize;
                if len > 32 {
                    return Err(Error::DecodeError);
                }
                ctx.session_id.clear();
                if len == 0 {
                    HelloState::SuitesLen(Partial::new())
                } else {
                    HelloState::SessionId { remaining: len }
                }
            }

            HelloState::SessionId { mut remaining } => {
                let n = remaining.min(chunk.len());
                ctx.session_id.extend_from_slice(&chunk[..n]);
                *chunk = &chunk[n..];
                self.msg_remaining -= n;
                remaining -= n;
                if remaining == 0 {
                    HelloState::SuitesLen(Partial::new())
                } else {
                    HelloState::SessionId { remaining }
                }
            }

            HelloState::SuitesLen(mut p) => match p.feed(chunk, &mut self.msg_remaining) {
                Some(b) => {
                    let len = u16::from_be_bytes(b) as usize;
                    if len < 2 || len % 2 != 0 {
                        return Err(Error::DecodeError);
                    }
                    HelloState::Suites { remaining: len, half: None }
                }
                None => HelloState::SuitesLen(p),
            },

            HelloState::Suites { mut remaining, mut half } => {
                let mut overflowed = false;
                while remaining > 0 && !chunk.is_empty() {
                    let byte = self.take_u8(chunk);
                    remaining -= 1;
                    match half.take() {
                        None => half = Some(byte),
                        Some(hi) => {
                            scan_suite(ctx, u16::from_be_bytes([hi, byte]));
                            if ctx.offered_suites.len() >= MAX_CIPHERSUITES && remaining > 0 {
                                overflowed = true;
                                break;
                            }
                        }
                    }
                }
                if remaining == 0 {
                    HelloState::CompressionLen
                } else if overflowed {
                    debug!("ciphersuite list clamped at {MAX_CIPHERSUITES} entries");
                    HelloState::SuitesOverflow { remaining, half }
                } else {
                    HelloState::Suites { remaining, half }
                }
            }

            HelloState::SuitesOverflow { mut remaining, mut half } => {
                while remaining > 0 && !chunk.is_empty() {
                    let byte = self.take_u8(chunk);
                    remaining -= 1;
                    match half.take() {
                        None => half = Some(byte),
                        Some(hi) => scan_suite(ctx, u16::from_be_bytes([hi, byte])),
                    }
                }
                if remaining == 0 {
                    HelloState::CompressionLen
                } else {
                    HelloState::SuitesOverflow { remaining, half }
                }
            }

            HelloState::CompressionLen => {
                let count = self.take_u8(chunk) as usize;
                if count == 0 {
                    return Err(Error::DecodeError);
                }
                HelloState::Compressions { remaining: count }
            }

            HelloState::Compressions { mut remaining } => {
                while remaining > 0 && !chunk.is_empty() {
                    if self.take_u8(chunk) == 0 {
                        ctx.null_compression = true;
                    }
                    remaining -= 1;
                }
                if remaining > 0 {
                    HelloState::Compressions { remaining }
                } else if self.msg_remaining == 0 {
                    HelloState::Done
                } else {
                    HelloState::ExtensionsLen(Partial::new())
                }
            }

            HelloState::ExtensionsLen(mut p) => match p.feed(chunk, &mut self.msg_remaining) {
                Some(b) => {
                    let len = u16::from_be_bytes(b) as usize;
                    if len != self.msg_remaining {
                        return Err(Error::DecodeError);
                    }
                    self.ext_remaining = len;
                    if len == 0 { HelloState::Done } else { HelloState::ExtHeader(Partial::new()) }
                }
                None => HelloState::ExtensionsLen(p),
            },

            HelloState::ExtHeader(mut p) => match p.feed(chunk, &mut self.msg_remaining) {
                Some(b) => {
                    let ext_type = u16::from_be_bytes([b[0], b[1]]);
                    let size = u16::from_be_bytes([b[2], b[3]]) as usize;
                    self.ext_remaining -= 4;
                    if size > self.ext_remaining {
                        return Err(Error::DecodeError);
                    }
                    let mut discard = !extensions::is_recognized(ext_type);
                    if discard {
                        debug!("ignoring unknown extension {ext_type:#06x} ({size} bytes)");
                    }
                    if size > MAX_EXT_BODY && !discard {
                        if ext_type == EXT_SESSION_TICKET {
                            // An oversized ticket cannot be one of ours;
                            // treat it like an undecryptable one.
                            debug!("oversized session ticket skipped");
                            ctx.new_session_ticket = cfg.tickets.is_some();
                            discard = true;
                        } else {
                            return Err(Error::DecodeError);
                        }
                    }
                    if size == 0 {
                        if !discard {
                            extensions::dispatch(ext_type, &[], ctx, cfg)?;
                        }
                        self.after_extension()
                    } else {
                        HelloState::ExtBody {
                            ext_type,
                            remaining: size,
                            buf: Vec::with_capacity(size.min(MAX_EXT_BODY)),
                            discard,
                        }
                    }
                }
                None => HelloState::ExtHeader(p),
            },

            HelloState::ExtBody { ext_type, mut remaining, mut buf, discard } => {
                let n = remaining.min(chunk.len());
                if !discard {
                    buf.extend_from_slice(&chunk[..n]);
                }
                *chunk = &chunk[n..];
                self.msg_remaining -= n;
                self.ext_remaining -= n;
                remaining -= n;
                if remaining == 0 {
                    if !discard {
                        extensions::dispatch(ext_type, &buf, ctx, cfg)?;
                    }
                    self.after_extension()
                } else {
                    HelloState::ExtBody { ext_type, remaining, buf, discard }
                }
            }

            HelloState::Done => HelloState::Done,
        })
    }

    fn after_extension(&self) -> HelloState {
        if self.ext_remaining == 0 {
            HelloState::Done
        } else {
            HelloState::ExtHeader(Partial::new())
        }
    }
}

/// Record one offered ciphersuite, catching the SCSV code points inline.
fn scan_suite(ctx: &mut HandshakeContext, id: u16) {
    match id {
        FALLBACK_SCSV => ctx.fallback_scsv = true,
        EMPTY_RENEGOTIATION_INFO_SCSV => ctx.secure_renegotiation = true,
        _ => {
            if ctx.offered_suites.len() < MAX_CIPHERSUITES {
                ctx.offered_suites.push(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{put_u16, put_vec16, put_vec8};

    /// Build a plain ClientHello body (no header) for the given suites
    /// and raw extension block.
    fn hello_body(version: [u8; 2], suites: &[u16], extensions: Option<&[u8]>) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&version);
        body.extend_from_slice(&[0x42; 32]);
        body.push(0); // empty session id
        let mut cs = Vec::new();
        for &s in suites {
            put_u16(&mut cs, s);
        }
        put_vec16(&mut body, &cs);
        put_vec8(&mut body, &[0x00]); // null compression only
        if let Some(ext) = extensions {
            put_vec16(&mut body, ext);
        }
        body
    }

    fn parse_all(body: &[u8]) -> Result<HandshakeContext, Error> {
        let mut ctx = HandshakeContext::new();
        let cfg = ServerConfig::default();
        let mut parser = HelloParser::new(body.len());
        let mut input = body;
        match parser.feed(&mut input, &mut ctx, &cfg)? {
            ParseStatus::Complete => Ok(ctx),
            ParseStatus::NeedMore => Err(Error::DecodeError),
        }
    }

    #[test]
    fn test_minimal_hello() {
        let body = hello_body([3, 3], &[0xC02B, 0x00FF], None);
        let ctx = parse_all(&body).unwrap();
        assert_eq!(ctx.client_version, [3, 3]);
        assert!(!ctx.bad_version);
        assert!(ctx.null_compression);
        assert_eq!(ctx.offered_suites, vec![0xC02B]);
        assert!(ctx.secure_renegotiation); // via SCSV
        assert!(ctx.session_id.is_empty());
    }

    #[test]
    fn test_fragmentation_invariance() {
        let mut ext = Vec::new();
        // supported groups
        put_u16(&mut ext, 0x000A);
        let mut groups = Vec::new();
        put_vec16(&mut groups, &[0, 23, 0, 29]);
        put_u16(&mut ext, groups.len() as u16);
        ext.extend_from_slice(&groups);
        // an unknown extension to skip
        put_u16(&mut ext, 0x7777);
        put_u16(&mut ext, 3);
        ext.extend_from_slice(&[9, 9, 9]);
        let body = hello_body([3, 3], &[0xC02B, 0xC02F], Some(&ext));

        let whole = parse_all(&body).unwrap();

        // One byte at a time must land in the identical state.
        let mut ctx = HandshakeContext::new();
        let cfg = ServerConfig::default();
        let mut parser = HelloParser::new(body.len());
        let mut status = ParseStatus::NeedMore;
        for (i, b) in body.iter().enumerate() {
            let mut input = core::slice::from_ref(b);
            status = parser.feed(&mut input, &mut ctx, &cfg).unwrap();
            assert!(input.is_empty());
            if i + 1 < body.len() {
                assert!(matches!(status, ParseStatus::NeedMore));
            }
        }
        assert!(matches!(status, ParseStatus::Complete));
        assert_eq!(ctx.offered_suites, whole.offered_suites);
        assert_eq!(ctx.curves, whole.curves);
        assert_eq!(ctx.curves.len(), 2);
        assert_eq!(ctx.session_id, whole.session_id);
    }

    #[test]
    fn test_session_id_too_long() {
        let mut body = Vec::new();
        body.extend_from_slice(&[3, 3]);
        body.extend_from_slice(&[0; 32]);
        body.push(33);
        body.extend_from_slice(&[0; 33]);
        let mut ctx = HandshakeContext::new();
        let cfg = ServerConfig::default();
        let mut parser = HelloParser::new(body.len() + 10);
        let mut input = &body[..];
        assert_eq!(parser.feed(&mut input, &mut ctx, &cfg), Err(Error::DecodeError));
    }

    #[test]
    fn test_odd_suite_length_rejected() {
        let mut body = Vec::new();
        body.extend_from_slice(&[3, 3]);
        body.extend_from_slice(&[0; 32]);
        body.push(0);
        put_u16(&mut body, 3); // odd ciphersuite length
        body.extend_from_slice(&[0, 1, 2]);
        let mut ctx = HandshakeContext::new();
        let cfg = ServerConfig::default();
        let mut parser = HelloParser::new(body.len());
        let mut input = &body[..];
        assert_eq!(parser.feed(&mut input, &mut ctx, &cfg), Err(Error::DecodeError));
    }

    #[test]
    fn test_suite_overflow_clamps_but_keeps_scsv() {
        // More suites than the cap, with FALLBACK_SCSV at the end.
        let mut ids: Vec<u16> = (0..(MAX_CIPHERSUITES as u16 + 8)).map(|i| 0x4000 + i).collect();
        ids.push(FALLBACK_SCSV);
        let body = hello_body([3, 3], &ids, None);
        let ctx = parse_all(&body).unwrap();
        assert_eq!(ctx.offered_suites.len(), MAX_CIPHERSUITES);
        assert!(ctx.fallback_scsv);
    }

    #[test]
    fn test_extension_length_mismatch() {
        let mut ext = Vec::new();
        put_u16(&mut ext, 0x7777);
        put_u16(&mut ext, 200); // claims more than the block holds
        ext.extend_from_slice(&[0; 4]);
        let body = hello_body([3, 3], &[0xC02B], Some(&ext));
        assert_eq!(parse_all(&body).err(), Some(Error::DecodeError));
    }

    #[test]
    fn test_missing_null_compression_noted() {
        let mut body = Vec::new();
        body.extend_from_slice(&[3, 3]);
        body.extend_from_slice(&[0; 32]);
        body.push(0);
        let mut cs = Vec::new();
        put_u16(&mut cs, 0xC02B);
        put_vec16(&mut body, &cs);
        put_vec8(&mut body, &[0x01]); // deflate only
        let ctx = parse_all(&body).unwrap();
        assert!(!ctx.null_compression);
    }

    #[test]
    fn test_old_version_noted_not_fatal_during_parse() {
        let body = hello_body([3, 1], &[0xC02B], None);
        let ctx = parse_all(&body).unwrap();
        assert!(ctx.bad_version);
        assert_eq!(ctx.client_version, [3, 1]);
    }

    #[test]
    fn test_trailing_bytes_left_for_caller() {
        let body = hello_body([3, 3], &[0xC02B], None);
        let mut with_tail = body.clone();
        with_tail.extend_from_slice(&[0xEE; 7]);
        let mut ctx = HandshakeContext::new();
        let cfg = ServerConfig::default();
        let mut parser = HelloParser::new(body.len());
        let mut input = &with_tail[..];
        let status = parser.feed(&mut input, &mut ctx, &cfg).unwrap();
        assert!(matches!(status, ParseStatus::Complete));
        assert_eq!(input, &[0xEE; 7]);
    }
}
