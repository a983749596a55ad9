//! The server-side TLS 1.2 handshake state machine.
//!
//! [`ServerHandshake::feed`] consumes record payloads in arbitrary
//! chunks and drives the connection from ClientHello to handshake
//! completion, emitting the server flights through the caller's
//! [`RecordSink`]. Parsing suspends (`Status::NeedMore`) on any chunk
//! boundary; all progress lives in the handshake context, never on the
//! stack.

use bignum::limb::ct_bytes_eq;
use common::{U24, put_u16, put_u24, put_u32, put_vec8};
use ecp::CurveId;
use log::{debug, trace};
use rand_core::RngCore;
use zeroize::Zeroizing;

use crate::alert::AlertLevel;
use crate::client_hello::HelloParser;
use crate::collab::{
    Clock, HandshakeHash, HashAlg, KeySource, Md, PeerCertificateParser, PublicKey, RecordSink,
    Session,
};
use crate::context::{HandshakeContext, ServerCert, ServerConfig, Vhost};
use crate::error::Error;
use crate::extensions;
use crate::kx::{DhContext, EcdhContext, KxContext, rsa_premaster};
use crate::messages::{FINISHED_LEN, HandshakeType, TLS12, handshake_message};
use crate::suites::{self, KeyExchange, SuiteInfo};
use crate::ParseStatus;

/// Upper bound on one handshake message body.
const MAX_HS_MSG: usize = 1 << 16;

/// Handshake progress as observed between `feed` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    ClientHello,
    ServerHello,
    ServerCertificate,
    ServerKeyExchange,
    ServerHelloDone,
    ClientCertificate,
    ClientKeyExchange,
    CertificateVerify,
    ClientChangeCipherSpec,
    ClientFinished,
    ServerChangeCipherSpec,
    ServerFinished,
    Wrapup,
    HandshakeOver,
}

/// What kind of record payload `feed` is being handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordContent {
    Handshake,
    ChangeCipherSpec,
}

/// Result of one `feed` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// More input is needed; re-enter with the next chunk.
    NeedMore,
    /// The handshake is complete.
    Complete,
}

/// The external services one connection runs on.
pub struct Collaborators {
    pub rng: Box<dyn RngCore>,
    pub clock: Box<dyn Clock>,
    pub transcript: Box<dyn HandshakeHash>,
    pub keys: Box<dyn KeySource>,
    pub md: Box<dyn Md>,
    /// Present when client certificates are accepted; parses the client
    /// Certificate message into a verification key.
    pub peer_certs: Option<Box<dyn PeerCertificateParser>>,
}

enum Body<'b> {
    Borrowed(&'b [u8]),
    Owned(Vec<u8>),
}

impl Body<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Body::Borrowed(b) => b,
            Body::Owned(v) => v,
        }
    }
}

/// One server-side handshake in progress.
pub struct ServerHandshake<'a> {
    config: &'a ServerConfig,
    collab: Collaborators,
    state: HandshakeState,
    ctx: HandshakeContext,
    hello: Option<HelloParser>,
    hdr_buf: [u8; 4],
    hdr_filled: usize,
    assembler: Vec<u8>,
    peer_cert: Option<Box<dyn PublicKey>>,
}

impl<'a> ServerHandshake<'a> {
    pub fn new(config: &'a ServerConfig, collab: Collaborators) -> Self {
        ServerHandshake {
            config,
            collab,
            state: HandshakeState::ClientHello,
            ctx: HandshakeContext::new(),
            hello: None,
            hdr_buf: [0; 4],
            hdr_filled: 0,
            assembler: Vec::new(),
            peer_cert: None,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// The negotiated suite, once selection has run.
    pub fn suite(&self) -> Option<u16> {
        self.ctx.chosen_suite.map(|s| s.id)
    }

    pub fn alpn(&self) -> Option<&[u8]> {
        self.ctx.alpn_chosen.as_deref()
    }

    pub fn is_resumed(&self) -> bool {
        self.ctx.resume
    }

    /// Feed one record payload chunk.
    ///
    /// On a fatal error the corresponding alert is emitted through the
    /// sink, secrets are wiped, and the error is returned; no further
    /// input is consumed afterwards.
    pub fn feed(
        &mut self,
        content: RecordContent,
        mut input: &[u8],
        sink: &mut dyn RecordSink,
    ) -> Result<Status, Error> {
        match self.feed_inner(content, &mut input, sink) {
            Ok(status) => Ok(status),
            Err(e) => {
                if let Some(desc) = e.alert() {
                    let _ = sink.send_alert(AlertLevel::Fatal, desc);
                }
                self.ctx.master = Zeroizing::new([0; 48]);
                self.ctx.kx = None;
                Err(e)
            }
        }
    }

    fn feed_inner(
        &mut self,
        content: RecordContent,
        input: &mut &[u8],
        sink: &mut dyn RecordSink,
    ) -> Result<Status, Error> {
        if content == RecordContent::ChangeCipherSpec {
            if self.state != HandshakeState::ClientChangeCipherSpec {
                return Err(Error::UnexpectedMessage);
            }
            if *input != [1] {
                return Err(Error::BadChangeCipherSpec);
            }
            trace!("client ChangeCipherSpec accepted");
            self.state = HandshakeState::ClientFinished;
            return Ok(Status::NeedMore);
        }

        loop {
            match self.state {
                HandshakeState::ClientHello => {
                    if self.hello.is_none() {
                        let Some(hdr) = self.take_header(input) else {
                            return Ok(Status::NeedMore);
                        };
                        if hdr[0] != HandshakeType::ClientHello as u8 {
                            return Err(Error::BadClientHello);
                        }
                        let len = U24([hdr[1], hdr[2], hdr[3]]).to_usize();
                        if len > MAX_HS_MSG {
                            return Err(Error::DecodeError);
                        }
                        self.collab.transcript.update(&hdr);
                        self.hdr_filled = 0;
                        self.hello = Some(HelloParser::new(len));
                    }
                    let before = *input;
                    let Some(hello) = self.hello.as_mut() else {
                        return Err(Error::External("hello parser state lost"));
                    };
                    let status = hello.feed(input, &mut self.ctx, self.config)?;
                    let consumed = before.len() - input.len();
                    self.collab.transcript.update(&before[..consumed]);
                    match status {
                        ParseStatus::NeedMore => return Ok(Status::NeedMore),
                        ParseStatus::Complete => {
                            self.hello = None;
                            self.finish_client_hello()?;
                            self.state = HandshakeState::ServerHello;
                        }
                    }
                }

                HandshakeState::ServerHello => {
                    self.write_server_flight(sink)?;
                }

                HandshakeState::ClientCertificate
                | HandshakeState::ClientKeyExchange
                | HandshakeState::CertificateVerify
                | HandshakeState::ClientFinished => {
                    let Some((hdr, body)) = self.take_message(input)? else {
                        return Ok(Status::NeedMore);
                    };
                    self.handle_client_message(hdr, body.as_slice(), sink)?;
                    if self.state == HandshakeState::HandshakeOver {
                        return Ok(Status::Complete);
                    }
                    if input.is_empty() {
                        return Ok(Status::NeedMore);
                    }
                }

                HandshakeState::ClientChangeCipherSpec => {
                    if input.is_empty() {
                        return Ok(Status::NeedMore);
                    }
                    // Handshake bytes while the only acceptable record
                    // is a ChangeCipherSpec.
                    return Err(Error::UnexpectedMessage);
                }

                _ => return Err(Error::UnexpectedMessage),
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Input framing
    // ─────────────────────────────────────────────────────────────────

    /// Accumulate the 4-byte handshake header across chunks.
    fn take_header(&mut self, input: &mut &[u8]) -> Option<[u8; 4]> {
        let n = (4 - self.hdr_filled).min(input.len());
        self.hdr_buf[self.hdr_filled..self.hdr_filled + n].copy_from_slice(&input[..n]);
        self.hdr_filled += n;
        *input = &input[n..];
        (self.hdr_filled == 4).then_some(self.hdr_buf)
    }

    /// Assemble one handshake message. An unfragmented message is
    /// handed out borrowed from the input; fragments are coalesced into
    /// the bounded assembly buffer first.
    fn take_message<'b>(
        &mut self,
        input: &mut &'b [u8],
    ) -> Result<Option<([u8; 4], Body<'b>)>, Error> {
        if self.hdr_filled < 4 {
            if self.take_header(input).is_none() {
                return Ok(None);
            }
        }
        let hdr = self.hdr_buf;
        let body_len = U24([hdr[1], hdr[2], hdr[3]]).to_usize();
        if body_len > MAX_HS_MSG {
            return Err(Error::DecodeError);
        }

        if self.assembler.is_empty() && input.len() >= body_len {
            let body = &input[..body_len];
            *input = &input[body_len..];
            self.hdr_filled = 0;
            return Ok(Some((hdr, Body::Borrowed(body))));
        }

        let need = body_len - self.assembler.len();
        let take = need.min(input.len());
        self.assembler.extend_from_slice(&input[..take]);
        *input = &input[take..];
        if self.assembler.len() == body_len {
            self.hdr_filled = 0;
            let body = core::mem::take(&mut self.assembler);
            return Ok(Some((hdr, Body::Owned(body))));
        }
        Ok(None)
    }

    // ─────────────────────────────────────────────────────────────────
    // ClientHello completion and selection
    // ─────────────────────────────────────────────────────────────────

    fn vhost(&self) -> Option<&Vhost> {
        self.ctx
            .sni_vhost
            .as_deref()
            .or(self.config.default_vhost.as_deref())
    }

    /// Semantic validation and negotiation, in protocol order: SCSV and
    /// version first, then compression, ALPN, resumption, and finally
    /// the suite/curve/certificate intersection.
    fn finish_client_hello(&mut self) -> Result<(), Error> {
        let ctx = &mut self.ctx;

        let downgraded =
            ctx.client_version[0] < 3 || (ctx.client_version[0] == 3 && ctx.client_version[1] < 3);
        if ctx.fallback_scsv && downgraded {
            return Err(Error::InappropriateFallback);
        }
        if ctx.bad_version {
            return Err(Error::ProtocolVersion);
        }
        if !ctx.null_compression {
            return Err(Error::DecodeError);
        }

        // ALPN against the vhost override or the global list.
        let server_alpn = self
            .ctx
            .sni_vhost
            .as_ref()
            .and_then(|v| v.alpn.clone())
            .unwrap_or_else(|| self.config.alpn.clone());
        if self.ctx.alpn_ext && !server_alpn.is_empty() {
            match extensions::alpn_select(&server_alpn, &self.ctx.alpn_offered) {
                Some(proto) => {
                    debug!("ALPN selected {:?}", String::from_utf8_lossy(&proto));
                    self.ctx.alpn_chosen = Some(proto);
                }
                None => return Err(Error::NoApplicationProtocol),
            }
        }

        if self.try_resume()? {
            debug!("resuming session");
            return Ok(());
        }

        self.select_suite()?;

        // Fresh session id, unless a ticket will carry the session.
        if self.ctx.new_session_ticket {
            self.ctx.session_id.clear();
        } else {
            let mut sid = [0u8; 32];
            self.collab.rng.fill_bytes(&mut sid);
            self.ctx.session_id = sid.to_vec();
        }
        Ok(())
    }

    /// Accept a ticket (preferred) or a cached session, when it still
    /// fits what the client offers.
    fn try_resume(&mut self) -> Result<bool, Error> {
        let session = match self.ctx.ticket_session.take() {
            Some(s) => Some(s),
            None => match (&self.config.session_cache, self.ctx.session_id.is_empty()) {
                (Some(cache), false) => cache.get(&self.ctx.session_id),
                _ => None,
            },
        };
        let Some(session) = session else {
            return Ok(false);
        };
        let Some(suite) = suites::find(session.suite_id) else {
            return Ok(false);
        };
        if !self.ctx.offered_suites.contains(&suite.id) {
            return Ok(false);
        }
        // RFC 7627: the extension set must be consistent across
        // resumption; fall back to a full handshake otherwise.
        if session.extended_ms != self.ctx.extended_ms {
            debug!("extended-master-secret mismatch, full handshake instead of resume");
            self.ctx.new_session_ticket = self.config.tickets.is_some();
            return Ok(false);
        }
        self.ctx.chosen_suite = Some(suite);
        *self.ctx.master = session.master;
        self.ctx.resume = true;
        Ok(true)
    }

    fn select_suite(&mut self) -> Result<(), Error> {
        let Some(vhost) = self.vhost() else {
            return Err(Error::HandshakeFailure);
        };
        let ctx = &self.ctx;

        for &sid in &self.config.suites {
            if !ctx.offered_suites.contains(&sid) {
                continue;
            }
            let Some(suite) = suites::find(sid) else {
                continue;
            };
            let curve = match suite.kx {
                KeyExchange::Ecdhe => match self.pick_curve() {
                    Some(c) => Some(c),
                    None => continue,
                },
                KeyExchange::Dhe => {
                    if self.config.dh.is_none() {
                        continue;
                    }
                    None
                }
                KeyExchange::Rsa => None,
            };
            if suite.ephemeral() && ctx.sig_hash_for(suite.cert_alg).is_none() {
                continue;
            }
            let Some(cert) = pick_cert(vhost, suite, ctx) else {
                continue;
            };
            debug!("selected suite {} ({:#06x})", suite.name, suite.id);
            let cert = cert.clone();
            self.ctx.chosen_suite = Some(suite);
            self.ctx.chosen_cert = Some(cert);
            self.ctx.chosen_curve = curve;
            return Ok(());
        }
        Err(Error::HandshakeFailure)
    }

    /// First server-preferred curve the client also offered.
    fn pick_curve(&self) -> Option<CurveId> {
        if !self.ctx.curves_ext {
            return None;
        }
        self.config
            .curves
            .iter()
            .copied()
            .find(|c| self.ctx.curves.contains(c))
    }

    // ─────────────────────────────────────────────────────────────────
    // Server flight
    // ─────────────────────────────────────────────────────────────────

    fn send_msg(
        &mut self,
        sink: &mut dyn RecordSink,
        typ: HandshakeType,
        body: &[u8],
    ) -> Result<(), Error> {
        let msg = handshake_message(typ, body);
        self.collab.transcript.update(&msg);
        sink.send_handshake(&msg)
    }

    fn write_server_flight(&mut self, sink: &mut dyn RecordSink) -> Result<(), Error> {
        let suite = self.ctx.chosen_suite.ok_or(Error::External("no suite selected"))?;

        // ServerHello: 4-byte time prefix then 28 random bytes.
        let now = self.collab.clock.unix_time() as u32;
        self.ctx.randoms[32..36].copy_from_slice(&now.to_be_bytes());
        let mut tail = [0u8; 28];
        self.collab.rng.fill_bytes(&mut tail);
        self.ctx.randoms[36..].copy_from_slice(&tail);

        let mut body = Vec::with_capacity(128);
        body.extend_from_slice(&TLS12);
        body.extend_from_slice(&self.ctx.randoms[32..]);
        put_vec8(&mut body, &self.ctx.session_id);
        put_u16(&mut body, suite.id);
        body.push(0); // null compression
        let exts = extensions::write_server_extensions(&self.ctx, suite.kx == KeyExchange::Ecdhe);
        if !exts.is_empty() {
            put_u16(&mut body, exts.len() as u16);
            body.extend_from_slice(&exts);
        }
        self.send_msg(sink, HandshakeType::ServerHello, &body)?;

        if self.ctx.resume {
            // Abbreviated handshake: straight to ChangeCipherSpec and
            // Finished; the client's pair follows.
            self.collab.keys.derive_keys(suite, &self.ctx.master, &self.ctx.randoms)?;
            self.state = HandshakeState::ServerChangeCipherSpec;
            sink.send_change_cipher_spec()?;
            self.state = HandshakeState::ServerFinished;
            self.send_server_finished(sink)?;
            self.state = HandshakeState::ClientChangeCipherSpec;
            return Ok(());
        }

        // Certificate.
        self.state = HandshakeState::ServerCertificate;
        let chain = self
            .ctx
            .chosen_cert
            .as_ref()
            .ok_or(Error::External("no certificate selected"))?
            .chain
            .clone();
        let mut certs = Vec::new();
        for der in &chain {
            put_u24(&mut certs, der.len() as u32);
            certs.extend_from_slice(der);
        }
        let mut body = Vec::with_capacity(certs.len() + 3);
        put_u24(&mut body, certs.len() as u32);
        body.extend_from_slice(&certs);
        self.send_msg(sink, HandshakeType::Certificate, &body)?;

        // ServerKeyExchange for the ephemeral suites.
        if suite.ephemeral() {
            self.state = HandshakeState::ServerKeyExchange;
            let body = self.build_server_key_exchange(suite)?;
            self.send_msg(sink, HandshakeType::ServerKeyExchange, &body)?;
        }

        // ServerHelloDone. CertificateRequest stays disabled in this
        // revision.
        self.state = HandshakeState::ServerHelloDone;
        self.send_msg(sink, HandshakeType::ServerHelloDone, &[])?;

        self.state = if self.collab.peer_certs.is_some() {
            HandshakeState::ClientCertificate
        } else {
            HandshakeState::ClientKeyExchange
        };
        Ok(())
    }

    fn build_server_key_exchange(&mut self, suite: &SuiteInfo) -> Result<Vec<u8>, Error> {
        let params = match suite.kx {
            KeyExchange::Ecdhe => {
                let curve = self.ctx.chosen_curve.ok_or(Error::External("no curve chosen"))?;
                let (ecdh, params) = EcdhContext::make_params(curve, &mut *self.collab.rng)?;
                debug!("ECDHE on {}", curve.name());
                self.ctx.kx = Some(KxContext::Ecdh(ecdh));
                params
            }
            KeyExchange::Dhe => {
                let dh_params = self.config.dh.as_ref().ok_or(Error::FeatureUnavailable)?;
                let (dh, params) = DhContext::make_params(dh_params, &mut *self.collab.rng)?;
                debug!("DHE with a {}-bit modulus", dh.p.bit_len());
                self.ctx.kx = Some(KxContext::Dh(dh));
                params
            }
            KeyExchange::Rsa => return Err(Error::External("static RSA has no key exchange")),
        };

        // Signature over client_random || server_random || params.
        let cert = self.ctx.chosen_cert.as_ref().ok_or(Error::External("no certificate"))?;
        let hash_alg = self
            .ctx
            .sig_hash_for(suite.cert_alg)
            .ok_or(Error::HandshakeFailure)?;
        let mut signed = Vec::with_capacity(64 + params.len());
        signed.extend_from_slice(&self.ctx.randoms);
        signed.extend_from_slice(&params);
        let digest = self.collab.md.digest(hash_alg, &signed);
        let sig = cert.key.sign(hash_alg, &digest, &mut *self.collab.rng)?;

        let mut body = params;
        body.push(hash_alg.tls_id());
        body.push(suite.cert_alg.tls_id());
        put_u16(&mut body, sig.len() as u16);
        body.extend_from_slice(&sig);
        Ok(body)
    }

    // ─────────────────────────────────────────────────────────────────
    // Client flight
    // ─────────────────────────────────────────────────────────────────

    fn handle_client_message(
        &mut self,
        hdr: [u8; 4],
        body: &[u8],
        sink: &mut dyn RecordSink,
    ) -> Result<(), Error> {
        let typ = hdr[0];
        match (self.state, HandshakeType::from_u8(typ)) {
            (HandshakeState::ClientCertificate, Some(HandshakeType::Certificate)) => {
                self.handle_client_certificate(hdr, body)
            }
            (
                HandshakeState::ClientCertificate | HandshakeState::ClientKeyExchange,
                Some(HandshakeType::ClientKeyExchange),
            ) => self.handle_client_key_exchange(hdr, body),
            (HandshakeState::CertificateVerify, Some(HandshakeType::CertificateVerify)) => {
                self.handle_certificate_verify(hdr, body)
            }
            (HandshakeState::ClientFinished, Some(HandshakeType::Finished)) => {
                self.handle_client_finished(hdr, body, sink)
            }
            _ => Err(Error::UnexpectedMessage),
        }
    }

    fn handle_client_certificate(&mut self, hdr: [u8; 4], body: &[u8]) -> Result<(), Error> {
        let Some(parser) = self.collab.peer_certs.as_ref() else {
            return Err(Error::UnexpectedMessage);
        };
        // An empty chain (three zero length bytes) means no certificate.
        if body != [0, 0, 0] {
            self.peer_cert = Some(parser.parse(body)?);
        }
        self.collab.transcript.update(&hdr);
        self.collab.transcript.update(body);
        self.state = HandshakeState::ClientKeyExchange;
        Ok(())
    }

    fn handle_client_key_exchange(&mut self, hdr: [u8; 4], body: &[u8]) -> Result<(), Error> {
        let suite = self.ctx.chosen_suite.ok_or(Error::External("no suite selected"))?;

        let premaster: Zeroizing<Vec<u8>> = match suite.kx {
            KeyExchange::Ecdhe => {
                let Some(KxContext::Ecdh(ecdh)) = self.ctx.kx.as_mut() else {
                    return Err(Error::External("missing ECDH state"));
                };
                ecdh.read_public(body)?;
                ecdh.derive(&mut *self.collab.rng)?
            }
            KeyExchange::Dhe => {
                let Some(KxContext::Dh(dh)) = self.ctx.kx.as_mut() else {
                    return Err(Error::External("missing DH state"));
                };
                dh.read_public(body)?;
                dh.derive()?
            }
            KeyExchange::Rsa => {
                let cert = self.ctx.chosen_cert.as_ref().ok_or(Error::External("no certificate"))?;
                let pms = rsa_premaster(
                    body,
                    cert.key.as_ref(),
                    self.ctx.client_version,
                    &mut *self.collab.rng,
                )?;
                Zeroizing::new(pms.to_vec())
            }
        };

        self.collab.transcript.update(&hdr);
        self.collab.transcript.update(body);

        let session_hash = if self.ctx.extended_ms {
            Some(self.collab.transcript.finish(suite.mac))
        } else {
            None
        };
        let master = self.collab.keys.derive_master(
            suite,
            &premaster,
            &self.ctx.randoms,
            session_hash.as_deref(),
        )?;
        *self.ctx.master = master;
        self.collab.keys.derive_keys(suite, &self.ctx.master, &self.ctx.randoms)?;

        self.state = if self.peer_cert.is_some() {
            HandshakeState::CertificateVerify
        } else {
            HandshakeState::ClientChangeCipherSpec
        };
        Ok(())
    }

    fn handle_certificate_verify(&mut self, hdr: [u8; 4], body: &[u8]) -> Result<(), Error> {
        let Some(peer) = self.peer_cert.as_ref() else {
            return Err(Error::UnexpectedMessage);
        };
        if body.len() < 4 {
            return Err(Error::DecodeError);
        }
        let hash_alg = HashAlg::from_tls_id(body[0]).ok_or(Error::IllegalParameter)?;
        let sig_alg =
            crate::collab::PkAlg::from_tls_id(body[1]).ok_or(Error::IllegalParameter)?;
        let sig_len = u16::from_be_bytes([body[2], body[3]]) as usize;
        if sig_len != body.len() - 4 {
            return Err(Error::SigLenMismatch);
        }
        if !peer.can_do(sig_alg) {
            return Err(Error::BadCertificateVerify);
        }
        let digest = self.collab.transcript.finish(hash_alg);
        peer.verify(hash_alg, &digest, &body[4..])
            .map_err(|_| Error::VerifyFailed)?;
        self.collab.transcript.update(&hdr);
        self.collab.transcript.update(body);
        self.state = HandshakeState::ClientChangeCipherSpec;
        Ok(())
    }

    fn handle_client_finished(
        &mut self,
        hdr: [u8; 4],
        body: &[u8],
        sink: &mut dyn RecordSink,
    ) -> Result<(), Error> {
        let suite = self.ctx.chosen_suite.ok_or(Error::External("no suite selected"))?;
        if body.len() != FINISHED_LEN {
            return Err(Error::BadFinished);
        }
        let transcript_hash = self.collab.transcript.finish(suite.mac);
        let expected =
            self.collab
                .keys
                .finished(suite, &self.ctx.master, "client finished", &transcript_hash);
        if !ct_bytes_eq(body, &expected) {
            return Err(Error::BadFinished);
        }
        self.collab.transcript.update(&hdr);
        self.collab.transcript.update(body);
        trace!("client Finished verified");

        if self.ctx.resume {
            return self.wrapup();
        }

        if self.ctx.new_session_ticket {
            self.send_new_session_ticket(sink)?;
        }
        self.state = HandshakeState::ServerChangeCipherSpec;
        sink.send_change_cipher_spec()?;
        self.state = HandshakeState::ServerFinished;
        self.send_server_finished(sink)?;
        self.wrapup()
    }

    fn send_server_finished(&mut self, sink: &mut dyn RecordSink) -> Result<(), Error> {
        let suite = self.ctx.chosen_suite.ok_or(Error::External("no suite selected"))?;
        let transcript_hash = self.collab.transcript.finish(suite.mac);
        let verify =
            self.collab
                .keys
                .finished(suite, &self.ctx.master, "server finished", &transcript_hash);
        self.send_msg(sink, HandshakeType::Finished, &verify)
    }

    fn send_new_session_ticket(&mut self, sink: &mut dyn RecordSink) -> Result<(), Error> {
        let suite = self.ctx.chosen_suite.ok_or(Error::External("no suite selected"))?;
        let Some(tickets) = self.config.tickets.as_ref() else {
            return Err(Error::External("ticket writer missing"));
        };
        let session = Session {
            suite_id: suite.id,
            master: *self.ctx.master,
            extended_ms: self.ctx.extended_ms,
            session_id: self.ctx.session_id.clone(),
        };
        let (blob, lifetime) = tickets.write(&session)?;
        let mut body = Vec::with_capacity(6 + blob.len());
        put_u32(&mut body, lifetime);
        put_u16(&mut body, blob.len() as u16);
        body.extend_from_slice(&blob);
        self.send_msg(sink, HandshakeType::NewSessionTicket, &body)
    }

    fn wrapup(&mut self) -> Result<(), Error> {
        self.state = HandshakeState::Wrapup;
        if !self.ctx.resume && !self.ctx.session_id.is_empty() {
            if let Some(cache) = &self.config.session_cache {
                let suite = self.ctx.chosen_suite.ok_or(Error::External("no suite selected"))?;
                cache.put(Session {
                    suite_id: suite.id,
                    master: *self.ctx.master,
                    extended_ms: self.ctx.extended_ms,
                    session_id: self.ctx.session_id.clone(),
                });
            }
        }
        // Ephemeral key material is no longer needed.
        self.ctx.kx = None;
        self.state = HandshakeState::HandshakeOver;
        debug!("handshake complete (resumed: {})", self.ctx.resume);
        Ok(())
    }
}

/// First certificate in the vhost usable with the suite.
fn pick_cert<'v>(
    vhost: &'v Vhost,
    suite: &SuiteInfo,
    ctx: &HandshakeContext,
) -> Option<&'v ServerCert> {
    vhost.certs.iter().find(|cert| {
        if cert.alg != suite.cert_alg || !cert.key.can_do(suite.cert_alg) {
            return false;
        }
        // An ECDSA certificate is only usable when the client accepts
        // its curve.
        if let Some(curve) = cert.curve {
            if ctx.curves_ext && !ctx.curves.contains(&curve) {
                return false;
            }
        }
        true
    })
}
