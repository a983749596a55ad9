//! Key-exchange helpers: ECDHE and DHE parameter generation and shared
//! secret derivation, and the RSA premaster decryption with the
//! Bleichenbacher countermeasure.

use core::cmp::Ordering;

use bignum::{ExpScratch, Mpi};
use common::{Cursor, put_vec16};
use ecp::{CurveId, CurveKind, Group, Point};
use rand_core::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::collab::PrivateKey;
use crate::context::DhParams;
use crate::error::Error;

/// Acceptable DHE modulus sizes in bits.
const DH_MIN_BITS: usize = 1024;
const DH_MAX_BITS: usize = 4096;

/// Live key-exchange state for one handshake.
pub enum KxContext {
    Ecdh(EcdhContext),
    Dh(DhContext),
}

// ─────────────────────────────────────────────────────────────────────────────
// ECDHE
// ─────────────────────────────────────────────────────────────────────────────

/// Ephemeral ECDH state: group, our key pair, and the peer's point.
pub struct EcdhContext {
    pub grp: Group,
    d: Mpi,
    pub q: Point,
    qp: Option<Point>,
}

impl EcdhContext {
    /// Generate an ephemeral key pair on `curve` and encode the
    /// ServerKeyExchange parameters: `ECParameters || ECPoint`.
    pub fn make_params(curve: CurveId, rng: &mut dyn RngCore) -> Result<(Self, Vec<u8>), Error> {
        let grp = Group::new(curve)?;
        let d = grp.gen_privkey(rng)?;
        let g = grp.generator().clone();
        let q = grp.mul(&d, &g, Some(rng))?;
        let mut params = Vec::new();
        grp.tls_write_group(&mut params);
        grp.tls_write_point(&q, &mut params)?;
        Ok((EcdhContext { grp, d, q, qp: None }, params))
    }

    /// Parse the client's ECPoint from a ClientKeyExchange body; the
    /// body must contain exactly the point vector.
    pub fn read_public(&mut self, body: &[u8]) -> Result<(), Error> {
        let mut c = Cursor::new(body);
        let pt = self.grp.tls_read_point(&mut c).map_err(|_| Error::DecodeError)?;
        if !c.is_empty() {
            return Err(Error::DecodeError);
        }
        self.grp.check_pubkey(&pt).map_err(|_| Error::InvalidKey)?;
        self.qp = Some(pt);
        Ok(())
    }

    /// Compute the premaster: the x-coordinate of `d * Qp`, padded to
    /// the field width (little-endian for Curve25519 per RFC 8422).
    pub fn derive(&mut self, rng: &mut dyn RngCore) -> Result<Zeroizing<Vec<u8>>, Error> {
        let qp = self.qp.as_ref().ok_or(Error::BadClientKeyExchange)?;
        let z = self.grp.mul(&self.d, qp, Some(rng))?;
        if z.is_zero() {
            return Err(Error::InvalidKey);
        }
        let len = self.grp.p_byte_len();
        let mut secret = z.x.to_bytes_be(len).map_err(|_| Error::BufferTooSmall)?;
        if self.grp.kind() == CurveKind::Montgomery {
            secret.reverse();
        }
        Ok(Zeroizing::new(secret))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DHE
// ─────────────────────────────────────────────────────────────────────────────

/// Ephemeral finite-field DH state.
pub struct DhContext {
    pub p: Mpi,
    pub g: Mpi,
    x: Mpi,
    pub gx: Mpi,
    gy: Option<Mpi>,
    scratch: ExpScratch,
}

impl DhContext {
    /// Validate the configured group, draw the ephemeral exponent, and
    /// encode the ServerKeyExchange parameters `P || G || Ys`.
    pub fn make_params(params: &DhParams, rng: &mut dyn RngCore) -> Result<(Self, Vec<u8>), Error> {
        let bits = params.p.bit_len();
        if !(DH_MIN_BITS..=DH_MAX_BITS).contains(&bits) || params.g.cmp_int(2) == Ordering::Less {
            return Err(Error::FeatureUnavailable);
        }
        let p = params.p.clone();
        let g = params.g.clone();
        let mut scratch = ExpScratch::new();

        let p_len = p.byte_len();
        let mut x = Mpi::new();
        let mut ok = false;
        for _ in 0..30 {
            x.fill_random(p_len, rng);
            x.shift_r(8 * p_len - bits + 1);
            if x.cmp_int(2) != Ordering::Less {
                ok = true;
                break;
            }
        }
        if !ok {
            return Err(Error::External("rng kept yielding tiny DH exponents"));
        }
        let gx = g.exp_mod(&x, &p, &mut scratch)?;
        if !dh_public_in_range(&gx, &p) {
            return Err(Error::InvalidKey);
        }

        let mut out = Vec::new();
        put_vec16(&mut out, &p.to_bytes_be(p_len).map_err(|_| Error::BufferTooSmall)?);
        put_vec16(&mut out, &g.to_bytes_be(g.byte_len()).map_err(|_| Error::BufferTooSmall)?);
        put_vec16(&mut out, &gx.to_bytes_be(p_len).map_err(|_| Error::BufferTooSmall)?);
        Ok((DhContext { p, g, x, gx, gy: None, scratch }, out))
    }

    /// Parse the client's public value `Yc` from a ClientKeyExchange
    /// body.
    pub fn read_public(&mut self, body: &[u8]) -> Result<(), Error> {
        let mut c = Cursor::new(body);
        let yc = c.vec16().map_err(|_| Error::DecodeError)?;
        if !c.is_empty() {
            return Err(Error::DecodeError);
        }
        let yc = Mpi::from_binary(yc);
        if !dh_public_in_range(&yc, &self.p) {
            return Err(Error::InvalidKey);
        }
        self.gy = Some(yc);
        Ok(())
    }

    /// `K = Yc^x mod P`, leading zero bytes stripped per RFC 5246.
    pub fn derive(&mut self) -> Result<Zeroizing<Vec<u8>>, Error> {
        let gy = self.gy.as_ref().ok_or(Error::BadClientKeyExchange)?;
        let k = gy.exp_mod(&self.x, &self.p, &mut self.scratch)?;
        let out = k.to_bytes_be(k.byte_len()).map_err(|_| Error::BufferTooSmall)?;
        Ok(Zeroizing::new(out))
    }
}

/// A DH public value must lie in `[2, P-2]`.
fn dh_public_in_range(y: &Mpi, p: &Mpi) -> bool {
    if y.cmp_int(2) == Ordering::Less {
        return false;
    }
    let limit = p - &Mpi::from_int(2);
    y.cmp_mpi(&limit) != Ordering::Greater
}

// ─────────────────────────────────────────────────────────────────────────────
// RSA premaster
// ─────────────────────────────────────────────────────────────────────────────

/// Decrypt an RSA-encrypted premaster without opening a padding oracle.
///
/// A random 48-byte fake premaster is always generated; a mask derived
/// from (decrypt status | length mismatch | version mismatch) with bit
/// operations only selects byte-wise between the fake and the decrypted
/// value. The handshake proceeds either way and a corrupted ciphertext
/// only surfaces when the Finished MAC fails.
pub fn rsa_premaster(
    body: &[u8],
    key: &dyn PrivateKey,
    client_version: [u8; 2],
    rng: &mut dyn RngCore,
) -> Result<Zeroizing<[u8; 48]>, Error> {
    let mut c = Cursor::new(body);
    let ciphertext = c.vec16().map_err(|_| Error::DecodeError)?;
    if !c.is_empty() || ciphertext.len() != key.len() {
        return Err(Error::DecodeError);
    }

    let mut peer = [0u8; 48];
    let (status, olen): (u32, usize) = match key.decrypt(ciphertext, &mut peer) {
        Ok(n) => (0, n),
        Err(_) => (1, 0),
    };

    let mut fake = [0u8; 48];
    rng.fill_bytes(&mut fake);

    let mut diff: u32 = status;
    diff |= (olen as u32) ^ 48;
    diff |= u32::from(peer[0] ^ client_version[0]);
    diff |= u32::from(peer[1] ^ client_version[1]);

    // mask = 0xFF when anything was off, 0x00 on a clean decrypt.
    let mask = (((diff | diff.wrapping_neg()) >> 31) as u8).wrapping_neg();

    let mut pms = Zeroizing::new([0u8; 48]);
    for i in 0..48 {
        pms[i] = (fake[i] & mask) | (peer[i] & !mask);
    }
    peer.zeroize();
    fake.zeroize();
    Ok(pms)
}
