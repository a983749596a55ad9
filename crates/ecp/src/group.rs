//! Curve groups: loaded domain parameters, field arithmetic, and the
//! specialised fast reductions for the primes that admit one.

use core::cmp::Ordering;

use bignum::{Limb, Mpi};

use crate::curves::{self, CurveId};
use crate::point::Point;
use crate::{Error, WINDOW_SIZE};

/// The two curve shapes in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    /// `y^2 = x^3 + ax + b` over GF(p), Jacobian arithmetic.
    ShortWeierstrass,
    /// `by^2 = x^3 + ax^2 + x` over GF(p), x-only ladder arithmetic.
    Montgomery,
}

/// An elliptic curve group, immutable once constructed.
///
/// [`Group::new`] loads the domain parameters and precomputes the
/// generator comb table, so instances can be shared read-only between
/// connections.
pub struct Group {
    id: CurveId,
    kind: CurveKind,
    /// Field prime.
    pub(crate) p: Mpi,
    /// Curve coefficient `a`; for Montgomery curves this holds `(A+2)/4`.
    pub(crate) a: Mpi,
    /// Curve coefficient `b`; unused for Montgomery curves.
    pub(crate) b: Mpi,
    /// Subgroup order.
    pub(crate) n: Mpi,
    /// Generator with affine coordinates (`Z = 1`).
    pub(crate) g: Point,
    pbits: usize,
    nbits: usize,
    pub(crate) a_is_minus3: bool,
    /// Fast partial reduction specialised for `p`, where available.
    /// The output may exceed `p` by a few multiples; `reduce` finishes
    /// the job.
    modp: Option<fn(&mut Mpi)>,
    /// Comb table of generator combinations, affine, `2^(W-1)` entries.
    pub(crate) comb: Vec<Point>,
}

impl Group {
    /// Load a registered curve and precompute its generator comb table.
    pub fn new(id: CurveId) -> Result<Group, Error> {
        let d = curves::curve_data(id);
        let p = Mpi::from_hex(d.p)?;
        let a = Mpi::from_hex(d.a)?;
        let b = if d.b.is_empty() { Mpi::new() } else { Mpi::from_hex(d.b)? };
        let n = Mpi::from_hex(d.n)?;
        let gx = Mpi::from_hex(d.gx)?;
        let kind = match id {
            CurveId::Curve25519 => CurveKind::Montgomery,
            _ => CurveKind::ShortWeierstrass,
        };
        let g = match kind {
            CurveKind::ShortWeierstrass => Point::from_affine(gx, Mpi::from_hex(d.gy)?),
            CurveKind::Montgomery => Point {
                x: gx,
                y: Mpi::new(),
                z: Mpi::from_int(1),
            },
        };
        let a_is_minus3 =
            kind == CurveKind::ShortWeierstrass && (&a + &Mpi::from_int(3)).cmp_mpi(&p) == Ordering::Equal;
        let modp: Option<fn(&mut Mpi)> = match id {
            CurveId::Secp256r1 => Some(p256_fold),
            CurveId::Secp521r1 => Some(p521_fold),
            CurveId::Curve25519 => Some(p25519_fold),
            _ => None,
        };
        let pbits = p.bit_len();
        let mut grp = Group {
            id,
            kind,
            p,
            a,
            b,
            n,
            g,
            pbits,
            nbits: d.nbits,
            a_is_minus3,
            modp,
            comb: Vec::new(),
        };
        if kind == CurveKind::ShortWeierstrass {
            let comb_d = grp.nbits.div_ceil(WINDOW_SIZE);
            let g = grp.g.clone();
            grp.comb = grp.precompute_comb(&g, WINDOW_SIZE, comb_d)?;
        }
        Ok(grp)
    }

    #[inline]
    pub fn id(&self) -> CurveId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    /// Bit size of the field prime.
    #[inline]
    pub fn pbits(&self) -> usize {
        self.pbits
    }

    /// Bit size of the subgroup order.
    #[inline]
    pub fn nbits(&self) -> usize {
        self.nbits
    }

    /// Bytes per field element on the wire.
    #[inline]
    pub fn p_byte_len(&self) -> usize {
        self.pbits.div_ceil(8)
    }

    /// The generator point.
    #[inline]
    pub fn generator(&self) -> &Point {
        &self.g
    }

    /// The subgroup order.
    #[inline]
    pub fn order(&self) -> &Mpi {
        &self.n
    }

    // ─────────────────────────────────────────────────────────────────────
    // Field arithmetic
    // ─────────────────────────────────────────────────────────────────────

    /// Fully reduce `x` into `[0, p)`.
    pub(crate) fn reduce(&self, x: &mut Mpi) -> Result<(), Error> {
        if let Some(fold) = self.modp {
            fold(x);
            while x.sign() < 0 {
                *x = &*x + &self.p;
            }
            while x.cmp_mpi(&self.p) != Ordering::Less {
                *x = &*x - &self.p;
            }
        } else {
            *x = x.modulo(&self.p)?;
        }
        Ok(())
    }

    pub(crate) fn fe_mul(&self, a: &Mpi, b: &Mpi) -> Result<Mpi, Error> {
        let mut t = a * b;
        self.reduce(&mut t)?;
        Ok(t)
    }

    pub(crate) fn fe_sqr(&self, a: &Mpi) -> Result<Mpi, Error> {
        self.fe_mul(a, a)
    }

    /// `a + b mod p` for operands already in `[0, p)`.
    pub(crate) fn fe_add(&self, a: &Mpi, b: &Mpi) -> Mpi {
        let mut t = a + b;
        if t.cmp_mpi(&self.p) != Ordering::Less {
            t = &t - &self.p;
        }
        t
    }

    /// `a - b mod p` for operands already in `[0, p)`.
    pub(crate) fn fe_sub(&self, a: &Mpi, b: &Mpi) -> Mpi {
        let mut t = a - b;
        if t.sign() < 0 {
            t = &t + &self.p;
        }
        t
    }

    pub(crate) fn fe_inv(&self, a: &Mpi) -> Result<Mpi, Error> {
        Ok(a.inv_mod(&self.p)?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Key validation
    // ─────────────────────────────────────────────────────────────────────

    /// Validate a peer public point: not at infinity, coordinates in
    /// range, and on the curve. Subgroup membership is not checked; all
    /// registered Weierstrass curves have cofactor 1.
    pub fn check_pubkey(&self, pt: &Point) -> Result<(), Error> {
        match self.kind {
            CurveKind::ShortWeierstrass => {
                if pt.is_zero() || pt.z.cmp_int(1) != Ordering::Equal {
                    return Err(Error::InvalidKey);
                }
                if pt.x.sign() < 0
                    || pt.y.sign() < 0
                    || pt.x.cmp_mpi(&self.p) != Ordering::Less
                    || pt.y.cmp_mpi(&self.p) != Ordering::Less
                {
                    return Err(Error::InvalidKey);
                }
                // y^2 = x^3 + ax + b
                let yy = self.fe_sqr(&pt.y)?;
                let xx = self.fe_sqr(&pt.x)?;
                let mut rhs = self.fe_mul(&xx, &pt.x)?;
                rhs = self.fe_add(&rhs, &self.fe_mul(&self.a, &pt.x)?);
                rhs = self.fe_add(&rhs, &self.b);
                if yy.cmp_mpi(&rhs) != Ordering::Equal {
                    return Err(Error::InvalidKey);
                }
                Ok(())
            }
            CurveKind::Montgomery => {
                if pt.z.cmp_int(1) != Ordering::Equal
                    || pt.x.sign() < 0
                    || pt.x.cmp_mpi(&self.p) != Ordering::Less
                {
                    return Err(Error::InvalidKey);
                }
                Ok(())
            }
        }
    }

    /// Validate a private scalar for this group.
    pub fn check_privkey(&self, d: &Mpi) -> Result<(), Error> {
        match self.kind {
            CurveKind::ShortWeierstrass => {
                if d.cmp_int(1) == Ordering::Less || d.cmp_mpi(&self.n) != Ordering::Less {
                    return Err(Error::InvalidKey);
                }
                Ok(())
            }
            CurveKind::Montgomery => {
                // Clamped scalar: low three bits clear, top bit at nbits.
                if d.get_bit(0) != 0 || d.get_bit(1) != 0 || d.get_bit(2) != 0 {
                    return Err(Error::InvalidKey);
                }
                if d.bit_len() != self.nbits + 1 {
                    return Err(Error::InvalidKey);
                }
                Ok(())
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fast reductions
// ─────────────────────────────────────────────────────────────────────────────

/// Partial reduction modulo `2^521 - 1`: fold the high part down twice.
fn p521_fold(x: &mut Mpi) {
    for _ in 0..2 {
        if x.bit_len() <= 521 {
            break;
        }
        let mut hi = x.clone();
        hi.shift_r(521);
        let mut hi_shifted = hi.clone();
        hi_shifted.shift_l(521);
        let lo = &*x - &hi_shifted;
        *x = &lo + &hi;
    }
}

/// Partial reduction modulo `2^255 - 19`.
fn p25519_fold(x: &mut Mpi) {
    for _ in 0..2 {
        if x.bit_len() <= 255 {
            break;
        }
        let mut hi = x.clone();
        hi.shift_r(255);
        let mut hi_shifted = hi.clone();
        hi_shifted.shift_l(255);
        let lo = &*x - &hi_shifted;
        *x = &lo + &hi.mul_int(19);
    }
}

/// Partial reduction modulo the P-256 prime via the FIPS 186-4 word sums.
///
/// Input is the non-negative product of two field elements (at most 512
/// bits). The result may be negative or exceed `p` by a few multiples;
/// the caller finishes with range correction.
fn p256_fold(x: &mut Mpi) {
    debug_assert!(x.sign() > 0);
    if x.bit_len() <= 256 {
        return;
    }
    let mut c = [0u32; 16];
    for (i, w) in c.iter_mut().enumerate() {
        *w = (x.limb(i / 2) >> (32 * (i % 2))) as u32;
    }
    let t = |i: usize| c[i] as i64;

    let s: [i64; 8] = [
        t(0) + t(8) + t(9) - t(11) - t(12) - t(13) - t(14),
        t(1) + t(9) + t(10) - t(12) - t(13) - t(14) - t(15),
        t(2) + t(10) + t(11) - t(13) - t(14) - t(15),
        t(3) + 2 * (t(11) + t(12)) + t(13) - t(15) - t(8) - t(9),
        t(4) + 2 * (t(12) + t(13)) + t(14) - t(9) - t(10),
        t(5) + 2 * (t(13) + t(14)) + t(15) - t(10) - t(11),
        t(6) + t(13) + 3 * t(14) + 2 * t(15) - t(8) - t(9),
        t(7) + 3 * t(15) + t(8) - t(10) - t(11) - t(12) - t(13),
    ];

    let mut out = [0 as Limb; 4];
    let mut carry: i64 = 0;
    for (k, sk) in s.iter().enumerate() {
        let v = sk + carry;
        out[k / 2] |= ((v & 0xFFFF_FFFF) as Limb) << (32 * (k % 2));
        carry = v >> 32;
    }
    let mut r = Mpi::from_limbs(out.to_vec());
    if carry != 0 {
        // 2^256 = 2^224 - 2^192 - 2^96 + 1 (mod p)
        let fold = Mpi::from_limbs(vec![1, 0xffffffff_00000000, 0xffffffff_ffffffff, 0xfffffffe]);
        let mut adj = fold.mul_int(carry.unsigned_abs());
        if carry < 0 {
            adj.negate();
        }
        r = &r + &adj;
    }
    *x = r;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_all_curves() {
        for &id in CurveId::PREFERRED {
            let grp = Group::new(id).unwrap();
            assert_eq!(grp.pbits(), id.bit_size());
            assert_eq!(grp.p_byte_len(), id.bit_size().div_ceil(8));
        }
    }

    #[test]
    fn test_generator_on_curve() {
        for &id in CurveId::PREFERRED {
            let grp = Group::new(id).unwrap();
            if grp.kind() == CurveKind::ShortWeierstrass {
                grp.check_pubkey(grp.generator()).unwrap_or_else(|e| {
                    panic!("{}: generator fails curve equation: {e}", id.name())
                });
            }
        }
    }

    #[test]
    fn test_nist_a_is_minus_three() {
        for id in [CurveId::Secp256r1, CurveId::Secp384r1, CurveId::Secp521r1] {
            assert!(Group::new(id).unwrap().a_is_minus3);
        }
        assert!(!Group::new(CurveId::Bp256r1).unwrap().a_is_minus3);
    }

    #[test]
    fn test_fast_reduction_matches_generic() {
        for id in [CurveId::Secp256r1, CurveId::Secp521r1, CurveId::Curve25519] {
            let grp = Group::new(id).unwrap();
            // A deterministic sweep of products of wide values.
            let mut a = Mpi::from_hex("0123456789abcdeffedcba9876543210a5a5a5a55a5a5a5a").unwrap();
            for i in 0..16 {
                a = &a * &Mpi::from_int(0x1_0000_0001 + i * 977);
                let a_sq = &a * &a;
                let mut fast = a_sq.clone();
                grp.reduce(&mut fast).unwrap();
                let slow = a_sq.modulo(&grp.p).unwrap();
                assert_eq!(fast, slow, "{} round {i}", id.name());
                a = slow;
            }
        }
    }

    #[test]
    fn test_fe_sub_wraps() {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        let two = Mpi::from_int(2);
        let five = Mpi::from_int(5);
        let r = grp.fe_sub(&two, &five);
        assert_eq!(r, grp.fe_sub(&grp.p.clone(), &Mpi::from_int(3)));
        assert!(r.sign() > 0);
    }

    #[test]
    fn test_check_privkey_weierstrass() {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        assert!(grp.check_privkey(&Mpi::from_int(0)).is_err());
        assert!(grp.check_privkey(&Mpi::from_int(1)).is_ok());
        assert!(grp.check_privkey(&(&grp.n.clone() - &Mpi::from_int(1))).is_ok());
        assert!(grp.check_privkey(&grp.n.clone()).is_err());
    }
}
