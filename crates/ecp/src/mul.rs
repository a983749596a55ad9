//! Scalar multiplication: constant-time comb for short Weierstrass
//! curves, the Montgomery ladder for Curve25519, key-pair generation,
//! and the variable-time double-scalar `muladd` used on public inputs.

use core::cmp::Ordering;

use bignum::{Limb, Mpi, limb};
use rand_core::RngCore;

use crate::group::{CurveKind, Group};
use crate::point::Point;
use crate::{Error, WINDOW_SIZE};

/// 0/1 equality flag for table indices, without branching.
#[inline]
fn ct_eq_u8(a: u8, b: u8) -> u8 {
    1 ^ limb::ct_nonzero((a ^ b) as Limb) as u8
}

/// Comb recoding of a scalar known to be odd: splits `m` into `d + 1`
/// interleaved comb words of `w` bits each and rewrites them so every
/// word is odd, using a signed borrow carried in bit 7. No branch
/// depends on the scalar bits.
fn comb_recode(m: &Mpi, d: usize, w: usize) -> Vec<u8> {
    let mut x = vec![0u8; d + 1];
    for i in 0..d {
        for j in 0..w {
            x[i] |= m.get_bit(i + d * j) << j;
        }
    }
    let mut c: u8 = 0;
    for i in 1..=d {
        // Fold the pending carry into this word.
        let cc = x[i] & c;
        x[i] ^= c;
        c = cc << 1;
        // If the word is even, borrow the previous (odd) word and
        // negate it, keeping the represented value unchanged.
        let adjust = 1 - (x[i] & 1);
        c |= x[i] & (x[i - 1] * adjust);
        x[i] ^= x[i - 1] * adjust;
        x[i - 1] |= adjust << 7;
    }
    x
}

impl Group {
    /// Build a comb table for `point`: entry `i` holds
    /// `point + sum(2^(d(l+1)) point for set bits l of i)`, normalised
    /// to affine form.
    pub(crate) fn precompute_comb(
        &self,
        point: &Point,
        w: usize,
        d: usize,
    ) -> Result<Vec<Point>, Error> {
        let len = 1usize << (w - 1);
        let mut t = vec![Point::zero(); len];
        t[0] = point.clone();

        // Power entries: T[2^k] = 2^(d(k+1)) * point.
        let mut powers = Vec::new();
        let mut i = 1;
        while i < len {
            let mut cur = t[i >> 1].clone();
            for _ in 0..d {
                cur = self.double_jac(&cur)?;
            }
            t[i] = cur;
            powers.push(i);
            i <<= 1;
        }
        self.normalize_many(&mut t, &powers)?;

        // Composite entries by single additions; the j = 0 step folds
        // the base point into T[i] itself.
        let mut fresh = Vec::new();
        let mut i = 1;
        while i < len {
            for j in (0..i).rev() {
                t[i + j] = self.add_mixed(&t[j], &t[i])?;
                fresh.push(i + j);
            }
            i <<= 1;
        }
        self.normalize_many(&mut t, &fresh)?;
        Ok(t)
    }

    /// Constant-time selection of the comb entry for a recoded digit:
    /// scans the whole table with a masked copy and conditionally
    /// negates by the digit's sign bit.
    fn select_comb(&self, table: &[Point], digit: u8) -> Point {
        let idx = (digit & 0x7F) >> 1;
        let mut r = Point::from_affine(Mpi::new(), Mpi::new());
        for (j, entry) in table.iter().enumerate() {
            let m = ct_eq_u8(j as u8, idx);
            r.x.safe_cond_assign(&entry.x, m);
            r.y.safe_cond_assign(&entry.y, m);
        }
        self.safe_invert(&mut r, digit >> 7);
        r
    }

    /// Comb scalar multiplication with optional point randomisation.
    fn mul_comb(
        &self,
        m: &Mpi,
        point: &Point,
        rng: Option<&mut dyn RngCore>,
    ) -> Result<Point, Error> {
        if m.sign() < 0 || m.cmp_mpi(&self.n) == Ordering::Greater {
            return Err(Error::InvalidKey);
        }

        // The generator uses the table precomputed at group load; other
        // points pay for an ad-hoc table with a narrower window.
        let owned;
        let (table, w): (&[Point], usize) = if point == &self.g && !self.comb.is_empty() {
            (&self.comb, WINDOW_SIZE)
        } else {
            let w = if self.nbits() >= 384 { 5 } else { 4 };
            let d = self.nbits().div_ceil(w);
            owned = self.precompute_comb(point, w, d)?;
            (&owned, w)
        };
        let d = self.nbits().div_ceil(w);

        // The comb needs an odd scalar: use n - m for even m and flip
        // the result, selecting without branches.
        let m_odd = m.get_bit(0);
        let mut scalar = &self.n - m;
        scalar.safe_cond_assign(m, m_odd);

        let digits = comb_recode(&scalar, d, w);
        let mut r = self.select_comb(table, digits[d]);
        if let Some(rng) = rng {
            self.randomize_jac(&mut r, rng)?;
        }
        for i in (0..d).rev() {
            r = self.double_jac(&r)?;
            let sel = self.select_comb(table, digits[i]);
            r = self.add_mixed(&r, &sel)?;
        }
        self.safe_invert(&mut r, 1 - m_odd);
        self.normalize(&mut r)?;
        Ok(r)
    }

    /// Montgomery ladder on the x-coordinate, constant time via
    /// conditional swaps.
    fn mul_ladder(
        &self,
        m: &Mpi,
        point: &Point,
        rng: Option<&mut dyn RngCore>,
    ) -> Result<Point, Error> {
        let mut rx = Mpi::from_int(1);
        let mut rz = Mpi::new();
        let mut sx = point.x.clone();
        let mut sz = Mpi::from_int(1);

        // Blind the projective representation of the base point.
        if let Some(rng) = rng {
            let l = self.draw_lambda(rng)?;
            sx = self.fe_mul(&sx, &l)?;
            sz = l;
        }

        for i in (0..m.bit_len()).rev() {
            let b = m.get_bit(i);
            rx.safe_cond_swap(&mut sx, b);
            rz.safe_cond_swap(&mut sz, b);

            let va = self.fe_add(&rx, &rz);
            let aa = self.fe_sqr(&va)?;
            let vb = self.fe_sub(&rx, &rz);
            let bb = self.fe_sqr(&vb)?;
            let e = self.fe_sub(&aa, &bb);
            let vc = self.fe_add(&sx, &sz);
            let vd = self.fe_sub(&sx, &sz);
            let da = self.fe_mul(&vd, &va)?;
            let cb = self.fe_mul(&vc, &vb)?;

            let t = self.fe_add(&da, &cb);
            sx = self.fe_sqr(&t)?;
            let t = self.fe_sub(&da, &cb);
            sz = self.fe_mul(&point.x, &self.fe_sqr(&t)?)?;
            rx = self.fe_mul(&aa, &bb)?;
            rz = self.fe_mul(&e, &self.fe_add(&bb, &self.fe_mul(&self.a, &e)?))?;

            rx.safe_cond_swap(&mut sx, b);
            rz.safe_cond_swap(&mut sz, b);
        }

        if rz.is_zero() {
            return Ok(Point::zero());
        }
        let zi = self.fe_inv(&rz)?;
        let x = self.fe_mul(&rx, &zi)?;
        Ok(Point { x, y: Mpi::new(), z: Mpi::from_int(1) })
    }

    /// `m * point`, constant time on the scalar. Pass an RNG to enable
    /// coordinate blinding of intermediates.
    pub fn mul(
        &self,
        m: &Mpi,
        point: &Point,
        rng: Option<&mut dyn RngCore>,
    ) -> Result<Point, Error> {
        match self.kind() {
            CurveKind::ShortWeierstrass => self.mul_comb(m, point, rng),
            CurveKind::Montgomery => self.mul_ladder(m, point, rng),
        }
    }

    /// Draw a private scalar for this group.
    pub fn gen_privkey(&self, rng: &mut dyn RngCore) -> Result<Mpi, Error> {
        let n_len = self.nbits().div_ceil(8);
        match self.kind() {
            CurveKind::ShortWeierstrass => {
                for _ in 0..30 {
                    let mut d = Mpi::new();
                    d.fill_random(n_len, rng);
                    d.shift_r(8 * n_len - self.nbits());
                    if d.cmp_int(1) != Ordering::Less && d.cmp_mpi(&self.n) == Ordering::Less {
                        return Ok(d);
                    }
                }
                Err(Error::RandomFailed)
            }
            CurveKind::Montgomery => {
                let mut d = Mpi::new();
                d.fill_random(n_len, rng);
                for b in self.nbits() + 1..8 * n_len {
                    d.set_bit(b, false);
                }
                d.set_bit(self.nbits(), true);
                d.set_bit(0, false);
                d.set_bit(1, false);
                d.set_bit(2, false);
                Ok(d)
            }
        }
    }

    /// Generate an ephemeral key pair `(d, Q = d G)`.
    pub fn gen_keypair(&self, rng: &mut dyn RngCore) -> Result<(Mpi, Point), Error> {
        let d = self.gen_privkey(rng)?;
        let g = self.g.clone();
        let q = self.mul(&d, &g, Some(rng))?;
        Ok((d, q))
    }

    /// `m * P + n * Q` without constant-time guarantees; for public
    /// inputs only (signature verification). `P` and `Q` must be affine.
    pub fn muladd(&self, m: &Mpi, p: &Point, n: &Mpi, q: &Point) -> Result<Point, Error> {
        if self.kind() != CurveKind::ShortWeierstrass {
            return Err(Error::FeatureUnavailable);
        }
        let mu = m.modulo(&self.n)?;
        let nu = n.modulo(&self.n)?;
        let mut pq = self.add_mixed(p, q)?;
        self.normalize(&mut pq)?;
        let bits = mu.bit_len().max(nu.bit_len());
        let mut r = Point::zero();
        for i in (0..bits).rev() {
            r = self.double_jac(&r)?;
            match mu.get_bit(i) | (nu.get_bit(i) << 1) {
                1 => r = self.add_mixed(&r, p)?,
                2 => r = self.add_mixed(&r, q)?,
                3 => r = self.add_mixed(&r, &pq)?,
                _ => {}
            }
        }
        self.normalize(&mut r)?;
        Ok(r)
    }
}
