//! Division with remainder (Knuth Algorithm D) and modular reduction.

use core::cmp::Ordering;

use crate::limb::{LIMB_BITS, Limb};
use crate::mpi::Mpi;
use crate::Error;

impl Mpi {
    /// Truncated division: returns `(quotient, remainder)` with
    /// `self = quotient * divisor + remainder` and the remainder carrying
    /// the sign of `self`.
    pub fn div_rem(&self, divisor: &Mpi) -> Result<(Mpi, Mpi), Error> {
        if divisor.is_zero() {
            return Err(Error::BadInput);
        }
        if self.cmp_abs(divisor) == Ordering::Less {
            return Ok((Mpi::new(), self.clone()));
        }
        if divisor.cmp_abs(&Mpi::from_int(1)) == Ordering::Equal {
            let mut q = self.abs();
            q.sign = self.sign * divisor.sign;
            return Ok((q, Mpi::new()));
        }

        // Normalise so the divisor's top limb has its high bit set; the
        // trial quotients below then rarely need correction.
        let shift = (LIMB_BITS - divisor.bit_len() % LIMB_BITS) % LIMB_BITS;
        let mut x = self.abs();
        let mut y = divisor.abs();
        x.shift_l(shift);
        y.shift_l(shift);

        let n = x.used() - 1;
        let t = y.used() - 1;
        let mut q = Mpi { sign: 1, used: 0, limbs: vec![0; n - t + 1] };

        // Top correction: align the divisor with the dividend's top limb.
        let mut y_top = y.clone();
        y_top.shift_l(LIMB_BITS * (n - t));
        while x.cmp_abs(&y_top) != Ordering::Less {
            q.limbs[n - t] += 1;
            x = &x - &y_top;
        }

        for i in ((t + 1)..=n).rev() {
            let pos = i - t - 1;

            // Two-limb by one-limb trial quotient, clamped.
            let mut q_est: Limb = if x.limb(i) >= y.limb(t) {
                Limb::MAX
            } else {
                let num = ((x.limb(i) as u128) << LIMB_BITS) | x.limb(i - 1) as u128;
                (num / y.limb(t) as u128) as Limb
            };

            // Conservative correction: decrement while the two-limb
            // divisor times the estimate overshoots the three-limb head
            // of the dividend.
            let head = Mpi::from_limbs(vec![
                if i >= 2 { x.limb(i - 2) } else { 0 },
                x.limb(i - 1),
                x.limb(i),
            ]);
            let y2 = Mpi::from_limbs(vec![if t >= 1 { y.limb(t - 1) } else { 0 }, y.limb(t)]);
            while y2.mul_int(q_est).cmp_abs(&head) == Ordering::Greater {
                q_est -= 1;
            }

            let mut sub = y.mul_int(q_est);
            sub.shift_l(LIMB_BITS * pos);
            x = &x - &sub;
            if x.sign() < 0 {
                let mut back = y.clone();
                back.shift_l(LIMB_BITS * pos);
                x = &x + &back;
                q_est -= 1;
            }
            q.limbs[pos] = q_est;
        }

        q.fixup_used();
        if !q.is_zero() {
            q.sign = self.sign * divisor.sign;
        }
        x.shift_r(shift);
        if !x.is_zero() {
            x.sign = self.sign;
        }
        Ok((q, x))
    }

    /// Euclidean reduction: the representative of `self` in `[0, m)`.
    ///
    /// `m` must be positive.
    pub fn modulo(&self, m: &Mpi) -> Result<Mpi, Error> {
        if m.sign() < 0 || m.is_zero() {
            return Err(Error::BadInput);
        }
        let (_, mut r) = self.div_rem(m)?;
        while r.cmp_int(0) == Ordering::Less {
            r = &r + m;
        }
        while r.cmp_mpi(m) != Ordering::Less {
            r = &r - m;
        }
        Ok(r)
    }

    /// Reduce modulo a single positive limb.
    pub fn mod_int(&self, m: Limb) -> Result<Limb, Error> {
        if m == 0 {
            return Err(Error::BadInput);
        }
        if m == 1 {
            return Ok(0);
        }
        let mut r: u128 = 0;
        for i in (0..self.used()).rev() {
            r = ((r << LIMB_BITS) | self.limb(i) as u128) % m as u128;
        }
        let mut r = r as Limb;
        if self.sign() < 0 && r > 0 {
            r = m - r;
        }
        Ok(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mpi(v: i64) -> Mpi {
        Mpi::from_int(v)
    }

    #[test]
    fn test_div_native_crosscheck() {
        let cases: [(i64, i64); 8] = [
            (100, 7),
            (7, 100),
            (0, 5),
            (-100, 7),
            (100, -7),
            (-100, -7),
            (u32::MAX as i64 * 7919, 7919),
            (1, 1),
        ];
        for (a, b) in cases {
            let (q, r) = mpi(a).div_rem(&mpi(b)).unwrap();
            assert_eq!(q.cmp_int(a / b), Ordering::Equal, "{a} / {b}");
            assert_eq!(r.cmp_int(a % b), Ordering::Equal, "{a} % {b}");
        }
    }

    #[test]
    fn test_div_by_zero() {
        assert_eq!(mpi(5).div_rem(&mpi(0)), Err(Error::BadInput));
        assert_eq!(mpi(5).modulo(&mpi(0)), Err(Error::BadInput));
    }

    #[test]
    fn test_div_reconstruction_multilimb() {
        let a = Mpi::from_hex(
            "1f3a9b0c8d7e6f5a4b3c2d1e0f998877665544332211fedcba9876543210aabbccddeeff00112233",
        )
        .unwrap();
        let b = Mpi::from_hex("fedcba98765432100123456789abcdef1122334455667788").unwrap();
        let (q, r) = a.div_rem(&b).unwrap();
        assert_eq!(&(&q * &b) + &r, a);
        assert_eq!(r.cmp_abs(&b), Ordering::Less);
        assert!(r.sign() > 0);
    }

    #[test]
    fn test_div_trial_quotient_correction() {
        // Dividend engineered so the first trial quotient overshoots:
        // top limbs equal forces the MAX clamp path.
        let a = Mpi::from_hex("ffffffffffffffff000000000000000000000000000000ff").unwrap();
        let b = Mpi::from_hex("ffffffffffffffff0000000000000001").unwrap();
        let (q, r) = a.div_rem(&b).unwrap();
        assert_eq!(&(&q * &b) + &r, a);
        assert_eq!(r.cmp_abs(&b), Ordering::Less);
    }

    #[test]
    fn test_modulo_range() {
        let m = mpi(97);
        for a in [-300i64, -97, -1, 0, 1, 96, 97, 98, 300] {
            let r = mpi(a).modulo(&m).unwrap();
            let expect = a.rem_euclid(97);
            assert_eq!(r.cmp_int(expect), Ordering::Equal, "{a} mod 97");
        }
        // Negative modulus is rejected.
        assert_eq!(mpi(5).modulo(&mpi(-7)), Err(Error::BadInput));
    }

    #[test]
    fn test_mod_int() {
        let a = Mpi::from_hex("0123456789abcdef0123456789abcdef").unwrap();
        let r = a.mod_int(0xFFFF_FFFB).unwrap();
        // Cross-check with full reduction.
        let full = a.modulo(&Mpi::from_int(0xFFFF_FFFB)).unwrap();
        assert_eq!(full.cmp_int(r as i64), Ordering::Equal);
        assert_eq!(mpi(-5).mod_int(3).unwrap(), 1);
        assert_eq!(mpi(9).mod_int(1).unwrap(), 0);
        assert_eq!(mpi(9).mod_int(0), Err(Error::BadInput));
    }
}
