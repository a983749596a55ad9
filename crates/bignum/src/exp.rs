//! Montgomery modular exponentiation, binary GCD, and modular inverse.

use core::cmp::Ordering;

use zeroize::Zeroize;

use crate::limb::{self, LIMB_BITS, Limb};
use crate::mpi::{Mpi, mul_acc};
use crate::Error;

/// Upper bound on the sliding-window width.
const WINDOW_MAX: usize = 6;

/// Reusable scratch for [`Mpi::exp_mod`].
///
/// Holds the cached `R^2 mod N` constant (recomputed only when the modulus
/// changes) and the window table allocations. Owned by the calling context;
/// the table entries are wiped on drop like any other `Mpi`.
pub struct ExpScratch {
    rr: Mpi,
    rr_modulus: Mpi,
    window: Vec<Mpi>,
}

impl ExpScratch {
    pub fn new() -> Self {
        ExpScratch {
            rr: Mpi::new(),
            rr_modulus: Mpi::new(),
            window: Vec::new(),
        }
    }
}

impl Default for ExpScratch {
    fn default() -> Self {
        Self::new()
    }
}

/// `-N[0]^-1 mod 2^64` by Newton doubling from a 4-bit seed.
fn mont_init(m0: Limb) -> Limb {
    debug_assert!(m0 & 1 == 1);
    let mut x = m0;
    x = x.wrapping_add((m0.wrapping_add(2) & 4) << 1);
    // Each round doubles the number of correct low bits.
    for _ in 0..5 {
        x = x.wrapping_mul(2u64.wrapping_sub(m0.wrapping_mul(x)));
    }
    x.wrapping_neg()
}

/// Montgomery product `a * b * R^-1 mod n` for `a, b < n`.
///
/// The final subtraction of `n` is applied through a mask so the memory
/// access pattern does not depend on the comparison.
fn mont_mul(a: &Mpi, b: &Mpi, n: &Mpi, mm: Limb) -> Mpi {
    let nl = n.used();
    let mut t = vec![0 as Limb; 2 * nl + 1];
    for i in 0..nl {
        let u0 = a.limb(i);
        let u1 = t[i]
            .wrapping_add(u0.wrapping_mul(b.limb(0)))
            .wrapping_mul(mm);
        mul_acc(&mut t[i..], b.limbs_used(), u0);
        mul_acc(&mut t[i..], n.limbs_used(), u1);
    }

    // Result is t[nl..=2nl] < 2n; subtract n once behind a mask.
    let mut limbs = vec![0 as Limb; nl];
    let mut borrow: Limb = 0;
    let mut diff = vec![0 as Limb; nl + 1];
    for k in 0..=nl {
        let nk = if k < nl { n.limb(k) } else { 0 };
        let (d1, b1) = t[nl + k].overflowing_sub(nk);
        let (d2, b2) = d1.overflowing_sub(borrow);
        diff[k] = d2;
        borrow = (b1 | b2) as Limb;
    }
    // borrow == 1 means t < n: keep t, otherwise keep the difference.
    let keep_t = limb::ct_mask(borrow);
    for k in 0..nl {
        limbs[k] = (t[nl + k] & keep_t) | (diff[k] & !keep_t);
    }
    t.zeroize();
    diff.zeroize();
    Mpi::from_limbs(limbs)
}

impl Mpi {
    /// `self ^ exponent mod modulus`.
    ///
    /// The modulus must be positive and odd, the exponent non-negative.
    /// `scratch` carries the `R^2 mod N` cache and window table across
    /// calls; it may be shared between moduli at the cost of recomputing
    /// the cache.
    pub fn exp_mod(
        &self,
        exponent: &Mpi,
        modulus: &Mpi,
        scratch: &mut ExpScratch,
    ) -> Result<Mpi, Error> {
        if modulus.sign() < 0 || modulus.is_zero() || modulus.limb(0) & 1 == 0 {
            return Err(Error::BadInput);
        }
        if exponent.sign() < 0 {
            return Err(Error::BadInput);
        }

        let ebits = exponent.bit_len();
        if ebits == 0 {
            // A^0 = 1 (also for A = 0), reduced for the degenerate modulus 1.
            return Mpi::from_int(1).modulo(modulus);
        }

        let nl = modulus.used();
        let mm = mont_init(modulus.limb(0));

        if scratch.rr_modulus.cmp_mpi(modulus) != Ordering::Equal {
            let mut rr = Mpi::from_int(1);
            rr.shift_l(2 * nl * LIMB_BITS);
            scratch.rr = rr.modulo(modulus)?;
            scratch.rr_modulus = modulus.clone();
        }

        // W[1] = |A| mod N brought to Montgomery form.
        let a_red = self.abs().modulo(modulus)?;
        let w1 = mont_mul(&a_red, &scratch.rr, modulus, mm);

        // Accumulator starts at the Montgomery form of 1.
        let one = Mpi::from_int(1);
        let mut x = mont_mul(&one, &scratch.rr, modulus, mm);

        let wsize = match ebits {
            b if b > 671 => 6,
            b if b > 239 => 5,
            b if b > 79 => 4,
            b if b > 23 => 3,
            _ => 1,
        }
        .min(WINDOW_MAX);

        // Window table: slot 1 plus the top half [2^(w-1), 2^w).
        let tlen = 1usize << wsize;
        scratch.window.resize(tlen, Mpi::new());
        scratch.window[1].clone_from(&w1);
        if wsize > 1 {
            let half = 1usize << (wsize - 1);
            let mut acc = w1.clone();
            for _ in 0..wsize - 1 {
                acc = mont_mul(&acc, &acc, modulus, mm);
            }
            scratch.window[half].clone_from(&acc);
            for j in half + 1..tlen {
                let next = mont_mul(&scratch.window[j - 1], &w1, modulus, mm);
                scratch.window[j].clone_from(&next);
            }
        }

        // MSB-first scan with fixed-width windows opened on 1-bits.
        let mut nbits = 0usize;
        let mut wbits = 0usize;
        for i in (0..ebits).rev() {
            let bit = exponent.get_bit(i) as usize;
            if bit == 0 && nbits == 0 {
                x = mont_mul(&x, &x, modulus, mm);
                continue;
            }
            nbits += 1;
            wbits |= bit << (wsize - nbits);
            if nbits == wsize {
                for _ in 0..wsize {
                    x = mont_mul(&x, &x, modulus, mm);
                }
                x = mont_mul(&x, &scratch.window[wbits], modulus, mm);
                nbits = 0;
                wbits = 0;
            }
        }

        // Trailing partial window: square-and-conditionally-multiply.
        for _ in 0..nbits {
            x = mont_mul(&x, &x, modulus, mm);
            wbits <<= 1;
            if wbits & (1 << wsize) != 0 {
                x = mont_mul(&x, &w1, modulus, mm);
            }
        }

        // Out of Montgomery form.
        x = mont_mul(&x, &one, modulus, mm);

        // Negative base with odd exponent flips the residue.
        if self.sign() < 0 && exponent.get_bit(0) == 1 && !x.is_zero() {
            x = modulus - &x;
        }
        Ok(x)
    }

    /// Greatest common divisor of the magnitudes.
    pub fn gcd(&self, other: &Mpi) -> Mpi {
        let mut ta = self.abs();
        let mut tb = other.abs();
        if ta.is_zero() {
            return tb;
        }
        if tb.is_zero() {
            return ta;
        }
        let lz = ta.lsb().min(tb.lsb());
        ta.shift_r(lz);
        tb.shift_r(lz);
        while !ta.is_zero() {
            ta.shift_r(ta.lsb());
            tb.shift_r(tb.lsb());
            if ta.cmp_abs(&tb) != Ordering::Less {
                ta = &ta - &tb;
                ta.shift_r(1);
            } else {
                tb = &tb - &ta;
                tb.shift_r(1);
            }
        }
        tb.shift_l(lz);
        tb
    }

    /// Modular inverse in `[0, modulus)` via the extended binary Euclidean
    /// algorithm; fails unless `gcd(self, modulus) = 1` and `modulus > 1`.
    pub fn inv_mod(&self, modulus: &Mpi) -> Result<Mpi, Error> {
        if modulus.cmp_int(1) != Ordering::Greater {
            return Err(Error::BadInput);
        }
        if self.gcd(modulus).cmp_int(1) != Ordering::Equal {
            return Err(Error::BadInput);
        }

        let ta = self.modulo(modulus)?;
        let tb = modulus.clone();
        let mut tu = ta.clone();
        let mut tv = modulus.clone();
        let mut u1 = Mpi::from_int(1);
        let mut u2 = Mpi::from_int(0);
        let mut v1 = Mpi::from_int(0);
        let mut v2 = Mpi::from_int(1);

        loop {
            while tu.get_bit(0) == 0 {
                tu.shift_r(1);
                if u1.get_bit(0) == 1 || u2.get_bit(0) == 1 {
                    u1 = &u1 + &tb;
                    u2 = &u2 - &ta;
                }
                u1.shift_r(1);
                u2.shift_r(1);
            }
            while tv.get_bit(0) == 0 {
                tv.shift_r(1);
                if v1.get_bit(0) == 1 || v2.get_bit(0) == 1 {
                    v1 = &v1 + &tb;
                    v2 = &v2 - &ta;
                }
                v1.shift_r(1);
                v2.shift_r(1);
            }
            if tu.cmp_mpi(&tv) != Ordering::Less {
                tu = &tu - &tv;
                u1 = &u1 - &v1;
                u2 = &u2 - &v2;
            } else {
                tv = &tv - &tu;
                v1 = &v1 - &u1;
                v2 = &v2 - &u2;
            }
            if tu.is_zero() {
                break;
            }
        }

        let mut r = v1;
        while r.cmp_int(0) == Ordering::Less {
            r = &r + modulus;
        }
        while r.cmp_mpi(modulus) != Ordering::Less {
            r = &r - modulus;
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

    /// Reference pow-mod over native integers.
    fn pow_mod_native(mut a: u128, mut e: u128, n: u128) -> u128 {
        let mut r: u128 = 1 % n;
        a %= n;
        while e > 0 {
            if e & 1 == 1 {
                r = r * a % n;
            }
            a = a * a % n;
            e >>= 1;
        }
        r
    }

    #[test]
    fn test_exp_mod_native_crosscheck() {
        let mut scratch = ExpScratch::new();
        let cases: [(i64, i64, i64); 8] = [
            (2, 10, 1001),
            (7, 128, 13),
            (5, 0, 11),
            (0, 0, 7),
            (0, 5, 7),
            (123456789, 65537, 999999999999999989),
            (65, 17, 3233),
            (1, 100, 3),
        ];
        for (a, e, n) in cases {
            let got = mpi(a).exp_mod(&mpi(e), &mpi(n), &mut scratch).unwrap();
            let expect = pow_mod_native(a as u128, e as u128, n as u128);
            assert_eq!(got.cmp_int(expect as i64), Ordering::Equal, "{a}^{e} mod {n}");
        }
    }

    #[test]
    fn test_exp_mod_rsa_toy_roundtrip() {
        // p = 61, q = 53, n = 3233, e = 17, d = 2753.
        let mut scratch = ExpScratch::new();
        let n = mpi(3233);
        let m = mpi(65);
        let c = m.exp_mod(&mpi(17), &n, &mut scratch).unwrap();
        assert_eq!(c.cmp_int(2790), Ordering::Equal);
        let back = c.exp_mod(&mpi(2753), &n, &mut scratch).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_exp_mod_fermat_p256() {
        // a^(p-1) = 1 mod p for the P-256 prime: exercises the multi-limb
        // path and the 4-bit window.
        let p = Mpi::from_hex(
            "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff",
        )
        .unwrap();
        let a = Mpi::from_hex("123456789abcdef02468ace13579bdf0fedcba9876543210").unwrap();
        let mut scratch = ExpScratch::new();
        let pm1 = &p - &mpi(1);
        let r = a.exp_mod(&pm1, &p, &mut scratch).unwrap();
        assert_eq!(r.cmp_int(1), Ordering::Equal);
        // a^p = a mod p.
        let r = a.exp_mod(&p, &p, &mut scratch).unwrap();
        assert_eq!(r, a);
    }

    #[test]
    fn test_exp_mod_scratch_cache_survives_modulus_switch() {
        let mut scratch = ExpScratch::new();
        let r1 = mpi(2).exp_mod(&mpi(10), &mpi(1001), &mut scratch).unwrap();
        assert_eq!(r1.cmp_int(1024 % 1001), Ordering::Equal);
        let r2 = mpi(2).exp_mod(&mpi(10), &mpi(999), &mut scratch).unwrap();
        assert_eq!(r2.cmp_int(25), Ordering::Equal);
        let r3 = mpi(2).exp_mod(&mpi(10), &mpi(1001), &mut scratch).unwrap();
        assert_eq!(r3.cmp_int(23), Ordering::Equal);
    }

    #[test]
    fn test_exp_mod_rejects_bad_inputs() {
        let mut scratch = ExpScratch::new();
        // Even modulus.
        assert!(mpi(2).exp_mod(&mpi(3), &mpi(10), &mut scratch).is_err());
        // Zero and negative modulus.
        assert!(mpi(2).exp_mod(&mpi(3), &mpi(0), &mut scratch).is_err());
        assert!(mpi(2).exp_mod(&mpi(3), &mpi(-7), &mut scratch).is_err());
        // Negative exponent.
        assert!(mpi(2).exp_mod(&mpi(-3), &mpi(7), &mut scratch).is_err());
    }

    #[test]
    fn test_exp_mod_negative_base() {
        let mut scratch = ExpScratch::new();
        // (-2)^3 mod 5 = -8 mod 5 = 2
        let r = mpi(-2).exp_mod(&mpi(3), &mpi(5), &mut scratch).unwrap();
        assert_eq!(r.cmp_int(2), Ordering::Equal);
        // (-2)^2 mod 5 = 4
        let r = mpi(-2).exp_mod(&mpi(2), &mpi(5), &mut scratch).unwrap();
        assert_eq!(r.cmp_int(4), Ordering::Equal);
    }

    #[test]
    fn test_gcd_known_pairs() {
        for (a, b, g) in [(693i64, 609i64, 21i64), (1764, 868, 28), (768454923, 542167814, 1)] {
            assert_eq!(mpi(a).gcd(&mpi(b)).cmp_int(g), Ordering::Equal, "gcd({a}, {b})");
        }
        assert_eq!(mpi(0).gcd(&mpi(12)).cmp_int(12), Ordering::Equal);
        assert_eq!(mpi(12).gcd(&mpi(0)).cmp_int(12), Ordering::Equal);
        assert_eq!(mpi(-12).gcd(&mpi(18)).cmp_int(6), Ordering::Equal);
    }

    #[test]
    fn test_inv_mod_small() {
        assert_eq!(mpi(3).inv_mod(&mpi(11)).unwrap().cmp_int(4), Ordering::Equal);
        // Even modulus, odd base.
        assert_eq!(mpi(3).inv_mod(&mpi(20)).unwrap().cmp_int(7), Ordering::Equal);
        // Shared factor fails.
        assert!(mpi(4).inv_mod(&mpi(20)).is_err());
        // Modulus must exceed 1.
        assert!(mpi(3).inv_mod(&mpi(1)).is_err());
        assert!(mpi(3).inv_mod(&mpi(0)).is_err());
    }

    #[test]
    fn test_inv_mod_p256() {
        let p = Mpi::from_hex(
            "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff",
        )
        .unwrap();
        let a = Mpi::from_hex("0badc0de0badc0de0badc0de0badc0de0badc0de0badc0de").unwrap();
        let inv = a.inv_mod(&p).unwrap();
        let prod = (&a * &inv).modulo(&p).unwrap();
        assert_eq!(prod.cmp_int(1), Ordering::Equal);
        assert_eq!(inv.cmp_mpi(&p), Ordering::Less);
        assert!(inv.sign() > 0);
    }
}
