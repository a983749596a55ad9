//! The `Mpi` type: sign-and-magnitude bignums over 64-bit limbs.
//!
//! The magnitude is little-endian by limb (limb 0 is least significant).
//! Every mutating operation re-normalises `used` so the top significant
//! limb is non-zero, and the crate maintains the stronger invariant that
//! limbs at and above `used` are zero. Zero is always stored with a
//! positive sign.

use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, Mul, Sub};

use rand_core::RngCore;
use zeroize::Zeroize;

use crate::limb::{self, LIMB_BITS, LIMB_BYTES, Limb};
use crate::Error;

/// A multi-precision signed integer.
pub struct Mpi {
    /// +1 or -1; zero is stored with +1.
    pub(crate) sign: i8,
    /// Number of significant limbs; 0 for the value zero.
    pub(crate) used: usize,
    /// Backing storage; `limbs.len()` is the allocated capacity.
    pub(crate) limbs: Vec<Limb>,
}

impl Mpi {
    /// A fresh zero with no backing storage.
    pub fn new() -> Self {
        Mpi { sign: 1, used: 0, limbs: Vec::new() }
    }

    /// Construct from a signed machine integer.
    pub fn from_int(z: i64) -> Self {
        let mut x = Mpi::new();
        x.set_int(z);
        x
    }

    /// Assign from a signed machine integer.
    pub fn set_int(&mut self, z: i64) {
        self.limbs.zeroize();
        self.limbs.clear();
        self.limbs.push(z.unsigned_abs());
        self.sign = if z < 0 { -1 } else { 1 };
        self.used = 1;
        self.fixup_used();
    }

    /// Construct from a little-endian limb vector.
    pub fn from_limbs(limbs: Vec<Limb>) -> Self {
        let mut x = Mpi { sign: 1, used: limbs.len(), limbs };
        x.fixup_used();
        x
    }

    /// Parse a big-endian unsigned magnitude.
    pub fn from_binary(buf: &[u8]) -> Self {
        let nlimbs = buf.len().div_ceil(LIMB_BYTES).max(1);
        let mut limbs = vec![0 as Limb; nlimbs];
        for (i, &byte) in buf.iter().rev().enumerate() {
            limbs[i / LIMB_BYTES] |= (byte as Limb) << (8 * (i % LIMB_BYTES));
        }
        Self::from_limbs(limbs)
    }

    /// Parse a big-endian hex string (whitespace ignored).
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let mut bytes = Vec::with_capacity(s.len() / 2);
        let mut hi: Option<u8> = None;
        for c in s.chars() {
            if c.is_whitespace() {
                continue;
            }
            let d = c.to_digit(16).ok_or(Error::BadInput)? as u8;
            match hi.take() {
                None => hi = Some(d),
                Some(h) => bytes.push((h << 4) | d),
            }
        }
        if hi.is_some() {
            return Err(Error::BadInput);
        }
        Ok(Self::from_binary(&bytes))
    }

    /// Write the magnitude big-endian into `out`, left-padded with zeros.
    pub fn write_binary(&self, out: &mut [u8]) -> Result<(), Error> {
        let n = self.byte_len();
        if out.len() < n {
            return Err(Error::BufferTooSmall);
        }
        out.fill(0);
        if n == 0 {
            return Ok(());
        }
        let last = out.len() - 1;
        for i in 0..n {
            out[last - i] = (self.limb(i / LIMB_BYTES) >> (8 * (i % LIMB_BYTES))) as u8;
        }
        Ok(())
    }

    /// The magnitude as a big-endian byte vector of exactly `width` bytes.
    pub fn to_bytes_be(&self, width: usize) -> Result<Vec<u8>, Error> {
        let mut out = vec![0u8; width];
        self.write_binary(&mut out)?;
        Ok(out)
    }

    /// Draw `n_bytes` of randomness; the result is non-negative.
    pub fn fill_random(&mut self, n_bytes: usize, rng: &mut dyn RngCore) {
        let mut buf = vec![0u8; n_bytes];
        rng.fill_bytes(&mut buf);
        *self = Self::from_binary(&buf);
        buf.zeroize();
    }

    /// Sign of the value: +1 or -1 (zero is +1).
    #[inline]
    pub fn sign(&self) -> i8 {
        self.sign
    }

    /// Flip the sign of a non-zero value.
    pub fn negate(&mut self) {
        if self.used != 0 {
            self.sign = -self.sign;
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.used == 0
    }

    /// Number of significant limbs.
    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    /// The significant limbs, least significant first.
    #[inline]
    pub fn limbs_used(&self) -> &[Limb] {
        &self.limbs[..self.used]
    }

    /// Limb `i` of the magnitude, or 0 past the significant range.
    #[inline]
    pub fn limb(&self, i: usize) -> Limb {
        if i < self.used { self.limbs[i] } else { 0 }
    }

    /// Ensure at least `nlimbs` of capacity, zero-filling the new tail.
    pub fn grow(&mut self, nlimbs: usize) {
        if self.limbs.len() < nlimbs {
            self.limbs.resize(nlimbs, 0);
        }
    }

    /// Drop spare capacity down to `max(used, nlimbs, 1)` limbs.
    pub fn shrink(&mut self, nlimbs: usize) {
        let keep = self.used.max(nlimbs).max(1);
        if self.limbs.len() > keep {
            self.limbs.truncate(keep);
        }
    }

    /// Exchange two values.
    pub fn swap(&mut self, other: &mut Mpi) {
        core::mem::swap(self, other);
    }

    /// The magnitude as a fresh non-negative value.
    pub fn abs(&self) -> Mpi {
        let mut a = self.clone();
        a.sign = 1;
        a
    }

    /// Trim leading zero limbs and normalise the sign of zero.
    pub(crate) fn fixup_used(&mut self) {
        let mut u = self.limbs.len();
        while u > 0 && self.limbs[u - 1] == 0 {
            u -= 1;
        }
        self.used = u;
        if u == 0 {
            self.sign = 1;
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Bit access
    // ─────────────────────────────────────────────────────────────────────

    /// Bit `pos` of the magnitude (0 past the end).
    pub fn get_bit(&self, pos: usize) -> u8 {
        if pos >= self.used * LIMB_BITS {
            return 0;
        }
        ((self.limbs[pos / LIMB_BITS] >> (pos % LIMB_BITS)) & 1) as u8
    }

    /// Set bit `pos` to `val`. Clearing a bit past the significant range
    /// is a no-op; setting one grows the storage.
    pub fn set_bit(&mut self, pos: usize, val: bool) {
        let idx = pos / LIMB_BITS;
        let off = pos % LIMB_BITS;
        if !val {
            if idx < self.used {
                self.limbs[idx] &= !(1 << off);
                self.fixup_used();
            }
            return;
        }
        self.grow(idx + 1);
        self.limbs[idx] |= 1 << off;
        if self.used < idx + 1 {
            self.used = idx + 1;
        }
    }

    /// Index of the least significant 1-bit; 0 for the value zero.
    pub fn lsb(&self) -> usize {
        for i in 0..self.used {
            if self.limbs[i] != 0 {
                return i * LIMB_BITS + self.limbs[i].trailing_zeros() as usize;
            }
        }
        0
    }

    /// Number of significant bits in the magnitude (0 for zero).
    pub fn bit_len(&self) -> usize {
        if self.used == 0 {
            return 0;
        }
        let top = self.limbs[self.used - 1];
        self.used * LIMB_BITS - top.leading_zeros() as usize
    }

    /// Number of bytes needed to hold the magnitude.
    pub fn byte_len(&self) -> usize {
        self.bit_len().div_ceil(8)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Comparison
    // ─────────────────────────────────────────────────────────────────────

    /// Compare magnitudes only.
    pub fn cmp_abs(&self, other: &Mpi) -> Ordering {
        if self.used != other.used {
            return self.used.cmp(&other.used);
        }
        for i in (0..self.used).rev() {
            match self.limbs[i].cmp(&other.limbs[i]) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    /// Signed comparison. Zero magnitudes compare equal regardless of sign.
    pub fn cmp_mpi(&self, other: &Mpi) -> Ordering {
        if self.is_zero() && other.is_zero() {
            return Ordering::Equal;
        }
        match (self.sign, other.sign) {
            (1, -1) => Ordering::Greater,
            (-1, 1) => Ordering::Less,
            (1, _) => self.cmp_abs(other),
            _ => other.cmp_abs(self),
        }
    }

    /// Compare against a signed machine integer.
    pub fn cmp_int(&self, z: i64) -> Ordering {
        self.cmp_mpi(&Mpi::from_int(z))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Shifts
    // ─────────────────────────────────────────────────────────────────────

    /// Shift the magnitude left by `count` bits, growing storage.
    pub fn shift_l(&mut self, count: usize) {
        if self.is_zero() || count == 0 {
            return;
        }
        let new_len = (self.bit_len() + count).div_ceil(LIMB_BITS);
        self.grow(new_len);
        let limb_shift = count / LIMB_BITS;
        let bit_shift = count % LIMB_BITS;
        if limb_shift > 0 {
            for i in (0..new_len).rev() {
                self.limbs[i] = if i >= limb_shift { self.limbs[i - limb_shift] } else { 0 };
            }
        }
        if bit_shift > 0 {
            let mut carry: Limb = 0;
            for i in limb_shift..new_len {
                let v = self.limbs[i];
                self.limbs[i] = (v << bit_shift) | carry;
                carry = v >> (LIMB_BITS - bit_shift);
            }
        }
        self.used = new_len;
    }

    /// Shift the magnitude right by `count` bits; shifting past the end
    /// yields zero.
    pub fn shift_r(&mut self, count: usize) {
        if count >= self.bit_len() {
            self.clear_to_zero();
            return;
        }
        if count == 0 {
            return;
        }
        let limb_shift = count / LIMB_BITS;
        let bit_shift = count % LIMB_BITS;
        if limb_shift > 0 {
            for i in 0..self.used {
                self.limbs[i] =
                    if i + limb_shift < self.used { self.limbs[i + limb_shift] } else { 0 };
            }
        }
        if bit_shift > 0 {
            let mut carry: Limb = 0;
            for i in (0..self.used).rev() {
                let v = self.limbs[i];
                self.limbs[i] = (v >> bit_shift) | carry;
                carry = v << (LIMB_BITS - bit_shift);
            }
        }
        self.fixup_used();
    }

    /// Reset to zero, wiping the previous contents.
    fn clear_to_zero(&mut self) {
        for l in self.limbs.iter_mut() {
            *l = 0;
        }
        self.used = 0;
        self.sign = 1;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Constant-time selection
    // ─────────────────────────────────────────────────────────────────────

    /// If `assign == 1`, set `self = other`; if 0, leave `self` untouched.
    ///
    /// Control flow and memory access do not depend on `assign` or on the
    /// values. Capacity adjustment depends only on limb counts, which are
    /// public.
    pub fn safe_cond_assign(&mut self, other: &Mpi, assign: u8) {
        self.grow(other.used.max(1));
        let mask = limb::ct_mask(assign as Limb);
        let smask = (assign as i8).wrapping_neg();
        self.sign = (self.sign & !smask) | (other.sign & smask);
        for i in 0..self.limbs.len() {
            let theirs = if i < other.limbs.len() { other.limbs[i] } else { 0 };
            self.limbs[i] = (self.limbs[i] & !mask) | (theirs & mask);
        }
        self.used = limb::ct_select_usize(self.used, other.used, assign as usize);
    }

    /// If `swap == 1`, exchange `self` and `other`; if 0, leave both.
    ///
    /// Same constant-time contract as [`Mpi::safe_cond_assign`].
    pub fn safe_cond_swap(&mut self, other: &mut Mpi, swap: u8) {
        let cap = self.limbs.len().max(other.limbs.len()).max(1);
        self.grow(cap);
        other.grow(cap);
        let mask = limb::ct_mask(swap as Limb);
        let smask = (swap as i8).wrapping_neg();
        let sd = (self.sign ^ other.sign) & smask;
        self.sign ^= sd;
        other.sign ^= sd;
        for i in 0..cap {
            let d = (self.limbs[i] ^ other.limbs[i]) & mask;
            self.limbs[i] ^= d;
            other.limbs[i] ^= d;
        }
        let ud = (self.used ^ other.used) & (swap as usize).wrapping_neg();
        self.used ^= ud;
        other.used ^= ud;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Magnitude arithmetic
    // ─────────────────────────────────────────────────────────────────────

    /// `| self | + | other |`.
    pub fn add_abs(&self, other: &Mpi) -> Mpi {
        let n = self.used.max(other.used);
        let mut limbs = vec![0 as Limb; n + 1];
        let mut carry: Limb = 0;
        for (i, l) in limbs.iter_mut().enumerate().take(n) {
            let (s1, c1) = self.limb(i).overflowing_add(other.limb(i));
            let (s2, c2) = s1.overflowing_add(carry);
            *l = s2;
            carry = (c1 | c2) as Limb;
        }
        limbs[n] = carry;
        Mpi::from_limbs(limbs)
    }

    /// `| self | - | other |`; fails unless `| self | >= | other |`.
    pub fn sub_abs(&self, other: &Mpi) -> Result<Mpi, Error> {
        if self.cmp_abs(other) == Ordering::Less {
            return Err(Error::BadInput);
        }
        let mut limbs = vec![0 as Limb; self.used.max(1)];
        let mut borrow: Limb = 0;
        for (i, l) in limbs.iter_mut().enumerate().take(self.used) {
            let (d1, b1) = self.limb(i).overflowing_sub(other.limb(i));
            let (d2, b2) = d1.overflowing_sub(borrow);
            *l = d2;
            borrow = (b1 | b2) as Limb;
        }
        Ok(Mpi::from_limbs(limbs))
    }

    /// Signed addition; `flip` negates `other` first.
    fn add_signed(&self, other: &Mpi, flip: bool) -> Mpi {
        let other_sign = if flip { -other.sign } else { other.sign };
        let mut r = if self.sign == other_sign {
            let mut m = self.add_abs(other);
            m.sign = self.sign;
            m
        } else if self.cmp_abs(other) != Ordering::Less {
            // Magnitude subtraction cannot fail here.
            let mut m = self.sub_abs(other).unwrap_or_default();
            m.sign = self.sign;
            m
        } else {
            let mut m = other.sub_abs(self).unwrap_or_default();
            m.sign = other_sign;
            m
        };
        if r.is_zero() {
            r.sign = 1;
        }
        r
    }

    /// `self + z` for a machine integer.
    pub fn add_int(&self, z: i64) -> Mpi {
        self.add_signed(&Mpi::from_int(z), false)
    }

    /// `self - z` for a machine integer.
    pub fn sub_int(&self, z: i64) -> Mpi {
        self.add_signed(&Mpi::from_int(z), true)
    }

    /// `self * m` on the magnitude with the sign preserved.
    pub fn mul_int(&self, m: Limb) -> Mpi {
        let mut limbs = vec![0 as Limb; self.used + 1];
        mul_acc(&mut limbs, self.limbs_used(), m);
        let mut r = Mpi::from_limbs(limbs);
        if !r.is_zero() {
            r.sign = self.sign;
        }
        r
    }
}

/// `dst += src * mult`, rippling the final carry as far as it goes.
///
/// `dst` must be long enough to absorb the carry; callers size it to
/// the full product width.
pub(crate) fn mul_acc(dst: &mut [Limb], src: &[Limb], mult: Limb) {
    let mut carry: Limb = 0;
    for (j, &s) in src.iter().enumerate() {
        let acc = dst[j] as u128 + (s as u128) * (mult as u128) + carry as u128;
        dst[j] = acc as Limb;
        carry = (acc >> LIMB_BITS) as Limb;
    }
    let mut j = src.len();
    while carry != 0 {
        let (v, c) = dst[j].overflowing_add(carry);
        dst[j] = v;
        carry = c as Limb;
        j += 1;
    }
}

impl Default for Mpi {
    fn default() -> Self {
        Mpi::new()
    }
}

impl Clone for Mpi {
    fn clone(&self) -> Self {
        Mpi { sign: self.sign, used: self.used, limbs: self.limbs_used().to_vec() }
    }

    fn clone_from(&mut self, source: &Self) {
        self.limbs.zeroize();
        self.limbs.clear();
        self.limbs.extend_from_slice(source.limbs_used());
        self.used = source.used;
        self.sign = source.sign;
    }
}

impl Drop for Mpi {
    fn drop(&mut self) {
        self.limbs.zeroize();
    }
}

impl PartialEq for Mpi {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_mpi(other) == Ordering::Equal
    }
}

impl Eq for Mpi {}

impl PartialOrd for Mpi {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp_mpi(other))
    }
}

impl Ord for Mpi {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_mpi(other)
    }
}

impl fmt::Debug for Mpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sign < 0 {
            write!(f, "-")?;
        }
        if self.used == 0 {
            return write!(f, "0x0");
        }
        write!(f, "0x{:x}", self.limbs[self.used - 1])?;
        for i in (0..self.used - 1).rev() {
            write!(f, "{:016x}", self.limbs[i])?;
        }
        Ok(())
    }
}

impl Add for &Mpi {
    type Output = Mpi;
    fn add(self, rhs: &Mpi) -> Mpi {
        self.add_signed(rhs, false)
    }
}

impl Sub for &Mpi {
    type Output = Mpi;
    fn sub(self, rhs: &Mpi) -> Mpi {
        self.add_signed(rhs, true)
    }
}

impl Mul for &Mpi {
    type Output = Mpi;
    fn mul(self, rhs: &Mpi) -> Mpi {
        if self.is_zero() || rhs.is_zero() {
            return Mpi::new();
        }
        let mut limbs = vec![0 as Limb; self.used + rhs.used];
        for i in 0..rhs.used {
            mul_acc(&mut limbs[i..], self.limbs_used(), rhs.limb(i));
        }
        let mut r = Mpi::from_limbs(limbs);
        r.sign = self.sign * rhs.sign;
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mpi(v: i64) -> Mpi {
        Mpi::from_int(v)
    }

    #[test]
    fn test_set_int_and_cmp() {
        assert_eq!(mpi(0).cmp_int(0), Ordering::Equal);
        assert_eq!(mpi(5).cmp_int(4), Ordering::Greater);
        assert_eq!(mpi(-5).cmp_int(4), Ordering::Less);
        assert_eq!(mpi(-5).cmp_int(-5), Ordering::Equal);
        assert!(mpi(0).is_zero());
        assert_eq!(mpi(0).sign(), 1);
        assert_eq!(mpi(i64::MIN).cmp_int(i64::MIN), Ordering::Equal);
    }

    #[test]
    fn test_add_sub_native_crosscheck() {
        let pairs: [(i64, i64); 7] =
            [(0, 0), (1, 1), (123456789, 987654321), (-5, 3), (5, -3), (-5, -3), (0, -7)];
        for (a, b) in pairs {
            assert_eq!(&mpi(a) + &mpi(b), mpi(a + b), "{a} + {b}");
            assert_eq!(&mpi(a) - &mpi(b), mpi(a - b), "{a} - {b}");
        }
    }

    #[test]
    fn test_int_forms() {
        assert_eq!(mpi(10).add_int(-3), mpi(7));
        assert_eq!(mpi(10).sub_int(13), mpi(-3));
        assert_eq!(mpi(-10).add_int(10), mpi(0));
    }

    #[test]
    fn test_add_identity_and_self_cancel() {
        let a = Mpi::from_hex("0123456789abcdef0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(&a + &Mpi::new(), a);
        assert!((&a - &a).is_zero());
    }

    #[test]
    fn test_multi_limb_carry() {
        // (2^128 - 1) + 1 = 2^128
        let a = Mpi::from_hex("ffffffffffffffffffffffffffffffff").unwrap();
        let s = &a + &mpi(1);
        assert_eq!(s.bit_len(), 129);
        assert_eq!(s.get_bit(128), 1);
        assert_eq!(&s - &mpi(1), a);
    }

    #[test]
    fn test_mul_native_crosscheck() {
        for (a, b) in [(0i64, 5i64), (1, 99), (0xFFFF_FFFF, 0xFFFF_FFFF), (-7, 9), (-7, -9)] {
            let expect = (a as i128) * (b as i128);
            let got = &mpi(a) * &mpi(b);
            let mut buf = [0u8; 16];
            got.write_binary(&mut buf).unwrap();
            assert_eq!(u128::from_be_bytes(buf), expect.unsigned_abs(), "{a} * {b}");
            assert_eq!(got.sign() < 0, expect < 0 && expect != 0);
        }
    }

    #[test]
    fn test_mul_one_identity() {
        let a = Mpi::from_hex("deadbeefcafe0123456789abcdef00112233445566778899").unwrap();
        assert_eq!(&a * &mpi(1), a);
        assert!((&a * &mpi(0)).is_zero());
    }

    #[test]
    fn test_shift_roundtrip() {
        let a = Mpi::from_hex("123456789abcdef00fedcba987654321").unwrap();
        for k in [1, 7, 63, 64, 65, 130] {
            let mut x = a.clone();
            x.shift_l(k);
            assert_eq!(x.bit_len(), a.bit_len() + k);
            x.shift_r(k);
            assert_eq!(x, a, "shift by {k}");
        }
    }

    #[test]
    fn test_shift_r_past_end() {
        let mut a = mpi(0xABCD);
        a.shift_r(500);
        assert!(a.is_zero());
    }

    #[test]
    fn test_bits() {
        let mut a = Mpi::new();
        a.set_bit(100, true);
        assert_eq!(a.bit_len(), 101);
        assert_eq!(a.get_bit(100), 1);
        assert_eq!(a.get_bit(99), 0);
        assert_eq!(a.lsb(), 100);
        a.set_bit(3, true);
        assert_eq!(a.lsb(), 3);
        // Clearing past the end is a no-op.
        a.set_bit(100_000, false);
        assert_eq!(a.bit_len(), 101);
        // Clearing the top bit renormalises.
        a.set_bit(100, false);
        assert_eq!(a.bit_len(), 4);
        // lsb of zero is 0 even after bits were cleared through set_bit.
        a.set_bit(3, false);
        assert!(a.is_zero());
        assert_eq!(a.lsb(), 0);
    }

    #[test]
    fn test_binary_roundtrip() {
        let bytes = [0x01u8, 0x02, 0xFF, 0x00, 0x80, 0x7F, 0xDE, 0xAD, 0xBE, 0xEF];
        let a = Mpi::from_binary(&bytes);
        let mut out = [0u8; 10];
        a.write_binary(&mut out).unwrap();
        assert_eq!(out, bytes);
        // Wider output left-pads.
        let mut wide = [0u8; 13];
        a.write_binary(&mut wide).unwrap();
        assert_eq!(&wide[3..], &bytes);
        // Narrower output is rejected.
        let mut narrow = [0u8; 9];
        assert_eq!(a.write_binary(&mut narrow), Err(Error::BufferTooSmall));
    }

    #[test]
    fn test_leading_zeros_trimmed() {
        let a = Mpi::from_binary(&[0, 0, 0, 1, 2]);
        assert_eq!(a.byte_len(), 2);
        assert_eq!(a.cmp_int(0x0102), Ordering::Equal);
    }

    #[test]
    fn test_safe_cond_assign() {
        let big = Mpi::from_hex("ffeeddccbbaa99887766554433221100ff").unwrap();
        let mut x = mpi(42);
        x.safe_cond_assign(&big, 0);
        assert_eq!(x, mpi(42));
        x.safe_cond_assign(&big, 1);
        assert_eq!(x, big);
        // Assigning a shorter value clears the tail.
        let mut y = big.clone();
        y.safe_cond_assign(&mpi(-3), 1);
        assert_eq!(y, mpi(-3));
    }

    #[test]
    fn test_safe_cond_swap() {
        let a0 = Mpi::from_hex("0102030405060708090a0b0c0d0e0f10").unwrap();
        let b0 = mpi(-77);
        let mut a = a0.clone();
        let mut b = b0.clone();
        a.safe_cond_swap(&mut b, 0);
        assert_eq!(a, a0);
        assert_eq!(b, b0);
        a.safe_cond_swap(&mut b, 1);
        assert_eq!(a, b0);
        assert_eq!(b, a0);
    }

    #[test]
    fn test_clone_from_reuses() {
        let a = Mpi::from_hex("0123456789abcdef0123456789abcdef").unwrap();
        let mut b = Mpi::new();
        b.clone_from(&a);
        assert_eq!(a, b);
    }
}
