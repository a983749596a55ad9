//! Points and Jacobian arithmetic on short Weierstrass groups.
//!
//! The externally visible contract: after any public group operation a
//! point has `Z = 0` (the point at infinity) or `Z = 1` with affine
//! `(X, Y)`. Intermediate values inside scalar multiplication carry
//! arbitrary `Z`.

use core::cmp::Ordering;

use bignum::Mpi;

use crate::group::Group;
use crate::Error;

/// A point in Jacobian coordinates `(X, Y, Z)`.
///
/// `Z = 0` encodes the point at infinity. The coordinate bignums are
/// wiped on drop like every other `Mpi`.
#[derive(Clone, Debug)]
pub struct Point {
    pub x: Mpi,
    pub y: Mpi,
    pub z: Mpi,
}

impl Point {
    /// The point at infinity.
    pub fn zero() -> Self {
        Point { x: Mpi::from_int(1), y: Mpi::from_int(1), z: Mpi::new() }
    }

    /// An affine point (`Z = 1`).
    pub fn from_affine(x: Mpi, y: Mpi) -> Self {
        Point { x, y, z: Mpi::from_int(1) }
    }

    /// Whether this is the point at infinity.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.z.is_zero()
    }
}

impl PartialEq for Point {
    /// Coordinate-wise comparison; meaningful for normalised points.
    fn eq(&self, other: &Self) -> bool {
        if self.is_zero() && other.is_zero() {
            return true;
        }
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl Eq for Point {}

impl Group {
    /// Jacobian doubling, `dbl-1998-cmo-2` with the `a = -3` shortcut.
    pub(crate) fn double_jac(&self, pt: &Point) -> Result<Point, Error> {
        if pt.is_zero() {
            return Ok(Point::zero());
        }
        let zz = self.fe_sqr(&pt.z)?;
        let m = if self.a_is_minus3 {
            // M = 3 (X - Z^2)(X + Z^2)
            let t1 = self.fe_sub(&pt.x, &zz);
            let t2 = self.fe_add(&pt.x, &zz);
            let t = self.fe_mul(&t1, &t2)?;
            self.fe_add(&self.fe_add(&t, &t), &t)
        } else {
            // M = 3 X^2 + A Z^4
            let xx = self.fe_sqr(&pt.x)?;
            let t = self.fe_add(&self.fe_add(&xx, &xx), &xx);
            self.fe_add(&t, &self.fe_mul(&self.a, &self.fe_sqr(&zz)?)?)
        };
        let yy = self.fe_sqr(&pt.y)?;
        // S = 4 X Y^2
        let mut s = self.fe_mul(&pt.x, &yy)?;
        s = self.fe_add(&s, &s);
        s = self.fe_add(&s, &s);
        // U = 8 Y^4
        let mut u = self.fe_sqr(&yy)?;
        u = self.fe_add(&u, &u);
        u = self.fe_add(&u, &u);
        u = self.fe_add(&u, &u);
        // X' = M^2 - 2S, Y' = M (S - X') - U, Z' = 2 Y Z
        let mm = self.fe_sqr(&m)?;
        let x3 = self.fe_sub(&self.fe_sub(&mm, &s), &s);
        let y3 = self.fe_sub(&self.fe_mul(&m, &self.fe_sub(&s, &x3))?, &u);
        let mut z3 = self.fe_mul(&pt.y, &pt.z)?;
        z3 = self.fe_add(&z3, &z3);
        Ok(Point { x: x3, y: y3, z: z3 })
    }

    /// Mixed addition: `p` Jacobian, `q` affine (`Z = 1`).
    pub(crate) fn add_mixed(&self, p: &Point, q: &Point) -> Result<Point, Error> {
        if p.is_zero() {
            return Ok(q.clone());
        }
        if q.is_zero() {
            return Ok(p.clone());
        }
        let zz = self.fe_sqr(&p.z)?;
        let zzz = self.fe_mul(&zz, &p.z)?;
        // T1 = X2 Z1^2 - X1, T2 = Y2 Z1^3 - Y1
        let t1 = self.fe_sub(&self.fe_mul(&q.x, &zz)?, &p.x);
        let t2 = self.fe_sub(&self.fe_mul(&q.y, &zzz)?, &p.y);
        if t1.is_zero() {
            return if t2.is_zero() { self.double_jac(p) } else { Ok(Point::zero()) };
        }
        let z3 = self.fe_mul(&p.z, &t1)?;
        let t3 = self.fe_sqr(&t1)?;
        let t4 = self.fe_mul(&t3, &t1)?;
        let t5 = self.fe_mul(&t3, &p.x)?;
        // X3 = T2^2 - T4 - 2 T5
        let x3 = self.fe_sub(&self.fe_sub(&self.fe_sub(&self.fe_sqr(&t2)?, &t4), &t5), &t5);
        // Y3 = T2 (T5 - X3) - T4 Y1
        let y3 =
            self.fe_sub(&self.fe_mul(&t2, &self.fe_sub(&t5, &x3))?, &self.fe_mul(&t4, &p.y)?);
        Ok(Point { x: x3, y: y3, z: z3 })
    }

    /// Bring a Jacobian point to affine form (`Z = 1`).
    pub(crate) fn normalize(&self, pt: &mut Point) -> Result<(), Error> {
        if pt.is_zero() {
            return Ok(());
        }
        let zi = self.fe_inv(&pt.z)?;
        let zi2 = self.fe_sqr(&zi)?;
        pt.x = self.fe_mul(&pt.x, &zi2)?;
        pt.y = self.fe_mul(&pt.y, &self.fe_mul(&zi2, &zi)?)?;
        pt.z = Mpi::from_int(1);
        Ok(())
    }

    /// Normalise many points with a single field inversion
    /// (Montgomery's simultaneous-inversion trick). The points at
    /// `indices` must all have non-zero `Z`.
    pub(crate) fn normalize_many(
        &self,
        pts: &mut [Point],
        indices: &[usize],
    ) -> Result<(), Error> {
        if indices.is_empty() {
            return Ok(());
        }
        let zs: Vec<Mpi> = indices.iter().map(|&i| pts[i].z.clone()).collect();
        // c[k] = z0 z1 ... zk
        let mut c = Vec::with_capacity(zs.len());
        let mut acc = zs[0].clone();
        c.push(acc.clone());
        for z in &zs[1..] {
            acc = self.fe_mul(&acc, z)?;
            c.push(acc.clone());
        }
        let mut u = self.fe_inv(&acc)?;
        for k in (0..zs.len()).rev() {
            let zi = if k == 0 { u.clone() } else { self.fe_mul(&u, &c[k - 1])? };
            u = self.fe_mul(&u, &zs[k])?;
            let zi2 = self.fe_sqr(&zi)?;
            let zi3 = self.fe_mul(&zi2, &zi)?;
            let pt = &mut pts[indices[k]];
            pt.x = self.fe_mul(&pt.x, &zi2)?;
            pt.y = self.fe_mul(&pt.y, &zi3)?;
            pt.z = Mpi::from_int(1);
        }
        Ok(())
    }

    /// Negate the point in place.
    pub(crate) fn negate(&self, pt: &mut Point) {
        if pt.is_zero() || pt.y.is_zero() {
            return;
        }
        pt.y = self.fe_sub(&Mpi::new(), &pt.y);
    }

    /// Conditionally negate `Y` without branching on `flag` (0 or 1).
    pub(crate) fn safe_invert(&self, pt: &mut Point, flag: u8) {
        let my = self.fe_sub(&Mpi::new(), &pt.y);
        pt.y.safe_cond_assign(&my, flag);
    }

    /// Draw a random field element in `[2, p)` for coordinate blinding.
    pub(crate) fn draw_lambda(&self, rng: &mut dyn rand_core::RngCore) -> Result<Mpi, Error> {
        let p_len = self.p_byte_len();
        let mut l = Mpi::new();
        let mut tries = 0;
        loop {
            l.fill_random(p_len, rng);
            while l.cmp_mpi(&self.p) != Ordering::Less {
                l.shift_r(1);
            }
            if l.cmp_int(1) == Ordering::Greater {
                return Ok(l);
            }
            tries += 1;
            if tries > 10 {
                return Err(Error::RandomFailed);
            }
        }
    }

    /// Blind a Jacobian point by a random `λ`:
    /// `(X, Y, Z) -> (λ^2 X, λ^3 Y, λ Z)`.
    pub(crate) fn randomize_jac(
        &self,
        pt: &mut Point,
        rng: &mut dyn rand_core::RngCore,
    ) -> Result<(), Error> {
        let l = self.draw_lambda(rng)?;
        let ll = self.fe_sqr(&l)?;
        pt.x = self.fe_mul(&pt.x, &ll)?;
        pt.y = self.fe_mul(&pt.y, &self.fe_mul(&ll, &l)?)?;
        pt.z = self.fe_mul(&pt.z, &l)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::CurveId;

    #[test]
    fn test_double_then_add_matches_triple() {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        let g = grp.generator().clone();
        // 2G + G computed two ways.
        let mut twog = grp.double_jac(&g).unwrap();
        grp.normalize(&mut twog).unwrap();
        let mut threeg_a = grp.add_mixed(&twog, &g).unwrap();
        grp.normalize(&mut threeg_a).unwrap();
        let mut threeg_b = grp.add_mixed(&g, &twog).unwrap();
        grp.normalize(&mut threeg_b).unwrap();
        assert_eq!(threeg_a, threeg_b);
        grp.check_pubkey(&threeg_a).unwrap();
    }

    #[test]
    fn test_add_inverse_is_infinity() {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        let g = grp.generator().clone();
        let mut neg = g.clone();
        grp.negate(&mut neg);
        let sum = grp.add_mixed(&g, &neg).unwrap();
        assert!(sum.is_zero());
    }

    #[test]
    fn test_add_equal_points_doubles() {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        let g = grp.generator().clone();
        let mut a = grp.add_mixed(&g, &g).unwrap();
        grp.normalize(&mut a).unwrap();
        let mut b = grp.double_jac(&g).unwrap();
        grp.normalize(&mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_doubling_stays_on_curve() {
        for id in [CurveId::Secp256r1, CurveId::Secp384r1, CurveId::Secp521r1, CurveId::Bp256r1] {
            let grp = Group::new(id).unwrap();
            let mut p = grp.generator().clone();
            for _ in 0..4 {
                p = grp.double_jac(&p).unwrap();
                let mut affine = p.clone();
                grp.normalize(&mut affine).unwrap();
                grp.check_pubkey(&affine).unwrap();
            }
        }
    }

    #[test]
    fn test_randomize_preserves_point() {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        let mut rng = rand::thread_rng();
        let mut p = grp.double_jac(grp.generator()).unwrap();
        let mut reference = p.clone();
        grp.normalize(&mut reference).unwrap();
        grp.randomize_jac(&mut p, &mut rng).unwrap();
        grp.normalize(&mut p).unwrap();
        assert_eq!(p, reference);
    }

    #[test]
    fn test_safe_invert() {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        let g = grp.generator().clone();
        let mut a = g.clone();
        grp.safe_invert(&mut a, 0);
        assert_eq!(a, g);
        grp.safe_invert(&mut a, 1);
        let mut neg = g.clone();
        grp.negate(&mut neg);
        assert_eq!(a, neg);
        grp.check_pubkey(&a).unwrap();
    }

    #[test]
    fn test_normalize_many_matches_single() {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        let g = grp.generator().clone();
        let mut pts = vec![
            grp.double_jac(&g).unwrap(),
            grp.double_jac(&grp.double_jac(&g).unwrap()).unwrap(),
            grp.add_mixed(&grp.double_jac(&g).unwrap(), &g).unwrap(),
        ];
        let mut singles = pts.clone();
        for p in singles.iter_mut() {
            grp.normalize(p).unwrap();
        }
        grp.normalize_many(&mut pts, &[0, 1, 2]).unwrap();
        assert_eq!(pts, singles);
    }
}
