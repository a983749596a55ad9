//! Wire encodings: TLS point format (RFC 8422) and the named-curve
//! `ECParameters` structure.

use core::cmp::Ordering;

use bignum::{ExpScratch, Mpi};
use common::Cursor;

use crate::curves::CurveId;
use crate::group::{CurveKind, Group};
use crate::point::Point;
use crate::Error;

/// ECCurveType value for a named curve.
const CURVE_TYPE_NAMED: u8 = 3;

impl Group {
    /// Encode a normalised point.
    ///
    /// Short Weierstrass: uncompressed `0x04 || X || Y` with coordinates
    /// padded to the field width, or a single `0x00` for the point at
    /// infinity. Curve25519: the 32-byte little-endian x-coordinate.
    pub fn point_to_bytes(&self, pt: &Point) -> Result<Vec<u8>, Error> {
        let len = self.p_byte_len();
        match self.kind() {
            CurveKind::Montgomery => {
                let mut bytes = pt.x.to_bytes_be(len).map_err(|_| Error::BufferTooSmall)?;
                bytes.reverse();
                Ok(bytes)
            }
            CurveKind::ShortWeierstrass => {
                if pt.is_zero() {
                    return Ok(vec![0x00]);
                }
                if pt.z.cmp_int(1) != Ordering::Equal {
                    return Err(Error::BadInput);
                }
                let mut out = Vec::with_capacity(1 + 2 * len);
                out.push(0x04);
                out.extend_from_slice(&pt.x.to_bytes_be(len).map_err(|_| Error::BufferTooSmall)?);
                out.extend_from_slice(&pt.y.to_bytes_be(len).map_err(|_| Error::BufferTooSmall)?);
                Ok(out)
            }
        }
    }

    /// Decode a point. Accepts uncompressed and compressed Weierstrass
    /// encodings and the single-byte infinity marker; Curve25519 points
    /// are little-endian x-only with the top bit masked off.
    pub fn point_from_bytes(&self, buf: &[u8]) -> Result<Point, Error> {
        let len = self.p_byte_len();
        match self.kind() {
            CurveKind::Montgomery => {
                if buf.len() != len {
                    return Err(Error::BadInput);
                }
                let mut be = buf.to_vec();
                be.reverse();
                let mut x = Mpi::from_binary(&be);
                x.set_bit(255, false);
                let x = x.modulo(&self.p)?;
                Ok(Point { x, y: Mpi::new(), z: Mpi::from_int(1) })
            }
            CurveKind::ShortWeierstrass => match buf.first() {
                Some(0x00) if buf.len() == 1 => Ok(Point::zero()),
                Some(0x04) if buf.len() == 1 + 2 * len => {
                    let x = Mpi::from_binary(&buf[1..1 + len]);
                    let y = Mpi::from_binary(&buf[1 + len..]);
                    Ok(Point::from_affine(x, y))
                }
                Some(&(tag @ (0x02 | 0x03))) if buf.len() == 1 + len => {
                    self.decompress(Mpi::from_binary(&buf[1..]), tag & 1)
                }
                _ => Err(Error::BadInput),
            },
        }
    }

    /// Recover `y` from `x` and a parity bit. All registered Weierstrass
    /// primes are 3 mod 4, so the square root is a single exponentiation.
    fn decompress(&self, x: Mpi, parity: u8) -> Result<Point, Error> {
        if x.cmp_mpi(&self.p) != Ordering::Less {
            return Err(Error::BadInput);
        }
        let xx = self.fe_sqr(&x)?;
        let mut rhs = self.fe_mul(&xx, &x)?;
        rhs = self.fe_add(&rhs, &self.fe_mul(&self.a, &x)?);
        rhs = self.fe_add(&rhs, &self.b);

        // y = rhs^((p+1)/4)
        let mut e = &self.p + &Mpi::from_int(1);
        e.shift_r(2);
        let mut scratch = ExpScratch::new();
        let mut y = rhs.exp_mod(&e, &self.p, &mut scratch)?;
        if self.fe_sqr(&y)?.cmp_mpi(&rhs) != Ordering::Equal {
            return Err(Error::BadInput);
        }
        if y.get_bit(0) != parity {
            y = self.fe_sub(&Mpi::new(), &y);
        }
        Ok(Point::from_affine(x, y))
    }

    /// Write the TLS `ECPoint` structure (one-byte length prefix).
    pub fn tls_write_point(&self, pt: &Point, out: &mut Vec<u8>) -> Result<(), Error> {
        let enc = self.point_to_bytes(pt)?;
        common::put_vec8(out, &enc);
        Ok(())
    }

    /// Read the TLS `ECPoint` structure.
    pub fn tls_read_point(&self, cursor: &mut Cursor<'_>) -> Result<Point, Error> {
        let enc = cursor.vec8().map_err(|_| Error::BadInput)?;
        self.point_from_bytes(enc)
    }

    /// Write the TLS `ECParameters` structure in named-curve form.
    pub fn tls_write_group(&self, out: &mut Vec<u8>) {
        out.push(CURVE_TYPE_NAMED);
        common::put_u16(out, self.id().tls_id());
    }
}

/// Read a named-curve `ECParameters` structure.
pub fn tls_read_group(cursor: &mut Cursor<'_>) -> Result<CurveId, Error> {
    let curve_type = cursor.u8().map_err(|_| Error::BadInput)?;
    if curve_type != CURVE_TYPE_NAMED {
        return Err(Error::FeatureUnavailable);
    }
    let id = cursor.u16().map_err(|_| Error::BadInput)?;
    CurveId::from_tls_id(id).ok_or(Error::FeatureUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncompressed_roundtrip() {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        let g = grp.generator().clone();
        let enc = grp.point_to_bytes(&g).unwrap();
        assert_eq!(enc.len(), 65);
        assert_eq!(enc[0], 0x04);
        let back = grp.point_from_bytes(&enc).unwrap();
        assert_eq!(back, g);
        grp.check_pubkey(&back).unwrap();
    }

    #[test]
    fn test_infinity_encoding() {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        let enc = grp.point_to_bytes(&Point::zero()).unwrap();
        assert_eq!(enc, vec![0x00]);
        let back = grp.point_from_bytes(&enc).unwrap();
        assert!(back.is_zero());
    }

    #[test]
    fn test_compressed_decode() {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        let g = grp.generator().clone();
        let len = grp.p_byte_len();
        let mut enc = vec![0x02 | g.y.get_bit(0)];
        enc.extend_from_slice(&g.x.to_bytes_be(len).unwrap());
        let back = grp.point_from_bytes(&enc).unwrap();
        assert_eq!(back, g);

        // The opposite parity gives the negated point.
        let mut enc2 = vec![0x02 | (1 - g.y.get_bit(0))];
        enc2.extend_from_slice(&g.x.to_bytes_be(len).unwrap());
        let back2 = grp.point_from_bytes(&enc2).unwrap();
        let mut neg = g.clone();
        grp.negate(&mut neg);
        assert_eq!(back2, neg);
    }

    #[test]
    fn test_malformed_points_rejected() {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        assert!(grp.point_from_bytes(&[]).is_err());
        assert!(grp.point_from_bytes(&[0x04, 1, 2, 3]).is_err());
        assert!(grp.point_from_bytes(&[0x05; 65]).is_err());
        // Compressed x out of field range.
        let mut enc = vec![0x02];
        enc.extend_from_slice(&[0xFF; 32]);
        assert!(grp.point_from_bytes(&enc).is_err());
    }

    #[test]
    fn test_x25519_roundtrip() {
        let grp = Group::new(CurveId::Curve25519).unwrap();
        let g = grp.generator().clone();
        let enc = grp.point_to_bytes(&g).unwrap();
        assert_eq!(enc.len(), 32);
        assert_eq!(enc[0], 9);
        assert!(enc[1..].iter().all(|&b| b == 0));
        let back = grp.point_from_bytes(&enc).unwrap();
        assert_eq!(back.x, g.x);
    }

    #[test]
    fn test_tls_point_vector_roundtrip() {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        let g = grp.generator().clone();
        let mut out = Vec::new();
        grp.tls_write_point(&g, &mut out).unwrap();
        assert_eq!(out[0] as usize, out.len() - 1);
        let mut c = Cursor::new(&out);
        let back = grp.tls_read_point(&mut c).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn test_tls_group_codec() {
        let grp = Group::new(CurveId::Secp384r1).unwrap();
        let mut out = Vec::new();
        grp.tls_write_group(&mut out);
        assert_eq!(out, vec![3, 0, 24]);
        let mut c = Cursor::new(&out);
        assert_eq!(tls_read_group(&mut c).unwrap(), CurveId::Secp384r1);

        // Unknown curve id.
        let bad = [3u8, 0, 99];
        let mut c = Cursor::new(&bad);
        assert!(tls_read_group(&mut c).is_err());
        // Explicit-parameter form is not supported.
        let bad = [1u8, 0, 23];
        let mut c = Cursor::new(&bad);
        assert!(tls_read_group(&mut c).is_err());
    }
}
