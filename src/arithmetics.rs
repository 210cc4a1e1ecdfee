//! Arithmetic in the negacyclic ring Z_q[x]/(x^d + 1)
//!
//! Ring elements are plain coefficient vectors; the ring itself (degree and modulus) is carried
//! separately by [`Ring`], which performs every operation and owns the byte-level blob format.
use crate::{AvpError, Result, DEGREE, MODULUS};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crypto_bigint::U64;
use std::io::{Read, Write};

/// Width in bytes of one serialized coefficient
pub const WORD_SIZE: usize = 4;

/// Largest absolute value in a list of centered coefficients; 0 when it is empty
pub fn max_magnitude(centered: &[i64]) -> i64 {
    return centered.iter().map(|c| c.abs()).max().unwrap_or(0);
}

/// A ring element: `d` coefficients, each held canonically in [0, q)
#[derive(Debug, Eq, PartialEq, Clone, Hash)]
pub struct Polynomial {
    coeffs: Vec<i64>,
}

impl Polynomial {
    /// Wrap coefficients that are already canonical. Callers outside this module go through
    /// [`Ring::from_signed`] instead.
    fn new(coeffs: Vec<i64>) -> Self {
        return Self { coeffs };
    }

    pub fn get_coeffs(&self) -> &[i64] {
        return &self.coeffs;
    }

    pub fn degree(&self) -> usize {
        return self.coeffs.len();
    }

    /// Serialize as little-endian signed 32-bit words, in coefficient order
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for coeff in self.coeffs.iter() {
            writer.write_i32::<LittleEndian>(*coeff as i32)?;
        }
        return Ok(());
    }
}

/// The ambient ring: polynomial degree `d` and prime modulus `q`
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Ring {
    degree: usize,
    modulus: i64,
}

impl Default for Ring {
    fn default() -> Self {
        return Self {
            degree: DEGREE,
            modulus: MODULUS,
        };
    }
}

impl Ring {
    /// Validate and construct a ring. The modulus must be a prime that fits a signed 32-bit word
    /// so that every canonical coefficient survives the blob encoding.
    pub fn new(degree: usize, modulus: i64) -> Result<Self> {
        if degree == 0 {
            return Err(AvpError::InvalidRing {
                message: "degree must be at least 1".to_string(),
            });
        }
        if modulus < 2 || modulus > i32::MAX as i64 {
            return Err(AvpError::InvalidRing {
                message: format!("modulus {modulus} must lie in [2, 2^31)"),
            });
        }
        if !crypto_primes::is_prime(&U64::from_u64(modulus as u64)) {
            return Err(AvpError::InvalidRing {
                message: format!("modulus {modulus} is not prime"),
            });
        }
        return Ok(Self { degree, modulus });
    }

    pub fn get_degree(&self) -> usize {
        return self.degree;
    }

    pub fn get_modulus(&self) -> i64 {
        return self.modulus;
    }

    /// The decode threshold q/4
    pub fn threshold(&self) -> i64 {
        return self.modulus / 4;
    }

    /// Size in bytes of one serialized ring element
    pub fn blob_size(&self) -> usize {
        return self.degree * WORD_SIZE;
    }

    pub fn zero(&self) -> Polynomial {
        return Polynomial::new(vec![0; self.degree]);
    }

    /// Reduce arbitrary signed integers into a canonical ring element
    pub fn from_signed(&self, coeffs: &[i64]) -> Polynomial {
        assert_eq!(coeffs.len(), self.degree, "coefficient count must match the ring degree");
        let coeffs = coeffs
            .iter()
            .map(|c| c.rem_euclid(self.modulus))
            .collect::<Vec<i64>>();
        return Polynomial::new(coeffs);
    }

    /// Elements of another ring are a programming error, never a runtime condition
    fn check(&self, poly: &Polynomial) {
        assert_eq!(
            poly.degree(),
            self.degree,
            "polynomial of degree {} used in a ring of degree {}",
            poly.degree(),
            self.degree
        );
    }

    pub fn add(&self, a: &Polynomial, b: &Polynomial) -> Polynomial {
        self.check(a);
        self.check(b);
        let coeffs = a
            .coeffs
            .iter()
            .zip(b.coeffs.iter())
            .map(|(x, y)| (x + y) % self.modulus)
            .collect::<Vec<i64>>();
        return Polynomial::new(coeffs);
    }

    pub fn sub(&self, a: &Polynomial, b: &Polynomial) -> Polynomial {
        self.check(a);
        self.check(b);
        let coeffs = a
            .coeffs
            .iter()
            .zip(b.coeffs.iter())
            .map(|(x, y)| (x - y).rem_euclid(self.modulus))
            .collect::<Vec<i64>>();
        return Polynomial::new(coeffs);
    }

    pub fn neg(&self, a: &Polynomial) -> Polynomial {
        self.check(a);
        let coeffs = a
            .coeffs
            .iter()
            .map(|x| (self.modulus - x) % self.modulus)
            .collect::<Vec<i64>>();
        return Polynomial::new(coeffs);
    }

    /// Schoolbook product followed by negacyclic folding: the coefficient of x^k for k >= d is
    /// subtracted from position k - d, since x^d = -1.
    pub fn mul(&self, a: &Polynomial, b: &Polynomial) -> Polynomial {
        self.check(a);
        self.check(b);
        let d = self.degree;
        let q = self.modulus;
        let mut wide = vec![0i64; 2 * d - 1];
        for (i, x) in a.coeffs.iter().enumerate() {
            for (j, y) in b.coeffs.iter().enumerate() {
                wide[i + j] = (wide[i + j] + x * y) % q;
            }
        }
        for k in d..(2 * d - 1) {
            wide[k - d] = (wide[k - d] - wide[k]).rem_euclid(q);
        }
        wide.truncate(d);
        return Polynomial::new(wide);
    }

    /// Coefficientwise sum of any number of ring elements
    pub fn sum<'a, I>(&self, polys: I) -> Polynomial
    where
        I: IntoIterator<Item = &'a Polynomial>,
    {
        return polys
            .into_iter()
            .fold(self.zero(), |acc, poly| self.add(&acc, poly));
    }

    /// Map each coefficient into (-q/2, q/2]
    pub fn center(&self, poly: &Polynomial) -> Vec<i64> {
        let half = self.modulus / 2;
        return poly
            .coeffs
            .iter()
            .map(|c| if *c > half { c - self.modulus } else { *c })
            .collect::<Vec<i64>>();
    }

    /// Largest absolute value among the centered coefficients
    pub fn inf_norm(&self, poly: &Polynomial) -> i64 {
        return max_magnitude(&self.center(poly));
    }

    /// Read exactly one ring element, rejecting non-canonical words
    pub fn read_from<R: Read>(&self, reader: &mut R) -> Result<Polynomial> {
        let mut coeffs = Vec::with_capacity(self.degree);
        for i in 0..self.degree {
            let word = reader
                .read_i32::<LittleEndian>()
                .map_err(|e| AvpError::codec(format!("coefficient {i}: {e}")))?;
            let coeff = word as i64;
            if coeff < 0 || coeff >= self.modulus {
                return Err(AvpError::codec(format!(
                    "coefficient {i} = {coeff} is outside [0, {})",
                    self.modulus
                )));
            }
            coeffs.push(coeff);
        }
        return Ok(Polynomial::new(coeffs));
    }

    pub fn to_bytes(&self, poly: &Polynomial) -> Result<Vec<u8>> {
        self.check(poly);
        let mut buf = Vec::with_capacity(self.blob_size());
        poly.write_to(&mut buf)
            .map_err(|e| AvpError::codec(e.to_string()))?;
        return Ok(buf);
    }

    pub fn from_bytes(&self, bytes: &[u8]) -> Result<Polynomial> {
        if bytes.len() != self.blob_size() {
            return Err(AvpError::codec(format!(
                "expected {} bytes, got {}",
                self.blob_size(),
                bytes.len()
            )));
        }
        let mut reader = bytes;
        return self.read_from(&mut reader);
    }
}
