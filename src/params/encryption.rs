use super::ParmsId;
use crate::math::{is_ntt_friendly_prime, is_prime, ntt_primes};
use std::collections::BTreeMap;
use thiserror::Error;

pub const POLY_MODULUS_DEGREE_MIN: usize = 2;
pub const POLY_MODULUS_DEGREE_MAX: usize = 131_072;
/// Every prime stays below 2^61, so a reduced residue can never equal
/// [`crate::SEED_MARKER`].
pub const COEFF_MODULUS_BITS_MAX: u32 = 61;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("ring degree must be a power of two in [{min}, {max}], got {degree}")]
    InvalidDegree { degree: usize, min: usize, max: usize },

    #[error("coefficient modulus must contain at least one prime")]
    EmptyCoeffModulus,

    #[error("modulus {modulus} is wider than {max_bits} bits")]
    ModulusTooWide { modulus: u64, max_bits: u32 },

    #[error("modulus {0} is not prime")]
    NotPrime(u64),

    #[error("modulus {modulus} is not NTT-friendly for degree {degree}")]
    NotNttFriendly { modulus: u64, degree: usize },

    #[error("modulus {0} appears more than once")]
    DuplicateModulus(u64),

    #[error("unable to find {count} NTT-friendly primes of {bits} bits for degree {degree}")]
    PrimeGenerationFailed { bits: u32, count: usize, degree: usize },
}

pub type ParamsResult<T> = Result<T, ParamsError>;

/// Which scheme the parameters are meant for. Only the transform-domain
/// convention depends on it here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeType {
    Bfv,
    Ckks,
    Bgv,
}

impl SchemeType {
    fn tag(self) -> u64 {
        match self {
            Self::Bfv => 1,
            Self::Ckks => 2,
            Self::Bgv => 3,
        }
    }

    /// Whether ciphertexts of this scheme live in the NTT domain.
    pub fn ciphertexts_in_ntt_form(self) -> bool {
        match self {
            Self::Bfv => false,
            Self::Ckks | Self::Bgv => true,
        }
    }
}

/// One `(scheme, N, q_0 … q_{K-1})` configuration. Not validated on
/// construction: [`HeContext`](super::HeContext) decides whether it is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionParameters {
    scheme: SchemeType,
    poly_modulus_degree: usize,
    coeff_modulus: Vec<u64>,
}

impl EncryptionParameters {
    pub fn new(scheme: SchemeType, poly_modulus_degree: usize, coeff_modulus: Vec<u64>) -> Self {
        Self {
            scheme,
            poly_modulus_degree,
            coeff_modulus,
        }
    }

    pub fn scheme(&self) -> SchemeType {
        self.scheme
    }

    pub fn poly_modulus_degree(&self) -> usize {
        self.poly_modulus_degree
    }

    pub fn coeff_modulus(&self) -> &[u64] {
        &self.coeff_modulus
    }

    pub fn parms_id(&self) -> ParmsId {
        let header = [self.scheme.tag(), self.poly_modulus_degree as u64];
        ParmsId::fingerprint(header.into_iter().chain(self.coeff_modulus.iter().copied()))
    }

    pub fn validate(&self) -> ParamsResult<()> {
        let degree = self.poly_modulus_degree;
        if !degree.is_power_of_two()
            || !(POLY_MODULUS_DEGREE_MIN..=POLY_MODULUS_DEGREE_MAX).contains(&degree)
        {
            return Err(ParamsError::InvalidDegree {
                degree,
                min: POLY_MODULUS_DEGREE_MIN,
                max: POLY_MODULUS_DEGREE_MAX,
            });
        }
        if self.coeff_modulus.is_empty() {
            return Err(ParamsError::EmptyCoeffModulus);
        }
        for (i, &modulus) in self.coeff_modulus.iter().enumerate() {
            if modulus >> COEFF_MODULUS_BITS_MAX != 0 {
                return Err(ParamsError::ModulusTooWide {
                    modulus,
                    max_bits: COEFF_MODULUS_BITS_MAX,
                });
            }
            if !is_prime(modulus) {
                return Err(ParamsError::NotPrime(modulus));
            }
            if !is_ntt_friendly_prime(modulus, degree as u64) {
                return Err(ParamsError::NotNttFriendly { modulus, degree });
            }
            if self.coeff_modulus[..i].contains(&modulus) {
                return Err(ParamsError::DuplicateModulus(modulus));
            }
        }
        Ok(())
    }

    /// The same parameters with the last `count` primes removed.
    pub(crate) fn drop_last(&self, count: usize) -> Self {
        let keep = self.coeff_modulus.len().saturating_sub(count);
        Self {
            scheme: self.scheme,
            poly_modulus_degree: self.poly_modulus_degree,
            coeff_modulus: self.coeff_modulus[..keep].to_vec(),
        }
    }
}

/// Builder for [`EncryptionParameters`], either from explicit primes or
/// from a list of prime bit sizes.
pub struct EncryptionParametersBuilder {
    scheme: SchemeType,
    poly_modulus_degree: usize,
    prime_bits: Vec<u32>,
    custom_primes: Option<Vec<u64>>,
}

impl EncryptionParametersBuilder {
    pub fn new(scheme: SchemeType, poly_modulus_degree: usize) -> Self {
        Self {
            scheme,
            poly_modulus_degree,
            prime_bits: Vec::new(),
            custom_primes: None,
        }
    }

    pub fn with_custom_primes(mut self, primes: Vec<u64>) -> Self {
        self.custom_primes = Some(primes);
        self
    }

    pub fn with_prime_bits(mut self, bits: Vec<u32>) -> Self {
        self.prime_bits = bits;
        self
    }

    pub fn with_uniform_prime_bits(mut self, bits: u32, count: usize) -> Self {
        self.prime_bits = vec![bits; count];
        self
    }

    pub fn build(self) -> ParamsResult<EncryptionParameters> {
        let coeff_modulus = match self.custom_primes {
            Some(primes) => primes,
            None => generate_coeff_modulus(&self.prime_bits, self.poly_modulus_degree)?,
        };
        let params = EncryptionParameters::new(self.scheme, self.poly_modulus_degree, coeff_modulus);
        params.validate()?;
        Ok(params)
    }
}

/// Picks distinct NTT-friendly primes, one per entry of `bit_sizes`, keeping
/// the requested order.
fn generate_coeff_modulus(bit_sizes: &[u32], degree: usize) -> ParamsResult<Vec<u64>> {
    if bit_sizes.is_empty() {
        return Err(ParamsError::EmptyCoeffModulus);
    }
    if !(POLY_MODULUS_DEGREE_MIN..=POLY_MODULUS_DEGREE_MAX).contains(&degree) {
        return Err(ParamsError::InvalidDegree {
            degree,
            min: POLY_MODULUS_DEGREE_MIN,
            max: POLY_MODULUS_DEGREE_MAX,
        });
    }
    let mut per_size: BTreeMap<u32, usize> = BTreeMap::new();
    for &bits in bit_sizes {
        if !(2..=COEFF_MODULUS_BITS_MAX).contains(&bits) {
            return Err(ParamsError::PrimeGenerationFailed {
                bits,
                count: 1,
                degree,
            });
        }
        *per_size.entry(bits).or_default() += 1;
    }

    let mut pools = BTreeMap::new();
    for (&bits, &count) in &per_size {
        let primes = ntt_primes(bits, degree as u64, count)
            .ok_or(ParamsError::PrimeGenerationFailed { bits, count, degree })?;
        pools.insert(bits, primes.into_iter());
    }

    bit_sizes
        .iter()
        .map(|bits| {
            pools
                .get_mut(bits)
                .and_then(Iterator::next)
                .ok_or(ParamsError::PrimeGenerationFailed {
                    bits: *bits,
                    count: per_size[bits],
                    degree,
                })
        })
        .collect()
}
