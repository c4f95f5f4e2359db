//! RNS ciphertext storage.
//!
//! A ciphertext of size `T` over `N` coefficients and `K` primes is one flat
//! buffer of `T * K * N` words: polynomial-major, then prime-major, then
//! coefficient-minor. Polynomial `p`, prime `k`, coefficient `i` lives at
//! `(p * K + k) * N + i`.

pub mod buffer;
mod display;
pub mod seed;

use crate::{
    errors::{CiphertextError, CiphertextResult, mul_checked},
    params::{ParameterRegistry, ParmsId},
};
use buffer::CoeffBuffer;
use tracing::{debug, instrument};

pub use seed::{CiphertextPayload, SEED_MARKER, SeededCiphertext};

pub const CIPHERTEXT_SIZE_MIN: usize = 2;
pub const CIPHERTEXT_SIZE_MAX: usize = 16;

/// A ciphertext: two or more RNS polynomials plus the metadata that says how
/// to read them.
///
/// The buffer may hold more polynomials than `size` (see
/// [`size_capacity`](Self::size_capacity)) so evaluators can grow a
/// ciphertext without reallocating.
///
/// The metadata setters perform no checks. Only the encryptor, evaluator and
/// decryptor should change `parms_id`, `is_ntt_form`, `scale` or
/// `correction_factor`; a wrong value silently breaks the scheme.
#[derive(Debug, Clone)]
pub struct Ciphertext {
    parms_id: ParmsId,
    is_ntt_form: bool,
    size: usize,
    poly_modulus_degree: usize,
    coeff_modulus_size: usize,
    scale: f64,
    correction_factor: u64,
    data: CoeffBuffer,
}

impl Default for Ciphertext {
    fn default() -> Self {
        Self {
            parms_id: ParmsId::ZERO,
            is_ntt_form: false,
            size: 0,
            poly_modulus_degree: 0,
            coeff_modulus_size: 0,
            scale: 1.0,
            correction_factor: 1,
            data: CoeffBuffer::default(),
        }
    }
}

// ─── Construction & lifecycle ────────────────────────────────────────────────

impl Ciphertext {
    /// An empty ciphertext with no allocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty ciphertext with room for two polynomials at the registry's
    /// first data level.
    pub fn with_context<R: ParameterRegistry + ?Sized>(registry: &R) -> CiphertextResult<Self> {
        Self::with_capacity(registry, registry.first_parms_id(), CIPHERTEXT_SIZE_MIN)
    }

    /// Empty ciphertext with room for two polynomials at `parms_id`.
    pub fn with_parms_id<R: ParameterRegistry + ?Sized>(
        registry: &R,
        parms_id: ParmsId,
    ) -> CiphertextResult<Self> {
        Self::with_capacity(registry, parms_id, CIPHERTEXT_SIZE_MIN)
    }

    /// Empty ciphertext with room for `capacity` polynomials at `parms_id`.
    pub fn with_capacity<R: ParameterRegistry + ?Sized>(
        registry: &R,
        parms_id: ParmsId,
        capacity: usize,
    ) -> CiphertextResult<Self> {
        let mut ciphertext = Self::new();
        ciphertext.reserve(registry, parms_id, capacity)?;
        Ok(ciphertext)
    }

    /// Makes room for `capacity` polynomials laid out for `parms_id`.
    ///
    /// Never shrinks the allocation. A `capacity` below the current size is
    /// raised to the current size, so committed polynomials are never
    /// dropped. Fails without touching `self` if the id is unknown, the
    /// capacity is outside `[2, 16]`, the allocation size overflows, or
    /// `self` holds polynomials laid out for a different `(N, K)`.
    #[instrument(level = "debug", skip_all, fields(parms_id = %parms_id, capacity = capacity))]
    pub fn reserve<R: ParameterRegistry + ?Sized>(
        &mut self,
        registry: &R,
        parms_id: ParmsId,
        capacity: usize,
    ) -> CiphertextResult<()> {
        let (degree, modulus_count) = lookup_shape(registry, &parms_id)?;
        self.reserve_internal(capacity, degree, modulus_count)?;
        self.parms_id = parms_id;
        Ok(())
    }

    /// [`reserve`](Self::reserve) at the registry's first data level.
    pub fn reserve_first<R: ParameterRegistry + ?Sized>(
        &mut self,
        registry: &R,
        capacity: usize,
    ) -> CiphertextResult<()> {
        self.reserve(registry, registry.first_parms_id(), capacity)
    }

    /// [`reserve`](Self::reserve) with the current parameters.
    pub fn reserve_current(&mut self, capacity: usize) -> CiphertextResult<()> {
        if self.poly_len() == 0 {
            return Err(CiphertextError::NotParameterized);
        }
        self.reserve_internal(capacity, self.poly_modulus_degree, self.coeff_modulus_size)
    }

    /// Sets the number of polynomials, reallocating when the capacity is too
    /// small.
    ///
    /// Polynomials brought into view read as zero; shrinking keeps the
    /// leading polynomials intact. If `parms_id` has a different `(N, K)`
    /// than the current layout, the old content is discarded and every
    /// polynomial reads as zero. Fails without touching `self` on an unknown
    /// id, a size outside `[2, 16]`, or an overflowing allocation size.
    #[instrument(level = "debug", skip_all, fields(parms_id = %parms_id, size = size))]
    pub fn resize<R: ParameterRegistry + ?Sized>(
        &mut self,
        registry: &R,
        parms_id: ParmsId,
        size: usize,
    ) -> CiphertextResult<()> {
        let (degree, modulus_count) = lookup_shape(registry, &parms_id)?;
        self.resize_internal(size, degree, modulus_count)?;
        self.parms_id = parms_id;
        Ok(())
    }

    /// [`resize`](Self::resize) at the registry's first data level.
    pub fn resize_first<R: ParameterRegistry + ?Sized>(
        &mut self,
        registry: &R,
        size: usize,
    ) -> CiphertextResult<()> {
        self.resize(registry, registry.first_parms_id(), size)
    }

    /// [`resize`](Self::resize) with the current parameters.
    pub fn resize_current(&mut self, size: usize) -> CiphertextResult<()> {
        if self.poly_len() == 0 {
            return Err(CiphertextError::NotParameterized);
        }
        self.resize_internal(size, self.poly_modulus_degree, self.coeff_modulus_size)
    }

    /// Frees the buffer and resets every field to its default.
    pub fn release(&mut self) {
        self.data.release();
        self.parms_id = ParmsId::ZERO;
        self.is_ntt_form = false;
        self.size = 0;
        self.poly_modulus_degree = 0;
        self.coeff_modulus_size = 0;
        self.scale = 1.0;
        self.correction_factor = 1;
    }

    /// Moves the ciphertext out, leaving an empty one behind.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    fn reserve_internal(
        &mut self,
        capacity: usize,
        degree: usize,
        modulus_count: usize,
    ) -> CiphertextResult<()> {
        if capacity < CIPHERTEXT_SIZE_MIN {
            return Err(CiphertextError::CapacityTooSmall {
                capacity,
                min: CIPHERTEXT_SIZE_MIN,
            });
        }
        if capacity > CIPHERTEXT_SIZE_MAX {
            return Err(CiphertextError::CapacityTooLarge {
                capacity,
                max: CIPHERTEXT_SIZE_MAX,
            });
        }
        if self.size > 0
            && (degree, modulus_count) != (self.poly_modulus_degree, self.coeff_modulus_size)
        {
            return Err(CiphertextError::ShapeMismatch {
                size: self.size,
                current_degree: self.poly_modulus_degree,
                current_modulus_count: self.coeff_modulus_size,
                degree,
                modulus_count,
            });
        }
        let capacity = if capacity < self.size {
            debug!(requested = capacity, size = self.size, "capacity raised to current size");
            self.size
        } else {
            capacity
        };
        let words = allocation_words(capacity, degree, modulus_count)?;

        if self.data.reserve(words) {
            debug!(words, "ciphertext buffer reallocated");
        }
        self.poly_modulus_degree = degree;
        self.coeff_modulus_size = modulus_count;
        Ok(())
    }

    fn resize_internal(
        &mut self,
        size: usize,
        degree: usize,
        modulus_count: usize,
    ) -> CiphertextResult<()> {
        if size < CIPHERTEXT_SIZE_MIN {
            return Err(CiphertextError::SizeTooSmall {
                size,
                min: CIPHERTEXT_SIZE_MIN,
            });
        }
        if size > CIPHERTEXT_SIZE_MAX {
            return Err(CiphertextError::SizeTooLarge {
                size,
                max: CIPHERTEXT_SIZE_MAX,
            });
        }
        let words = allocation_words(size, degree, modulus_count)?;

        if (degree, modulus_count) != (self.poly_modulus_degree, self.coeff_modulus_size) {
            self.data.resize(0);
        }
        if words > self.data.capacity() {
            debug!(words, "ciphertext buffer reallocated");
        }
        self.data.resize(words);
        self.size = size;
        self.poly_modulus_degree = degree;
        self.coeff_modulus_size = modulus_count;
        Ok(())
    }
}

fn lookup_shape<R: ParameterRegistry + ?Sized>(
    registry: &R,
    parms_id: &ParmsId,
) -> CiphertextResult<(usize, usize)> {
    let entry = registry
        .lookup(parms_id)
        .ok_or(CiphertextError::UnknownParmsId { parms_id: *parms_id })?;
    if !entry.is_valid {
        return Err(CiphertextError::ParametersNotSet {
            reason: format!("parms_id {parms_id} names rejected parameters"),
        });
    }
    Ok((entry.degree, entry.modulus_count()))
}

/// `polys * degree * modulus_count`, checked against both `usize` and the
/// largest byte size an allocation may have.
fn allocation_words(polys: usize, degree: usize, modulus_count: usize) -> CiphertextResult<usize> {
    let poly_len = mul_checked("polynomial length", degree, modulus_count)?;
    let words = mul_checked("allocation size", polys, poly_len)?;
    let bytes = mul_checked("allocation bytes", words, size_of::<u64>())?;
    if bytes > isize::MAX as usize {
        return Err(CiphertextError::Overflow {
            what: "allocation bytes",
            lhs: words,
            rhs: size_of::<u64>(),
        });
    }
    Ok(words)
}

// ─── Metadata ────────────────────────────────────────────────────────────────

impl Ciphertext {
    pub fn poly_modulus_degree(&self) -> usize {
        self.poly_modulus_degree
    }

    pub fn coeff_modulus_size(&self) -> usize {
        self.coeff_modulus_size
    }

    /// Number of polynomials.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Largest size that fits the current allocation with the current
    /// `(N, K)`; 0 when unparameterized.
    pub fn size_capacity(&self) -> usize {
        match self.poly_len() {
            0 => 0,
            poly_len => self.data.capacity() / poly_len,
        }
    }

    pub fn is_ntt_form(&self) -> bool {
        self.is_ntt_form
    }

    pub fn set_ntt_form(&mut self, is_ntt_form: bool) {
        self.is_ntt_form = is_ntt_form;
    }

    pub fn parms_id(&self) -> ParmsId {
        self.parms_id
    }

    pub fn set_parms_id(&mut self, parms_id: ParmsId) {
        self.parms_id = parms_id;
    }

    /// CKKS scale; not used by the other schemes.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    /// BGV correction factor; not used by the other schemes.
    pub fn correction_factor(&self) -> u64 {
        self.correction_factor
    }

    pub fn set_correction_factor(&mut self, correction_factor: u64) {
        self.correction_factor = correction_factor;
    }

    /// `N * K`: words per polynomial.
    fn poly_len(&self) -> usize {
        self.poly_modulus_degree * self.coeff_modulus_size
    }
}

// ─── Coefficient access ──────────────────────────────────────────────────────

impl Ciphertext {
    /// All `size * N * K` coefficients.
    pub fn data(&self) -> &[u64] {
        self.data.as_slice()
    }

    pub fn data_mut(&mut self) -> &mut [u64] {
        self.data.as_mut_slice()
    }

    /// The `K * N` words of polynomial `index`. Empty when unparameterized.
    pub fn poly(&self, index: usize) -> CiphertextResult<&[u64]> {
        let range = self.poly_range(index)?;
        Ok(&self.data.as_slice()[range])
    }

    pub fn poly_mut(&mut self, index: usize) -> CiphertextResult<&mut [u64]> {
        let range = self.poly_range(index)?;
        Ok(&mut self.data.as_mut_slice()[range])
    }

    /// The `N` residues of polynomial `poly` modulo prime `prime`.
    pub fn rns_poly(&self, poly: usize, prime: usize) -> CiphertextResult<&[u64]> {
        let start = self.offset(poly, prime, 0)?;
        Ok(&self.data.as_slice()[start..start + self.poly_modulus_degree])
    }

    pub fn rns_poly_mut(&mut self, poly: usize, prime: usize) -> CiphertextResult<&mut [u64]> {
        let start = self.offset(poly, prime, 0)?;
        let degree = self.poly_modulus_degree;
        Ok(&mut self.data.as_mut_slice()[start..start + degree])
    }

    /// Iterates over the polynomials in order.
    pub fn polys(&self) -> impl ExactSizeIterator<Item = &[u64]> {
        // The buffer is empty whenever `poly_len` is 0.
        self.data.as_slice().chunks_exact(self.poly_len().max(1))
    }

    /// Flat position of `(poly, prime, coeff)`.
    pub fn offset(&self, poly: usize, prime: usize, coeff: usize) -> CiphertextResult<usize> {
        if poly >= self.size {
            return Err(CiphertextError::PolyIndexOutOfRange {
                index: poly,
                size: self.size,
            });
        }
        if prime >= self.coeff_modulus_size {
            return Err(CiphertextError::PrimeIndexOutOfRange {
                index: prime,
                modulus_count: self.coeff_modulus_size,
            });
        }
        if coeff >= self.poly_modulus_degree {
            return Err(CiphertextError::CoeffIndexOutOfRange {
                index: coeff,
                len: self.poly_modulus_degree,
            });
        }
        let row = mul_checked("polynomial offset", poly, self.coeff_modulus_size)?
            .checked_add(prime)
            .ok_or(CiphertextError::Overflow {
                what: "residue row",
                lhs: poly,
                rhs: prime,
            })?;
        mul_checked("residue offset", row, self.poly_modulus_degree)?
            .checked_add(coeff)
            .ok_or(CiphertextError::Overflow {
                what: "coefficient offset",
                lhs: row,
                rhs: coeff,
            })
    }

    pub fn residue(&self, poly: usize, prime: usize, coeff: usize) -> CiphertextResult<u64> {
        let at = self.offset(poly, prime, coeff)?;
        Ok(self.data.as_slice()[at])
    }

    pub fn residue_mut(
        &mut self,
        poly: usize,
        prime: usize,
        coeff: usize,
    ) -> CiphertextResult<&mut u64> {
        let at = self.offset(poly, prime, coeff)?;
        Ok(&mut self.data.as_mut_slice()[at])
    }

    /// Coefficient at flat position `index` in `[0, size * N * K)`.
    pub fn coeff(&self, index: usize) -> CiphertextResult<u64> {
        self.data
            .as_slice()
            .get(index)
            .copied()
            .ok_or(CiphertextError::CoeffIndexOutOfRange {
                index,
                len: self.data.len(),
            })
    }

    pub fn coeff_mut(&mut self, index: usize) -> CiphertextResult<&mut u64> {
        let len = self.data.len();
        self.data
            .as_mut_slice()
            .get_mut(index)
            .ok_or(CiphertextError::CoeffIndexOutOfRange { index, len })
    }

    fn poly_range(&self, index: usize) -> CiphertextResult<std::ops::Range<usize>> {
        let poly_len = self.poly_len();
        if poly_len == 0 {
            return Ok(0..0);
        }
        if index >= self.size {
            return Err(CiphertextError::PolyIndexOutOfRange {
                index,
                size: self.size,
            });
        }
        let start = index * poly_len;
        Ok(start..start + poly_len)
    }
}

// ─── Security checks ─────────────────────────────────────────────────────────

impl Ciphertext {
    /// Whether the ciphertext can be decrypted without the secret key: it is
    /// empty, has fewer than two polynomials, or every coefficient from
    /// polynomial 1 onward is zero.
    ///
    /// Such ciphertexts must be rejected before being accepted as input.
    pub fn is_transparent(&self) -> bool {
        if self.data.is_empty() || self.size < CIPHERTEXT_SIZE_MIN {
            return true;
        }
        self.data.as_slice()[self.poly_len()..].iter().all(|&c| c == 0)
    }
}

/// Compares metadata and the logical coefficients; spare capacity is ignored.
/// `scale` is compared bit for bit.
impl PartialEq for Ciphertext {
    fn eq(&self, other: &Self) -> bool {
        self.parms_id == other.parms_id
            && self.is_ntt_form == other.is_ntt_form
            && self.size == other.size
            && self.poly_modulus_degree == other.poly_modulus_degree
            && self.coeff_modulus_size == other.coeff_modulus_size
            && self.scale.to_bits() == other.scale.to_bits()
            && self.correction_factor == other.correction_factor
            && self.data.as_slice() == other.data.as_slice()
    }
}
