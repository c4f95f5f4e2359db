//! Seed-compressed ciphertexts.
//!
//! A fresh symmetric encryption draws its second polynomial uniformly from a
//! seeded PRNG, so that polynomial can travel as the seed alone. The compact
//! form is held as a [`SeededCiphertext`]; the in-buffer [`SEED_MARKER`] is
//! only written while turning a compact form back into a [`Ciphertext`].

use super::{CIPHERTEXT_SIZE_MIN, Ciphertext};
use crate::{
    errors::{CiphertextError, CiphertextResult},
    math::sample_poly_uniform,
    params::{ParameterRegistry, ParmsId},
    prng::PrngDescriptor,
};
use tracing::{debug, instrument};

/// Written into the first residue of polynomial 1 of a size-2 ciphertext
/// whose polynomial 1 still has to be regenerated. Every prime is below
/// 2^61, so no reduced residue takes this value.
pub const SEED_MARKER: u64 = u64::MAX;

impl Ciphertext {
    /// `true` for a size-2 ciphertext whose polynomial 1 starts with
    /// [`SEED_MARKER`].
    pub fn has_seed_marker(&self) -> bool {
        let poly_len = self.poly_len();
        self.size == CIPHERTEXT_SIZE_MIN
            && poly_len > 0
            && self.data.as_slice()[poly_len] == SEED_MARKER
    }

    /// Regenerates polynomial 1 from `descriptor`, overwriting the marker.
    ///
    /// Residues are drawn prime by prime, coefficient by coefficient, in
    /// storage order, so the same registry, `parms_id` and descriptor always
    /// produce the same words.
    #[instrument(level = "debug", skip_all, fields(parms_id = %self.parms_id))]
    pub fn expand_seed<R: ParameterRegistry + ?Sized>(
        &mut self,
        registry: &R,
        descriptor: &PrngDescriptor,
    ) -> CiphertextResult<()> {
        if !self.has_seed_marker() {
            return Err(CiphertextError::MissingSeedMarker);
        }
        if descriptor.parms_id() != self.parms_id {
            return Err(CiphertextError::SeedParmsMismatch {
                descriptor: descriptor.parms_id(),
                ciphertext: self.parms_id,
            });
        }
        let entry = registry
            .lookup(&self.parms_id)
            .ok_or(CiphertextError::UnknownParmsId {
                parms_id: self.parms_id,
            })?;
        if !entry.is_valid {
            return Err(CiphertextError::ParametersNotSet {
                reason: format!("parms_id {} names rejected parameters", self.parms_id),
            });
        }
        if (entry.degree, entry.modulus_count()) != (self.poly_modulus_degree, self.coeff_modulus_size)
        {
            return Err(CiphertextError::ShapeMismatch {
                size: self.size,
                current_degree: self.poly_modulus_degree,
                current_modulus_count: self.coeff_modulus_size,
                degree: entry.degree,
                modulus_count: entry.modulus_count(),
            });
        }

        let poly_len = self.poly_len();
        let mut prng = descriptor.make_prng();
        sample_poly_uniform(
            entry.coeff_modulus,
            self.poly_modulus_degree,
            &mut prng,
            &mut self.data.as_mut_slice()[poly_len..2 * poly_len],
        );
        debug!(words = poly_len, "seeded polynomial expanded");
        Ok(())
    }

    /// Compact form of a fresh size-2 ciphertext whose polynomial 1 was drawn
    /// from `descriptor`.
    ///
    /// Polynomial 1 is not stored, and not checked against the descriptor:
    /// the caller vouches that it was sampled from it.
    pub fn compact(&self, descriptor: PrngDescriptor) -> CiphertextResult<SeededCiphertext> {
        if self.size != CIPHERTEXT_SIZE_MIN {
            return Err(CiphertextError::NotCompactable { size: self.size });
        }
        if descriptor.parms_id() != self.parms_id {
            return Err(CiphertextError::SeedParmsMismatch {
                descriptor: descriptor.parms_id(),
                ciphertext: self.parms_id,
            });
        }
        Ok(SeededCiphertext {
            parms_id: self.parms_id,
            is_ntt_form: self.is_ntt_form,
            scale: self.scale,
            correction_factor: self.correction_factor,
            poly_modulus_degree: self.poly_modulus_degree,
            coeff_modulus_size: self.coeff_modulus_size,
            c0: self.poly(0)?.to_vec(),
            descriptor,
        })
    }
}

/// A size-2 ciphertext whose second polynomial is represented by the seed it
/// was sampled from.
#[derive(Debug, Clone, PartialEq)]
pub struct SeededCiphertext {
    parms_id: ParmsId,
    is_ntt_form: bool,
    scale: f64,
    correction_factor: u64,
    poly_modulus_degree: usize,
    coeff_modulus_size: usize,
    c0: Vec<u64>,
    descriptor: PrngDescriptor,
}

impl SeededCiphertext {
    pub fn parms_id(&self) -> ParmsId {
        self.parms_id
    }

    pub fn is_ntt_form(&self) -> bool {
        self.is_ntt_form
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn correction_factor(&self) -> u64 {
        self.correction_factor
    }

    pub fn poly_modulus_degree(&self) -> usize {
        self.poly_modulus_degree
    }

    pub fn coeff_modulus_size(&self) -> usize {
        self.coeff_modulus_size
    }

    /// The stored polynomial 0.
    pub fn c0(&self) -> &[u64] {
        &self.c0
    }

    pub fn descriptor(&self) -> &PrngDescriptor {
        &self.descriptor
    }

    /// Rebuilds the full ciphertext, regenerating polynomial 1.
    pub fn expand<R: ParameterRegistry + ?Sized>(&self, registry: &R) -> CiphertextResult<Ciphertext> {
        let mut ciphertext = Ciphertext::new();
        ciphertext.resize(registry, self.parms_id, CIPHERTEXT_SIZE_MIN)?;
        let poly_len = ciphertext.poly_len();
        if self.c0.len() != poly_len {
            return Err(CiphertextError::ShapeMismatch {
                size: CIPHERTEXT_SIZE_MIN,
                current_degree: self.poly_modulus_degree,
                current_modulus_count: self.coeff_modulus_size,
                degree: ciphertext.poly_modulus_degree,
                modulus_count: ciphertext.coeff_modulus_size,
            });
        }
        ciphertext.is_ntt_form = self.is_ntt_form;
        ciphertext.scale = self.scale;
        ciphertext.correction_factor = self.correction_factor;

        let data = ciphertext.data_mut();
        data[..poly_len].copy_from_slice(&self.c0);
        data[poly_len] = SEED_MARKER;
        ciphertext.expand_seed(registry, &self.descriptor)?;
        Ok(ciphertext)
    }
}

/// A ciphertext as it arrives from storage or the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum CiphertextPayload {
    Full(Ciphertext),
    Seeded(SeededCiphertext),
}

impl CiphertextPayload {
    pub fn is_seeded(&self) -> bool {
        matches!(self, Self::Seeded(_))
    }

    pub fn parms_id(&self) -> ParmsId {
        match self {
            Self::Full(ciphertext) => ciphertext.parms_id(),
            Self::Seeded(seeded) => seeded.parms_id(),
        }
    }

    /// The full ciphertext, expanding a seeded payload first.
    pub fn into_ciphertext<R: ParameterRegistry + ?Sized>(
        self,
        registry: &R,
    ) -> CiphertextResult<Ciphertext> {
        match self {
            Self::Full(ciphertext) => Ok(ciphertext),
            Self::Seeded(seeded) => seeded.expand(registry),
        }
    }
}
