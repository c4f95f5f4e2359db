//! Acceptance checks for ciphertexts received from outside the process.
//!
//! Each check answers with a plain `bool`; the reason for a rejection is
//! logged at `debug` level.

use crate::{
    ciphertext::{CIPHERTEXT_SIZE_MAX, CIPHERTEXT_SIZE_MIN, Ciphertext},
    params::HeContext,
};
use tracing::debug;

/// Metadata agrees with a level of `context`.
///
/// The key level is accepted only when `allow_key_level` is set.
pub fn is_metadata_valid_for(
    ciphertext: &Ciphertext,
    context: &HeContext,
    allow_key_level: bool,
) -> bool {
    if !context.parameters_set() {
        debug!("context parameters are not set");
        return false;
    }
    let parms_id = ciphertext.parms_id();
    let Some(data) = context.context_data(&parms_id) else {
        debug!(%parms_id, "unknown parms_id");
        return false;
    };
    if !allow_key_level && parms_id == context.key_parms_id() && context.levels().count() > 1 {
        debug!(%parms_id, "key level not allowed");
        return false;
    }

    let parms = data.parms();
    if ciphertext.poly_modulus_degree() != parms.poly_modulus_degree()
        || ciphertext.coeff_modulus_size() != parms.coeff_modulus().len()
    {
        debug!(
            degree = ciphertext.poly_modulus_degree(),
            modulus_count = ciphertext.coeff_modulus_size(),
            "shape disagrees with parms_id"
        );
        return false;
    }

    let size = ciphertext.size();
    if size != 0 && !(CIPHERTEXT_SIZE_MIN..=CIPHERTEXT_SIZE_MAX).contains(&size) {
        debug!(size, "size out of range");
        return false;
    }

    if ciphertext.is_ntt_form() != context.scheme().ciphertexts_in_ntt_form() {
        debug!(ntt = ciphertext.is_ntt_form(), "transform domain disagrees with scheme");
        return false;
    }
    true
}

/// The buffer holds exactly `size * N * K` words.
pub fn is_buffer_valid(ciphertext: &Ciphertext) -> bool {
    let expected = ciphertext
        .size()
        .checked_mul(ciphertext.poly_modulus_degree())
        .and_then(|words| words.checked_mul(ciphertext.coeff_modulus_size()));
    expected == Some(ciphertext.data().len())
}

/// Metadata is valid for a data level of `context` and every residue is
/// reduced modulo its prime.
pub fn is_data_valid_for(ciphertext: &Ciphertext, context: &HeContext) -> bool {
    if !is_metadata_valid_for(ciphertext, context, false) || !is_buffer_valid(ciphertext) {
        return false;
    }
    let Some(data) = context.context_data(&ciphertext.parms_id()) else {
        return false;
    };
    let moduli = data.parms().coeff_modulus();
    let degree = ciphertext.poly_modulus_degree();

    for (poly, residues) in ciphertext.polys().enumerate() {
        for (prime, (row, &modulus)) in residues.chunks_exact(degree).zip(moduli).enumerate() {
            if let Some(coeff) = row.iter().position(|&c| c >= modulus) {
                debug!(poly, prime, coeff, modulus, "residue not reduced");
                return false;
            }
        }
    }
    true
}

/// Safe to hand to an evaluator or decryptor: well formed, reduced, and not
/// transparent.
pub fn is_valid_for(ciphertext: &Ciphertext, context: &HeContext) -> bool {
    if !is_data_valid_for(ciphertext, context) {
        return false;
    }
    if ciphertext.is_transparent() {
        debug!("ciphertext is transparent");
        return false;
    }
    true
}
