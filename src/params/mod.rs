pub mod context;
pub mod encryption;
pub mod parms_id;

pub use context::{ContextData, HeContext};
pub use encryption::{
    COEFF_MODULUS_BITS_MAX, EncryptionParameters, EncryptionParametersBuilder,
    POLY_MODULUS_DEGREE_MAX, POLY_MODULUS_DEGREE_MIN, ParamsError, ParamsResult, SchemeType,
};
pub use parms_id::ParmsId;

/// What a registry knows about one `parms_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParmsEntry<'a> {
    pub degree: usize,
    pub coeff_modulus: &'a [u64],
    /// `false` when the id names parameters the registry refused to set up.
    pub is_valid: bool,
}

impl ParmsEntry<'_> {
    pub fn modulus_count(&self) -> usize {
        self.coeff_modulus.len()
    }
}

/// Source of `(N, q_0 … q_{K-1})` for a parameter identifier.
pub trait ParameterRegistry {
    fn lookup(&self, parms_id: &ParmsId) -> Option<ParmsEntry<'_>>;

    /// Identifier used when the caller does not name one.
    fn first_parms_id(&self) -> ParmsId;
}
