use crate::params::ParmsId;
use thiserror::Error;

/// Coarse classification of every [`CiphertextError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Overflow,
    OutOfRange,
    LogicError,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CiphertextError {
    #[error("encryption parameters are not set correctly: {reason}")]
    ParametersNotSet { reason: String },

    #[error("parms_id {parms_id} is not valid for the encryption parameters")]
    UnknownParmsId { parms_id: ParmsId },

    #[error("invalid size capacity {capacity}: must be at least {min}")]
    CapacityTooSmall { capacity: usize, min: usize },

    #[error("invalid size capacity {capacity}: must be at most {max}")]
    CapacityTooLarge { capacity: usize, max: usize },

    #[error("invalid size {size}: must be at least {min}")]
    SizeTooSmall { size: usize, min: usize },

    #[error("invalid size {size}: must be at most {max}")]
    SizeTooLarge { size: usize, max: usize },

    #[error(
        "cannot reserve (N={degree}, K={modulus_count}) over {size} polynomials \
         laid out for (N={current_degree}, K={current_modulus_count})"
    )]
    ShapeMismatch {
        size: usize,
        current_degree: usize,
        current_modulus_count: usize,
        degree: usize,
        modulus_count: usize,
    },

    #[error("seed descriptor is bound to {descriptor} but the ciphertext uses {ciphertext}")]
    SeedParmsMismatch {
        descriptor: ParmsId,
        ciphertext: ParmsId,
    },

    #[error("cannot compact a ciphertext of size {size}: exactly 2 polynomials required")]
    NotCompactable { size: usize },

    #[error("{what} overflows usize: {lhs} * {rhs}")]
    Overflow {
        what: &'static str,
        lhs: usize,
        rhs: usize,
    },

    #[error("polynomial index {index} out of range [0, {size})")]
    PolyIndexOutOfRange { index: usize, size: usize },

    #[error("prime index {index} out of range [0, {modulus_count})")]
    PrimeIndexOutOfRange { index: usize, modulus_count: usize },

    #[error("coefficient index {index} out of range [0, {len})")]
    CoeffIndexOutOfRange { index: usize, len: usize },

    #[error("ciphertext is not associated with any encryption parameters")]
    NotParameterized,

    #[error("ciphertext does not carry a seed marker")]
    MissingSeedMarker,
}

impl CiphertextError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ParametersNotSet { .. }
            | Self::UnknownParmsId { .. }
            | Self::CapacityTooSmall { .. }
            | Self::CapacityTooLarge { .. }
            | Self::SizeTooSmall { .. }
            | Self::SizeTooLarge { .. }
            | Self::ShapeMismatch { .. }
            | Self::SeedParmsMismatch { .. }
            | Self::NotCompactable { .. } => ErrorKind::InvalidArgument,
            Self::Overflow { .. } => ErrorKind::Overflow,
            Self::PolyIndexOutOfRange { .. }
            | Self::PrimeIndexOutOfRange { .. }
            | Self::CoeffIndexOutOfRange { .. } => ErrorKind::OutOfRange,
            Self::NotParameterized | Self::MissingSeedMarker => ErrorKind::LogicError,
        }
    }
}

pub type CiphertextResult<T> = Result<T, CiphertextError>;

/// `lhs * rhs`, reported as [`CiphertextError::Overflow`] instead of wrapping.
pub(crate) fn mul_checked(what: &'static str, lhs: usize, rhs: usize) -> CiphertextResult<usize> {
    lhs.checked_mul(rhs)
        .ok_or(CiphertextError::Overflow { what, lhs, rhs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let overflow = mul_checked("allocation", usize::MAX, 2).unwrap_err();
        assert_eq!(overflow.kind(), ErrorKind::Overflow);
        assert_eq!(
            CiphertextError::SizeTooSmall { size: 1, min: 2 }.kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            CiphertextError::SizeTooLarge { size: 17, max: 16 }.kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            CiphertextError::PolyIndexOutOfRange { index: 3, size: 2 }.kind(),
            ErrorKind::OutOfRange
        );
        assert_eq!(CiphertextError::MissingSeedMarker.kind(), ErrorKind::LogicError);
    }

    #[test]
    fn mul_checked_passes_through_products() {
        assert_eq!(mul_checked("allocation", 3, 16).unwrap(), 48);
        assert_eq!(mul_checked("allocation", 0, usize::MAX).unwrap(), 0);
    }

    #[test]
    fn messages_carry_offending_values() {
        let err = CiphertextError::CoeffIndexOutOfRange { index: 40, len: 32 };
        assert_eq!(err.to_string(), "coefficient index 40 out of range [0, 32)");
    }
}
