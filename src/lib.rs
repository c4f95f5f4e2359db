pub mod ciphertext;
pub mod errors;
pub mod math;
pub mod params;
pub mod prng;
pub mod serialize;
pub mod validity;

pub use ciphertext::{
    CIPHERTEXT_SIZE_MAX, CIPHERTEXT_SIZE_MIN, Ciphertext, CiphertextPayload, SEED_MARKER,
    SeededCiphertext,
};
pub use errors::{CiphertextError, CiphertextResult, ErrorKind};
pub use params::{
    EncryptionParameters, EncryptionParametersBuilder, HeContext, ParameterRegistry, ParmsEntry,
    ParmsId, SchemeType,
};
pub use prng::PrngDescriptor;
pub use serialize::{SerializationError, SerializationResult};
pub use validity::{is_buffer_valid, is_data_valid_for, is_metadata_valid_for, is_valid_for};
