//! Byte-level persistence for ciphertexts.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! magic "RNSC" | version u8 | form u8 (0 full, 1 seeded)
//! parms_id 4 x u64 | is_ntt_form u8 | size u64 | scale f64 bits
//! correction_factor u64 | degree u64 | modulus_count u64
//! coefficients: polynomial-major, prime-major, coefficient-minor
//! ```
//!
//! The seeded form stores polynomial 0 followed by the 64-byte
//! [`PrngDescriptor`] in place of polynomial 1.

use crate::{
    ciphertext::{CIPHERTEXT_SIZE_MAX, CIPHERTEXT_SIZE_MIN, Ciphertext, CiphertextPayload, SeededCiphertext},
    errors::CiphertextError,
    params::{HeContext, ParmsId},
    prng::{PRNG_DESCRIPTOR_BYTES, PrngDescriptor},
    validity::{is_metadata_valid_for, is_valid_for},
};
use std::io::{self, Read, Write};
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const MAGIC: [u8; 4] = *b"RNSC";
pub const FORMAT_VERSION: u8 = 1;
/// Bytes before the first coefficient.
pub const HEADER_BYTES: usize = 4 + 1 + 1 + 4 * 8 + 1 + 5 * 8;

const FORM_FULL: u8 = 0;
const FORM_SEEDED: u8 = 1;

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Ciphertext(#[from] CiphertextError),

    #[error("bad magic {found:?}, expected \"RNSC\"")]
    BadMagic { found: [u8; 4] },

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown ciphertext form tag {0}")]
    UnknownForm(u8),

    #[error("invalid boolean byte {0}")]
    InvalidFlag(u8),

    #[error("stored size {size} out of range [{min}, {max}]")]
    SizeOutOfRange { size: u64, min: usize, max: usize },

    #[error("stored shape (N={degree}, K={modulus_count}) does not match parms_id {parms_id}")]
    ShapeMismatch {
        parms_id: ParmsId,
        degree: u64,
        modulus_count: u64,
    },

    #[error("ciphertext metadata is not valid for the context")]
    InvalidMetadata,

    #[error("ciphertext is not valid for the context")]
    InvalidCiphertext,
}

pub type SerializationResult<T> = Result<T, SerializationError>;

/// Fixed-size prefix of every stored ciphertext.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Header {
    form: u8,
    parms_id: ParmsId,
    is_ntt_form: bool,
    size: u64,
    scale: f64,
    correction_factor: u64,
    degree: u64,
    modulus_count: u64,
}

impl Header {
    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut bytes = Vec::with_capacity(HEADER_BYTES);
        bytes.extend_from_slice(&MAGIC);
        bytes.push(FORMAT_VERSION);
        bytes.push(self.form);
        for word in self.parms_id.words() {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes.push(u8::from(self.is_ntt_form));
        bytes.extend_from_slice(&self.size.to_le_bytes());
        bytes.extend_from_slice(&self.scale.to_bits().to_le_bytes());
        bytes.extend_from_slice(&self.correction_factor.to_le_bytes());
        bytes.extend_from_slice(&self.degree.to_le_bytes());
        bytes.extend_from_slice(&self.modulus_count.to_le_bytes());
        writer.write_all(&bytes)
    }

    fn read_from<R: Read>(reader: &mut R) -> SerializationResult<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(SerializationError::BadMagic { found: magic });
        }
        let version = read_u8(reader)?;
        if version != FORMAT_VERSION {
            return Err(SerializationError::UnsupportedVersion(version));
        }
        let form = read_u8(reader)?;
        if form != FORM_FULL && form != FORM_SEEDED {
            return Err(SerializationError::UnknownForm(form));
        }

        let mut words = [0u64; 4];
        for word in &mut words {
            *word = read_u64(reader)?;
        }
        let is_ntt_form = match read_u8(reader)? {
            0 => false,
            1 => true,
            other => return Err(SerializationError::InvalidFlag(other)),
        };
        Ok(Self {
            form,
            parms_id: ParmsId::from_words(words),
            is_ntt_form,
            size: read_u64(reader)?,
            scale: f64::from_bits(read_u64(reader)?),
            correction_factor: read_u64(reader)?,
            degree: read_u64(reader)?,
            modulus_count: read_u64(reader)?,
        })
    }
}

fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes)?;
    Ok(u64::from_le_bytes(bytes))
}

fn write_words<W: Write>(writer: &mut W, words: &[u64]) -> io::Result<()> {
    let mut bytes = Vec::with_capacity(words.len() * 8);
    for word in words {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    writer.write_all(&bytes)
}

fn read_words<R: Read>(reader: &mut R, dest: &mut [u64]) -> io::Result<()> {
    let mut bytes = vec![0u8; dest.len() * 8];
    reader.read_exact(&mut bytes)?;
    for (word, chunk) in dest.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut le = [0u8; 8];
        le.copy_from_slice(chunk);
        *word = u64::from_le_bytes(le);
    }
    Ok(())
}

impl Ciphertext {
    /// Exact number of bytes [`save`](Self::save) writes.
    pub fn save_size(&self) -> usize {
        HEADER_BYTES + self.data().len() * 8
    }

    /// Writes the full form; returns the number of bytes written.
    pub fn save<W: Write>(&self, mut writer: W) -> SerializationResult<usize> {
        Header {
            form: FORM_FULL,
            parms_id: self.parms_id(),
            is_ntt_form: self.is_ntt_form(),
            size: self.size() as u64,
            scale: self.scale(),
            correction_factor: self.correction_factor(),
            degree: self.poly_modulus_degree() as u64,
            modulus_count: self.coeff_modulus_size() as u64,
        }
        .write_to(&mut writer)?;
        write_words(&mut writer, self.data())?;
        Ok(self.save_size())
    }

    /// Writes the seeded form of a size-2 ciphertext whose polynomial 1 was
    /// sampled from `descriptor`.
    pub fn save_seeded<W: Write>(
        &self,
        descriptor: PrngDescriptor,
        writer: W,
    ) -> SerializationResult<usize> {
        self.compact(descriptor)?.save(writer)
    }

    /// Reads either form without checking residues or transparency.
    ///
    /// The header must name a level of `context` (the key level included)
    /// and agree with its shape; that bounds the allocation. A seeded form is
    /// returned as is.
    #[instrument(level = "debug", skip_all)]
    pub fn unsafe_load<R: Read>(
        context: &HeContext,
        mut reader: R,
    ) -> SerializationResult<CiphertextPayload> {
        let header = Header::read_from(&mut reader)?;
        let mut ciphertext = shaped(context, &header)?;
        ciphertext.set_ntt_form(header.is_ntt_form);
        ciphertext.set_scale(header.scale);
        ciphertext.set_correction_factor(header.correction_factor);
        if !is_metadata_valid_for(&ciphertext, context, true) {
            return Err(SerializationError::InvalidMetadata);
        }

        if header.form == FORM_SEEDED {
            read_words(&mut reader, ciphertext.poly_mut(0)?)?;
            let mut descriptor = [0u8; PRNG_DESCRIPTOR_BYTES];
            reader.read_exact(&mut descriptor)?;
            let seeded = ciphertext.compact(PrngDescriptor::from_bytes(&descriptor))?;
            debug!(parms_id = %header.parms_id, "seeded ciphertext loaded");
            return Ok(CiphertextPayload::Seeded(seeded));
        }

        read_words(&mut reader, ciphertext.data_mut())?;
        debug!(parms_id = %header.parms_id, size = header.size, "ciphertext loaded");
        Ok(CiphertextPayload::Full(ciphertext))
    }

    /// Reads either form, expands a seeded one, and accepts the result only
    /// if it is valid for a data level of `context`.
    #[instrument(level = "debug", skip_all)]
    pub fn load<R: Read>(context: &HeContext, reader: R) -> SerializationResult<Self> {
        let ciphertext = Self::unsafe_load(context, reader)?.into_ciphertext(context)?;
        if !is_valid_for(&ciphertext, context) {
            warn!(parms_id = %ciphertext.parms_id(), "loaded ciphertext rejected");
            return Err(SerializationError::InvalidCiphertext);
        }
        Ok(ciphertext)
    }
}

impl SeededCiphertext {
    /// Exact number of bytes [`save`](Self::save) writes.
    pub fn save_size(&self) -> usize {
        HEADER_BYTES + self.c0().len() * 8 + PRNG_DESCRIPTOR_BYTES
    }

    /// Writes the seeded form; returns the number of bytes written.
    pub fn save<W: Write>(&self, mut writer: W) -> SerializationResult<usize> {
        Header {
            form: FORM_SEEDED,
            parms_id: self.parms_id(),
            is_ntt_form: self.is_ntt_form(),
            size: CIPHERTEXT_SIZE_MIN as u64,
            scale: self.scale(),
            correction_factor: self.correction_factor(),
            degree: self.poly_modulus_degree() as u64,
            modulus_count: self.coeff_modulus_size() as u64,
        }
        .write_to(&mut writer)?;
        write_words(&mut writer, self.c0())?;
        writer.write_all(&self.descriptor().to_bytes())?;
        Ok(self.save_size())
    }
}

/// An empty-content ciphertext laid out as the header says.
fn shaped(context: &HeContext, header: &Header) -> SerializationResult<Ciphertext> {
    let shape_mismatch = || SerializationError::ShapeMismatch {
        parms_id: header.parms_id,
        degree: header.degree,
        modulus_count: header.modulus_count,
    };
    let expected_size = if header.form == FORM_SEEDED {
        CIPHERTEXT_SIZE_MIN..=CIPHERTEXT_SIZE_MIN
    } else {
        CIPHERTEXT_SIZE_MIN..=CIPHERTEXT_SIZE_MAX
    };
    let out_of_range = || SerializationError::SizeOutOfRange {
        size: header.size,
        min: *expected_size.start(),
        max: *expected_size.end(),
    };

    let mut ciphertext = Ciphertext::new();
    if header.size == 0 && header.form == FORM_FULL {
        if header.degree == 0 && header.modulus_count == 0 {
            ciphertext.set_parms_id(header.parms_id);
            return Ok(ciphertext);
        }
        ciphertext.reserve(context, header.parms_id, CIPHERTEXT_SIZE_MIN)?;
    } else {
        let size = usize::try_from(header.size).map_err(|_| out_of_range())?;
        if !expected_size.contains(&size) {
            return Err(out_of_range());
        }
        ciphertext.resize(context, header.parms_id, size)?;
    }

    if (ciphertext.poly_modulus_degree() as u64, ciphertext.coeff_modulus_size() as u64)
        != (header.degree, header.modulus_count)
    {
        return Err(shape_mismatch());
    }
    Ok(ciphertext)
}
