use std::fmt;

/// 256-bit fingerprint naming one `(scheme, degree, coeff_modulus)` level.
///
/// The all-zero value is reserved for "no parameters".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ParmsId([u64; 4]);

impl ParmsId {
    pub const ZERO: Self = Self([0; 4]);

    pub const fn from_words(words: [u64; 4]) -> Self {
        Self(words)
    }

    pub const fn words(&self) -> [u64; 4] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }

    /// Absorbs `input` into four independently keyed splitmix lanes.
    pub(crate) fn fingerprint<I: IntoIterator<Item = u64>>(input: I) -> Self {
        const LANE_KEYS: [u64; 4] = [
            0x243F_6A88_85A3_08D3,
            0x1319_8A2E_0370_7344,
            0xA409_3822_299F_31D0,
            0x082E_FA98_EC4E_6C89,
        ];
        let mut lanes = LANE_KEYS;
        let mut absorbed = 0u64;
        for word in input {
            for (lane, key) in lanes.iter_mut().zip(LANE_KEYS) {
                *lane = mix64(*lane ^ word.wrapping_add(key)).rotate_left(17);
            }
            absorbed += 1;
        }
        for lane in &mut lanes {
            *lane = mix64(*lane ^ absorbed);
        }
        if lanes == [0; 4] {
            lanes[0] = 1;
        }
        Self(lanes)
    }
}

// splitmix64 finalizer
fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl fmt::Display for ParmsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{word:016X}")?;
        }
        Ok(())
    }
}
