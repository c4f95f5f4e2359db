use rand::RngCore;

/// Draws a value uniformly from `[0, modulus)` by rejection on raw 64-bit
/// words: any word at or above the largest multiple of `modulus` is redrawn.
///
/// Consumes only `next_u64`, so the output is a pure function of the word
/// stream and stays identical across platforms and `rand` releases.
///
/// # Panics
///
/// Panics if `modulus == 0`.
pub fn uniform_residue<R: RngCore + ?Sized>(modulus: u64, rng: &mut R) -> u64 {
    assert!(modulus > 0, "uniform_residue: modulus must be positive");
    // Count of words past the largest multiple of `modulus` that fits in 2^64.
    let rejected = (u64::MAX % modulus).wrapping_add(1) % modulus;
    let max_multiple = u64::MAX - rejected;
    loop {
        let word = rng.next_u64();
        if rejected == 0 || word <= max_multiple {
            return word % modulus;
        }
    }
}

/// Fills an RNS polynomial with uniform residues.
///
/// `dest` holds `moduli.len()` consecutive residue arrays of `degree` words;
/// array `k` is sampled modulo `moduli[k]`, coefficient by coefficient.
///
/// # Panics
///
/// Panics if `dest.len() != degree * moduli.len()`.
pub fn sample_poly_uniform<R: RngCore + ?Sized>(
    moduli: &[u64],
    degree: usize,
    rng: &mut R,
    dest: &mut [u64],
) {
    assert_eq!(
        dest.len(),
        degree * moduli.len(),
        "sample_poly_uniform: destination must hold degree * moduli words"
    );
    if degree == 0 {
        return;
    }
    for (residues, &modulus) in dest.chunks_exact_mut(degree).zip(moduli) {
        for coeff in residues {
            *coeff = uniform_residue(modulus, rng);
        }
    }
}
