//! Prime utilities for building coefficient-modulus chains.
//!
//! Primality uses deterministic Miller-Rabin over `u64`: the twelve bases
//! below have no strong pseudoprime under 3.3 * 10^24, which covers the
//! whole `u64` range.
//!
//! Reference:
//! https://en.wikipedia.org/wiki/Miller%E2%80%93Rabin_primality_test

const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

fn mul_mod(a: u64, b: u64, modulus: u64) -> u64 {
    ((a as u128 * b as u128) % modulus as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    let mut acc = 1 % modulus;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exp >>= 1;
    }
    acc
}

/// Returns `true` if `n` is prime.
pub fn is_prime(n: u64) -> bool {
    match n {
        0 | 1 => return false,
        2 | 3 => return true,
        _ if n & 1 == 0 => return false,
        _ => {}
    }

    let r = (n - 1).trailing_zeros();
    let d = (n - 1) >> r;
    'witness: for &a in &MILLER_RABIN_BASES {
        if a % n == 0 {
            continue;
        }
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Returns `true` when `p` is prime and `p = 1 (mod 2 * degree)`, i.e. `Z_p`
/// has the primitive `2n`-th root of unity a negacyclic NTT needs.
///
/// Returns `false` for `degree == 0` or when `2 * degree` does not fit in `u64`.
pub fn is_ntt_friendly_prime(p: u64, degree: u64) -> bool {
    match degree.checked_mul(2) {
        Some(order) if order > 0 => p % order == 1 && is_prime(p),
        _ => false,
    }
}

/// Returns the `count` largest NTT-friendly primes of exactly `bit_size` bits,
/// in descending order, or `None` when the range does not hold enough of them.
///
/// # Panics
///
/// Panics if `bit_size` is outside `2..=62` or `degree == 0`.
pub fn ntt_primes(bit_size: u32, degree: u64, count: usize) -> Option<Vec<u64>> {
    assert!(
        (2..=62).contains(&bit_size),
        "ntt_primes: bit_size must be in 2..=62"
    );
    assert!(degree > 0, "ntt_primes: degree must be positive");

    let step = 2 * degree;
    let lower = 1u64 << (bit_size - 1);
    let upper = 1u64 << bit_size;
    // Largest candidate below `upper` with candidate = 1 (mod step); `step` is
    // even and `upper - 1` odd, so this never reaches `upper`.
    let mut candidate = (upper - 1) / step * step + 1;

    let mut primes = Vec::with_capacity(count);
    while primes.len() < count && candidate >= lower {
        if is_prime(candidate) {
            primes.push(candidate);
        }
        match candidate.checked_sub(step) {
            Some(next) => candidate = next,
            None => break,
        }
    }
    (primes.len() == count).then_some(primes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_prime_trial(n: u64) -> bool {
        n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
    }

    #[test]
    fn small_numbers_match_trial_division() {
        for n in 0..2_000u64 {
            assert_eq!(is_prime(n), is_prime_trial(n), "mismatch at {n}");
        }
    }

    #[test]
    fn rejects_strong_pseudoprimes() {
        for n in [561u64, 1_105, 1_729, 3_215_031_751, 3_825_123_056_546_413_051] {
            assert!(!is_prime(n), "expected composite: {n}");
        }
    }

    #[test]
    fn handles_large_primes() {
        assert!(is_prime(1_152_921_504_606_584_833)); // 60-bit, 1 mod 2^15
        assert!(is_prime(18_446_744_073_709_551_557));
        assert!(!is_prime(u64::MAX));
    }

    #[test]
    fn ntt_friendliness() {
        assert!(is_ntt_friendly_prime(12289, 1024));
        assert!(is_ntt_friendly_prime(17, 8));
        assert!(!is_ntt_friendly_prime(19, 8));
        assert!(!is_ntt_friendly_prime(2049, 1024));
        assert!(!is_ntt_friendly_prime(17, 0));
        assert!(!is_ntt_friendly_prime(17, u64::MAX));
    }

    #[test]
    fn ntt_primes_have_requested_shape() {
        let primes = ntt_primes(30, 1024, 3).expect("three 30-bit primes");
        assert_eq!(primes.len(), 3);
        assert!(primes.windows(2).all(|w| w[0] > w[1]));
        for &p in &primes {
            assert_eq!(64 - p.leading_zeros(), 30);
            assert!(is_ntt_friendly_prime(p, 1024));
        }
    }

    #[test]
    fn ntt_primes_reports_exhaustion() {
        // 5-bit primes that are 1 mod 16: only 17.
        assert_eq!(ntt_primes(5, 8, 1), Some(vec![17]));
        assert_eq!(ntt_primes(5, 8, 2), None);
    }

    #[test]
    #[should_panic(expected = "ntt_primes: bit_size must be in 2..=62")]
    fn ntt_primes_panics_on_wide_bit_size() {
        let _ = ntt_primes(63, 8, 1);
    }
}
