pub mod primes;
pub mod sampling;

pub use primes::{is_ntt_friendly_prime, is_prime, ntt_primes};
pub use sampling::{sample_poly_uniform, uniform_residue};
