use super::Ciphertext;
use std::fmt;

impl fmt::Display for Ciphertext {
    /// One line of metadata, then one line per `(poly, prime)` residue array.
    ///
    /// Residue arrays are truncated to the first and last `precision` words
    /// (default 3); the alternate flag (`{:#}`) prints them in full.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ciphertext(size={}, N={}, K={}, parms_id=[{}], ntt={}, scale={}, correction={})",
            self.size,
            self.poly_modulus_degree,
            self.coeff_modulus_size,
            self.parms_id,
            self.is_ntt_form,
            self.scale,
            self.correction_factor,
        )?;
        if self.poly_modulus_degree == 0 {
            return Ok(());
        }

        let num = if f.alternate() {
            usize::MAX
        } else {
            f.precision().unwrap_or(3)
        };
        for (poly, residues) in self.polys().enumerate() {
            for (prime, row) in residues.chunks_exact(self.poly_modulus_degree).enumerate() {
                write!(f, "\n  c{poly}[q{prime}] = ")?;
                fmt_residues(f, row, num)?;
            }
        }
        Ok(())
    }
}

fn fmt_residues(f: &mut fmt::Formatter<'_>, row: &[u64], num: usize) -> fmt::Result {
    write!(f, "[")?;
    if row.len() <= num.saturating_mul(2) {
        for (i, c) in row.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
    } else {
        for (i, c) in row[..num].iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ", …")?;
        for c in &row[row.len() - num..] {
            write!(f, ", {c}")?;
        }
    }
    write!(f, "]")
}
