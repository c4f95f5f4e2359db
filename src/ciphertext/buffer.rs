/// Owned `u64` storage with a logical length independent of the allocation.
///
/// The whole allocation is always initialized; words past `len` are stale
/// and never handed out.
///
/// # Invariants
/// - `len <= words.len()`
#[derive(Debug, Clone, Default)]
pub struct CoeffBuffer {
    words: Vec<u64>,
    len: usize,
}

impl CoeffBuffer {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated words.
    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.words[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u64] {
        &mut self.words[..self.len]
    }

    /// Grows the allocation to at least `capacity` words, keeping the
    /// logical words. Never shrinks. Returns whether it reallocated.
    pub fn reserve(&mut self, capacity: usize) -> bool {
        if capacity <= self.words.len() {
            return false;
        }
        let mut grown = vec![0u64; capacity];
        grown[..self.len].copy_from_slice(&self.words[..self.len]);
        self.words = grown;
        true
    }

    /// Sets the logical length, zeroing any words newly brought into view.
    /// Grows the allocation when `len` exceeds it.
    pub fn resize(&mut self, len: usize) {
        self.reserve(len);
        if len > self.len {
            self.words[self.len..len].fill(0);
        }
        self.len = len;
    }

    pub fn release(&mut self) {
        self.words = Vec::new();
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_keeps_logical_words() {
        let mut buffer = CoeffBuffer::default();
        buffer.resize(3);
        buffer.as_mut_slice().copy_from_slice(&[1, 2, 3]);
        assert!(buffer.reserve(10));
        assert_eq!(buffer.capacity(), 10);
        assert_eq!(buffer.as_slice(), &[1, 2, 3]);
        assert!(!buffer.reserve(4));
        assert_eq!(buffer.capacity(), 10);
    }

    #[test]
    fn regrowing_zeroes_stale_words() {
        let mut buffer = CoeffBuffer::default();
        buffer.resize(4);
        buffer.as_mut_slice().fill(9);
        buffer.resize(1);
        assert_eq!(buffer.as_slice(), &[9]);
        buffer.resize(4);
        assert_eq!(buffer.as_slice(), &[9, 0, 0, 0]);
    }

    #[test]
    fn release_frees_allocation() {
        let mut buffer = CoeffBuffer::default();
        buffer.resize(8);
        buffer.release();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 0);
    }
}
