//! Size Accountant Module
//!
//! Running total of the bytes charged to live entries.

/// Bytes charged for the expiry timestamp kept per entry.
pub const EXPIRY_OVERHEAD_BYTES: usize = 8;

// == Size Accountant ==
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SizeAccountant {
    current: usize,
}

impl SizeAccountant {
    pub fn new() -> Self {
        Self { current: 0 }
    }

    // == Cost ==
    /// Approximate memory footprint of one entry.
    ///
    /// The key is counted twice because both the store and the expiry
    /// tracker hold a copy of it.
    pub fn cost(key: &str, blob: &[u8]) -> usize {
        blob.len() + 2 * key.len() + EXPIRY_OVERHEAD_BYTES
    }

    pub fn add(&mut self, bytes: usize) {
        self.current += bytes;
    }

    // == Subtract ==
    /// Releases bytes. Going below zero is an accounting bug.
    pub fn subtract(&mut self, bytes: usize) {
        debug_assert!(
            bytes <= self.current,
            "size accountant underflow: releasing {} of {} bytes",
            bytes,
            self.current
        );
        self.current = self.current.saturating_sub(bytes);
    }

    pub fn current(&self) -> usize {
        self.current
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_formula() {
        assert_eq!(SizeAccountant::cost("a", b"xyz"), 3 + 2 + 8);
        assert_eq!(SizeAccountant::cost("", b""), 8);
        assert_eq!(SizeAccountant::cost("key", &[0u8; 100]), 100 + 6 + 8);
    }

    #[test]
    fn test_add_and_subtract() {
        let mut sizes = SizeAccountant::new();
        sizes.add(40);
        sizes.add(2);
        sizes.subtract(12);
        assert_eq!(sizes.current(), 30);
    }

    #[test]
    #[should_panic(expected = "underflow")]
    #[cfg(debug_assertions)]
    fn test_underflow_is_a_bug() {
        let mut sizes = SizeAccountant::new();
        sizes.add(1);
        sizes.subtract(2);
    }
}
