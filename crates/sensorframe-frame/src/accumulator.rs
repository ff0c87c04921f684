/// Assembles one multi-byte field from bytes that arrive one call at a time.
///
/// The accumulator only tracks the position inside the current field (the
/// sub-index). Bytes are stored in the caller's frame buffer at
/// `base + sub_index`, so a field that straddles several transport reads is
/// complete exactly when its last byte lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldAccumulator {
    sub_index: usize,
}

impl FieldAccumulator {
    /// A fresh accumulator at sub-index 0.
    pub const fn new() -> Self {
        Self { sub_index: 0 }
    }

    /// Position inside the field currently being accumulated.
    pub fn sub_index(&self) -> usize {
        self.sub_index
    }

    /// Forget any partially accumulated field.
    pub fn reset(&mut self) {
        self.sub_index = 0;
    }

    /// Store `byte` at `buf[base + sub_index]`.
    ///
    /// Returns `true` when the field of `width` bytes is complete; the
    /// sub-index is then back at 0.
    pub fn copy(&mut self, buf: &mut [u8], base: usize, width: usize, byte: u8) -> bool {
        buf[base + self.sub_index] = byte;
        self.advance(width)
    }

    /// Store `byte` and, once `width` bytes are in, merge them little-endian.
    ///
    /// `width` must be at most 4.
    pub fn push(&mut self, buf: &mut [u8], base: usize, width: usize, byte: u8) -> Option<u32> {
        debug_assert!(width <= 4, "field wider than u32");
        if self.copy(buf, base, width, byte) {
            Some(merge_le(&buf[base..base + width]))
        } else {
            None
        }
    }

    /// Count a byte that is not stored; returns `true` once `width` bytes passed.
    pub fn skip(&mut self, width: usize) -> bool {
        self.advance(width)
    }

    fn advance(&mut self, width: usize) -> bool {
        self.sub_index += 1;
        if self.sub_index >= width {
            self.sub_index = 0;
            true
        } else {
            false
        }
    }
}

/// Merge up to four bytes into an integer, least significant byte first.
pub fn merge_le(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .rev()
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_le_orders_bytes() {
        assert_eq!(merge_le(&[0x34, 0x12]), 0x1234);
        assert_eq!(merge_le(&[0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
        assert_eq!(merge_le(&[0xAB]), 0xAB);
        assert_eq!(merge_le(&[]), 0);
    }

    #[test]
    fn push_completes_on_last_byte() {
        let mut buf = [0u8; 8];
        let mut acc = FieldAccumulator::new();

        assert_eq!(acc.push(&mut buf, 4, 4, 0x78), None);
        assert_eq!(acc.sub_index(), 1);
        assert_eq!(acc.push(&mut buf, 4, 4, 0x56), None);
        assert_eq!(acc.push(&mut buf, 4, 4, 0x34), None);
        assert_eq!(acc.push(&mut buf, 4, 4, 0x12), Some(0x1234_5678));
        assert_eq!(acc.sub_index(), 0);
        assert_eq!(&buf[4..], &[0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn skip_leaves_buffer_untouched() {
        let mut acc = FieldAccumulator::new();
        assert!(!acc.skip(2));
        assert!(acc.skip(2));
        assert_eq!(acc.sub_index(), 0);
    }

    #[test]
    fn reset_drops_partial_field() {
        let mut buf = [0u8; 2];
        let mut acc = FieldAccumulator::new();
        acc.push(&mut buf, 0, 2, 0xFF);
        acc.reset();
        assert_eq!(acc.push(&mut buf, 0, 2, 0x01), None);
        assert_eq!(acc.push(&mut buf, 0, 2, 0x02), Some(0x0201));
    }

    #[test]
    fn copy_handles_long_runs() {
        let mut buf = [0u8; 40];
        let mut acc = FieldAccumulator::new();
        for i in 0..29u8 {
            assert!(!acc.copy(&mut buf, 7, 30, i));
        }
        assert!(acc.copy(&mut buf, 7, 30, 29));
        assert_eq!(buf[7], 0);
        assert_eq!(buf[36], 29);
    }
}
