/// Pads buffer's size to a multiple of 32 bytes, keeping it non-empty.
pub fn pad_size(size: usize) -> usize {
    ((size + 31) & !31).max(32)
}
