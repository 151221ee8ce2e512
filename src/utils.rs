/// Parity of the binary dot product `value · mask` over GF(2).
#[inline]
pub(crate) fn masked_parity(value: u32, mask: u32) -> bool {
    (value & mask).count_ones() & 1 == 1
}

#[inline]
pub(crate) fn width_mask(width: usize) -> u32 {
    (1u32 << width) - 1
}
