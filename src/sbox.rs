use crate::anf_polynom::ComponentFunction;
use crate::linapx_error::LinApxError;

/// Input width $m$ of the S-box, in bits.
pub const INPUT_WIDTH: usize = 4;

/// Output width $n$ of the S-box, in bits.
pub const OUTPUT_WIDTH: usize = 4;

const TABLE_SIZE: usize = 1 << INPUT_WIDTH;

const REFERENCE_TABLE: [u8; TABLE_SIZE] = [
    0xE, 0x4, 0xD, 0x1, 0x2, 0xF, 0xB, 0x8, 0x3, 0xA, 0x6, 0xC, 0x5, 0x9, 0x0, 0x7,
];

/// Bijective 4-bit to 4-bit substitution box $f : \mathbb{F}_2^4 \to \mathbb{F}_2^4$.
///
/// Component function $F_j$, $1 \le j \le n$, is bit $n - j$ of $f(x)$: $F_1$ is the most
/// significant output bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SBox {
    table: [u8; TABLE_SIZE],
}

impl SBox {
    /// Creates an S-box from its lookup table.
    ///
    /// # Returns
    /// The S-box, or [LinApxError::NotABijection] with the smallest missing value if the table
    /// is not a permutation of `0..16`.
    pub fn from_lookup_table(table: [u8; TABLE_SIZE]) -> Result<Self, LinApxError> {
        if let Some(missing) = (0..TABLE_SIZE as u8).find(|value| !table.contains(value)) {
            return Err(LinApxError::NotABijection(missing));
        }
        Ok(SBox { table })
    }

    /// The S-box studied by this crate:
    /// `E 4 D 1 2 F B 8 3 A 6 C 5 9 0 7`.
    pub fn reference() -> Self {
        SBox {
            table: REFERENCE_TABLE,
        }
    }

    /// Input width $m$, in bits.
    pub fn input_width(&self) -> usize {
        INPUT_WIDTH
    }

    /// Output width $n$, in bits.
    pub fn output_width(&self) -> usize {
        OUTPUT_WIDTH
    }

    /// Maximum input value, $2^m - 1$.
    pub fn get_max_input_value(&self) -> u32 {
        (1 << INPUT_WIDTH) - 1
    }

    /// Lookup table, entry $x$ being $f(x)$.
    pub fn lookup_table(&self) -> &[u8; TABLE_SIZE] {
        &self.table
    }

    /// Computes $f(x)$.
    ///
    /// # Panics
    /// If `input_bits` is greater than the maximum input value, and the `unsafe_disable_safety_checks` feature is not enabled.
    #[inline]
    pub fn apply(&self, input_bits: u32) -> u32 {
        #[cfg(not(feature = "unsafe_disable_safety_checks"))]
        if input_bits > self.get_max_input_value() {
            panic!(
                "S-box input must be less or equal than {}",
                self.get_max_input_value()
            );
        }
        self.table[input_bits as usize] as u32
    }

    /// Truth table of component function $F_j$, bit $x$ being $F_j(x)$.
    ///
    /// # Panics
    /// If `output_bit` is not in `1..=n`.
    pub fn component_truth_table(&self, output_bit: usize) -> u64 {
        assert!(
            (1..=OUTPUT_WIDTH).contains(&output_bit),
            "Output bit must be in 1..={}",
            OUTPUT_WIDTH
        );
        let shift = OUTPUT_WIDTH - output_bit;
        (0..=self.get_max_input_value())
            .filter(|&x| (self.apply(x) >> shift) & 1 == 1)
            .fold(0, |truth_table, x| truth_table | (1u64 << x))
    }

    /// Algebraic normal forms of $F_1, \dots, F_n$, derived from the lookup table.
    pub fn component_functions(&self) -> Vec<ComponentFunction> {
        (1..=OUTPUT_WIDTH)
            .map(|output_bit| {
                ComponentFunction::from_truth_table(
                    self.component_truth_table(output_bit),
                    INPUT_WIDTH,
                )
            })
            .collect()
    }
}

/// Algebraic normal forms of the component functions of [SBox::reference], $F_1$ first.
///
/// - $F_1 = x_1x_2x_3 + x_2x_3x_4 + x_1x_2 + x_2x_3 + x_1 + x_2 + x_4 + 1$
/// - $F_2 = x_1x_3x_4 + x_1x_3 + x_2x_4 + x_3x_4 + x_1 + x_2 + 1$
/// - $F_3 = x_1x_2x_3 + x_1x_2x_4 + x_1x_2 + x_1x_3 + x_1x_4 + x_2x_3 + x_2x_4 + x_3x_4 + x_3 + x_4 + 1$
/// - $F_4 = x_1x_3x_4 + x_1x_4 + x_2x_4 + x_1 + x_3$
pub fn reference_component_functions() -> Result<Vec<ComponentFunction>, LinApxError> {
    Ok(vec![
        ComponentFunction::from_monomials(
            true,
            &[&[1, 2, 3], &[2, 3, 4], &[1, 2], &[2, 3], &[1], &[2], &[4]],
        )?,
        ComponentFunction::from_monomials(
            true,
            &[&[1, 3, 4], &[1, 3], &[2, 4], &[3, 4], &[1], &[2]],
        )?,
        ComponentFunction::from_monomials(
            true,
            &[
                &[1, 2, 3],
                &[1, 2, 4],
                &[1, 2],
                &[1, 3],
                &[1, 4],
                &[2, 3],
                &[2, 4],
                &[3, 4],
                &[3],
                &[4],
            ],
        )?,
        ComponentFunction::from_monomials(false, &[&[1, 3, 4], &[1, 4], &[2, 4], &[1], &[3]])?,
    ])
}
