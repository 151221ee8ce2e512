use crate::sbox::SBox;
use crate::utils::{masked_parity, width_mask};

/// Exact quality of the linear approximation $\alpha \cdot x = \beta \cdot f(x)$.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearApproximation {
    /// Input mask $\alpha$
    pub input_mask: u32,
    /// Output mask $\beta$
    pub output_mask: u32,
    /// Number of inputs agreeing minus number of inputs disagreeing, in $[-2^m, 2^m]$
    pub correlation: i32,
    /// Number of inputs $x$ for which the relation holds
    pub approximates: u32,
}

impl LinearApproximation {
    /// Returns `true` if the relation holds for exactly half of the inputs.
    pub fn is_unbiased(&self) -> bool {
        self.correlation == 0
    }

    /// Returns `true` if the relation is affine, ie holds for all inputs or for none.
    pub fn is_exact(&self, input_width: usize) -> bool {
        self.correlation.unsigned_abs() == 1 << input_width
    }

    /// Bias $\epsilon = \frac{c}{2^{m+1}}$, in $[-\frac{1}{2}, \frac{1}{2}]$.
    pub fn bias(&self, input_width: usize) -> f64 {
        self.correlation as f64 / (1u64 << (input_width + 1)) as f64
    }
}

impl SBox {
    /// Evaluates the linear approximation given by an input and an output mask over all inputs.
    ///
    /// The correlation is:
    ///
    /// $$c(\alpha, \beta) = \sum_{x=0}^{2^m-1} (-1)^{\alpha \cdot x \oplus \beta \cdot f(x)}$$
    ///
    /// # Panics
    /// If a mask does not fit the S-box width, and the `unsafe_disable_safety_checks` feature is not enabled.
    ///
    /// # Example
    /// ```rust
    /// use quantum_linapx::SBox;
    ///
    /// let approximation = SBox::reference().linear_approximation(0, 0);
    /// assert_eq!(approximation.correlation, 16);
    /// assert_eq!(approximation.approximates, 16);
    /// ```
    pub fn linear_approximation(&self, input_mask: u32, output_mask: u32) -> LinearApproximation {
        #[cfg(not(feature = "unsafe_disable_safety_checks"))]
        if input_mask > width_mask(self.input_width())
            || output_mask > width_mask(self.output_width())
        {
            panic!(
                "Too big linear mask, must be <= {} for the input and <= {} for the output",
                width_mask(self.input_width()),
                width_mask(self.output_width())
            );
        }
        let approximates = (0..=self.get_max_input_value())
            .filter(|&x| masked_parity(x, input_mask) == masked_parity(self.apply(x), output_mask))
            .count() as u32;
        let disagreements = (1u32 << self.input_width()) - approximates;
        LinearApproximation {
            input_mask,
            output_mask,
            correlation: approximates as i32 - disagreements as i32,
            approximates,
        }
    }

    /// Computes the linear approximation table, `table[input_mask][output_mask]` being the
    /// correlation of the mask pair.
    pub fn linear_approximation_table(&self) -> Vec<Vec<i32>> {
        (0..=width_mask(self.input_width()))
            .map(|input_mask| {
                (0..=width_mask(self.output_width()))
                    .map(|output_mask| self.linear_approximation(input_mask, output_mask).correlation)
                    .collect()
            })
            .collect()
    }

    /// Maximal absolute correlation over all mask pairs but the trivial $(0, 0)$.
    pub fn linearity(&self) -> u32 {
        self.linear_approximation_table()
            .iter()
            .enumerate()
            .flat_map(|(input_mask, row)| {
                row.iter()
                    .enumerate()
                    .filter(move |(output_mask, _)| input_mask != 0 || *output_mask != 0)
                    .map(|(_, correlation)| correlation.unsigned_abs())
            })
            .max()
            .unwrap_or(0)
    }

    /// All non-trivial linear approximations reaching [SBox::linearity].
    pub fn best_linear_approximations(&self) -> Vec<LinearApproximation> {
        let linearity = self.linearity();
        (0..=width_mask(self.input_width()))
            .flat_map(|input_mask| {
                (0..=width_mask(self.output_width()))
                    .map(move |output_mask| (input_mask, output_mask))
            })
            .filter(|&(input_mask, output_mask)| input_mask != 0 || output_mask != 0)
            .map(|(input_mask, output_mask)| self.linear_approximation(input_mask, output_mask))
            .filter(|approximation| approximation.correlation.unsigned_abs() == linearity)
            .collect()
    }
}
