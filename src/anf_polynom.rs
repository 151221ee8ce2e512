use crate::linapx_error::LinApxError;
use fast_boolean_anf_transform::fast_bool_anf_transform_unsigned;
use itertools::Itertools;
use std::collections::HashSet;
use std::fmt::Display;

/// Largest input width whose truth table and ANF bitmask fit in a `u64`.
pub const MAX_TABLE_INPUT_WIDTH: usize = 6;

#[cfg(not(feature = "unsafe_disable_safety_checks"))]
fn check_table_input_width(input_width: usize) {
    if input_width > MAX_TABLE_INPUT_WIDTH {
        panic!(
            "Input width must be less or equal than {}",
            MAX_TABLE_INPUT_WIDTH
        );
    }
}

/// AND of input variables, each variable given by its 1-based index.
///
/// Variable $x_i$ of an $m$-bit input is bit $m - i$ of the input integer, so $x_1$ is the most
/// significant bit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Monomial {
    variables: Vec<usize>,
}

impl Monomial {
    /// Creates a monomial from variable indices. Indices are sorted and repeated indices merged,
    /// since $x_i \cdot x_i = x_i$.
    ///
    /// Indices are not checked against an input width here, the oracle compiler does it.
    pub fn new<I: IntoIterator<Item = usize>>(variables: I) -> Self {
        let mut variables: Vec<usize> = variables.into_iter().collect();
        variables.sort_unstable();
        variables.dedup();
        Monomial { variables }
    }

    /// Variable indices, in increasing order.
    pub fn variables(&self) -> &[usize] {
        &self.variables
    }

    /// Number of variables in the monomial.
    pub fn degree(&self) -> usize {
        self.variables.len()
    }

    /// Returns `true` if the monomial is non-empty and every index is in `1..=input_width`.
    pub fn is_valid(&self, input_width: usize) -> bool {
        !self.variables.is_empty()
            && self
                .variables
                .iter()
                .all(|&variable| variable >= 1 && variable <= input_width)
    }

    /// Input bits selected by the monomial, as a mask over the input integer.
    ///
    /// # Panics
    /// If a variable index is not in `1..=input_width`, and the `unsafe_disable_safety_checks` feature is not enabled.
    pub fn input_mask(&self, input_width: usize) -> u32 {
        #[cfg(not(feature = "unsafe_disable_safety_checks"))]
        if let Some(variable) = self
            .variables
            .iter()
            .find(|&&variable| variable == 0 || variable > input_width)
        {
            panic!(
                "Variable x{} is out of range for an input of width {}",
                variable, input_width
            );
        }
        self.variables
            .iter()
            .fold(0, |mask, &variable| mask | (1 << (input_width - variable)))
    }

    /// Evaluates the monomial, ie returns `true` if all its variables are set in `input_bits`.
    ///
    /// # Panics
    /// Same as [Monomial::input_mask].
    pub fn evaluate(&self, input_bits: u32, input_width: usize) -> bool {
        let mask = self.input_mask(input_width);
        input_bits & mask == mask
    }
}

impl Display for Monomial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.variables
                .iter()
                .map(|variable| format!("x{}", variable))
                .join("*")
        )
    }
}

/// One term of an algebraic normal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnfTerm {
    /// The constant `1`
    Constant,
    /// An AND of input variables
    Monomial(Monomial),
}

impl AnfTerm {
    /// Shortcut for `AnfTerm::Monomial(Monomial::new(variables))`.
    pub fn monomial<I: IntoIterator<Item = usize>>(variables: I) -> Self {
        AnfTerm::Monomial(Monomial::new(variables))
    }

    fn degree(&self) -> usize {
        match self {
            AnfTerm::Constant => 0,
            AnfTerm::Monomial(monomial) => monomial.degree(),
        }
    }
}

impl Display for AnfTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnfTerm::Constant => write!(f, "1"),
            AnfTerm::Monomial(monomial) => write!(f, "{}", monomial),
        }
    }
}

/// Algebraic normal form of one component function $F_j$ of an S-box, as an XOR of [AnfTerm].
///
/// Each term appears at most once: a repeated term would cancel itself out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentFunction {
    terms: Vec<AnfTerm>,
}

impl ComponentFunction {
    /// Creates a component function from its ANF terms.
    ///
    /// # Returns
    /// The component function, or [LinApxError::DuplicateTerm] if a term appears twice.
    pub fn new(terms: Vec<AnfTerm>) -> Result<Self, LinApxError> {
        let mut seen: HashSet<&AnfTerm> = HashSet::new();
        if let Some(duplicate) = terms.iter().find(|term| !seen.insert(*term)) {
            return Err(LinApxError::DuplicateTerm(duplicate.to_string()));
        }
        Ok(ComponentFunction { terms })
    }

    /// Creates a component function from a constant flag and a list of monomials.
    ///
    /// # Example
    /// ```rust
    /// use quantum_linapx::ComponentFunction;
    ///
    /// // x1*x2 + x3 + 1
    /// let function = ComponentFunction::from_monomials(true, &[&[1, 2], &[3]]).unwrap();
    /// assert_eq!(function.to_string(), "x1*x2 + x3 + 1");
    /// assert!(function.evaluate(0b0000, 4));
    /// assert!(!function.evaluate(0b1100, 4));
    /// ```
    pub fn from_monomials(constant: bool, monomials: &[&[usize]]) -> Result<Self, LinApxError> {
        let constant_term = if constant { Some(AnfTerm::Constant) } else { None };
        let terms = constant_term
            .into_iter()
            .chain(
                monomials
                    .iter()
                    .map(|variables| AnfTerm::monomial(variables.iter().copied())),
            )
            .collect();
        ComponentFunction::new(terms)
    }

    /// Builds the component function from an ANF bitmask, where bit $k$ set means the monomial
    /// made of the input bits set in $k$ is present ($k = 0$ being the constant term).
    ///
    /// # Panics
    /// If `input_width` is greater than [MAX_TABLE_INPUT_WIDTH], and the `unsafe_disable_safety_checks` feature is not enabled.
    pub fn from_anf_bitmask(anf: u64, input_width: usize) -> Self {
        #[cfg(not(feature = "unsafe_disable_safety_checks"))]
        check_table_input_width(input_width);
        let terms = (0u32..(1 << input_width))
            .filter(|bit_position| anf & (1u64 << bit_position) != 0)
            .map(|bit_position| {
                if bit_position == 0 {
                    AnfTerm::Constant
                } else {
                    AnfTerm::monomial(
                        (1..=input_width)
                            .filter(|variable| bit_position & (1 << (input_width - variable)) != 0),
                    )
                }
            })
            .collect();
        ComponentFunction { terms }
    }

    /// Computes the ANF of a Boolean function given by its truth table (bit $x$ of `truth_table`
    /// being the value at input $x$).
    ///
    /// We use the Bakoev's algorithm to compute the ANF polynomial <http://www.math.bas.bg/moiuser/OCRT2017/a3.pdf>.
    ///
    /// # Panics
    /// If `input_width` is greater than [MAX_TABLE_INPUT_WIDTH], and the `unsafe_disable_safety_checks` feature is not enabled.
    pub fn from_truth_table(truth_table: u64, input_width: usize) -> Self {
        #[cfg(not(feature = "unsafe_disable_safety_checks"))]
        check_table_input_width(input_width);
        let anf = fast_bool_anf_transform_unsigned(truth_table, input_width);
        ComponentFunction::from_anf_bitmask(anf, input_width)
    }

    /// Terms, in the order they were given.
    pub fn terms(&self) -> &[AnfTerm] {
        &self.terms
    }

    /// Returns `true` if the constant term is present.
    pub fn has_constant(&self) -> bool {
        self.terms.contains(&AnfTerm::Constant)
    }

    /// Iterates over the non-constant terms.
    pub fn monomials(&self) -> impl Iterator<Item = &Monomial> {
        self.terms.iter().filter_map(|term| match term {
            AnfTerm::Constant => None,
            AnfTerm::Monomial(monomial) => Some(monomial),
        })
    }

    /// Algebraic degree, ie the maximum degree of the monomials.
    pub fn degree(&self) -> usize {
        self.terms.iter().map(AnfTerm::degree).max().unwrap_or(0)
    }

    /// Evaluates the function for an `input_width`-bit input.
    ///
    /// # Panics
    /// If a monomial names a variable outside `1..=input_width`, and the `unsafe_disable_safety_checks` feature is not enabled.
    pub fn evaluate(&self, input_bits: u32, input_width: usize) -> bool {
        self.terms.iter().fold(false, |value, term| {
            value
                ^ match term {
                    AnfTerm::Constant => true,
                    AnfTerm::Monomial(monomial) => monomial.evaluate(input_bits, input_width),
                }
        })
    }

    /// Truth table of the function, bit $x$ being the value at input $x$.
    ///
    /// # Panics
    /// If `input_width` is greater than [MAX_TABLE_INPUT_WIDTH] or a monomial names a variable
    /// outside `1..=input_width`, and the `unsafe_disable_safety_checks` feature is not enabled.
    pub fn truth_table(&self, input_width: usize) -> u64 {
        #[cfg(not(feature = "unsafe_disable_safety_checks"))]
        check_table_input_width(input_width);
        (0u32..(1 << input_width))
            .filter(|&x| self.evaluate(x, input_width))
            .fold(0, |truth_table, x| truth_table | (1u64 << x))
    }

    /// Canonical ANF bitmask, the inverse of [ComponentFunction::from_anf_bitmask].
    ///
    /// # Panics
    /// Same as [ComponentFunction::truth_table].
    pub fn anf_bitmask(&self, input_width: usize) -> u64 {
        #[cfg(not(feature = "unsafe_disable_safety_checks"))]
        check_table_input_width(input_width);
        self.terms.iter().fold(0, |anf, term| {
            anf ^ match term {
                AnfTerm::Constant => 1,
                AnfTerm::Monomial(monomial) => 1u64 << monomial.input_mask(input_width),
            }
        })
    }
}

impl Display for ComponentFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        write!(
            f,
            "{}",
            self.terms
                .iter()
                .sorted_by(|a, b| b.degree().cmp(&a.degree()))
                .join(" + ")
        )
    }
}
