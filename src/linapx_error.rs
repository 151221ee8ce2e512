use thiserror::Error;

/// Errors raised while building the S-box model, compiling oracles or allocating registers.
#[derive(Error, Debug, PartialEq)]
pub enum LinApxError {
    /// A monomial is empty or names a variable outside `1..=input_width`.
    #[error("Invalid monomial {variables:?} for output bit {output_bit}, variables must be in 1..={input_width}")]
    InvalidMonomial {
        /// Index `j` of the component function `F_j` being compiled
        output_bit: usize,
        /// Variable indices of the offending monomial
        variables: Vec<usize>,
        /// Number of input variables
        input_width: usize,
    },
    /// More input variables than a gate control set can hold.
    #[error("Too big input width, must be <= {0}")]
    TooBigInputWidth(usize),
    /// The same ANF term appears twice in one component function.
    #[error("Duplicate ANF term {0} in component function")]
    DuplicateTerm(String),
    /// The oracle target is not an output position.
    #[error("Invalid oracle target {0}, must be < {1}")]
    InvalidTarget(usize, usize),
    /// Wrong number of component functions for the output width.
    #[error("Expected {expected} component functions, found {found}")]
    ComponentCountMismatch {
        /// Output width of the S-box
        expected: usize,
        /// Number of component functions provided
        found: usize,
    },
    /// The lookup table is not a permutation of `0..16`.
    #[error("S-box lookup table is not a bijection, value {0:#x} is missing")]
    NotABijection(u8),
    /// The register size does not match `input_width + output_width`.
    #[error("Invalid qubit count {found}, expected {expected}")]
    InvalidQubitCount {
        /// Qubits required by the circuit
        expected: usize,
        /// Qubits held by the register
        found: usize,
    },
    /// The state vector would not fit in memory.
    #[error("Too many qubits, must be <= {0}")]
    TooManyQubits(usize),
}
