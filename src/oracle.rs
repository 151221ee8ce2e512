use crate::anf_polynom::{AnfTerm, ComponentFunction};
use crate::backend::QuantumBackend;
use crate::linapx_error::LinApxError;
use log::debug;

/// Maximum input width, and so maximum number of controls of a gate.
pub const MAX_INPUT_WIDTH: usize = 8;

/// Inline, fixed-capacity list of control positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlSet {
    positions: [usize; MAX_INPUT_WIDTH],
    len: usize,
}

impl ControlSet {
    /// Empty control set.
    pub fn new() -> Self {
        ControlSet::default()
    }

    /// Appends a position.
    ///
    /// # Panics
    /// If the set already holds [MAX_INPUT_WIDTH] positions.
    pub fn push(&mut self, position: usize) {
        assert!(self.len < MAX_INPUT_WIDTH, "Control set is full");
        self.positions[self.len] = position;
        self.len += 1;
    }

    /// Positions, in insertion order.
    pub fn as_slice(&self) -> &[usize] {
        &self.positions[..self.len]
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the set holds no position.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Basis state bits of the positions.
    pub fn mask(&self) -> u32 {
        self.as_slice()
            .iter()
            .fold(0, |mask, &position| mask | (1 << position))
    }
}

/// Bit-flip of `target`, conditioned on every control position being 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDescriptor {
    target: usize,
    controls: ControlSet,
}

impl GateDescriptor {
    /// Unconditional flip of `target`.
    pub fn not(target: usize) -> Self {
        GateDescriptor {
            target,
            controls: ControlSet::new(),
        }
    }

    /// Flip of `target` controlled by `controls`.
    pub fn controlled_not(target: usize, controls: ControlSet) -> Self {
        GateDescriptor { target, controls }
    }

    /// Target position.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Control positions, empty for an unconditional flip.
    pub fn controls(&self) -> &[usize] {
        self.controls.as_slice()
    }

    /// Applies the gate to the basis state `state`.
    pub fn apply_classical(&self, state: u32) -> u32 {
        let control_mask = self.controls.mask();
        if state & control_mask == control_mask {
            state ^ (1 << self.target)
        } else {
            state
        }
    }

    /// Applies the gate to a register.
    pub fn apply<B: QuantumBackend>(&self, backend: &mut B) {
        if self.controls.is_empty() {
            backend.pauli_x(self.target);
        } else {
            backend.multi_controlled_x(self.controls.as_slice(), self.target);
        }
    }
}

/// Gate sequence computing one component function into its output position.
///
/// With the input positions holding $x$ and the target holding $b$, applying the gates leaves
/// $b \oplus F_j(x)$ in the target and everything else untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOracle {
    target: usize,
    gates: Vec<GateDescriptor>,
}

impl CompiledOracle {
    /// Target position.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Gates, one per ANF term.
    pub fn gates(&self) -> &[GateDescriptor] {
        &self.gates
    }

    /// Applies every gate to a register.
    pub fn apply<B: QuantumBackend>(&self, backend: &mut B) {
        for gate in &self.gates {
            gate.apply(backend);
        }
    }

    /// Applies every gate to the basis state `state`.
    pub fn apply_classical(&self, state: u32) -> u32 {
        self.gates
            .iter()
            .fold(state, |state, gate| gate.apply_classical(state))
    }
}

/// Register position of input variable $x_i$.
#[inline]
fn variable_position(variable: usize, input_width: usize, output_width: usize) -> usize {
    output_width + input_width - variable
}

/// Compiles the ANF of one component function into a gate sequence targeting `target`.
///
/// The register holds the output bits on positions `0..output_width` and the input bits on
/// positions `output_width..output_width + input_width`. The constant term becomes an
/// unconditional flip, every monomial a flip controlled by the positions of its variables.
///
/// # Returns
/// The oracle, or:
/// - [LinApxError::TooBigInputWidth] if `input_width` is greater than [MAX_INPUT_WIDTH]
/// - [LinApxError::InvalidTarget] if `target` is not an output position
/// - [LinApxError::InvalidMonomial] if a monomial is empty or names a variable outside `1..=input_width`
pub fn compile_component(
    function: &ComponentFunction,
    input_width: usize,
    output_width: usize,
    target: usize,
) -> Result<CompiledOracle, LinApxError> {
    if input_width > MAX_INPUT_WIDTH {
        return Err(LinApxError::TooBigInputWidth(MAX_INPUT_WIDTH));
    }
    if target >= output_width {
        return Err(LinApxError::InvalidTarget(target, output_width));
    }
    let gates = function
        .terms()
        .iter()
        .map(|term| match term {
            AnfTerm::Constant => Ok(GateDescriptor::not(target)),
            AnfTerm::Monomial(monomial) => {
                if !monomial.is_valid(input_width) {
                    return Err(LinApxError::InvalidMonomial {
                        output_bit: output_width - target,
                        variables: monomial.variables().to_vec(),
                        input_width,
                    });
                }
                let mut controls = ControlSet::new();
                for &variable in monomial.variables() {
                    controls.push(variable_position(variable, input_width, output_width));
                }
                Ok(GateDescriptor::controlled_not(target, controls))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        "Compiled F_{} = {} into {} gates on position {}",
        output_width - target,
        function,
        gates.len(),
        target
    );
    Ok(CompiledOracle { target, gates })
}

/// Compiles $F_1, \dots, F_n$, component function $F_j$ targeting position $n - j$.
///
/// # Returns
/// The oracles in the order of `functions`, or [LinApxError::ComponentCountMismatch] if there
/// are not exactly `output_width` functions, or any error of [compile_component].
pub fn compile_sbox_oracles(
    functions: &[ComponentFunction],
    input_width: usize,
    output_width: usize,
) -> Result<Vec<CompiledOracle>, LinApxError> {
    if functions.len() != output_width {
        return Err(LinApxError::ComponentCountMismatch {
            expected: output_width,
            found: functions.len(),
        });
    }
    functions
        .iter()
        .enumerate()
        .map(|(index, function)| {
            compile_component(function, input_width, output_width, output_width - 1 - index)
        })
        .collect()
}
