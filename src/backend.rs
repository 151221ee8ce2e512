use crate::linapx_error::LinApxError;
use log::{debug, info};
use num_complex::Complex64;
use num_traits::{One, Zero};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::Cell;
use std::f64::consts::FRAC_1_SQRT_2;

/// Maximum number of qubits of a [StateVector], the amplitudes taking $16 \cdot 2^q$ bytes.
pub const MAX_QUBITS: usize = 24;

/// Operations the sampling circuit needs from a quantum register.
///
/// Positions are numbered from 0, position $p$ being bit $p$ of a basis state index.
pub trait QuantumBackend {
    /// Number of qubits of the register.
    fn num_qubits(&self) -> usize;

    /// Resets the register to the basis state $|0 \dots 0\rangle$.
    fn init_zero_state(&mut self);

    /// Applies the Hadamard gate to one position.
    fn hadamard(&mut self, target: usize);

    /// Flips one position unconditionally.
    fn pauli_x(&mut self, target: usize);

    /// Flips `target` on the basis states where every position of `controls` is 1.
    fn multi_controlled_x(&mut self, controls: &[usize], target: usize);

    /// Measures one position in the computational basis, collapsing the register on the outcome.
    fn measure(&mut self, target: usize) -> bool;
}

/// Simulation context, handing out [StateVector] registers.
///
/// Registers created by a seeded environment draw their measurements from a reproducible
/// random stream. The $k$-th register of the environment is seeded with `seed + k`, so two
/// registers of one environment never share a stream.
#[derive(Debug)]
pub struct QuantumEnv {
    seed: Option<u64>,
    registers_created: Cell<u64>,
}

impl QuantumEnv {
    /// Creates an environment whose registers are seeded from the operating system.
    pub fn new() -> Self {
        QuantumEnv {
            seed: None,
            registers_created: Cell::new(0),
        }
    }

    /// Creates an environment whose registers are seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        QuantumEnv {
            seed: Some(seed),
            registers_created: Cell::new(0),
        }
    }

    /// Seed of the environment, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Number of registers created so far.
    pub fn registers_created(&self) -> u64 {
        self.registers_created.get()
    }

    /// Allocates a register of `num_qubits` qubits in state $|0 \dots 0\rangle$.
    ///
    /// # Returns
    /// The register, or [LinApxError::TooManyQubits] if `num_qubits` is greater than [MAX_QUBITS].
    pub fn create_register(&self, num_qubits: usize) -> Result<StateVector, LinApxError> {
        if num_qubits > MAX_QUBITS {
            return Err(LinApxError::TooManyQubits(MAX_QUBITS));
        }
        let index = self.registers_created.get();
        self.registers_created.set(index + 1);
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index)),
            None => StdRng::from_os_rng(),
        };
        let mut amplitudes = vec![Complex64::zero(); 1 << num_qubits];
        amplitudes[0] = Complex64::one();
        Ok(StateVector {
            num_qubits,
            amplitudes,
            rng,
        })
    }

    /// Logs the environment parameters.
    pub fn report(&self) {
        match self.seed {
            Some(seed) => info!("Simulation environment: dense state vector, seed {}", seed),
            None => info!("Simulation environment: dense state vector, seeded from the OS"),
        }
    }
}

impl Default for QuantumEnv {
    fn default() -> Self {
        QuantumEnv::new()
    }
}

impl Drop for QuantumEnv {
    fn drop(&mut self) {
        debug!("Releasing simulation environment");
    }
}

/// Dense state-vector register: $2^q$ complex amplitudes.
#[derive(Debug)]
pub struct StateVector {
    num_qubits: usize,
    amplitudes: Vec<Complex64>,
    rng: StdRng,
}

impl StateVector {
    /// Amplitudes, index $i$ being the basis state whose position $p$ holds bit $p$ of $i$.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Probability of observing `basis_state` when measuring every position.
    pub fn probability(&self, basis_state: usize) -> f64 {
        self.amplitudes[basis_state].norm_sqr()
    }

    /// Sum of the probabilities of all basis states, 1 up to rounding.
    pub fn total_probability(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }

    /// Logs the register parameters.
    pub fn report(&self) {
        info!(
            "Register: {} qubits, {} amplitudes, {} bytes",
            self.num_qubits,
            self.amplitudes.len(),
            self.amplitudes.len() * std::mem::size_of::<Complex64>()
        );
    }

    #[inline]
    fn check_position(&self, position: usize) {
        #[cfg(not(feature = "unsafe_disable_safety_checks"))]
        if position >= self.num_qubits {
            panic!(
                "Qubit position {} out of range, must be < {}",
                position, self.num_qubits
            );
        }
    }
}

impl QuantumBackend for StateVector {
    fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn init_zero_state(&mut self) {
        self.amplitudes.fill(Complex64::zero());
        self.amplitudes[0] = Complex64::one();
    }

    fn hadamard(&mut self, target: usize) {
        self.check_position(target);
        let bit = 1 << target;
        for index in (0..self.amplitudes.len()).filter(|index| index & bit == 0) {
            let low = self.amplitudes[index];
            let high = self.amplitudes[index | bit];
            self.amplitudes[index] = (low + high).scale(FRAC_1_SQRT_2);
            self.amplitudes[index | bit] = (low - high).scale(FRAC_1_SQRT_2);
        }
    }

    fn pauli_x(&mut self, target: usize) {
        self.multi_controlled_x(&[], target);
    }

    fn multi_controlled_x(&mut self, controls: &[usize], target: usize) {
        self.check_position(target);
        let control_mask = controls.iter().fold(0usize, |mask, &control| {
            self.check_position(control);
            mask | (1 << control)
        });
        #[cfg(not(feature = "unsafe_disable_safety_checks"))]
        if control_mask & (1 << target) != 0 {
            panic!("Qubit position {} is both control and target", target);
        }
        let bit = 1 << target;
        for index in 0..self.amplitudes.len() {
            if index & bit == 0 && index & control_mask == control_mask {
                self.amplitudes.swap(index, index | bit);
            }
        }
    }

    fn measure(&mut self, target: usize) -> bool {
        self.check_position(target);
        let bit = 1 << target;
        let (probability_zero, probability_one) = self.amplitudes.iter().enumerate().fold(
            (0.0, 0.0),
            |(zero, one), (index, amplitude)| {
                if index & bit == 0 {
                    (zero + amplitude.norm_sqr(), one)
                } else {
                    (zero, one + amplitude.norm_sqr())
                }
            },
        );
        let outcome =
            self.rng.random::<f64>() * (probability_zero + probability_one) < probability_one;
        let norm = if outcome {
            probability_one.sqrt()
        } else {
            probability_zero.sqrt()
        };
        for (index, amplitude) in self.amplitudes.iter_mut().enumerate() {
            if (index & bit != 0) == outcome {
                *amplitude = amplitude.unscale(norm);
            } else {
                *amplitude = Complex64::zero();
            }
        }
        outcome
    }
}

impl Drop for StateVector {
    fn drop(&mut self) {
        debug!("Releasing register of {} qubits", self.num_qubits);
    }
}
