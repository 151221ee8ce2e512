use crate::anf_polynom::ComponentFunction;
use crate::backend::QuantumBackend;
use crate::linapx_error::LinApxError;
use crate::oracle::{compile_sbox_oracles, CompiledOracle};
use crate::sbox::SBox;
use crate::statistics::{TrialRecord, TrialStatistics};
use crate::utils::width_mask;
use log::{debug, trace};
use std::fmt::Display;

/// Bitstring measured at the end of a trial.
///
/// The high $m$ bits are the input mask, the low $n$ bits the output mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeasurementOutcome {
    bits: u32,
    output_width: usize,
}

impl MeasurementOutcome {
    /// Wraps a measured bitstring.
    pub fn new(bits: u32, output_width: usize) -> Self {
        MeasurementOutcome { bits, output_width }
    }

    /// Raw bitstring $l$.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Input mask, `l >> n`.
    pub fn input_mask(&self) -> u32 {
        self.bits >> self.output_width
    }

    /// Output mask, `l & (2^n - 1)`.
    pub fn output_mask(&self) -> u32 {
        self.bits & width_mask(self.output_width)
    }

    /// Returns `true` for the all-zero outcome, whose approximation says nothing.
    pub fn is_trivial(&self) -> bool {
        self.bits == 0
    }
}

impl Display for MeasurementOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:02X}", self.bits)
    }
}

/// Runs the sampling circuit on a register it owns.
///
/// Every trial resets the register, puts the input positions in uniform superposition, applies
/// the oracles, applies a Hadamard gate to every position and measures everything. The outcome
/// is distributed as the squared Walsh coefficients of the S-box.
#[derive(Debug)]
pub struct SamplingDriver<B: QuantumBackend> {
    register: B,
    oracles: Vec<CompiledOracle>,
    input_width: usize,
    output_width: usize,
}

impl<B: QuantumBackend> SamplingDriver<B> {
    /// Creates a driver from precompiled oracles.
    ///
    /// # Returns
    /// The driver, or [LinApxError::InvalidQubitCount] if the register does not hold
    /// `input_width + output_width` qubits.
    pub fn new(
        register: B,
        oracles: Vec<CompiledOracle>,
        input_width: usize,
        output_width: usize,
    ) -> Result<Self, LinApxError> {
        if register.num_qubits() != input_width + output_width {
            return Err(LinApxError::InvalidQubitCount {
                expected: input_width + output_width,
                found: register.num_qubits(),
            });
        }
        debug!(
            "Sampling driver ready: {} oracles, {} gates",
            oracles.len(),
            oracles.iter().map(|oracle| oracle.gates().len()).sum::<usize>()
        );
        Ok(SamplingDriver {
            register,
            oracles,
            input_width,
            output_width,
        })
    }

    /// Compiles the component functions of an S-box and creates the driver.
    pub fn from_component_functions(
        register: B,
        functions: &[ComponentFunction],
        sbox: &SBox,
    ) -> Result<Self, LinApxError> {
        let oracles = compile_sbox_oracles(functions, sbox.input_width(), sbox.output_width())?;
        SamplingDriver::new(register, oracles, sbox.input_width(), sbox.output_width())
    }

    /// Register, for inspection.
    pub fn register(&self) -> &B {
        &self.register
    }

    /// Gives the register back.
    pub fn into_register(self) -> B {
        self.register
    }

    fn num_qubits(&self) -> usize {
        self.input_width + self.output_width
    }

    /// Runs the circuit up to, but not including, the measurements.
    pub fn prepare_spectral_state(&mut self) {
        self.register.init_zero_state();
        for position in self.output_width..self.num_qubits() {
            self.register.hadamard(position);
        }
        for oracle in &self.oracles {
            oracle.apply(&mut self.register);
        }
        for position in 0..self.num_qubits() {
            self.register.hadamard(position);
        }
    }

    /// Runs one trial and returns the measured bitstring.
    pub fn run_trial(&mut self) -> MeasurementOutcome {
        self.prepare_spectral_state();
        let bits = (0..self.num_qubits()).fold(0u32, |bits, position| {
            bits | ((self.register.measure(position) as u32) << position)
        });
        let outcome = MeasurementOutcome::new(bits, self.output_width);
        trace!("Measured {}", outcome);
        outcome
    }

    /// Runs `repeat` trials, scoring each outcome against `sbox`, and keeps every record.
    ///
    /// `on_record` is called with every record as soon as it is produced.
    pub fn run<F>(&mut self, sbox: &SBox, repeat: u64, on_record: F) -> TrialStatistics
    where
        F: FnMut(&TrialRecord),
    {
        let mut statistics = TrialStatistics::new(self.input_width, self.output_width);
        self.run_into(sbox, repeat, &mut statistics, on_record);
        statistics
    }

    /// Runs `repeat` trials, accounting for them in `statistics`.
    pub fn run_into<F>(
        &mut self,
        sbox: &SBox,
        repeat: u64,
        statistics: &mut TrialStatistics,
        mut on_record: F,
    ) where
        F: FnMut(&TrialRecord),
    {
        for _ in 0..repeat {
            let outcome = self.run_trial();
            let approximation = sbox.linear_approximation(outcome.input_mask(), outcome.output_mask());
            on_record(&statistics.record(outcome, approximation));
        }
        debug!(
            "{} trials done, {} trivial, {} unbiased",
            statistics.trials(),
            statistics.count_trivial(),
            statistics.count_bad_linapx()
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::{QuantumBackend, QuantumEnv};
    use crate::driver::{MeasurementOutcome, SamplingDriver};
    use crate::oracle::compile_sbox_oracles;
    use crate::sbox::{reference_component_functions, SBox, INPUT_WIDTH, OUTPUT_WIDTH};
    use crate::statistics::TrialStatistics;
    use crate::LinApxError;
    use rayon::prelude::*;
    use test_log::test;

    #[derive(Debug, Clone, PartialEq)]
    enum Operation {
        Reset,
        Hadamard(usize),
        Flip(Vec<usize>, usize),
        Measure(usize),
    }

    /// Records the operations and answers measurements from a fixed bitstring.
    struct RecordingBackend {
        num_qubits: usize,
        answer: u32,
        operations: Vec<Operation>,
    }

    impl QuantumBackend for RecordingBackend {
        fn num_qubits(&self) -> usize {
            self.num_qubits
        }

        fn init_zero_state(&mut self) {
            self.operations.push(Operation::Reset);
        }

        fn hadamard(&mut self, target: usize) {
            self.operations.push(Operation::Hadamard(target));
        }

        fn pauli_x(&mut self, target: usize) {
            self.operations.push(Operation::Flip(vec![], target));
        }

        fn multi_controlled_x(&mut self, controls: &[usize], target: usize) {
            self.operations.push(Operation::Flip(controls.to_vec(), target));
        }

        fn measure(&mut self, target: usize) -> bool {
            self.operations.push(Operation::Measure(target));
            self.answer & (1 << target) != 0
        }
    }

    fn reference_driver(seed: u64) -> SamplingDriver<crate::backend::StateVector> {
        let env = QuantumEnv::with_seed(seed);
        let register = env.create_register(INPUT_WIDTH + OUTPUT_WIDTH).unwrap();
        SamplingDriver::from_component_functions(
            register,
            &reference_component_functions().unwrap(),
            &SBox::reference(),
        )
        .unwrap()
    }

    #[test]
    fn test_measurement_outcome() {
        let outcome = MeasurementOutcome::new(0xA3, OUTPUT_WIDTH);
        assert_eq!(outcome.input_mask(), 0xA);
        assert_eq!(outcome.output_mask(), 0x3);
        assert!(!outcome.is_trivial());
        assert_eq!(outcome.to_string(), "0xA3");
        assert_eq!(MeasurementOutcome::new(0x05, OUTPUT_WIDTH).to_string(), "0x05");
        assert!(MeasurementOutcome::new(0, OUTPUT_WIDTH).is_trivial());
    }

    #[test]
    fn test_invalid_qubit_count() {
        let env = QuantumEnv::with_seed(0);
        let register = env.create_register(7).unwrap();
        let result = SamplingDriver::from_component_functions(
            register,
            &reference_component_functions().unwrap(),
            &SBox::reference(),
        );
        assert_eq!(
            result.unwrap_err(),
            LinApxError::InvalidQubitCount {
                expected: 8,
                found: 7
            }
        );
    }

    #[test]
    fn test_trial_protocol() {
        let oracles =
            compile_sbox_oracles(&reference_component_functions().unwrap(), INPUT_WIDTH, OUTPUT_WIDTH)
                .unwrap();
        let gate_count: usize = oracles.iter().map(|oracle| oracle.gates().len()).sum();
        let backend = RecordingBackend {
            num_qubits: 8,
            answer: 0b1001_0110,
            operations: vec![],
        };
        let mut driver = SamplingDriver::new(backend, oracles, INPUT_WIDTH, OUTPUT_WIDTH).unwrap();
        let outcome = driver.run_trial();
        assert_eq!(outcome.bits(), 0b1001_0110);
        assert_eq!(outcome.input_mask(), 0b1001);
        assert_eq!(outcome.output_mask(), 0b0110);

        let operations = &driver.register().operations;
        assert_eq!(operations.len(), 1 + 4 + gate_count + 8 + 8);
        assert_eq!(operations[0], Operation::Reset);
        assert_eq!(
            &operations[1..5],
            &[4, 5, 6, 7].map(Operation::Hadamard)
        );
        assert!(operations[5..5 + gate_count]
            .iter()
            .all(|operation| matches!(operation, Operation::Flip(_, target) if *target < 4)));
        assert_eq!(
            &operations[5 + gate_count..13 + gate_count],
            &[0, 1, 2, 3, 4, 5, 6, 7].map(Operation::Hadamard)
        );
        assert_eq!(
            &operations[13 + gate_count..],
            &[0, 1, 2, 3, 4, 5, 6, 7].map(Operation::Measure)
        );

        // The next trial starts from a reset again
        driver.run_trial();
        assert_eq!(driver.register().operations[21 + gate_count], Operation::Reset);
    }

    #[test]
    fn test_oracle_entangles_inputs_with_outputs() {
        let sbox = SBox::reference();
        let mut driver = reference_driver(0);
        let oracles =
            compile_sbox_oracles(&reference_component_functions().unwrap(), INPUT_WIDTH, OUTPUT_WIDTH)
                .unwrap();
        let mut register = QuantumEnv::with_seed(0).create_register(8).unwrap();
        for position in 4..8 {
            register.hadamard(position);
        }
        for oracle in &oracles {
            oracle.apply(&mut register);
        }
        for x in 0..16u32 {
            for y in 0..16u32 {
                let probability = register.probability(((x << 4) | y) as usize);
                let expected = if y == sbox.apply(x) { 1.0 / 16.0 } else { 0.0 };
                assert!((probability - expected).abs() < 1e-12);
            }
        }

        driver.prepare_spectral_state();
        assert!((driver.register().total_probability() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_spectral_state_matches_walsh_coefficients() {
        let sbox = SBox::reference();
        let mut driver = reference_driver(0);
        driver.prepare_spectral_state();
        let distribution = sbox.sampling_distribution();
        for (bits, expected) in distribution.iter().enumerate() {
            assert!(
                (driver.register().probability(bits) - expected).abs() < 1e-9,
                "outcome {:#04x}",
                bits
            );
        }
    }

    #[test]
    fn test_sampled_outcomes_are_biased() {
        let sbox = SBox::reference();
        let mut driver = reference_driver(5);
        for _ in 0..200 {
            let outcome = driver.run_trial();
            let approximation = sbox.linear_approximation(outcome.input_mask(), outcome.output_mask());
            assert!(!approximation.is_unbiased(), "sampled {}", outcome);
        }
    }

    #[test]
    fn test_run_counts_trials() {
        let sbox = SBox::reference();
        let mut driver = reference_driver(9);
        let mut streamed = 0;
        let statistics = driver.run(&sbox, 25, |_| streamed += 1);
        assert_eq!(streamed, 25);
        assert_eq!(statistics.records().len(), 25);
        let trivial = statistics
            .records()
            .iter()
            .filter(|record| record.outcome.is_trivial())
            .count();
        assert_eq!(statistics.count_trivial(), trivial);

        let statistics = driver.run(&sbox, 0, |_| streamed += 1);
        assert_eq!(streamed, 25);
        assert!(statistics.records().is_empty());
        assert_eq!(statistics.count_trivial(), 0);
        assert_eq!(statistics.count_bad_linapx(), 0);
    }

    #[test]
    fn test_run_into_without_records() {
        let sbox = SBox::reference();
        let mut statistics = TrialStatistics::without_records(INPUT_WIDTH, OUTPUT_WIDTH);
        let mut streamed = Vec::new();
        let mut driver = reference_driver(1234);
        driver.run_into(&sbox, 30, &mut statistics, |record| streamed.push(*record));
        driver.run_into(&sbox, 20, &mut statistics, |record| streamed.push(*record));
        assert!(statistics.records().is_empty());
        assert_eq!(statistics.trials(), 50);
        assert_eq!(statistics.mask_frequencies().values().sum::<usize>(), 50);

        // Same stream as a single run keeping every record
        let kept = reference_driver(1234).run(&sbox, 50, |_| {});
        assert_eq!(kept.records(), streamed.as_slice());
        assert_eq!(statistics.count_trivial(), kept.count_trivial());
        assert_eq!(statistics.mask_frequencies(), kept.mask_frequencies());
    }

    #[test]
    fn test_into_register() {
        let sbox = SBox::reference();
        let mut driver = reference_driver(3);
        let outcome = driver.run_trial();
        let register = driver.into_register();
        assert_eq!(register.num_qubits(), INPUT_WIDTH + OUTPUT_WIDTH);
        // The register stays collapsed on the last measured bitstring
        assert!((register.probability(outcome.bits() as usize) - 1.0).abs() < 1e-9);

        // The register can drive a new run
        let mut driver = SamplingDriver::from_component_functions(
            register,
            &reference_component_functions().unwrap(),
            &sbox,
        )
        .unwrap();
        assert_eq!(driver.run(&sbox, 5, |_| {}).trials(), 5);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let sbox = SBox::reference();
        let first = reference_driver(1234).run(&sbox, 50, |_| {});
        let second = reference_driver(1234).run(&sbox, 50, |_| {});
        assert_eq!(first.records(), second.records());
    }

    #[test]
    fn test_independent_drivers_in_parallel() {
        let sbox = SBox::reference();
        let trivial_counts: Vec<usize> = (0..4u64)
            .into_par_iter()
            .map(|seed| reference_driver(seed).run(&sbox, 1600, |_| {}).count_trivial())
            .collect();
        // The trivial outcome has probability (16 / 64)^2 = 1/16, ie 100 expected hits.
        for count in trivial_counts {
            assert!(count > 50 && count < 160, "{} trivial outcomes", count);
        }
    }
}
