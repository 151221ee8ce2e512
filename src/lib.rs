//! # Quantum sampling of S-box linear approximations

#![doc = include_str!("../README.md")]
#![forbid(unsafe_code, unused_must_use)]
#![forbid(
    missing_docs,
    unreachable_pub,
    unused_import_braces,
    unused_extern_crates
)]

mod anf_polynom;
mod backend;
mod correlation;
mod driver;
mod linapx_error;
mod oracle;
mod sbox;
mod statistics;
mod utils;

pub use crate::anf_polynom::{AnfTerm, ComponentFunction, Monomial, MAX_TABLE_INPUT_WIDTH};
pub use crate::backend::{QuantumBackend, QuantumEnv, StateVector, MAX_QUBITS};
pub use crate::correlation::LinearApproximation;
pub use crate::driver::{MeasurementOutcome, SamplingDriver};
pub use crate::linapx_error::LinApxError;
pub use crate::oracle::{
    compile_component, compile_sbox_oracles, CompiledOracle, ControlSet, GateDescriptor,
    MAX_INPUT_WIDTH,
};
pub use crate::sbox::{reference_component_functions, SBox, INPUT_WIDTH, OUTPUT_WIDTH};
pub use crate::statistics::{
    probability_estimate, SpectrumEntry, SpectrumSummary, TrialRecord, TrialStatistics,
};
