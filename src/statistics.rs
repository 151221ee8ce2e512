use crate::correlation::LinearApproximation;
use crate::driver::MeasurementOutcome;
use crate::sbox::SBox;
use crate::utils::width_mask;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Probability of measuring a mask pair whose correlation is `correlation`:
///
/// $$p = \left(\frac{c}{2^m \cdot 2^{\lfloor n/2 \rfloor}}\right)^2$$
pub fn probability_estimate(correlation: i32, input_width: usize, output_width: usize) -> f64 {
    let scale = (1u64 << input_width) as f64 * (1u64 << (output_width / 2)) as f64;
    let amplitude = correlation as f64 / scale;
    amplitude * amplitude
}

/// Result of one trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialRecord {
    /// Measured bitstring
    pub outcome: MeasurementOutcome,
    /// Signed correlation of the measured mask pair
    pub correlation: i32,
    /// Number of inputs satisfying the measured approximation
    pub approximates: u32,
    /// Probability of measuring this mask pair
    pub probability: f64,
}

impl Display for TrialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{:.6}\t{}",
            self.outcome, self.probability, self.approximates
        )
    }
}

/// Counters and records accumulated over a run.
///
/// Counters and per-bitstring frequencies are always kept. The records themselves are kept
/// unless the statistics were created with [TrialStatistics::without_records], in which case
/// memory does not grow with the number of trials.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialStatistics {
    input_width: usize,
    output_width: usize,
    trials: usize,
    count_trivial: usize,
    count_bad_linapx: usize,
    frequencies: BTreeMap<u32, usize>,
    records: Option<Vec<TrialRecord>>,
}

impl TrialStatistics {
    /// Empty statistics keeping every record.
    pub fn new(input_width: usize, output_width: usize) -> Self {
        TrialStatistics {
            input_width,
            output_width,
            trials: 0,
            count_trivial: 0,
            count_bad_linapx: 0,
            frequencies: BTreeMap::new(),
            records: Some(Vec::new()),
        }
    }

    /// Empty statistics keeping the counters and frequencies only.
    pub fn without_records(input_width: usize, output_width: usize) -> Self {
        TrialStatistics {
            records: None,
            ..TrialStatistics::new(input_width, output_width)
        }
    }

    /// Accounts for one trial and returns its record.
    pub fn record(
        &mut self,
        outcome: MeasurementOutcome,
        approximation: LinearApproximation,
    ) -> TrialRecord {
        self.trials += 1;
        if outcome.is_trivial() {
            self.count_trivial += 1;
        }
        if approximation.is_unbiased() {
            self.count_bad_linapx += 1;
        }
        *self.frequencies.entry(outcome.bits()).or_insert(0) += 1;
        let record = TrialRecord {
            outcome,
            correlation: approximation.correlation,
            approximates: approximation.approximates,
            probability: probability_estimate(
                approximation.correlation,
                self.input_width,
                self.output_width,
            ),
        };
        if let Some(records) = &mut self.records {
            records.push(record);
        }
        record
    }

    /// Number of trials accounted for.
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Number of trials measuring the all-zero bitstring.
    pub fn count_trivial(&self) -> usize {
        self.count_trivial
    }

    /// Number of trials measuring an unbiased approximation.
    pub fn count_bad_linapx(&self) -> usize {
        self.count_bad_linapx
    }

    /// Records, in trial order. Empty if records are not kept.
    pub fn records(&self) -> &[TrialRecord] {
        self.records.as_deref().unwrap_or(&[])
    }

    /// Number of times each measured bitstring was measured.
    pub fn mask_frequencies(&self) -> &BTreeMap<u32, usize> {
        &self.frequencies
    }
}

impl SBox {
    /// Exact probability of every bitstring $l = (\alpha \ll n) | \beta$ at the end of a trial.
    pub fn sampling_distribution(&self) -> Vec<f64> {
        let output_width = self.output_width();
        (0..=width_mask(self.input_width() + output_width))
            .map(|bits| {
                let approximation =
                    self.linear_approximation(bits >> output_width, bits & width_mask(output_width));
                probability_estimate(approximation.correlation, self.input_width(), output_width)
            })
            .collect()
    }
}

/// Observed and exact frequency of one bitstring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumEntry {
    /// Bitstring
    pub outcome: MeasurementOutcome,
    /// Number of trials measuring it
    pub observed: usize,
    /// `observed` divided by the number of trials
    pub empirical_frequency: f64,
    /// Probability of measuring it
    pub exact_probability: f64,
}

/// Comparison of the measured frequencies with the exact sampling distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumSummary {
    trials: usize,
    entries: Vec<SpectrumEntry>,
}

impl SpectrumSummary {
    /// Builds the summary, listing every bitstring that was measured or has non-zero
    /// probability, most probable first.
    pub fn new(statistics: &TrialStatistics, sbox: &SBox) -> Self {
        let trials = statistics.trials();
        let frequencies = statistics.mask_frequencies();
        let mut entries: Vec<SpectrumEntry> = sbox
            .sampling_distribution()
            .into_iter()
            .enumerate()
            .map(|(bits, exact_probability)| {
                let observed = frequencies.get(&(bits as u32)).copied().unwrap_or(0);
                SpectrumEntry {
                    outcome: MeasurementOutcome::new(bits as u32, sbox.output_width()),
                    observed,
                    empirical_frequency: if trials == 0 {
                        0.0
                    } else {
                        observed as f64 / trials as f64
                    },
                    exact_probability,
                }
            })
            .filter(|entry| entry.observed > 0 || entry.exact_probability > 0.0)
            .collect();
        entries.sort_by(|a, b| {
            b.exact_probability
                .total_cmp(&a.exact_probability)
                .then(a.outcome.cmp(&b.outcome))
        });
        SpectrumSummary { trials, entries }
    }

    /// Number of trials summarised.
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Entries, most probable first.
    pub fn entries(&self) -> &[SpectrumEntry] {
        &self.entries
    }

    /// Total variation distance between the empirical and exact distributions.
    pub fn total_variation_distance(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| (entry.empirical_frequency - entry.exact_probability).abs())
            .sum::<f64>()
            / 2.0
    }
}

impl Display for SpectrumSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  l\tcount\tfreq.\texact")?;
        for entry in &self.entries {
            writeln!(
                f,
                "{}\t{}\t{:.4}\t{:.4}",
                entry.outcome, entry.observed, entry.empirical_frequency, entry.exact_probability
            )?;
        }
        write!(
            f,
            "Total variation distance over {} trials: {:.4}",
            self.trials,
            self.total_variation_distance()
        )
    }
}
