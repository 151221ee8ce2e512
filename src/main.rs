//! Samples linear approximations of the reference S-box.
//!
//! **Usage**:
//! ```bash
//! quantum_linapx 20
//! quantum_linapx 1000 --seed 7 --summary
//! ```

use clap::error::ErrorKind;
use clap::Parser;
use color_eyre::Result;
use log::info;
use quantum_linapx::{
    reference_component_functions, QuantumEnv, SBox, SamplingDriver, SpectrumSummary,
    TrialStatistics,
};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

const SEPARATOR: &str = "-----------------------------------------";

#[derive(Debug, Parser)]
#[command(name = "quantum_linapx", version)]
#[command(about = "Sample linear approximations of a 4-bit S-box with a simulated quantum circuit", long_about = None)]
struct Cli {
    /// Number of trials
    #[arg(value_name = "TIMES")]
    times: u64,

    /// Seed of the measurement random generator
    #[arg(long)]
    seed: Option<u64>,

    /// Compare measured frequencies with the exact distribution after the run
    #[arg(long)]
    summary: bool,

    /// Log verbosity, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn print_usage(program: &str) {
    println!("\nUsage: {} <times>", program);
    println!("Replace <times> by a positive integer to repeat <times> times");
}

fn init_logger(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let program = std::env::args()
        .next()
        .unwrap_or_else(|| String::from("quantum_linapx"));
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                print_usage(&program);
                return Ok(());
            }
        },
    };
    init_logger(args.verbose)?;

    let sbox = SBox::reference();
    let functions = reference_component_functions()?;
    for (index, function) in functions.iter().enumerate() {
        info!("F_{}(x) = {}", index + 1, function);
    }

    let env = match args.seed {
        Some(seed) => QuantumEnv::with_seed(seed),
        None => QuantumEnv::new(),
    };
    let register = env.create_register(sbox.input_width() + sbox.output_width())?;
    register.report();
    env.report();
    let mut driver = SamplingDriver::from_component_functions(register, &functions, &sbox)?;

    println!("{}", SEPARATOR);
    println!("Measured States for linear approximation:");
    println!("{}", SEPARATOR);
    println!("  l\tprob.\t  Approx. # of x|f(x)");
    println!("{}", SEPARATOR);
    let mut statistics =
        TrialStatistics::without_records(sbox.input_width(), sbox.output_width());
    driver.run_into(&sbox, args.times, &mut statistics, |record| {
        println!("{}", record)
    });
    println!("{}", SEPARATOR);

    println!(
        "\nNumber of times trivial solution measured is {}",
        statistics.count_trivial()
    );
    println!(
        "Number of times bad linear approximation measured is {}",
        statistics.count_bad_linapx()
    );

    if args.summary {
        println!("{}", SEPARATOR);
        println!("{}", SpectrumSummary::new(&statistics, &sbox));
    }

    Ok(())
}
