use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use segsieve::storage::{self, PrimeWriter};
use segsieve::{ParallelPrimeSieve, PrimeSieve, SieveConfig, Threads, TupletClass};

#[derive(Parser)]
#[command(name = "segsieve")]
#[command(about = "Count and print primes and prime k-tuplets with a segmented sieve", long_about = None)]
struct Cli {
    #[arg(long, global = true, default_value = "32", help = "Segment size in KB (1 to 8192, floored to a power of two)")]
    sieve_size: u32,
    #[arg(long, global = true, default_value = "19", help = "Pre-sieve multiples of the primes up to this limit (11 to 23)")]
    presieve: u32,
    #[arg(short, long, global = true, help = "Log debug output to stderr")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Count primes or prime k-tuplets in [START, STOP] (or [0, START])")]
    Count {
        #[arg(help = "Lower bound, or the upper bound when STOP is omitted")]
        start: u64,
        #[arg(help = "Upper bound")]
        stop: Option<u64>,
        #[arg(short, long, value_enum, default_value = "primes", help = "What to count")]
        kind: Kind,
        #[arg(short, long, help = "Number of threads (default: all cores)")]
        threads: Option<usize>,
        #[arg(long, help = "Minimum interval sieved by one thread")]
        min_interval: Option<u64>,
    },
    #[command(about = "Print primes or prime k-tuplets in [START, STOP] (or [0, START])")]
    Print {
        #[arg(help = "Lower bound, or the upper bound when STOP is omitted")]
        start: u64,
        #[arg(help = "Upper bound")]
        stop: Option<u64>,
        #[arg(short, long, value_enum, default_value = "primes", help = "What to print")]
        kind: Kind,
        #[arg(long, help = "Write to primes.txt in the data directory instead of stdout")]
        save: bool,
    },
    #[command(about = "Find the nth prime >= START")]
    Nth {
        #[arg(help = "Which prime (1 is the first)")]
        n: u64,
        #[arg(short, long, default_value = "0", help = "Count primes from here")]
        start: u64,
        #[arg(short, long, help = "Number of threads (default: all cores)")]
        threads: Option<usize>,
    },
    #[command(about = "Print the largest supported stop value")]
    MaxStop,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Primes,
    Twins,
    Triplets,
    Quadruplets,
    Quintuplets,
    Sextuplets,
    Septuplets,
    All,
}

impl Kind {
    fn classes(self) -> Vec<TupletClass> {
        match self {
            Kind::Primes => vec![TupletClass::Primes],
            Kind::Twins => vec![TupletClass::Twins],
            Kind::Triplets => vec![TupletClass::Triplets],
            Kind::Quadruplets => vec![TupletClass::Quadruplets],
            Kind::Quintuplets => vec![TupletClass::Quintuplets],
            Kind::Sextuplets => vec![TupletClass::Sextuplets],
            Kind::Septuplets => vec![TupletClass::Septuplets],
            Kind::All => TupletClass::ALL.to_vec(),
        }
    }
}

fn bounds(start: u64, stop: Option<u64>) -> (u64, u64) {
    match stop {
        Some(stop) => (start, stop),
        None => (0, start),
    }
}

fn print_duration(subcommand: &str, args: &str, threads: usize, start: Instant) {
    let duration_us = start.elapsed().as_micros();

    println!(
        "Execution time: {}us ({:.2}ms)",
        duration_us,
        duration_us as f64 / 1000.0
    );

    if let Err(e) = storage::log_execution(subcommand, args, threads, duration_us) {
        eprintln!("Warning: Failed to log execution: {}", e);
    }
}

fn run(cli: Cli) -> segsieve::Result<()> {
    let config = SieveConfig::new()
        .sieve_size_kb(cli.sieve_size)
        .presieve_limit(cli.presieve);

    match cli.command {
        Commands::Count {
            start,
            stop,
            kind,
            threads,
            min_interval,
        } => {
            let timer = Instant::now();
            let (start, stop) = bounds(start, stop);
            let mut config = config.threads(Threads::from(threads));
            if let Some(interval) = min_interval {
                config = config.min_thread_interval(interval);
            }
            let sieve = ParallelPrimeSieve::with_config(config)?;
            let threads_used = sieve.threads_for(start, stop);
            info!(start, stop, threads = threads_used, "counting");

            let classes = kind.classes();
            let counts = sieve.count_all(start, stop, &classes)?;
            for &class in &classes {
                let label = format!("{}:", class.name());
                println!("{:<20}{}", label, counts[class]);
            }
            print_duration("count", &format!("{}..={}", start, stop), threads_used, timer);
        }
        Commands::Print {
            start,
            stop,
            kind,
            save,
        } => {
            let timer = Instant::now();
            let (start, stop) = bounds(start, stop);
            let sieve = PrimeSieve::with_config(config)?;
            let (out, path): (Box<dyn io::Write>, Option<PathBuf>) = if save {
                let (path, file) = storage::create_data_file("primes.txt")?;
                (Box::new(file), Some(path))
            } else {
                (Box::new(io::stdout().lock()), None)
            };

            // one class after the other keeps each class sorted
            let mut writer = PrimeWriter::new(out);
            for class in kind.classes() {
                sieve.for_each_tuplet(start, stop, class, |members| match members {
                    [prime] => writer.write_prime(*prime),
                    _ => writer.write_tuplet(members),
                })?;
            }
            let written = writer.finish()?;
            info!(start, stop, written, "printed");

            if let Some(path) = path {
                println!("Saved {} lines to {}", written, path.display());
                print_duration("print", &format!("{}..={}", start, stop), 1, timer);
            }
        }
        Commands::Nth { n, start, threads } => {
            let timer = Instant::now();
            let sieve = ParallelPrimeSieve::with_config(config.threads(Threads::from(threads)))?;
            let prime = sieve.nth_prime(n, start)?;
            println!("{}", prime);
            let threads_used = Threads::from(threads).resolve();
            print_duration("nth", &format!("{} from {}", n, start), threads_used, timer);
        }
        Commands::MaxStop => {
            println!("{}", segsieve::max_stop());
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
