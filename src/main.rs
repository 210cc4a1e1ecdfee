//! Command-line front end: one invocation per protocol role
//!
//! Usage:
//!   avp init                                  - publish `a` and a fresh barrier block
//!   avp vote <participant> <vote> <total>     - run one participant to completion
//!   avp tally <total>                         - decode the ballots of a finished run
//!   avp clean                                 - remove leftover blobs
//!   avp params                                - show calibrated noise bounds
use anonymous_veto::{
    ballot::Vote,
    barrier::StoreBarrier,
    config::Config,
    noise::{calibrate_bound, max_participants, NoiseSampler},
    participant::{cleanup, setup, Participant},
    store::FileStore,
    tally::tally,
    Result,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "avp")]
#[command(about = "Anonymous veto protocol over a shared blob store")]
#[command(version)]
struct Cli {
    /// Directory holding the shared blobs
    #[arg(long, env = "AVP_STORE_DIR")]
    store_dir: Option<PathBuf>,

    /// Polynomial degree d
    #[arg(long, env = "AVP_DEGREE")]
    degree: Option<usize>,

    /// Prime modulus q
    #[arg(long, env = "AVP_MODULUS")]
    modulus: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish the public polynomial and reset the barrier
    Init,

    /// Share, wait for every peer, then publish an encoded ballot
    Vote {
        /// This participant's index, starting at 0
        participant_id: usize,
        /// 0 to allow, 1 to veto
        #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
        vote: u8,
        /// Number of participants in the run
        total_participants: usize,
    },

    /// Sum every ballot and report whether anyone vetoed
    Tally {
        /// Number of participants in the run
        total_participants: usize,
    },

    /// Remove the blobs of earlier runs
    Clean {
        /// Highest participant count to clean up after
        #[arg(short, long, default_value = "10")]
        parties: usize,
        /// Remove everything in the store directory instead
        #[arg(long)]
        all: bool,
    },

    /// Print the calibrated noise bound for each participant count
    Params {
        /// Largest participant count to list
        #[arg(short, long, default_value = "20")]
        max_parties: usize,
    },
}

fn main() {
    init_logging();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so stdout carries only protocol output
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anonymous_veto=info,avp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Config {
    let mut config = Config::from_env();
    if let Some(dir) = &cli.store_dir {
        config.store_dir = dir.clone();
    }
    if let Some(degree) = cli.degree {
        config.degree = degree;
    }
    if let Some(modulus) = cli.modulus {
        config.modulus = modulus;
    }
    return config;
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli);
    let ring = config.ring()?;

    match cli.command {
        Commands::Init => {
            let store = FileStore::new(&config.store_dir)?;
            setup(&store, &ring, &mut NoiseSampler::for_party(usize::MAX))?;
            println!("Shared state initialized in {}", store.get_root().display());
        }

        Commands::Vote {
            participant_id,
            vote,
            total_participants,
        } => {
            let vote = Vote::try_from(vote)?;
            let store = FileStore::new(&config.store_dir)?;
            let barrier = StoreBarrier::new(store.clone(), config.poll_interval());
            let mut participant = Participant::new(
                participant_id,
                total_participants,
                ring,
                &store,
                &barrier,
                NoiseSampler::for_party(participant_id),
            )?;
            participant.cast(vote)?;
            println!("Party {participant_id} vote encoded and written.");
        }

        Commands::Tally { total_participants } => {
            let store = FileStore::new(&config.store_dir)?;
            let result = tally(&store, &ring, total_participants)?;
            println!("Decoded (centered mod-q) Polynomial Sum:");
            let coeffs = result
                .get_centered()
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<String>>();
            println!("{}", coeffs.join(" "));
            println!();
            println!("{} vs. {}", result.get_inf_norm(), result.get_threshold());
            println!("Result: {}", result.get_verdict());
        }

        Commands::Clean { parties, all } => {
            let store = FileStore::new(&config.store_dir)?;
            if all {
                let removed = store.clear()?;
                println!("Removed {removed} blobs from {}", store.get_root().display());
            } else {
                cleanup(&store, parties)?;
                println!("All shared memory segments cleaned up.");
            }
        }

        Commands::Params { max_parties } => {
            let modulus = ring.get_modulus();
            println!("q = {modulus}, threshold q/4 = {}", ring.threshold());
            for participants in 1..=max_parties {
                match calibrate_bound(modulus, participants) {
                    Ok(bound) => println!("n = {participants:>3}: bound = {bound}"),
                    Err(_) => println!("n = {participants:>3}: infeasible"),
                }
            }
            println!("maximum participants: {}", max_participants(modulus));
        }
    }

    return Ok(());
}
