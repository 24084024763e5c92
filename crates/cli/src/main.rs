use clap::{Parser, Subcommand};
use ember_cli::commands::{dump, init, inspect, restore, run, verify};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Ember - checkpoint/restore runtime over a file-backed NVM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an NVM file and cold-initialize it.
    Init {
        nvm: PathBuf,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
    /// Run the counter demonstration, optionally failing power periodically
    Run {
        nvm: PathBuf,

        /// Task handoffs to complete
        #[arg(long, short, default_value_t = 10)]
        steps: usize,

        /// Cut power every K durable writes and reboot
        #[arg(long)]
        fail_every: Option<u64>,
    },
    /// Show the persisted control state
    Inspect {
        nvm: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Check the persisted state against the protocol invariants
    Verify {
        nvm: PathBuf,
    },
    /// Save a checksummed image of the NVM file
    Dump {
        nvm: PathBuf,
        image: PathBuf,
    },
    /// Program an image back into an NVM file
    Restore {
        image: PathBuf,
        nvm: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    ember_cli::telemetry::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { nvm, force } => init::run(&nvm, force),
        Commands::Run {
            nvm,
            steps,
            fail_every,
        } => run::run(&nvm, steps, fail_every).map(|_| ()),
        Commands::Inspect { nvm, json } => inspect::run(&nvm, json),
        Commands::Verify { nvm } => verify::run(&nvm),
        Commands::Dump { nvm, image } => dump::run(&nvm, &image),
        Commands::Restore { image, nvm } => restore::run(&image, &nvm),
    }
}
