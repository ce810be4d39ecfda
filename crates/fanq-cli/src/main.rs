use fanq_core::logging;

mod cli;

use clap::Parser;

fn main() {
    // Initialize logging as early as possible; stderr if the state dir is unusable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = cli::Cli::parse().run() {
        eprintln!("fanq error: {:#}", err);
        std::process::exit(1);
    }
}
