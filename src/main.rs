use clap::Parser;
use log::error;

use fuzzy_join::cli::Cli;
use fuzzy_join::logging;
use fuzzy_join::orchestrator;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    let config = match cli.to_match_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = orchestrator::run(&config) {
        error!("{e:#}");
        std::process::exit(1);
    }
}
