use env_logger::Env;

/// Initialize env_logger with a default filter derived from the CLI
/// verbosity flags. RUST_LOG still overrides the default.
pub fn init_logging(verbose: u8, quiet: bool) {
    let default_filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();
}
