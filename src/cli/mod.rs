pub mod clap_parser;

pub use clap_parser::Cli;
