pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod matching;
pub mod models;
pub mod orchestrator;
pub mod pairs;
pub mod similarity;
pub mod table;
