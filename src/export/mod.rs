pub mod csv_export;

pub use csv_export::{write_ambiguous, write_clean, Projection};
