//! Output files.

pub mod export;
