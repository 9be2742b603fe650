//! Multi-year maritime fleet-transition planning.
//!
//! A scenario is a set of parameter tables. Each scenario is built into a
//! mixed-integer program, solved by an [`oracle::Oracle`], and turned into a
//! per-year [`results::ResultRecord`]; scenarios are then compared against a
//! baseline.

pub mod compare;
pub mod config;
pub mod error;
pub mod io;
/// Model variants, the solver-neutral problem, and the model builder.
pub mod model;
pub mod oracle;
pub mod params;
pub mod results;
pub mod runner;
pub mod types;
