//! Command-line front end for `license-check`.

pub mod cli;
pub mod logging;
