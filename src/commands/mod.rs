//! # CLI Command Implementations
//!
//! Each module holds the clap `Args` for its part of the command line and an
//! `execute` function that calls into the `build_tools` library.

pub mod package;
pub mod tools;
