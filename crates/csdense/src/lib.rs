//! Core search engine for the C source density search driver.
//!
//! Given an external random C program generator and an external program
//! reducer, searches for a C source that maximizes compiled `.text` bytes
//! per source byte under a configured compiler and optimization level,
//! while remaining a valid, side-effect-safe program. See `csdense-cli`
//! for the command-line entry point.

pub mod config;
pub mod error;
pub mod predicate;
pub mod process;
pub mod reducer;
pub mod sanitizer;
pub mod scorer;
pub mod search;
pub mod seed;
pub mod sizer;
