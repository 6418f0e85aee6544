//! Nanoinit: a minimal init for process-namespace containers.
//!
//! Nanoinit runs as pid 1 inside a container, launches each command
//! given on its command line, forwards termination-relevant signals to
//! the launched processes, reaps every exited descendant (including
//! orphans reparented to it), and exits with the status of the first
//! launched process to finish.
//!
//! The binary is the product; the library surface exists so the
//! supervision logic can be exercised by tests.

#![deny(unsafe_code)]

#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

pub mod cli;
pub mod error;
pub mod reaper;
pub mod registry;
pub mod run;
mod signal;

pub use crate::run::run;
