//! Warbler CLI library.
//!
//! This crate is the file-facing side of the codec: WAV reading and writing,
//! configuration loading, logging setup and the subcommands behind the
//! `warbler` binary.

pub mod commands;
pub mod logging;
pub mod settings;
pub mod wav;
