//! # WaveDeck Common Library
//!
//! Shared code for the WaveDeck services:
//! - Error taxonomy and `Result` alias
//! - Configuration loading and root folder resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
