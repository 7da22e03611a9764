//! Foundation module - process-wide utilities
//!
//! Currently just logging setup shared by every binary built on the engine.

pub mod logging;
