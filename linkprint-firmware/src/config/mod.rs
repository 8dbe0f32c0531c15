//! Printer configuration
//!
//! Generated by build.rs from printer.toml.

include!(concat!(env!("OUT_DIR"), "/printer_config.rs"));
