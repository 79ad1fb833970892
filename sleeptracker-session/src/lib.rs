//! Session layer module for the Sleeptracker framed protocol
//!
//! This crate provides the byte-stuffed frame codec shared by the Elite
//! family. It has no device knowledge: it only converts between payloads
//! and their wire representation and checks frame boundaries.

pub mod slip;

pub use slip::*;
