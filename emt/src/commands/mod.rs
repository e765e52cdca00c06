//! Command handlers for the emt CLI

pub mod classes;
pub mod cvars;
