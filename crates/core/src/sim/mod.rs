//! Simulation: program loading, the run loop, and test-case judging.
//!
//! Provides utilities for loading program images into memory, setting up the initial
//! machine state, running it against a scripted console, and comparing the result with
//! an expected transcript.

/// Argument vector serialization.
pub mod argv;
/// Transcript comparator and suite runner.
pub mod harness;
/// `sim65` and raw program images.
pub mod image;
/// ld65 label files.
pub mod labels;
/// Image validation and machine initialization.
pub mod loader;
/// JSON test manifests.
pub mod manifest;
/// The run loop and shim servicing.
pub mod simulator;
