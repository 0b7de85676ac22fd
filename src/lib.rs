#![recursion_limit = "256"]

//! Training orchestration for sequence classifiers whose attention can be
//! supervised with human rationale distributions.
//!
//! Layers, outermost first:
//!
//! 1. [`cli`] — clap commands
//! 2. [`application`] — train / predict use cases
//! 3. [`domain`] — examples, labels, errors
//! 4. [`data`] — loading, columnar adaptation, batching
//! 5. [`ml`] — Burn model, loss, training session, predictor
//! 6. [`infra`] — checkpoints, training log, runtime setup

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;
