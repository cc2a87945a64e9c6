//! # Voltorb — Voltorb Flip decision-support engine
//!
//! Computes, for a 5×5 board with row/column sum and voltorb-count
//! constraints, which hidden cells are provably safe or provably
//! hazards, per-cell value distributions over the feasible board set,
//! a ranked move list under a survival-first or reward-first objective,
//! and a quit advisory.
//!
//! ## Pipeline
//!
//! | Stage | Module | Description |
//! |-------|--------|-------------|
//! | Validate | [`validate`] | Arithmetic feasibility of the request (shape, per-line bounds, global totals, reveals) |
//! | Propagate | [`propagation`] | Line-level arc consistency to fixpoint; guarantees and forced values |
//! | Estimate | [`sampler`] | Exact enumeration or row-wise rejection sampling for per-cell marginals |
//! | Decide | [`policy`] + [`engine`] | Objective-aware ranking, quit advisory, round-state classification |
//!
//! The engine is stateless across requests: each [`engine::analyze`]
//! call builds its own board, row-configuration caches, and RNG, and
//! seeded requests are bit-reproducible. [`server`] exposes the pipeline
//! over HTTP; nothing is ever persisted.

pub mod constants;
pub mod engine;
pub mod env_config;
pub mod line_mechanics;
pub mod policy;
pub mod propagation;
pub mod sampler;
pub mod server;
pub mod types;
pub mod validate;
