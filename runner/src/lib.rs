//! Pricing Runner: batch orchestration for the pricing kernel.
//!
//! Drives a kernel over a line-delimited event log
//! (`load state → process events → save state → write audit log`) and
//! packages the outcome as a final state fingerprint. Does NOT implement
//! any decision logic itself — it delegates entirely to
//! `pricing_kernel::engine::Kernel`.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod batch;
