//! Decision Advisor - Multi-step decision analysis pipeline
//!
//! This crate turns a free-text decision into a scored strategic
//! recommendation by running five structured reasoning steps (plan,
//! research, risk, opportunity, strategize) against a text-generation
//! backend, then aggregating the per-factor scores deterministically.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
