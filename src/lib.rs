//! Civic Amend - Amendment resolution core
//!
//! Users propose amendments (text patches) against shared texts and vote on
//! them. Accepting one amendment patches the text and re-evaluates every
//! other open amendment on it: those that still apply are rebased, the rest
//! are closed as conflicted.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
