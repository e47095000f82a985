//! Outbound adapters: infrastructure the domain reaches out to.

pub mod persistence;
