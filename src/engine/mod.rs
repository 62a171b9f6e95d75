// src/engine/mod.rs — Search engine core: algorithm, state, events, runs

pub mod hub;
pub mod runner;
pub mod sample;
pub mod search;
pub mod store;
pub mod types;
