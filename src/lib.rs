// src/lib.rs — Library root for minseek

pub mod api;
pub mod engine;
pub mod expr;
pub mod infra;
