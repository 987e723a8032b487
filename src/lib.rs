// jtupdate-engine: a jump-threading update engine for an optimizing
// compiler's mid-level CFG/SSA representation.

#![allow(dead_code)]

pub mod cfg;
pub mod cli;
pub mod output;
pub mod platform;
pub mod ssa;
pub mod threading;
