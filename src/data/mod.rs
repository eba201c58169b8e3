//! # Problem descriptions and results
//!
//! Data structures describing optimization problems and their solutions. Everything in this
//! module is independent of any particular algorithm; the solving machinery lives in
//! `crate::algorithm`.
pub mod elements;
pub mod model;
pub mod solution;
