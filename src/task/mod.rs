//! Task board management for Kanban.
//!
//! This module keeps every project's tasks in dense, per-column order. Tasks
//! are appended to the end of their column on creation, relocated by the move
//! operation (possibly into another column), and removed with the trailing
//! siblings shifted down to close the gap. The module follows hexagonal
//! architecture:
//!
//! - Domain types and the pure reordering planner in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
