// Alert system module for rule-driven proximity alerts.
//
// Architecture:
// - model.rs: Rule, annotation and match result types
// - table.rs: Rule file parsing and lookup
// - loader.rs: Layered rule file loading and atomic publication
// - throttle.rs: Process-wide sound cooldown
// - state.rs: Per-entity warning and sound bookkeeping
// - builtin.rs: Built-in container labels
// - engine.rs: Orchestrates evaluation per tick and per frame

pub mod builtin;
pub mod engine;
pub mod loader;
pub mod model;
pub mod state;
pub mod table;
pub mod throttle;
