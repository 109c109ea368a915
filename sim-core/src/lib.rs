//! Core of the wobbling tree visualization.
//!
//! Main components:
//! - [`graph`]: static edge list and breadth-first depth labeling.
//! - [`body`]: circular point-mass bodies and collision filters.
//! - [`spring`]: damped springs between bodies and the pointer spring.
//! - [`force_buffer`]: per-tick force accumulation.
//! - [`phases`]: per-tick force, integration and collision phases.
//! - [`world`]: simulation state and stepping.
//! - [`decor`]: twig and leaf placement.
//! - [`tree`]: builds a [`world::World`] from a graph.
//! - [`config`]: tunable constants and JSON presets.
//! - [`error`]: the shared error type.
//! - [`types`]: shared type aliases and IDs.

pub mod body;
pub mod config;
pub mod decor;
pub mod error;
pub mod force_buffer;
pub mod graph;
pub mod phases;
pub mod spring;
pub mod tree;
pub mod types;
pub mod world;

pub use config::Config;
pub use error::{Result, SceneError};
pub use tree::Tree;
