//! Utility modules for the asset pipeline.

pub mod path;
mod plural;
pub mod size;
pub mod walk;

pub use plural::plural_count;
