// BirthWindow - core/mod.rs
//
// Core business logic layer.
// Must NOT depend on: app, platform, or touch the filesystem directly.

pub mod answers;
pub mod elimination;
pub mod export;
pub mod model;
pub mod reference;
pub mod results;
pub mod timeline;
