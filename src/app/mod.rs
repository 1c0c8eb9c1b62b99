// BirthWindow - app/mod.rs
//
// Application layer: the questionnaire session, reference loading, and
// script replay.
// Dependencies: core layer.
// Must NOT depend on: platform specifics.

pub mod reference_mgr;
pub mod script;
pub mod session;
