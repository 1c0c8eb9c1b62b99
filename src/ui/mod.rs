// BirthWindow - ui/mod.rs
//
// UI layer: terminal presentation only.
// Dependencies: app (transcript), core (read-only models).
// Must NOT depend on: platform, direct I/O.

pub mod report;
