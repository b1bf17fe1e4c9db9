// CarScope - platform/mod.rs
//
// Platform abstraction layer.
// Dependencies: directories crate, core cleaning rules.
// Must NOT depend on: app.

pub mod config;
