// CarScope - app/mod.rs
//
// Application layer: store access, the listing cache, session state.
// Dependencies: core layer, rusqlite.
// Must NOT depend on: platform specifics.

pub mod cache;
pub mod loader;
pub mod state;
