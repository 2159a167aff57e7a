// crates/framecut-core/src/helpers/mod.rs
//
// Small pure utilities shared by the engine and the presentation layer.

pub mod names;
pub mod time;
