// crates/framecut-media/src/helpers/mod.rs
//
// Internal helper modules for framecut-media. Not re-exported from lib.rs.

pub mod seek;
