//! Audio processing: per-clip effects, overlay rendering, I/O.

pub mod effects;
pub mod io;
pub mod render;
