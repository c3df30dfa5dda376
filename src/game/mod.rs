// src/game/mod.rs
mod types;
mod board;
mod cost;
mod zoc;
mod movement;

pub use types::*;
pub use board::*;
pub use cost::*;
pub use zoc::*;
pub use movement::*;
