//! Player module - actor components and locomotion

mod components;
mod movement;

pub use components::*;
pub use movement::*;
