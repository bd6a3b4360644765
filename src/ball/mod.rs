//! Ball module - components, the possession controller, and possession-stage systems

mod components;
mod interaction;
mod possession;

pub use components::*;
pub use interaction::*;
pub use possession::*;
