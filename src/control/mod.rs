//! Control module - rosters, active-actor switching, and the control-stage systems

mod pending;
mod policy;
mod roster;
mod switcher;

pub use pending::*;
pub use policy::*;
pub use roster::*;
pub use switcher::*;
