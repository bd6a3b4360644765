//! Game event logging
//!
//! Possession and control systems emit `GameEvent`s to the `EventBus`. The
//! windowed game writes them to an `.evlog` file in a compact text format;
//! the scenario runner reads them to check expected sequences.

mod bus;
mod format;
mod logger;
mod types;

pub use bus::{BusEvent, EventBus};
pub use format::serialize_event;
pub use logger::{EventLogConfig, EventLogger, write_bus_events};
pub use types::GameEvent;
