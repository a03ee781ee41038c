mod contracts;
mod event_logs;
mod providers;

pub use contracts::*;
pub use event_logs::*;
pub use providers::*;
