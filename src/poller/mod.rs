pub mod checks;
pub mod schedule;
pub mod sequencer;

#[cfg(test)]
pub(crate) mod fake;

pub use checks::{InterfaceSweep, StatusPoller};
pub use schedule::{CadenceHandle, FailureReporter, MonitorHandle};
