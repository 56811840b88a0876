//! Disk fill: size calculation, fill strategies, the handle holder, and the
//! start/stop controller that ties them together.

pub mod controller;
pub mod holder;
pub mod size;
pub mod strategy;

#[cfg(test)]
pub(crate) mod fake;

pub use controller::FillController;
