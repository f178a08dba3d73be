//! Pairing logic module
//!
//! Splits the waiting pool into compatibility partitions and forms
//! fixed-size groups in arrival order.

pub mod compatibility;
pub mod grouping;

pub use compatibility::{partition, Partition};
pub use grouping::{form_groups, Group, PairingPlan};
