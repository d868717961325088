//! Domain types and the ports the application layer talks through.

pub mod apdu;
pub mod outcome;
pub mod ports;
pub mod token;
