//! Adapters implementing the domain ports.

pub mod feedback;
pub mod http;
pub mod in_memory;
pub mod pcsc_reader;
