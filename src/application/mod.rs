//! Application layer: the token pipeline and the loop that drives it.
//!
//! A read cycle flows one way through these modules: the `extractor` pulls a
//! token off the card, the `gate` decides whether it is a new tap, the
//! `dispatcher` turns it into a transaction outcome, and the `terminal` ties
//! the cycles together and owns all long-lived state.

pub mod dispatcher;
pub mod extractor;
pub mod gate;
pub mod startup;
pub mod terminal;
