//! Result types exchanged with the presentation client
//!
//! Providers produce [`SearchResult`]s; the dispatcher stamps ownership onto
//! them and the execution router reads it back.

mod types;

pub use types::*;
