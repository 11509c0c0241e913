//! Search orchestration module
//!
//! Dispatches queries across the registered providers and routes chosen
//! results back to whoever produced them.

mod executor;
mod router;

pub use executor::Dispatcher;
pub use router::ExecutionRouter;
