//! Search providers
//!
//! Each provider is a statically linked kind instantiated from a manifest in
//! the providers directory. The registry holds the live set; the dispatcher
//! fans queries out to it.

pub mod apps;
pub mod calculator;
pub mod files;
pub mod flatpak;
pub mod icons;
pub mod loader;
pub mod manifest;
pub mod process;
pub mod registry;
pub mod script;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use loader::ProviderLoader;
pub use manifest::ProviderManifest;
pub use registry::{ProviderList, ProviderRegistry};
pub use traits::{Provider, ProviderInfo, ProviderSource, RegisteredProvider};
