//! System default configuration provider
// (c) 2026 Ferry contributors

use crate::Configuration;
use figment::{providers::Serialized, Metadata, Provider};

/// A [`figment::Provider`](https://docs.rs/figment/latest/figment/trait.Provider.html) that holds
/// the hard-wired default options
pub(super) struct SystemDefault {}

impl Provider for SystemDefault {
    fn metadata(&self) -> Metadata {
        Metadata::named("default")
    }

    fn data(
        &self,
    ) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        Serialized::defaults(Configuration::system_default()).data()
    }
}
