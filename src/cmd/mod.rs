pub mod hosts;
pub mod output;
pub mod resolve;

use embedscout::{Registry, ResolverConfig};

/// Built-in registry minus the strategies the config disables.
pub fn registry_from(config: &ResolverConfig) -> Registry {
    Registry::builder()
        .with_builtins()
        .without(config.disabled.as_slice())
        .build()
}
