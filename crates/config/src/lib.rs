//! # index-config-config
//!
//! Client configuration schema, validation, env overrides, and loading.
//! This crate depends on `domain` and `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (defaults + file + env).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use env::{
    ClientEnv, ENV_API_KEY, ENV_CLASS_NAME, ENV_COHERE_API_KEY, ENV_HUGGINGFACE_API_KEY,
    ENV_OPENAI_API_KEY, ENV_RETRY_MAX_ATTEMPTS, ENV_TIMEOUT_MS, ENV_URL, EnvParseError,
    PROVIDER_KEY_HEADERS, apply_env_overrides,
};
pub use load::{
    load_client_config_from_path, load_client_config_from_sources, load_client_config_std_env,
    to_pretty_json, to_pretty_toml,
};
pub use schema::{
    CURRENT_CONFIG_VERSION, ClientConfig, ConfigSchemaError, ConnectionConfig,
    DEFAULT_CLASS_NAME, DEFAULT_URL, RetryConfig, ScenariosConfig, ValidatedClientConfig,
    parse_client_config_json, parse_client_config_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use index_config_domain::domain_crate_version;
    use index_config_shared::shared_crate_version;

    #[test]
    fn config_crate_compiles() {
        let version = config_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn config_can_use_domain_and_shared() {
        let domain_version = domain_crate_version();
        let shared_version = shared_crate_version();

        assert!(!domain_version.is_empty());
        assert!(!shared_version.is_empty());
    }
}
