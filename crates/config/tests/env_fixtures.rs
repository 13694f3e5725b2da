//! Integration tests for env parsing and env-to-config merging.

use index_config_config::{
    ClientConfig, ClientEnv, ENV_API_KEY, EnvParseError, apply_env_overrides,
    load_client_config_from_path,
};
use index_config_shared::ErrorCode;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

fn read_env_map(relative: &str) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
    let contents = fs::read_to_string(fixture_path(relative))?;
    Ok(serde_json::from_str(&contents)?)
}

#[test]
fn env_fixture_merges_into_effective_config() -> Result<(), Box<dyn Error>> {
    let env_map = read_env_map("client-env.valid.json")?;
    let env = ClientEnv::from_map(&env_map)?;

    let config = apply_env_overrides(ClientConfig::default(), &env)?;

    assert_eq!(config.connection.url.as_ref(), "http://weaviate.internal:8080");
    assert_eq!(config.connection.timeout_ms, 12_000);
    assert_eq!(
        config.connection.api_key.as_ref().map(|key| key.expose()),
        Some("env-api-key")
    );
    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.class_name().as_str(), "EnvCollection");

    let headers: Vec<&str> = config
        .connection
        .additional_headers
        .keys()
        .map(AsRef::as_ref)
        .collect();
    assert_eq!(headers, vec!["X-Cohere-Api-Key", "X-OpenAI-Api-Key"]);
    Ok(())
}

#[test]
fn env_overrides_take_precedence_over_file() -> Result<(), Box<dyn Error>> {
    let env = ClientEnv::from_map(&read_env_map("client-env.valid.json")?)?;
    let path = fixture_path("client-config.valid.json");
    let config = load_client_config_from_path(Some(&path), &env)?;

    assert_eq!(config.connection.timeout_ms, 12_000);
    assert_eq!(config.retry.max_attempts, 4);
    // File-only values survive.
    assert_eq!(config.retry.base_delay_ms, 100);
    assert!(config.scenarios.keep_going);
    assert_eq!(
        config
            .connection
            .additional_headers
            .get("X-Cohere-Api-Key")
            .map(|value| value.expose()),
        Some("cohere-from-env")
    );
    Ok(())
}

#[test]
fn blank_secret_is_rejected_without_leaking() -> Result<(), Box<dyn Error>> {
    let env_map = read_env_map("client-env.invalid-secret.json")?;
    let Err(error) = ClientEnv::from_map(&env_map) else {
        return Err("expected empty secret error".into());
    };
    assert_eq!(error, EnvParseError::EmptySecret { var: ENV_API_KEY });

    let envelope: index_config_shared::ErrorEnvelope = error.into();
    assert_eq!(envelope.code, ErrorCode::new("config", "empty_env_var"));
    assert_eq!(
        envelope.metadata.get("env_var").map(String::as_str),
        Some(ENV_API_KEY)
    );
    Ok(())
}

#[test]
fn invalid_class_name_from_env_is_reported() -> Result<(), Box<dyn Error>> {
    let mut env_map = BTreeMap::new();
    env_map.insert("IXC_CLASS_NAME".to_owned(), "has spaces".to_owned());
    let env = ClientEnv::from_map(&env_map)?;

    let Err(error) = apply_env_overrides(ClientConfig::default(), &env) else {
        return Err("expected class name error".into());
    };
    assert_eq!(error.code, ErrorCode::new("config", "invalid_class_name"));
    assert_eq!(error.metadata.get("section").map(String::as_str), Some("scenarios"));
    Ok(())
}
