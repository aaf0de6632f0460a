use serde_json::{Map, Value};

use super::ConfigError;

/// Checks types and ranges of the merged config before it is turned into
/// typed settings. Absent keys are fine; defaults fill them in later.
pub fn validate_config(config: &Value) -> Result<(), ConfigError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        expect_optional_string(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        if let Some(origins) = server.get("cors_allowed_origins") {
            let list = origins
                .as_array()
                .ok_or_else(|| config_type_error("server.cors_allowed_origins", "array"))?;
            if list.iter().any(|item| !item.is_string()) {
                return Err(config_type_error(
                    "server.cors_allowed_origins[]",
                    "string",
                ));
            }
        }
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        if let Some(provider) = expect_optional_string(llm, "llm.provider", "provider")? {
            if !matches!(provider, "gemini" | "openai") {
                return Err(ConfigError::Invalid(format!(
                    "llm.provider must be one of gemini, openai (got {})",
                    provider
                )));
            }
        }
        for (path, key) in [
            ("llm.api_key", "api_key"),
            ("llm.base_url", "base_url"),
            ("llm.chat_model", "chat_model"),
            ("llm.embedding_model", "embedding_model"),
            ("llm.system_instruction", "system_instruction"),
        ] {
            expect_optional_string(llm, path, key)?;
        }
        validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 2.0)?;
        validate_f64_field(llm, "llm.top_p", "top_p", 0.0, 1.0)?;
        validate_u64_field(llm, "llm.top_k", "top_k", 1, 1_000)?;
        validate_u64_field(
            llm,
            "llm.max_output_tokens",
            "max_output_tokens",
            1,
            1_000_000,
        )?;
        validate_u64_field(
            llm,
            "llm.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    if let Some(rag) = expect_optional_object(root, "rag")? {
        for (path, key) in [
            ("rag.storage_path", "storage_path"),
            ("rag.collection", "collection"),
            ("rag.examples_path", "examples_path"),
        ] {
            expect_optional_string(rag, path, key)?;
        }
        // batchEmbedContents accepts at most 100 requests per call.
        validate_u64_field(rag, "rag.ingest_batch_size", "ingest_batch_size", 1, 100)?;
    }

    if let Some(session) = expect_optional_object(root, "session")? {
        if let Some(value) = session.get("record_user_turns") {
            if !value.is_boolean() {
                return Err(config_type_error("session.record_user_turns", "boolean"));
            }
        }
    }

    if let Some(output) = expect_optional_object(root, "output")? {
        expect_optional_string(output, "output.artifact_path", "artifact_path")?;
    }

    if let Some(dataset) = expect_optional_object(root, "dataset")? {
        expect_optional_string(dataset, "dataset.source_url", "source_url")?;
        validate_u64_field(dataset, "dataset.offset", "offset", 0, 10_000_000)?;
        validate_u64_field(dataset, "dataset.length", "length", 1, 100)?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ConfigError> {
    match parent.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn expect_optional_string<'a>(
    parent: &'a Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<Option<&'a str>, ConfigError> {
    match parent.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.as_str())),
        Some(_) => Err(config_type_error(path, "string")),
    }
}

fn validate_u64_field(
    parent: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ConfigError> {
    let Some(value) = parent.get(key) else {
        return Ok(());
    };
    let number = value
        .as_u64()
        .ok_or_else(|| config_type_error(path, "non-negative integer"))?;
    if number < min || number > max {
        return Err(ConfigError::Invalid(format!(
            "{} must be between {} and {} (got {})",
            path, min, max, number
        )));
    }
    Ok(())
}

fn validate_f64_field(
    parent: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ConfigError> {
    let Some(value) = parent.get(key) else {
        return Ok(());
    };
    let number = value
        .as_f64()
        .ok_or_else(|| config_type_error(path, "number"))?;
    if !(min..=max).contains(&number) {
        return Err(ConfigError::Invalid(format!(
            "{} must be between {} and {} (got {})",
            path, min, max, number
        )));
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ConfigError {
    ConfigError::Invalid(format!("{} must be a {}", path, expected))
}
