//! Check that the service holds a class the way it was requested.

use crate::deps::{SchemaDeps, fields_class, with_duration};
use index_config_domain::{
    ClassDefinition, ClassName, ClassSnapshot, SchemaMismatch, VectorIndexType, match_class,
};
use index_config_ports::schema_codes;
use index_config_shared::{ErrorEnvelope, RequestContext, Result};
use serde_json::Value;
use std::time::Instant;

/// Placeholder for an absent returned value.
const NONE: &str = "<none>";

/// What a verification expects to find.
#[derive(Debug, Clone)]
pub struct ClassExpectation {
    /// The definition that was created.
    pub definition: ClassDefinition,
    /// Fail on any setting the service did not honor, not just the index type.
    pub strict: bool,
}

impl ClassExpectation {
    /// Expectation that checks presence and index type only.
    #[must_use]
    pub const fn new(definition: ClassDefinition) -> Self {
        Self {
            definition,
            strict: false,
        }
    }

    /// Expectation that also requires every requested setting to match.
    #[must_use]
    pub const fn strict(definition: ClassDefinition) -> Self {
        Self {
            definition,
            strict: true,
        }
    }
}

/// Result of a successful verification.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyOutcome {
    /// The class as returned.
    pub snapshot: ClassSnapshot,
    /// Settings the service did not honor. Always empty for strict checks.
    pub mismatches: Vec<SchemaMismatch>,
}

/// Verify that the class exists with the expected index type and settings.
#[tracing::instrument(
    name = "app.verify_class",
    skip_all,
    fields(class = %expectation.definition.class.as_str(), strict = expectation.strict)
)]
pub async fn verify_class(
    ctx: &RequestContext,
    deps: &SchemaDeps,
    expectation: ClassExpectation,
) -> Result<VerifyOutcome> {
    let started_at = Instant::now();
    let class_name = expectation.definition.class.as_str().to_owned();
    let mut start_fields = fields_class(&class_name);
    start_fields.insert("strict".into(), Value::Bool(expectation.strict));
    deps.log_info("app.verifyClass.start", "Verify class started", start_fields);

    let result = verify_inner(ctx, deps, &expectation).await;

    match result {
        Ok(outcome) => {
            let mut fields = with_duration(fields_class(&class_name), started_at);
            fields.insert(
                "mismatches".into(),
                Value::from(outcome.mismatches.len()),
            );
            deps.log_info("app.verifyClass.completed", "Verify class completed", fields);
            Ok(outcome)
        },
        Err(error) => {
            deps.log_failure(
                "app.verifyClass",
                with_duration(fields_class(&class_name), started_at),
                &error,
            );
            Err(error)
        },
    }
}

async fn verify_inner(
    ctx: &RequestContext,
    deps: &SchemaDeps,
    expectation: &ClassExpectation,
) -> Result<VerifyOutcome> {
    let definition = &expectation.definition;
    let class = &definition.class;

    ctx.ensure_not_cancelled("verify_class.get_schema")?;
    let schema = deps.schema.get_schema(ctx).await?;
    if !schema.contains(class) {
        return Err(class_missing(class.as_str()));
    }

    ctx.ensure_not_cancelled("verify_class.get_class")?;
    let Some(snapshot) = deps.schema.get_class(ctx, class.clone()).await? else {
        return Err(class_missing(class.as_str()));
    };
    check_index_types(definition, &snapshot)?;

    let mismatches = match_class(definition, &snapshot)?;
    if expectation.strict {
        ensure_no_mismatches(class, &mismatches)?;
    }

    Ok(VerifyOutcome {
        snapshot,
        mismatches,
    })
}

/// Fail with `schema:mismatch` when any requested setting was not honored.
pub fn ensure_no_mismatches(class: &ClassName, mismatches: &[SchemaMismatch]) -> Result<()> {
    if mismatches.is_empty() {
        return Ok(());
    }
    let paths: Vec<&str> = mismatches.iter().map(|item| item.path.as_str()).collect();
    let details: Vec<String> = mismatches.iter().map(ToString::to_string).collect();
    Err(ErrorEnvelope::expected(
        schema_codes::mismatch(),
        format!("Schema mismatch: {}", details.join("; ")),
    )
    .with_metadata("class", class.as_str())
    .with_metadata("paths", paths.join(",")))
}

/// The returned class must carry the requested name and index type(s).
fn check_index_types(definition: &ClassDefinition, snapshot: &ClassSnapshot) -> Result<()> {
    let returned = snapshot.class_name();
    if !returned.is_some_and(|name| definition.class.matches(name)) {
        return Err(wrong_index_type(
            definition,
            "class",
            definition.class.as_str(),
            returned.unwrap_or(NONE),
        ));
    }

    if definition.has_named_vectors() {
        for (name, vector) in &definition.vector_config {
            let actual = snapshot.named_vector_index_type(name.as_str());
            ensure_index_type(
                definition,
                &format!("vectorConfig.{}", name.as_str()),
                vector.vector_index_type,
                actual,
            )?;
        }
        return Ok(());
    }

    ensure_index_type(
        definition,
        "vectorIndexType",
        definition.effective_index_type(),
        snapshot.vector_index_type(),
    )
}

fn ensure_index_type(
    definition: &ClassDefinition,
    path: &str,
    expected: VectorIndexType,
    actual: Option<VectorIndexType>,
) -> Result<()> {
    if actual == Some(expected) {
        return Ok(());
    }
    Err(wrong_index_type(
        definition,
        path,
        expected.as_str(),
        actual.map_or(NONE, VectorIndexType::as_str),
    ))
}

fn wrong_index_type(
    definition: &ClassDefinition,
    path: &str,
    expected: &str,
    actual: &str,
) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        schema_codes::wrong_index_type(),
        format!("Wrong index type at {path}: expected {expected}, got {actual}"),
    )
    .with_metadata("class", definition.class.as_str())
    .with_metadata("path", path)
    .with_metadata("expected", expected)
    .with_metadata("actual", actual)
}

fn class_missing(class: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(schema_codes::class_missing(), format!("Class missing: {class}"))
        .with_metadata("class", class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition(index_type: VectorIndexType) -> Result<ClassDefinition> {
        let class = ClassName::parse("Docs").map_err(ErrorEnvelope::from)?;
        Ok(ClassDefinition::builder(class)
            .vector_index_type(index_type)
            .build_unchecked())
    }

    #[test]
    fn index_type_must_match() -> Result<()> {
        let expected = definition(VectorIndexType::Flat)?;
        let snapshot = ClassSnapshot::new(json!({ "class": "Docs", "vectorIndexType": "hnsw" }));
        let error = check_index_types(&expected, &snapshot).err();
        let Some(error) = error else {
            return Err(ErrorEnvelope::expected(schema_codes::unknown(), "expected failure"));
        };
        assert_eq!(error.code, schema_codes::wrong_index_type());
        assert_eq!(error.metadata.get("expected").map(String::as_str), Some("flat"));
        assert_eq!(error.metadata.get("actual").map(String::as_str), Some("hnsw"));
        Ok(())
    }

    #[test]
    fn renamed_class_is_a_wrong_index_type() -> Result<()> {
        let expected = definition(VectorIndexType::Hnsw)?;
        let snapshot = ClassSnapshot::new(json!({ "class": "Other", "vectorIndexType": "hnsw" }));
        let error = check_index_types(&expected, &snapshot).err();
        let Some(error) = error else {
            return Err(ErrorEnvelope::expected(schema_codes::unknown(), "expected failure"));
        };
        assert_eq!(error.code, schema_codes::wrong_index_type());
        assert!(error.message.starts_with("Wrong index type"));
        assert_eq!(error.metadata.get("path").map(String::as_str), Some("class"));
        assert_eq!(error.metadata.get("actual").map(String::as_str), Some("Other"));
        Ok(())
    }

    #[test]
    fn lowercase_returned_name_still_matches() -> Result<()> {
        let expected = definition(VectorIndexType::Hnsw)?;
        let snapshot = ClassSnapshot::new(json!({ "class": "docs", "vectorIndexType": "hnsw" }));
        check_index_types(&expected, &snapshot)
    }

    #[test]
    fn mismatch_error_lists_paths() -> Result<()> {
        let class = ClassName::parse("Docs").map_err(ErrorEnvelope::from)?;
        assert!(ensure_no_mismatches(&class, &[]).is_ok());
        let mismatches = index_config_domain::match_payload(
            &json!({ "vectorIndexConfig": { "efConstruction": 256, "maxConnections": 64 } }),
            &json!({ "vectorIndexConfig": { "efConstruction": 128, "maxConnections": 32 } }),
        );
        let error = ensure_no_mismatches(&class, &mismatches).err();
        assert_eq!(
            error
                .as_ref()
                .and_then(|error| error.metadata.get("paths"))
                .map(String::as_str),
            Some("vectorIndexConfig.efConstruction,vectorIndexConfig.maxConnections")
        );
        Ok(())
    }

    #[test]
    fn missing_type_is_reported_as_none() -> Result<()> {
        let expected = definition(VectorIndexType::Dynamic)?;
        let snapshot = ClassSnapshot::new(json!({ "class": "Docs" }));
        let error = check_index_types(&expected, &snapshot).err();
        assert_eq!(
            error
                .as_ref()
                .and_then(|error| error.metadata.get("actual"))
                .map(String::as_str),
            Some("<none>")
        );
        Ok(())
    }
}
