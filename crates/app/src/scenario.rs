//! Built-in index configuration scenarios and the runner that exercises them.
//!
//! Every scenario drops and recreates the same class, then reads it back to
//! confirm the service kept the requested index settings.

use crate::deps::{SchemaDeps, duration_ms};
use crate::recreate_class::recreate_class;
use crate::verify_class::{ClassExpectation, ensure_no_mismatches, verify_class};
use index_config_domain::{
    BqConfig, Bm25Config, ClassDefinition, ClassName, DataType, Distance, DynamicConfig,
    FlatConfig, HnswConfig, InvertedIndexConfig, NamedVector, PqConfig, Property, PropertyName,
    SchemaMismatch, VectorIndexType,
};
use index_config_ports::LogFields;
use index_config_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Instant;

/// Module used by the property indexing scenario.
pub const PROPERTY_VECTORIZER: &str = "text2vec-huggingface";

/// A named class definition to create and verify.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Stable scenario name, e.g. `config-hnsw`.
    pub name: &'static str,
    /// One line shown by `scenarios list`.
    pub description: &'static str,
    /// Definition to create.
    pub definition: ClassDefinition,
    /// Require every requested setting to be honored.
    pub strict: bool,
}

/// Build the catalog against `class`.
pub fn scenario_catalog(class: &ClassName) -> Result<Vec<Scenario>> {
    let scenarios = vec![
        Scenario {
            name: "enable-hnsw",
            description: "HNSW index with server defaults",
            definition: ClassDefinition::builder(class.clone())
                .vector_index_type(VectorIndexType::Hnsw)
                .build()?,
            strict: true,
        },
        Scenario {
            name: "config-hnsw",
            description: "HNSW index with tuned graph settings and product quantization",
            definition: ClassDefinition::builder(class.clone())
                .vector_index_type(VectorIndexType::Hnsw)
                .vector_index_config(HnswConfig {
                    distance: Some(Distance::Cosine),
                    ef_construction: Some(256),
                    max_connections: Some(128),
                    ef: Some(-1),
                    dynamic_ef_factor: Some(15),
                    dynamic_ef_min: Some(200),
                    dynamic_ef_max: Some(1000),
                    pq: Some(PqConfig::enabled()),
                    ..HnswConfig::default()
                })
                .build()?,
            strict: true,
        },
        Scenario {
            name: "enable-multi",
            description: "Two named vectors, each with its own HNSW index",
            definition: ClassDefinition::builder(class.clone())
                .named_vector(
                    PropertyName::parse("title")?,
                    NamedVector::new(VectorIndexType::Hnsw),
                )
                .named_vector(
                    PropertyName::parse("body")?,
                    NamedVector::new(VectorIndexType::Hnsw),
                )
                .build()?,
            strict: true,
        },
        Scenario {
            name: "enable-flat",
            description: "Flat index with server defaults",
            definition: ClassDefinition::builder(class.clone())
                .vector_index_type(VectorIndexType::Flat)
                .build()?,
            strict: true,
        },
        Scenario {
            name: "config-flat",
            description: "Flat index with a vector cache and binary quantization",
            definition: ClassDefinition::builder(class.clone())
                .vector_index_type(VectorIndexType::Flat)
                .vector_index_config(FlatConfig {
                    distance: Some(Distance::Cosine),
                    vector_cache_max_objects: Some(100_000),
                    bq: Some(BqConfig::enabled()),
                })
                .build()?,
            strict: true,
        },
        Scenario {
            name: "enable-dynamic",
            description: "Dynamic index with server defaults",
            definition: ClassDefinition::builder(class.clone())
                .vector_index_type(VectorIndexType::Dynamic)
                .build()?,
            strict: true,
        },
        Scenario {
            name: "config-dynamic",
            description: "Dynamic index with an explicit threshold and nested settings",
            definition: ClassDefinition::builder(class.clone())
                .vector_index_type(VectorIndexType::Dynamic)
                .vector_index_config(DynamicConfig {
                    distance: Some(Distance::Cosine),
                    threshold: Some(10_000),
                    hnsw: Some(HnswConfig {
                        distance: Some(Distance::Cosine),
                        max_connections: Some(32),
                        ..HnswConfig::default()
                    }),
                    flat: Some(FlatConfig {
                        distance: Some(Distance::Cosine),
                        ..FlatConfig::default()
                    }),
                })
                .build()?,
            strict: true,
        },
        Scenario {
            name: "prop-index",
            description: "Per-property index flags, module settings and BM25 tuning",
            definition: ClassDefinition::builder(class.clone())
                .vectorizer(PROPERTY_VECTORIZER)
                .property(
                    Property::new(PropertyName::parse("title")?, DataType::Text)
                        .with_index_filterable(true)
                        .with_index_searchable(true)
                        .with_module_config(
                            PROPERTY_VECTORIZER,
                            json!({ "skip": false, "vectorizePropertyName": false }),
                        ),
                )
                .property(
                    Property::new(PropertyName::parse("chunk")?, DataType::Int)
                        .with_index_range_filters(true),
                )
                .inverted_index_config(InvertedIndexConfig {
                    bm25: Some(Bm25Config { b: 0.7, k1: 1.25 }),
                    index_timestamps: Some(true),
                    index_null_state: Some(true),
                    index_property_length: Some(true),
                    ..InvertedIndexConfig::default()
                })
                .build()?,
            strict: true,
        },
    ];
    Ok(scenarios)
}

/// Keep the scenarios named in `only`, in catalog order. An empty filter keeps all.
pub fn select_scenarios(catalog: Vec<Scenario>, only: &[String]) -> Result<Vec<Scenario>> {
    if only.is_empty() {
        return Ok(catalog);
    }
    for name in only {
        if !catalog.iter().any(|scenario| scenario.name == name) {
            let known: Vec<&str> = catalog.iter().map(|scenario| scenario.name).collect();
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                format!("unknown scenario `{name}`"),
            )
            .with_metadata("scenario", name.as_str())
            .with_metadata("known", known.join(",")));
        }
    }
    Ok(catalog
        .into_iter()
        .filter(|scenario| only.iter().any(|name| name == scenario.name))
        .collect())
}

/// Outcome of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// Created and verified.
    Passed,
    /// Creation or verification failed.
    Failed,
}

/// Report for one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// Class that was recreated.
    pub class: String,
    /// Requested index family.
    pub index_type: VectorIndexType,
    /// Pass or fail.
    pub status: ScenarioStatus,
    /// Settings the service did not honor.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<SchemaMismatch>,
    /// Failure, when the scenario failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    /// Wall time of the run.
    pub duration_ms: u64,
}

impl ScenarioReport {
    /// Returns true when the scenario passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }
}

/// Aggregate of a scenario batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    /// One report per scenario that ran, in order.
    pub reports: Vec<ScenarioReport>,
    /// Count of passed scenarios.
    pub passed: usize,
    /// Count of failed scenarios.
    pub failed: usize,
    /// Scenarios not run because the batch stopped early.
    pub skipped: usize,
    /// True when the batch stopped on cancellation.
    pub cancelled: bool,
}

impl ScenarioSummary {
    /// Returns true when every scenario ran and passed.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.failed == 0 && self.skipped == 0 && !self.cancelled
    }
}

/// Recreate the scenario's class, then verify it. Failures and unhonored
/// settings land in the report.
pub async fn run_scenario(
    ctx: &RequestContext,
    deps: &SchemaDeps,
    scenario: &Scenario,
) -> ScenarioReport {
    let started_at = Instant::now();
    let definition = &scenario.definition;
    let mut report = ScenarioReport {
        name: scenario.name.to_owned(),
        class: definition.class.as_str().to_owned(),
        index_type: definition.effective_index_type(),
        status: ScenarioStatus::Failed,
        mismatches: Vec::new(),
        error: None,
        duration_ms: 0,
    };

    // Mismatches are recorded before strict scenarios fail on them.
    let result = match recreate_class(ctx, deps, definition.clone()).await {
        Ok(_) => verify_class(ctx, deps, ClassExpectation::new(definition.clone())).await,
        Err(error) => Err(error),
    };
    let checked = result.and_then(|outcome| {
        report.mismatches = outcome.mismatches;
        if scenario.strict {
            ensure_no_mismatches(&definition.class, &report.mismatches)?;
        }
        Ok(())
    });

    match checked {
        Ok(()) => report.status = ScenarioStatus::Passed,
        Err(error) => report.error = Some(error.with_metadata("scenario", scenario.name)),
    }
    report.duration_ms = duration_ms(started_at);
    report
}

/// Run scenarios in order. Stops at the first failure unless `keep_going`,
/// and always stops once `ctx` is cancelled.
pub async fn run_scenarios(
    ctx: &RequestContext,
    deps: &SchemaDeps,
    scenarios: &[Scenario],
    keep_going: bool,
) -> ScenarioSummary {
    let mut start_fields = LogFields::new();
    start_fields.insert("scenarios".into(), Value::from(scenarios.len()));
    start_fields.insert("keepGoing".into(), Value::Bool(keep_going));
    deps.log_info("app.runScenarios.start", "Scenario run started", start_fields);

    let mut summary = ScenarioSummary::default();
    for (index, scenario) in scenarios.iter().enumerate() {
        if ctx.is_cancelled() {
            summary.cancelled = true;
            summary.skipped = scenarios.len() - index;
            break;
        }

        let report = run_scenario(ctx, deps, scenario).await;
        let cancelled = report.error.as_ref().is_some_and(ErrorEnvelope::is_cancelled);
        let passed = report.passed();
        if passed {
            summary.passed += 1;
        } else {
            summary.failed += 1;
        }
        summary.reports.push(report);

        if cancelled {
            summary.cancelled = true;
        }
        if cancelled || (!passed && !keep_going) {
            summary.skipped = scenarios.len() - index - 1;
            break;
        }
    }

    let mut fields = LogFields::new();
    fields.insert("passed".into(), Value::from(summary.passed));
    fields.insert("failed".into(), Value::from(summary.failed));
    fields.insert("skipped".into(), Value::from(summary.skipped));
    let event = if summary.cancelled {
        "app.runScenarios.aborted"
    } else {
        "app.runScenarios.completed"
    };
    deps.log_info(event, "Scenario run finished", fields);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Result<Vec<Scenario>> {
        scenario_catalog(&ClassName::parse("ConfigCollection")?)
    }

    #[test]
    fn catalog_names_are_unique_and_ordered() -> Result<()> {
        let names: Vec<&str> = catalog()?.iter().map(|scenario| scenario.name).collect();
        assert_eq!(
            names,
            vec![
                "enable-hnsw",
                "config-hnsw",
                "enable-multi",
                "enable-flat",
                "config-flat",
                "enable-dynamic",
                "config-dynamic",
                "prop-index",
            ]
        );
        Ok(())
    }

    #[test]
    fn catalog_definitions_validate() -> Result<()> {
        for scenario in catalog()? {
            scenario.definition.validate()?;
            assert_eq!(scenario.definition.class.as_str(), "ConfigCollection");
        }
        Ok(())
    }

    #[test]
    fn catalog_index_types() -> Result<()> {
        let types: Vec<VectorIndexType> = catalog()?
            .iter()
            .map(|scenario| scenario.definition.effective_index_type())
            .collect();
        assert_eq!(types[1], VectorIndexType::Hnsw);
        assert_eq!(types[4], VectorIndexType::Flat);
        assert_eq!(types[6], VectorIndexType::Dynamic);
        Ok(())
    }

    #[test]
    fn config_hnsw_payload_carries_tuning() -> Result<()> {
        let scenarios = catalog()?;
        let payload = scenarios[1].definition.to_payload()?;
        assert_eq!(payload["vectorIndexConfig"]["efConstruction"], json!(256));
        assert_eq!(payload["vectorIndexConfig"]["maxConnections"], json!(128));
        assert_eq!(payload["vectorIndexConfig"]["dynamicEfMax"], json!(1000));
        assert_eq!(payload["vectorIndexConfig"]["pq"]["enabled"], json!(true));
        Ok(())
    }

    #[test]
    fn select_keeps_catalog_order() -> Result<()> {
        let only = vec!["prop-index".to_owned(), "enable-flat".to_owned()];
        let selected = select_scenarios(catalog()?, &only)?;
        let names: Vec<&str> = selected.iter().map(|scenario| scenario.name).collect();
        assert_eq!(names, vec!["enable-flat", "prop-index"]);
        assert_eq!(select_scenarios(catalog()?, &[])?.len(), 8);
        Ok(())
    }

    #[test]
    fn select_rejects_unknown_names() -> Result<()> {
        let only = vec!["enable-ivf".to_owned()];
        let error = select_scenarios(catalog()?, &only).err();
        assert_eq!(
            error.as_ref().map(|error| error.code.clone()),
            Some(ErrorCode::invalid_input())
        );
        assert_eq!(
            error
                .as_ref()
                .and_then(|error| error.metadata.get("scenario"))
                .map(String::as_str),
            Some("enable-ivf")
        );
        Ok(())
    }

    #[test]
    fn report_serializes_in_camel_case() -> Result<()> {
        let report = ScenarioReport {
            name: "enable-flat".to_owned(),
            class: "ConfigCollection".to_owned(),
            index_type: VectorIndexType::Flat,
            status: ScenarioStatus::Passed,
            mismatches: Vec::new(),
            error: None,
            duration_ms: 12,
        };
        let value = serde_json::to_value(&report)
            .map_err(|error| ErrorEnvelope::expected(ErrorCode::internal(), error.to_string()))?;
        assert_eq!(
            value,
            json!({
                "name": "enable-flat",
                "class": "ConfigCollection",
                "indexType": "flat",
                "status": "passed",
                "durationMs": 12
            })
        );
        Ok(())
    }
}
