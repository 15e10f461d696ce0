//! Drive a [`ProviderService`] without a gRPC server.
//!
//! [`ProviderTester`] calls the service directly and turns error
//! diagnostics into [`TestError`]s, so tests read as a sequence of host
//! operations:
//!
//! ```ignore
//! use sendgrid_provider::testing::{assert_plan_no_changes, ProviderTester};
//! use sendgrid_provider::SendgridProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_template() {
//!     let tester = ProviderTester::new(SendgridProvider::with_env(|_| None));
//!     tester
//!         .configure(json!({"api_key": "SG.test", "base_url": server.uri()}))
//!         .await
//!         .unwrap();
//!
//!     let state = tester
//!         .lifecycle_create("sendgrid_template", json!({"name": "welcome"}))
//!         .await
//!         .unwrap();
//!     let plan = tester
//!         .plan_update("sendgrid_template", state.clone(), json!({"name": "welcome"}))
//!         .await
//!         .unwrap();
//!     assert_plan_no_changes(&plan);
//! }
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::error::ProviderError;
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Wraps a provider for tests.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// The provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration. Error diagnostics become
    /// [`TestError::Diagnostics`].
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider. Error diagnostics become
    /// [`TestError::Diagnostics`].
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration.
    pub async fn validate_resource_config(&self, resource_type: &str, config: Value) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a create. The configuration doubles as the proposed state.
    pub async fn plan_create(&self, resource_type: &str, config: Value) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, config.clone(), config)
            .await
    }

    /// Plan a change to an existing resource.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), config.clone(), config)
            .await
    }

    /// Plan a destroy.
    pub async fn plan_delete(&self, resource_type: &str, prior_state: Value) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Create a resource.
    pub async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Refresh a resource. `Value::Null` means it is gone.
    pub async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update a resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing object.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source configuration.
    pub async fn validate_data_source_config(&self, data_source_type: &str, config: Value) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Look up a data source.
    pub async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Plan, create, then read back.
    ///
    /// Fails with [`ProviderError::NotFound`] if the new object cannot be
    /// read.
    pub async fn lifecycle_create(&self, resource_type: &str, config: Value) -> Result<Value, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.refresh(resource_type, created).await
    }

    /// Plan, update in place, then read back.
    ///
    /// Fails with [`ProviderError::Validation`] if the plan wants a
    /// replacement instead.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        if plan.requires_replace {
            return Err(ProviderError::Validation(format!(
                "{} change requires replacement",
                resource_type
            )));
        }
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        self.refresh(resource_type, updated).await
    }

    /// Plan a destroy, then delete.
    pub async fn lifecycle_delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        self.plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }

    /// Create, update, then delete. Returns the state after the update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated.clone())
            .await?;
        Ok(updated)
    }

    /// Import by id, then plan against `config`.
    ///
    /// Returns the imported state and the plan; a faithful import plans no
    /// changes.
    pub async fn lifecycle_import(
        &self,
        resource_type: &str,
        id: &str,
        config: Value,
    ) -> Result<(Value, PlanResult), ProviderError> {
        let state = self
            .import_resource(resource_type, id)
            .await?
            .into_iter()
            .find(|imported| imported.resource_type == resource_type)
            .map(|imported| imported.state)
            .ok_or_else(|| ProviderError::NotFound(format!("{} {}", resource_type, id)))?;
        let plan = self
            .plan_update(resource_type, state.clone(), config)
            .await?;
        Ok((state, plan))
    }

    async fn refresh(&self, resource_type: &str, state: Value) -> Result<Value, ProviderError> {
        let refreshed = self.read(resource_type, state).await?;
        if refreshed.is_null() {
            return Err(ProviderError::NotFound(format!(
                "{} disappeared after apply",
                resource_type
            )));
        }
        Ok(refreshed)
    }
}

/// A tester operation that failed.
#[derive(Debug, Error)]
pub enum TestError {
    /// The provider answered with error diagnostics.
    #[error("{}", format_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),
    /// The provider returned an error.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl TestError {
    /// The error diagnostics, if this failure carried any.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Diagnostics(diagnostics) => diagnostics,
            Self::Provider(_) => &[],
        }
    }
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = format!("Operation failed with {} diagnostic(s):", diagnostics.len());
    for diag in diagnostics {
        out.push_str(&format!("\n  [{:?}] {}", diag.severity, diag.summary));
        if let Some(detail) = &diag.detail {
            out.push_str(&format!(": {}", detail));
        }
        if let Some(attr) = &diag.attribute {
            out.push_str(&format!(" (at {})", attr));
        }
    }
    out
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    if has_errors(&diagnostics) {
        Err(TestError::Diagnostics(
            diagnostics.into_iter().filter(Diagnostic::is_error).collect(),
        ))
    } else {
        Ok(())
    }
}

fn changed_paths(plan: &PlanResult) -> Vec<&str> {
    plan.changed_paths().collect()
}

/// Assert that a plan creates without replacing.
///
/// # Panics
///
/// On an empty or replacing plan.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(plan.has_changes(), "create plan is empty");
    assert!(!plan.requires_replace, "create plan asks for replacement");
}

/// Assert that applying `plan` does nothing.
///
/// # Panics
///
/// On any change.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        !plan.has_changes(),
        "plan should be empty, changes: {:?}",
        changed_paths(plan)
    );
}

/// Assert that applying `plan` does something.
///
/// # Panics
///
/// On an empty plan.
pub fn assert_plan_has_changes(plan: &PlanResult) {
    assert!(plan.has_changes(), "plan is empty");
}

/// Assert that a plan requires replacement.
///
/// # Panics
///
/// Panics if the plan updates in place.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "plan updates in place, changes: {:?}",
        changed_paths(plan)
    );
}

/// Assert that a plan updates in place.
///
/// # Panics
///
/// On a replacing plan.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.requires_replace,
        "plan replaces, changes: {:?}",
        changed_paths(plan)
    );
}

/// Assert that a plan changes `path`.
///
/// # Panics
///
/// Panics if `path` is unchanged.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "plan leaves '{}' alone, changes: {:?}",
        path,
        changed_paths(plan)
    );
}

/// Assert that a plan leaves `path` alone.
///
/// # Panics
///
/// Panics if `path` changes.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    assert!(
        !plan.changes.iter().any(|c| c.path == path),
        "plan changes '{}'",
        path
    );
}

/// Assert that a refreshed state reports the resource as gone.
///
/// # Panics
///
/// Panics if `state` is not null.
pub fn assert_gone(state: &Value) {
    assert!(state.is_null(), "resource still exists: {}", state);
}

/// Assert that `diagnostics` has no errors. Warnings are fine.
///
/// # Panics
///
/// On any error diagnostic.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| &d.summary)
        .collect();
    assert!(
        errors.is_empty(),
        "unexpected errors: {:?}",
        errors
    );
}

/// Assert that `diagnostics` has an error.
///
/// # Panics
///
/// When every diagnostic is a warning.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(has_errors(diagnostics), "no error diagnostics");
}

/// Assert that some error diagnostic's summary contains `substring`.
///
/// # Panics
///
/// Panics if no error diagnostic matches.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| &d.summary)
        .collect();
    assert!(
        errors.iter().any(|summary| summary.contains(substring)),
        "no error mentions '{}', errors: {:?}",
        substring,
        errors
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::plan;
    use crate::schema::{Attribute, Schema};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Keeps unsubscribe groups in memory.
    #[derive(Default)]
    struct MemoryProvider {
        groups: Mutex<BTreeMap<String, Value>>,
    }

    impl MemoryProvider {
        fn group_schema() -> Schema {
            Schema::v0()
                .with_attribute("id", Attribute::computed_string())
                .with_attribute("name", Attribute::required_string())
                .with_attribute(
                    "is_default",
                    Attribute::optional_bool()
                        .with_default(json!(false))
                        .with_force_new(),
                )
        }

        fn groups(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
            self.groups.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl ProviderService for MemoryProvider {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new()
                .with_provider_config(Schema::v0().with_attribute("api_key", Attribute::required_string()))
                .with_resource("sendgrid_unsubscribe_group", Self::group_schema())
        }

        async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            Ok(crate::validation::validate(&self.schema().provider, &config))
        }

        async fn plan(
            &self,
            _resource_type: &str,
            prior_state: Option<Value>,
            proposed_state: Value,
            _config: Value,
        ) -> Result<PlanResult, ProviderError> {
            plan(&Self::group_schema(), prior_state.as_ref(), &proposed_state)
        }

        async fn create(&self, _resource_type: &str, mut planned_state: Value) -> Result<Value, ProviderError> {
            let mut groups = self.groups();
            let id = (groups.len() + 100).to_string();
            planned_state["id"] = json!(id);
            groups.insert(id, planned_state.clone());
            Ok(planned_state)
        }

        async fn read(&self, _resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
            let id = current_state["id"].as_str().unwrap_or_default();
            Ok(self.groups().get(id).cloned().unwrap_or(Value::Null))
        }

        async fn update(
            &self,
            _resource_type: &str,
            prior_state: Value,
            mut planned_state: Value,
        ) -> Result<Value, ProviderError> {
            planned_state["id"] = prior_state["id"].clone();
            let id = planned_state["id"].as_str().unwrap_or_default().to_string();
            self.groups().insert(id, planned_state.clone());
            Ok(planned_state)
        }

        async fn delete(&self, _resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
            let id = current_state["id"].as_str().unwrap_or_default();
            self.groups()
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| ProviderError::NotFound(id.to_string()))
        }
    }

    #[tokio::test]
    async fn test_configure_reports_diagnostics() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let err = tester.configure(json!({})).await.unwrap_err();
        assert_error_contains(err.diagnostics(), "api_key");

        tester.configure(json!({"api_key": "SG.test"})).await.unwrap();
    }

    #[tokio::test]
    async fn test_resource_types() {
        let tester = ProviderTester::new(MemoryProvider::default());
        assert_eq!(tester.resource_types(), vec!["sendgrid_unsubscribe_group"]);
        assert!(tester.data_source_types().is_empty());
    }

    #[tokio::test]
    async fn test_plan_create() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let plan = tester
            .plan_create("sendgrid_unsubscribe_group", json!({"name": "news"}))
            .await
            .unwrap();

        assert_plan_creates(&plan);
        assert_eq!(plan.planned_state["is_default"], json!(false));
    }

    #[tokio::test]
    async fn test_plan_update_and_replace() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let prior = json!({"id": "100", "name": "news", "is_default": false});

        let plan = tester
            .plan_update("sendgrid_unsubscribe_group", prior.clone(), json!({"name": "digest"}))
            .await
            .unwrap();
        assert_plan_changes_attribute(&plan, "name");
        assert_plan_does_not_change_attribute(&plan, "id");
        assert_plan_updates_in_place(&plan);

        let plan = tester
            .plan_update(
                "sendgrid_unsubscribe_group",
                prior.clone(),
                json!({"name": "news", "is_default": true}),
            )
            .await
            .unwrap();
        assert_plan_has_changes(&plan);
        assert_plan_replaces(&plan);

        let plan = tester
            .plan_update("sendgrid_unsubscribe_group", prior, json!({"name": "news"}))
            .await
            .unwrap();
        assert_plan_no_changes(&plan);
    }

    #[tokio::test]
    async fn test_lifecycle_crud() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let updated = tester
            .lifecycle_crud(
                "sendgrid_unsubscribe_group",
                json!({"name": "news"}),
                json!({"name": "digest"}),
            )
            .await
            .unwrap();

        assert_eq!(updated["name"], "digest");
        assert_eq!(updated["id"], "100");
        let gone = tester
            .read("sendgrid_unsubscribe_group", updated)
            .await
            .unwrap();
        assert_gone(&gone);
    }

    #[tokio::test]
    async fn test_lifecycle_update_refuses_replacement() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let created = tester
            .lifecycle_create("sendgrid_unsubscribe_group", json!({"name": "news"}))
            .await
            .unwrap();

        let err = tester
            .lifecycle_update(
                "sendgrid_unsubscribe_group",
                created,
                json!({"name": "news", "is_default": true}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_import_unsupported_by_default() {
        let tester = ProviderTester::new(MemoryProvider::default());
        let err = tester
            .lifecycle_import("sendgrid_unsubscribe_group", "100", json!({"name": "news"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unimplemented(_)));
    }

    #[test]
    fn test_assert_no_errors() {
        assert_no_errors(&[Diagnostic::warning("Just a warning")]);
    }

    #[test]
    #[should_panic(expected = "unexpected errors")]
    fn test_assert_no_errors_fails() {
        assert_no_errors(&[Diagnostic::error("An error")]);
    }

    #[test]
    fn test_assert_has_errors() {
        assert_has_errors(&[Diagnostic::error("An error")]);
    }

    #[test]
    #[should_panic(expected = "resource still exists")]
    fn test_assert_gone_fails() {
        assert_gone(&json!({"id": "1"}));
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("Missing SendGrid API key").with_attribute("api_key"),
            Diagnostic::error("Invalid max_retry_attempts").with_detail("Must be at least 1."),
        ]);

        let display = err.to_string();
        assert!(display.contains("2 diagnostic(s)"));
        assert!(display.contains("(at api_key)"));
        assert!(display.contains("Must be at least 1."));
    }
}
