//! Form service
//!
//! Drives the staged form protocol over a `FormEngine` and keeps open forms
//! in the session store between requests.

use super::binding::{BoundModel, FormParams, PARAM_FID};
use super::descriptor::find_model;
use super::engine::{FormEngine, FormRequest, SubmitOutcome};
use super::store::FormStore;
use super::FormError;
use crate::models::{Choice, FieldError, FormAction, FormConfig, FormStage};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Outcome of a submit together with the final form configuration
#[derive(Debug, Clone)]
pub struct SubmitResult {
    pub outcome: SubmitOutcome,
    pub config: FormConfig,
}

/// Form service for the begin, validate and submit stages
pub struct FormService {
    engine: Arc<dyn FormEngine>,
    store: Arc<FormStore>,
}

impl FormService {
    pub fn new(engine: Arc<dyn FormEngine>, store: Arc<FormStore>) -> Self {
        Self { engine, store }
    }

    pub fn store(&self) -> &FormStore {
        &self.store
    }

    /// Return the live session named by `fid`, or resolve and store a new form
    pub async fn begin(&self, request: &FormRequest) -> Result<FormConfig, FormError> {
        if let Some(fid) = request.fid.as_deref() {
            if let Some(config) = self.store.get(fid).await? {
                Self::ensure_route(request, &config)?;
                tracing::debug!("Resuming form {}", fid);
                return Ok(config);
            }
        }

        let config = self.engine.resolve_config(request).await?;
        self.store.put(&config).await?;
        tracing::debug!("Began {} form {} for {}", config.action, config.fid, config.modelname);
        Ok(config)
    }

    /// Session for a request that carries on a form. A request without a
    /// `fid` starts a new form; a `fid` without a live session is an error.
    async fn session(&self, request: &FormRequest) -> Result<FormConfig, FormError> {
        match request.fid.as_deref() {
            Some(fid) => {
                let config = self
                    .store
                    .get(fid)
                    .await?
                    .ok_or_else(|| FormError::FormNotFound(fid.to_string()))?;
                Self::ensure_route(request, &config)?;
                Ok(config)
            }
            None => self.begin(request).await,
        }
    }

    /// A session only serves the action, model and entity it was opened for
    fn ensure_route(request: &FormRequest, config: &FormConfig) -> Result<(), FormError> {
        let same_action = FormAction::from_str(&request.action) == Some(config.action);
        let same_model = find_model(&request.modelname).is_some_and(|m| m.name == config.modelname);
        let same_entity = request.mid.map_or(true, |mid| config.mid == Some(mid));
        if same_action && same_model && same_entity {
            return Ok(());
        }

        Err(FormError::SessionMismatch {
            fid: config.fid.clone(),
            form: format!("{}/{}", config.action, config.modelname),
            route: format!("{}/{}", request.action, request.modelname),
        })
    }

    /// Put a taken session back and pass on the error that stopped the submit
    async fn restore(&self, config: &FormConfig, e: FormError) -> FormError {
        match self.store.put(config).await {
            Ok(()) => e,
            Err(put_err) => put_err.into(),
        }
    }

    async fn check(&self, config: &FormConfig, bound: &BoundModel) -> Result<Vec<FieldError>, FormError> {
        if config.action.is_read_only() {
            return Ok(Vec::new());
        }
        self.engine.validate(bound, None).await
    }

    fn apply_values(config: &mut FormConfig, bound: &BoundModel) {
        for member in &mut config.form.members {
            member.value = bound.value(&member.name).clone();
        }
    }

    /// Keep the bound values in the session and report the errors
    async fn reject(&self, mut config: FormConfig, errors: &[FieldError]) -> FormError {
        config.set_errors(errors);
        if let Err(e) = self.store.put(&config).await {
            return e.into();
        }
        tracing::debug!("Form {} has {} error(s)", config.fid, errors.len());
        FormError::Validation(Box::new(config))
    }

    /// Bind and validate the form; on success the session moves to `validate`
    pub async fn validate(&self, request: &FormRequest, params: &FormParams) -> Result<FormConfig, FormError> {
        let mut config = self.session(request).await?;
        let bound = self.engine.bind_params(&config, params).await?;
        let errors = self.check(&config, &bound).await?;

        Self::apply_values(&mut config, &bound);
        if !errors.is_empty() {
            config.stage = FormStage::Begin;
            return Err(self.reject(config, &errors).await);
        }

        config.set_errors(&[]);
        config.stage = FormStage::Validate;
        self.store.put(&config).await?;
        tracing::debug!("Validated form {}", config.fid);
        Ok(config)
    }

    /// Perform the action of a validated form and close its session
    pub async fn submit(&self, request: &FormRequest, params: &FormParams) -> Result<SubmitResult, FormError> {
        let fid = request.fid.as_deref().ok_or_else(|| FormError::InvalidParameter {
            name: PARAM_FID.to_string(),
            value: String::new(),
        })?;
        // Taking the session makes concurrent submits of one form perform the action once
        let mut config = self
            .store
            .take(fid)
            .await?
            .ok_or_else(|| FormError::FormNotFound(fid.to_string()))?;
        if let Err(e) = Self::ensure_route(request, &config) {
            return Err(self.restore(&config, e).await);
        }
        if config.stage != FormStage::Validate {
            let e = FormError::StageOutOfOrder {
                expected: FormStage::Validate,
                actual: config.stage,
            };
            return Err(self.restore(&config, e).await);
        }

        let bound = match self.engine.bind_params(&config, params).await {
            Ok(bound) => bound,
            Err(e) => return Err(self.restore(&config, e).await),
        };
        let errors = match self.check(&config, &bound).await {
            Ok(errors) => errors,
            Err(e) => return Err(self.restore(&config, e).await),
        };
        Self::apply_values(&mut config, &bound);
        if !errors.is_empty() {
            config.stage = FormStage::Begin;
            return Err(self.reject(config, &errors).await);
        }

        let outcome = match self.engine.submit(&config, &bound).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.restore(&config, e).await),
        };

        if let SubmitOutcome::Created { id, entity } = &outcome {
            if let Some(parentfid) = config.parentfid.as_deref() {
                self.link_parent(parentfid, &config.modelname, *id, entity).await?;
            }
        }

        config.stage = FormStage::Submit;
        tracing::debug!("Submitted form {}", config.fid);
        Ok(SubmitResult { outcome, config })
    }

    /// Validate then submit in one request
    pub async fn express(&self, request: &FormRequest, params: &FormParams) -> Result<SubmitResult, FormError> {
        let config = self.validate(request, params).await?;
        let mut request = request.clone();
        request.fid = Some(config.fid);
        self.submit(&request, params).await
    }

    /// Bind and validate a single property
    pub async fn validate_single(
        &self,
        request: &FormRequest,
        params: &FormParams,
        property: &str,
    ) -> Result<FormConfig, FormError> {
        let mut config = self.session(request).await?;
        let bound = self.engine.bind_params(&config, params).await?;
        let errors = self.engine.validate(&bound, Some(property)).await?;

        if let Some(member) = config.form.member_mut(property) {
            member.value = bound.value(property).clone();
        }
        if !errors.is_empty() {
            return Err(self.reject(config, &errors).await);
        }

        config.set_errors(&[]);
        self.store.put(&config).await?;
        Ok(config)
    }

    /// Fresh choices for the members depending on `property`
    pub async fn dependents(
        &self,
        request: &FormRequest,
        params: &FormParams,
        property: &str,
    ) -> Result<BTreeMap<String, Vec<Choice>>, FormError> {
        let config = self.session(request).await?;
        self.engine.compute_dependents(&config, property, params).await
    }

    /// Point the parent form's reference to `modelname` at the new entity
    async fn link_parent(&self, parentfid: &str, modelname: &str, id: i64, entity: &Value) -> Result<(), FormError> {
        let Some(mut parent) = self.store.get(parentfid).await? else {
            tracing::debug!("Parent form {} is gone, not linking", parentfid);
            return Ok(());
        };

        let href_suffix = format!("/create/{}", modelname);
        let Some(member) = parent.form.members.iter_mut().find(|m| {
            m.name.eq_ignore_ascii_case(modelname)
                || m.referenced_form_href
                    .as_deref()
                    .is_some_and(|href| href.ends_with(&href_suffix))
        }) else {
            return Ok(());
        };

        let value = id.to_string();
        let text = find_model(modelname)
            .and_then(|m| entity.get(m.title_field()))
            .and_then(Value::as_str)
            .unwrap_or(&value)
            .to_string();
        member.value = Value::String(value.clone());
        if !member.choices.iter().any(|c| c.value == value) {
            member.choices.push(Choice::new(text, value));
        }

        self.store.put(&parent).await?;
        tracing::debug!("Linked {} {} into form {}", modelname, id, parentfid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_prepared_test_pool;
    use crate::db::repositories::RepositoryFactory;
    use crate::models::{Blog, BlogSubtype, BlogType, ERRORS_HEADER};
    use crate::services::form::EntityFormEngine;
    use std::time::Duration;

    async fn service() -> (FormService, Arc<RepositoryFactory>) {
        let factory = Arc::new(RepositoryFactory::new(create_prepared_test_pool().await));
        let repo = factory.for_entity::<BlogSubtype>();
        for t in BlogType::ALL {
            repo.create(&BlogSubtype::new(format!("{} sub type 0", t), t))
                .await
                .unwrap();
        }
        let engine = EntityFormEngine::boxed(factory.clone(), 1000);
        let store = Arc::new(FormStore::new(Duration::from_secs(60), 100));
        (FormService::new(engine, store), factory)
    }

    fn params(pairs: &[(&str, &str)]) -> FormParams {
        pairs.iter().copied().collect()
    }

    fn with_fid(request: &FormRequest, fid: &str) -> FormRequest {
        let mut request = request.clone();
        request.fid = Some(fid.to_string());
        request
    }

    #[tokio::test]
    async fn test_begin_reuses_live_session() {
        let (service, _) = service().await;
        let request = FormRequest::new("create", "blog");

        let first = service.begin(&request).await.unwrap();
        let again = service.begin(&with_fid(&request, &first.fid)).await.unwrap();
        assert_eq!(again.fid, first.fid);

        let fresh = service.begin(&with_fid(&request, "formdeadbeef000")).await.unwrap();
        assert_ne!(fresh.fid, "formdeadbeef000");
    }

    #[tokio::test]
    async fn test_validate_reports_errors() {
        let (service, _) = service().await;
        let request = FormRequest::new("create", "blog");
        let config = service.begin(&request).await.unwrap();

        let result = service
            .validate(&with_fid(&request, &config.fid), &params(&[("handle", "")]))
            .await;

        let Err(FormError::Validation(rejected)) = result else {
            panic!("expected validation errors");
        };
        assert_eq!(rejected.errors[0], ERRORS_HEADER);
        assert!(rejected.field_errors.contains_key("handle"));
        assert!(rejected.field_errors.contains_key("type"));
        assert_eq!(rejected.stage, FormStage::Begin);

        // The session keeps the submitted values
        let stored = service.store().get(&config.fid).await.unwrap().unwrap();
        assert!(stored.has_errors());
    }

    #[tokio::test]
    async fn test_submit_requires_validate_stage() {
        let (service, _) = service().await;
        let request = FormRequest::new("create", "blog");
        let config = service.begin(&request).await.unwrap();

        let result = service
            .submit(&with_fid(&request, &config.fid), &params(&[("handle", "h"), ("type", "0")]))
            .await;
        assert!(matches!(result, Err(FormError::StageOutOfOrder { .. })));

        let missing = service.submit(&with_fid(&request, "formnope"), &FormParams::new()).await;
        assert!(matches!(missing, Err(FormError::FormNotFound(_))));
    }

    #[tokio::test]
    async fn test_validate_then_submit_creates_blog() {
        let (service, factory) = service().await;
        let request = FormRequest::new("create", "blog");
        let config = service.begin(&request).await.unwrap();
        let request = with_fid(&request, &config.fid);
        let values = params(&[("handle", "my-blog"), ("type", "1"), ("description", "about")]);

        let validated = service.validate(&request, &values).await.unwrap();
        assert_eq!(validated.stage, FormStage::Validate);
        assert_eq!(validated.form.member("handle").unwrap().value, "my-blog");

        let result = service.submit(&request, &values).await.unwrap();
        let SubmitOutcome::Created { id, .. } = result.outcome else {
            panic!("expected a created outcome");
        };
        assert_eq!(result.config.stage, FormStage::Submit);

        let blog = factory.for_entity::<Blog>().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(blog.handle, "my-blog");
        assert_eq!(blog.blog_type, BlogType::Business);
        assert!(!blog.enabled);

        assert!(service.store().get(&config.fid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_express_links_parent_form() {
        let (service, _) = service().await;
        let parent = service.begin(&FormRequest::new("create", "blog")).await.unwrap();

        let mut child = FormRequest::new("create", "blogsubtype");
        child.parentfid = Some(parent.fid.clone());
        let result = service
            .express(&child, &params(&[("name", "fresh"), ("type", "2")]))
            .await
            .unwrap();
        let SubmitOutcome::Created { id, .. } = result.outcome else {
            panic!("expected a created outcome");
        };

        let parent = service.store().get(&parent.fid).await.unwrap().unwrap();
        let subtype = parent.form.member("subtype").unwrap();
        assert_eq!(subtype.value, id.to_string().as_str());
        assert!(subtype.choices.iter().any(|c| c.text == "fresh"));
    }

    #[tokio::test]
    async fn test_validate_single_and_dependents() {
        let (service, _) = service().await;
        let request = FormRequest::new("create", "blog");
        let config = service.begin(&request).await.unwrap();
        let request = with_fid(&request, &config.fid);

        let ok = service
            .validate_single(&request, &params(&[("handle", "fine")]), "handle")
            .await
            .unwrap();
        assert!(!ok.has_errors());

        let too_long = "x".repeat(65);
        let bad = service
            .validate_single(&request, &params(&[("handle", too_long.as_str())]), "handle")
            .await;
        assert!(matches!(bad, Err(FormError::Validation(_))));

        let dependents = service
            .dependents(&request, &params(&[("type", "3")]), "type")
            .await
            .unwrap();
        let names: Vec<_> = dependents["subtype"].iter().map(|c| c.text.as_str()).collect();
        assert_eq!(names, vec!["", "ENTERTAINMENT sub type 0"]);
    }

    #[tokio::test]
    async fn test_delete_skips_binding() {
        let (service, factory) = service().await;
        let created = service
            .express(&FormRequest::new("create", "blog"), &params(&[("handle", "gone"), ("type", "0")]))
            .await
            .unwrap();
        let SubmitOutcome::Created { id, .. } = created.outcome else {
            panic!("expected a created outcome");
        };

        let mut request = FormRequest::new("delete", "blog");
        request.mid = Some(id);
        let result = service
            .express(&request, &params(&[("handle", "")]))
            .await
            .unwrap();

        assert_eq!(result.outcome, SubmitOutcome::Deleted(id));
        assert!(factory.for_entity::<Blog>().get_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submits_perform_once() {
        let (service, factory) = service().await;
        let request = FormRequest::new("create", "blog");
        let config = service.begin(&request).await.unwrap();
        let request = with_fid(&request, &config.fid);
        let values = params(&[("handle", "only-once"), ("type", "0")]);
        service.validate(&request, &values).await.unwrap();

        let (a, b) = tokio::join!(service.submit(&request, &values), service.submit(&request, &values));

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let failed = if a.is_err() { a } else { b };
        assert!(matches!(failed, Err(FormError::FormNotFound(_))));
        assert_eq!(factory.for_entity::<Blog>().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_session_serves_only_its_route() {
        let (service, factory) = service().await;
        let create_blog = FormRequest::new("create", "blog");
        let config = service.begin(&create_blog).await.unwrap();
        let values = params(&[("handle", "routed"), ("type", "0")]);

        let elsewhere = with_fid(&FormRequest::new("delete", "post"), &config.fid);
        assert!(matches!(
            service.validate(&elsewhere, &values).await,
            Err(FormError::SessionMismatch { .. })
        ));
        assert!(matches!(
            service.begin(&with_fid(&FormRequest::new("create", "post"), &config.fid)).await,
            Err(FormError::SessionMismatch { .. })
        ));

        let create_blog = with_fid(&create_blog, &config.fid);
        service.validate(&create_blog, &values).await.unwrap();
        assert!(matches!(
            service.submit(&elsewhere, &values).await,
            Err(FormError::SessionMismatch { .. })
        ));
        assert_eq!(factory.for_entity::<Blog>().count().await.unwrap(), 0);

        // The rejected submit leaves the session in place
        let stored = service.store().get(&config.fid).await.unwrap().unwrap();
        assert_eq!(stored.stage, FormStage::Validate);
        let result = service.submit(&create_blog, &values).await.unwrap();
        assert!(matches!(result.outcome, SubmitOutcome::Created { .. }));
    }

    #[tokio::test]
    async fn test_stale_fid_is_not_found() {
        let (service, _) = service().await;
        let request = with_fid(&FormRequest::new("create", "blog"), "form00000000000");
        let values = params(&[("handle", "h"), ("type", "0")]);

        assert!(matches!(
            service.validate(&request, &values).await,
            Err(FormError::FormNotFound(_))
        ));
        assert!(matches!(
            service.validate_single(&request, &values, "handle").await,
            Err(FormError::FormNotFound(_))
        ));
        assert!(matches!(
            service.dependents(&request, &values, "type").await,
            Err(FormError::FormNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_session() {
        let (service, factory) = service().await;
        let created = service
            .express(&FormRequest::new("create", "blog"), &params(&[("handle", "short-lived"), ("type", "0")]))
            .await
            .unwrap();
        let SubmitOutcome::Created { id, .. } = created.outcome else {
            panic!("expected a created outcome");
        };

        let mut update = FormRequest::new("update", "blog");
        update.mid = Some(id);
        let config = service.begin(&update).await.unwrap();
        let update = with_fid(&update, &config.fid);
        let values = params(&[("handle", "renamed")]);
        service.validate(&update, &values).await.unwrap();

        factory.for_entity::<Blog>().delete(id).await.unwrap();
        assert!(matches!(
            service.submit(&update, &values).await,
            Err(FormError::EntityNotFound { .. })
        ));
        assert!(service.store().get(&config.fid).await.unwrap().is_some());
    }
}
