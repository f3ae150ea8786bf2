//! Form engine capability
//!
//! `FormEngine` is what the form service needs from a model backend:
//! resolving a form, binding parameters, validating, computing dependent
//! choices and performing the submitted action. `EntityFormEngine` serves
//! the registered models from the repository factory.

use super::binding::{
    value_as_i64, BoundModel, FormParams, PARAM_FID, PARAM_MID, PARAM_MODEL_FIELDS,
    PARAM_PARENT_FID, PARAM_TARGET_ON_COMPLETION,
};
use super::descriptor::{find_model, FieldDescriptor, FieldKind, ModelDescriptor, ModelKind};
use super::entity;
use super::store::generate_fid;
use super::validation::{check_constraints, not_found_message};
use super::FormError;
use crate::db::repositories::RepositoryFactory;
use crate::models::{
    BlogType, Choice, FieldError, Form, FormAction, FormConfig, FormMember, FormStage, API_BASEPATH,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Addressing and protocol parameters of a form request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormRequest {
    pub action: String,
    pub modelname: String,
    pub mid: Option<i64>,
    pub fid: Option<String>,
    pub parentfid: Option<String>,
    pub target_on_completion: Option<String>,
    pub modelfields: Option<String>,
}

impl FormRequest {
    pub fn new(action: impl Into<String>, modelname: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            modelname: modelname.into(),
            ..Self::default()
        }
    }

    /// Build a request from path segments and parameters. A `mid` path
    /// segment takes precedence over a `mid` parameter.
    pub fn from_params(
        action: &str,
        modelname: &str,
        path_mid: Option<&str>,
        params: &FormParams,
    ) -> Result<Self, FormError> {
        let mid = match path_mid.or_else(|| params.non_empty(PARAM_MID)) {
            Some(raw) => Some(raw.trim().parse::<i64>().map_err(|_| FormError::InvalidParameter {
                name: PARAM_MID.to_string(),
                value: raw.to_string(),
            })?),
            None => None,
        };
        let owned = |name: &str| params.non_empty(name).map(String::from);

        Ok(Self {
            action: action.to_string(),
            modelname: modelname.to_string(),
            mid,
            fid: owned(PARAM_FID),
            parentfid: owned(PARAM_PARENT_FID),
            target_on_completion: owned(PARAM_TARGET_ON_COMPLETION),
            modelfields: owned(PARAM_MODEL_FIELDS),
        })
    }
}

/// Result of performing a form action
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created { id: i64, entity: Value },
    Read(Value),
    Updated(Value),
    Deleted(i64),
}

/// Capabilities the form service needs from a model backend
#[async_trait]
pub trait FormEngine: Send + Sync {
    /// Build a new form for the request's action and model
    async fn resolve_config(&self, request: &FormRequest) -> Result<FormConfig, FormError>;

    /// Bind parameters onto the form's current values
    async fn bind_params(&self, config: &FormConfig, params: &FormParams) -> Result<BoundModel, FormError>;

    /// Field errors of the bound values, restricted to `property` when given
    async fn validate(&self, bound: &BoundModel, property: Option<&str>) -> Result<Vec<FieldError>, FormError>;

    /// Fresh choices for the members that depend on `property`
    async fn compute_dependents(
        &self,
        config: &FormConfig,
        property: &str,
        params: &FormParams,
    ) -> Result<BTreeMap<String, Vec<Choice>>, FormError>;

    /// Perform the form's action with validated values
    async fn submit(&self, config: &FormConfig, bound: &BoundModel) -> Result<SubmitOutcome, FormError>;
}

/// Form engine over the registered entity models
pub struct EntityFormEngine {
    factory: Arc<RepositoryFactory>,
    max_choices: usize,
}

impl EntityFormEngine {
    pub fn new(factory: Arc<RepositoryFactory>, max_choices: usize) -> Self {
        Self {
            factory,
            max_choices,
        }
    }

    pub fn boxed(factory: Arc<RepositoryFactory>, max_choices: usize) -> Arc<dyn FormEngine> {
        Arc::new(Self::new(factory, max_choices))
    }

    fn model_of(config: &FormConfig) -> Result<&'static ModelDescriptor, FormError> {
        find_model(&config.modelname).ok_or_else(|| FormError::UnknownModel(config.modelname.clone()))
    }

    /// Enum value that restricts `field`'s choices, if some enum field lists it as a dependent
    fn controlling_type(model: &ModelDescriptor, field: &FieldDescriptor, values: &Map<String, Value>) -> Option<BlogType> {
        model
            .fields
            .iter()
            .filter(|f| f.kind == FieldKind::Enum && f.dependents.contains(&field.name))
            .find_map(|f| values.get(f.name).and_then(value_as_i64))
            .and_then(BlogType::from_ordinal)
    }

    async fn choices_for(
        &self,
        model: &ModelDescriptor,
        field: &FieldDescriptor,
        values: &Map<String, Value>,
    ) -> Result<Vec<Choice>, FormError> {
        match field.kind {
            FieldKind::Enum => Ok(entity::enum_choices()),
            FieldKind::Reference(target) => {
                let target = entity::reference_target(target)?;
                let blog_type = Self::controlling_type(model, field, values);
                let mut choices =
                    entity::reference_choices(&self.factory, target, blog_type, self.max_choices).await?;
                if !field.required {
                    choices.insert(0, Choice::new("", ""));
                }
                Ok(choices)
            }
            _ => Ok(Vec::new()),
        }
    }

    fn build_member(fid: &str, field: &FieldDescriptor, value: Value, choices: Vec<Choice>) -> FormMember {
        let max_length = field.max_length.map_or(-1, |m| m as i64);
        let size = match field.kind {
            FieldKind::Text | FieldKind::TextArea => field.max_length.map_or(40, |m| m.min(60)) as u32,
            _ => 0,
        };
        let referenced_form_href = match field.kind {
            FieldKind::Reference(target) => Some(format!("{}/create/{}", API_BASEPATH, target)),
            _ => None,
        };

        FormMember {
            id: format!("{}-{}", fid, field.name),
            name: field.name.to_string(),
            label: field.label.to_string(),
            display_name: field.label.to_string(),
            advice: field.advice.to_string(),
            value,
            choices,
            max_length,
            size,
            number_of_lines: if field.kind == FieldKind::TextArea { 5 } else { 1 },
            member_type: field.kind.widget().to_string(),
            data_type: field.data_type.to_string(),
            referenced_form_href,
            optional: !field.required,
            required: field.required,
            multi_choice: false,
            multiple: false,
            form_reference: matches!(field.kind, FieldKind::Reference(_)),
        }
    }

    /// Member names in requested order; unknown names are rejected
    fn member_names(model: &ModelDescriptor, modelfields: Option<&str>) -> Result<Vec<String>, FormError> {
        let requested: Vec<&str> = modelfields
            .map(|list| list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        if requested.is_empty() {
            return Ok(model.field_names());
        }

        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for name in requested {
            if model.field(name).is_none() {
                return Err(FormError::UnknownProperty {
                    model: model.name.to_string(),
                    property: name.to_string(),
                });
            }
            if seen.insert(name) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    async fn stored_values(&self, model: &ModelDescriptor, id: i64) -> Result<Map<String, Value>, FormError> {
        entity::load_values(&self.factory, model, id)
            .await?
            .ok_or_else(|| FormError::EntityNotFound {
                model: model.name.to_string(),
                id,
            })
    }

    fn required_id(config: &FormConfig) -> Result<i64, FormError> {
        config
            .mid
            .ok_or_else(|| FormError::MissingId(config.action.to_string()))
    }
}

#[async_trait]
impl FormEngine for EntityFormEngine {
    async fn resolve_config(&self, request: &FormRequest) -> Result<FormConfig, FormError> {
        let model = find_model(&request.modelname)
            .ok_or_else(|| FormError::UnknownModel(request.modelname.clone()))?;
        let action = FormAction::from_str(&request.action)
            .ok_or_else(|| FormError::UnknownAction(request.action.clone()))?;
        let member_names = Self::member_names(model, request.modelfields.as_deref())?;

        let mid = if action.requires_id() {
            Some(request.mid.ok_or_else(|| FormError::MissingId(action.to_string()))?)
        } else {
            None
        };
        let values = match mid {
            Some(id) => self.stored_values(model, id).await?,
            None => entity::default_values(model),
        };

        let fid = generate_fid();
        let mut members = Vec::with_capacity(member_names.len());
        for name in &member_names {
            let Some(field) = model.field(name) else {
                continue;
            };
            let value = values.get(field.name).cloned().unwrap_or(Value::Null);
            let choices = self.choices_for(model, field, &values).await?;
            members.push(Self::build_member(&fid, field, value, choices));
        }

        tracing::debug!("Resolved {} form {} for {}", action, fid, model.name);

        Ok(FormConfig {
            action,
            modelname: model.name.to_string(),
            fid: fid.clone(),
            mid,
            parentfid: request.parentfid.clone(),
            target_on_completion: request.target_on_completion.clone(),
            modelfields: request.modelfields.clone(),
            stage: FormStage::Begin,
            form: Form {
                id: fid,
                name: model.name.to_string(),
                display_name: model.display_name.to_string(),
                members,
                member_names,
                data_source: format!("{}/read/{}", API_BASEPATH, model.name),
            },
            errors: Vec::new(),
            infos: Vec::new(),
            field_errors: BTreeMap::new(),
        })
    }

    async fn bind_params(&self, config: &FormConfig, params: &FormParams) -> Result<BoundModel, FormError> {
        let model = Self::model_of(config)?;

        let mut values = match (config.action.requires_id(), config.mid) {
            (true, Some(id)) => self.stored_values(model, id).await?,
            (true, None) => return Err(FormError::MissingId(config.action.to_string())),
            (false, _) => entity::default_values(model),
        };
        for member in &config.form.members {
            values.insert(member.name.clone(), member.value.clone());
        }

        let mut bound = BoundModel::new(model, values);
        if config.action.requires_id() {
            bound.id = config.mid;
        }
        if !config.action.is_read_only() {
            bound.bind(params, config.form.member_names.iter().map(String::as_str));
        }
        Ok(bound)
    }

    async fn validate(&self, bound: &BoundModel, property: Option<&str>) -> Result<Vec<FieldError>, FormError> {
        let model = bound.model;
        if let Some(p) = property {
            if model.field(p).is_none() {
                return Err(FormError::UnknownProperty {
                    model: model.name.to_string(),
                    property: p.to_string(),
                });
            }
        }
        let selected = |name: &str| property.map_or(true, |p| p == name);

        let mut errors: Vec<FieldError> = bound
            .errors
            .iter()
            .filter(|e| selected(&e.field_name))
            .cloned()
            .collect();
        let unconverted: HashSet<String> = errors.iter().map(|e| e.field_name.clone()).collect();

        errors.extend(
            check_constraints(model, &bound.values, property)
                .into_iter()
                .filter(|e| !unconverted.contains(&e.field_name)),
        );

        for field in model.fields.iter().filter(|f| selected(f.name) && !unconverted.contains(f.name)) {
            let FieldKind::Reference(target) = field.kind else {
                continue;
            };
            let Some(id) = entity::reference_id(&bound.values, field.name) else {
                continue;
            };
            let target_model = entity::reference_target(target)?;
            if !entity::exists(&self.factory, target_model, id).await? {
                errors.push(FieldError::new(field.name, not_found_message(target, id)));
                continue;
            }

            // A subtype must belong to the selected type
            if target_model.name == "blogsubtype" {
                if let Some(blog_type) = Self::controlling_type(model, field, &bound.values) {
                    let actual = entity::subtype_type(&self.factory, id).await?;
                    if actual.is_some_and(|t| t != blog_type) {
                        errors.push(FieldError::new(
                            field.name,
                            format!("must belong to type {}", blog_type),
                        ));
                    }
                }
            }
        }

        // (type, name) identifies a subtype
        if matches!(model.kind, ModelKind::BlogSubtype)
            && selected("name")
            && !unconverted.contains("name")
            && !unconverted.contains("type")
        {
            if let Some(message) = entity::duplicate_subtype(&self.factory, &bound.values, bound.id).await? {
                errors.push(FieldError::new("name", message));
            }
        }

        tracing::debug!(
            "Validated {} ({}): {} error(s)",
            model.name,
            property.unwrap_or("all fields"),
            errors.len()
        );
        Ok(errors)
    }

    async fn compute_dependents(
        &self,
        config: &FormConfig,
        property: &str,
        params: &FormParams,
    ) -> Result<BTreeMap<String, Vec<Choice>>, FormError> {
        let model = Self::model_of(config)?;
        let field = model.field(property).ok_or_else(|| FormError::UnknownProperty {
            model: model.name.to_string(),
            property: property.to_string(),
        })?;

        let bound = self.bind_params(config, params).await?;
        let mut dependents = BTreeMap::new();
        for name in field.dependents {
            if !config.form.member_names.iter().any(|m| m == name) {
                continue;
            }
            if let Some(dependent) = model.field(name) {
                let choices = self.choices_for(model, dependent, &bound.values).await?;
                dependents.insert(name.to_string(), choices);
            }
        }
        Ok(dependents)
    }

    async fn submit(&self, config: &FormConfig, bound: &BoundModel) -> Result<SubmitOutcome, FormError> {
        let model = Self::model_of(config)?;

        let outcome = match config.action {
            FormAction::Create => {
                let (id, entity) = entity::create(&self.factory, model, &bound.values).await?;
                SubmitOutcome::Created { id, entity }
            }
            FormAction::Read => {
                let id = Self::required_id(config)?;
                let entity = entity::load_json(&self.factory, model, id)
                    .await?
                    .ok_or_else(|| FormError::EntityNotFound {
                        model: model.name.to_string(),
                        id,
                    })?;
                SubmitOutcome::Read(entity)
            }
            FormAction::Update => {
                let id = Self::required_id(config)?;
                SubmitOutcome::Updated(entity::update(&self.factory, model, id, &bound.values).await?)
            }
            FormAction::Delete => {
                let id = Self::required_id(config)?;
                if !entity::delete(&self.factory, model, id).await? {
                    return Err(FormError::EntityNotFound {
                        model: model.name.to_string(),
                        id,
                    });
                }
                SubmitOutcome::Deleted(id)
            }
        };

        tracing::debug!("Submitted {} form {} for {}", config.action, config.fid, model.name);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_prepared_test_pool;
    use crate::models::{BlogSubtype, ERRORS_HEADER};
    use crate::services::form::validation::{MSG_NOT_BLANK, MSG_NOT_NULL};

    async fn engine_with_subtypes() -> (EntityFormEngine, Arc<RepositoryFactory>) {
        let factory = Arc::new(RepositoryFactory::new(create_prepared_test_pool().await));
        let repo = factory.for_entity::<BlogSubtype>();
        for t in BlogType::ALL {
            for i in 0..3 {
                repo.create(&BlogSubtype::new(format!("{} sub type {}", t, i), t))
                    .await
                    .unwrap();
            }
        }
        (EntityFormEngine::new(factory.clone(), 1000), factory)
    }

    fn params(pairs: &[(&str, &str)]) -> FormParams {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_request_from_params() {
        let p = params(&[("mid", "4"), ("fid", "formx"), ("modelfields", "handle,type")]);

        let request = FormRequest::from_params("update", "blog", None, &p).unwrap();
        assert_eq!(request.mid, Some(4));
        assert_eq!(request.fid.as_deref(), Some("formx"));
        assert_eq!(request.modelfields.as_deref(), Some("handle,type"));

        let path_wins = FormRequest::from_params("update", "blog", Some("9"), &p).unwrap();
        assert_eq!(path_wins.mid, Some(9));

        let bad = FormRequest::from_params("read", "blog", Some("x"), &p);
        assert!(matches!(bad, Err(FormError::InvalidParameter { .. })));
    }

    #[tokio::test]
    async fn test_resolve_create_blog() {
        let (engine, _) = engine_with_subtypes().await;

        let config = engine
            .resolve_config(&FormRequest::new("create", "Blog"))
            .await
            .unwrap();

        assert_eq!(config.modelname, "blog");
        assert_eq!(config.stage, FormStage::Begin);
        assert!(config.fid.starts_with("form"));
        assert_eq!(config.form.id, config.fid);
        assert_eq!(
            config.form.member_names,
            vec!["handle", "description", "type", "subtype", "enabled", "image", "timeCreated"]
        );

        let handle = config.form.member("handle").unwrap();
        assert_eq!(handle.max_length, 64);
        assert!(handle.required);
        assert_eq!(handle.id, format!("{}-handle", config.fid));

        let blog_type = config.form.member("type").unwrap();
        assert_eq!(blog_type.choices.len(), 4);
        assert_eq!(blog_type.member_type, "select");

        let subtype = config.form.member("subtype").unwrap();
        // Optional reference: blank choice plus every subtype
        assert_eq!(subtype.choices.len(), 1 + 12);
        assert_eq!(subtype.referenced_form_href.as_deref(), Some("/api/webform/create/blogsubtype"));
        assert!(subtype.form_reference);

        assert_eq!(config.form.member("enabled").unwrap().value, Value::Bool(false));
        assert!(config.form.member("timeCreated").unwrap().value.is_string());
        assert_eq!(config.form.member("description").unwrap().max_length, 512);
    }

    #[tokio::test]
    async fn test_resolve_rejects_bad_requests() {
        let (engine, _) = engine_with_subtypes().await;

        let unknown_model = engine.resolve_config(&FormRequest::new("create", "user")).await;
        assert!(matches!(unknown_model, Err(FormError::UnknownModel(_))));

        let unknown_action = engine.resolve_config(&FormRequest::new("edit", "blog")).await;
        assert!(matches!(unknown_action, Err(FormError::UnknownAction(_))));

        let missing_id = engine.resolve_config(&FormRequest::new("update", "blog")).await;
        assert!(matches!(missing_id, Err(FormError::MissingId(_))));

        let mut request = FormRequest::new("read", "blog");
        request.mid = Some(404);
        let not_found = engine.resolve_config(&request).await;
        assert!(matches!(not_found, Err(FormError::EntityNotFound { id: 404, .. })));

        let mut request = FormRequest::new("create", "blog");
        request.modelfields = Some("handle,owner".into());
        let unknown_field = engine.resolve_config(&request).await;
        assert!(matches!(unknown_field, Err(FormError::UnknownProperty { .. })));
    }

    #[tokio::test]
    async fn test_modelfields_order() {
        let (engine, _) = engine_with_subtypes().await;
        let mut request = FormRequest::new("create", "blog");
        request.modelfields = Some("type, handle,type".into());

        let config = engine.resolve_config(&request).await.unwrap();

        assert_eq!(config.form.member_names, vec!["type", "handle"]);
        assert_eq!(config.form.members.len(), 2);
        assert_eq!(config.form.members[0].name, "type");
    }

    #[tokio::test]
    async fn test_validate_blank_handle_and_null_type() {
        let (engine, _) = engine_with_subtypes().await;
        let mut config = engine.resolve_config(&FormRequest::new("create", "blog")).await.unwrap();

        let bound = engine.bind_params(&config, &params(&[("handle", " ")])).await.unwrap();
        let errors = engine.validate(&bound, None).await.unwrap();

        assert!(errors.contains(&FieldError::new("handle", MSG_NOT_BLANK)));
        assert!(errors.contains(&FieldError::new("type", MSG_NOT_NULL)));

        config.set_errors(&errors);
        assert_eq!(config.errors[0], ERRORS_HEADER);
    }

    #[tokio::test]
    async fn test_validate_single_property() {
        let (engine, _) = engine_with_subtypes().await;
        let config = engine.resolve_config(&FormRequest::new("create", "blog")).await.unwrap();

        let bound = engine.bind_params(&config, &params(&[("handle", "ok")])).await.unwrap();

        assert!(engine.validate(&bound, Some("handle")).await.unwrap().is_empty());
        assert_eq!(engine.validate(&bound, Some("type")).await.unwrap().len(), 1);
        assert!(matches!(
            engine.validate(&bound, Some("owner")).await,
            Err(FormError::UnknownProperty { .. })
        ));
    }

    #[tokio::test]
    async fn test_validate_references() {
        let (engine, factory) = engine_with_subtypes().await;
        let config = engine.resolve_config(&FormRequest::new("create", "blog")).await.unwrap();

        let missing = engine
            .bind_params(&config, &params(&[("handle", "h"), ("type", "0"), ("subtype", "9999")]))
            .await
            .unwrap();
        let errors = engine.validate(&missing, None).await.unwrap();
        assert_eq!(errors, vec![FieldError::new("subtype", "no blogsubtype found with id 9999")]);

        let business = factory
            .for_entity::<BlogSubtype>()
            .list_by_type(BlogType::Business, 1)
            .await
            .unwrap();
        let business_id = business[0].id.unwrap().to_string();
        let mismatched = engine
            .bind_params(&config, &params(&[("handle", "h"), ("type", "0"), ("subtype", business_id.as_str())]))
            .await
            .unwrap();
        let errors = engine.validate(&mismatched, None).await.unwrap();
        assert_eq!(errors, vec![FieldError::new("subtype", "must belong to type PERSONAL")]);
    }

    #[tokio::test]
    async fn test_dependents_restricts_subtypes_to_type() {
        let (engine, _) = engine_with_subtypes().await;
        let config = engine.resolve_config(&FormRequest::new("create", "blog")).await.unwrap();

        let dependents = engine
            .compute_dependents(&config, "type", &params(&[("type", "2")]))
            .await
            .unwrap();

        let choices = &dependents["subtype"];
        assert_eq!(choices.len(), 1 + 3);
        assert!(choices[1..].iter().all(|c| c.text.starts_with("TECHNOLOGY")));

        let none = engine
            .compute_dependents(&config, "handle", &params(&[]))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_submit_create_read_update_delete() {
        let (engine, _) = engine_with_subtypes().await;
        let create = engine.resolve_config(&FormRequest::new("create", "blog")).await.unwrap();
        let bound = engine
            .bind_params(&create, &params(&[("handle", "first"), ("type", "BUSINESS"), ("enabled", "true")]))
            .await
            .unwrap();
        assert!(engine.validate(&bound, None).await.unwrap().is_empty());

        let SubmitOutcome::Created { id, entity } = engine.submit(&create, &bound).await.unwrap() else {
            panic!("expected a created outcome");
        };
        assert_eq!(entity["handle"], "first");
        assert_eq!(entity["type"], "BUSINESS");

        let mut request = FormRequest::new("update", "blog");
        request.mid = Some(id);
        let update = engine.resolve_config(&request).await.unwrap();
        assert_eq!(update.form.member("handle").unwrap().value, "first");
        let bound = engine.bind_params(&update, &params(&[("handle", "renamed")])).await.unwrap();
        let SubmitOutcome::Updated(entity) = engine.submit(&update, &bound).await.unwrap() else {
            panic!("expected an updated outcome");
        };
        assert_eq!(entity["handle"], "renamed");
        assert_eq!(entity["enabled"], true);

        request.action = "read".into();
        let read = engine.resolve_config(&request).await.unwrap();
        let bound = engine.bind_params(&read, &params(&[("handle", "ignored")])).await.unwrap();
        assert_eq!(bound.value("handle"), "renamed");
        assert!(matches!(engine.submit(&read, &bound).await.unwrap(), SubmitOutcome::Read(_)));

        request.action = "delete".into();
        let delete = engine.resolve_config(&request).await.unwrap();
        let bound = engine.bind_params(&delete, &params(&[])).await.unwrap();
        assert_eq!(engine.submit(&delete, &bound).await.unwrap(), SubmitOutcome::Deleted(id));
        assert!(matches!(
            engine.submit(&delete, &bound).await,
            Err(FormError::EntityNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_subtype_name_unique_per_type() {
        let (engine, factory) = engine_with_subtypes().await;
        let create = engine
            .resolve_config(&FormRequest::new("create", "blogsubtype"))
            .await
            .unwrap();

        let taken = engine
            .bind_params(&create, &params(&[("name", "PERSONAL sub type 0"), ("type", "0")]))
            .await
            .unwrap();
        assert_eq!(
            engine.validate(&taken, None).await.unwrap(),
            vec![FieldError::new(
                "name",
                "a blog subtype named 'PERSONAL sub type 0' already exists for type PERSONAL"
            )]
        );

        // Same name under another type is free
        let other_type = engine
            .bind_params(&create, &params(&[("name", "PERSONAL sub type 0"), ("type", "1")]))
            .await
            .unwrap();
        assert!(engine.validate(&other_type, None).await.unwrap().is_empty());

        let own = factory
            .for_entity::<BlogSubtype>()
            .find_by_type_and_name(BlogType::Personal, "PERSONAL sub type 1")
            .await
            .unwrap()
            .unwrap();
        let mut request = FormRequest::new("update", "blogsubtype");
        request.mid = own.id;
        let update = engine.resolve_config(&request).await.unwrap();

        let renamed = engine
            .bind_params(&update, &params(&[("name", "PERSONAL sub type 2")]))
            .await
            .unwrap();
        assert_eq!(engine.validate(&renamed, None).await.unwrap().len(), 1);
        assert_eq!(engine.validate(&renamed, Some("name")).await.unwrap()[0].field_name, "name");

        let unchanged = engine
            .bind_params(&update, &params(&[("name", "PERSONAL sub type 1")]))
            .await
            .unwrap();
        assert!(engine.validate(&unchanged, None).await.unwrap().is_empty());
    }
}
