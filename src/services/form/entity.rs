//! Entity access for the form engine
//!
//! Maps between member values and the entity types, and routes each
//! operation to the repository of the addressed model.

use super::binding::{value_as_datetime, value_as_i64, value_as_str};
use super::descriptor::{find_model, FieldKind, ModelDescriptor, ModelKind};
use super::FormError;
use crate::db::repositories::RepositoryFactory;
use crate::models::{Blog, BlogSubtype, BlogType, Choice, Post};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

fn id_value(id: Option<i64>) -> Value {
    id.map_or(Value::Null, |id| Value::String(id.to_string()))
}

fn opt_string(s: &Option<String>) -> Value {
    s.as_ref().map_or(Value::Null, |s| Value::String(s.clone()))
}

fn time_value(dt: DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339())
}

pub fn blog_values(blog: &Blog) -> Map<String, Value> {
    let mut values = Map::new();
    values.insert("handle".into(), json!(blog.handle));
    values.insert("description".into(), opt_string(&blog.description));
    values.insert("type".into(), json!(blog.blog_type.ordinal().to_string()));
    values.insert("subtype".into(), id_value(blog.subtype_id()));
    values.insert("enabled".into(), json!(blog.enabled));
    values.insert("image".into(), opt_string(&blog.image));
    values.insert("timeCreated".into(), time_value(blog.time_created));
    values
}

pub fn subtype_values(subtype: &BlogSubtype) -> Map<String, Value> {
    let mut values = Map::new();
    values.insert("name".into(), json!(subtype.name));
    values.insert("type".into(), json!(subtype.blog_type.ordinal().to_string()));
    values
}

pub fn post_values(post: &Post) -> Map<String, Value> {
    let mut values = Map::new();
    values.insert("blog".into(), json!(post.blog_id.to_string()));
    values.insert("title".into(), json!(post.title));
    values.insert("content".into(), opt_string(&post.content));
    values.insert("timeCreated".into(), time_value(post.time_created));
    values
}

/// Initial values of a create form: unchecked checkboxes and the current time
pub fn default_values(model: &ModelDescriptor) -> Map<String, Value> {
    let now = Utc::now();
    model
        .fields
        .iter()
        .map(|f| {
            let value = match f.kind {
                FieldKind::Checkbox => Value::Bool(false),
                FieldKind::DateTime if f.required => time_value(now),
                _ => Value::Null,
            };
            (f.name.to_string(), value)
        })
        .collect()
}

/// Member values of a stored entity
pub async fn load_values(
    factory: &RepositoryFactory,
    model: &ModelDescriptor,
    id: i64,
) -> Result<Option<Map<String, Value>>> {
    Ok(match model.kind {
        ModelKind::Blog => factory
            .for_entity::<Blog>()
            .get_by_id(id)
            .await?
            .map(|b| blog_values(&b)),
        ModelKind::BlogSubtype => factory
            .for_entity::<BlogSubtype>()
            .get_by_id(id)
            .await?
            .map(|s| subtype_values(&s)),
        ModelKind::Post => factory
            .for_entity::<Post>()
            .get_by_id(id)
            .await?
            .map(|p| post_values(&p)),
    })
}

/// Stored entity as JSON
pub async fn load_json(factory: &RepositoryFactory, model: &ModelDescriptor, id: i64) -> Result<Option<Value>> {
    let value = match model.kind {
        ModelKind::Blog => factory.for_entity::<Blog>().get_by_id(id).await?.map(serde_json::to_value),
        ModelKind::BlogSubtype => factory
            .for_entity::<BlogSubtype>()
            .get_by_id(id)
            .await?
            .map(serde_json::to_value),
        ModelKind::Post => factory.for_entity::<Post>().get_by_id(id).await?.map(serde_json::to_value),
    };
    Ok(value.transpose()?)
}

pub async fn exists(factory: &RepositoryFactory, model: &ModelDescriptor, id: i64) -> Result<bool> {
    Ok(match model.kind {
        ModelKind::Blog => factory.for_entity::<Blog>().get_by_id(id).await?.is_some(),
        ModelKind::BlogSubtype => factory.for_entity::<BlogSubtype>().get_by_id(id).await?.is_some(),
        ModelKind::Post => factory.for_entity::<Post>().get_by_id(id).await?.is_some(),
    })
}

/// Type of a stored subtype, used to check a blog's subtype matches its type
pub async fn subtype_type(factory: &RepositoryFactory, id: i64) -> Result<Option<BlogType>> {
    Ok(factory
        .for_entity::<BlogSubtype>()
        .get_by_id(id)
        .await?
        .map(|s| s.blog_type))
}

/// Message for a subtype whose `(type, name)` is taken by another row.
/// `own_id` is the row being edited, if any.
pub async fn duplicate_subtype(
    factory: &RepositoryFactory,
    values: &Map<String, Value>,
    own_id: Option<i64>,
) -> Result<Option<String>> {
    let Some(name) = values.get("name").and_then(value_as_str).filter(|n| !n.trim().is_empty()) else {
        return Ok(None);
    };
    let Some(blog_type) = values.get("type").and_then(value_as_i64).and_then(BlogType::from_ordinal) else {
        return Ok(None);
    };

    let existing = factory
        .for_entity::<BlogSubtype>()
        .find_by_type_and_name(blog_type, name)
        .await?;
    Ok(existing
        .filter(|s| s.id.is_some() && s.id != own_id)
        .map(|_| format!("a blog subtype named '{}' already exists for type {}", name, blog_type)))
}

/// Choices for a reference member. Subtype choices are restricted to
/// `blog_type` when one is given.
pub async fn reference_choices(
    factory: &RepositoryFactory,
    target: &ModelDescriptor,
    blog_type: Option<BlogType>,
    limit: usize,
) -> Result<Vec<Choice>> {
    Ok(match target.kind {
        ModelKind::BlogSubtype => {
            let repo = factory.for_entity::<BlogSubtype>();
            let subtypes = match blog_type {
                Some(t) => repo.list_by_type(t, limit).await?,
                None => repo.list(limit).await?,
            };
            subtypes
                .into_iter()
                .filter_map(|s| s.id.map(|id| Choice::new(s.name, id.to_string())))
                .collect()
        }
        ModelKind::Blog => factory
            .for_entity::<Blog>()
            .list(limit)
            .await?
            .into_iter()
            .filter_map(|b| b.id.map(|id| Choice::new(b.handle, id.to_string())))
            .collect(),
        ModelKind::Post => factory
            .for_entity::<Post>()
            .list(limit)
            .await?
            .into_iter()
            .filter_map(|p| p.id.map(|id| Choice::new(p.title, id.to_string())))
            .collect(),
    })
}

/// Choices of the `BlogType` enum, valued by ordinal
pub fn enum_choices() -> Vec<Choice> {
    BlogType::ALL
        .iter()
        .map(|t| Choice::new(t.name(), t.ordinal().to_string()))
        .collect()
}

fn required_str(values: &Map<String, Value>, name: &str) -> Result<String> {
    values
        .get(name)
        .and_then(value_as_str)
        .map(String::from)
        .ok_or_else(|| anyhow!("missing value for {}", name))
}

fn optional_str(values: &Map<String, Value>, name: &str) -> Option<String> {
    values.get(name).and_then(value_as_str).map(String::from)
}

fn required_type(values: &Map<String, Value>) -> Result<BlogType> {
    values
        .get("type")
        .and_then(value_as_i64)
        .and_then(BlogType::from_ordinal)
        .ok_or_else(|| anyhow!("missing value for type"))
}

fn time_created(values: &Map<String, Value>) -> DateTime<Utc> {
    values
        .get("timeCreated")
        .and_then(value_as_datetime)
        .unwrap_or_else(Utc::now)
}

/// Id of a reference member, if set
pub fn reference_id(values: &Map<String, Value>, name: &str) -> Option<i64> {
    values.get(name).and_then(value_as_i64)
}

async fn blog_from_values(
    factory: &RepositoryFactory,
    id: Option<i64>,
    values: &Map<String, Value>,
) -> Result<Blog, FormError> {
    let subtype = match reference_id(values, "subtype") {
        Some(sid) => Some(
            factory
                .for_entity::<BlogSubtype>()
                .get_by_id(sid)
                .await?
                .ok_or_else(|| FormError::EntityNotFound {
                    model: "blogsubtype".to_string(),
                    id: sid,
                })?,
        ),
        None => None,
    };

    Ok(Blog {
        id,
        handle: required_str(values, "handle")?,
        description: optional_str(values, "description"),
        blog_type: required_type(values)?,
        subtype,
        enabled: values.get("enabled").and_then(Value::as_bool).unwrap_or(false),
        image: optional_str(values, "image"),
        time_created: time_created(values),
        post_list: Vec::new(),
    })
}

fn subtype_from_values(id: Option<i64>, values: &Map<String, Value>) -> Result<BlogSubtype> {
    Ok(BlogSubtype {
        id,
        name: required_str(values, "name")?,
        blog_type: required_type(values)?,
    })
}

fn post_from_values(id: Option<i64>, values: &Map<String, Value>) -> Result<Post> {
    Ok(Post {
        id,
        blog_id: reference_id(values, "blog").ok_or_else(|| anyhow!("missing value for blog"))?,
        title: required_str(values, "title")?,
        content: optional_str(values, "content"),
        time_created: time_created(values),
    })
}

/// Persist a new entity; returns its id and JSON form
pub async fn create(
    factory: &RepositoryFactory,
    model: &ModelDescriptor,
    values: &Map<String, Value>,
) -> Result<(i64, Value), FormError> {
    let (id, json) = match model.kind {
        ModelKind::Blog => {
            let blog = blog_from_values(factory, None, values).await?;
            let created = factory.for_entity::<Blog>().create(&blog).await?;
            (created.id, serde_json::to_value(&created))
        }
        ModelKind::BlogSubtype => {
            let subtype = subtype_from_values(None, values)?;
            let created = factory.for_entity::<BlogSubtype>().create(&subtype).await?;
            (created.id, serde_json::to_value(&created))
        }
        ModelKind::Post => {
            let post = post_from_values(None, values)?;
            let created = factory.for_entity::<Post>().create(&post).await?;
            (created.id, serde_json::to_value(&created))
        }
    };
    let id = id.ok_or_else(|| anyhow!("created {} has no id", model.name))?;
    Ok((id, json.map_err(anyhow::Error::from)?))
}

/// Overwrite a stored entity with the bound values
pub async fn update(
    factory: &RepositoryFactory,
    model: &ModelDescriptor,
    id: i64,
    values: &Map<String, Value>,
) -> Result<Value, FormError> {
    if !exists(factory, model, id).await? {
        return Err(FormError::EntityNotFound {
            model: model.name.to_string(),
            id,
        });
    }
    let json = match model.kind {
        ModelKind::Blog => {
            let blog = blog_from_values(factory, Some(id), values).await?;
            serde_json::to_value(factory.for_entity::<Blog>().update(&blog).await?)
        }
        ModelKind::BlogSubtype => {
            let subtype = subtype_from_values(Some(id), values)?;
            serde_json::to_value(factory.for_entity::<BlogSubtype>().update(&subtype).await?)
        }
        ModelKind::Post => {
            let post = post_from_values(Some(id), values)?;
            serde_json::to_value(factory.for_entity::<Post>().update(&post).await?)
        }
    };
    Ok(json.map_err(anyhow::Error::from)?)
}

pub async fn delete(factory: &RepositoryFactory, model: &ModelDescriptor, id: i64) -> Result<bool> {
    match model.kind {
        ModelKind::Blog => factory.for_entity::<Blog>().delete(id).await,
        ModelKind::BlogSubtype => factory.for_entity::<BlogSubtype>().delete(id).await,
        ModelKind::Post => factory.for_entity::<Post>().delete(id).await,
    }
}

/// Descriptor of a reference target; descriptors only name registered models
pub fn reference_target(target: &str) -> Result<&'static ModelDescriptor> {
    find_model(target).ok_or_else(|| anyhow!("reference to unregistered model {}", target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_prepared_test_pool;
    use crate::services::form::descriptor::{BLOG, BLOG_SUBTYPE, POST};

    async fn factory() -> RepositoryFactory {
        RepositoryFactory::new(create_prepared_test_pool().await)
    }

    #[test]
    fn test_default_values() {
        let values = default_values(&BLOG);
        assert_eq!(values["enabled"], json!(false));
        assert!(values["timeCreated"].is_string());
        assert!(values["handle"].is_null());
        assert_eq!(values.len(), BLOG.fields.len());
    }

    #[test]
    fn test_enum_choices_are_ordinals() {
        let choices = enum_choices();
        assert_eq!(choices[0], Choice::new("PERSONAL", "0"));
        assert_eq!(choices[3], Choice::new("ENTERTAINMENT", "3"));
    }

    #[tokio::test]
    async fn test_create_load_update_delete_subtype() {
        let factory = factory().await;
        let mut values = Map::new();
        values.insert("name".into(), json!("Cooking"));
        values.insert("type".into(), json!("0"));

        let (id, created) = create(&factory, &BLOG_SUBTYPE, &values).await.unwrap();
        assert_eq!(created["name"], "Cooking");
        assert_eq!(created["type"], "PERSONAL");

        let loaded = load_values(&factory, &BLOG_SUBTYPE, id).await.unwrap().unwrap();
        assert_eq!(loaded, values);

        values.insert("name".into(), json!("Baking"));
        let updated = update(&factory, &BLOG_SUBTYPE, id, &values).await.unwrap();
        assert_eq!(updated["name"], "Baking");

        assert!(delete(&factory, &BLOG_SUBTYPE, id).await.unwrap());
        assert!(load_json(&factory, &BLOG_SUBTYPE, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blog_round_trip_with_subtype_and_post() {
        let factory = factory().await;
        let subtype = factory
            .for_entity::<BlogSubtype>()
            .create(&BlogSubtype::new("AI", BlogType::Technology))
            .await
            .unwrap();

        let mut values = default_values(&BLOG);
        values.insert("handle".into(), json!("ml-notes"));
        values.insert("type".into(), json!("2"));
        values.insert("subtype".into(), json!(subtype.id.unwrap().to_string()));
        values.insert("enabled".into(), json!(true));

        let (blog_id, json) = create(&factory, &BLOG, &values).await.unwrap();
        assert_eq!(json["subtype"]["name"], "AI");
        assert_eq!(json["enabled"], true);

        let mut post = default_values(&POST);
        post.insert("blog".into(), json!(blog_id.to_string()));
        post.insert("title".into(), json!("Hello"));
        create(&factory, &POST, &post).await.unwrap();

        let blog = load_json(&factory, &BLOG, blog_id).await.unwrap().unwrap();
        assert_eq!(blog["postList"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_update_missing_entity() {
        let factory = factory().await;
        let mut values = Map::new();
        values.insert("name".into(), json!("x"));
        values.insert("type".into(), json!("1"));

        let err = update(&factory, &BLOG_SUBTYPE, 99, &values).await.unwrap_err();
        assert!(matches!(err, FormError::EntityNotFound { id: 99, .. }));
    }

    #[tokio::test]
    async fn test_reference_choices_filtered_by_type() {
        let factory = factory().await;
        let repo = factory.for_entity::<BlogSubtype>();
        repo.create(&BlogSubtype::new("a", BlogType::Personal)).await.unwrap();
        repo.create(&BlogSubtype::new("b", BlogType::Business)).await.unwrap();

        let all = reference_choices(&factory, &BLOG_SUBTYPE, None, 10).await.unwrap();
        assert_eq!(all.len(), 2);

        let business = reference_choices(&factory, &BLOG_SUBTYPE, Some(BlogType::Business), 10)
            .await
            .unwrap();
        assert_eq!(business.len(), 1);
        assert_eq!(business[0].text, "b");
    }
}
