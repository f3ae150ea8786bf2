//! Server-rendered views
//!
//! Page templates are embedded at build time and rendered with Tera. A
//! controller returns a `View`: the template name and its flat model.

use anyhow::{Context, Result};
use axum::response::Html;
use rust_embed::RustEmbed;
use std::collections::BTreeMap;
use tera::{Context as TeraContext, Tera};

/// Embedded page templates
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct Templates;

/// A template name with the values it is rendered with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    pub template: String,
    pub model: BTreeMap<String, String>,
}

impl View {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            model: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.model.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.model.get(key).map(String::as_str)
    }
}

/// Renders views from the embedded templates
pub struct ViewRenderer {
    tera: Tera,
}

impl ViewRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        for name in Templates::iter() {
            let file = Templates::get(&name).with_context(|| format!("Missing template {}", name))?;
            let content = std::str::from_utf8(&file.data)
                .with_context(|| format!("Template {} is not UTF-8", name))?;
            tera.add_raw_template(&name, content)
                .with_context(|| format!("Failed to add template {}", name))?;
        }
        tracing::debug!("Loaded {} view template(s)", tera.get_template_names().count());
        Ok(Self { tera })
    }

    /// Render `<template>.html`; every model entry is a top-level variable
    /// and the whole model is also available as `model`
    pub fn render(&self, view: &View) -> Result<Html<String>> {
        let mut context = TeraContext::new();
        for (key, value) in &view.model {
            context.insert(key.as_str(), value);
        }
        context.insert("model", &view.model);

        let template = format!("{}.html", view.template);
        let html = self
            .tera
            .render(&template, &context)
            .with_context(|| format!("Failed to render '{}'", template))?;
        Ok(Html(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_templates_load() {
        let renderer = ViewRenderer::new().unwrap();
        let names: Vec<_> = renderer.tera.get_template_names().collect();
        assert!(names.contains(&"index.html"));
        assert!(names.contains(&"webform.html"));
    }

    #[test]
    fn test_render_webform_with_model() {
        let renderer = ViewRenderer::new().unwrap();
        let view = View::new("webform")
            .with("script", "web-forms.dev.js")
            .with("basepath", "/webform")
            .with("apibasepath", "/api/webform")
            .with("action", "create")
            .with("modelname", "blog");

        let Html(html) = renderer.render(&view).unwrap();
        assert!(html.contains("web-forms.dev.js"));
        assert!(html.contains("/api/webform"));
        assert!(html.contains("blog"));
    }

    #[test]
    fn test_render_unknown_template_fails() {
        let renderer = ViewRenderer::new().unwrap();
        assert!(renderer.render(&View::new("missing")).is_err());
    }
}
