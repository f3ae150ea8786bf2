//! Startup data seeding
//!
//! Implements the environment-gated bootstrap sequence:
//! - production detection from the active profiles
//! - reference data (`BlogSubtype` rows for every `BlogType`)
//! - development fixtures, refused in production
//! - application info logging outside production

use crate::db::repositories::RepositoryFactory;
use crate::models::{BlogSubtype, BlogType};
use std::sync::Arc;

/// Bundle served to the form page in production
pub const PRODUCTION_SCRIPT: &str = "web-forms.js";
/// Bundle served to the form page everywhere else
pub const DEVELOPMENT_SCRIPT: &str = "web-forms.dev.js";

/// Error types for seeding operations
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// Operation refused in the current environment
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Runtime environment derived once from the active profiles
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Environment {
    profiles: Vec<String>,
    production: bool,
}

impl Environment {
    /// Any profile whose name contains `prod` (case-insensitive) marks production.
    /// No profiles at all means development.
    pub fn from_profiles(profiles: Option<&[String]>) -> Self {
        let profiles = profiles.map(<[String]>::to_vec).unwrap_or_default();
        let production = profiles
            .iter()
            .any(|p| p.to_lowercase().contains("prod"));
        Self {
            profiles,
            production,
        }
    }

    pub fn is_production_environment(&self) -> bool {
        self.production
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    /// Form client bundle for this environment
    pub fn bundle_script(&self) -> &'static str {
        if self.production {
            PRODUCTION_SCRIPT
        } else {
            DEVELOPMENT_SCRIPT
        }
    }
}

/// Seeds reference data at startup
pub struct SampleDataLoader {
    factory: Arc<RepositoryFactory>,
    environment: Environment,
    subtypes_per_type: usize,
    server_port: u16,
}

impl SampleDataLoader {
    pub fn new(
        factory: Arc<RepositoryFactory>,
        environment: Environment,
        subtypes_per_type: usize,
        server_port: u16,
    ) -> Self {
        Self {
            factory,
            environment,
            subtypes_per_type,
            server_port,
        }
    }

    /// Run the startup sequence. Errors abort startup.
    pub async fn run(&self) -> Result<(), SeedError> {
        self.load_default_data().await?;

        if !self.environment.is_production_environment() {
            self.load_dev_data().await?;
            for line in self.print_app_info() {
                tracing::info!("{}", line);
            }
        }

        Ok(())
    }

    /// Create `subtypes_per_type` subtypes named `"<TYPE> sub type <i>"` for
    /// every blog type. Existing rows are left alone, so running this again
    /// creates nothing. Returns the number of rows created.
    pub async fn load_default_data(&self) -> Result<usize, SeedError> {
        let repo = self.factory.for_entity::<BlogSubtype>();
        let mut created = 0;

        for blog_type in BlogType::ALL {
            let mut created_for_type = 0;
            for i in 0..self.subtypes_per_type {
                let subtype = BlogSubtype::new(subtype_name(blog_type, i), blog_type);
                if let Some(stored) = repo.create_if_absent(&subtype).await? {
                    tracing::trace!("Created blog subtype {:?}: {}", stored.id, stored.name);
                    created_for_type += 1;
                }
            }
            tracing::debug!("Seeded {} subtype(s) for {}", created_for_type, blog_type);
            created += created_for_type;
        }

        tracing::info!("Default data loaded: {} blog subtype(s) created", created);
        Ok(created)
    }

    /// Development fixtures. Refused in production; otherwise writes nothing.
    pub async fn load_dev_data(&self) -> Result<(), SeedError> {
        if self.environment.is_production_environment() {
            return Err(SeedError::UnsupportedOperation(
                "development data cannot be loaded in a production environment".to_string(),
            ));
        }
        tracing::debug!("No development fixtures to load");
        Ok(())
    }

    /// Lines describing where the running application can be reached
    pub fn print_app_info(&self) -> Vec<String> {
        let base = format!("http://localhost:{}", self.server_port);
        vec![
            format!("Webform is running at {}/", base),
            format!("Blog form: {}/webform/create/blog", base),
            format!("Subtype form: {}/webform/create/blogsubtype", base),
            format!("Form API: {}/api/webform", base),
            format!("Logo: {}", self.logo_link()),
        ]
    }

    pub fn logo_link(&self) -> String {
        format!("http://localhost:{}/logo.jpg", self.server_port)
    }
}

fn subtype_name(blog_type: BlogType, index: usize) -> String {
    format!("{} sub type {}", blog_type, index)
}
