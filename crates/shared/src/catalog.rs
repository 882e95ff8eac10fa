//! Immutable in-memory project catalog.
//!
//! The catalog is loaded once at startup and validated eagerly: a project
//! lacking default-locale text for any localized field is a content error and
//! the whole load fails. After a successful load every lookup is infallible.

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::{
    domain::{Project, ProjectId, ProjectView},
    locale::{Locale, LocalizedText, LocalizedTextError},
};

const BUILTIN_CATALOG_JSON: &str = include_str!("../catalog/projects.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("project '{slug}' field '{field}': {source}")]
    ContentIntegrity {
        slug: String,
        field: &'static str,
        source: LocalizedTextError,
    },
    #[error("duplicate project id {0}")]
    DuplicateId(ProjectId),
    #[error("duplicate project slug '{0}'")]
    DuplicateSlug(String),
    #[error("project slug '{0}' is not URL-safe")]
    InvalidSlug(String),
}

/// Wire shape of one catalog entry before validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRecord {
    id: i64,
    slug: String,
    title: BTreeMap<Locale, String>,
    category: BTreeMap<Locale, String>,
    materials: BTreeMap<Locale, String>,
    time_spent: BTreeMap<Locale, String>,
    description: BTreeMap<Locale, String>,
    cover_image: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    color_palette: Vec<String>,
}

impl ProjectRecord {
    fn into_project(self) -> Result<Project, CatalogError> {
        let slug = self.slug;
        let localized = |field: &'static str, entries: BTreeMap<Locale, String>| {
            LocalizedText::try_from(entries).map_err(|source| CatalogError::ContentIntegrity {
                slug: slug.clone(),
                field,
                source,
            })
        };

        let title = localized("title", self.title)?;
        let category = localized("category", self.category)?;
        let materials = localized("materials", self.materials)?;
        let time_spent = localized("timeSpent", self.time_spent)?;
        let description = localized("description", self.description)?;

        Ok(Project {
            id: ProjectId(self.id),
            slug,
            title,
            category,
            materials,
            time_spent,
            description,
            cover_image: self.cover_image,
            images: self.images,
            color_palette: self.color_palette,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    projects: Vec<Project>,
}

impl Catalog {
    /// Loads the catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_CATALOG_JSON)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let records: Vec<ProjectRecord> = serde_json::from_str(raw)?;
        let projects = records
            .into_iter()
            .map(ProjectRecord::into_project)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_projects(projects)
    }

    /// Validates identity and text invariants and keeps authoring order.
    pub fn from_projects(projects: Vec<Project>) -> Result<Self, CatalogError> {
        let mut ids = HashSet::new();
        let mut slugs = HashSet::new();
        for project in &projects {
            if !is_url_safe_slug(&project.slug) {
                return Err(CatalogError::InvalidSlug(project.slug.clone()));
            }
            check_localized_fields(project)?;
            if !ids.insert(project.id) {
                return Err(CatalogError::DuplicateId(project.id));
            }
            if !slugs.insert(project.slug.as_str()) {
                return Err(CatalogError::DuplicateSlug(project.slug.clone()));
            }
            if project
                .images
                .first()
                .is_some_and(|first| first != &project.cover_image)
            {
                warn!(
                    slug = %project.slug,
                    cover = %project.cover_image,
                    "cover image is not the first carousel image"
                );
            }
        }
        Ok(Self { projects })
    }

    /// All projects in authoring order.
    pub fn all(&self) -> &[Project] {
        &self.projects
    }

    pub fn by_id(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn by_slug(&self, slug: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.slug == slug)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn views(&self, locale: Locale) -> Vec<ProjectView> {
        self.projects
            .iter()
            .map(|project| project.localized(locale))
            .collect()
    }
}

fn check_localized_fields(project: &Project) -> Result<(), CatalogError> {
    let fields = [
        ("title", &project.title),
        ("category", &project.category),
        ("materials", &project.materials),
        ("timeSpent", &project.time_spent),
        ("description", &project.description),
    ];
    for (field, text) in fields {
        text.validate()
            .map_err(|source| CatalogError::ContentIntegrity {
                slug: project.slug.clone(),
                field,
                source,
            })?;
    }
    Ok(())
}

fn is_url_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
