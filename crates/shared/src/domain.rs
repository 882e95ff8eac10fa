use std::fmt;

use serde::{Deserialize, Serialize};

use crate::locale::{Locale, LocalizedText};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ProjectId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethod {
    #[default]
    Line,
    Email,
    Instagram,
}

impl ContactMethod {
    pub const ALL: [ContactMethod; 3] = [
        ContactMethod::Line,
        ContactMethod::Email,
        ContactMethod::Instagram,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ContactMethod::Line => "line",
            ContactMethod::Email => "email",
            ContactMethod::Instagram => "instagram",
        }
    }

    /// Human-facing label used in notification text.
    pub fn label(self) -> &'static str {
        match self {
            ContactMethod::Line => "LINE",
            ContactMethod::Email => "Email",
            ContactMethod::Instagram => "Instagram",
        }
    }
}

impl fmt::Display for ContactMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for ContactMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ContactMethod::ALL
            .into_iter()
            .find(|method| {
                method.code().eq_ignore_ascii_case(trimmed)
                    || (trimmed.eq_ignore_ascii_case("ig") && *method == ContactMethod::Instagram)
            })
            .ok_or_else(|| format!("unknown contact method '{trimmed}'"))
    }
}

/// A catalog entry. Constructed once at catalog load and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub slug: String,
    pub title: LocalizedText,
    pub category: LocalizedText,
    pub materials: LocalizedText,
    pub time_spent: LocalizedText,
    pub description: LocalizedText,
    pub cover_image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub color_palette: Vec<String>,
}

impl Project {
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn localized(&self, locale: Locale) -> ProjectView {
        ProjectView {
            id: self.id,
            slug: self.slug.clone(),
            locale,
            title: self.title.resolve(locale).to_string(),
            category: self.category.resolve(locale).to_string(),
            materials: self.materials.resolve(locale).to_string(),
            time_spent: self.time_spent.resolve(locale).to_string(),
            description: self.description.resolve(locale).to_string(),
            cover_image: self.cover_image.clone(),
            images: self.images.clone(),
            color_palette: self.color_palette.clone(),
        }
    }
}

/// A project with every localized field resolved for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: ProjectId,
    pub slug: String,
    pub locale: Locale,
    pub title: String,
    pub category: String,
    pub materials: String,
    pub time_spent: String,
    pub description: String,
    pub cover_image: String,
    pub images: Vec<String>,
    pub color_palette: Vec<String>,
}
