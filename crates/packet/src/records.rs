//! Typed records read from the JSON stores

use serde::{Deserialize, Deserializer, Serialize};

/// Empty or whitespace keys mean "not linked"
fn optional_key<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let key: Option<String> = Option::deserialize(deserializer)?;
    Ok(key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty()))
}

/// `null` reads as the field's default
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Form references; a `null` list or `null` entries are dropped
fn form_list<'de, D>(deserializer: D) -> std::result::Result<Vec<FormRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let forms: Option<Vec<Option<FormRef>>> = Option::deserialize(deserializer)?;
    Ok(forms.unwrap_or_default().into_iter().flatten().collect())
}

/// A form requested by a project
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub form_key: String,
}

impl FormRef {
    pub fn new(city: impl Into<String>, form_key: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            form_key: form_key.into(),
        }
    }

    /// Both parts present
    pub fn is_complete(&self) -> bool {
        !self.city.trim().is_empty() && !self.form_key.trim().is_empty()
    }

    /// Output file name: `{city}__{form_key}.pdf`
    pub fn output_file_name(&self) -> String {
        format!(
            "{}__{}.pdf",
            safe_component(&self.city),
            safe_component(&self.form_key)
        )
    }
}

/// A permit project linking records and the forms it needs
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "optional_key")]
    pub company_key: Option<String>,
    #[serde(default, deserialize_with = "optional_key")]
    pub job_key: Option<String>,
    #[serde(default, deserialize_with = "optional_key")]
    pub owner_key: Option<String>,
    #[serde(default, deserialize_with = "optional_key")]
    pub roof_key: Option<String>,
    #[serde(default, deserialize_with = "form_list")]
    pub forms: Vec<FormRef>,
}

impl Project {
    /// Requested forms in order, skipping incomplete references
    pub fn form_refs(&self) -> Vec<FormRef> {
        self.forms
            .iter()
            .filter(|form| form.is_complete())
            .cloned()
            .collect()
    }
}

/// Project listing row
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectSummary {
    pub key: String,
    pub name: String,
    pub company_key: Option<String>,
    pub forms_count: usize,
}

/// Catalog value for one (city, form key)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub template_dir: String,
}

/// Catalog listing row
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FormSummary {
    pub city: String,
    pub form_key: String,
    pub name: String,
    pub template_dir: String,
}

/// Make a key safe to use as one path component
pub fn safe_component(key: &str) -> String {
    let cleaned: String = key
        .trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}
