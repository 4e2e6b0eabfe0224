//! Catalog queries
//!
//! The catalog is `{city: {form_key: {name, template_dir}}}`. Values of the
//! wrong shape are ignored.

use crate::records::{CatalogEntry, FormSummary};
use serde_json::{Map, Value};

/// Loaded `forms_catalog` data
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cities: Map<String, Value>,
}

impl Catalog {
    pub fn from_map(cities: Map<String, Value>) -> Self {
        Self { cities }
    }

    /// City keys, sorted
    pub fn list_cities(&self) -> Vec<String> {
        let mut cities: Vec<String> = self
            .cities
            .iter()
            .filter(|(_, forms)| forms.is_object())
            .map(|(city, _)| city.clone())
            .collect();
        cities.sort();
        cities
    }

    /// Forms for one city, sorted by display name (case-insensitive)
    pub fn list_forms_for_city(&self, city: &str) -> Vec<FormSummary> {
        let Some(forms) = self.cities.get(city).and_then(Value::as_object) else {
            return Vec::new();
        };

        let mut summaries: Vec<FormSummary> = forms
            .iter()
            .filter_map(|(form_key, entry)| {
                let entry = read_entry(entry)?;
                Some(FormSummary {
                    city: city.to_string(),
                    form_key: form_key.clone(),
                    name: if entry.name.is_empty() {
                        form_key.clone()
                    } else {
                        entry.name
                    },
                    template_dir: entry.template_dir,
                })
            })
            .collect();
        summaries.sort_by_key(|form| form.name.to_lowercase());
        summaries
    }

    /// Every form of every city
    pub fn all_forms(&self) -> Vec<FormSummary> {
        self.list_cities()
            .iter()
            .flat_map(|city| self.list_forms_for_city(city))
            .collect()
    }

    /// Entry for `(city, form_key)`; one without a `template_dir` counts as absent
    pub fn entry(&self, city: &str, form_key: &str) -> Option<CatalogEntry> {
        self.cities
            .get(city)?
            .get(form_key)
            .and_then(read_entry)
            .filter(|entry| !entry.template_dir.trim().is_empty())
    }
}

fn read_entry(value: &Value) -> Option<CatalogEntry> {
    if !value.is_object() {
        return None;
    }
    let name = value.get("name").and_then(Value::as_str).unwrap_or_default();
    let template_dir = value
        .get("template_dir")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(CatalogEntry {
        name: name.to_string(),
        template_dir: template_dir.to_string(),
    })
}
