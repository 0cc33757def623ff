//! Selectable style and aspect-ratio choices for the create view.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub value: String,
    pub display_label: String,
}

impl ChoiceOption {
    /// A bare value is labelled with itself.
    pub fn plain(value: &str) -> Self {
        Self::labelled(value, value)
    }

    pub fn labelled(value: &str, label: &str) -> Self {
        let value = value.trim();
        let label = match label.trim() {
            "" => value,
            trimmed => trimmed,
        };
        Self {
            value: value.to_string(),
            display_label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionList {
    options: Vec<ChoiceOption>,
    fallback: &'static str,
}

impl OptionList {
    /// `fallback` is the selection reported once the list runs empty.
    pub fn new(options: Vec<ChoiceOption>, fallback: &'static str) -> Self {
        let mut list = Self {
            options: Vec::with_capacity(options.len()),
            fallback,
        };
        for option in options {
            list.push(option);
        }
        list
    }

    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|option| option.value.as_str())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.options.iter().any(|option| option.value == value.trim())
    }

    /// The selection a fresh view starts with.
    pub fn default_value(&self) -> &str {
        self.options
            .first()
            .map(|option| option.value.as_str())
            .unwrap_or(self.fallback)
    }

    fn push(&mut self, option: ChoiceOption) -> bool {
        if option.value.is_empty() || self.contains(&option.value) {
            return false;
        }
        self.options.push(option);
        true
    }

    /// Appends a custom choice. Returns `false` when the value is already
    /// listed.
    pub fn add(&mut self, value: &str, label: Option<&str>) -> Result<bool, StoreError> {
        if value.trim().is_empty() {
            return Err(StoreError::BlankField("option value"));
        }
        Ok(self.push(ChoiceOption::labelled(value, label.unwrap_or_default())))
    }

    /// Drops a choice and returns the selection that should replace it.
    pub fn remove(&mut self, value: &str) -> Result<String, StoreError> {
        let value = value.trim();
        let index = self
            .options
            .iter()
            .position(|option| option.value == value)
            .ok_or_else(|| StoreError::OptionNotFound(value.to_string()))?;
        self.options.remove(index);
        Ok(self.default_value().to_string())
    }
}
