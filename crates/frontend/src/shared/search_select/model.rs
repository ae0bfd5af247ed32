use contracts::shared::lookup::{normalize_id, LookupItem};
use std::str::FromStr;

use crate::shared::config::ConfigError;

/// Number of suggestions requested (and shown) per query.
pub const DEFAULT_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectorMode {
    Single,
    #[default]
    Multi,
}

impl FromStr for SelectorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "multi" | "" => Ok(Self::Multi),
            other => Err(format!("unknown selector mode: {}", other)),
        }
    }
}

/// Immutable configuration of one selector mount.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorConfig {
    pub mode: SelectorMode,
    pub endpoint: String,
    /// Name under which selected ids are submitted.
    pub field_name: String,
    pub placeholder: String,
    pub initial_values: Vec<SelectedItem>,
    pub limit: u32,
    /// Label word for values known only by id, e.g. `SU` gives `SU 12`.
    pub label_prefix: Option<String>,
}

impl SelectorConfig {
    pub fn new(mode: SelectorMode, endpoint: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            mode,
            endpoint: endpoint.into(),
            field_name: field_name.into(),
            placeholder: "Search...".to_string(),
            initial_values: Vec::new(),
            limit: DEFAULT_LIMIT,
            label_prefix: None,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn initial_values(mut self, values: Vec<SelectedItem>) -> Self {
        self.initial_values = values;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = Some(prefix.into()).filter(|p| !p.trim().is_empty());
        self
    }

    /// Item for a value known only by id (e.g. taken from the URL).
    pub fn bare_item(&self, id: impl Into<String>) -> SelectedItem {
        let item = SelectedItem::bare(id);
        match &self.label_prefix {
            Some(prefix) if !item.id.is_empty() => {
                let label = format!("{} {}", prefix.trim(), item.id);
                SelectedItem::new(item.id, label)
            }
            _ => item,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint("selector"));
        }
        if self.field_name.trim().is_empty() {
            return Err(ConfigError::MissingFieldName);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedItem {
    pub id: String,
    pub label: String,
}

impl SelectedItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let id = normalize_id(&id.into());
        let label = label.into();
        let label = if label.trim().is_empty() { id.clone() } else { label };
        Self { id, label }
    }

    /// Value known only by id (e.g. taken from the URL); the id doubles as label.
    pub fn bare(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id)
    }
}

impl From<LookupItem> for SelectedItem {
    fn from(item: LookupItem) -> Self {
        Self::new(item.id, item.text)
    }
}

/// One form-submittable `name=value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub name: String,
    pub value: String,
}

/// Ordered selection owned by exactly one selector.
///
/// Single mode holds at most one item; multi mode holds unique ids in
/// insertion order, which is also the submission order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    mode: SelectorMode,
    items: Vec<SelectedItem>,
}

impl SelectionState {
    pub fn new(mode: SelectorMode) -> Self {
        Self {
            mode,
            items: Vec::new(),
        }
    }

    pub fn mode(&self) -> SelectorMode {
        self.mode
    }

    pub fn items(&self) -> &[SelectedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        let id = normalize_id(id);
        self.items.iter().any(|i| i.id == id)
    }

    /// Adds an item following the mode rules. Returns whether anything changed.
    ///
    /// Single mode swaps the previous item in one step. Multi mode ignores an
    /// id that is already selected.
    pub fn pick(&mut self, item: SelectedItem) -> bool {
        if item.id.is_empty() {
            return false;
        }
        match self.mode {
            SelectorMode::Single => {
                if self.items.len() == 1 && self.items[0] == item {
                    return false;
                }
                self.items = vec![item];
                true
            }
            SelectorMode::Multi => {
                if self.contains(&item.id) {
                    return false;
                }
                self.items.push(item);
                true
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let id = normalize_id(id);
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        before != self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn set_single(&mut self, item: SelectedItem) {
        self.items.clear();
        self.pick(item);
    }

    /// Adds each value in order; in single mode the last one wins.
    pub fn set_multi(&mut self, items: impl IntoIterator<Item = SelectedItem>) {
        for item in items {
            self.pick(item);
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.id.clone()).collect()
    }

    /// Field values to submit, one per selected item, in selection order.
    pub fn export(&self, field_name: &str) -> Vec<FieldValue> {
        self.items
            .iter()
            .map(|i| FieldValue {
                name: field_name.to_string(),
                value: i.id.clone(),
            })
            .collect()
    }
}
