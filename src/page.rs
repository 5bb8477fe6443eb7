//! Form surface the autofill widget reads and writes.
//!
//! The host page owns its input elements. The widget only holds handles
//! obtained through [`Page::element_by_id`] and touches them through
//! [`FormField`]. [`MemoryPage`] is a headless page used by the command-line
//! driver and by tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

pub const ZIP_INPUT_ID: &str = "zipInput";
pub const CITY_INPUT_ID: &str = "cityInput";
pub const STATE_INPUT_ID: &str = "stateInput";

/// A text input whose `value` can be read and replaced
pub trait FormField {
    fn value(&self) -> String;
    fn set_value(&self, value: &str);
}

/// Element lookup by identifier
pub trait Page {
    type Field: FormField;

    fn element_by_id(&self, id: &str) -> Option<Self::Field>;
}

/// Shared handle to an in-memory text input. Clones see the same value.
#[derive(Debug, Clone, Default)]
pub struct MemoryField {
    value: Arc<Mutex<String>>,
}

impl MemoryField {
    pub fn new(value: &str) -> Self {
        Self {
            value: Arc::new(Mutex::new(value.to_string())),
        }
    }
}

impl FormField for MemoryField {
    fn value(&self) -> String {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_value(&self, value: &str) {
        let mut guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        guard.clear();
        guard.push_str(value);
    }
}

/// Headless page holding named inputs
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    fields: HashMap<String, MemoryField>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page with empty zip, city and state inputs
    pub fn address_form() -> Self {
        let mut page = Self::new();
        for id in [ZIP_INPUT_ID, CITY_INPUT_ID, STATE_INPUT_ID] {
            page.insert(id);
        }
        page
    }

    /// Add an empty input, returning its handle
    pub fn insert(&mut self, id: &str) -> MemoryField {
        self.fields.entry(id.to_string()).or_default().clone()
    }

    pub fn remove(&mut self, id: &str) -> Option<MemoryField> {
        self.fields.remove(id)
    }

    /// Current value of an input, if present
    pub fn value_of(&self, id: &str) -> Option<String> {
        self.fields.get(id).map(|field| field.value())
    }
}

impl Page for MemoryPage {
    type Field = MemoryField;

    fn element_by_id(&self, id: &str) -> Option<MemoryField> {
        self.fields.get(id).cloned()
    }
}
