//! Zip code autofill bound to a zip, a city and a state input.
//!
//! [`ZipAutofill::on_input`] runs on every keystroke in the zip field and
//! decides whether a lookup is due. [`ZipAutofill::apply`] writes whatever a
//! settled lookup implies. Issuing the lookup in between is the caller's job
//! (see [`crate::driver`]), so the widget itself never awaits.

use crate::page::{CITY_INPUT_ID, FormField, Page, STATE_INPUT_ID, ZIP_INPUT_ID};
use crate::types::{Fill, LookupResponse};
use crate::zipcode::{is_complete, sanitize_zip};

pub struct ZipAutofill<F> {
    zip: F,
    city: F,
    state: F,
    /// Last code that triggered a lookup. Never reset.
    last: String,
}

impl<F: FormField> ZipAutofill<F> {
    /// Bind to the page's zip, city and state inputs.
    ///
    /// Returns `None` when any of them is missing; the page then simply has
    /// no autofill.
    pub fn bind<P>(page: &P) -> Option<Self>
    where
        P: Page<Field = F>,
    {
        let zip = page.element_by_id(ZIP_INPUT_ID);
        let city = page.element_by_id(CITY_INPUT_ID);
        let state = page.element_by_id(STATE_INPUT_ID);

        match (zip, city, state) {
            (Some(zip), Some(city), Some(state)) => Some(Self::new(zip, city, state)),
            _ => {
                tracing::debug!("zip autofill inputs not found, not binding");
                None
            }
        }
    }

    pub fn new(zip: F, city: F, state: F) -> Self {
        Self {
            zip,
            city,
            state,
            last: String::new(),
        }
    }

    /// Handle a keystroke in the zip field.
    ///
    /// Echoes the sanitized value back into the field and returns the code
    /// to look up, if any. The code is remembered before returning so a
    /// repeat of the same code never triggers again.
    pub fn on_input(&mut self) -> Option<String> {
        let zip = sanitize_zip(&self.zip.value());
        self.zip.set_value(&zip);

        if !is_complete(&zip) || zip == self.last {
            return None;
        }

        tracing::debug!(zip = %zip, "zip lookup triggered");
        self.last.clone_from(&zip);
        Some(zip)
    }

    /// Replace the zip field's raw value and handle the keystroke in one
    /// step. Returns what [`on_input`](Self::on_input) returns.
    pub fn type_value(&mut self, raw: &str) -> Option<String> {
        self.zip.set_value(raw);
        self.on_input()
    }

    /// Current (sanitized) value of the zip field
    pub fn zip_value(&self) -> String {
        self.zip.value()
    }

    /// Apply a settled lookup. `None` means the lookup produced no data and
    /// nothing is touched.
    pub fn apply(&self, response: Option<&LookupResponse>) -> Option<Fill> {
        let fill = Fill::from_response(response?);

        if let Some(state) = &fill.state {
            self.state.set_value(state);
        }
        if let Some(city) = &fill.city {
            self.city.set_value(city);
        }

        tracing::debug!(state = ?fill.state, city = ?fill.city, "zip autofill applied");
        Some(fill)
    }

    pub fn last_triggered(&self) -> &str {
        &self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{MemoryField, MemoryPage};
    use crate::types::ZipLookupResult;

    type Widget = ZipAutofill<MemoryField>;

    fn bound() -> (MemoryPage, Widget) {
        let page = MemoryPage::address_form();
        let widget = ZipAutofill::bind(&page).expect("all inputs present");
        (page, widget)
    }

    fn type_zip(page: &MemoryPage, widget: &mut Widget, raw: &str) -> Option<String> {
        page.element_by_id(ZIP_INPUT_ID).unwrap().set_value(raw);
        widget.on_input()
    }

    fn response(entries: &[(&str, &str)]) -> LookupResponse {
        LookupResponse {
            zip_code: None,
            results: entries
                .iter()
                .map(|(city, state)| ZipLookupResult {
                    city: Some(city.to_string()),
                    state: Some(state.to_string()),
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn test_bind_requires_all_inputs() {
        for missing in [ZIP_INPUT_ID, CITY_INPUT_ID, STATE_INPUT_ID] {
            let mut page = MemoryPage::address_form();
            page.remove(missing);
            assert!(ZipAutofill::bind(&page).is_none(), "bound without {}", missing);
        }
        assert!(ZipAutofill::bind(&MemoryPage::new()).is_none());
    }

    #[test]
    fn test_input_echoes_sanitized_value() {
        let (page, mut widget) = bound();
        assert_eq!(type_zip(&page, &mut widget, "9a02"), None);
        assert_eq!(page.value_of(ZIP_INPUT_ID).as_deref(), Some("902"));

        assert_eq!(type_zip(&page, &mut widget, "90210-1234"), Some("90210".to_string()));
        assert_eq!(page.value_of(ZIP_INPUT_ID).as_deref(), Some("90210"));
    }

    #[test]
    fn test_no_trigger_below_five_digits() {
        let (page, mut widget) = bound();
        for raw in ["", "1", "12", "123", "1234", "12-34", "abcd"] {
            assert_eq!(type_zip(&page, &mut widget, raw), None);
        }
        assert_eq!(widget.last_triggered(), "");
    }

    #[test]
    fn test_dedup_same_code() {
        let (page, mut widget) = bound();
        assert_eq!(type_zip(&page, &mut widget, "12345"), Some("12345".to_string()));
        assert_eq!(type_zip(&page, &mut widget, "12345"), None);
        // Extra keystroke past five digits is clamped back to the same code
        assert_eq!(type_zip(&page, &mut widget, "123456"), None);
        assert_eq!(widget.last_triggered(), "12345");
    }

    #[test]
    fn test_dedup_survives_edit_and_retype() {
        let (page, mut widget) = bound();
        assert!(type_zip(&page, &mut widget, "12345").is_some());
        assert_eq!(type_zip(&page, &mut widget, "1234"), None);
        assert_eq!(type_zip(&page, &mut widget, ""), None);
        assert_eq!(type_zip(&page, &mut widget, "12345"), None);
    }

    #[test]
    fn test_new_code_triggers_again() {
        let (page, mut widget) = bound();
        assert!(type_zip(&page, &mut widget, "12345").is_some());
        assert_eq!(type_zip(&page, &mut widget, "54321"), Some("54321".to_string()));
        assert_eq!(type_zip(&page, &mut widget, "12345"), Some("12345".to_string()));
    }

    #[test]
    fn test_apply_single_city() {
        let (page, widget) = bound();
        let fill = widget.apply(Some(&response(&[("Beverly Hills", "CA")])));
        assert!(fill.is_some());
        assert_eq!(page.value_of(CITY_INPUT_ID).as_deref(), Some("Beverly Hills"));
        assert_eq!(page.value_of(STATE_INPUT_ID).as_deref(), Some("CA"));
    }

    #[test]
    fn test_apply_ambiguous_city_keeps_city() {
        let (page, widget) = bound();
        page.element_by_id(CITY_INPUT_ID).unwrap().set_value("typed by hand");
        widget.apply(Some(&response(&[("New York", "NY"), ("Brooklyn", "NY")])));
        assert_eq!(page.value_of(CITY_INPUT_ID).as_deref(), Some("typed by hand"));
        assert_eq!(page.value_of(STATE_INPUT_ID).as_deref(), Some("NY"));
    }

    #[test]
    fn test_apply_empty_results_keeps_fields() {
        let (page, widget) = bound();
        page.element_by_id(CITY_INPUT_ID).unwrap().set_value("Austin");
        page.element_by_id(STATE_INPUT_ID).unwrap().set_value("TX");
        let fill = widget.apply(Some(&LookupResponse::default()));
        assert_eq!(fill, Some(Fill::default()));
        assert_eq!(page.value_of(CITY_INPUT_ID).as_deref(), Some("Austin"));
        assert_eq!(page.value_of(STATE_INPUT_ID).as_deref(), Some("TX"));
    }

    #[test]
    fn test_apply_no_data_is_noop() {
        let (page, widget) = bound();
        page.element_by_id(CITY_INPUT_ID).unwrap().set_value("Austin");
        page.element_by_id(STATE_INPUT_ID).unwrap().set_value("TX");
        assert_eq!(widget.apply(None), None);
        assert_eq!(page.value_of(CITY_INPUT_ID).as_deref(), Some("Austin"));
        assert_eq!(page.value_of(STATE_INPUT_ID).as_deref(), Some("TX"));
    }

    #[test]
    fn test_type_value_handles_each_value() {
        let (page, mut widget) = bound();
        assert_eq!(widget.type_value("1111a1"), Some("11111".to_string()));
        assert_eq!(widget.zip_value(), "11111");
        assert_eq!(widget.type_value("22222"), Some("22222".to_string()));
        assert_eq!(widget.type_value("2222"), None);
        assert_eq!(page.value_of(ZIP_INPUT_ID).as_deref(), Some("2222"));
    }
}
