use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One locality matching a zip code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZipLookupResult {
    #[serde(default, deserialize_with = "loose_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Body returned by `GET /api/zip/{code}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    /// Required: a body without a `results` array fails to decode.
    pub results: Vec<ZipLookupResult>,
}

/// Accept any JSON value for a text field. Strings and non-zero numbers
/// become text, `true` becomes `"true"`; `null`, `false`, `0`, arrays and
/// objects carry no text.
fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    };
    Ok(text)
}

/// Field writes implied by a lookup response. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fill {
    pub state: Option<String>,
    pub city: Option<String>,
}

impl Fill {
    /// State comes from the first entry; city only when the entries agree
    /// on exactly one non-empty name.
    pub fn from_response(response: &LookupResponse) -> Self {
        let state = response
            .results
            .first()
            .map(|r| r.state.clone().unwrap_or_default());

        let cities: BTreeSet<&str> = response
            .results
            .iter()
            .filter_map(|r| r.city.as_deref())
            .filter(|c| !c.is_empty())
            .collect();

        let city = match cities.len() {
            1 => cities.first().map(|c| c.to_string()),
            _ => None,
        };

        Self { state, city }
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.city.is_none()
    }
}
