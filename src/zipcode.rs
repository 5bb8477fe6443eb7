use std::sync::LazyLock;

use regex::Regex;

use crate::types::ZipLookupResult;

/// Number of digits in a US zip code
pub const ZIP_LEN: usize = 5;

// `\D` would let non-ASCII digits through.
static NON_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9]").expect("static pattern is valid"));

/// Strip everything but ASCII digits and clamp to five characters.
pub fn sanitize_zip(raw: &str) -> String {
    let mut zip = NON_DIGIT.replace_all(raw, "").into_owned();
    zip.truncate(ZIP_LEN);
    zip
}

/// True when `code` is exactly five ASCII digits
pub fn is_complete(code: &str) -> bool {
    code.len() == ZIP_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Normalize a path parameter the way the lookup endpoint keys its data:
/// trim, left-pad with zeros, keep the first five characters.
pub fn normalize_lookup_code(raw: &str) -> String {
    let trimmed = raw.trim();
    let padded = format!("{:0>width$}", trimmed, width = ZIP_LEN);
    padded.chars().take(ZIP_LEN).collect()
}

/// Look up every city/state the bundled database has for a US zip code
pub fn lookup_zipcode(zip: &str) -> Vec<ZipLookupResult> {
    // Avoid zipcodes::matching to suppress debug_print output.
    let Ok(matches) = zipcodes::filter_by(vec![|z: &zipcodes::Zipcode| z.zip_code == zip], None) else {
        return Vec::new();
    };

    let mut results: Vec<ZipLookupResult> = matches
        .iter()
        .map(|info| ZipLookupResult {
            city: Some(info.city.clone()),
            state: Some(info.state.clone()),
            latitude: info.lat.trim().parse().ok(),
            longitude: info.long.trim().parse().ok(),
        })
        .collect();
    results.sort_by(|a, b| (&a.state, &a.city).cmp(&(&b.state, &b.city)));
    results
}
