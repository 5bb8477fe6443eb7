pub mod client;
pub mod driver;
pub mod lookup;
pub mod page;
pub mod types;
pub mod widget;
pub mod zipcode;

pub use client::{LookupConfig, ZipLookupClient};
pub use driver::{AutofillEvent, AutofillHandle, LookupSettled, spawn_autofill};
pub use lookup::ZipLookup;
pub use page::{FormField, MemoryField, MemoryPage, Page};
pub use types::{Fill, LookupResponse, ZipLookupResult};
pub use widget::ZipAutofill;
pub use zipcode::{lookup_zipcode, normalize_lookup_code, sanitize_zip};
