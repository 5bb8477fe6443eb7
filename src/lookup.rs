use std::future::Future;

use crate::types::LookupResponse;

/// Source of zip code lookups.
///
/// Every failure (transport, status, decode) comes back as `None`; there is
/// no separate error channel.
pub trait ZipLookup: Send + Sync + 'static {
    fn lookup(&self, code: &str) -> impl Future<Output = Option<LookupResponse>> + Send;
}
