pub mod adzuna;

use crate::error::Result;
use crate::types::RawJob;

/// A job-search backend the acquisition step can page through.
#[async_trait::async_trait]
pub trait JobSource: Send + Sync {
    /// Unique identifier for this source
    fn source_name(&self) -> &'static str;

    /// Fetch one result page for a country and search keyword. Pages start at 1.
    async fn fetch_page(&self, country_code: &str, keyword: &str, page: u32)
        -> Result<Vec<RawJob>>;
}
