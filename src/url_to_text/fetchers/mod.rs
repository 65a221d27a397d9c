use async_trait::async_trait;

use crate::error::BoxError;

mod request;

pub use request::RequestFetcher;

/// A fetched page, after redirects.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub status: u16,
    pub body: String,
    pub final_url: String,
}

impl FetchedDocument {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, BoxError>;
}
