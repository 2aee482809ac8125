//! ABOUTME: Web search client trait implemented by whichever search vendor is configured

use crate::error::Result;
use async_trait::async_trait;
use groundcrew_core::WebResult;

#[async_trait]
pub trait WebSearchClient: Send + Sync {
    async fn search(&self, query: &str, k: u32) -> Result<Vec<WebResult>>;
}
