//! Public status summary.

use crate::client::InstatusClient;
use crate::errors::InstatusResult;
use crate::route::Route;
use crate::types::Summary;
use reqwest::Method;

/// Service for the public `summary.json` of a page.
pub struct SummaryService<'a> {
    client: &'a InstatusClient,
}

impl<'a> SummaryService<'a> {
    /// Creates a new summary service.
    pub fn new(client: &'a InstatusClient) -> Self {
        Self { client }
    }

    /// Fetches `https://{subdomain}.instatus.com/summary.json`.
    pub async fn get(&self, subdomain: &str) -> InstatusResult<Summary> {
        self.get_url(&summary_url(subdomain)).await
    }

    /// Fetches a summary from a custom domain, e.g. `https://status.example.com/summary.json`.
    pub async fn get_url(&self, url: &str) -> InstatusResult<Summary> {
        self.client.get(Route::absolute(Method::GET, url)).await
    }
}

/// Builds the summary URL for an instatus.com subdomain.
pub fn summary_url(subdomain: &str) -> String {
    format!("https://{}.instatus.com/summary.json", subdomain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_url() {
        assert_eq!(summary_url("acme"), "https://acme.instatus.com/summary.json");
    }
}
