//! Status page operations.

use crate::client::InstatusClient;
use crate::errors::InstatusResult;
use crate::route::Route;
use crate::types::StatusPage;
use reqwest::Method;
use serde::Serialize;

/// Service for status page operations.
pub struct PagesService<'a> {
    client: &'a InstatusClient,
}

impl<'a> PagesService<'a> {
    /// Creates a new pages service.
    pub fn new(client: &'a InstatusClient) -> Self {
        Self { client }
    }

    /// Lists the pages of the workspace.
    pub async fn list(&self) -> InstatusResult<Vec<StatusPage>> {
        self.client.get(Route::new(Method::GET, "v1/pages")).await
    }

    /// Creates a page.
    pub async fn create(&self, request: &CreatePageRequest) -> InstatusResult<StatusPage> {
        self.client
            .post(Route::new(Method::POST, "v1/pages"), request)
            .await
    }

    /// Updates a page.
    pub async fn update(
        &self,
        page_id: &str,
        request: &UpdatePageRequest,
    ) -> InstatusResult<StatusPage> {
        self.client
            .put(Route::new(Method::PUT, "v1/{page_id}").param("page_id", page_id), request)
            .await
    }

    /// Deletes a page.
    pub async fn delete(&self, page_id: &str) -> InstatusResult<()> {
        self.client
            .delete(Route::new(Method::DELETE, "v1/{page_id}").param("page_id", page_id))
            .await
    }
}

/// Request to create a page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePageRequest {
    /// Page name.
    pub name: String,
    /// Subdomain under instatus.com.
    pub subdomain: String,
    /// Email of the page owner.
    pub email: String,
    /// Initial component names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    /// Page language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Request to update a page. Unset fields are left as they are.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePageRequest {
    /// Page name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Subdomain under instatus.com.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    /// Custom domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    /// Logo URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Website URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    /// Public contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_email: Option<String>,
    /// Page language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}
