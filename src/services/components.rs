//! Component operations.

use crate::client::InstatusClient;
use crate::errors::InstatusResult;
use crate::route::Route;
use crate::types::{Component, ComponentStatus};
use reqwest::Method;
use serde::Serialize;

const COMPONENTS: &str = "v1/{page_id}/components";
const COMPONENT: &str = "v1/{page_id}/components/{component_id}";

/// Service for component operations.
pub struct ComponentsService<'a> {
    client: &'a InstatusClient,
}

impl<'a> ComponentsService<'a> {
    /// Creates a new components service.
    pub fn new(client: &'a InstatusClient) -> Self {
        Self { client }
    }

    /// Lists the components of a page.
    pub async fn list(&self, page_id: &str) -> InstatusResult<Vec<Component>> {
        self.client
            .get(Route::new(Method::GET, COMPONENTS).param("page_id", page_id))
            .await
    }

    /// Gets a component.
    pub async fn get(&self, page_id: &str, component_id: &str) -> InstatusResult<Component> {
        self.client
            .get(component(Method::GET, page_id, component_id))
            .await
    }

    /// Creates a component.
    pub async fn create(
        &self,
        page_id: &str,
        request: &ComponentRequest,
    ) -> InstatusResult<Component> {
        self.client
            .post(
                Route::new(Method::POST, COMPONENTS).param("page_id", page_id),
                request,
            )
            .await
    }

    /// Updates a component.
    pub async fn update(
        &self,
        page_id: &str,
        component_id: &str,
        request: &ComponentRequest,
    ) -> InstatusResult<Component> {
        self.client
            .put(component(Method::PUT, page_id, component_id), request)
            .await
    }

    /// Deletes a component.
    pub async fn delete(&self, page_id: &str, component_id: &str) -> InstatusResult<()> {
        self.client
            .delete(component(Method::DELETE, page_id, component_id))
            .await
    }
}

fn component(method: Method, page_id: &str, component_id: &str) -> Route {
    Route::new(method, COMPONENT)
        .param("page_id", page_id)
        .param("component_id", component_id)
}

/// Request to create or update a component. Unset fields are left out.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRequest {
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ComponentStatus>,
    /// Sort position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Whether uptime is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_uptime: Option<bool>,
    /// Name of the group to place the component in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouped: Option<String>,
}

impl ComponentRequest {
    /// Creates a request naming the component.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Sets the status.
    pub fn status(mut self, status: ComponentStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_request_skips_unset_fields() {
        let request = ComponentRequest::named("API").status(ComponentStatus::MajorOutage);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "name": "API", "status": "MAJOROUTAGE" })
        );
    }

    #[test]
    fn test_component_routes_share_bucket() {
        let a = component(Method::GET, "p1", "c1");
        let b = component(Method::GET, "p2", "c2");
        assert_eq!(a.bucket(), b.bucket());
    }
}
