//! Maintenance and maintenance update operations.

use crate::client::InstatusClient;
use crate::errors::InstatusResult;
use crate::route::Route;
use crate::services::AffectedComponent;
use crate::types::{Maintenance, MaintenanceStatus, MaintenanceUpdate};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Serialize;

const MAINTENANCES: &str = "v1/{page_id}/maintenances";
const MAINTENANCE: &str = "v1/{page_id}/maintenances/{maintenance_id}";
const MAINTENANCE_UPDATES: &str = "v1/{page_id}/maintenances/{maintenance_id}/maintenance-updates";
const MAINTENANCE_UPDATE: &str =
    "v1/{page_id}/maintenances/{maintenance_id}/maintenance-updates/{maintenance_update_id}";

/// Service for maintenance operations.
pub struct MaintenancesService<'a> {
    client: &'a InstatusClient,
}

impl<'a> MaintenancesService<'a> {
    /// Creates a new maintenances service.
    pub fn new(client: &'a InstatusClient) -> Self {
        Self { client }
    }

    /// Lists the maintenances of a page.
    pub async fn list(&self, page_id: &str) -> InstatusResult<Vec<Maintenance>> {
        self.client
            .get(Route::new(Method::GET, MAINTENANCES).param("page_id", page_id))
            .await
    }

    /// Gets a maintenance.
    pub async fn get(&self, page_id: &str, maintenance_id: &str) -> InstatusResult<Maintenance> {
        self.client
            .get(maintenance(Method::GET, page_id, maintenance_id))
            .await
    }

    /// Schedules a maintenance.
    pub async fn create(
        &self,
        page_id: &str,
        request: &MaintenanceRequest,
    ) -> InstatusResult<Maintenance> {
        self.client
            .post(
                Route::new(Method::POST, MAINTENANCES).param("page_id", page_id),
                request,
            )
            .await
    }

    /// Updates a maintenance.
    pub async fn update(
        &self,
        page_id: &str,
        maintenance_id: &str,
        request: &MaintenanceRequest,
    ) -> InstatusResult<Maintenance> {
        self.client
            .put(maintenance(Method::PUT, page_id, maintenance_id), request)
            .await
    }

    /// Deletes a maintenance.
    pub async fn delete(&self, page_id: &str, maintenance_id: &str) -> InstatusResult<()> {
        self.client
            .delete(maintenance(Method::DELETE, page_id, maintenance_id))
            .await
    }
}

/// Service for maintenance update operations.
pub struct MaintenanceUpdatesService<'a> {
    client: &'a InstatusClient,
}

impl<'a> MaintenanceUpdatesService<'a> {
    /// Creates a new maintenance updates service.
    pub fn new(client: &'a InstatusClient) -> Self {
        Self { client }
    }

    /// Gets a maintenance update.
    pub async fn get(
        &self,
        page_id: &str,
        maintenance_id: &str,
        maintenance_update_id: &str,
    ) -> InstatusResult<MaintenanceUpdate> {
        self.client
            .get(maintenance_update(
                Method::GET,
                page_id,
                maintenance_id,
                maintenance_update_id,
            ))
            .await
    }

    /// Posts an update to a maintenance.
    pub async fn create(
        &self,
        page_id: &str,
        maintenance_id: &str,
        request: &MaintenanceUpdateRequest,
    ) -> InstatusResult<MaintenanceUpdate> {
        let route = Route::new(Method::POST, MAINTENANCE_UPDATES)
            .param("page_id", page_id)
            .param("maintenance_id", maintenance_id);
        self.client.post(route, request).await
    }

    /// Edits a maintenance update.
    pub async fn update(
        &self,
        page_id: &str,
        maintenance_id: &str,
        maintenance_update_id: &str,
        request: &MaintenanceUpdateRequest,
    ) -> InstatusResult<MaintenanceUpdate> {
        self.client
            .put(
                maintenance_update(Method::PUT, page_id, maintenance_id, maintenance_update_id),
                request,
            )
            .await
    }

    /// Deletes a maintenance update.
    pub async fn delete(
        &self,
        page_id: &str,
        maintenance_id: &str,
        maintenance_update_id: &str,
    ) -> InstatusResult<()> {
        self.client
            .delete(maintenance_update(
                Method::DELETE,
                page_id,
                maintenance_id,
                maintenance_update_id,
            ))
            .await
    }
}

fn maintenance(method: Method, page_id: &str, maintenance_id: &str) -> Route {
    Route::new(method, MAINTENANCE)
        .param("page_id", page_id)
        .param("maintenance_id", maintenance_id)
}

fn maintenance_update(
    method: Method,
    page_id: &str,
    maintenance_id: &str,
    maintenance_update_id: &str,
) -> Route {
    Route::new(method, MAINTENANCE_UPDATE)
        .param("page_id", page_id)
        .param("maintenance_id", maintenance_id)
        .param("maintenance_update_id", maintenance_update_id)
}

/// Request to schedule or update a maintenance. Unset fields are left out.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRequest {
    /// Title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// First update text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MaintenanceStatus>,
    /// Planned start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    /// Planned duration in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    /// Start automatically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
    /// End automatically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_end: Option<bool>,
    /// IDs of affected components.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    /// Status to set on each affected component.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<AffectedComponent>,
    /// Notify subscribers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify: Option<bool>,
}

/// Request to post or edit a maintenance update. Unset fields are left out.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceUpdateRequest {
    /// Update text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Maintenance status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MaintenanceStatus>,
    /// Status to set on each affected component.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<AffectedComponent>,
    /// Notify subscribers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maintenance_request_uses_camel_case() {
        let request = MaintenanceRequest {
            auto_start: Some(true),
            duration: Some(60),
            ..Default::default()
        };
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["autoStart"], true);
        assert_eq!(body["duration"], 60);
        assert!(body.get("components").is_none());
    }
}
