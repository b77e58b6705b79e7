//! Incident and incident update operations.

use crate::client::InstatusClient;
use crate::errors::InstatusResult;
use crate::route::Route;
use crate::types::{ComponentStatus, Incident, IncidentStatus, IncidentUpdate};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Serialize;

const INCIDENTS: &str = "v1/{page_id}/incidents";
const INCIDENT: &str = "v1/{page_id}/incidents/{incident_id}";
const INCIDENT_UPDATES: &str = "v1/{page_id}/incidents/{incident_id}/incident-updates";
const INCIDENT_UPDATE: &str =
    "v1/{page_id}/incidents/{incident_id}/incident-updates/{incident_update_id}";

/// Service for incident operations.
pub struct IncidentsService<'a> {
    client: &'a InstatusClient,
}

impl<'a> IncidentsService<'a> {
    /// Creates a new incidents service.
    pub fn new(client: &'a InstatusClient) -> Self {
        Self { client }
    }

    /// Lists the incidents of a page.
    pub async fn list(&self, page_id: &str) -> InstatusResult<Vec<Incident>> {
        self.client
            .get(Route::new(Method::GET, INCIDENTS).param("page_id", page_id))
            .await
    }

    /// Gets an incident.
    pub async fn get(&self, page_id: &str, incident_id: &str) -> InstatusResult<Incident> {
        self.client
            .get(incident(Method::GET, page_id, incident_id))
            .await
    }

    /// Opens an incident.
    pub async fn create(
        &self,
        page_id: &str,
        request: &IncidentRequest,
    ) -> InstatusResult<Incident> {
        self.client
            .post(
                Route::new(Method::POST, INCIDENTS).param("page_id", page_id),
                request,
            )
            .await
    }

    /// Updates an incident.
    pub async fn update(
        &self,
        page_id: &str,
        incident_id: &str,
        request: &IncidentRequest,
    ) -> InstatusResult<Incident> {
        self.client
            .put(incident(Method::PUT, page_id, incident_id), request)
            .await
    }

    /// Deletes an incident.
    pub async fn delete(&self, page_id: &str, incident_id: &str) -> InstatusResult<()> {
        self.client
            .delete(incident(Method::DELETE, page_id, incident_id))
            .await
    }
}

/// Service for incident update operations.
pub struct IncidentUpdatesService<'a> {
    client: &'a InstatusClient,
}

impl<'a> IncidentUpdatesService<'a> {
    /// Creates a new incident updates service.
    pub fn new(client: &'a InstatusClient) -> Self {
        Self { client }
    }

    /// Gets an incident update.
    pub async fn get(
        &self,
        page_id: &str,
        incident_id: &str,
        incident_update_id: &str,
    ) -> InstatusResult<IncidentUpdate> {
        self.client
            .get(incident_update(Method::GET, page_id, incident_id, incident_update_id))
            .await
    }

    /// Posts an update to an incident.
    pub async fn create(
        &self,
        page_id: &str,
        incident_id: &str,
        request: &IncidentUpdateRequest,
    ) -> InstatusResult<IncidentUpdate> {
        let route = Route::new(Method::POST, INCIDENT_UPDATES)
            .param("page_id", page_id)
            .param("incident_id", incident_id);
        self.client.post(route, request).await
    }

    /// Edits an incident update.
    pub async fn update(
        &self,
        page_id: &str,
        incident_id: &str,
        incident_update_id: &str,
        request: &IncidentUpdateRequest,
    ) -> InstatusResult<IncidentUpdate> {
        self.client
            .put(
                incident_update(Method::PUT, page_id, incident_id, incident_update_id),
                request,
            )
            .await
    }

    /// Deletes an incident update.
    pub async fn delete(
        &self,
        page_id: &str,
        incident_id: &str,
        incident_update_id: &str,
    ) -> InstatusResult<()> {
        self.client
            .delete(incident_update(
                Method::DELETE,
                page_id,
                incident_id,
                incident_update_id,
            ))
            .await
    }
}

fn incident(method: Method, page_id: &str, incident_id: &str) -> Route {
    Route::new(method, INCIDENT)
        .param("page_id", page_id)
        .param("incident_id", incident_id)
}

fn incident_update(
    method: Method,
    page_id: &str,
    incident_id: &str,
    incident_update_id: &str,
) -> Route {
    Route::new(method, INCIDENT_UPDATE)
        .param("page_id", page_id)
        .param("incident_id", incident_id)
        .param("incident_update_id", incident_update_id)
}

/// New status of a component affected by an incident or maintenance.
#[derive(Debug, Clone, Serialize)]
pub struct AffectedComponent {
    /// Component ID.
    pub id: String,
    /// Status to set.
    pub status: ComponentStatus,
}

/// Request to open or update an incident. Unset fields are left out.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRequest {
    /// Title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// First update text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
    /// IDs of affected components.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    /// Status to set on each affected component.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<AffectedComponent>,
    /// Notify subscribers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify: Option<bool>,
    /// Start time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,
}

/// Request to post or edit an incident update. Unset fields are left out.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentUpdateRequest {
    /// Update text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Incident status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
    /// IDs of affected components.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    /// Status to set on each affected component.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<AffectedComponent>,
    /// Notify subscribers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify: Option<bool>,
    /// Publication time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_incident_request_body() {
        let request = IncidentRequest {
            name: Some("Elevated errors".into()),
            status: Some(IncidentStatus::Investigating),
            components: vec!["cmp-1".into()],
            statuses: vec![AffectedComponent {
                id: "cmp-1".into(),
                status: ComponentStatus::PartialOutage,
            }],
            notify: Some(true),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "name": "Elevated errors",
                "status": "INVESTIGATING",
                "components": ["cmp-1"],
                "statuses": [{ "id": "cmp-1", "status": "PARTIALOUTAGE" }],
                "notify": true
            })
        );
    }

    #[test]
    fn test_incident_update_route() {
        let route = incident_update(Method::DELETE, "p", "i", "u");
        assert_eq!(
            route.url("https://api.instatus.com/").unwrap(),
            "https://api.instatus.com/v1/p/incidents/i/incident-updates/u"
        );
    }
}
