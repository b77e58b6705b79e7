//! Core data types for the Instatus API.
//!
//! Every model keeps fields it does not know about in `extra`, so values
//! added to the API later survive a round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unknown fields carried alongside a model.
pub type Extra = Map<String, Value>;

/// Component status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComponentStatus {
    /// Working normally.
    Operational,
    /// Under scheduled maintenance.
    UnderMaintenance,
    /// Slower than usual.
    DegradedPerformance,
    /// Partly unavailable.
    PartialOutage,
    /// Unavailable.
    MajorOutage,
    /// A status this client does not know.
    #[serde(other)]
    Unknown,
}

/// Incident status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IncidentStatus {
    /// Cause not yet known.
    Investigating,
    /// Cause known.
    Identified,
    /// Fix deployed, watching.
    Monitoring,
    /// Over.
    Resolved,
    /// A status this client does not know.
    #[serde(other)]
    Unknown,
}

/// Maintenance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaintenanceStatus {
    /// Scheduled, not started.
    NotStartedYet,
    /// Running.
    InProgress,
    /// Finished.
    Completed,
    /// A status this client does not know.
    #[serde(other)]
    Unknown,
}

/// Status page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPage {
    /// Page ID.
    pub id: String,
    /// Subdomain under instatus.com.
    #[serde(default)]
    pub subdomain: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Overall status.
    #[serde(default)]
    pub status: Option<String>,
    /// Custom domain.
    #[serde(default)]
    pub custom_domain: Option<String>,
    /// Logo URL.
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Website URL.
    #[serde(default)]
    pub website_url: Option<String>,
    /// Public contact email.
    #[serde(default)]
    pub public_email: Option<String>,
    /// Page language.
    #[serde(default)]
    pub language: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Component of a status page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Component ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Current status.
    pub status: ComponentStatus,
    /// Sort position.
    #[serde(default)]
    pub order: Option<i64>,
    /// Whether uptime is shown.
    #[serde(default)]
    pub show_uptime: Option<bool>,
    /// Group the component belongs to.
    #[serde(default)]
    pub group_id: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Incident ID.
    pub id: String,
    /// Title.
    pub name: String,
    /// Current status.
    pub status: IncidentStatus,
    /// Start time.
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    /// Resolution time.
    #[serde(default)]
    pub resolved: Option<DateTime<Utc>>,
    /// Updates posted so far.
    #[serde(default)]
    pub updates: Vec<IncidentUpdate>,
    /// Affected components.
    #[serde(default)]
    pub components: Vec<Component>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Update posted to an incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentUpdate {
    /// Update ID.
    pub id: String,
    /// Update text.
    #[serde(default)]
    pub message: Option<String>,
    /// Incident status at the time of the update.
    #[serde(default)]
    pub status: Option<IncidentStatus>,
    /// Whether subscribers were notified.
    #[serde(default)]
    pub notify: Option<bool>,
    /// Publication time.
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Scheduled maintenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Maintenance {
    /// Maintenance ID.
    pub id: String,
    /// Title.
    pub name: String,
    /// Current status.
    pub status: MaintenanceStatus,
    /// Planned start.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    /// Planned duration in minutes.
    #[serde(default)]
    pub duration: Option<i64>,
    /// Start automatically at `start`.
    #[serde(default)]
    pub auto_start: Option<bool>,
    /// End automatically after `duration`.
    #[serde(default)]
    pub auto_end: Option<bool>,
    /// Updates posted so far.
    #[serde(default)]
    pub updates: Vec<MaintenanceUpdate>,
    /// Affected components.
    #[serde(default)]
    pub components: Vec<Component>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Update posted to a maintenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceUpdate {
    /// Update ID.
    pub id: String,
    /// Update text.
    #[serde(default)]
    pub message: Option<String>,
    /// Maintenance status at the time of the update.
    #[serde(default)]
    pub status: Option<MaintenanceStatus>,
    /// Whether subscribers were notified.
    #[serde(default)]
    pub notify: Option<bool>,
    /// Publication time.
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Member of a page's team.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    /// Member ID.
    pub id: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Role on the page.
    #[serde(default)]
    pub role: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Page subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    /// Subscriber ID.
    pub id: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number for SMS.
    #[serde(default)]
    pub phone: Option<String>,
    /// Webhook URL.
    #[serde(default)]
    pub webhook: Option<String>,
    /// Subscribed to every component.
    #[serde(default)]
    pub all_components: Option<bool>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Custom metric shown on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    /// Metric ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Unit suffix.
    #[serde(default)]
    pub suffix: Option<String>,
    /// Sort position.
    #[serde(default)]
    pub order: Option<i64>,
    /// Recorded values.
    #[serde(default)]
    pub data: Vec<DataPoint>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Extra,
}

/// One metric value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Value.
    pub value: f64,
}

impl DataPoint {
    /// Creates a data point.
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Creates a data point stamped with `at`.
    pub fn at(at: DateTime<Utc>, value: f64) -> Self {
        Self::new(at.timestamp_millis(), value)
    }
}

/// Profile of the API key's owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User ID.
    pub id: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Name.
    #[serde(default)]
    pub name: Option<String>,
    /// URL slug.
    #[serde(default)]
    pub slug: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Public `summary.json` of a status page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Page overview.
    pub page: SummaryPage,
    /// Incidents not yet resolved.
    #[serde(default)]
    pub active_incidents: Vec<Value>,
    /// Maintenances not yet completed.
    #[serde(default)]
    pub active_maintenances: Vec<Value>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Extra,
}

/// Page section of a summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryPage {
    /// Display name.
    pub name: String,
    /// Public URL.
    pub url: String,
    /// Overall status, such as `UP` or `HASISSUES`.
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_keeps_unknown_fields() {
        let component: Component = serde_json::from_value(json!({
            "id": "cmp-1",
            "name": "API",
            "status": "DEGRADEDPERFORMANCE",
            "showUptime": true,
            "uniqueEmail": "api@mail.instatus.com"
        }))
        .unwrap();

        assert_eq!(component.status, ComponentStatus::DegradedPerformance);
        assert_eq!(component.show_uptime, Some(true));
        assert_eq!(
            component.extra.get("uniqueEmail"),
            Some(&json!("api@mail.instatus.com"))
        );
    }

    #[test]
    fn test_unknown_status() {
        let status: IncidentStatus = serde_json::from_value(json!("POSTMORTEM")).unwrap();
        assert_eq!(status, IncidentStatus::Unknown);
    }

    #[test]
    fn test_maintenance_status_names() {
        assert_eq!(
            serde_json::to_value(MaintenanceStatus::NotStartedYet).unwrap(),
            json!("NOTSTARTEDYET")
        );
    }

    #[test]
    fn test_incident_with_updates() {
        let incident: Incident = serde_json::from_value(json!({
            "id": "inc-1",
            "name": "Elevated errors",
            "status": "MONITORING",
            "started": "2024-03-01T10:00:00.000Z",
            "updates": [{ "id": "upd-1", "message": "Fix deployed", "status": "MONITORING" }]
        }))
        .unwrap();

        assert_eq!(incident.updates.len(), 1);
        assert_eq!(incident.updates[0].status, Some(IncidentStatus::Monitoring));
        assert!(incident.resolved.is_none());
    }

    #[test]
    fn test_data_point_from_time() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(DataPoint::at(at, 1.5).timestamp, 1_700_000_000_000);
    }
}
