//! Custom metric operations.

use crate::client::InstatusClient;
use crate::errors::InstatusResult;
use crate::route::Route;
use crate::types::{DataPoint, Metric};
use reqwest::Method;
use serde::{Deserialize, Serialize};

const METRICS: &str = "v1/{page_id}/metrics";
const METRIC: &str = "v1/{page_id}/metrics/{metric_id}";
const METRIC_DATA: &str = "v1/{page_id}/metrics/{metric_id}/data";

/// Service for custom metric operations.
pub struct MetricsService<'a> {
    client: &'a InstatusClient,
}

impl<'a> MetricsService<'a> {
    /// Creates a new metrics service.
    pub fn new(client: &'a InstatusClient) -> Self {
        Self { client }
    }

    /// Lists the metrics of a page.
    pub async fn list(&self, page_id: &str) -> InstatusResult<Vec<Metric>> {
        self.client
            .get(Route::new(Method::GET, METRICS).param("page_id", page_id))
            .await
    }

    /// Gets a metric with its data.
    pub async fn get(&self, page_id: &str, metric_id: &str) -> InstatusResult<Metric> {
        self.client
            .get(metric(Method::GET, METRIC, page_id, metric_id))
            .await
    }

    /// Creates a metric.
    pub async fn create(&self, page_id: &str, request: &MetricRequest) -> InstatusResult<Metric> {
        self.client
            .post(
                Route::new(Method::POST, METRICS).param("page_id", page_id),
                request,
            )
            .await
    }

    /// Updates a metric.
    pub async fn update(
        &self,
        page_id: &str,
        metric_id: &str,
        request: &MetricRequest,
    ) -> InstatusResult<Metric> {
        self.client
            .put(metric(Method::PUT, METRIC, page_id, metric_id), request)
            .await
    }

    /// Deletes a metric.
    pub async fn delete(&self, page_id: &str, metric_id: &str) -> InstatusResult<()> {
        self.client
            .delete(metric(Method::DELETE, METRIC, page_id, metric_id))
            .await
    }

    /// Records one value.
    pub async fn add_data_point(
        &self,
        page_id: &str,
        metric_id: &str,
        point: DataPoint,
    ) -> InstatusResult<DataPoint> {
        self.client
            .post(metric(Method::POST, METRIC, page_id, metric_id), &point)
            .await
    }

    /// Records several values in one request.
    pub async fn add_data_points(
        &self,
        page_id: &str,
        metric_id: &str,
        points: &[DataPoint],
    ) -> InstatusResult<DataPointCount> {
        self.client
            .post(
                metric(Method::POST, METRIC_DATA, page_id, metric_id),
                &DataPoints { data: points },
            )
            .await
    }

    /// Deletes every recorded value of a metric.
    pub async fn delete_data_points(&self, page_id: &str, metric_id: &str) -> InstatusResult<()> {
        self.client
            .delete(metric(Method::DELETE, METRIC_DATA, page_id, metric_id))
            .await
    }
}

fn metric(method: Method, template: &str, page_id: &str, metric_id: &str) -> Route {
    Route::new(method, template)
        .param("page_id", page_id)
        .param("metric_id", metric_id)
}

#[derive(Serialize)]
struct DataPoints<'a> {
    data: &'a [DataPoint],
}

/// Outcome of a bulk data point upload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataPointCount {
    /// Values stored.
    #[serde(default)]
    pub count: u64,
}

/// Request to create or update a metric. Unset fields are left out.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRequest {
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unit suffix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Sort position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bulk_body() {
        let points = [DataPoint::new(1, 2.0), DataPoint::new(2, 3.5)];
        assert_eq!(
            serde_json::to_value(DataPoints { data: &points }).unwrap(),
            json!({ "data": [{ "timestamp": 1, "value": 2.0 }, { "timestamp": 2, "value": 3.5 }] })
        );
    }

    #[test]
    fn test_data_and_metric_routes_are_separate_buckets() {
        let single = metric(Method::POST, METRIC, "p", "m");
        let bulk = metric(Method::POST, METRIC_DATA, "p", "m");
        assert_ne!(single.bucket(), bulk.bucket());
    }
}
