//! Subscriber operations.

use crate::client::InstatusClient;
use crate::errors::InstatusResult;
use crate::route::Route;
use crate::types::Subscriber;
use reqwest::Method;
use serde::Serialize;

const SUBSCRIBERS: &str = "v1/{page_id}/subscribers";

/// Service for subscriber operations.
pub struct SubscribersService<'a> {
    client: &'a InstatusClient,
}

impl<'a> SubscribersService<'a> {
    /// Creates a new subscribers service.
    pub fn new(client: &'a InstatusClient) -> Self {
        Self { client }
    }

    /// Lists the subscribers of a page.
    pub async fn list(&self, page_id: &str) -> InstatusResult<Vec<Subscriber>> {
        self.client
            .get(Route::new(Method::GET, SUBSCRIBERS).param("page_id", page_id))
            .await
    }

    /// Adds a subscriber.
    pub async fn add(
        &self,
        page_id: &str,
        request: &SubscriberRequest,
    ) -> InstatusResult<Subscriber> {
        self.client
            .post(
                Route::new(Method::POST, SUBSCRIBERS).param("page_id", page_id),
                request,
            )
            .await
    }

    /// Removes a subscriber.
    pub async fn delete(&self, page_id: &str, subscriber_id: &str) -> InstatusResult<()> {
        let route = Route::new(Method::DELETE, "v1/{page_id}/subscribers/{subscriber_id}")
            .param("page_id", page_id)
            .param("subscriber_id", subscriber_id);
        self.client.delete(route).await
    }
}

/// Request to add a subscriber. Set one of `email`, `phone` or `webhook`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberRequest {
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number for SMS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Webhook URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    /// Email notified when the webhook fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_email: Option<String>,
    /// Subscribe to every component.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_components: Option<bool>,
    /// IDs of the components to follow.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
}

impl SubscriberRequest {
    /// Subscribes an email address to every component.
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            all_components: Some(true),
            ..Default::default()
        }
    }
}
