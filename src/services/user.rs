//! User profile operations.

use crate::client::InstatusClient;
use crate::errors::InstatusResult;
use crate::route::Route;
use crate::types::UserProfile;
use reqwest::Method;

/// Service for the API key owner's profile.
pub struct UserService<'a> {
    client: &'a InstatusClient,
}

impl<'a> UserService<'a> {
    /// Creates a new user service.
    pub fn new(client: &'a InstatusClient) -> Self {
        Self { client }
    }

    /// Gets the profile of the authenticated user.
    pub async fn get(&self) -> InstatusResult<UserProfile> {
        self.client.get(Route::new(Method::GET, "v1/user")).await
    }
}
