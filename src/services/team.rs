//! Team operations.

use crate::client::InstatusClient;
use crate::errors::InstatusResult;
use crate::route::Route;
use crate::types::TeamMember;
use reqwest::Method;
use serde::Serialize;

const TEAM: &str = "v1/{page_id}/team";

/// Service for team operations.
pub struct TeamService<'a> {
    client: &'a InstatusClient,
}

impl<'a> TeamService<'a> {
    /// Creates a new team service.
    pub fn new(client: &'a InstatusClient) -> Self {
        Self { client }
    }

    /// Lists the team members of a page.
    pub async fn list(&self, page_id: &str) -> InstatusResult<Vec<TeamMember>> {
        self.client
            .get(Route::new(Method::GET, TEAM).param("page_id", page_id))
            .await
    }

    /// Invites someone to the team of a page.
    pub async fn invite(&self, page_id: &str, email: &str) -> InstatusResult<TeamMember> {
        self.client
            .post(
                Route::new(Method::POST, TEAM).param("page_id", page_id),
                &InviteRequest { email },
            )
            .await
    }

    /// Removes a team member.
    pub async fn delete(&self, page_id: &str, team_member_id: &str) -> InstatusResult<()> {
        let route = Route::new(Method::DELETE, "v1/{page_id}/team/{team_member_id}")
            .param("page_id", page_id)
            .param("team_member_id", team_member_id);
        self.client.delete(route).await
    }
}

#[derive(Serialize)]
struct InviteRequest<'a> {
    email: &'a str,
}
