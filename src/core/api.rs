//! HTTP client for the satchel server.
//!
//! Thin blocking wrapper over the server's JSON API. Every call either
//! returns the decoded body or a [`RemoteError`]: non-2xx statuses become
//! `RemoteError::Status` with the server's message, except a 404 while
//! polling a login request, which is the distinct `LoginRequestNotFound`.

use std::time::Duration;

use reqwest::blocking::{RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::domain::{LoginRequest, Message, ProjectMember, User};
use crate::core::login::LoginTransport;
use crate::core::rights::Role;
use crate::error::{RemoteError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// An environment's messages together with its current version marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentMessages {
    pub environment_id: String,
    pub version_id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Serialize)]
struct CompleteLoginPayload<'a> {
    public_key: &'a str,
}

#[derive(Deserialize)]
struct CompleteLoginResponse {
    user: User,
    token: String,
}

#[derive(Serialize)]
struct AddMembersPayload<'a> {
    members: &'a [MemberRole],
}

/// A user-to-role assignment sent when adding project members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRole {
    pub user_id: String,
    pub role: Role,
}

#[derive(Serialize)]
struct WriteMessagesPayload<'a> {
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

/// Blocking client bound to one server and, optionally, one session.
pub struct Client {
    http: reqwest::blocking::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(RemoteError::Transport)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
        })
    }

    /// Client carrying a session token for authenticated calls.
    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let mut client = Self::new(base_url)?;
        client.auth_token = Some(token.into());
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turn a non-2xx response into `RemoteError::Status`, keeping the
    /// server's error message when the body carries one.
    fn check(response: Response) -> Result<Response> {
        let status = response.status();
        trace!(status = status.as_u16(), "server response");

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .map(|b| b.error)
                .unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(response)
    }

    fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = Self::check(response)?
            .text()
            .map_err(RemoteError::Transport)?;
        serde_json::from_str(&body)
            .map_err(|e| RemoteError::Decode(e.to_string()).into())
    }

    /// For calls whose response body carries nothing of interest.
    fn ensure_success(response: Response) -> Result<()> {
        Self::check(response).map(|_| ())
    }

    /// Members of a project, with their roles.
    pub fn members(&self, project_id: &str) -> Result<Vec<ProjectMember>> {
        debug!(project_id, "fetching project members");

        let response = self
            .authed(self.http.get(self.url(&format!("/projects/{project_id}/members"))))
            .send()
            .map_err(RemoteError::Transport)?;
        Self::decode(response)
    }

    /// Add members to a project with their role assignments.
    pub fn add_members(&self, project_id: &str, members: &[MemberRole]) -> Result<()> {
        debug!(project_id, count = members.len(), "adding project members");

        let response = self
            .authed(self.http.put(self.url(&format!("/projects/{project_id}/members"))))
            .json(&AddMembersPayload { members })
            .send()
            .map_err(RemoteError::Transport)?;
        Self::ensure_success(response)
    }

    /// Remove a member from a project.
    pub fn remove_member(&self, project_id: &str, user_id: &str) -> Result<()> {
        debug!(project_id, user_id, "removing project member");

        let response = self
            .authed(
                self.http
                    .delete(self.url(&format!("/projects/{project_id}/members/{user_id}"))),
            )
            .send()
            .map_err(RemoteError::Transport)?;
        Self::ensure_success(response)
    }

    /// Registered cipher keys of all project members, for addressing a push.
    pub fn public_keys(&self, project_id: &str) -> Result<Vec<crate::core::sync::PushRecipient>> {
        debug!(project_id, "fetching member public keys");

        let response = self
            .authed(self.http.get(self.url(&format!("/projects/{project_id}/public-keys"))))
            .send()
            .map_err(RemoteError::Transport)?;
        Self::decode(response)
    }

    /// An environment's pending messages and current version marker.
    pub fn environment_messages(
        &self,
        project_id: &str,
        environment: &str,
    ) -> Result<EnvironmentMessages> {
        debug!(project_id, environment, "fetching environment messages");

        let response = self
            .authed(self.http.get(self.url(&format!(
                "/projects/{project_id}/environments/{environment}/messages"
            ))))
            .send()
            .map_err(RemoteError::Transport)?;
        Self::decode(response)
    }

    /// Deliver encrypted messages to their recipients.
    pub fn write_messages(&self, project_id: &str, messages: &[Message]) -> Result<()> {
        debug!(project_id, count = messages.len(), "writing messages");

        let response = self
            .authed(self.http.post(self.url(&format!("/projects/{project_id}/messages"))))
            .json(&WriteMessagesPayload { messages })
            .send()
            .map_err(RemoteError::Transport)?;
        Self::ensure_success(response)
    }

    /// Acknowledge a delivered message so the server discards it.
    pub fn delete_message(&self, message_id: u64) -> Result<()> {
        let response = self
            .authed(self.http.delete(self.url(&format!("/messages/{message_id}"))))
            .send()
            .map_err(RemoteError::Transport)?;
        Self::ensure_success(response)
    }
}

impl LoginTransport for Client {
    fn create_login_request(&self) -> Result<LoginRequest> {
        debug!("creating login request");

        let response = self
            .http
            .post(self.url("/login-requests"))
            .send()
            .map_err(RemoteError::Transport)?;
        Self::decode(response)
    }

    fn poll_login_request(&self, temporary_code: &str) -> Result<LoginRequest> {
        trace!(temporary_code, "polling login request");

        let response = self
            .http
            .get(self.url(&format!("/login-requests/{temporary_code}")))
            .send()
            .map_err(RemoteError::Transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RemoteError::LoginRequestNotFound.into());
        }
        Self::decode(response)
    }

    fn complete_login(&self, temporary_code: &str, public_key: &str) -> Result<(User, String)> {
        debug!(temporary_code, "completing login");

        let response = self
            .http
            .post(self.url(&format!("/login-requests/{temporary_code}/complete")))
            .json(&CompleteLoginPayload { public_key })
            .send()
            .map_err(RemoteError::Transport)?;

        let body: CompleteLoginResponse = Self::decode(response)?;
        Ok((body.user, body.token))
    }
}
