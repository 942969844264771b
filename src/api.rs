//! REST client for the admin backend.

use crate::comment_tree::Comment;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::schema::{
    Admin, CommentRow, Event, ForumPayload, ForumPost, NewComment, NewEvent,
};
use crate::session::Session;
use crate::thread::CommentSource;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const BAD_REQUEST: &str = "Bad request";

/// Admin backend client. Sends the session token as a bearer token when set.
#[derive(Clone)]
pub struct AdminApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl AdminApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let req = self.client.request(method, &url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send and fail on non-success statuses.
    async fn send(&self, req: RequestBuilder, bad_request: &str) -> Result<Response, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            debug!("Request failed: {} - {}", status, text);
            return Err(ApiError::from_status(status, &text, bad_request));
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.send(self.request(Method::GET, path), BAD_REQUEST).await?;
        Ok(resp.json().await?)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        self.send(self.request(method, path).json(body), BAD_REQUEST)
            .await
    }

    // ========================================================================
    // Auth
    // ========================================================================

    /// Exchange credentials for a session token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        info!("Logging in as {}", email);
        let req = self
            .request(Method::POST, "/admin/login")
            .json(&LoginRequest { email, password });
        let resp: LoginResponse = self
            .send(req, "Invalid email or password")
            .await?
            .json()
            .await?;
        resp.token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("Login response has no token".to_string()))
    }

    /// Profile of the signed-in admin.
    pub async fn me(&self) -> Result<Admin, ApiError> {
        let resp: AdminEnvelope = self.get_json("/admin/me").await?;
        Ok(resp.admin)
    }

    /// Profile of the signed-in admin. A rejected token ends `session`.
    pub async fn current_admin(&self, session: &mut Session) -> Result<Admin, ApiError> {
        session.require_token()?;
        match self.me().await {
            Err(e) if e.is_unauthorized() => {
                session.sign_out()?;
                Err(e)
            }
            other => other,
        }
    }

    /// Author id for new comments: the signed-in admin, or `fallback` when the
    /// profile is unavailable but the session is still valid.
    pub async fn author_id(
        &self,
        session: &mut Session,
        fallback: Option<&str>,
    ) -> Result<String, ApiError> {
        match self.current_admin(session).await {
            Ok(admin) => Ok(admin.id),
            Err(e) => match fallback {
                Some(fallback) if session.is_authenticated() => {
                    warn!("Admin profile unavailable ({}), posting as {}", e, fallback);
                    Ok(fallback.to_string())
                }
                _ => Err(e),
            },
        }
    }

    // ========================================================================
    // Forum
    // ========================================================================

    pub async fn list_forums(&self) -> Result<Vec<ForumPost>, ApiError> {
        let resp: ForumsEnvelope = self.get_json("/forum").await?;
        Ok(resp.forums.unwrap_or_default())
    }

    /// Posts created by one admin. An unsuccessful envelope yields no posts.
    pub async fn list_forums_by_admin(&self, admin_id: &str) -> Result<Vec<ForumPost>, ApiError> {
        let resp: ForumsEnvelope = self.get_json(&format!("/forum/admin/{}", admin_id)).await?;
        if resp.success != Some(true) {
            return Ok(Vec::new());
        }
        Ok(resp.forums.unwrap_or_default())
    }

    pub async fn get_forum(&self, id: &str) -> Result<ForumPost, ApiError> {
        let resp: ForumEnvelope = self.get_json(&format!("/forum/forum/{}", id)).await?;
        Ok(resp.forum_post)
    }

    pub async fn create_forum(&self, payload: &ForumPayload) -> Result<(), ApiError> {
        self.send_json(Method::POST, "/forum", payload).await?;
        info!("Created forum post {:?}", payload.title);
        Ok(())
    }

    pub async fn update_forum(&self, id: &str, payload: &ForumPayload) -> Result<ForumPost, ApiError> {
        let resp: ForumEnvelope = self
            .send_json(Method::PUT, &format!("/forum/{}", id), payload)
            .await?
            .json()
            .await?;
        info!("Updated forum post {}", id);
        Ok(resp.forum_post)
    }

    pub async fn delete_forum(&self, id: &str) -> Result<(), ApiError> {
        self.send(
            self.request(Method::DELETE, &format!("/forum/forum/{}", id)),
            BAD_REQUEST,
        )
        .await?;
        info!("Deleted forum post {}", id);
        Ok(())
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// Flat comment snapshot for a forum post.
    pub async fn list_comments(&self, forum_id: &str) -> Result<Vec<Comment>, ApiError> {
        let resp: CommentsEnvelope = self
            .get_json(&format!("/forumcomment/all-forum-comments/{}", forum_id))
            .await?;
        match (resp.success, resp.comments) {
            (true, Some(rows)) => {
                debug!("Fetched {} comments for forum {}", rows.len(), forum_id);
                Ok(rows.into_iter().map(Comment::from).collect())
            }
            _ => Err(ApiError::InvalidResponse("Invalid response format".to_string())),
        }
    }

    pub async fn add_comment(&self, comment: &NewComment) -> Result<(), ApiError> {
        let resp = self
            .send_json(Method::POST, "/forumcomment/add", comment)
            .await?;
        if resp.status() != StatusCode::CREATED {
            return Err(ApiError::Status {
                status: resp.status(),
                message: "Comment was not created".to_string(),
            });
        }
        match &comment.reply_to {
            Some(parent) => info!("Added reply to {} on forum {}", parent, comment.forum_id),
            None => info!("Added comment on forum {}", comment.forum_id),
        }
        Ok(())
    }

    pub async fn delete_comment(&self, comment_id: &str) -> Result<(), ApiError> {
        self.send(
            self.request(Method::DELETE, &format!("/forumcomment/{}", comment_id)),
            BAD_REQUEST,
        )
        .await?;
        info!("Deleted comment {}", comment_id);
        Ok(())
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// All events, or only those created by `admin_id`.
    pub async fn list_events(&self, admin_id: Option<&str>) -> Result<Vec<Event>, ApiError> {
        let req = self.request(Method::GET, "/admin-events");
        let req = match admin_id {
            Some(id) => req.query(&[("adminId", id)]),
            None => req,
        };
        let resp: EventsEnvelope = self.send(req, BAD_REQUEST).await?.json().await?;
        if admin_id.is_some() && resp.success != Some(true) {
            return Ok(Vec::new());
        }
        Ok(resp.data.unwrap_or_default())
    }

    pub async fn get_event(&self, id: &str) -> Result<Event, ApiError> {
        let resp: EventEnvelope = self.get_json(&format!("/admin-events/{}", id)).await?;
        Ok(resp.data)
    }

    pub async fn create_event(&self, event: &NewEvent) -> Result<(), ApiError> {
        self.send_json(Method::POST, "/admin-events", event).await?;
        info!("Created event {:?}", event.event_name);
        Ok(())
    }
}

#[async_trait::async_trait]
impl CommentSource for AdminApiClient {
    async fn fetch_comments(&self, forum_id: &str) -> Result<Vec<Comment>, ApiError> {
        self.list_comments(forum_id).await
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdminEnvelope {
    admin: Admin,
}

#[derive(Debug, Deserialize)]
struct ForumsEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    forums: Option<Vec<ForumPost>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForumEnvelope {
    forum_post: ForumPost,
}

#[derive(Debug, Deserialize)]
struct CommentsEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    comments: Option<Vec<CommentRow>>,
}

#[derive(Debug, Deserialize)]
struct EventsEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<Vec<Event>>,
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    data: Event,
}
