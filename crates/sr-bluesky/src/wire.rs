//! XRPC request/response bodies.

use serde::{Deserialize, Serialize};
use sr_core::domain::StrongRef;

pub const POST_TYPE: &str = "app.bsky.feed.post";
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

#[derive(Serialize)]
pub struct CreateSessionRequest<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub access_jwt: String,
    pub refresh_jwt: String,
    pub handle: String,
    pub did: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Deserialize)]
pub struct TimelineResponse {
    #[serde(default)]
    pub feed: Vec<FeedViewPost>,
}

#[derive(Deserialize)]
pub struct FeedViewPost {
    pub post: PostView,
}

#[derive(Deserialize)]
pub struct PostView {
    pub uri: String,
    pub cid: String,
    pub author: AuthorView,
    pub record: serde_json::Value,
}

#[derive(Deserialize)]
pub struct AuthorView {
    pub handle: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(rename = "$type")]
    pub kind: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyRecord>,
}

#[derive(Serialize, Deserialize)]
pub struct ReplyRecord {
    pub root: RecordRef,
    pub parent: RecordRef,
}

#[derive(Serialize, Deserialize)]
pub struct RecordRef {
    pub uri: String,
    pub cid: String,
}

impl From<&StrongRef> for RecordRef {
    fn from(r: &StrongRef) -> Self {
        Self {
            uri: r.uri.clone(),
            cid: r.cid.clone(),
        }
    }
}

impl From<RecordRef> for StrongRef {
    fn from(r: RecordRef) -> Self {
        StrongRef::new(r.uri, r.cid)
    }
}

#[derive(Serialize)]
pub struct CreateRecordRequest<'a> {
    pub repo: &'a str,
    pub collection: &'a str,
    pub record: &'a PostRecord,
}

#[derive(Deserialize)]
pub struct XrpcError {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl XrpcError {
    pub fn describe(&self) -> String {
        match (&self.error, &self.message) {
            (Some(code), Some(msg)) => format!("{code}: {msg}"),
            (Some(code), None) => code.clone(),
            (None, Some(msg)) => msg.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}
