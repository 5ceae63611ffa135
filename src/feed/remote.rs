//! Remote feed backend speaking tRPC over HTTP.
//!
//! Queries are `GET {base}/api/trpc/{procedure}?input={"json":{...}}` and
//! mutations are `POST {base}/api/trpc/{procedure}` with the same body.
//! Responses come wrapped in `{"result":{"data":{"json": ...}}}` and errors
//! in `{"error":{"json":{"message", "data":{"code"}}}}`.
//!
//! Encoding and decoding are pure functions ([`RemoteFeed::encode_input`],
//! [`decode_response`]) so tests can exercise them on fixtures without a
//! server.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{Author, FeedQuery, FeedService, Page, Post, PostId, PostWithAuthor, UserId};
use crate::error::{FeedError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RemoteFeed {
    base_url: String,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

impl RemoteFeed {
    /// # Arguments
    ///
    /// * `base_url`: origin of the app, e.g. `https://chirp.example.com`.
    /// * `token`: session token sent as a bearer token; required by the
    ///   private procedures (new-post count, create, username update).
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    pub fn procedure_url(&self, procedure: &str) -> String {
        format!("{}/api/trpc/{procedure}", self.base_url)
    }

    /// Wrap procedure input the way the superjson transformer expects.
    pub fn encode_input(input: &Value) -> String {
        json!({ "json": input }).to_string()
    }

    /// Which procedure and input serve a list request.
    pub fn list_request(query: &FeedQuery, cursor: Option<&PostId>, limit: usize) -> (&'static str, Value) {
        let cursor = cursor.map(|c| c.0.clone());
        match query {
            FeedQuery::All => ("posts.getAll", json!({ "cursor": cursor, "limit": limit })),
            FeedQuery::ByAuthor { id, .. } => (
                "posts.getPostsByUserId",
                json!({ "userId": id.0, "cursor": cursor, "limit": limit }),
            ),
            FeedQuery::ByContent(needle) => (
                "search.getPostsByContent",
                json!({ "content": needle, "cursor": cursor, "limit": limit }),
            ),
        }
    }

    fn authorize(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn query<T: DeserializeOwned>(&self, procedure: &str, input: Value) -> Result<T> {
        debug!(procedure, "trpc query");
        let request = self
            .client
            .get(self.procedure_url(procedure))
            .query(&[("input", Self::encode_input(&input))]);
        let response = self.authorize(request).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        decode_response(status, &body)
    }

    fn mutate<T: DeserializeOwned>(&self, procedure: &str, input: Value) -> Result<T> {
        debug!(procedure, "trpc mutation");
        let request = self
            .client
            .post(self.procedure_url(procedure))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(Self::encode_input(&input));
        let response = self.authorize(request).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        decode_response(status, &body)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Envelope<T> {
    result: Option<ResultBody<T>>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ResultBody<T> {
    data: Wrapped<T>,
}

#[derive(Deserialize)]
struct Wrapped<T> {
    json: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    json: ErrorJson,
}

#[derive(Deserialize)]
struct ErrorJson {
    #[serde(default)]
    message: String,
    data: Option<ErrorData>,
}

#[derive(Deserialize)]
struct ErrorData {
    code: String,
}

/// List payload: the paged shape, or a bare array from older endpoints
/// that return every match at once.
#[derive(Deserialize)]
#[serde(untagged)]
enum PageWire {
    Paged {
        #[serde(rename = "postsWithUserdata")]
        posts: Vec<PostWithAuthor>,
        #[serde(rename = "nextCursor", default)]
        next_cursor: Option<PostId>,
    },
    Flat(Vec<PostWithAuthor>),
}

impl From<PageWire> for Page {
    fn from(wire: PageWire) -> Page {
        match wire {
            PageWire::Paged { posts, next_cursor } => Page {
                items: posts,
                next_cursor,
            },
            PageWire::Flat(posts) => Page {
                items: posts,
                next_cursor: None,
            },
        }
    }
}

/// Profile payload; the username is nullable on the wire.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserWire {
    id: UserId,
    username: Option<String>,
    #[serde(default)]
    profile_image_url: String,
}

impl UserWire {
    fn into_author(self) -> Result<Author> {
        let username = self
            .username
            .ok_or_else(|| FeedError::NotFound(format!("username for user {}", self.id)))?;
        Ok(Author {
            id: self.id,
            username,
            profile_image_url: self.profile_image_url,
        })
    }
}

fn map_error_code(code: &str, message: String) -> FeedError {
    match code {
        "BAD_REQUEST" | "PARSE_ERROR" => FeedError::Validation(message),
        "TOO_MANY_REQUESTS" => FeedError::RateLimitExceeded,
        "NOT_FOUND" => FeedError::NotFound(message),
        "INTERNAL_SERVER_ERROR" if message.contains("Author") => FeedError::AuthorNotFound(message),
        // Profile lookups report a missing user as a server error.
        "INTERNAL_SERVER_ERROR" if message.to_lowercase().contains("not found") => {
            FeedError::NotFound(message)
        }
        other => FeedError::Protocol(format!("{other}: {message}")),
    }
}

/// Turn a tRPC HTTP response into a value or a [`FeedError`].
pub fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    let envelope: Envelope<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if status == 429 => return Err(FeedError::RateLimitExceeded),
        Err(e) => return Err(FeedError::Protocol(format!("HTTP {status}: {e}"))),
    };
    if let Some(error) = envelope.error {
        let code = error
            .json
            .data
            .map(|d| d.code)
            .unwrap_or_else(|| status.to_string());
        return Err(map_error_code(&code, error.json.message));
    }
    match envelope.result {
        Some(result) => Ok(result.data.json),
        None => Err(FeedError::Protocol(format!("HTTP {status}: empty response"))),
    }
}

impl FeedService for RemoteFeed {
    fn name(&self) -> &str {
        &self.base_url
    }

    fn list_posts(
        &self,
        query: &FeedQuery,
        cursor: Option<&PostId>,
        limit: usize,
    ) -> Result<Page> {
        let (procedure, input) = Self::list_request(query, cursor, limit);
        let wire: PageWire = self.query(procedure, input)?;
        Ok(wire.into())
    }

    fn count_posts_not_by(&self, _user: &UserId) -> Result<u64> {
        // The server counts relative to the session's user.
        self.query("posts.getNumberOfNewPosts", Value::Null)
    }

    fn create_post(&self, _author: &UserId, content: &str) -> Result<Post> {
        self.mutate("posts.create", json!({ "content": content }))
    }

    fn user_by_username(&self, username: &str) -> Result<Author> {
        let wire: UserWire = self.query("profile.getUserByUsername", json!({ "username": username }))?;
        wire.into_author()
    }

    fn update_username(&self, user: &UserId, username: &str) -> Result<Author> {
        let wire: UserWire = self.mutate(
            "profile.updateUsername",
            json!({ "username": username, "id": user.0 }),
        )?;
        wire.into_author()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_BODY: &str = r#"{
  "result": {
    "data": {
      "json": {
        "postsWithUserdata": [
          {
            "post": {
              "id": "clp2",
              "createdAt": "2026-01-02T10:00:00.000Z",
              "content": "second",
              "authorId": "user_1"
            },
            "author": {
              "id": "user_1",
              "username": "ada",
              "profileImageUrl": "https://img.example.com/1.png"
            }
          },
          {
            "post": {
              "id": "clp1",
              "createdAt": "2026-01-01T10:00:00.000Z",
              "content": "first",
              "authorId": "user_2"
            },
            "author": {
              "id": "user_2",
              "username": "grace",
              "profileImageUrl": "https://img.example.com/2.png"
            }
          }
        ],
        "nextCursor": "clp0"
      },
      "meta": { "values": {} }
    }
  }
}"#;

    #[test]
    fn decodes_paged_list() {
        let wire: PageWire = decode_response(200, PAGE_BODY).unwrap();
        let page: Page = wire.into();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].post.id, PostId::from("clp2"));
        assert_eq!(page.items[0].author.username, "ada");
        assert_eq!(page.items[1].post.author_id, UserId::from("user_2"));
        assert_eq!(page.next_cursor, Some(PostId::from("clp0")));
    }

    #[test]
    fn missing_next_cursor_means_last_page() {
        let body = r#"{"result":{"data":{"json":{"postsWithUserdata":[]}}}}"#;
        let page: Page = decode_response::<PageWire>(200, body).unwrap().into();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());

        let body = r#"{"result":{"data":{"json":{"postsWithUserdata":[],"nextCursor":null}}}}"#;
        let page: Page = decode_response::<PageWire>(200, body).unwrap().into();
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn bare_array_is_a_single_final_page() {
        let body = r#"{"result":{"data":{"json":[
            {"post":{"id":"a","createdAt":"2026-01-01T00:00:00Z","content":"rust","authorId":"u"},
             "author":{"id":"u","username":"u","profileImageUrl":""}}
        ]}}}"#;
        let page: Page = decode_response::<PageWire>(200, body).unwrap().into();
        assert_eq!(page.items.len(), 1);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn decodes_count() {
        let body = r#"{"result":{"data":{"json":42}}}"#;
        assert_eq!(decode_response::<u64>(200, body).unwrap(), 42);
    }

    #[test]
    fn maps_trpc_error_codes() {
        let err = |code: &str, message: &str| {
            let body = format!(
                r#"{{"error":{{"json":{{"message":"{message}","code":-32600,"data":{{"code":"{code}","httpStatus":400}}}}}}}}"#
            );
            decode_response::<u64>(400, &body).unwrap_err()
        };
        assert!(matches!(err("BAD_REQUEST", "too long"), FeedError::Validation(m) if m == "too long"));
        assert_eq!(err("TOO_MANY_REQUESTS", ""), FeedError::RateLimitExceeded);
        assert!(matches!(err("NOT_FOUND", "Post not found"), FeedError::NotFound(_)));
        assert!(matches!(
            err("INTERNAL_SERVER_ERROR", "Author for post not found"),
            FeedError::AuthorNotFound(_)
        ));
        assert!(matches!(err("UNAUTHORIZED", "sign in"), FeedError::Protocol(_)));
    }

    #[test]
    fn missing_profile_is_not_found() {
        let body = r#"{"error":{"json":{"message":"User not found","code":-32603,"data":{"code":"INTERNAL_SERVER_ERROR","httpStatus":500,"path":"profile.getUserByUsername"}}}}"#;
        assert_eq!(
            decode_response::<u64>(500, body).unwrap_err(),
            FeedError::NotFound("User not found".into())
        );
    }

    #[test]
    fn bare_429_is_rate_limit() {
        assert_eq!(
            decode_response::<u64>(429, "Too Many Requests"),
            Err(FeedError::RateLimitExceeded)
        );
    }

    #[test]
    fn garbage_body_is_protocol_error() {
        assert!(matches!(
            decode_response::<u64>(502, "<html>bad gateway</html>"),
            Err(FeedError::Protocol(_))
        ));
        assert!(matches!(
            decode_response::<u64>(200, "{}"),
            Err(FeedError::Protocol(_))
        ));
    }

    #[test]
    fn list_requests_pick_procedure_and_input() {
        let cursor = PostId::from("c1");
        let (proc_all, input) = RemoteFeed::list_request(&FeedQuery::All, None, 10);
        assert_eq!(proc_all, "posts.getAll");
        assert_eq!(input["cursor"], Value::Null);
        assert_eq!(input["limit"], 10);

        let (proc_user, input) = RemoteFeed::list_request(
            &FeedQuery::ByAuthor {
                id: UserId::from("u9"),
                username: "n".into(),
            },
            Some(&cursor),
            10,
        );
        assert_eq!(proc_user, "posts.getPostsByUserId");
        assert_eq!(input["userId"], "u9");
        assert_eq!(input["cursor"], "c1");

        let (proc_search, input) =
            RemoteFeed::list_request(&FeedQuery::ByContent("hi".into()), None, 5);
        assert_eq!(proc_search, "search.getPostsByContent");
        assert_eq!(input["content"], "hi");
    }

    #[test]
    fn input_is_wrapped_in_json_key() {
        let encoded = RemoteFeed::encode_input(&json!({ "cursor": null }));
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value, json!({ "json": { "cursor": null } }));
    }

    #[test]
    fn procedure_url_trims_trailing_slash() {
        let feed = RemoteFeed::new("https://chirp.example.com/", None).unwrap();
        assert_eq!(
            feed.procedure_url("posts.getAll"),
            "https://chirp.example.com/api/trpc/posts.getAll"
        );
        assert_eq!(feed.name(), "https://chirp.example.com");
    }

    #[test]
    fn profile_without_username_is_not_found() {
        let body = r#"{"result":{"data":{"json":{"id":"u1","username":null,"profileImageUrl":""}}}}"#;
        let wire: UserWire = decode_response(200, body).unwrap();
        assert!(matches!(wire.into_author(), Err(FeedError::NotFound(_))));
    }
}
