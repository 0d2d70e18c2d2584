//! Discourse HTTP session: CSRF login, cookie export and the `latest.json`
//! topic listing.

use crate::browser::SessionCookie;
use crate::candidates::{ListingEntry, ListingFuture, ListingSource};
use crate::config::Credentials;
use crate::error::ForumError;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36 Edg/142.0.0.0";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const LOGIN_TIMEZONE: &str = "Asia/Shanghai";

pub struct ForumClient {
    base: Url,
    client: reqwest::Client,
    jar: Arc<Jar>,
}

impl ForumClient {
    pub fn new(base: Url) -> Result<Self, ForumError> {
        let jar = Arc::new(Jar::default());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9"),
        );

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ForumError::Request {
                endpoint: base.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { base, client, jar })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ForumError> {
        self.base.join(path).map_err(|e| ForumError::Request {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }

    fn xhr_headers(&self, referer: &Url) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        if let Ok(value) = HeaderValue::from_str(referer.as_str()) {
            headers.insert(header::REFERER, value);
        }
        headers
    }

    async fn csrf_token(&self) -> Result<String, ForumError> {
        let url = self.endpoint("session/csrf")?;
        let referer = self.endpoint("login")?;
        let body = self.get_json(&url, self.xhr_headers(&referer)).await?;

        body.get("csrf")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(String::from)
            .ok_or_else(|| ForumError::Payload {
                endpoint: url.to_string(),
                message: "missing csrf field".into(),
            })
    }

    /// Establishes a logged-in session in the shared cookie jar.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ForumError> {
        tracing::info!("Fetching CSRF token");
        let csrf = self.csrf_token().await?;
        tracing::debug!(
            csrf_prefix = csrf.chars().take(10).collect::<String>().as_str(),
            "CSRF token obtained"
        );

        let url = self.endpoint("session")?;
        let referer = self.endpoint("login")?;
        let mut headers = self.xhr_headers(&referer);
        if let Ok(value) = HeaderValue::from_str(&csrf) {
            headers.insert("X-CSRF-Token", value);
        }
        if let Ok(origin) = HeaderValue::from_str(self.base.origin().ascii_serialization().as_str())
        {
            headers.insert(header::ORIGIN, origin);
        }

        let form = [
            ("login", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("second_factor_method", "1"),
            ("timezone", LOGIN_TIMEZONE),
        ];

        tracing::info!(username = credentials.username.as_str(), "Logging in");
        let resp = self
            .client
            .post(url.clone())
            .headers(headers)
            .form(&form)
            .send()
            .await
            .map_err(|e| request_error(&url, &e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = body.as_str(), "Login rejected");
            return Err(ForumError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = resp.json().await.map_err(|e| ForumError::Payload {
            endpoint: url.to_string(),
            message: e.to_string(),
        })?;

        if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
            let message = error
                .as_str()
                .map_or_else(|| error.to_string(), String::from);
            return Err(ForumError::LoginRejected(message));
        }

        tracing::info!("Login succeeded");
        Ok(())
    }

    /// Cookies the jar would send to the forum root.
    pub fn session_cookies(&self) -> Vec<SessionCookie> {
        self.jar
            .cookies(&self.base)
            .and_then(|value| value.to_str().ok().map(parse_cookie_header))
            .unwrap_or_default()
    }

    /// One page of `latest.json`.
    pub async fn latest_page(&self, page: u32) -> Result<Vec<ListingEntry>, ForumError> {
        let mut url = self.endpoint("latest.json")?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        let referer = self.base.clone();
        let mut headers = self.xhr_headers(&referer);
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let body = self.get_json(&url, headers).await?;
        Ok(parse_topics(&body))
    }

    async fn get_json(&self, url: &Url, headers: HeaderMap) -> Result<Value, ForumError> {
        let resp = self
            .client
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| request_error(url, &e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ForumError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.json().await.map_err(|e| ForumError::Payload {
            endpoint: url.to_string(),
            message: e.to_string(),
        })
    }
}

pub type SessionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<SessionCookie>, ForumError>> + Send + 'a>>;

/// Logs in and hands back the cookies that carry the session.
pub trait SessionLogin: Send + Sync {
    fn establish<'a>(&'a self, credentials: &'a Credentials) -> SessionFuture<'a>;
}

impl SessionLogin for ForumClient {
    fn establish<'a>(&'a self, credentials: &'a Credentials) -> SessionFuture<'a> {
        Box::pin(async move {
            self.login(credentials).await?;
            Ok(self.session_cookies())
        })
    }
}

impl ListingSource for ForumClient {
    fn page(&self, index: u32) -> ListingFuture<'_> {
        Box::pin(self.latest_page(index))
    }
}

fn request_error(url: &Url, err: &reqwest::Error) -> ForumError {
    ForumError::Request {
        endpoint: url.to_string(),
        message: err.to_string(),
    }
}

/// Splits a `Cookie:` header value into name/value pairs.
fn parse_cookie_header(header: &str) -> Vec<SessionCookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| SessionCookie {
                name: name.to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

/// `topic_list.topics[].{id, slug}`; anything else on the entry is ignored.
fn parse_topics(body: &Value) -> Vec<ListingEntry> {
    body.get("topic_list")
        .and_then(|list| list.get("topics"))
        .and_then(Value::as_array)
        .map(|topics| {
            topics
                .iter()
                .map(|topic| ListingEntry {
                    id: topic.get("id").and_then(|id| {
                        id.as_u64()
                            .or_else(|| id.as_str().and_then(|s| s.parse().ok()))
                    }),
                    slug: topic.get("slug").and_then(Value::as_str).map(String::from),
                })
                .collect()
        })
        .unwrap_or_default()
}
