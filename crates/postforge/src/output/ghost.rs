//! Draft publishing through the Ghost Admin API.
//!
//! Ghost admin keys look like `{id}:{hex secret}`. Each request carries a
//! short-lived HS256 token whose `kid` header is the key id and whose
//! signing key is the hex-decoded secret.

use std::time::Duration;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::{info, warn};
use pulldown_cmark::{html as md_html, Parser};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{DestinationKind, GhostSettings, SiteConfig};
use crate::pipeline::state::PostState;
use crate::sanitize;
use crate::secrets::SecretError;

use super::{body_without_title, OutputResult};

pub const TOKEN_LIFETIME_SECS: i64 = 300;
pub const TOKEN_AUDIENCE: &str = "/admin/";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Problems found before any request is sent.
#[derive(Debug, Error)]
pub enum GhostConfigError {
    #[error("Ghost API URL or admin key not configured")]
    MissingCredentials,

    #[error("Failed to resolve Ghost credential: {0}")]
    Secret(#[from] SecretError),

    #[error("Invalid Ghost admin key format. Expected: id:secret")]
    MalformedAdminKey,

    #[error("Ghost admin key secret is not valid hex: {0}")]
    InvalidSecret(#[from] hex::FromHexError),

    #[error("Failed to sign Ghost token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AdminClaims {
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
}

/// Splits `id:secret` and hex-decodes the secret. Anything other than
/// exactly two parts is rejected.
pub fn parse_admin_key(admin_key: &str) -> Result<(&str, Vec<u8>), GhostConfigError> {
    let mut parts = admin_key.split(':');
    let (id, secret) = match (parts.next(), parts.next(), parts.next()) {
        (Some(id), Some(secret), None) if !id.is_empty() && !secret.is_empty() => (id, secret),
        _ => return Err(GhostConfigError::MalformedAdminKey),
    };
    Ok((id, hex::decode(secret)?))
}

/// Signs an admin token valid for [`TOKEN_LIFETIME_SECS`] from `issued_at`.
pub fn build_admin_token(admin_key: &str, issued_at: i64) -> Result<String, GhostConfigError> {
    let (key_id, secret) = parse_admin_key(admin_key)?;

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(key_id.to_string());

    let claims = AdminClaims {
        iat: issued_at,
        exp: issued_at + TOKEN_LIFETIME_SECS,
        aud: TOKEN_AUDIENCE.to_string(),
    };

    Ok(encode(&header, &claims, &EncodingKey::from_secret(&secret))?)
}

pub fn render_html(markdown: &str) -> String {
    let mut html = String::new();
    md_html::push_html(&mut html, Parser::new(markdown));
    format!("<div>{}</div>", html)
}

#[derive(Serialize)]
struct PostsEnvelope<'a> {
    posts: [DraftPost<'a>; 1],
}

#[derive(Serialize)]
struct DraftPost<'a> {
    title: &'a str,
    slug: &'a str,
    html: String,
    custom_excerpt: &'a str,
    meta_description: &'a str,
    tags: Vec<TagRef<'a>>,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    feature_image: Option<&'a str>,
}

#[derive(Serialize)]
struct TagRef<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct PostsResponse {
    #[serde(default)]
    posts: Vec<CreatedPost>,
}

#[derive(Deserialize)]
struct CreatedPost {
    id: String,
    slug: String,
}

struct Credentials {
    api_url: String,
    /// Admin key with the secret masked, for logs.
    key_hint: String,
    token: String,
}

fn prepare(settings: &GhostSettings, issued_at: i64) -> Result<Credentials, GhostConfigError> {
    let api_url = settings.api_url.resolve_optional()?;
    let admin_key = settings.admin_key.resolve_optional()?;

    let (api_url, admin_key) = match (api_url, admin_key) {
        (Some(url), Some(key))
            if !url.expose_secret().is_empty() && !key.expose_secret().is_empty() =>
        {
            (url, key)
        }
        _ => return Err(GhostConfigError::MissingCredentials),
    };

    Ok(Credentials {
        api_url: api_url.expose_secret().trim_end_matches('/').to_string(),
        key_hint: sanitize::redact_admin_key(admin_key.expose_secret()),
        token: build_admin_token(admin_key.expose_secret(), issued_at)?,
    })
}

fn draft_post<'a>(state: &'a PostState, site: &'a SiteConfig) -> PostsEnvelope<'a> {
    let tags = if state.request.tags.is_empty() {
        &site.default_tags
    } else {
        &state.request.tags
    };

    PostsEnvelope {
        posts: [DraftPost {
            title: &state.title,
            slug: &state.slug,
            html: render_html(body_without_title(&state.full_text, &state.title)),
            custom_excerpt: &state.excerpt,
            meta_description: &state.meta_description,
            tags: tags.iter().map(|name| TagRef { name: name.as_str() }).collect(),
            status: "draft",
            feature_image: state.featured_image.as_deref(),
        }],
    }
}

/// Submits the post as a draft. Never fails: every problem comes back as an
/// unsuccessful result, and credential problems are caught before any
/// network I/O.
pub async fn publish(
    state: &PostState,
    site: &SiteConfig,
    settings: &GhostSettings,
) -> OutputResult {
    let failed =
        |message: String| OutputResult::failed(DestinationKind::Ghost, &state.slug, message);

    let credentials = match prepare(settings, chrono::Utc::now().timestamp()) {
        Ok(c) => c,
        Err(e) => {
            warn!("Ghost publish skipped: {}", e);
            return failed(e.to_string());
        }
    };

    let endpoint = format!("{}/ghost/api/admin/posts/?source=html", credentials.api_url);
    info!(
        "Publishing draft '{}' to {} with key {}",
        state.slug,
        sanitize::redact_url(&credentials.api_url),
        credentials.key_hint
    );

    let client = match Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
    {
        Ok(c) => c,
        Err(e) => return failed(format!("Failed to create HTTP client: {}", e)),
    };

    let response = match client
        .post(&endpoint)
        .header("Authorization", format!("Ghost {}", credentials.token))
        .json(&draft_post(state, site))
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => return failed(format!("Ghost API error: {}", e)),
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = format!(
            "Ghost API error ({}): {}",
            status,
            sanitize::truncate_for_log(body.trim(), MAX_ERROR_BODY_CHARS)
        );
        warn!("{}", message);
        return failed(message);
    }

    let created = match response.json::<PostsResponse>().await {
        Ok(parsed) => parsed.posts.into_iter().next(),
        Err(e) => return failed(format!("Ghost API returned an unreadable response: {}", e)),
    };

    match created {
        Some(post) => {
            let url = format!("{}/{}/", credentials.api_url, post.slug);
            info!("Created Ghost draft {} at {}", post.id, sanitize::redact_url(&url));
            OutputResult::remote(post.id, post.slug, url)
        }
        None => failed("Ghost API response contained no post".to_string()),
    }
}
