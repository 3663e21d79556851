// GitHub-backed identity client.
//
// The admin UI obtains an OAuth access token elsewhere; this client only
// answers "who does this token belong to" via the REST API's /user endpoint.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::core::auth::{AuthError, IdentityClient};

/// Minimal GitHub REST API client. It deliberately exposes only the single
/// call the auth service needs.
pub struct GithubIdentityClient {
    client: Client,
    base_url: String,
}

impl GithubIdentityClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AuthError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Accept",
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "User-Agent",
            HeaderValue::from_static("BlogCommentsApi/1.0"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: Option<String>,
}

#[async_trait]
impl IdentityClient for GithubIdentityClient {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        let url = format!("{}/user", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidCredential);
        }
        if status.is_server_error() {
            return Err(AuthError::ProviderUnavailable(format!(
                "identity provider returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(AuthError::InvalidCredential);
        }

        let user: ApiUser = resp
            .json()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        user.login.ok_or_else(|| {
            AuthError::ProviderUnavailable("identity provider returned no username".to_string())
        })
    }
}
