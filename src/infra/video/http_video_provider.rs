use crate::domain::ports::{CallMember, VideoProvider};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

const MAX_RETRIES: u32 = 2;
const INITIAL_BACKOFF_MS: u64 = 300;
const USER_TOKEN_TTL_HOURS: i64 = 24;
const CALL_TYPE: &str = "default";

#[derive(Serialize)]
struct ServerClaims {
    server: bool,
}

#[derive(Serialize)]
struct UserTokenClaims<'a> {
    user_id: &'a str,
    iat: i64,
    exp: i64,
}

/// JSON-over-HTTP client for the hosted video service.
///
/// Server calls authenticate with a JWT signed by the API secret and carry the
/// API key as a query parameter.
pub struct HttpVideoProvider {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl HttpVideoProvider {
    pub fn new(base_url: String, api_key: String, api_secret: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_secret,
        }
    }

    fn server_token(&self) -> Result<String, AppError> {
        encode(&Header::default(), &ServerClaims { server: true }, &EncodingKey::from_secret(self.api_secret.as_bytes()))
            .map_err(|e| AppError::Provider(format!("Could not sign server token: {}", e)))
    }

    async fn post_with_retry(&self, path: &str, payload: &Value) -> Result<Value, AppError> {
        let url = format!("{}/api/v2/{}", self.base_url, path);
        let token = self.server_token()?;
        let mut retries = 0;
        let mut backoff = INITIAL_BACKOFF_MS;

        loop {
            let res = self.client.post(&url)
                .query(&[("api_key", self.api_key.as_str())])
                .header("Authorization", &token)
                .header("Stream-Auth-Type", "jwt")
                .json(payload)
                .send()
                .await;

            match res {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<Value>().await.map_err(|e| {
                            error!("Video provider returned unreadable JSON: {:?}", e);
                            AppError::Provider("Malformed provider response".into())
                        });
                    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                        if retries >= MAX_RETRIES {
                            let text = response.text().await.unwrap_or_default();
                            error!("Video provider failed after {} retries. Status: {}", retries, status);
                            return Err(AppError::Provider(format!("{} - {}", status, text)));
                        }
                        warn!("Video provider transient error {}. Retrying in {}ms...", status, backoff);
                    } else {
                        let text = response.text().await.unwrap_or_default();
                        error!("Video provider rejected request {}: {}", status, text);
                        return Err(AppError::Provider(format!("{} - {}", status, text)));
                    }
                }
                Err(e) => {
                    if retries >= MAX_RETRIES {
                        error!("Video provider unreachable after {} retries: {:?}", retries, e);
                        return Err(AppError::Provider(format!("Network error: {}", e)));
                    }
                    warn!("Video provider network error. Retrying in {}ms... {:?}", backoff, e);
                }
            }

            sleep(Duration::from_millis(backoff)).await;
            retries += 1;
            backoff *= 2;
        }
    }
}

#[async_trait]
impl VideoProvider for HttpVideoProvider {
    #[instrument(skip(self))]
    async fn upsert_user(&self, user_id: &str, display_name: &str) -> Result<(), AppError> {
        let payload = json!({
            "users": {
                user_id: { "id": user_id, "name": display_name }
            }
        });
        self.post_with_retry("users", &payload).await?;
        debug!("Upserted provider user {}", user_id);
        Ok(())
    }

    #[instrument(skip(self, members), fields(members = members.len()))]
    async fn create_or_get_call(&self, room_id: &str, creator_id: &str, members: &[CallMember]) -> Result<(), AppError> {
        let payload = json!({
            "data": {
                "created_by_id": creator_id,
                "members": members,
            }
        });
        self.post_with_retry(&format!("video/call/{}/{}", CALL_TYPE, room_id), &payload).await?;
        debug!("Call room {} ready", room_id);
        Ok(())
    }

    fn create_user_token(&self, user_id: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = UserTokenClaims {
            user_id,
            iat: now.timestamp(),
            exp: (now + ChronoDuration::hours(USER_TOKEN_TTL_HOURS)).timestamp(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.api_secret.as_bytes()))
            .map_err(|e| AppError::Provider(format!("Could not sign user token: {}", e)))
    }
}
