//! HTTP client for the Lockbox server.

use crate::api::{
    DeleteRecordResponse, ErrorResponse, GetRecordResponse, ListRecordsResponse, LoginRequest,
    RecordView, RefreshRequest, RegisterRequest, RegisterResponse, SaveRecordRequest,
    SaveRecordResponse, SyncRecordsRequest, SyncRecordsResponse, TokenResponse,
};
use crate::models::{RecordDraft, RecordType};
use crate::{LockboxError, Result};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Session {
    access_token: String,
    refresh_token: String,
}

/// Client for one Lockbox server.
///
/// After `login` the client keeps the token pair, sends the access token on
/// every record call, and when the server answers `unauthenticated` it
/// refreshes once and retries the call.
pub struct LockboxClient {
    client: reqwest::Client,
    base_url: Url,
    session: Mutex<Option<Session>>,
}

impl LockboxClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| LockboxError::Validation(format!("invalid server url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(LockboxError::Validation(format!(
                "invalid server url: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| LockboxError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            session: Mutex::new(None),
        })
    }

    /// Create an account; returns the new user id.
    pub async fn register(&self, login: &str, password: &str) -> Result<String> {
        let body = RegisterRequest {
            login: login.to_string(),
            password: password.to_string(),
        };
        let url = self.url(&["api", "v1", "auth", "register"])?;
        let response: RegisterResponse = self.send(Method::POST, url, Some(&body), false).await?;
        Ok(response.user_id)
    }

    /// Log in and keep the issued token pair for later calls.
    pub async fn login(&self, login: &str, password: &str) -> Result<TokenResponse> {
        let body = LoginRequest {
            login: login.to_string(),
            password: password.to_string(),
        };
        let url = self.url(&["api", "v1", "auth", "login"])?;
        let response: TokenResponse = self.send(Method::POST, url, Some(&body), false).await?;
        self.store_session(&response)?;
        Ok(response)
    }

    /// Rotate the held token pair.
    pub async fn refresh(&self) -> Result<TokenResponse> {
        let refresh_token = self
            .session()?
            .map(|s| s.refresh_token)
            .ok_or(LockboxError::Unauthenticated)?;

        let body = RefreshRequest { refresh_token };
        let url = self.url(&["api", "v1", "auth", "refresh"])?;
        let response: TokenResponse = self.send(Method::POST, url, Some(&body), false).await?;
        self.store_session(&response)?;
        Ok(response)
    }

    /// Drop the held tokens.
    pub fn logout(&self) -> Result<()> {
        *self.lock_session()? = None;
        Ok(())
    }

    /// Use an externally obtained token pair.
    pub fn set_tokens(&self, access_token: String, refresh_token: String) -> Result<()> {
        *self.lock_session()? = Some(Session {
            access_token,
            refresh_token,
        });
        Ok(())
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        Ok(self.session()?.map(|s| s.access_token))
    }

    pub async fn save_record(
        &self,
        record: &RecordDraft,
        expected_version: Option<u64>,
    ) -> Result<SaveRecordResponse> {
        let body = SaveRecordRequest {
            record: Some(record.clone()),
            expected_version,
        };
        self.authed(Method::POST, &["api", "v1", "records"], None, Some(&body))
            .await
    }

    pub async fn get_record(&self, id: &str) -> Result<RecordView> {
        let response: GetRecordResponse = self
            .authed(Method::GET, &["api", "v1", "records", id], None, None::<&()>)
            .await?;
        Ok(response.record)
    }

    pub async fn list_records(&self, filter: Option<RecordType>) -> Result<Vec<RecordView>> {
        let response: ListRecordsResponse = self
            .authed(Method::GET, &["api", "v1", "records"], filter, None::<&()>)
            .await?;
        Ok(response.records)
    }

    pub async fn delete_record(&self, id: &str) -> Result<()> {
        let _: DeleteRecordResponse = self
            .authed(Method::DELETE, &["api", "v1", "records", id], None, None::<&()>)
            .await?;
        Ok(())
    }

    /// Changes since `cursor` (unix microseconds, 0 for everything).
    pub async fn sync_records(&self, cursor: i64) -> Result<SyncRecordsResponse> {
        let body = SyncRecordsRequest { cursor };
        self.authed(Method::POST, &["api", "v1", "sync"], None, Some(&body))
            .await
    }

    // --- Internal helpers ---

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LockboxError::Validation("invalid server url".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn lock_session(&self) -> Result<std::sync::MutexGuard<'_, Option<Session>>> {
        self.session
            .lock()
            .map_err(|e| LockboxError::Internal(format!("Lock error: {}", e)))
    }

    fn session(&self) -> Result<Option<Session>> {
        Ok(self.lock_session()?.clone())
    }

    fn store_session(&self, tokens: &TokenResponse) -> Result<()> {
        self.set_tokens(tokens.access_token.clone(), tokens.refresh_token.clone())
    }

    /// Bearer-authenticated call with one refresh-and-retry on `unauthenticated`.
    async fn authed<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        filter: Option<RecordType>,
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut url = self.url(segments)?;
        if let Some(kind) = filter {
            url.query_pairs_mut().append_pair("type", kind.as_str());
        }

        match self.send(method.clone(), url.clone(), body, true).await {
            Err(LockboxError::Unauthenticated) if self.session()?.is_some() => {
                tracing::debug!("access token rejected, refreshing session");
                self.refresh().await?;
                self.send(method, url, body, true).await
            }
            other => other,
        }
    }

    async fn send<T, B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        bearer: bool,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self.client.request(method, url);
        if bearer {
            if let Some(token) = self.access_token()? {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| LockboxError::Transport(e.to_string()))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| LockboxError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorResponse>(&bytes) {
                Ok(error) => LockboxError::from_code(&error.code, error.message),
                Err(_) => LockboxError::Transport(format!("server returned {}", status)),
            });
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| LockboxError::Transport(format!("invalid response: {}", e)))
    }
}
