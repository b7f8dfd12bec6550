use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::error::GatewayError;
use crate::gateway::SlideGateway;
use crate::models::{
    InfoResponse, LoginRequest, LoginResponse, OverviewResponse, PositionRequest, SlideId,
    SlideInfo, SlideRecord,
};

pub const DEFAULT_CLOUD_HOST: &str = "https://api.goslide.com/api";

#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// Account e-mail
    pub username: String,
    pub password: String,
    /// Base url of the cloud API
    pub host: String,
    /// Verify the TLS certificate of the host
    pub verify_ssl: bool,
    /// Per request timeout
    pub timeout: Duration,
}

impl CloudConfig {
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            host: DEFAULT_CLOUD_HOST.to_string(),
            verify_ssl: true,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Client for the GoSlide cloud API.
pub struct GoSlideCloud {
    config: CloudConfig,
    http_client: reqwest::Client,
    access_token: RwLock<Option<String>>,
}

impl GoSlideCloud {
    pub fn new(config: CloudConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;

        Ok(Self {
            config,
            http_client,
            access_token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.host.trim_end_matches('/'), path)
    }

    async fn bearer_token(&self) -> Result<String, GatewayError> {
        if let Some(token) = self.access_token.read().await.clone() {
            return Ok(token);
        }

        self.login().await?;

        self.access_token
            .read()
            .await
            .clone()
            .ok_or_else(|| GatewayError::AuthenticationFailed("No access token issued".to_string()))
    }

    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, GatewayError> {
        let token = self.bearer_token().await?;

        let mut request = self
            .http_client
            .request(method.clone(), self.url(path))
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!("{} {}", method, path);

        let response = request.send().await?;

        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            // Force a new login on the next call
            self.access_token.write().await.take();
        }

        Self::check_status(response).await
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        let bytes = response.bytes().await?;

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn check_status(response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(GatewayError::AuthenticationFailed(format!("{status}: {body}")))
            }
            _ => Err(GatewayError::Unavailable(format!("{status}: {body}"))),
        }
    }
}

#[async_trait]
impl SlideGateway for GoSlideCloud {
    async fn login(&self) -> Result<(), GatewayError> {
        let request = LoginRequest {
            email: self.config.username.clone(),
            password: self.config.password.clone(),
        };

        let response = self
            .http_client
            .post(self.url("auth/login"))
            .json(&request)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let login: LoginResponse = serde_json::from_slice(&response.bytes().await?)?;

        *self.access_token.write().await = Some(login.access_token);

        tracing::info!("logged in to {} as {}", self.config.host, self.config.username);

        Ok(())
    }

    async fn slides_overview(&self) -> Result<Vec<SlideRecord>, GatewayError> {
        let overview: OverviewResponse = self.fetch("slides/overview").await?;
        Ok(overview.slides)
    }

    async fn slide_info(&self, id: SlideId) -> Result<SlideInfo, GatewayError> {
        let info: InfoResponse = self.fetch(&format!("slide/{id}/info")).await?;
        Ok(info.data)
    }

    async fn slide_set_position(&self, id: SlideId, position: f64) -> Result<(), GatewayError> {
        let body = PositionRequest {
            pos: position.clamp(0.0, 1.0),
        };
        self.send(Method::POST, &format!("slide/{id}/position"), Some(&body))
            .await?;
        Ok(())
    }

    async fn slide_stop(&self, id: SlideId) -> Result<(), GatewayError> {
        self.send::<()>(Method::POST, &format!("slide/{id}/stop"), None)
            .await?;
        Ok(())
    }
}
