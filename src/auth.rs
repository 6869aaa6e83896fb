use std::path::Path;

use yup_oauth2::authenticator::Authenticator;
use yup_oauth2::{InstalledFlowAuthenticator, InstalledFlowReturnMethod};

use crate::errors::{AppError, AppResult};

/// Upload-only scope; the tool never needs to read or manage the channel.
pub const UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";

type HttpsConnector = hyper_rustls::HttpsConnector<hyper::client::HttpConnector>;

/// Wraps the installed-app OAuth flow. Built once at startup; hands out
/// fresh bearer tokens on demand so an access token that expires during
/// the long inter-upload waits is refreshed transparently.
pub struct AuthProvider {
    inner: Authenticator<HttpsConnector>,
}

impl AuthProvider {
    /// Reads the client secrets file and runs the consent flow if no
    /// cached token exists yet. Fails before any file is processed on
    /// missing/invalid secrets or a declined consent.
    pub async fn from_client_secrets(
        client_secrets: &Path,
        token_cache: &Path,
    ) -> AppResult<Self> {
        let secret = yup_oauth2::read_application_secret(client_secrets)
            .await
            .map_err(|e| {
                AppError::auth(format!(
                    "failed to read {}: {}",
                    client_secrets.display(),
                    e
                ))
            })?;

        let inner = InstalledFlowAuthenticator::builder(
            secret,
            InstalledFlowReturnMethod::HTTPRedirect,
        )
        .persist_tokens_to_disk(token_cache)
        .build()
        .await
        .map_err(|e| AppError::auth(format!("installed flow failed: {}", e)))?;

        log::info!("OAuth authenticator ready (scope: {})", UPLOAD_SCOPE);
        Ok(Self { inner })
    }

    /// Current access token for the upload scope, refreshing if needed.
    pub async fn access_token(&self) -> AppResult<String> {
        let token = self
            .inner
            .token(&[UPLOAD_SCOPE])
            .await
            .map_err(|e| AppError::auth(format!("token request failed: {}", e)))?;

        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| AppError::auth("token response carried no access token"))
    }
}
