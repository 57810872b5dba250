//! Google Sheets client for the waitlist spreadsheet.
//!
//! Authenticates as a service account (RS256 JWT grant against Google's
//! OAuth token endpoint) and appends rows via the Sheets `values.append`
//! API. One access token is minted per append — the endpoint is low-traffic
//! and the grant is a single round trip, so no token caching is kept.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

/// Range waitlist rows are appended to.
pub const WAITLIST_RANGE: &str = "Waitlist!A:E";

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Service-account credentials for the waitlist spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Target spreadsheet ID.
    pub spreadsheet_id: String,
    /// Service account email (`...@...iam.gserviceaccount.com`).
    pub service_account_email: String,
    /// RSA private key in PEM form.
    pub private_key_pem: String,
}

/// Spreadsheet client error.
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    /// The spreadsheet rejected us — a permissions problem, not retried.
    #[error("spreadsheet access denied: {0}")]
    Access(String),

    /// The service-account key could not be used to sign the grant.
    #[error("service account key rejected: {0}")]
    Credentials(#[from] jsonwebtoken::errors::Error),

    /// The request never completed.
    #[error("sheets request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status other than 403.
    #[error("sheets api error ({status}): {message}")]
    Upstream { status: u16, message: String },
}

/// Claims for the service-account JWT grant.
#[derive(Debug, Serialize)]
struct GrantClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct GrantResponse {
    access_token: String,
}

/// Client for appending rows to the waitlist spreadsheet.
pub struct SheetsClient {
    http: reqwest::Client,
    spreadsheet_id: String,
    service_account_email: String,
    signing_key: EncodingKey,
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .finish_non_exhaustive()
    }
}

impl SheetsClient {
    /// Build a client from service-account credentials.
    ///
    /// # Errors
    ///
    /// Returns `SheetsError::Credentials` if the private key is not valid
    /// RSA PEM.
    pub fn new(config: &SheetsConfig) -> Result<Self, SheetsError> {
        let signing_key = EncodingKey::from_rsa_pem(config.private_key_pem.as_bytes())?;
        Ok(Self {
            http: reqwest::Client::new(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            service_account_email: config.service_account_email.clone(),
            signing_key,
        })
    }

    /// Mint a short-lived access token via the JWT bearer grant.
    async fn access_token(&self) -> Result<String, SheetsError> {
        let now = chrono::Utc::now().timestamp();
        let claims = GrantClaims {
            iss: &self.service_account_email,
            scope: SHEETS_SCOPE,
            aud: TOKEN_URL,
            iat: now,
            exp: now + 3600,
        };

        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)?;

        let resp = self
            .http
            .post(TOKEN_URL)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let grant: GrantResponse = resp.json().await?;
        Ok(grant.access_token)
    }

    /// Append one row to the given range of the configured spreadsheet.
    ///
    /// # Errors
    ///
    /// Returns `SheetsError::Access` on a 403 from the API (the service
    /// account cannot reach the sheet), `SheetsError::Upstream` on any other
    /// non-success status, and `SheetsError::Http` on transport failure.
    pub async fn append_row(&self, range: &str, row: [String; 5]) -> Result<(), SheetsError> {
        let token = self.access_token().await?;

        let url = format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}:append?valueInputOption=USER_ENTERED",
            self.spreadsheet_id,
            urlencoding::encode(range),
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "values": [row] }))
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(SheetsError::Access(
                "the service account does not have access to the spreadsheet".to_owned(),
            ));
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(range, "row appended to spreadsheet");
        Ok(())
    }
}
