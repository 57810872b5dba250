//! Waitlist submission route.
//!
//! `POST /api/submit-waitlist` — appends one lead row to the waitlist
//! spreadsheet. Fails fast with a configuration error when spreadsheet
//! credentials are absent, before any external call is attempted.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::sheets;
use crate::state::AppState;

/// Request body for a waitlist submission.
#[derive(Debug, Deserialize)]
pub struct WaitlistRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub plan: String,
}

/// Success response body.
#[derive(Debug, Serialize)]
pub struct WaitlistResponse {
    pub message: &'static str,
}

/// `POST /api/submit-waitlist` — record a lead in the waitlist spreadsheet.
pub async fn submit_waitlist(
    State(state): State<Arc<AppState>>,
    Json(body): Json<WaitlistRequest>,
) -> Result<Json<WaitlistResponse>, ApiError> {
    let sheets = state.sheets.as_ref().ok_or_else(|| {
        ApiError::Configuration("spreadsheet credentials are not configured".to_owned())
    })?;

    let row = lead_row(&body, Utc::now().date_naive());
    sheets.append_row(sheets::WAITLIST_RANGE, row).await?;

    tracing::info!(plan = %body.plan, "waitlist entry recorded");
    Ok(Json(WaitlistResponse { message: "Success" }))
}

/// Build the spreadsheet row for a lead: the four submitted fields plus the
/// submission date in day/month/year order.
fn lead_row(form: &WaitlistRequest, submitted: NaiveDate) -> [String; 5] {
    [
        form.name.clone(),
        form.email.clone(),
        form.phone.clone(),
        form.plan.clone(),
        submitted.format("%d/%m/%Y").to_string(),
    ]
}
