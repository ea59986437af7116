use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentRequest {
    #[validate(
        required(message = "amount is required"),
        range(min = 0.01, message = "amount must be positive")
    )]
    pub amount: Option<f64>,

    #[validate(length(equal = 3, message = "currency must be an ISO 4217 code"))]
    pub currency: Option<String>,

    #[serde(rename = "type")]
    pub payment_type: Option<String>,

    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub success: bool,
    pub payment_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: &'static str,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBetRequest {
    #[validate(required(message = "matchId is required"), length(min = 1))]
    pub match_id: Option<String>,

    #[validate(required(message = "selection is required"), length(min = 1))]
    pub selection: Option<String>,

    #[validate(
        required(message = "stake is required"),
        range(min = 0.01, message = "stake must be positive")
    )]
    pub stake: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetResponse {
    pub success: bool,
    pub bet_id: String,
    pub match_id: String,
    pub selection: String,
    pub stake: f64,
    pub placed_at: DateTime<Utc>,
}
