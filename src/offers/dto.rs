use serde::{Deserialize, Serialize};

use super::store::OfferCode;

#[derive(Debug, Deserialize)]
pub struct OfferSignupRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OfferSignupResponse {
    pub success: bool,
    pub data: OfferCode,
}

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OfferList {
    pub used: usize,
    pub unused: usize,
    pub offers: Vec<OfferCode>,
}
