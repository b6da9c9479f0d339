use serde::Deserialize;

use crate::error::GatewayError;

/// Error codes meaning "margin type already set". Treated as success.
pub const MARGIN_TYPE_UNCHANGED_CODES: &[i64] = &[-4046];

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i64,
    pub msg: String,
}

/// Maps a non-success HTTP reply to a typed error, keeping Binance's code when present.
pub fn error_from_body(status: u16, body: &str) -> GatewayError {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api) => GatewayError::Api {
            code: api.code,
            msg: api.msg,
        },
        Err(_) => GatewayError::Http {
            status,
            body: body.to_string(),
        },
    }
}

pub fn is_margin_type_unchanged(err: &GatewayError) -> bool {
    matches!(err, GatewayError::Api { code, .. } if MARGIN_TYPE_UNCHANGED_CODES.contains(code))
}
