/// Uniform response envelope
///
/// Every endpoint wraps its payload in `{statusCode, data, message,
/// success}` where `success = statusCode < 400`. Error responses use the
/// same shape with `data: null` (see `error.rs`).
use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status_code: u16, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code,
            data,
            message: message.into(),
            success: status_code < 400,
        }
    }

    /// 200 envelope
    pub fn ok(data: T, message: impl Into<String>) -> HttpResponse {
        HttpResponse::Ok().json(Self::new(200, data, message))
    }

    /// 201 envelope
    pub fn created(data: T, message: impl Into<String>) -> HttpResponse {
        HttpResponse::Created().json(Self::new(201, data, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_uses_camel_case_keys() {
        let body = serde_json::to_value(ApiResponse::new(200, vec![1, 2], "ok")).unwrap();
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["data"], serde_json::json!([1, 2]));
        assert_eq!(body["message"], "ok");
        assert_eq!(body["success"], true);
    }

    #[test]
    fn success_tracks_status_code() {
        assert!(ApiResponse::new(201, (), "created").success);
        assert!(!ApiResponse::new(404, (), "missing").success);
    }
}
