use axum::http::StatusCode;

pub async fn hc() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
