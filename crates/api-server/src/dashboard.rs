use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "templates/"]
#[include = "*.html"]
struct Templates;

const FALLBACK_PAGE: &str = "<html><head><title>Sentilytics</title></head><body>\
<h1>Sentilytics API</h1><p>API is running. Visit <a href=\"/docs\">/docs</a> for API documentation.</p>\
</body></html>";

/// Dashboard page, or a minimal pointer to the API docs if it was not embedded.
pub async fn index_page() -> Response {
    match Templates::get("index.html") {
        Some(file) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            file.data.into_owned(),
        )
            .into_response(),
        None => Html(FALLBACK_PAGE).into_response(),
    }
}
