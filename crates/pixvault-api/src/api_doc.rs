//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use pixvault_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pixvault API",
        version = "0.1.0",
        description = "Image upload and serving. Uploads are probed before they are stored; reads can request a resized variant which is generated once and cached on disk."
    ),
    paths(
        handlers::upload::upload_image,
        handlers::media_get::get_image,
    ),
    components(
        schemas(
            models::UploadResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "uploads", description = "Image upload and variant retrieval")
    )
)]
struct ApiDoc;
