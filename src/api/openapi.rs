//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the result-export REST API using
//! utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the result-export REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "result-export REST API",
        version = "0.1.0",
        description = "Browse stored task results and download them as compressed SQL, CSV or JSON-lines exports",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:6790", description = "Local development server")
    ),
    paths(
        // Results
        crate::api::routes::list_results,
        crate::api::routes::export_results,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(
        schemas(
            crate::types::ResultRecord,
            crate::types::ResultPage,
            crate::types::TaskId,
            crate::types::ExportFormat,
            crate::error::ApiError,
            crate::api::routes::ResultQuery,
            crate::api::routes::ExportQuery,
        )
    ),
    tags(
        (name = "results", description = "Result listing and export"),
        (name = "system", description = "Health and API documentation")
    )
)]
pub struct ApiDoc;
