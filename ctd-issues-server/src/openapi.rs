//! OpenAPI specification for the CTD issues server.

use utoipa::OpenApi;

use ctd_issues_core::IssueSummary;

use crate::routes::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::list_issues,
        crate::routes::get_issue,
        crate::routes::openapi_json
    ),
    components(schemas(IssueSummary, ErrorResponse)),
    tags(
        (name = "issues", description = "Grouped CTD processing issues"),
        (name = "system", description = "System endpoints")
    )
)]
/// OpenAPI specification for the CTD issues server.
pub struct ApiDoc;
