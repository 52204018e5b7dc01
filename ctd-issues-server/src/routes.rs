//! HTTP handlers for the CTD issues documentation server.

use std::io;
use std::path::{Component, Path, PathBuf};

use actix_web::{HttpResponse, Responder, get, http::header, web};
use ctd_issues_core::{CtdIssuesError, IssueSummary, StdFileSystem, read_summary};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::openapi::ApiDoc;

const INDEX_FILE: &str = "index.html";

/// Shared application state for handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Directory holding the built documentation site.
    pub site_dir: PathBuf,
}

impl AppState {
    /// Build state from environment variables.
    #[cfg_attr(test, allow(dead_code))]
    pub fn from_env() -> Self {
        let site_dir =
            std::env::var("CTD_ISSUES_SITE_DIR").unwrap_or_else(|_| "site".to_string());
        Self {
            site_dir: PathBuf::from(site_dir),
        }
    }
}

/// Error response payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/issues",
    responses(
        (status = 200, description = "Grouped processing issues", body = [IssueSummary]),
        (status = 503, description = "Site has not been built", body = ErrorResponse)
    ),
    tag = "issues"
)]
#[get("/api/issues")]
/// List every grouped processing issue of the built site.
pub async fn list_issues(state: web::Data<AppState>) -> impl Responder {
    match load_issues(&state).await {
        Ok(issues) => HttpResponse::Ok().json(issues),
        Err(response) => response,
    }
}

#[utoipa::path(
    get,
    path = "/issues/{index}",
    params(
        ("index" = usize, Path, description = "Position of the issue in the summary")
    ),
    responses(
        (status = 200, description = "Processing issue", body = IssueSummary),
        (status = 404, description = "Unknown issue", body = ErrorResponse),
        (status = 503, description = "Site has not been built", body = ErrorResponse)
    ),
    tag = "issues"
)]
#[get("/api/issues/{index}")]
/// Fetch one grouped processing issue by position.
pub async fn get_issue(state: web::Data<AppState>, index: web::Path<usize>) -> impl Responder {
    let index = index.into_inner();
    let issues = match load_issues(&state).await {
        Ok(issues) => issues,
        Err(response) => return response,
    };
    match issues.into_iter().nth(index) {
        Some(issue) => HttpResponse::Ok().json(issue),
        None => HttpResponse::NotFound().json(ErrorResponse {
            message: format!("issue {index} not found"),
        }),
    }
}

#[utoipa::path(
    get,
    path = "/openapi.json",
    responses(
        (status = 200, description = "OpenAPI document", body = serde_json::Value)
    ),
    tag = "system"
)]
#[get("/api/openapi.json")]
/// Serve the OpenAPI document.
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

#[get("/{tail:.*}")]
/// Serve a file of the built site.
pub async fn site_file(state: web::Data<AppState>, tail: web::Path<String>) -> impl Responder {
    let Some(path) = resolve_site_path(&state.site_dir, &tail) else {
        return not_found(&tail);
    };
    let content_type = content_type_for(&path);
    let result = web::block(move || std::fs::read(&path)).await;
    match result {
        Ok(Ok(bytes)) => HttpResponse::Ok()
            .insert_header((header::CONTENT_TYPE, content_type))
            .body(bytes),
        Ok(Err(err)) if err.kind() == io::ErrorKind::NotFound => not_found(&tail),
        Ok(Err(err)) => {
            log::error!("failed to read site file {tail}: {err}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                message: format!("failed to read {tail}"),
            })
        }
        Err(err) => HttpResponse::InternalServerError().json(ErrorResponse {
            message: format!("failed to read {tail}: {err}"),
        }),
    }
}

async fn load_issues(state: &AppState) -> Result<Vec<IssueSummary>, HttpResponse> {
    let site_dir = state.site_dir.clone();
    let result = web::block(move || read_summary(&StdFileSystem::new(), &site_dir))
        .await
        .map_err(|err| {
            HttpResponse::InternalServerError().json(ErrorResponse {
                message: format!("summary load failed: {err}"),
            })
        })?;
    result.map_err(|err| match err {
        CtdIssuesError::Io(inner) if inner.kind() == io::ErrorKind::NotFound => {
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                message: "site has not been built; run `ctd-issues build`".to_string(),
            })
        }
        other => {
            log::error!("failed to load issue summary: {other}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                message: other.to_string(),
            })
        }
    })
}

/// Map a request tail onto a file of the site, rejecting anything outside it.
fn resolve_site_path(site_dir: &Path, tail: &str) -> Option<PathBuf> {
    let relative = Path::new(tail.trim_start_matches('/'));
    let mut resolved = site_dir.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if resolved.is_dir() {
        resolved.push(INDEX_FILE);
    }
    Some(resolved)
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("md") => "text/markdown; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn not_found(tail: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        message: format!("{tail} not found"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test as actix_test};
    use ctd_issues_core::{DEFAULT_ISSUE_TEMPLATE, SiteBuilder};

    fn unique_dir() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        std::env::temp_dir().join(format!("ctd_issues_server_test_{nanos}"))
    }

    fn sample_issues() -> Vec<IssueSummary> {
        vec![IssueSummary {
            organization: "HAKAI".to_string(),
            work_area: "QUADRA".to_string(),
            process_error_message: "Unknown reference station position".to_string(),
            hakai_ids: vec!["01907674_2016-10-20T16:55:00Z".to_string()],
            hakai_id_count: 1,
            process_error: "{\"message\":\"No lat/long information available for station QU39\"}"
                .to_string(),
            stations: vec!["QU39".to_string()],
        }]
    }

    struct TestSite {
        root: PathBuf,
    }

    impl TestSite {
        fn built() -> Self {
            let root = unique_dir();
            let fs = StdFileSystem::new();
            SiteBuilder::new(&fs, DEFAULT_ISSUE_TEMPLATE)
                .build(&root, &sample_issues(), generated_at())
                .expect("build site");
            Self { root }
        }

        fn empty() -> Self {
            let root = unique_dir();
            std::fs::create_dir_all(&root).expect("create site dir");
            Self { root }
        }

        fn state(&self) -> web::Data<AppState> {
            web::Data::new(AppState {
                site_dir: self.root.clone(),
            })
        }
    }

    impl Drop for TestSite {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    fn generated_at() -> chrono::DateTime<chrono::Utc> {
        use chrono::TimeZone;
        chrono::Utc
            .with_ymd_and_hms(2024, 6, 1, 0, 0, 0)
            .single()
            .expect("timestamp")
    }

    macro_rules! app {
        ($site:expr) => {
            actix_test::init_service(
                App::new()
                    .app_data($site.state())
                    .service(list_issues)
                    .service(get_issue)
                    .service(openapi_json)
                    .service(site_file),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn list_issues_returns_summary() {
        let site = TestSite::built();
        let app = app!(site);
        let req = actix_test::TestRequest::get().uri("/api/issues").to_request();
        let issues: Vec<IssueSummary> = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(issues, sample_issues());
    }

    #[actix_web::test]
    async fn get_issue_returns_single_issue_or_404() {
        let site = TestSite::built();
        let app = app!(site);

        let req = actix_test::TestRequest::get().uri("/api/issues/0").to_request();
        let issue: IssueSummary = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(issue.work_area, "QUADRA");

        let req = actix_test::TestRequest::get().uri("/api/issues/5").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn unbuilt_site_reports_unavailable() {
        let site = TestSite::empty();
        let app = app!(site);
        let req = actix_test::TestRequest::get().uri("/api/issues").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorResponse = actix_test::read_body_json(resp).await;
        assert!(body.message.contains("ctd-issues build"));
    }

    #[actix_web::test]
    async fn serves_index_and_issue_pages() {
        let site = TestSite::built();
        let app = app!(site);

        let req = actix_test::TestRequest::get().uri("/").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).map(|value| value.as_bytes()),
            Some("text/html; charset=utf-8".as_bytes())
        );
        let body = actix_test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("Hakai CTD processing issues"));

        let req = actix_test::TestRequest::get()
            .uri("/issues/issue-0.md")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = actix_test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("title: Unknown reference station position"));
    }

    #[actix_web::test]
    async fn missing_files_return_404() {
        let site = TestSite::built();
        let app = app!(site);
        let req = actix_test::TestRequest::get().uri("/nope.html").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn openapi_lists_issue_routes() {
        let site = TestSite::empty();
        let app = app!(site);
        let req = actix_test::TestRequest::get()
            .uri("/api/openapi.json")
            .to_request();
        let doc: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert!(doc["paths"]["/issues"].is_object());
        assert!(doc["paths"]["/issues/{index}"].is_object());
    }

    #[test]
    fn resolve_site_path_rejects_traversal() {
        let root = Path::new("/srv/site");
        assert_eq!(resolve_site_path(root, "../etc/passwd"), None);
        assert_eq!(resolve_site_path(root, "issues/../../secret"), None);
        assert_eq!(
            resolve_site_path(root, "issues/issue-0.md"),
            Some(PathBuf::from("/srv/site/issues/issue-0.md"))
        );
        assert_eq!(
            resolve_site_path(root, "./summary.json"),
            Some(PathBuf::from("/srv/site/summary.json"))
        );
    }

    #[test]
    fn content_types_follow_extensions() {
        assert_eq!(content_type_for(Path::new("a.json")), "application/json");
        assert_eq!(
            content_type_for(Path::new("issue-0.md")),
            "text/markdown; charset=utf-8"
        );
        assert_eq!(
            content_type_for(Path::new("blob")),
            "application/octet-stream"
        );
    }
}
