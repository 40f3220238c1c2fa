//! Visitor check-in/check-out endpoints

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::{
        session::Capability,
        visitor::{CheckoutVisit, CreateVisit, Visit, VisitQuery, VisitStatus},
    },
    services::export::CSV_FILENAME,
};

use super::AuthenticatedUser;

/// Query parameters for the daily log
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct DailyLogQuery {
    /// Local date, YYYY-MM-DD (default: today)
    pub date: Option<String>,
    /// open (still inside) or closed (checked out)
    pub status: Option<VisitStatus>,
}

/// Visits of one local day with the day's counts
#[derive(Debug, Serialize, ToSchema)]
pub struct DailyLogResponse {
    pub date: NaiveDate,
    /// Check-ins that day
    pub total: i64,
    pub currently_inside: i64,
    pub checked_out: i64,
    /// Rows for the selected status tab, newest first
    pub visitors: Vec<Visit>,
}

/// Query parameters for the CSV report
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    /// First local day included (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Last local day included (YYYY-MM-DD)
    pub end_date: Option<String>,
}

fn parse_date(field: &str, value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| AppError::Validation(format!("{} must be a date (YYYY-MM-DD)", field)))
        })
        .transpose()
}

/// Exit time from an optional checkout body; an empty body means now
fn parse_checkout(body: &[u8]) -> AppResult<Option<DateTime<Utc>>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let data: CheckoutVisit = serde_json::from_slice(body).map_err(|e| {
        AppError::invalid_field("check_out_time", format!("Invalid check-out time: {}", e))
    })?;
    Ok(data.check_out_time)
}

/// List visits
#[utoipa::path(
    get,
    path = "/visitors",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(VisitQuery),
    responses(
        (status = 200, description = "Visits, newest check-in first", body = Vec<Visit>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_visitors(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<Vec<Visit>>> {
    claims.require(Capability::ViewVisitors)?;

    let visits = state.services.visitors.list(query.status).await?;
    Ok(Json(visits))
}

/// Check a visitor in
#[utoipa::path(
    post,
    path = "/visitors",
    tag = "visitors",
    security(("bearer_auth" = [])),
    request_body = CreateVisit,
    responses(
        (status = 201, description = "Visit recorded", body = Visit),
        (status = 422, description = "Invalid fields", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    payload: Result<Json<CreateVisit>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Visit>)> {
    claims.require(Capability::RecordVisits)?;

    let Json(data) = payload?;
    let visit = state.services.visitors.create(data).await?;
    Ok((StatusCode::CREATED, Json(visit)))
}

/// Visitors currently on premises
#[utoipa::path(
    get,
    path = "/visitors/active",
    tag = "visitors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Open visits", body = Vec<Visit>)
    )
)]
pub async fn list_active_visitors(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Visit>>> {
    claims.require(Capability::ViewVisitors)?;

    let visits = state.services.visitors.active().await?;
    Ok(Json(visits))
}

/// Visits of one day
#[utoipa::path(
    get,
    path = "/visitors/daily-log",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(DailyLogQuery),
    responses(
        (status = 200, description = "Daily log", body = DailyLogResponse),
        (status = 400, description = "Malformed date")
    )
)]
pub async fn get_daily_log(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<DailyLogQuery>,
) -> AppResult<Json<DailyLogResponse>> {
    claims.require(Capability::ViewVisitors)?;

    let date = parse_date("date", query.date.as_deref())?;
    let log = state.services.visitors.daily_log(date, query.status).await?;
    Ok(Json(log))
}

/// Download visits as CSV
#[utoipa::path(
    get,
    path = "/visitors/report",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(ReportQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 400, description = "Malformed date")
    )
)]
pub async fn download_report(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    claims.require(Capability::ExportReports)?;

    let start = parse_date("start_date", query.start_date.as_deref())?;
    let end = parse_date("end_date", query.end_date.as_deref())?;
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::Validation(
                "end_date must not be before start_date".to_string(),
            ));
        }
    }

    let csv = state.services.visitors.export_csv(start, end).await?;
    let disposition = format!("attachment; filename=\"{}\"", CSV_FILENAME);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

/// Get visit by ID
#[utoipa::path(
    get,
    path = "/visitors/{id}",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visit details", body = Visit),
        (status = 404, description = "Visit not found")
    )
)]
pub async fn get_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Visit>> {
    claims.require(Capability::ViewVisitors)?;

    let visit = state.services.visitors.get(id).await?;
    Ok(Json(visit))
}

/// Check a visitor out
#[utoipa::path(
    post,
    path = "/visitors/{id}/checkout",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Visit ID")),
    request_body(content = CheckoutVisit, description = "Exit time, defaults to now"),
    responses(
        (status = 200, description = "Visit closed", body = Visit),
        (status = 404, description = "Visit not found"),
        (status = 422, description = "Malformed exit time or exit before entry", body = crate::error::ErrorResponse)
    )
)]
pub async fn checkout_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    body: Bytes,
) -> AppResult<Json<Visit>> {
    claims.require(Capability::RecordVisits)?;

    let at = parse_checkout(&body)?;
    let visit = state.services.visitors.check_out(id, at).await?;
    Ok(Json(visit))
}

/// Delete a visit
#[utoipa::path(
    delete,
    path = "/visitors/{id}",
    tag = "visitors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Visit ID")),
    responses(
        (status = 204, description = "Visit deleted"),
        (status = 403, description = "Role may not delete visits"),
        (status = 404, description = "Visit not found")
    )
)]
pub async fn delete_visitor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require(Capability::DeleteVisits)?;

    state.services.visitors.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::Request,
        Router,
    };
    use tower::ServiceExt;

    use crate::{
        api::create_router,
        config::AppConfig,
        models::session::{Role, SessionClaims},
        repository::{memory::MemoryVisitorStore, Repository},
        services::Services,
        AppState,
    };

    const SECRET: &str = "test-secret";

    fn app() -> Router {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = SECRET.to_string();
        let repository = Repository::with_store(Arc::new(MemoryVisitorStore::new()));
        let services = Services::new(repository, &config.reporting);
        create_router(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }

    fn token(role: Role) -> String {
        let now = Utc::now().timestamp();
        SessionClaims {
            sub: "staff@example.org".into(),
            user_id: 1,
            name: "Staff".into(),
            role,
            exp: now + 3600,
            iat: now,
        }
        .create_token(SECRET)
        .unwrap()
    }

    fn request(method: &str, uri: &str, role: Option<Role>, body: Option<serde_json::Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(role) = role {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(role)));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, bytes.to_vec())
    }

    fn json(bytes: &[u8]) -> serde_json::Value {
        serde_json::from_slice(bytes).unwrap()
    }

    fn jane() -> serde_json::Value {
        serde_json::json!({
            "name": "Jane Doe",
            "phone": "5551234",
            "purpose": "Meeting",
            "host_name": "Mr. Smith",
            "email": "jane@example.org"
        })
    }

    #[tokio::test]
    async fn test_check_in_and_out() {
        let app = app();

        let (status, _, body) = send(&app, request("POST", "/api/v1/visitors", Some(Role::Security), Some(jane()))).await;
        assert_eq!(status, StatusCode::CREATED);
        let created = json(&body);
        assert_eq!(created["name"], "Jane Doe");
        assert!(created["check_out_time"].is_null());
        assert!(created.get("deleted_at").is_none());
        let id = created["id"].as_i64().unwrap();

        let (_, _, body) = send(&app, request("GET", "/api/v1/visitors/active", Some(Role::Security), None)).await;
        assert_eq!(json(&body).as_array().unwrap().len(), 1);

        let uri = format!("/api/v1/visitors/{}/checkout", id);
        let (status, _, body) = send(&app, request("POST", &uri, Some(Role::Security), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json(&body)["check_out_time"].is_string());

        let (_, _, body) = send(&app, request("GET", "/api/v1/visitors/active", Some(Role::Security), None)).await;
        assert!(json(&body).as_array().unwrap().is_empty());

        let (_, _, body) = send(&app, request("GET", "/api/v1/visitors?status=closed", Some(Role::Security), None)).await;
        assert_eq!(json(&body).as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_fields_reported_per_field() {
        let app = app();
        let (status, _, body) = send(
            &app,
            request("POST", "/api/v1/visitors", Some(Role::Admin), Some(serde_json::json!({ "name": "  " }))),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = json(&body);
        assert_eq!(body["error"], "BadValue");
        for field in ["name", "phone", "purpose"] {
            assert!(body["fields"][field].is_array(), "missing {}", field);
        }
    }

    #[tokio::test]
    async fn test_auth_and_role_gating() {
        let app = app();

        let (status, _, _) = send(&app, request("GET", "/api/v1/visitors", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = send(&app, request("GET", "/api/v1/visitors/analytics", Some(Role::Security), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = send(&app, request("GET", "/api/v1/visitors/analytics?window=week", Some(Role::Admin), None)).await;
        assert_eq!(status, StatusCode::OK);

        send(&app, request("POST", "/api/v1/visitors", Some(Role::Security), Some(jane()))).await;
        let (status, _, _) = send(&app, request("DELETE", "/api/v1/visitors/1", Some(Role::Security), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_delete_hides_visit() {
        let app = app();
        send(&app, request("POST", "/api/v1/visitors", Some(Role::Admin), Some(jane()))).await;

        let (status, _, _) = send(&app, request("DELETE", "/api/v1/visitors/1", Some(Role::Admin), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, body) = send(&app, request("GET", "/api/v1/visitors/1", Some(Role::Admin), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json(&body)["error"], "NoSuchVisit");

        let (status, _, _) = send(&app, request("DELETE", "/api/v1/visitors/1", Some(Role::Admin), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_report_download() {
        let app = app();
        send(&app, request("POST", "/api/v1/visitors", Some(Role::Security), Some(jane()))).await;

        let (status, headers, body) = send(&app, request("GET", "/api/v1/visitors/report", Some(Role::Security), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"visitors_report.csv\""
        );
        let text = String::from_utf8(body).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("Name,Email,Phone,Purpose,Check-In Time,Check-Out Time,Host Name,Company\n"));

        let (status, _, _) = send(
            &app,
            request("GET", "/api/v1/visitors/report?start_date=2024-13-01", Some(Role::Security), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_daily_log_today() {
        let app = app();
        send(&app, request("POST", "/api/v1/visitors", Some(Role::Security), Some(jane()))).await;

        let (status, _, body) = send(&app, request("GET", "/api/v1/visitors/daily-log?status=closed", Some(Role::Security), None)).await;
        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert_eq!(body["total"], 1);
        assert_eq!(body["currently_inside"], 1);
        assert!(body["visitors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_rejects_malformed_time() {
        let app = app();
        send(&app, request("POST", "/api/v1/visitors", Some(Role::Security), Some(jane()))).await;

        let (status, _, body) = send(
            &app,
            request(
                "POST",
                "/api/v1/visitors/1/checkout",
                Some(Role::Security),
                Some(serde_json::json!({ "check_out_time": "not-a-date" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json(&body)["fields"]["check_out_time"].is_array());

        let (_, _, body) = send(&app, request("GET", "/api/v1/visitors/1", Some(Role::Security), None)).await;
        assert!(json(&body)["check_out_time"].is_null());
    }

    #[tokio::test]
    async fn test_checkout_with_explicit_time() {
        let app = app();
        send(&app, request("POST", "/api/v1/visitors", Some(Role::Security), Some(jane()))).await;

        let at = Utc::now() + chrono::Duration::minutes(1);
        let (status, _, body) = send(
            &app,
            request(
                "POST",
                "/api/v1/visitors/1/checkout",
                Some(Role::Security),
                Some(serde_json::json!({ "check_out_time": at.to_rfc3339() })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let closed: DateTime<Utc> =
            serde_json::from_value(json(&body)["check_out_time"].clone()).unwrap();
        assert_eq!(closed, at);
    }

    #[tokio::test]
    async fn test_create_wrong_field_type_reported_per_field() {
        let app = app();
        let mut body = jane();
        body["phone"] = serde_json::json!(5551234);

        let (status, _, body) = send(&app, request("POST", "/api/v1/visitors", Some(Role::Security), Some(body))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = json(&body);
        assert_eq!(body["error"], "BadValue");
        assert!(body["fields"]["phone"].is_array());
    }

    #[tokio::test]
    async fn test_out_of_range_dates_rejected() {
        let app = app();
        for uri in [
            "/api/v1/visitors/daily-log?date=%2B262143-12-31",
            "/api/v1/visitors/report?end_date=%2B262143-12-31",
        ] {
            let (status, _, _) = send(&app, request("GET", uri, Some(Role::Security), None)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        }
    }
}
