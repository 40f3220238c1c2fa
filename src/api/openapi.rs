//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{analytics, health, visitors};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Visitor Tracker API",
        version = "1.0.0",
        description = "Visitor check-in/check-out log and reporting REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Visitors
        visitors::list_visitors,
        visitors::create_visitor,
        visitors::list_active_visitors,
        visitors::get_daily_log,
        visitors::download_report,
        visitors::get_visitor,
        visitors::checkout_visitor,
        visitors::delete_visitor,
        // Analytics
        analytics::get_analytics,
    ),
    components(
        schemas(
            // Visitors
            crate::models::visitor::Visit,
            crate::models::visitor::VisitStatus,
            crate::models::visitor::CreateVisit,
            crate::models::visitor::CheckoutVisit,
            crate::models::visitor::VisitQuery,
            visitors::DailyLogQuery,
            visitors::DailyLogResponse,
            visitors::ReportQuery,
            // Analytics
            analytics::Window,
            analytics::AnalyticsQuery,
            analytics::AnalyticsResponse,
            analytics::SummaryStats,
            analytics::TrendPoint,
            analytics::CategoryShare,
            // Session
            crate::models::session::Role,
            crate::models::session::Capability,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "visitors", description = "Visitor check-in, check-out and reports"),
        (name = "analytics", description = "Visitor statistics")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_visitor_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/visitors",
            "/visitors/{id}",
            "/visitors/{id}/checkout",
            "/visitors/report",
            "/visitors/analytics",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        assert!(doc
            .components
            .as_ref()
            .map_or(false, |c| c.security_schemes.contains_key("bearer_auth")));
    }
}
