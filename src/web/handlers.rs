//! HTTP handlers for the setup entry point and REST endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::core::config::{OrganizationConfig, INTEGRATIONS_FEATURE};
use crate::core::{RequestMethod, SetupRequest};
use crate::pipeline::{EntryResponse, PipelineResponse};
use crate::session::{new_session_id, SessionHandle};
use crate::web::error::{ApiError, ApiResult};
use crate::web::responses::{IntegrationResponse, ProviderConfigResponse, ProviderResponse};
use crate::web::AppState;

/// Header carrying the authenticated user id
pub const USER_HEADER: &str = "x-user-id";

/// Where unauthenticated browsers are sent
pub const LOGIN_URL: &str = "/auth/login/";

/// Default and maximum page size for listings
pub const MAX_PER_PAGE: usize = 100;

/// Query parameters for paginated listings
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Offset of the first result
    pub cursor: Option<usize>,

    /// Results per page
    pub per_page: Option<usize>,
}

impl PageQuery {
    fn offset(&self) -> usize {
        self.cursor.unwrap_or(0)
    }

    fn limit(&self) -> usize {
        self.per_page.unwrap_or(MAX_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }
}

/// Authenticated user id, if any
fn actor(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Session id from the request cookies, if any
fn session_cookie(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// 302 redirect
fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Resolve the organization for an API request and check membership
fn authorize_api<'a>(
    state: &'a AppState,
    headers: &HeaderMap,
    slug: &str,
) -> ApiResult<(&'a OrganizationConfig, String)> {
    let user_id = actor(headers).ok_or_else(ApiError::unauthorized)?;
    let org = state
        .config
        .organization(slug)
        .ok_or_else(|| ApiError::not_found(format!("organization {}", slug)))?;
    if !org.has_member(&user_id) {
        return Err(ApiError::forbidden());
    }
    Ok((org, user_id))
}

/// GET|POST /organizations/:slug/integrations/:provider_id/setup/
pub async fn setup(
    State(state): State<AppState>,
    Path((slug, provider_id)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    jar: CookieJar,
    Query(query): Query<HashMap<String, String>>,
    form: Option<Form<HashMap<String, String>>>,
) -> Result<Response, ApiError> {
    let Some(user_id) = actor(&headers) else {
        return Ok(redirect(LOGIN_URL));
    };
    let Some(org) = state.config.organization(&slug) else {
        return Ok(redirect(LOGIN_URL));
    };
    if !org.has_member(&user_id) {
        debug!("User {} is not a member of {}", user_id, slug);
        return Ok(redirect(LOGIN_URL));
    }

    let request = SetupRequest {
        method: if method == Method::POST {
            RequestMethod::Post
        } else {
            RequestMethod::Get
        },
        user_id,
        form: match (&method, form) {
            (&Method::POST, Some(Form(fields))) => fields,
            _ => HashMap::new(),
        },
        query,
    };

    let cookie_name = state.config.session_cookie.clone();
    let existing_session = session_cookie(&jar, &cookie_name);
    let session_id = existing_session.clone().unwrap_or_else(new_session_id);
    let session = SessionHandle::new(state.sessions.clone(), session_id);

    let outcome = state
        .entry
        .handle(&request, session, org.organization(), &provider_id)
        .await?;

    let (response, session) = match outcome {
        EntryResponse::Denied { redirect_to } => return Ok(redirect(&redirect_to)),
        EntryResponse::Pipeline { response, session } => (response, session),
    };

    let http_response = match response {
        PipelineResponse::Page(page) => {
            let status = StatusCode::from_u16(page.status).unwrap_or(StatusCode::OK);
            (status, Html(page.body)).into_response()
        }
        PipelineResponse::Completed {
            integration,
            redirect_to,
        } => {
            info!("Integration {} installed for {}", integration.id, slug);
            redirect(&redirect_to)
        }
        PipelineResponse::Aborted {
            message,
            redirect_to,
        } => {
            let body = format!(
                "<p class=\"error\">{}</p><a href=\"{}\">Back to integrations</a>",
                escape_html(&message),
                escape_html(&redirect_to)
            );
            (StatusCode::BAD_REQUEST, Html(body)).into_response()
        }
    };

    if session.is_modified() && existing_session.is_none() {
        let cookie = Cookie::build((cookie_name, session.session_id().to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        return Ok((jar.add(cookie), http_response).into_response());
    }

    Ok(http_response)
}

/// GET /api/0/organizations/:slug/integrations/ - List installed integrations
pub async fn list_integrations(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Query(page): Query<PageQuery>,
) -> ApiResult<Response> {
    let (org, user_id) = authorize_api(&state, &headers, &slug)?;
    let organization = org.organization();

    if !state
        .features
        .has_feature(INTEGRATIONS_FEATURE, &organization, &user_id)
        .await?
    {
        return Err(ApiError::feature_disabled());
    }

    let offset = page.offset();
    let limit = page.limit();
    let mut integrations = state
        .entry
        .services()
        .store
        .list_for_organization(organization.id, offset, limit + 1)
        .await?;

    let has_next = integrations.len() > limit;
    integrations.truncate(limit);
    let has_previous = offset > 0;

    let path = state
        .config
        .absolute_uri(&format!("/api/0/organizations/{}/integrations/", slug));
    let link = format!(
        "<{path}?cursor={prev}&per_page={limit}>; rel=\"previous\"; results=\"{has_previous}\", \
         <{path}?cursor={next}&per_page={limit}>; rel=\"next\"; results=\"{has_next}\"",
        path = path,
        prev = offset.saturating_sub(limit),
        next = offset + limit,
        limit = limit,
        has_previous = has_previous,
        has_next = has_next,
    );

    let body: Vec<IntegrationResponse> = integrations.iter().map(IntegrationResponse::from).collect();
    let mut response = Json(body).into_response();
    let link = HeaderValue::from_str(&link)
        .map_err(|e| ApiError::internal(format!("Invalid Link header: {}", e)))?;
    response.headers_mut().insert(header::LINK, link);
    Ok(response)
}

/// GET /api/0/organizations/:slug/config/integrations/ - Installable providers
pub async fn integration_config(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<ProviderConfigResponse>> {
    let (org, user_id) = authorize_api(&state, &headers, &slug)?;
    let organization = org.organization();

    if !state
        .features
        .has_feature(INTEGRATIONS_FEATURE, &organization, &user_id)
        .await?
    {
        return Err(ApiError::feature_disabled());
    }

    let providers = state
        .entry
        .services()
        .registry
        .all()
        .map(|provider| {
            let setup_uri = state.config.absolute_uri(&format!(
                "/organizations/{}/integrations/{}/setup/",
                slug, provider.id
            ));
            ProviderResponse::new(provider, setup_uri)
        })
        .collect();

    Ok(Json(ProviderConfigResponse { providers }))
}

/// GET /api/health - Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "integration-pipeline",
        "version": env!("CARGO_PKG_VERSION"),
        "providers": state.entry.services().registry.len(),
    }))
}

/// Create router with all endpoints
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route(
            "/api/0/organizations/:slug/integrations/",
            get(list_integrations),
        )
        .route(
            "/api/0/organizations/:slug/config/integrations/",
            get(integration_config),
        )
        .route(
            "/organizations/:slug/integrations/:provider_id/setup/",
            get(setup).post(setup),
        )
}
