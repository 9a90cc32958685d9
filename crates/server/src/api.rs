use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use lastfit_core::catalog::{all_last_descriptions, display_name, last_description, LastDescription};
use lastfit_core::domain::calculation::{NewSizeCalculation, SizeCalculation};
use lastfit_core::domain::measurement::{FootMeasurements, SizeQuery};
use lastfit_core::domain::sizing::{SizeCalculationResult, WidthClass};
use lastfit_core::domain::validation::{FieldError, ValidationErrors};
use lastfit_core::errors::{ApplicationError, InterfaceError};
use lastfit_core::sizing::{ReferenceDataset, SizingEngine};
use lastfit_db::SizeCalculationRepository;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::measure::MeasurementForwarder;

const PHOTO_BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn SizingEngine>,
    pub dataset: Arc<ReferenceDataset>,
    pub store: Arc<dyn SizeCalculationRepository>,
    pub measurement: Arc<MeasurementForwarder>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// An [`InterfaceError`] rendered as an HTTP response.
///
/// The body stays generic; the correlation id travels in a response header so
/// a client report can be matched to the server log line.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.user_message();
        let correlation_id = self.0.correlation_id().to_owned();
        let (status, details) = match self.0 {
            InterfaceError::BadRequest { details, .. } => (StatusCode::BAD_REQUEST, Some(details)),
            InterfaceError::BadGateway { .. } => (StatusCode::BAD_GATEWAY, None),
            InterfaceError::ServiceUnavailable { .. } => (StatusCode::SERVICE_UNAVAILABLE, None),
            InterfaceError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };
        (
            status,
            [(CORRELATION_ID_HEADER, correlation_id)],
            Json(ErrorBody { error: message, details }),
        )
            .into_response()
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSummary {
    pub name: String,
    pub display_name: String,
    pub available_widths: Vec<WidthClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<LastDescription>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastRecommendation {
    pub last_type: String,
    pub display_name: String,
    pub result: SizeCalculationResult,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsResponse {
    pub foot_length: f64,
    pub ball_girth: f64,
    pub results: Vec<LastRecommendation>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/size-calculation", post(create_size_calculation))
        .route("/api/size-calculations", get(list_size_calculations))
        .route("/api/size-recommendation", post(recommend_size))
        .route("/api/size-recommendations", post(recommend_sizes))
        .route("/api/lasts", get(list_lasts))
        .route(
            "/api/measure-foot",
            post(measure_foot).layer(DefaultBodyLimit::max(PHOTO_BODY_LIMIT_BYTES)),
        )
        .with_state(state)
}

fn correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn reject(error: impl Into<ApplicationError>, correlation_id: &str) -> ApiError {
    ApiError(error.into().into_interface(correlation_id))
}

/// Parses a JSON body, mapping malformed input to a root-level field error.
fn parse_body(body: &Bytes) -> Result<Value, ValidationErrors> {
    serde_json::from_slice::<Value>(body)
        .map_err(|error| ValidationErrors::malformed(format!("Malformed JSON: {error}")))
}

fn log_rejected(route: &'static str, correlation_id: &str, errors: &ValidationErrors) {
    let fields = errors.fields().collect::<Vec<_>>();
    warn!(
        event_name = "api.request.rejected",
        correlation_id = %correlation_id,
        route = route,
        fields = ?fields,
        "request failed validation"
    );
}

pub async fn create_size_calculation(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SizeCalculation>, ApiError> {
    let correlation_id = correlation_id();
    let submission = parse_body(&body)
        .and_then(|payload| NewSizeCalculation::from_payload(&payload, Utc::now()))
        .map_err(|errors| {
            log_rejected("/api/size-calculation", &correlation_id, &errors);
            reject(errors, &correlation_id)
        })?;

    let stored = state.store.create_size_calculation(submission).await.map_err(|err| {
        error!(
            event_name = "api.size_calculation.persist_failed",
            correlation_id = %correlation_id,
            error = %err,
            "size calculation could not be stored"
        );
        reject(err, &correlation_id)
    })?;

    info!(
        event_name = "api.size_calculation.created",
        correlation_id = %correlation_id,
        calculation_id = stored.id.0,
        last_type = %stored.last_type,
        "size calculation recorded"
    );
    Ok(Json(stored))
}

pub async fn list_size_calculations(
    State(state): State<AppState>,
) -> Result<Json<Vec<SizeCalculation>>, ApiError> {
    let correlation_id = correlation_id();
    let calculations = state.store.size_calculations().await.map_err(|err| {
        error!(
            event_name = "api.size_calculation.list_failed",
            correlation_id = %correlation_id,
            error = %err,
            "size calculations could not be listed"
        );
        reject(err, &correlation_id)
    })?;
    Ok(Json(calculations))
}

pub async fn recommend_size(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SizeCalculationResult>, ApiError> {
    let correlation_id = correlation_id();
    let query = parse_body(&body).and_then(|payload| SizeQuery::from_payload(&payload)).map_err(
        |errors| {
            log_rejected("/api/size-recommendation", &correlation_id, &errors);
            reject(errors, &correlation_id)
        },
    )?;

    let result = state.engine.calculate_size(&query.last_type, query.foot_length, query.ball_girth);
    info!(
        event_name = "api.recommendation.calculated",
        correlation_id = %correlation_id,
        last_type = %query.last_type,
        confidence = result.confidence,
        recommendations = result.recommendations.len(),
        "size recommendation calculated"
    );
    Ok(Json(result))
}

pub async fn recommend_sizes(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let correlation_id = correlation_id();
    let measurements = parse_body(&body)
        .and_then(|payload| FootMeasurements::from_payload(&payload))
        .map_err(|errors| {
            log_rejected("/api/size-recommendations", &correlation_id, &errors);
            reject(errors, &correlation_id)
        })?;

    let (foot_length, ball_girth) = measurements.effective();
    let results = state
        .engine
        .calculate_all(foot_length, ball_girth)
        .into_iter()
        .map(|entry| LastRecommendation {
            display_name: display_name(&entry.last_type),
            last_type: entry.last_type,
            result: entry.result,
        })
        .collect::<Vec<_>>();

    info!(
        event_name = "api.recommendation.calculated_all",
        correlation_id = %correlation_id,
        lasts = results.len(),
        "size recommendations calculated for every last"
    );
    Ok(Json(RecommendationsResponse { foot_length, ball_girth, results }))
}

pub async fn list_lasts(State(state): State<AppState>) -> Json<Vec<LastSummary>> {
    let widths = |name: &str| {
        state.dataset.last(name).map(|sizing| sizing.available_widths()).unwrap_or_default()
    };

    let mut lasts = all_last_descriptions()
        .iter()
        .map(|entry| LastSummary {
            name: entry.name.to_string(),
            display_name: entry.display_name.to_string(),
            available_widths: widths(entry.name),
            catalog: Some(*entry),
        })
        .collect::<Vec<_>>();

    lasts.extend(state.dataset.last_types().filter(|name| last_description(name).is_none()).map(
        |name| LastSummary {
            name: name.to_string(),
            display_name: name.to_string(),
            available_widths: widths(name),
            catalog: None,
        },
    ));

    Json(lasts)
}

pub async fn measure_foot(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let correlation_id = correlation_id();
    let content_type = headers.get(header::CONTENT_TYPE).and_then(|value| value.to_str().ok());

    let upstream = state.measurement.forward(content_type, body).await.map_err(|err| {
        warn!(
            event_name = "api.measure_foot.failed",
            correlation_id = %correlation_id,
            error = %err,
            "foot measurement could not be forwarded"
        );
        reject(err, &correlation_id)
    })?;

    info!(
        event_name = "api.measure_foot.forwarded",
        correlation_id = %correlation_id,
        upstream_status = upstream.status,
        "foot measurement forwarded"
    );

    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = Response::builder().status(status);
    if let Some(content_type) = upstream.content_type {
        response = response.header(header::CONTENT_TYPE, content_type);
    }
    response.body(Body::from(upstream.body)).map_err(|err| {
        let error = ApplicationError::Integration(format!("invalid upstream response: {err}"));
        reject(error, &correlation_id)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body, Bytes};
    use axum::extract::State;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use lastfit_core::config::MeasurementConfig;
    use lastfit_core::domain::calculation::{NewSizeCalculation, SizeCalculation};
    use lastfit_core::sizing::{DeterministicSizingEngine, ReferenceDataset};
    use lastfit_db::{InMemorySizeCalculationRepository, RepositoryError, SizeCalculationRepository};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{create_size_calculation, router, AppState, CORRELATION_ID_HEADER};
    use crate::measure::MeasurementForwarder;

    struct FailingStore;

    #[async_trait::async_trait]
    impl SizeCalculationRepository for FailingStore {
        async fn create_size_calculation(
            &self,
            _calculation: NewSizeCalculation,
        ) -> Result<SizeCalculation, RepositoryError> {
            Err(RepositoryError::Decode("store offline".to_string()))
        }

        async fn size_calculations(&self) -> Result<Vec<SizeCalculation>, RepositoryError> {
            Err(RepositoryError::Decode("store offline".to_string()))
        }
    }

    fn state_with(
        store: Arc<dyn SizeCalculationRepository>,
        measurement_endpoint: Option<String>,
    ) -> AppState {
        let dataset = Arc::new(ReferenceDataset::builtin().expect("builtin dataset"));
        let measurement = MeasurementForwarder::from_config(&MeasurementConfig {
            endpoint: measurement_endpoint,
            api_key: None,
            timeout_secs: 5,
        })
        .expect("client");
        AppState {
            engine: Arc::new(DeterministicSizingEngine::new(dataset.clone())),
            dataset,
            store,
            measurement: Arc::new(measurement),
        }
    }

    fn state() -> AppState {
        state_with(Arc::new(InMemorySizeCalculationRepository::default()), None)
    }

    async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json response")
        };
        (status, payload)
    }

    fn calculation_body(last_type: &str, size: &str) -> String {
        json!({
            "lastType": last_type,
            "footLength": 263.0,
            "ballGirth": 247.5,
            "recommendedSize": size,
            "recommendedWidth": "D"
        })
        .to_string()
    }

    #[tokio::test]
    async fn created_calculations_get_sequential_ids_and_are_listed() {
        let app = router(state());

        let body = calculation_body("alhambra", "9.5");
        let (status, first) = send(app.clone(), "POST", "/api/size-calculation", &body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["id"], 1);
        assert_eq!(first["lastType"], "alhambra");
        assert!(first["timestamp"].as_str().is_some_and(|stamp| stamp.ends_with('Z')));

        let body = calculation_body("prado", "10");
        let (_, second) = send(app.clone(), "POST", "/api/size-calculation", &body).await;
        assert_eq!(second["id"], 2);

        let (status, listed) = send(app, "GET", "/api/size-calculations", "").await;
        assert_eq!(status, StatusCode::OK);
        let ids = listed
            .as_array()
            .expect("array")
            .iter()
            .map(|record| record["id"].as_i64().expect("id"))
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn invalid_submission_reports_every_field_and_stores_nothing() {
        let app = router(state());

        let (status, payload) = send(
            app.clone(),
            "POST",
            "/api/size-calculation",
            r#"{"lastType":"","footLength":"long","recommendedSize":"9.5","recommendedWidth":"D"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["error"], "Invalid input data");
        let paths = payload["details"]
            .as_array()
            .expect("details")
            .iter()
            .map(|detail| detail["path"][0].as_str().unwrap_or_default().to_string())
            .collect::<Vec<_>>();
        assert_eq!(paths, vec!["lastType", "footLength", "ballGirth"]);

        let (_, listed) = send(app, "GET", "/api/size-calculations", "").await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn over_long_last_type_is_rejected_and_stores_nothing() {
        let app = router(state());
        let body = calculation_body(&"a".repeat(51), "9.5");

        let (status, payload) = send(app.clone(), "POST", "/api/size-calculation", &body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["details"][0]["path"], json!(["lastType"]));
        assert_eq!(payload["details"].as_array().map(Vec::len), Some(1));

        let body = calculation_body(&"a".repeat(50), "9.5");
        let (status, _) = send(app.clone(), "POST", "/api/size-calculation", &body).await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = send(app, "GET", "/api/size-calculations", "").await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn malformed_json_is_a_root_level_bad_request() {
        let (status, payload) =
            send(router(state()), "POST", "/api/size-calculation", "{\"lastType\":").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["details"][0]["path"], json!([]));
        assert_eq!(payload["details"][0]["code"], "invalid_json");
    }

    #[tokio::test]
    async fn store_failure_is_a_generic_internal_error() {
        let result = create_size_calculation(
            State(state_with(Arc::new(FailingStore), None)),
            Bytes::from(calculation_body("cadiz", "9")),
        )
        .await;

        let response = axum::response::IntoResponse::into_response(result.expect_err("store down"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let correlation_id = response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .expect("correlation id header");
        assert_eq!(correlation_id.len(), 32);
        assert!(correlation_id.chars().all(|c| c.is_ascii_hexdigit()));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn listing_failure_is_a_generic_internal_error() {
        let app = router(state_with(Arc::new(FailingStore), None));

        let (status, payload) = send(app, "GET", "/api/size-calculations", "").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(payload["error"], "Internal server error");
    }

    #[tokio::test]
    async fn single_last_recommendation_matches_reference_row() {
        let (status, payload) = send(
            router(state()),
            "POST",
            "/api/size-recommendation",
            r#"{"lastType":"alhambra","footLength":263,"ballGirth":247.5}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["confidence"], 100);
        assert_eq!(payload["message"], "Size recommendations found");
        let fits = payload["recommendations"]
            .as_array()
            .expect("recommendations")
            .iter()
            .map(|rec| (rec["fit"].as_str().unwrap_or_default(), rec["size"]["usSize"].as_f64()))
            .collect::<Vec<_>>();
        assert_eq!(
            fits,
            vec![("snugger", Some(9.0)), ("best", Some(9.5)), ("roomier", Some(10.0))]
        );
        assert_eq!(payload["recommendations"][1]["width"], "D");
    }

    #[tokio::test]
    async fn unknown_last_is_a_successful_empty_outcome() {
        let (status, payload) = send(
            router(state()),
            "POST",
            "/api/size-recommendation",
            r#"{"lastType":"nonexistent","footLength":263,"ballGirth":247.5}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["recommendations"], json!([]));
        assert_eq!(payload["confidence"], 0);
        assert_eq!(payload["message"], "Sizing data not available for nonexistent");
    }

    #[tokio::test]
    async fn recommendation_requires_positive_measurements() {
        let (status, payload) = send(
            router(state()),
            "POST",
            "/api/size-recommendation",
            r#"{"lastType":"alhambra","footLength":0,"ballGirth":-4}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["details"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn both_feet_use_the_larger_measurements_for_every_last() {
        let (status, payload) = send(
            router(state()),
            "POST",
            "/api/size-recommendations",
            r#"{"leftFootLength":260,"leftBallGirth":247.5,"rightFootLength":263,"rightBallGirth":245}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["footLength"], 263.0);
        assert_eq!(payload["ballGirth"], 247.5);
        let results = payload["results"].as_array().expect("results");
        let lasts = results
            .iter()
            .map(|entry| entry["lastType"].as_str().unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(lasts, vec!["alhambra", "cadiz", "palazzo", "prado", "santiago", "vizcaya"]);
        assert_eq!(results[0]["displayName"], "Alhambra");
        assert_eq!(results[0]["result"]["confidence"], 100);
    }

    #[tokio::test]
    async fn lasts_listing_merges_catalog_and_widths() {
        let (status, payload) = send(router(state()), "GET", "/api/lasts", "").await;

        assert_eq!(status, StatusCode::OK);
        let lasts = payload.as_array().expect("lasts");
        assert_eq!(lasts.len(), 6);
        assert_eq!(lasts[0]["name"], "palazzo");
        assert_eq!(lasts[0]["availableWidths"], json!(["D"]));
        let alhambra = lasts.iter().find(|entry| entry["name"] == "alhambra").expect("alhambra");
        assert_eq!(alhambra["availableWidths"], json!(["D", "EE", "EEE"]));
        assert_eq!(alhambra["catalog"]["style"], "British");
    }

    #[tokio::test]
    async fn measure_foot_without_endpoint_is_unavailable() {
        let (status, payload) = send(router(state()), "POST", "/api/measure-foot", "photo").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload["error"], "Service temporarily unavailable");
    }

    #[tokio::test]
    async fn measure_foot_passes_upstream_status_and_body_through() {
        async fn reject_photo(body: Bytes) -> (StatusCode, String) {
            (StatusCode::UNPROCESSABLE_ENTITY, format!("{{\"bytes\":{}}}", body.len()))
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind upstream");
        let address = listener.local_addr().expect("address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, Router::new().route("/measure", post(reject_photo))).await;
        });

        let state = state_with(
            Arc::new(InMemorySizeCalculationRepository::default()),
            Some(format!("http://{address}/measure")),
        );
        let (status, payload) = send(router(state), "POST", "/api/measure-foot", "photo").await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(payload, json!({ "bytes": 5 }));
    }
}
