//! REST API for the load planner.
//!
//! JSON over HTTP around [`crate::optimizer`], with permissive CORS, a
//! Server-Sent Events variant for live visualisation and an OpenAPI document.

use std::sync::OnceLock;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::advisories::{AdvisoryKind, LoadAdvisory, Severity};
use crate::config::{ApiConfig, OptimizerConfig};
use crate::metrics::{AxleLoad, AxleStatus, OptimizationResult};
use crate::model::{
    Axle, AxleKind, CargoItem, PlacedItem, Placement, Rotation, UnplacedItem, UnplacedReason,
    ValidationError, VehicleProfile,
};
use crate::optimizer::{
    PackingConfig, StrategyKind, optimize_load_with_config, optimize_load_with_progress,
};
use crate::presets::{self, VehiclePreset};
use crate::types::Vec3;

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>load_planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
</html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request body of `/optimize` and `/optimize_stream`.
///
/// Exactly one of `vehicle` and `preset` must be given. `strategy` and
/// `support_ratio` override the server defaults for this run only.
#[derive(Deserialize, Clone, ToSchema)]
#[schema(
    example = json!({
        "preset": "dry-van-53",
        "items": [
            {
                "id": "PAL-EUR",
                "length": 48.0,
                "width": 40.0,
                "height": 50.0,
                "weight": 900.0,
                "stackable": true,
                "rotation_allowed": true,
                "quantity": 20
            }
        ],
        "strategy": "extreme_point"
    })
)]
pub struct OptimizeRequest {
    pub items: Vec<CargoItem>,
    #[serde(default)]
    pub vehicle: Option<VehicleProfile>,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub strategy: Option<StrategyKind>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub support_ratio: Option<f64>,
}

#[derive(Debug)]
struct ValidatedOptimizeRequest {
    items: Vec<CargoItem>,
    vehicle: VehicleProfile,
    config: PackingConfig,
}

#[derive(Debug)]
enum OptimizeRequestError {
    MissingVehicle,
    AmbiguousVehicle,
    UnknownPreset(String),
    Invalid(ValidationError),
}

impl OptimizeRequest {
    fn into_validated(
        self,
        defaults: PackingConfig,
    ) -> Result<ValidatedOptimizeRequest, OptimizeRequestError> {
        let vehicle = match (self.vehicle, self.preset) {
            (Some(_), Some(_)) => return Err(OptimizeRequestError::AmbiguousVehicle),
            (None, None) => return Err(OptimizeRequestError::MissingVehicle),
            (Some(vehicle), None) => vehicle,
            (None, Some(id)) => match presets::find(&id) {
                Some(preset) => preset.profile,
                None => return Err(OptimizeRequestError::UnknownPreset(id)),
            },
        };

        let mut config = defaults;
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(ratio) = self.support_ratio {
            config.support_ratio = ratio;
        }

        config.validate().map_err(OptimizeRequestError::Invalid)?;
        vehicle.validate().map_err(OptimizeRequestError::Invalid)?;
        for item in &self.items {
            item.validate().map_err(OptimizeRequestError::Invalid)?;
        }
        config
            .check_instance_count(&self.items)
            .map_err(OptimizeRequestError::Invalid)?;

        Ok(ValidatedOptimizeRequest {
            items: self.items,
            vehicle,
            config,
        })
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.body_text(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn vehicle_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid vehicle selection",
        details,
    )
}

fn parse_optimize_request(
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
    defaults: PackingConfig,
) -> Result<ValidatedOptimizeRequest, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    match payload.into_validated(defaults) {
        Ok(validated) => Ok(validated),
        Err(OptimizeRequestError::MissingVehicle) => {
            Err(vehicle_error("Either 'vehicle' or 'preset' must be given"))
        }
        Err(OptimizeRequestError::AmbiguousVehicle) => Err(vehicle_error(
            "Only one of 'vehicle' and 'preset' may be given",
        )),
        Err(OptimizeRequestError::UnknownPreset(id)) => {
            Err(vehicle_error(format!("Unknown vehicle preset '{}'", id)))
        }
        Err(OptimizeRequestError::Invalid(err)) => Err(validation_error(err.to_string())),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_optimize, handle_optimize_stream, handle_presets),
    components(
        schemas(
            OptimizeRequest,
            OptimizationResult,
            ErrorResponse,
            CargoItem,
            VehicleProfile,
            VehiclePreset,
            Axle,
            AxleKind,
            AxleLoad,
            AxleStatus,
            PlacedItem,
            Placement,
            Rotation,
            UnplacedItem,
            UnplacedReason,
            LoadAdvisory,
            AdvisoryKind,
            Severity,
            StrategyKind,
            Vec3
        )
    ),
    tags((name = "loading", description = "Vehicle load planning"))
)]
struct ApiDoc;

fn router(optimizer_config: OptimizerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/optimize", post(handle_optimize))
        .route("/optimize_stream", post(handle_optimize_stream))
        .route("/vehicles/presets", get(handle_presets))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(ApiState { optimizer_config })
}

/// Binds the listener and serves until the server stops.
pub async fn start_api_server(
    config: ApiConfig,
    optimizer_config: OptimizerConfig,
) -> std::io::Result<()> {
    let app = router(optimizer_config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        "Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("Local access: http://localhost:{}", config.port());
    }
    info!("Endpoints: POST /optimize, POST /optimize_stream, GET /vehicles/presets, GET /docs");

    axum::serve(listener, app).await
}

/// Plans a load and returns the complete result.
#[utoipa::path(
    post,
    path = "/optimize",
    request_body = OptimizeRequest,
    responses(
        (status = 200, description = "Load plan", body = OptimizationResult),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid cargo, vehicle or settings",
            body = ErrorResponse
        ),
        (status = INTERNAL_SERVER_ERROR, description = "Optimization task failed", body = ErrorResponse)
    ),
    tag = "loading"
)]
async fn handle_optimize(
    State(state): State<ApiState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Response {
    let request = match parse_optimize_request(payload, state.optimizer_config.packing_config())
    {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(
        "New optimize request: {} cargo lines, vehicle {}",
        request.items.len(),
        request.vehicle.name.as_deref().unwrap_or("custom")
    );

    let ValidatedOptimizeRequest {
        items,
        vehicle,
        config,
    } = request;
    let outcome =
        tokio::task::spawn_blocking(move || optimize_load_with_config(&items, &vehicle, &config))
            .await;

    match outcome {
        Ok(Ok(result)) => (StatusCode::OK, Json(result)).into_response(),
        Ok(Err(err)) => validation_error(err.to_string()),
        Err(err) => {
            error!("Optimization task failed: {}", err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Optimization failed",
                err.to_string(),
            )
        }
    }
}

/// Streams progress as Server-Sent Events.
///
/// Each `LoadEvent` arrives as a JSON `message` event. The stream ends with a
/// `result` event carrying the complete `OptimizationResult`.
#[utoipa::path(
    post,
    path = "/optimize_stream",
    request_body = OptimizeRequest,
    responses(
        (
            status = 200,
            description = "Streams load events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid cargo, vehicle or settings",
            body = ErrorResponse
        )
    ),
    tag = "loading"
)]
async fn handle_optimize_stream(
    State(state): State<ApiState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Response {
    let ValidatedOptimizeRequest {
        items,
        vehicle,
        config,
    } = match parse_optimize_request(payload, state.optimizer_config.packing_config()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::channel::<Event>(32);

    tokio::task::spawn_blocking(move || {
        let outcome = optimize_load_with_progress(&items, &vehicle, &config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // a closed receiver only means the client went away
                let _ = tx.blocking_send(Event::default().data(json));
            }
        });

        let last = match outcome {
            Ok(result) => match serde_json::to_string(&result) {
                Ok(json) => Event::default().event("result").data(json),
                Err(err) => Event::default().event("error").data(err.to_string()),
            },
            Err(err) => Event::default().event("error").data(err.to_string()),
        };
        if tx.blocking_send(last).is_err() {
            warn!("Client closed the event stream before the result was sent");
        }
    });

    let stream = ReceiverStream::new(rx).map(Ok::<_, std::convert::Infallible>);
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Lists the built-in vehicle presets.
#[utoipa::path(
    get,
    path = "/vehicles/presets",
    responses((status = 200, description = "Vehicle presets", body = [VehiclePreset])),
    tag = "loading"
)]
async fn handle_presets() -> Json<Vec<VehiclePreset>> {
    Json(presets::all())
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
