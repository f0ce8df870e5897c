use std::sync::Arc;

use anyhow::{Error, Result};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    clients::{EventQueue, redis::RedisClient},
    config::Config,
    models::{
        event::{Event, EventCreate, EventResponse},
        health::{HealthResponse, HealthStatus},
        response::{ErrorDetail, QueueStats},
        validation::validate_user_id,
    },
};

/// Builds events from validated API requests and hands them to the queue.
pub struct EventPublisher {
    queue: Arc<dyn EventQueue>,
}

impl EventPublisher {
    pub fn new(queue: Arc<dyn EventQueue>) -> Self {
        Self { queue }
    }

    pub async fn publish(&self, request: EventCreate) -> Result<EventResponse, Error> {
        let event = Event::new(request.event_type, request.user_id, request.payload);

        self.queue.enqueue(&event).await?;

        info!(
            event_id = %event.event_id,
            user_id = %event.user_id,
            event_type = %event.event_type,
            "Event published"
        );

        Ok(event.to_response())
    }
}

pub struct AppState {
    publisher: EventPublisher,
    redis: Arc<RedisClient>,
}

pub async fn run_api_server(
    config: Config,
    redis: Arc<RedisClient>,
    shutdown: CancellationToken,
) -> Result<(), Error> {
    let state = Arc::new(AppState {
        publisher: EventPublisher::new(redis.clone()),
        redis,
    });

    let app = Router::new()
        .route("/api/v1/events", post(create_event))
        .route("/health", get(health_check))
        .route("/stats", get(queue_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "API server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    Ok(())
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EventCreate>,
) -> impl IntoResponse {
    if let Err(e) = validate_user_id(&request.user_id) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorDetail::new(e.to_string())),
        )
            .into_response();
    }

    let user_id = request.user_id.clone();

    match state.publisher.publish(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            error!(error = %e, user_id = %user_id, "Event creation failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorDetail::new("Failed to queue event. Please try again.")),
            )
                .into_response()
        }
    }
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let redis_healthy = state.redis.health_check().await;

    let health = HealthResponse {
        status: if redis_healthy {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        redis: if redis_healthy {
            "connected".to_string()
        } else {
            "disconnected".to_string()
        },
    };

    Json(health)
}

async fn queue_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let lengths = match (state.redis.queue_len().await, state.redis.dlq_len().await) {
        (Ok(queue_length), Ok(dlq_length)) => Some((queue_length, dlq_length)),
        _ => None,
    };

    match lengths {
        Some((queue_length, dlq_length)) => Json(QueueStats {
            queue_length,
            dlq_length,
        })
        .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorDetail::new("Queue statistics unavailable")),
        )
            .into_response(),
    }
}
