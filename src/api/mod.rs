use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::warn;

use crate::{WeatherBotError, assistant::WeatherAssistant, models::RequestOrigin};

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub msg: String,
}

pub fn router(assistant: Arc<WeatherAssistant>) -> Router {
    Router::new()
        .route("/get", post(chatbot_response))
        .route("/health", get(health))
        .with_state(assistant)
}

async fn chatbot_response(
    State(assistant): State<Arc<WeatherAssistant>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> Response {
    let origin = RequestOrigin::from_ip(caller_ip(&headers, peer));

    match assistant.answer(&form.msg, &origin).await {
        Ok(answer) => (StatusCode::OK, answer).into_response(),
        Err(e) => {
            warn!("Failed to answer query: {}", e);
            (status_for(&e), e.user_message()).into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// First `X-Forwarded-For` entry, else the socket peer
fn caller_ip(headers: &HeaderMap, peer: SocketAddr) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .unwrap_or_else(|| peer.ip())
}

fn status_for(error: &WeatherBotError) -> StatusCode {
    match error {
        WeatherBotError::GatewayUnavailable { .. }
        | WeatherBotError::LocationUnresolved { .. }
        | WeatherBotError::TranslationUnavailable { .. } => StatusCode::BAD_GATEWAY,
        WeatherBotError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        WeatherBotError::Config { .. } | WeatherBotError::Io { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::{CallTimeouts, Collaborators};
    use crate::error::Service;
    use crate::models::{Precipitation, WeatherSnapshot};
    use crate::response::ResponseGenerator;
    use crate::services::{LocationResolver, PassthroughTranslator, WeatherGateway};
    use crate::Result;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{Request, header};
    use chrono::DateTime;
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct MildWeather;

    #[async_trait]
    impl WeatherGateway for MildWeather {
        async fn current_and_forecast(&self, city: &str) -> Result<WeatherSnapshot> {
            if city == "Atlantis" {
                return Err(WeatherBotError::gateway("city not found"));
            }
            Ok(WeatherSnapshot {
                city: city.to_string(),
                status: "haze".to_string(),
                temperature: 30.0,
                temp_min: 28.0,
                temp_max: 33.5,
                humidity: 55,
                precipitation: Precipitation::default(),
                sunrise: DateTime::from_timestamp(0, 0).unwrap(),
                sunset: DateTime::from_timestamp(0, 0).unwrap(),
                forecast_status: "haze".to_string(),
            })
        }
    }

    /// Records the origin it was asked about
    struct RecordingResolver {
        city: &'static str,
        seen: Mutex<Vec<RequestOrigin>>,
    }

    #[async_trait]
    impl LocationResolver for RecordingResolver {
        async fn resolve_city(&self, origin: &RequestOrigin) -> Result<String> {
            self.seen.lock().unwrap().push(*origin);
            Ok(self.city.to_string())
        }
    }

    fn test_app(city: &'static str) -> (Router, Arc<RecordingResolver>) {
        let resolver = Arc::new(RecordingResolver {
            city,
            seen: Mutex::new(Vec::new()),
        });
        let assistant = WeatherAssistant::new(
            Collaborators {
                weather: Arc::new(MildWeather),
                location: resolver.clone(),
                translator: Arc::new(PassthroughTranslator),
            },
            ResponseGenerator::new(19_800).unwrap(),
            "en",
            CallTimeouts::default(),
        );
        let peer: SocketAddr = "203.0.113.7:40000".parse().unwrap();
        let router = router(Arc::new(assistant)).layer(MockConnectInfo(peer));
        (router, resolver)
    }

    fn post_form(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/get")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_post_answers_query() {
        let (app, resolver) = test_app("Surat");
        let response = app
            .oneshot(post_form("msg=What+is+the+temperature+today"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            "The current temperature is 30.0 degrees celsius."
        );
        let seen = resolver.seen.lock().unwrap();
        assert_eq!(seen[0].ip, Some("203.0.113.7".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_post_prefers_forwarded_for() {
        let (app, resolver) = test_app("Surat");
        let request = Request::builder()
            .method("POST")
            .uri("/get")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("x-forwarded-for", "198.51.100.20, 10.0.0.1")
            .body(Body::from("msg=will+it+rain+today"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "There is no chance of rain today.");
        let seen = resolver.seen.lock().unwrap();
        assert_eq!(seen[0].ip, Some("198.51.100.20".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_post_gateway_failure_is_bad_gateway() {
        let (app, _) = test_app("Atlantis");
        let response = app
            .oneshot(post_form("msg=what+is+the+weather+today"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_text(response).await,
            "Sorry, I couldn't reach the weather service right now."
        );
    }

    #[tokio::test]
    async fn test_post_without_msg_is_rejected() {
        let (app, _) = test_app("Surat");
        let response = app.oneshot(post_form("message=hello")).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app("Surat");
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&WeatherBotError::timeout(Service::Weather)),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&WeatherBotError::location("x")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&WeatherBotError::config("x")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
