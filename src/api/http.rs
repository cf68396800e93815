//! reqwest implementation of [`Backend`].

use crate::api::{Backend, ClientError};
use crate::config::ApiConfig;
use crate::model::{
    Delivery, DeliveryFilter, DeliveryId, DeliveryStatus, DriverStats, Earnings, LocationSample,
    Me, NewOrder, Order, OrderFilter, OrderId,
};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::{debug, instrument, warn};

/// How a 4xx answer (other than 401/404) should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refusal {
    Rejected,
    Transition,
}

/// Backend client speaking JSON over HTTP with `Authorization: Token <token>`.
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    token: RwLock<Option<String>>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Serialize)]
struct StatusUpdateRequest {
    status: DeliveryStatus,
}

#[derive(Deserialize)]
struct StatusUpdateResponse {
    #[serde(default)]
    status: Option<DeliveryStatus>,
}

#[derive(Serialize)]
struct LocationUpdate {
    delivery_id: DeliveryId,
    latitude: f64,
    longitude: f64,
    speed: f64,
    heading: f64,
    accuracy: f64,
    timestamp: String,
}

#[derive(Deserialize)]
struct ActiveDeliveryResponse {
    #[serde(default)]
    delivery: Option<Delivery>,
}

/// List endpoints answer either a bare array or a paginated `{ "results": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListPayload<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> ListPayload<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListPayload::Plain(items) | ListPayload::Paged { results: items } => items,
        }
    }
}

impl HttpBackend {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self {
            client,
            api_url: config.api_url(),
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self
            .token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(ClientError::Unauthorized)?;
        Ok(request.header(AUTHORIZATION, format!("Token {token}")))
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn send(
        &self,
        request: RequestBuilder,
        resource: &str,
        refusal: Refusal,
    ) -> Result<String, ClientError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        debug!(resource, status = status.as_u16(), "Response");

        if status.is_success() {
            Ok(body)
        } else {
            let error = classify(status, &body, resource, refusal);
            warn!(resource, status = status.as_u16(), error = %error, "Request failed");
            Err(error)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, resource: &str) -> Result<T, ClientError> {
        let request = self.authorized(self.client.get(self.url(path)))?;
        let body = self.send(request, resource, Refusal::Rejected).await?;
        decode(&body, resource)
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Network("request timed out".to_string())
    } else {
        ClientError::Network(e.to_string())
    }
}

fn decode<T: DeserializeOwned>(body: &str, resource: &str) -> Result<T, ClientError> {
    serde_json::from_str(body)
        .map_err(|e| ClientError::Network(format!("malformed {resource} response: {e}")))
}

/// The `error` (or DRF-style `detail`) message of an error body, if present.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .or_else(|| value.get("detail"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

fn classify(status: StatusCode, body: &str, resource: &str, refusal: Refusal) -> ClientError {
    let message =
        server_message(body).unwrap_or_else(|| format!("{resource}: HTTP {}", status.as_u16()));
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::NOT_FOUND => ClientError::NotFound(resource.to_string()),
        s if s.is_client_error() => match refusal {
            Refusal::Rejected => ClientError::Rejected(message),
            Refusal::Transition => ClientError::RejectedTransition(message),
        },
        _ => ClientError::Network(message),
    }
}

#[async_trait]
impl Backend for HttpBackend {
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<String, ClientError> {
        let request = self
            .client
            .post(self.url("auth/login/"))
            .json(&LoginRequest { email, password });
        let body = match self.send(request, "login", Refusal::Rejected).await {
            Err(ClientError::Unauthorized) => {
                return Err(ClientError::Rejected("Invalid credentials".to_string()))
            }
            other => other?,
        };
        let login: LoginResponse = decode(&body, "login")?;
        Ok(login.token)
    }

    fn set_token(&self, token: Option<String>) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    #[instrument(skip(self))]
    async fn me(&self) -> Result<Me, ClientError> {
        self.get_json("auth/me/", "user").await
    }

    #[instrument(skip(self, order))]
    async fn create_order(&self, order: &NewOrder) -> Result<Order, ClientError> {
        debug!(?order, "create_order called");
        let request = self.authorized(self.client.post(self.url("orders/create/")).json(order))?;
        let body = self.send(request, "order", Refusal::Rejected).await?;
        decode(&body, "order")
    }

    #[instrument(skip(self))]
    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, ClientError> {
        let path = format!("orders/?filter={}", filter.as_query());
        let list: ListPayload<Order> = self.get_json(&path, "orders").await?;
        Ok(list.into_vec())
    }

    #[instrument(skip(self))]
    async fn fetch_order(&self, id: OrderId) -> Result<Order, ClientError> {
        self.get_json(&format!("orders/{id}/"), "order").await
    }

    #[instrument(skip(self))]
    async fn fetch_order_delivery(&self, id: OrderId) -> Result<Delivery, ClientError> {
        self.get_json(&format!("orders/{id}/delivery/"), "delivery").await
    }

    #[instrument(skip(self))]
    async fn fetch_delivery(&self, id: DeliveryId) -> Result<Delivery, ClientError> {
        self.get_json(&format!("deliveries/{id}/"), "delivery").await
    }

    #[instrument(skip(self))]
    async fn update_delivery_status(
        &self,
        id: DeliveryId,
        target: DeliveryStatus,
    ) -> Result<DeliveryStatus, ClientError> {
        let request = self.authorized(
            self.client
                .post(self.url(&format!("deliveries/{id}/update-status/")))
                .json(&StatusUpdateRequest { status: target }),
        )?;
        let body = self.send(request, "delivery", Refusal::Transition).await?;
        // Older servers answer with only `status_display`; a 2xx then confirms the target.
        Ok(serde_json::from_str::<StatusUpdateResponse>(&body)
            .ok()
            .and_then(|response| response.status)
            .unwrap_or(target))
    }

    #[instrument(skip(self, sample))]
    async fn push_location(
        &self,
        id: DeliveryId,
        sample: &LocationSample,
    ) -> Result<(), ClientError> {
        let update = LocationUpdate {
            delivery_id: id,
            latitude: sample.latitude,
            longitude: sample.longitude,
            speed: sample.speed.unwrap_or(0.0),
            heading: sample.heading.unwrap_or(0.0),
            accuracy: sample.accuracy.unwrap_or(0.0),
            timestamp: sample.timestamp.to_rfc3339(),
        };
        let request =
            self.authorized(self.client.post(self.url("driver/update-location/")).json(&update))?;
        self.send(request, "location", Refusal::Rejected).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn driver_stats(&self) -> Result<DriverStats, ClientError> {
        self.get_json("driver/stats/", "driver stats").await
    }

    #[instrument(skip(self))]
    async fn active_delivery(&self) -> Result<Option<Delivery>, ClientError> {
        match self
            .get_json::<ActiveDeliveryResponse>("driver/active-delivery/", "active delivery")
            .await
        {
            Ok(response) => Ok(response.delivery),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn driver_deliveries(
        &self,
        filter: DeliveryFilter,
    ) -> Result<Vec<Delivery>, ClientError> {
        let path = format!("driver/deliveries/?filter={}", filter.as_query());
        let list: ListPayload<Delivery> = self.get_json(&path, "deliveries").await?;
        Ok(list.into_vec())
    }

    #[instrument(skip(self))]
    async fn earnings(&self) -> Result<Earnings, ClientError> {
        self.get_json("driver/earnings/", "earnings").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status_codes() {
        assert_eq!(
            classify(StatusCode::NOT_FOUND, "", "order", Refusal::Rejected),
            ClientError::NotFound("order".into())
        );
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, "", "order", Refusal::Rejected),
            ClientError::Unauthorized
        );
        assert_eq!(
            classify(
                StatusCode::BAD_REQUEST,
                r#"{"error": "Cannot start delivery before accepting"}"#,
                "delivery",
                Refusal::Transition
            ),
            ClientError::RejectedTransition("Cannot start delivery before accepting".into())
        );
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, r#"{"detail": "Item unavailable"}"#, "order", Refusal::Rejected),
            ClientError::Rejected("Item unavailable".into())
        );
        assert_eq!(
            classify(StatusCode::BAD_GATEWAY, "<html>", "order", Refusal::Rejected),
            ClientError::Network("order: HTTP 502".into())
        );
    }

    #[test]
    fn test_list_payload_accepts_both_shapes() {
        let plain: ListPayload<u32> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(plain.into_vec(), vec![1, 2]);
        let paged: ListPayload<u32> =
            serde_json::from_str(r#"{"count": 1, "results": [3]}"#).unwrap();
        assert_eq!(paged.into_vec(), vec![3]);
    }

    #[test]
    fn test_requests_without_token_are_unauthorized() {
        let backend = HttpBackend::new(&ApiConfig::default()).unwrap();
        let request = backend.client.get(backend.url("auth/me/"));
        assert!(matches!(backend.authorized(request), Err(ClientError::Unauthorized)));

        backend.set_token(Some("abc".into()));
        let request = backend.client.get(backend.url("auth/me/"));
        assert!(backend.authorized(request).is_ok());
    }

    #[test]
    fn test_malformed_body_is_network_error() {
        let result: Result<Order, ClientError> = decode("{not json", "order");
        assert!(matches!(result, Err(ClientError::Network(msg)) if msg.starts_with("malformed order")));
    }
}
