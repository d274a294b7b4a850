//! REST persistence client.
//!
//! Talks to the order backend: `POST /api/orders/` to create (the backend
//! assigns the id) and `POST /api/orders/{id}/cancel/` to cancel. A cancel
//! of an unknown or already-cancelled order is a normal `false`, not an
//! error.

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use zakazflow_core::sinks::OrderRepository;
use zakazflow_types::config::Settings;
use zakazflow_types::error::SinkError;
use zakazflow_types::order::FinalizedOrder;

pub struct RestOrderRepository {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

/// Create payload, mirroring the backend's order model.
#[derive(Serialize)]
struct OrderPayload<'a> {
    user_id: i64,
    full_name: Option<&'a str>,
    group_id: i64,
    group_title: Option<&'a str>,
    order_text: &'a str,
    comment: &'a str,
    amount: Option<i64>,
    phones: &'a [String],
    location: Option<Value>,
}

impl RestOrderRepository {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            auth_token: settings.api_auth_token.clone(),
        }
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, SinkError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.auth_token {
            request = request.header("Authorization", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        if status.as_u16() >= 400 {
            error!(%url, status = status.as_u16(), body = %text, "order api request failed");
            return Err(SinkError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| SinkError::Serialization(e.to_string()))
    }
}

impl OrderRepository for RestOrderRepository {
    async fn create_order(&self, order: &FinalizedOrder) -> Result<i64, SinkError> {
        let location = order
            .location
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| SinkError::Serialization(e.to_string()))?;

        let payload = OrderPayload {
            user_id: order.customer.id,
            full_name: order.customer.display_name.as_deref(),
            group_id: order.chat.id,
            group_title: order.chat.title.as_deref(),
            order_text: &order.product_text,
            comment: &order.comment,
            amount: order.amount,
            phones: &order.phones,
            location,
        };

        let body = self.post_json("/api/orders/", &payload).await?;
        let id = body
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| SinkError::Serialization("order response missing id".to_string()))?;
        debug!(order_id = id, "order created");
        Ok(id)
    }

    async fn cancel_order(&self, order_id: i64) -> Result<bool, SinkError> {
        let path = format!("/api/orders/{order_id}/cancel/");
        match self.post_json(&path, &Value::Null).await {
            Ok(body) => Ok(body
                .get("cancelled")
                .and_then(Value::as_bool)
                .unwrap_or(true)),
            Err(SinkError::Http { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zakazflow_types::location::Location;
    use zakazflow_types::message::{ChatRef, ParticipantRef};

    #[test]
    fn test_order_payload_shape() {
        let order = FinalizedOrder {
            chat: ChatRef {
                id: -100,
                title: Some("Dostavka".to_string()),
            },
            customer: ParticipantRef {
                id: 7,
                display_name: Some("Aziz".to_string()),
            },
            phones: vec!["+998901234567--".to_string()],
            amount: Some(250_000),
            location: Some(Location::Native {
                lat: 41.31,
                lon: 69.24,
            }),
            product_text: "latte 2ta".to_string(),
            comment: String::new(),
            transcript: vec!["latte 2ta".to_string()],
            created_at: chrono::Utc::now(),
        };
        let location = serde_json::to_value(order.location.as_ref().unwrap()).unwrap();
        let payload = OrderPayload {
            user_id: order.customer.id,
            full_name: order.customer.display_name.as_deref(),
            group_id: order.chat.id,
            group_title: order.chat.title.as_deref(),
            order_text: &order.product_text,
            comment: &order.comment,
            amount: order.amount,
            phones: &order.phones,
            location: Some(location),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["user_id"], 7);
        assert_eq!(json["group_id"], -100);
        assert_eq!(json["location"]["type"], "native");
        assert_eq!(json["phones"][0], "+998901234567--");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let mut settings = Settings::default();
        settings.api_base_url = "http://localhost:8000/".to_string();
        let repo = RestOrderRepository::new(&settings);
        assert_eq!(repo.base_url, "http://localhost:8000");
    }
}
