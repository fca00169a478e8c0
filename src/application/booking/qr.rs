//! Check-in QR tokens
//!
//! Every issue mints a fresh token; the previous one stored on the booking
//! is simply overwritten. Expiry is `min(now + ttl, booking start)`.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::ports::QrRenderer;
use crate::domain::DomainResult;

/// Token plus the rendered image bytes returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrCode {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub image: Vec<u8>,
}

impl QrCode {
    pub fn image_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.image)
    }
}

#[derive(Clone)]
pub struct QrTokenIssuer {
    renderer: Arc<dyn QrRenderer>,
    ttl: Duration,
}

impl QrTokenIssuer {
    pub fn new(renderer: Arc<dyn QrRenderer>, ttl: Duration) -> Self {
        Self { renderer, ttl }
    }

    pub fn expiry_for(&self, booking_start: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        (now + self.ttl).min(booking_start)
    }

    pub async fn issue(
        &self,
        booking_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DomainResult<QrCode> {
        let token = Uuid::new_v4().to_string();
        let image = self.renderer.render(&token).await?;
        Ok(QrCode {
            expires_at: self.expiry_for(booking_start, now),
            token,
            image,
        })
    }
}

/// Renders the check-in URI itself as the payload, for deployments where
/// image rendering happens on the client.
pub struct PayloadQrRenderer {
    base_uri: String,
}

impl PayloadQrRenderer {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
        }
    }
}

#[async_trait]
impl QrRenderer for PayloadQrRenderer {
    async fn render(&self, token: &str) -> DomainResult<Vec<u8>> {
        Ok(format!("{}{}", self.base_uri, token).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issuer() -> QrTokenIssuer {
        QrTokenIssuer::new(
            Arc::new(PayloadQrRenderer::new("evbooking://checkin/")),
            Duration::minutes(15),
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn expiry_is_ttl_when_start_is_far() {
        let code = issuer().issue(now() + Duration::hours(13), now()).await.unwrap();
        assert_eq!(code.expires_at, now() + Duration::minutes(15));
        assert_eq!(
            String::from_utf8(code.image.clone()).unwrap(),
            format!("evbooking://checkin/{}", code.token)
        );
    }

    #[tokio::test]
    async fn expiry_is_clamped_to_start() {
        let start = now() + Duration::minutes(5);
        let code = issuer().issue(start, now()).await.unwrap();
        assert_eq!(code.expires_at, start);
    }

    #[tokio::test]
    async fn tokens_are_never_reused() {
        let issuer = issuer();
        let start = now() + Duration::hours(2);
        let a = issuer.issue(start, now()).await.unwrap();
        let b = issuer.issue(start, now()).await.unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn image_base64_encodes_bytes() {
        let code = QrCode {
            token: "t".into(),
            expires_at: now(),
            image: b"abc".to_vec(),
        };
        assert_eq!(code.image_base64(), "YWJj");
    }
}
