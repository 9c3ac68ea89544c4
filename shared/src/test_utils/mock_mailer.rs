use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Result, ServiceError};
use crate::mail::Mailer;

/// An email captured by [`MockMailer`]
#[derive(Clone, Debug, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub template: String,
    pub data: Value,
}

/// Mailer that records messages instead of sending them
#[derive(Default)]
pub struct MockMailer {
    sent: Mutex<Vec<SentEmail>>,
    error_mode: Mutex<bool>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a MockMailer where every send fails
    pub fn new_error() -> Self {
        let mailer = Self::new();
        mailer.set_error_mode(true);
        mailer
    }

    pub fn set_error_mode(&self, fail: bool) {
        *self.error_mode.lock().unwrap() = fail;
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send_templated_email(&self, to: &str, template: &str, data: &Value) -> Result<()> {
        if *self.error_mode.lock().unwrap() {
            return Err(ServiceError::InternalError("Mock: mail delivery failed".into()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            template: template.to_string(),
            data: data.clone(),
        });
        Ok(())
    }
}
