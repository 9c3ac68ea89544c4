use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sesv2::types::{Destination, EmailContent, Template};
use aws_sdk_sesv2::Client;
use serde_json::Value;

use super::Mailer;
use crate::error::{map_mail_error, Result};

/// SES v2 mailer sending stored templates.
#[derive(Clone)]
pub struct SesMailer {
    client: Client,
    sender: String,
}

impl SesMailer {
    pub async fn new(sender: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::with_client(Client::new(&config), sender)
    }

    pub fn with_client(client: Client, sender: &str) -> Self {
        Self {
            client,
            sender: sender.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send_templated_email(&self, to: &str, template: &str, data: &Value) -> Result<()> {
        let content = EmailContent::builder()
            .template(
                Template::builder()
                    .template_name(template)
                    .template_data(data.to_string())
                    .build(),
            )
            .build();

        let response = self
            .client
            .send_email()
            .from_email_address(&self.sender)
            .destination(Destination::builder().to_addresses(to).build())
            .content(content)
            .send()
            .await
            .map_err(|e| map_mail_error("send_email", e))?;

        tracing::info!(
            template = %template,
            message_id = ?response.message_id(),
            "Templated email sent"
        );
        Ok(())
    }
}
