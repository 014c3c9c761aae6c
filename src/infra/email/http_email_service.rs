use crate::domain::ports::EmailService;
use crate::error::AppError;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

const SENDER_ALIAS: &str = "classroom";

pub struct HttpEmailService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpEmailService {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct AttachmentPayload {
    filename: String,
    content_base64: String,
}

#[derive(Serialize)]
struct EmailPayload {
    from_alias: &'static str,
    to_addr: String,
    subject: String,
    html_body: String,
    attachments: Vec<AttachmentPayload>,
}

fn build_payload(recipient: &str, subject: &str, html_body: &str, attachment: Option<(&str, &[u8])>) -> EmailPayload {
    let attachments = attachment
        .map(|(name, data)| AttachmentPayload {
            filename: name.to_string(),
            content_base64: general_purpose::STANDARD.encode(data),
        })
        .into_iter()
        .collect();

    EmailPayload {
        from_alias: SENDER_ALIAS,
        to_addr: recipient.to_string(),
        subject: subject.to_string(),
        html_body: html_body.to_string(),
        attachments,
    }
}

#[async_trait]
impl EmailService for HttpEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        attachment_name: Option<&str>,
        attachment_data: Option<&[u8]>
    ) -> Result<(), AppError> {
        let payload = build_payload(recipient, subject, html_body, attachment_name.zip(attachment_data));

        let res = self.client.post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Mail service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Mail service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        debug!("Mail accepted for {}", recipient);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_is_base64_encoded() {
        let payload = build_payload("a@b.c", "Nueva sesión", "<p>hi</p>", Some(("invite.ics", b"BEGIN:VCALENDAR")));
        assert_eq!(payload.attachments.len(), 1);
        assert_eq!(payload.attachments[0].content_base64, "QkVHSU46VkNBTEVOREFS");

        let bare = build_payload("a@b.c", "s", "b", None);
        assert!(bare.attachments.is_empty());
    }
}
