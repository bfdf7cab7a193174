//! Graph JSON request and response shapes

use crate::message::{
    ComposedMessage, InboxSummaryEntry, InlineAttachment, MessageContext, OutgoingMail, Recipient,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

const FILE_ATTACHMENT_TYPE: &str = "#microsoft.graph.fileAttachment";

// -- responses --

#[derive(Debug, Deserialize)]
pub struct MessageList {
    #[serde(default)]
    pub value: Vec<MessageResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub from: Option<RecipientResource>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub is_read: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientResource {
    #[serde(default)]
    pub email_address: Option<EmailAddress>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EmailAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MessageResource {
    fn sender(&self) -> Option<String> {
        self.from
            .as_ref()
            .and_then(|f| f.email_address.as_ref())
            .and_then(|a| a.address.clone())
    }

    /// Project onto `{id, from, subject, isRead}`. Entries without an id
    /// cannot be replied to and are dropped.
    pub fn into_summary(self) -> Option<InboxSummaryEntry> {
        let from = self.sender();
        Some(InboxSummaryEntry {
            id: self.id?,
            from,
            subject: self.subject,
            is_read: self.is_read.unwrap_or(false),
        })
    }

    pub fn into_context(self) -> MessageContext {
        MessageContext {
            from: self.sender(),
            subject: self.subject,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TokenError {
    pub error: String,
    #[serde(default)]
    pub error_description: String,
}

// -- requests --

#[derive(Debug, Serialize)]
pub struct CreateReply<'a> {
    pub comment: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody<'a> {
    pub content_type: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment<'a> {
    #[serde(rename = "@odata.type")]
    pub odata_type: &'static str,
    pub name: &'a str,
    pub content_type: &'a str,
    pub is_inline: bool,
    pub content_id: &'a str,
    pub content_bytes: String,
}

impl<'a> From<&'a InlineAttachment> for FileAttachment<'a> {
    fn from(a: &'a InlineAttachment) -> Self {
        Self {
            odata_type: FILE_ATTACHMENT_TYPE,
            name: &a.file_name,
            content_type: &a.content_type,
            is_inline: a.is_inline,
            content_id: &a.content_id,
            content_bytes: STANDARD.encode(&a.bytes),
        }
    }
}

/// Body of the PATCH that overwrites a draft's content.
#[derive(Debug, Serialize)]
pub struct DraftPatch<'a> {
    pub body: ItemBody<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<FileAttachment<'a>>,
}

impl<'a> From<&'a ComposedMessage> for DraftPatch<'a> {
    fn from(m: &'a ComposedMessage) -> Self {
        Self {
            body: html_body(m),
            attachments: m.attachments.iter().map(FileAttachment::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage<'a> {
    pub subject: &'a str,
    pub body: ItemBody<'a>,
    pub to_recipients: Vec<RecipientResource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reply_to: Vec<RecipientResource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<FileAttachment<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMail<'a> {
    pub message: NewMessage<'a>,
    pub save_to_sent_items: bool,
}

impl<'a> From<&'a OutgoingMail> for SendMail<'a> {
    fn from(mail: &'a OutgoingMail) -> Self {
        Self {
            message: NewMessage {
                subject: &mail.subject,
                body: html_body(&mail.message),
                to_recipients: vec![recipient(&mail.to)],
                reply_to: mail.reply_to.iter().map(recipient).collect(),
                attachments: mail
                    .message
                    .attachments
                    .iter()
                    .map(FileAttachment::from)
                    .collect(),
            },
            save_to_sent_items: true,
        }
    }
}

fn html_body(m: &ComposedMessage) -> ItemBody<'_> {
    ItemBody {
        content_type: "html",
        content: m.html_body.as_str(),
    }
}

fn recipient(r: &Recipient) -> RecipientResource {
    RecipientResource {
        email_address: Some(EmailAddress {
            address: Some(r.address.clone()),
            name: r.name.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_projection() {
        let resource: MessageResource = serde_json::from_value(json!({
            "id": "AAMk1",
            "from": {"emailAddress": {"name": "Alice", "address": "alice@example.com"}},
            "subject": "Hi",
            "isRead": true,
            "bodyPreview": "ignored"
        }))
        .unwrap();
        let entry = resource.into_summary().unwrap();
        assert_eq!(entry.id, "AAMk1");
        assert_eq!(entry.from.as_deref(), Some("alice@example.com"));
        assert_eq!(entry.subject.as_deref(), Some("Hi"));
        assert!(entry.is_read);
    }

    #[test]
    fn missing_sender_is_none() {
        let resource: MessageResource =
            serde_json::from_value(json!({"id": "x", "from": {}})).unwrap();
        let entry = resource.into_summary().unwrap();
        assert_eq!(entry.from, None);
        assert!(!entry.is_read);
    }

    #[test]
    fn patch_encodes_attachments() {
        let message = ComposedMessage {
            html_body: "<p>hi</p>".to_string(),
            attachments: vec![InlineAttachment {
                file_name: "logo.png".to_string(),
                content_type: "image/png".to_string(),
                is_inline: true,
                content_id: "logo".to_string(),
                bytes: b"PNG".to_vec(),
            }],
        };
        let value = serde_json::to_value(DraftPatch::from(&message)).unwrap();
        assert_eq!(
            value,
            json!({
                "body": {"contentType": "html", "content": "<p>hi</p>"},
                "attachments": [{
                    "@odata.type": "#microsoft.graph.fileAttachment",
                    "name": "logo.png",
                    "contentType": "image/png",
                    "isInline": true,
                    "contentId": "logo",
                    "contentBytes": "UE5H"
                }]
            })
        );
    }

    #[test]
    fn patch_without_attachments_omits_field() {
        let value = serde_json::to_value(DraftPatch::from(&ComposedMessage::html("x"))).unwrap();
        assert!(value.get("attachments").is_none());
    }

    #[test]
    fn send_mail_with_reply_to() {
        let mail = OutgoingMail::new(
            Recipient::new("bob@example.com"),
            "Subject",
            ComposedMessage::html("<p>x</p>"),
        )
        .reply_to(Recipient::new("team@example.com").with_name("Team"));
        let value = serde_json::to_value(SendMail::from(&mail)).unwrap();
        assert_eq!(value["saveToSentItems"], json!(true));
        assert_eq!(
            value["message"]["toRecipients"],
            json!([{"emailAddress": {"address": "bob@example.com"}}])
        );
        assert_eq!(
            value["message"]["replyTo"],
            json!([{"emailAddress": {"address": "team@example.com", "name": "Team"}}])
        );
    }
}
