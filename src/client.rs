//! Microsoft Graph mailbox client

use crate::auth::ClientCredentials;
use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::folder::Folder;
use crate::mailbox::MailboxApi;
use crate::message::{ComposedMessage, InboxSummaryEntry, MessageContext, OutgoingMail};
use crate::wire::{CreateReply, DraftPatch, ErrorEnvelope, MessageList, MessageResource, SendMail};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, Url};
use tracing::{debug, info};

const SUMMARY_FIELDS: &str = "id,from,subject,isRead";
const CONTEXT_FIELDS: &str = "from,subject";
const NEWEST_FIRST: &str = "receivedDateTime DESC";

/// Graph REST client authenticated with app-only client credentials.
///
/// One instance holds one HTTP connection pool and one token cache and
/// can be reused for any number of sequential calls.
#[derive(Debug)]
pub struct GraphClient {
    http: reqwest::Client,
    api_url: Url,
    credentials: ClientCredentials,
}

impl GraphClient {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `api_url` is not a valid base URL,
    /// or [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| Error::Config(format!("Invalid GRAPH_API_URL: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "GRAPH_API_URL cannot be a base URL: {api_url}"
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("outlook-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_url,
            credentials: ClientCredentials::new(config),
        })
    }

    /// Up to `limit` most recent messages of any folder, newest first,
    /// projected onto `{id, from, subject, isRead}`.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication or the request fails.
    pub async fn list_messages(
        &self,
        user_id: &str,
        folder: &Folder,
        limit: usize,
    ) -> Result<Vec<InboxSummaryEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let url = self.endpoint(&["users", user_id, "mailFolders", folder.as_str(), "messages"]);
        let top = limit.to_string();
        let request = self.http.get(url).query(&[
            ("$top", top.as_str()),
            ("$orderby", NEWEST_FIRST),
            ("$select", SUMMARY_FIELDS),
        ]);

        let list: MessageList = self.execute(request).await?.json().await?;
        let entries: Vec<InboxSummaryEntry> = list
            .value
            .into_iter()
            .filter_map(MessageResource::into_summary)
            .take(limit)
            .collect();

        info!("Fetched {} messages from {}", entries.len(), folder);
        Ok(entries)
    }

    // -- private helpers --

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.credentials.bearer(&self.http).await?;
        let response = request.bearer_auth(token).send().await?;
        check_status(response).await
    }
}

/// Turn a non-2xx response into [`Error::Api`], decoding Graph's
/// `{"error": {"code", "message"}}` envelope when present.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) => (
            status.canonical_reason().unwrap_or("Unknown").to_string(),
            body,
        ),
    };

    Err(Error::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

#[async_trait]
impl MailboxApi for GraphClient {
    async fn list_inbox(&self, user_id: &str, limit: usize) -> Result<Vec<InboxSummaryEntry>> {
        self.list_messages(user_id, &Folder::Inbox, limit).await
    }

    async fn fetch_message(&self, user_id: &str, message_id: &str) -> Result<MessageContext> {
        let url = self.endpoint(&["users", user_id, "messages", message_id]);
        let request = self.http.get(url).query(&[("$select", CONTEXT_FIELDS)]);

        let message: MessageResource = self.execute(request).await?.json().await?;
        Ok(message.into_context())
    }

    async fn create_draft_reply(&self, user_id: &str, message_id: &str) -> Result<String> {
        let url = self.endpoint(&["users", user_id, "messages", message_id, "createReply"]);
        let request = self.http.post(url).json(&CreateReply { comment: "" });

        let response = self.execute(request).await?;
        let status = response.status().as_u16();
        let draft: MessageResource = response.json().await?;

        let draft_id = draft.id.ok_or_else(|| Error::Api {
            status,
            code: "InvalidResponse".to_string(),
            message: "createReply returned a draft without an id".to_string(),
        })?;
        debug!("Created reply draft {} for {}", draft_id, message_id);
        Ok(draft_id)
    }

    async fn update_draft(
        &self,
        user_id: &str,
        draft_id: &str,
        message: &ComposedMessage,
    ) -> Result<()> {
        let url = self.endpoint(&["users", user_id, "messages", draft_id]);
        let request = self.http.patch(url).json(&DraftPatch::from(message));

        self.execute(request).await?;
        debug!(
            "Updated draft {} ({} attachments)",
            draft_id,
            message.attachments.len()
        );
        Ok(())
    }

    async fn send_draft(&self, user_id: &str, draft_id: &str) -> Result<()> {
        let url = self.endpoint(&["users", user_id, "messages", draft_id, "send"]);
        self.execute(self.http.post(url)).await?;
        debug!("Sent draft {}", draft_id);
        Ok(())
    }

    async fn send_new_mail(&self, user_id: &str, mail: &OutgoingMail) -> Result<()> {
        let url = self.endpoint(&["users", user_id, "sendMail"]);
        let request = self.http.post(url).json(&SendMail::from(mail));

        self.execute(request).await?;
        info!("Sent '{}' to {}", mail.subject, mail.to.address);
        Ok(())
    }
}
