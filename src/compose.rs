//! HTML message composition
//!
//! A [`MessageTemplate`] renders a caller-supplied body fragment and an
//! optional signature inside a fixed style scaffold. [`compose`] pairs the
//! rendered body with inline images loaded from disk, so the HTML can
//! reference them as `cid:<content-id>`.

use crate::error::{Error, Result};
use crate::message::{ComposedMessage, INLINE_IMAGE_CONTENT_TYPE, InlineAttachment};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Body fragment plus signature block.
///
/// # Examples
///
/// ```
/// use outlook_client::MessageTemplate;
///
/// let html = MessageTemplate::new("<p>Thanks for your message.</p>")
///     .with_signature(r#"<img src="cid:logo" width="120">"#)
///     .render();
/// assert!(html.contains("<p>Thanks for your message.</p>"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageTemplate {
    pub body: String,
    pub signature: String,
}

impl MessageTemplate {
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            signature: String::new(),
        }
    }

    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    /// The full HTML document. Body and signature are inserted verbatim,
    /// signature after body.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "<html>\n  \
             <body style=\"font-family:Segoe UI, sans-serif; font-size:14px; color:#000;\">\n    \
             {}\n    \
             <br>{}\n  \
             </body>\n\
             </html>\n",
            self.body, self.signature
        )
    }
}

/// An image file to attach inline under a content id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub path: PathBuf,
    pub content_id: String,
}

impl InlineImage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, content_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_id: content_id.into(),
        }
    }

    /// Attachment name: the final path segment.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

impl FromStr for InlineImage {
    type Err = String;

    /// Parses `PATH:CID`, splitting on the last colon.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.rsplit_once(':') {
            Some((path, cid)) if !path.is_empty() && !cid.is_empty() => Ok(Self::new(path, cid)),
            _ => Err(format!("expected PATH:CONTENT_ID, got '{s}'")),
        }
    }
}

/// Render `template` and load every inline image.
///
/// Images are read in order; the first unreadable file aborts
/// composition, so nothing is sent with a partial attachment set.
///
/// # Errors
///
/// Returns [`Error::AttachmentRead`] if an image file cannot be read.
pub async fn compose(template: &MessageTemplate, images: &[InlineImage]) -> Result<ComposedMessage> {
    let mut attachments = Vec::with_capacity(images.len());
    for image in images {
        attachments.push(load_inline(image).await?);
    }

    Ok(ComposedMessage {
        html_body: template.render(),
        attachments,
    })
}

async fn load_inline(image: &InlineImage) -> Result<InlineAttachment> {
    let bytes = read(&image.path).await?;
    debug!(
        "Loaded inline image {} ({} bytes) as cid:{}",
        image.path.display(),
        bytes.len(),
        image.content_id
    );

    Ok(InlineAttachment {
        file_name: image.file_name(),
        content_type: INLINE_IMAGE_CONTENT_TYPE.to_string(),
        is_inline: true,
        content_id: image.content_id.clone(),
        bytes,
    })
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|source| Error::AttachmentRead {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_keeps_body_then_signature() {
        let body = "<p>Bonjour,</p><p>Merci pour votre message.</p>";
        let signature = "<p><strong>Jane Doe</strong></p><img src=\"cid:logo\">";
        let html = MessageTemplate::new(body).with_signature(signature).render();

        let body_at = html.find(body).unwrap();
        let signature_at = html.find(signature).unwrap();
        assert!(body_at < signature_at);
        assert!(html.starts_with("<html>"));
        assert!(html.contains("font-family:Segoe UI, sans-serif"));
    }

    #[test]
    fn file_name_is_last_segment() {
        assert_eq!(InlineImage::new("a/b/logo.png", "logo").file_name(), "logo.png");
        assert_eq!(InlineImage::new("logo.png", "logo").file_name(), "logo.png");
    }

    #[test]
    fn parse_path_and_cid() {
        let image: InlineImage = "assets/logo.png:logo".parse().unwrap();
        assert_eq!(image, InlineImage::new("assets/logo.png", "logo"));

        let windows: InlineImage = r"C:\img\logo.png:logo".parse().unwrap();
        assert_eq!(windows.path, PathBuf::from(r"C:\img\logo.png"));

        assert!("logo.png".parse::<InlineImage>().is_err());
        assert!("logo.png:".parse::<InlineImage>().is_err());
    }

    #[tokio::test]
    async fn compose_inline_image() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        let path = nested.join("logo.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let template = MessageTemplate::new("<p>hi</p>");
        let message = compose(&template, &[InlineImage::new(&path, "logo")])
            .await
            .unwrap();

        assert_eq!(message.html_body, template.render());
        assert_eq!(message.attachments.len(), 1);
        let attachment = &message.attachments[0];
        assert_eq!(attachment.file_name, "logo.png");
        assert_eq!(attachment.content_type, "image/png");
        assert!(attachment.is_inline);
        assert_eq!(attachment.content_id, "logo");
        assert_eq!(attachment.bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn missing_image_fails_composition() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.png");

        let err = compose(&MessageTemplate::new("x"), &[InlineImage::new(&missing, "logo")])
            .await
            .unwrap_err();

        match err {
            Error::AttachmentRead { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }
}
