//! Graph mail folder types
//!
//! Graph exposes well-known folders under fixed names that can be used in
//! place of a folder id (`/mailFolders/inbox`). Anything else is an opaque
//! folder id and goes in the `Custom` variant.

use std::fmt;

/// A Graph mail folder.
///
/// # Examples
///
/// ```
/// use outlook_client::Folder;
///
/// assert_eq!(Folder::Inbox.as_str(), "inbox");
/// assert_eq!(Folder::from("Sent Items"), Folder::SentItems);
///
/// let custom = Folder::custom("AAMkAGI2TAAA=");
/// assert_eq!(custom.as_str(), "AAMkAGI2TAAA=");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Folder {
    Inbox,
    SentItems,
    Drafts,
    DeletedItems,
    JunkEmail,
    Archive,
    /// A folder id returned by the API.
    Custom(String),
}

impl Folder {
    #[must_use]
    pub fn custom(id: impl Into<String>) -> Self {
        Self::Custom(id.into())
    }

    /// The well-known name (or id) used in the request path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inbox => "inbox",
            Self::SentItems => "sentitems",
            Self::Drafts => "drafts",
            Self::DeletedItems => "deleteditems",
            Self::JunkEmail => "junkemail",
            Self::Archive => "archive",
            Self::Custom(id) => id,
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Folder {
    /// Matches well-known names case-insensitively, ignoring spaces, so
    /// both `sentitems` and the display name `Sent Items` resolve.
    fn from(s: &str) -> Self {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "inbox" => Self::Inbox,
            "sentitems" | "sent" => Self::SentItems,
            "drafts" => Self::Drafts,
            "deleteditems" | "trash" => Self::DeletedItems,
            "junkemail" | "junk" | "spam" => Self::JunkEmail,
            "archive" => Self::Archive,
            _ => Self::Custom(s.to_string()),
        }
    }
}

impl From<String> for Folder {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}
