//! One-shot notices shown on the next rendered page.

use serde::{Deserialize, Serialize};

use super::{SessionStore, SessionStoreError, keys, read, readable, write};

/// Visual style of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    /// CSS modifier class.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "notice--success",
            Self::Error => "notice--error",
        }
    }
}

/// A user-facing notification: a title plus one line of detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub kind: NoticeKind,
}

impl Notice {
    #[must_use]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind: NoticeKind::Success,
        }
    }

    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind: NoticeKind::Error,
        }
    }

    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        self.kind.css_class()
    }
}

/// Queue a notice for the next page. Replaces any pending notice.
///
/// # Errors
///
/// Returns an error if the session backend fails.
pub async fn push_notice<S>(store: &S, notice: &Notice) -> Result<(), SessionStoreError>
where
    S: SessionStore + ?Sized,
{
    write(store, keys::FLASH, notice).await
}

/// Take the pending notice, if any. It is shown once.
///
/// # Errors
///
/// Returns an error if the session backend fails.
pub async fn take_notice<S>(store: &S) -> Result<Option<Notice>, SessionStoreError>
where
    S: SessionStore + ?Sized,
{
    let notice = match read(store, keys::FLASH).await {
        Ok(None) => return Ok(None),
        other => readable(other, keys::FLASH)?,
    };
    store.delete_value(keys::FLASH).await?;
    Ok(notice)
}
