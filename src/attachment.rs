use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::turn::ImageRef;

/// File delivered by a front-end together with a message.
///
/// Both fields are optional: an attachment only contributes an image when it
/// declares an image MIME type and points at a local file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Attachment {
    /// Build an attachment for a local file, guessing its MIME type from the
    /// extension.
    ///
    /// ```
    /// use hearth::Attachment;
    /// let a = Attachment::from_path("photos/cat.jpg");
    /// assert_eq!(a.mime.as_deref(), Some("image/jpeg"));
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mime = mime_guess::from_path(path).first().map(|m| m.to_string());
        Self {
            mime,
            path: Some(path.to_path_buf()),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.as_deref().is_some_and(|m| m.contains("image"))
    }
}

/// A message arriving from a front-end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IncomingMessage {
    pub content: String,
    #[serde(default)]
    pub elements: Vec<Attachment>,
}

impl IncomingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            elements: Vec::new(),
        }
    }

    /// Paths of the image attachments, in the order they were attached.
    pub fn image_refs(&self) -> Vec<ImageRef> {
        self.elements
            .iter()
            .filter(|a| a.is_image())
            .filter_map(|a| a.path.clone())
            .map(ImageRef::new)
            .collect()
    }
}
