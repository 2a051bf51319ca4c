use std::path::{Path, PathBuf};

/// Author of a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Local path to an image supplied alongside a user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(PathBuf);

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// One message of a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    System { content: String },
    /// `images` is empty unless the message carried image attachments.
    User {
        content: String,
        images: Vec<ImageRef>,
    },
    Assistant { content: String },
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Turn::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Turn::User {
            content: content.into(),
            images: Vec::new(),
        }
    }

    pub fn user_with_images(content: impl Into<String>, images: Vec<ImageRef>) -> Self {
        Turn::User {
            content: content.into(),
            images,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Turn::Assistant {
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Turn::System { .. } => Role::System,
            Turn::User { .. } => Role::User,
            Turn::Assistant { .. } => Role::Assistant,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Turn::System { content } | Turn::User { content, .. } | Turn::Assistant { content } => {
                content
            }
        }
    }

    /// Images attached to this turn; always empty for non-user turns.
    pub fn images(&self) -> &[ImageRef] {
        match self {
            Turn::User { images, .. } => images,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_user_turns_carry_images() {
        let img = ImageRef::new("/tmp/a.png");
        let user = Turn::user_with_images("look", vec![img.clone()]);
        assert_eq!(user.role(), Role::User);
        assert_eq!(user.images(), &[img]);
        assert!(Turn::assistant("ok").images().is_empty());
        assert_eq!(Turn::system("be nice").role().as_str(), "system");
    }
}
