use serde::{Deserialize, Serialize};

use super::AttachmentMeta;

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// A file picked by the user, held only until the request is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub name: String,
    pub media_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl FileAttachment {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn meta(&self) -> AttachmentMeta {
        AttachmentMeta {
            name: self.name.clone(),
            media_type: self.media_type.clone(),
        }
    }
}

pub fn guess_media_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or(DEFAULT_MEDIA_TYPE)
        .to_string()
}

/// One user action: text, an optional file and the "explain like I'm five" toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub message: String,
    pub file: Option<FileAttachment>,
    pub simplify: bool,
}

impl Submission {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_file(mut self, file: FileAttachment) -> Self {
        self.file = Some(file);
        self
    }

    pub fn simplified(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }
}
