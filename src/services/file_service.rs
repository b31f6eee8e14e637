use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{guess_media_type, FileAttachment};
use crate::{Error, Result};

pub fn get_app_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| Error::Config("Could not find config directory".to_string()))?
        .join("CareLink");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Read a file picked for upload. The media type is guessed from the extension.
pub async fn load_attachment(path: impl AsRef<Path>) -> Result<FileAttachment> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let media_type = guess_media_type(&name);

    Ok(FileAttachment::new(name, media_type, bytes))
}
