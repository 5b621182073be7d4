use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ServerError;

/// Recognize the image formats browsers render, by magic bytes.
pub fn sniff_image_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Reject any path that would escape `base`.
fn ensure_within(base: &Path, target: &Path) -> Result<PathBuf, ServerError> {
    let relative = target.strip_prefix(base).map_err(|_| {
        ServerError::BadRequest("Path traversal detected".to_string())
    })?;

    let mut resolved = base.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(c) => resolved.push(c),
            _ => {
                return Err(ServerError::BadRequest(
                    "Path traversal detected".to_string(),
                ));
            }
        }
    }
    Ok(resolved)
}

/// Item images on disk, one sub-directory per owner:
/// `<base>/<user_id>/<image_id>`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    base_path: PathBuf,
    max_size: usize,
}

impl ImageStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::ImageStorage(format!(
                "Failed to create image directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Image store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub async fn store_image(&self, user_id: Uuid, data: &[u8]) -> Result<Uuid, ServerError> {
        if data.is_empty() {
            return Err(ServerError::BadRequest("Empty image".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::ImageTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }
        if sniff_image_type(data).is_none() {
            return Err(ServerError::BadRequest(
                "Unsupported image format (expected PNG, JPEG, GIF or WebP)".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let dir = self.owner_dir(user_id)?;
        fs::create_dir_all(&dir).await.map_err(|e| {
            ServerError::ImageStorage(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let path = self.image_path(user_id, id)?;
        fs::write(&path, data)
            .await
            .map_err(|e| ServerError::ImageStorage(format!("Failed to write image {}: {}", id, e)))?;

        debug!(id = %id, user_id = %user_id, size = data.len(), "Stored image");
        Ok(id)
    }

    /// Read an image owned by `user_id`, with its content type.
    pub async fn get_image(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(Vec<u8>, &'static str), ServerError> {
        let path = self.image_path(user_id, id)?;

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ServerError::NotFound("Image not found".into()));
            }
            Err(e) => {
                return Err(ServerError::ImageStorage(format!(
                    "Failed to read image {}: {}",
                    id, e
                )));
            }
        };

        let content_type = sniff_image_type(&data).unwrap_or("application/octet-stream");
        Ok((data, content_type))
    }

    pub async fn delete_image(&self, user_id: Uuid, id: Uuid) -> Result<(), ServerError> {
        let path = self.image_path(user_id, id)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(id = %id, user_id = %user_id, "Deleted image");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ServerError::NotFound("Image not found".into()))
            }
            Err(e) => Err(ServerError::ImageStorage(format!(
                "Failed to delete image {}: {}",
                id, e
            ))),
        }
    }

    fn owner_dir(&self, user_id: Uuid) -> Result<PathBuf, ServerError> {
        ensure_within(&self.base_path, &self.base_path.join(user_id.to_string()))
    }

    fn image_path(&self, user_id: Uuid, id: Uuid) -> Result<PathBuf, ServerError> {
        let raw = self
            .base_path
            .join(user_id.to_string())
            .join(id.to_string());
        ensure_within(&self.base_path, &raw)
    }
}
