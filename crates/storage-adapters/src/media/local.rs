//! Local filesystem implementation of `MediaStore`.
//! Content-addressable storage, directory sharding, and thumbnailing.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use domains::{DomainError, DomainResult, FieldErrors, MediaStore, Upload};
use image::ImageReader;
use sha2::{Digest, Sha256};
use tokio::fs;

/// Longest edge of generated thumbnails, in pixels.
const THUMBNAIL_EDGE: u32 = 250;

const UNDECODABLE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/media")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/media")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root_path: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_owned(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// "ab/cd/abcd…" relative to the root. Media ids are hex digests, so slicing is safe
    /// for ids this store produced; anything shorter is kept flat.
    fn relative(media_id: &str, file_name: &str) -> String {
        match (media_id.get(0..2), media_id.get(2..4)) {
            (Some(a), Some(b)) => format!("{a}/{b}/{file_name}"),
            _ => file_name.to_owned(),
        }
    }

    fn path_for(&self, media_id: &str, file_name: &str) -> PathBuf {
        self.root_path.join(Self::relative(media_id, file_name))
    }

    /// Decodes the original and writes a WebP thumbnail next to it.
    fn write_thumbnail(data: &[u8], target: &Path) -> Result<(), image::ImageError> {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .decode()?;
        let thumb = img.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE);
        thumb.save_with_format(target, image::ImageFormat::WebP)
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload using its SHA-256 hash as the filename.
    /// Identical uploads are stored once.
    async fn save_upload(&self, upload: Upload) -> DomainResult<String> {
        let hash = hex::encode(Sha256::digest(&upload.data));

        let target_path = self.path_for(&hash, &hash);
        let parent = target_path
            .parent()
            .ok_or_else(|| DomainError::internal("media path has no parent directory"))?;
        fs::create_dir_all(parent).await.map_err(DomainError::internal)?;

        if fs::try_exists(&target_path).await.map_err(DomainError::internal)? {
            tracing::debug!(media_id = %hash, "upload already stored");
            return Ok(hash);
        }

        // Decoding is CPU bound, keep it off the async workers.
        let thumb_path = self.path_for(&hash, &format!("thumb_{hash}.webp"));
        let data = upload.data.clone();
        tokio::task::spawn_blocking(move || Self::write_thumbnail(&data, &thumb_path))
            .await
            .map_err(DomainError::internal)?
            .map_err(|err| {
                tracing::warn!(error = %err, content_type = %upload.content_type, "rejected undecodable image");
                let mut errors = FieldErrors::new();
                errors.add("image", UNDECODABLE);
                DomainError::Validation(errors)
            })?;

        fs::write(&target_path, &upload.data).await.map_err(DomainError::internal)?;
        tracing::info!(media_id = %hash, bytes = upload.data.len(), "media stored");
        Ok(hash)
    }

    fn url(&self, media_id: &str) -> String {
        format!("{}/{}", self.url_prefix, Self::relative(media_id, media_id))
    }

    fn thumbnail_url(&self, media_id: &str) -> String {
        format!(
            "{}/{}",
            self.url_prefix,
            Self::relative(media_id, &format!("thumb_{media_id}.webp"))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png(width: u32, height: u32) -> bytes::Bytes {
        let img = ImageBuffer::from_pixel(width, height, Rgb([200u8, 30, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        bytes::Bytes::from(out.into_inner())
    }

    fn upload(data: bytes::Bytes) -> Upload {
        Upload {
            file_name: Some("red.png".into()),
            content_type: "image/png".into(),
            data,
        }
    }

    #[tokio::test]
    async fn stores_sharded_original_and_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path(), "/media/");

        let id = store.save_upload(upload(png(600, 300))).await.unwrap();
        assert_eq!(id.len(), 64);

        let original = dir.path().join(&id[0..2]).join(&id[2..4]).join(&id);
        let thumb = dir.path().join(&id[0..2]).join(&id[2..4]).join(format!("thumb_{id}.webp"));
        assert!(original.exists());
        assert!(thumb.exists());

        let (w, h) = image::image_dimensions(&thumb).unwrap();
        assert_eq!((w, h), (250, 125));

        assert_eq!(store.url(&id), format!("/media/{}/{}/{}", &id[0..2], &id[2..4], id));
        assert!(store.thumbnail_url(&id).ends_with(&format!("thumb_{id}.webp")));
    }

    #[tokio::test]
    async fn identical_uploads_share_one_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path(), "/media");
        let data = png(10, 10);

        let first = store.save_upload(upload(data.clone())).await.unwrap();
        let second = store.save_upload(upload(data)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn undecodable_bytes_are_rejected_and_not_stored() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path(), "/media");

        let result = store
            .save_upload(upload(bytes::Bytes::from_static(b"definitely not a png")))
            .await;
        assert!(matches!(result, Err(DomainError::Validation(ref e)) if e.contains("image")));

        let hash = hex::encode(Sha256::digest(b"definitely not a png"));
        assert!(!store.path_for(&hash, &hash).exists());
    }
}
