//! Card payload helpers: data URIs, image decoding, saving results to disk.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::info;

use crate::api::CardRecord;

impl CardRecord {
    /// `data:<mime>;base64,<payload>`, displayable as-is by an image viewer
    /// or browser.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.b64_encoded_image)
    }

    /// Decode the base64 image payload.
    pub fn decode_image(&self) -> Result<Vec<u8>, String> {
        STANDARD
            .decode(self.b64_encoded_image.trim())
            .map_err(|e| format!("card '{}' has an invalid image payload: {e}", self.name))
    }

    /// Approximate decoded image size in bytes, without decoding.
    pub fn image_size_hint(&self) -> usize {
        let payload = self.b64_encoded_image.trim();
        let padding = payload.bytes().rev().take_while(|b| *b == b'=').count();
        (payload.len() / 4 * 3).saturating_sub(padding)
    }

    /// One-line summary, e.g. `#25 Pikachu [Common]`.
    pub fn summary(&self) -> String {
        format!("#{} {} [{}]", self.bar, self.name, self.rarity)
    }
}

/// File extension for an image mime type.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// Write each card's image to `dir` as `<stamp>_<index>.<ext>`.
///
/// `dir` is created if missing. Returns the written paths in card order.
pub fn save_images(dir: &Path, cards: &[CardRecord], stamp: i64) -> Result<Vec<PathBuf>, String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("failed to create '{}': {e}", dir.display()))?;

    let mut written = Vec::with_capacity(cards.len());
    for (i, card) in cards.iter().enumerate() {
        let bytes = card.decode_image()?;
        let path = dir.join(format!("{stamp}_{i}.{}", extension_for_mime(&card.mime)));
        std::fs::write(&path, &bytes)
            .map_err(|e| format!("failed to write '{}': {e}", path.display()))?;
        info!("Saved card '{}' to {}", card.name, path.display());
        written.push(path);
    }
    Ok(written)
}

/// [`save_images`] stamped with the current unix time.
pub fn save_images_now(dir: &Path, cards: &[CardRecord]) -> Result<Vec<PathBuf>, String> {
    save_images(dir, cards, chrono::Utc::now().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::card;

    #[test]
    fn data_uri_combines_mime_and_payload() {
        let c = card("Pikachu", "25");
        assert_eq!(c.data_uri(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn decode_and_size_hint_agree() {
        let c = card("Pikachu", "25");
        let bytes = c.decode_image().unwrap();
        assert_eq!(bytes, b"hello");
        assert_eq!(c.image_size_hint(), 5);
    }

    #[test]
    fn invalid_payload_names_the_card() {
        let mut c = card("Broken", "1");
        c.b64_encoded_image = "***".into();
        let err = c.decode_image().unwrap_err();
        assert!(err.contains("Broken"));
    }

    #[test]
    fn summary_format() {
        assert_eq!(card("Pikachu", "25").summary(), "#25 Pikachu [Common]");
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("IMAGE/JPEG"), "jpg");
        assert_eq!(extension_for_mime("application/octet-stream"), "bin");
    }

    #[test]
    fn save_images_writes_stamped_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cards");
        let cards = vec![card("A", "1"), card("B", "2")];

        let paths = save_images(&out, &cards, 1_700_000_000).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], out.join("1700000000_0.png"));
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"hello");
    }
}
