//! Upload encoder
//!
//! Converts a locally picked image asset into a named binary payload with a
//! content type, ready for blob upload.
//!
//! - In-memory base64 payloads are decoded directly (no I/O)
//! - Otherwise the file behind the asset URI is read once
//! - MIME type defaults to `image/jpeg`; extension comes from the subtype

use crate::error::EncodeError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// MIME type assumed when the picker reports none
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Extension used for unknown or missing subtypes
pub const FALLBACK_EXTENSION: &str = "jpg";

/// Locally selected image, as reported by the device picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Local URI (`file://...` or plain path)
    pub uri: String,
    /// Payload already held in memory by the picker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    /// Reported MIME type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl AssetDescriptor {
    /// Asset backed by a local file
    #[inline]
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            base64: None,
            mime_type: None,
        }
    }

    /// With in-memory base64 payload
    #[inline]
    #[must_use]
    pub fn with_base64(mut self, payload: impl Into<String>) -> Self {
        self.base64 = Some(payload.into());
        self
    }

    /// With reported MIME type
    #[inline]
    #[must_use]
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// Effective content type
    #[inline]
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// File extension derived from the content type
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        extension_for_mime(self.mime_type.as_deref())
    }
}

/// Encoded payload ready for upload
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct UploadFile {
    /// Object name (staged name), unique within the storage namespace
    pub name: String,
    /// Content type sent with the upload
    pub content_type: String,
    /// Decoded binary content
    #[serde(rename = "size", serialize_with = "serialize_len")]
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Create payload
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Payload size in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether payload is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn serialize_len<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(bytes.len() as u64)
}

/// Map a MIME type to a file extension
///
/// `jpeg` is normalized to `jpg`; anything unrecognised falls back to `jpg`.
#[must_use]
pub fn extension_for_mime(mime: Option<&str>) -> &'static str {
    let Some(subtype) = mime.and_then(|m| m.split_once('/')).map(|(_, sub)| sub) else {
        return FALLBACK_EXTENSION;
    };

    // "png; charset=..." and "svg+xml" style suffixes
    let subtype = subtype
        .split(';')
        .next()
        .unwrap_or_default()
        .split('+')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match subtype.as_str() {
        "png" => "png",
        "gif" => "gif",
        "webp" => "webp",
        "heic" => "heic",
        "heif" => "heif",
        "bmp" => "bmp",
        "tiff" => "tiff",
        "avif" => "avif",
        _ => FALLBACK_EXTENSION,
    }
}

/// Fresh collision-free object name for an asset: `<uuid v4>.<ext>`
#[must_use]
pub fn staged_name(mime: Option<&str>) -> String {
    format!("{}.{}", Uuid::new_v4(), extension_for_mime(mime))
}

/// Encode one asset under the given name
///
/// # Errors
/// - `EncodeError::Decode` if the in-memory payload is not valid base64
/// - `EncodeError::Read` if the local file cannot be read
pub async fn encode_asset(
    asset: &AssetDescriptor,
    name: impl Into<String>,
) -> Result<UploadFile, EncodeError> {
    let bytes = match asset.base64.as_deref() {
        Some(payload) => decode_base64(&asset.uri, payload)?,
        None => tokio::fs::read(local_path(&asset.uri))
            .await
            .map_err(|source| EncodeError::Read {
                uri: asset.uri.clone(),
                source,
            })?,
    };

    Ok(UploadFile::new(name, asset.content_type(), bytes))
}

/// Encode each asset independently, preserving input order
///
/// One failed asset does not abort the others.
pub async fn encode_batch<F>(
    assets: &[AssetDescriptor],
    mut name_for: F,
) -> Vec<Result<UploadFile, EncodeError>>
where
    F: FnMut(&AssetDescriptor, usize) -> String,
{
    let jobs = assets
        .iter()
        .enumerate()
        .map(|(i, asset)| encode_asset(asset, name_for(asset, i)));
    futures::future::join_all(jobs).await
}

fn decode_base64(uri: &str, payload: &str) -> Result<Vec<u8>, EncodeError> {
    // Data URLs carry a "data:image/png;base64," prefix
    let payload = payload
        .split_once(";base64,")
        .map_or(payload, |(_, data)| data);
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    STANDARD
        .decode(compact.as_bytes())
        .map_err(|source| EncodeError::Decode {
            uri: uri.to_string(),
            source,
        })
}

fn local_path(uri: &str) -> &Path {
    Path::new(uri.strip_prefix("file://").unwrap_or(uri))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn extension_defaults_to_jpg() {
        assert_eq!(extension_for_mime(None), "jpg");
        assert_eq!(extension_for_mime(Some("")), "jpg");
        assert_eq!(extension_for_mime(Some("image/")), "jpg");
        assert_eq!(extension_for_mime(Some("garbage")), "jpg");
    }

    #[test]
    fn extension_from_subtype() {
        assert_eq!(extension_for_mime(Some("image/png")), "png");
        assert_eq!(extension_for_mime(Some("image/jpeg")), "jpg");
        assert_eq!(extension_for_mime(Some("image/JPEG")), "jpg");
        assert_eq!(extension_for_mime(Some("image/webp; q=1")), "webp");
        assert_eq!(extension_for_mime(Some("image/x-unknown")), "jpg");
        assert_eq!(extension_for_mime(Some("image/svg+xml")), "jpg");
    }

    #[test]
    fn staged_names_are_unique() {
        let a = staged_name(Some("image/png"));
        let b = staged_name(Some("image/png"));
        assert_ne!(a, b);
        assert!(a.ends_with(".png"));
        assert_eq!(a.len(), 36 + ".png".len());
    }

    #[test]
    fn content_type_defaults_to_jpeg() {
        let asset = AssetDescriptor::new("file:///a");
        assert_eq!(asset.content_type(), DEFAULT_CONTENT_TYPE);

        let asset = asset.with_mime_type("image/png");
        assert_eq!(asset.content_type(), "image/png");
        assert_eq!(asset.extension(), "png");
    }

    #[tokio::test]
    async fn encodes_in_memory_payload_without_io() {
        let asset = AssetDescriptor::new("file:///does/not/exist.png")
            .with_base64(STANDARD.encode(b"pixels"))
            .with_mime_type("image/png");

        let file = encode_asset(&asset, "n1.png").await.unwrap();
        assert_eq!(file.name, "n1.png");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.bytes, b"pixels");
    }

    #[tokio::test]
    async fn decodes_data_url_and_wrapped_lines() {
        let encoded = STANDARD.encode(b"some longer image payload");
        let (head, tail) = encoded.split_at(8);
        let asset = AssetDescriptor::new("mem://1")
            .with_base64(format!("data:image/png;base64,{head}\n{tail}"));

        let file = encode_asset(&asset, "x.png").await.unwrap();
        assert_eq!(file.bytes, b"some longer image payload");
    }

    #[tokio::test]
    async fn reads_local_file_when_no_payload() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"jpeg bytes").unwrap();
        let uri = format!("file://{}", tmp.path().display());

        let file = encode_asset(&AssetDescriptor::new(uri), "a.jpg").await.unwrap();
        assert_eq!(file.bytes, b"jpeg bytes");
        assert_eq!(file.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn missing_file_is_read_error() {
        let asset = AssetDescriptor::new("/definitely/not/here.jpg");
        let err = encode_asset(&asset, "a.jpg").await.unwrap_err();
        assert!(matches!(err, EncodeError::Read { .. }));
    }

    #[tokio::test]
    async fn invalid_base64_is_decode_error() {
        let asset = AssetDescriptor::new("mem://bad").with_base64("!!not base64!!");
        let err = encode_asset(&asset, "a.jpg").await.unwrap_err();
        assert!(matches!(err, EncodeError::Decode { .. }));
    }

    #[tokio::test]
    async fn batch_failures_are_independent() {
        let assets = vec![
            AssetDescriptor::new("mem://ok").with_base64(STANDARD.encode(b"a")),
            AssetDescriptor::new("/missing.jpg"),
            AssetDescriptor::new("mem://ok2").with_base64(STANDARD.encode(b"b")),
        ];

        let results = encode_batch(&assets, |_, i| format!("n{i}.jpg")).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().name, "n0.jpg");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().bytes, b"b");
    }

    #[test]
    fn upload_file_serializes_size_not_bytes() {
        let file = UploadFile::new("a.png", "image/png", vec![0; 12]);
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["size"], 12);
        assert_eq!(json["name"], "a.png");
        assert!(format!("{file:?}").contains("len: 12"));
    }
}
