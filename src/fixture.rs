//! Upload fixtures: fixed files handed to file inputs.

use crate::{Error, Result};
use base64::Engine as Base64Engine;
use log::debug;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// A file read from the fixture directory.
#[derive(Debug, Clone)]
pub struct FileFixture {
    /// File name as the page sees it
    pub name: String,
    /// MIME type announced with the upload
    pub mime: String,
    /// Absolute or working-directory relative path on disk
    pub path: PathBuf,
    /// File contents
    pub bytes: Vec<u8>,
}

impl FileFixture {
    /// Build a fixture from in-memory bytes; the MIME type is guessed from `name`.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            mime: guess_mime(name),
            path: PathBuf::from(name),
            bytes,
        }
    }

    /// Override the announced MIME type.
    pub fn with_mime(mut self, mime: &str) -> Self {
        self.mime = mime.to_string();
        self
    }

    /// Hex-encoded SHA-256 of the contents.
    pub fn sha256(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    /// The contents as a `data:` URL.
    pub fn data_url(&self) -> String {
        let b64 = Base64Engine::encode(&base64::engine::general_purpose::STANDARD, &self.bytes);
        format!("data:{};base64,{}", self.mime, b64)
    }

    /// True when the fixture's MIME type satisfies an `accept` attribute value.
    pub fn matches_accept(&self, accept: &str) -> bool {
        let ext = Path::new(&self.name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()));
        accept
            .split(',')
            .map(|a| a.trim().to_ascii_lowercase())
            .filter(|a| !a.is_empty())
            .any(|a| {
                if let Some(prefix) = a.strip_suffix("/*") {
                    self.mime.starts_with(&format!("{}/", prefix))
                } else if a.starts_with('.') {
                    ext.as_deref() == Some(a.as_str())
                } else {
                    a == self.mime
                }
            })
    }
}

fn guess_mime(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Directory of fixture files.
#[derive(Debug, Clone)]
pub struct FixtureStore {
    root: PathBuf,
}

impl FixtureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load `name` from the store.
    pub fn load(&self, name: &str) -> Result<FileFixture> {
        let path = self.root.join(name);
        let bytes = std::fs::read(&path).map_err(|source| Error::FixtureError {
            name: name.to_string(),
            source,
        })?;
        let fixture = FileFixture {
            name: name.to_string(),
            mime: guess_mime(name),
            path,
            bytes,
        };
        debug!(
            "loaded fixture {} ({} bytes, sha256 {})",
            fixture.name,
            fixture.bytes.len(),
            fixture.sha256()
        );
        Ok(fixture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_is_guessed_from_extension() {
        let f = FileFixture::from_bytes("meme.jpeg", vec![0xff, 0xd8]);
        assert_eq!(f.mime, "image/jpeg");
        let f = FileFixture::from_bytes("notes.txt", vec![]);
        assert_eq!(f.mime, "text/plain");
    }

    #[test]
    fn accept_patterns() {
        let f = FileFixture::from_bytes("meme.jpeg", vec![]);
        assert!(f.matches_accept("image/*"));
        assert!(f.matches_accept("image/png, image/jpeg"));
        assert!(f.matches_accept(".jpg,.jpeg"));
        assert!(!f.matches_accept("video/*"));
        assert!(!f.matches_accept(""));
    }

    #[test]
    fn data_url_and_digest() {
        let f = FileFixture::from_bytes("a.png", b"abc".to_vec());
        assert_eq!(f.data_url(), "data:image/png;base64,YWJj");
        assert_eq!(
            f.sha256(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn missing_fixture_is_reported() {
        let store = FixtureStore::new("does/not/exist");
        match store.load("meme.jpeg") {
            Err(Error::FixtureError { name, .. }) => assert_eq!(name, "meme.jpeg"),
            other => panic!("unexpected: {:?}", other.map(|f| f.name)),
        }
    }

    #[test]
    fn bundled_meme_fixture_loads() {
        let store = FixtureStore::new(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures"));
        let f = store.load("meme.jpeg").expect("fixture present");
        assert_eq!(f.mime, "image/jpeg");
        assert_eq!(&f.bytes[..2], &[0xff, 0xd8]);
    }
}
