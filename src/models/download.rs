//! Download and unpack the Kokoro multi-language model bundle.
//!
//! The release archive is a `.tar.bz2` holding a single top-level directory
//! named after the bundle. It is unpacked into a staging directory next to the
//! final location and moved into place only once extraction has finished, so
//! an interrupted download never leaves a half-written bundle behind.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bzip2::read::BzDecoder;
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::config::KOKORO_BUNDLE;

/// Release archive of the Kokoro multi-language v1.0 bundle.
pub const KOKORO_BUNDLE_URL: &str =
    "https://github.com/k2-fsa/sherpa-onnx/releases/download/tts-models/kokoro-multi-lang-v1_0.tar.bz2";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Make sure the Kokoro bundle exists under `<model_dir>/tts`, downloading it if needed.
///
/// Returns the bundle directory.
///
/// # Errors
/// Returns an error if the download or extraction fails.
pub fn ensure_kokoro_model(model_dir: &Path) -> Result<PathBuf> {
    let tts_dir = model_dir.join("tts");
    let bundle_dir = tts_dir.join(KOKORO_BUNDLE);

    if bundle_dir.join("model.onnx").exists() {
        debug!("Kokoro model already present at {}", bundle_dir.display());
        return Ok(bundle_dir);
    }

    info!("📥 Downloading Kokoro model bundle from {}", KOKORO_BUNDLE_URL);
    let client = Client::builder()
        .user_agent(concat!("book-narrator/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(KOKORO_BUNDLE_URL)
        .send()
        .with_context(|| format!("HTTP request failed for {}", KOKORO_BUNDLE_URL))?
        .error_for_status()
        .with_context(|| format!("Download failed for {}", KOKORO_BUNDLE_URL))?;

    install_bundle(response, &tts_dir)?;
    info!("✅ Kokoro model installed at {}", bundle_dir.display());
    Ok(bundle_dir)
}

/// Unpack a `.tar.bz2` bundle stream into `tts_dir`.
fn install_bundle<R: Read>(archive: R, tts_dir: &Path) -> Result<()> {
    let staging = tts_dir.join(".download");
    if staging.exists() {
        fs::remove_dir_all(&staging).with_context(|| format!("Failed to clear {}", staging.display()))?;
    }
    fs::create_dir_all(&staging).with_context(|| format!("Failed to create {}", staging.display()))?;

    let result = unpack(archive, &staging).and_then(|()| {
        let unpacked = staging.join(KOKORO_BUNDLE);
        if !unpacked.join("model.onnx").exists() {
            anyhow::bail!("Archive does not contain {}/model.onnx", KOKORO_BUNDLE);
        }

        let bundle_dir = tts_dir.join(KOKORO_BUNDLE);
        if bundle_dir.exists() {
            fs::remove_dir_all(&bundle_dir).with_context(|| format!("Failed to replace {}", bundle_dir.display()))?;
        }
        fs::rename(&unpacked, &bundle_dir)
            .with_context(|| format!("Failed to move bundle into {}", bundle_dir.display()))
    });

    let _ = fs::remove_dir_all(&staging);
    result
}

fn unpack<R: Read>(archive: R, dest: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(BzDecoder::new(archive));
    archive.unpack(dest).with_context(|| format!("Failed to unpack model archive into {}", dest.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bzip2::Compression;
    use bzip2::write::BzEncoder;

    fn bundle_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(BzEncoder::new(Vec::new(), Compression::fast()));
        for (path, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, *contents).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_existing_model_is_not_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("tts").join(KOKORO_BUNDLE);
        fs::create_dir_all(&bundle).unwrap();
        fs::write(bundle.join("model.onnx"), b"onnx").unwrap();

        assert_eq!(ensure_kokoro_model(dir.path()).unwrap(), bundle);
    }

    #[test]
    fn test_install_bundle_moves_files_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let model = format!("{}/model.onnx", KOKORO_BUNDLE);
        let tokens = format!("{}/tokens.txt", KOKORO_BUNDLE);
        let archive = bundle_archive(&[(&model, b"onnx"), (&tokens, b"a 1\n")]);

        install_bundle(archive.as_slice(), dir.path()).unwrap();

        let bundle = dir.path().join(KOKORO_BUNDLE);
        assert_eq!(fs::read(bundle.join("model.onnx")).unwrap(), b"onnx");
        assert!(bundle.join("tokens.txt").exists());
        assert!(!dir.path().join(".download").exists());
    }

    #[test]
    fn test_install_bundle_rejects_archive_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let archive = bundle_archive(&[("something-else/readme.txt", b"hi")]);

        assert!(install_bundle(archive.as_slice(), dir.path()).is_err());
        assert!(!dir.path().join(KOKORO_BUNDLE).exists());
        assert!(!dir.path().join(".download").exists());
    }
}
