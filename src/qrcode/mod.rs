use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::uri::KeyUri;

/// Extract the key URI carried by a QR code image, as exported by
/// authenticator apps or shown on an enrollment screen.
///
/// The first QR code that decodes cleanly wins.
pub fn extract_key_uri(file_path: &Path) -> Result<KeyUri> {
    let img = image::open(file_path).map_err(|e| Error::QrCode {
        reason: format!("failed to open {}: {}", file_path.display(), e),
    })?;

    let decoder = bardecoder::default_decoder();
    let results = decoder.decode(&img);
    debug!(found = results.len(), "scanned image for QR codes");

    let uri = results
        .into_iter()
        .find_map(|r| r.ok())
        .ok_or_else(|| Error::QrCode {
            reason: String::from("no OTP url found in the image"),
        })?;

    KeyUri::parse(&uri)
}
