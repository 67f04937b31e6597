//! Storage for uploaded receipt images.
//!
//! Receipts live as plain files under the uploads directory and are served
//! back at `/uploads/<name>`. The database row referencing a receipt is the
//! source of truth; file removal after a delete is best-effort only.

use std::{fs, path::Path};

use time::OffsetDateTime;

use crate::Error;

/// Store an uploaded receipt image and return its public `/uploads/...` path.
///
/// The file name combines a timestamp with a hash of the content, so
/// re-uploading the same image does not clobber an unrelated file.
///
/// # Errors
/// This function will return a:
/// - [Error::NotAnImage] if `content_type` is not an `image/*` type,
/// - or [Error::IoError] if the file cannot be written.
pub fn save_receipt(
    data: &[u8],
    content_type: Option<&str>,
    uploads_dir: &Path,
) -> Result<String, Error> {
    let content_type = content_type.unwrap_or_default();
    if !content_type.starts_with("image/") {
        return Err(Error::NotAnImage);
    }

    let extension = match content_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    };

    let digest = md5::compute(data);
    let stamp = OffsetDateTime::now_utc().unix_timestamp();
    let file_name = format!("receipt-{stamp}-{digest:x}.{extension}");

    fs::create_dir_all(uploads_dir)?;
    fs::write(uploads_dir.join(&file_name), data)?;

    tracing::debug!("Stored receipt {file_name} ({} bytes)", data.len());

    Ok(format!("/uploads/{file_name}"))
}

/// Remove the stored file behind a `/uploads/...` path, best-effort.
///
/// Failures are logged and swallowed: the transaction row is already gone and
/// an orphaned image must not fail the request.
pub fn remove_receipt(receipt_url: &str, uploads_dir: &Path) {
    // Take only the final path segment so a mangled URL cannot point outside
    // the uploads directory.
    let file_name = match receipt_url.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => {
            tracing::warn!("Could not derive a file name from receipt URL \"{receipt_url}\"");
            return;
        }
    };

    if let Err(error) = fs::remove_file(uploads_dir.join(file_name)) {
        tracing::warn!("Could not remove receipt file {file_name}: {error}");
    }
}
