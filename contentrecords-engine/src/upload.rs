//! Upload persistence.

use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::debug;

use crate::context::UploadedFile;
use crate::error::EngineResult;

const FALLBACK_BASE: &str = "upload";

/// Keeps ASCII letters, digits, `-`, `_` and `.`; spaces become `-`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => Some(c),
            ' ' => Some('-'),
            _ => None,
        })
        .collect()
}

/// Builds the stored file name `<base>-<unix-nanos><ext>` for a client name.
pub fn stored_filename(client_name: &str, nanos: i64) -> String {
    let name = client_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let (base, ext) = match name.rfind('.') {
        Some(idx) => (&name[..idx], &name[idx..]),
        None => (name, ""),
    };
    let mut base = sanitize_filename(base);
    if base.is_empty() {
        base = FALLBACK_BASE.to_string();
    }
    format!("{base}-{nanos}{}", sanitize_filename(ext))
}

/// Writes an uploaded file into `upload_dir`, creating the directory if
/// needed. Returns the path of the stored file.
pub fn save_upload(file: &UploadedFile, upload_dir: &str) -> EngineResult<String> {
    let dir = Path::new(upload_dir);
    fs::create_dir_all(dir)?;
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let dest = dir.join(stored_filename(&file.filename, nanos));
    fs::write(&dest, &file.data)?;
    debug!(field = %file.field, path = %dest.display(), bytes = file.data.len(), "stored upload");
    Ok(dest.to_string_lossy().into_owned())
}
