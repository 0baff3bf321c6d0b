//! Inline media (data URIs) and stored blob names.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Route prefix under which stored blobs are served.
pub const BLOB_ROUTE_PREFIX: &str = "/images";

/// Maximum length of a stored blob file name in bytes.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Matches the `data:<mime>[;<param>=<value>]*;base64,` header of an inline
/// data URI and captures the mime subtype.
pub const DATA_URI_PATTERN: &str = r"^data:[\w.+-]+/([\w.+-]+)(?:;[\w.+-]+=[^;,]*)*;base64,";

static DATA_URI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DATA_URI_PATTERN).expect("valid regex"));

/// True if `reference` carries its content inline instead of pointing at a
/// stored blob.
pub fn is_inline(reference: &str) -> bool {
    DATA_URI_RE.is_match(reference)
}

/// Strip a `data:<mime>;base64,` header, leaving the base64 payload.
/// Input without a header is returned unchanged.
pub fn strip_data_uri_prefix(content: &str) -> &str {
    match DATA_URI_RE.find(content) {
        Some(m) => &content[m.end()..],
        None => content,
    }
}

/// File extension for the mime subtype of an inline data URI.
pub fn extension_for(content: &str) -> Option<&'static str> {
    let subtype = DATA_URI_RE.captures(content)?.get(1)?.as_str();
    let ext = match subtype {
        "png" => "png",
        "jpeg" | "jpg" => "jpg",
        "gif" => "gif",
        "webp" => "webp",
        "svg+xml" => "svg",
        "mpeg" | "mp3" => "mp3",
        "ogg" => "ogg",
        "wav" | "x-wav" => "wav",
        _ => return None,
    };
    Some(ext)
}

/// Build a blob file name from `stem` and the type of `content`, falling
/// back to `bin` when the type is unknown.
pub fn media_file_name(stem: &str, content: &str) -> String {
    format!("{stem}.{}", extension_for(content).unwrap_or("bin"))
}

/// Served path of a stored blob.
pub fn blob_path(filename: &str) -> String {
    format!("{BLOB_ROUTE_PREFIX}/{filename}")
}

/// Validate a blob file name: a single non-hidden path component.
pub fn validate_blob_filename(filename: &str) -> Result<(), CoreError> {
    if filename.is_empty() {
        return Err(CoreError::Validation("filename must not be empty".to_string()));
    }
    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "filename exceeds maximum length of {MAX_FILENAME_LENGTH} bytes"
        )));
    }
    if filename.starts_with('.') {
        return Err(CoreError::Validation(format!(
            "filename '{filename}' must not start with a dot"
        )));
    }
    if filename.contains(['/', '\\', '\0']) {
        return Err(CoreError::Validation(format!(
            "filename '{filename}' must not contain path separators"
        )));
    }
    Ok(())
}
