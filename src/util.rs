use regex::{Captures, Regex};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

/// Truncate a string for display (Unicode-safe)
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    if s.chars().count() <= max_chars {
        s
    } else {
        let byte_idx = s
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        &s[..byte_idx]
    }
}

/// Maximum length for provider content echoed into error messages
const MAX_ERROR_CONTENT_LEN: usize = 200;

const REDACTED: &str = "[REDACTED]";

/// Key-shaped tokens, bearer credentials and values of secret-named fields.
fn secret_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)(?P<prefix>"?(?:api_?key|secret|password|credential|token)"?\s*[:=]\s*"?)[^",\s}]+|\bbearer\s+[A-Za-z0-9._~+/=-]+|\bsk-[A-Za-z0-9_-]+"#,
        )
        .expect("static regex")
    })
}

/// Scrub credentials out of a provider error body, then cap its length.
/// The rest of the body is kept so the operator still sees the reason.
pub fn sanitize_api_response(content: &str) -> String {
    let scrubbed = secret_regex().replace_all(content, |caps: &Captures<'_>| {
        match caps.name("prefix") {
            Some(prefix) => format!("{}{}", prefix.as_str(), REDACTED),
            None => REDACTED.to_string(),
        }
    });
    truncate_str(scrubbed.trim(), MAX_ERROR_CONTENT_LEN).to_string()
}

/// Write through a sibling temp file and rename over the target, so readers
/// never observe a half-written artifact.
pub fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp_path = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    drop(file);

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    Ok(())
}
