//! Checks shared by the external tool wrappers.

use anyhow::{anyhow, Result};

/// Reject executable paths that could smuggle shell syntax or traverse directories.
pub(crate) fn validate_executable(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(anyhow!("Executable path is empty"));
    }

    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(anyhow!("Path contains dangerous characters: {}", path));
    }

    if path.contains("..") {
        return Err(anyhow!("Path contains directory traversal: {}", path));
    }

    if !path
        .chars()
        .all(|c| c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\')
    {
        return Err(anyhow!("Path contains unsafe characters: {}", path));
    }

    Ok(())
}

/// Keep the end of a diagnostic stream, where tools report the actual failure.
pub(crate) fn stderr_tail(stderr: &[u8], max_chars: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - max_chars).collect();
    format!("...{}", tail)
}
