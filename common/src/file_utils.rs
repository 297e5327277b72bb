use anyhow::Result;
use std::path::{Path, PathBuf};

/// Create a filesystem-friendly slug from a title
pub fn create_slug(title: &str) -> String {
    title
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(50) // Limit length
        .collect()
}

/// Pull the file name out of a `Content-Disposition` header value.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let value = part.strip_prefix("filename=")?;
        let value = value.trim_matches('"');
        // never let the server pick a directory
        let name = Path::new(value).file_name()?.to_str()?.to_string();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    })
}

/// Fallback artifact name when the server does not provide one.
pub fn default_artifact_name(session_id: &str, extension: &str) -> String {
    let slug = create_slug(session_id);
    let stem = if slug.is_empty() { "download".to_string() } else { slug };
    format!("presentation_{stem}.{extension}")
}

/// Ensure the output directory exists
pub async fn ensure_output_dir<P: AsRef<Path>>(output_dir: P) -> Result<()> {
    let path = output_dir.as_ref();
    if !path.exists() {
        tokio::fs::create_dir_all(path).await?;
    }
    Ok(())
}

/// Save a downloaded artifact to the output directory
pub async fn save_artifact<P: AsRef<Path>>(
    output_dir: P,
    filename: &str,
    bytes: &[u8],
) -> Result<PathBuf> {
    let output_dir = output_dir.as_ref();
    ensure_output_dir(output_dir).await?;

    let file_path = output_dir.join(filename);
    tokio::fs::write(&file_path, bytes).await?;

    Ok(file_path)
}
