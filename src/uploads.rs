use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::api::UploadFile;

/// Extensions the ingestion endpoint can extract text from.
pub const JD_EXTENSIONS: &[&str] = &["pdf", "txt", "text", "md"];
pub const RESUME_EXTENSIONS: &[&str] = &["pdf"];

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| allowed.iter().any(|a| a.eq_ignore_ascii_case(e)))
}

/// Expands each argument as a glob pattern; a pattern that matches nothing is
/// an error rather than silently skipped. Order follows the arguments, then
/// glob order, with duplicates removed.
pub fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut out: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let mut matched = false;
        let paths = glob::glob(pattern).with_context(|| format!("bad pattern `{pattern}`"))?;
        for entry in paths {
            let path = entry.with_context(|| format!("cannot read a match of `{pattern}`"))?;
            if !path.is_file() {
                continue;
            }
            matched = true;
            if !out.contains(&path) {
                out.push(path);
            }
        }
        if !matched {
            bail!("no files match `{pattern}`");
        }
    }
    Ok(out)
}

pub async fn read_upload(path: &Path, allowed: &[&str]) -> Result<UploadFile> {
    if !has_extension(path, allowed) {
        bail!(
            "`{}` is not a supported file (expected {})",
            path.display(),
            allowed.iter().map(|e| format!(".{e}")).collect::<Vec<_>>().join(", ")
        );
    }
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(UploadFile { filename, bytes })
}

pub async fn read_uploads(paths: &[PathBuf], allowed: &[&str]) -> Result<Vec<UploadFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(read_upload(path, allowed).await?);
    }
    Ok(files)
}
