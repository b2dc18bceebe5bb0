//! Path helpers for level documents
//!
//! Documents written on Windows reference sets with backslashes
//! (`sets\city.xml`). Set references are normalized to forward slashes before
//! they are joined onto the referencing document's directory.

use std::path::{Component, Path, PathBuf};

/// Normalize path to forward slashes
#[inline]
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Resolve a `FileName` reference against the directory of the document
/// that contains it. `..` is collapsed lexically so the same file always
/// resolves to the same path. Absolute references are returned as given.
pub fn resolve_reference(base_dir: &Path, file_name: &str) -> PathBuf {
    let normalized = normalize_path(file_name.trim());
    if Path::new(&normalized).is_absolute() {
        return PathBuf::from(normalized);
    }
    let mut resolved = base_dir.to_path_buf();
    for part in normalized.split('/').filter(|p| !p.is_empty() && *p != ".") {
        let parent_popped = part == ".."
            && matches!(resolved.components().next_back(), Some(Component::Normal(_)))
            && resolved.pop();
        if !parent_popped {
            resolved.push(part);
        }
    }
    resolved
}

/// Sanitize a file name for Windows compatibility
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Sanitized document file name, `.xml` appended when missing
pub fn document_file_name(name: &str) -> String {
    let name = sanitize_filename(name.trim());
    if name.to_ascii_lowercase().ends_with(".xml") {
        name
    } else {
        format!("{}.xml", name)
    }
}
