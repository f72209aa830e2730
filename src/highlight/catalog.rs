//! Known names from model folders
//!
//! A LoRA or embedding is referred to by its file path inside the model folder, without the
//! extension: `styles/anime.safetensors` is known as `styles/anime`.

use crate::highlight::error::CatalogError;
use ignore::WalkBuilder;
use std::path::Path;

/// Every file below `dir` as a name: relative path, `/` separated, extension removed.
/// Hidden and ignored files are included. The result is sorted and free of duplicates.
pub fn names_from_dir(dir: impl AsRef<Path>) -> Result<Vec<String>, CatalogError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(CatalogError::NotADirectory(dir.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in WalkBuilder::new(dir)
        .standard_filters(false)
        .follow_links(true)
        .build()
    {
        let entry = entry.map_err(|source| CatalogError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        if let Some(name) = name_for(relative) {
            names.push(name);
        }
    }

    names.sort();
    names.dedup();
    tracing::debug!(dir = %dir.display(), count = names.len(), "collected names");
    Ok(names)
}

fn name_for(relative: &Path) -> Option<String> {
    let stem = relative.with_extension("");
    let parts: Vec<String> = stem
        .components()
        .map(|part| part.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
