// src/export.rs

//! Writes generated size tables to disk, one JSON file per item.

use bevy::log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::workflow::models::ItemMeta;

/// Returns `true` if `dir` already existed, `false` if it had to be created.
pub fn check_dir_then_create(dir: &Path) -> io::Result<bool> {
    if dir.is_dir() {
        return Ok(true);
    }
    fs::create_dir_all(dir)?;
    debug!("Export: created directory {:?}", dir);
    Ok(false)
}

fn file_stem_part(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "item".to_string()
    } else {
        cleaned
    }
}

pub fn export_file_name(item: &ItemMeta) -> String {
    format!(
        "{}_{}.json",
        file_stem_part(&item.code),
        file_stem_part(&item.size_code)
    )
}

/// `name` with `-2`, `-3`, ... inserted before the extension until it is unused in `taken`.
/// Compared case-insensitively so `A.json` and `a.json` count as the same file.
fn unique_file_name(name: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_lowercase()) {
        return name;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), format!(".{}", ext)),
        None => (name.clone(), String::new()),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}{}", stem, n, ext);
        if taken.insert(candidate.to_lowercase()) {
            warn!("Export: '{}' already used in this batch, writing '{}'", name, candidate);
            return candidate;
        }
        n += 1;
    }
}

/// Write every item to `dir` as pretty JSON. Returns the written paths in item order;
/// items whose names collide get a numeric suffix rather than overwriting each other.
pub fn save_item_tables(dir: &Path, items: &[ItemMeta]) -> io::Result<Vec<PathBuf>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    check_dir_then_create(dir)?;

    let mut written = Vec::with_capacity(items.len());
    let mut taken = HashSet::with_capacity(items.len());
    for item in items {
        let path = dir.join(unique_file_name(export_file_name(item), &mut taken));
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, item)
            .map_err(|e| io::Error::new(ErrorKind::Other, e))?;
        writer.flush()?;
        written.push(path);
    }
    info!("Export: wrote {} table(s) to {:?}", written.len(), dir);
    Ok(written)
}
