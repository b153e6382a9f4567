// src/settings/io.rs

use bevy::log::{debug, info, warn};
use directories_next::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::AppSettings;

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "SizeTable";
const APPLICATION: &str = "SizeTableGenerator";
const CONFIG_FILE: &str = "app_settings.json";

/// `app_settings.json` in the platform config directory, created on demand.
pub fn config_path() -> io::Result<PathBuf> {
    let dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).ok_or_else(|| {
        io::Error::new(ErrorKind::NotFound, "no config directory for this platform")
    })?;
    fs::create_dir_all(dirs.config_dir())?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}

pub fn load_settings_from_file<T: DeserializeOwned + Default>() -> io::Result<T> {
    load_settings_from_path(&config_path()?)
}

/// A missing file yields `T::default()`; an unparsable one is `InvalidData`.
pub fn load_settings_from_path<T: DeserializeOwned + Default>(config_file: &Path) -> io::Result<T> {
    let file = match fs::File::open(config_file) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("AppSettings: {:?} not found, using defaults.", config_file);
            return Ok(T::default());
        }
        Err(e) => return Err(e),
    };
    let settings = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        io::Error::new(
            ErrorKind::InvalidData,
            format!("could not parse {:?}: {}", config_file, e),
        )
    })?;
    info!("AppSettings: loaded {:?}", config_file);
    Ok(settings)
}

pub fn save_settings_to_path<T: Serialize>(config_file: &Path, settings: &T) -> io::Result<()> {
    let mut writer = BufWriter::new(fs::File::create(config_file)?);
    serde_json::to_writer_pretty(&mut writer, settings)
        .map_err(|e| io::Error::new(ErrorKind::Other, e))?;
    writer.flush()?;
    debug!("AppSettings: wrote {:?}", config_file);
    Ok(())
}

/// Store `dir` as the last export folder. The file is re-read first so command-line
/// overrides held in memory are never written back.
pub fn remember_export_dir(dir: &Path) -> io::Result<()> {
    remember_export_dir_at(&config_path()?, dir)
}

pub fn remember_export_dir_at(config_file: &Path, dir: &Path) -> io::Result<()> {
    let mut stored: AppSettings = match load_settings_from_path(config_file) {
        Ok(stored) => stored,
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            // Do not clobber a file the user is hand-editing.
            warn!("AppSettings: not saving export folder, {}", e);
            return Err(e);
        }
        Err(e) => return Err(e),
    };
    if stored.last_export_dir.as_deref() == Some(dir) {
        return Ok(());
    }
    stored.last_export_dir = Some(dir.to_path_buf());
    save_settings_to_path(config_file, &stored)?;
    info!("AppSettings: remembered export folder {:?}", dir);
    Ok(())
}
