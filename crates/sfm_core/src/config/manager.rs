//! Loading and saving of the settings file.
//!
//! Writes go through a sibling `.toml.tmp` file that is renamed over the
//! real one. Tables the program does not know are dropped and missing
//! tables are filled with defaults on the next write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::DocumentMut;

use super::settings::{ConfigSection, Settings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not access settings file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Invalid settings: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Could not encode settings: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Settings file is not valid TOML: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Settings file {0} does not exist")]
    NotFound(PathBuf),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns the settings file at one path and the values read from it.
pub struct ConfigManager {
    path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Holds defaults until [`load`](Self::load) or
    /// [`load_or_create`](Self::load_or_create) is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory only until [`save`](Self::save).
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Read the file, failing with [`ConfigError::NotFound`] if it is absent.
    pub fn load(&mut self) -> ConfigResult<()> {
        let text = self.read_existing()?.ok_or_else(|| ConfigError::NotFound(self.path.clone()))?;
        self.settings = toml::from_str(&text)?;
        Ok(())
    }

    /// Read the file, writing a default one first if it is absent.
    ///
    /// A file with unknown or missing tables is rewritten in canonical form.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        let Some(text) = self.read_existing()? else {
            self.settings = Settings::default();
            return self.save();
        };

        self.settings = toml::from_str(&text)?;
        if needs_rewrite(&text.parse::<DocumentMut>()?) {
            tracing::debug!(path = %self.path.display(), "normalising settings file");
            self.save()?;
        }
        Ok(())
    }

    /// Write every table, with a comment above each, atomically.
    pub fn save(&self) -> ConfigResult<()> {
        let mut out = String::from(
            "# sfm-run configuration\n# Command line flags override these values for a single run.\n",
        );
        for section in ConfigSection::ALL {
            out.push_str(&format!(
                "\n# {}\n[{}]\n",
                section.description(),
                section.table_name()
            ));
            out.push_str(&self.section_toml(section)?);
        }
        self.write_replacing(&out)?;
        Ok(())
    }

    fn read_existing(&self) -> ConfigResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn section_toml(&self, section: ConfigSection) -> ConfigResult<String> {
        let s = &self.settings;
        let body = match section {
            ConfigSection::Tools => toml::to_string_pretty(&s.tools)?,
            ConfigSection::Reconstruction => toml::to_string_pretty(&s.reconstruction)?,
            ConfigSection::Frames => toml::to_string_pretty(&s.frames)?,
            ConfigSection::Training => toml::to_string_pretty(&s.training)?,
            ConfigSection::Logging => toml::to_string_pretty(&s.logging)?,
        };
        Ok(body)
    }

    fn write_replacing(&self, content: &str) -> io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let staged = self.path.with_extension("toml.tmp");
        let mut file = fs::File::create(&staged)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&staged, &self.path)
    }
}

/// True when the document has a table we do not know or lacks one we do.
fn needs_rewrite(doc: &DocumentMut) -> bool {
    let unknown = doc
        .iter()
        .any(|(key, _)| !ConfigSection::ALL.iter().any(|s| s.table_name() == key));
    let missing = ConfigSection::ALL
        .iter()
        .any(|s| !doc.contains_key(s.table_name()));
    unknown || missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MapperBackend;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn first_load_writes_defaults() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("sfm-run").join("settings.toml");

        let mut cfg = ConfigManager::new(&file);
        cfg.load_or_create().unwrap();

        assert!(file.exists());
        let written = fs::read_to_string(&file).unwrap();
        assert!(written.contains("[tools]"));
        assert!(written.contains("[training]"));
        assert!(written.contains("camera_model = \"PINHOLE\""));
    }

    #[test]
    fn saved_file_loads_back_unchanged() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("settings.toml");

        let mut cfg = ConfigManager::new(&file);
        cfg.settings_mut().reconstruction.mapper = MapperBackend::Colmap;
        cfg.settings_mut().logging.log_file = Some("/tmp/run.log".to_string());
        cfg.save().unwrap();

        let mut reloaded = ConfigManager::new(&file);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings(), cfg.settings());
    }

    #[test]
    fn load_or_create_preserves_existing_values() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("settings.toml");
        fs::write(&file, "[tools]\ncolmap = \"/opt/colmap/bin/colmap\"\n").unwrap();

        let mut cfg = ConfigManager::new(&file);
        cfg.load_or_create().unwrap();

        assert_eq!(cfg.settings().tools.colmap, "/opt/colmap/bin/colmap");
        let written = fs::read_to_string(&file).unwrap();
        assert!(written.contains("/opt/colmap/bin/colmap"));
        assert!(written.contains("[logging]"));
    }

    #[test]
    fn unknown_sections_are_dropped() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("settings.toml");
        fs::write(&file, "[mux]\nmkvmerge = \"x\"\n").unwrap();

        let mut cfg = ConfigManager::new(&file);
        cfg.load_or_create().unwrap();

        let written = fs::read_to_string(&file).unwrap();
        assert!(!written.contains("[mux]"));
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let tmp = tempdir().unwrap();
        let mut cfg = ConfigManager::new(tmp.path().join("absent.toml"));
        assert!(matches!(cfg.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn save_leaves_no_staging_file() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("settings.toml");

        let mut cfg = ConfigManager::new(&file);
        cfg.load_or_create().unwrap();

        assert!(!file.with_extension("toml.tmp").exists());
    }
}
