use crate::domain::{config::ProbeConfig, error::{ProbeError, ProbeResult}};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_DIR: &str = ".serprobe";
const CONFIG_FILE: &str = "config.toml";

/// Configuration manager
pub struct ConfigManager {
    global_config_path: PathBuf,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> ProbeResult<Self> {
        let global_config_path = Self::default_global_config_path()?;
        let project_config_path = std::env::current_dir()
            .ok()
            .and_then(|dir| Self::find_project_config_path(&dir));

        Ok(Self::with_paths(global_config_path, project_config_path))
    }

    pub fn with_paths(global_config_path: PathBuf, project_config_path: Option<PathBuf>) -> Self {
        Self {
            global_config_path,
            project_config_path,
        }
    }

    /// Load configuration: defaults, then the global file, then the project file.
    ///
    /// A later file replaces the whole contents of the earlier one.
    pub fn load_config(&self) -> ProbeResult<ProbeConfig> {
        let mut config = ProbeConfig::default();

        if self.global_config_path.exists() {
            debug!("Loading global config {}", self.global_config_path.display());
            config = self.load_config_from_path(&self.global_config_path)?;
        }

        if let Some(project_path) = &self.project_config_path {
            if project_path.exists() {
                debug!("Loading project config {}", project_path.display());
                config = self.load_config_from_path(project_path)?;
            }
        }

        Ok(config)
    }

    fn default_global_config_path() -> ProbeResult<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ProbeError::config("Could not determine home directory"))?;

        Ok(home.join(".config").join("serprobe").join(CONFIG_FILE))
    }

    /// Find project configuration by walking up from `start`
    pub fn find_project_config_path(start: &Path) -> Option<PathBuf> {
        let mut path = start;

        loop {
            let config_path = path.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> ProbeResult<ProbeConfig> {
        let content = fs::read_to_string(path).map_err(|e| {
            ProbeError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            ProbeError::config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &ProbeConfig) -> ProbeResult<()> {
        let content = toml::to_string_pretty(config)
            .map_err(|e| ProbeError::config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ProbeError::config(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            ProbeError::config(format!("Failed to write config file {}: {}", path.display(), e))
        })
    }

    /// Write the default configuration under `<path>/.serprobe/config.toml`
    pub fn init_project_config(&self, path: &Path) -> ProbeResult<PathBuf> {
        let config_file = path.join(CONFIG_DIR).join(CONFIG_FILE);

        if config_file.exists() {
            return Err(ProbeError::config("Project configuration already exists"));
        }

        self.save_config_to_path(&config_file, &ProbeConfig::default())?;
        Ok(config_file)
    }

    pub fn get_global_config_path(&self) -> &PathBuf {
        &self.global_config_path
    }
}
