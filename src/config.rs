use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub fill: FillConfig,

    #[serde(default)]
    pub retain: RetainConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level for this crate when RUST_LOG is unset: error, warn, info, debug, trace
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    /// Try `fallocate` before falling back to a background `dd`.
    pub use_fallocate: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetainConfig {
    /// Where the handle-holding process writes its output. Empty = default data dir path.
    pub log_file: String,
}

// ── Defaults ─────────────────────────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { log_level: "info".into() }
    }
}

impl Default for FillConfig {
    fn default() -> Self {
        Self { use_fallocate: true }
    }
}

// ── Load / Save ───────────────────────────────────────────────────────

impl Config {
    pub fn load() -> Self {
        match try_load() {
            Ok(c)  => c,
            Err(_) => {
                // Write defaults on first run (best-effort)
                let _ = try_write_defaults();
                Config::default()
            }
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chaos-filldisk").join("filldisk.toml"))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Holder log destination; None when no data dir can be resolved.
    pub fn retain_log_path(&self) -> Option<PathBuf> {
        if !self.retain.log_file.is_empty() {
            return Some(PathBuf::from(&self.retain.log_file));
        }
        dirs::data_local_dir().map(|p| p.join("chaos-filldisk").join("filldisk.log"))
    }
}

fn try_load() -> Result<Config> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    let text = fs::read_to_string(path)?;
    Config::parse(&text)
}

fn try_write_defaults() -> Result<()> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    if path.exists() {
        // Present but unreadable or malformed; leave the user's file alone.
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(&Config::default())?;
    fs::write(path, format!("# chaos-filldisk configuration\n# Generated on first run, edit freely\n\n{}", text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg.general.log_level, "info");
        assert!(cfg.fill.use_fallocate);
        assert!(cfg.retain.log_file.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = Config::parse("[fill]\nuse_fallocate = false\n").unwrap();
        assert!(!cfg.fill.use_fallocate);
        assert_eq!(cfg.general.log_level, "info");
    }

    #[test]
    fn explicit_retain_log_wins() {
        let cfg = Config::parse("[retain]\nlog_file = \"/var/log/filldisk.log\"\n").unwrap();
        assert_eq!(cfg.retain_log_path(), Some(PathBuf::from("/var/log/filldisk.log")));
    }

    #[test]
    fn defaults_survive_a_toml_round_trip() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back = Config::parse(&text).unwrap();
        assert_eq!(back.general.log_level, "info");
        assert!(back.fill.use_fallocate);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::parse("[fill\nuse_fallocate = 3").is_err());
    }
}
