use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info, warn};

const RC_FILE_NAME: &str = ".jotrc";

#[derive(Debug, Clone)]
pub struct Config {
    map: HashMap<String, String>,
    pub loaded_files: Vec<PathBuf>,
}

impl Config {
    #[tracing::instrument(skip(rc_override))]
    pub fn load(rc_override: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = Config {
            map: HashMap::new(),
            loaded_files: vec![],
        };

        cfg.map
            .insert("data.location".to_string(), "~/.jot".to_string());
        cfg.map.insert("color".to_string(), "on".to_string());
        cfg.map
            .insert("default.sort".to_string(), "due".to_string());
        cfg.map
            .insert("default.filter".to_string(), "all".to_string());

        let rc_path = resolve_rc_path(rc_override)?;
        if let Some(path) = rc_path {
            info!(rc = %path.display(), "loading rc file");
            cfg.load_file(&path)?;
        } else {
            debug!("no rc file found, using defaults");
        }

        Ok(cfg)
    }

    #[tracing::instrument(skip(self, overrides))]
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (k, v) in overrides {
            let key = k.strip_prefix("rc.").unwrap_or(&k).to_string();
            debug!(key = %key, value = %v, "applying override");
            self.map.insert(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.map.get(key).map(|v| parse_bool(v))
    }

    #[tracing::instrument(skip(self))]
    fn load_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let path = expand_tilde(path);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!(
                    file = %path.display(),
                    line = lineno + 1,
                    "ignoring malformed rc line"
                );
                continue;
            };
            self.map
                .insert(key.trim().to_string(), value.trim().to_string());
        }

        self.loaded_files.push(path);
        Ok(())
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(
        v.to_ascii_lowercase().as_str(),
        "1" | "on" | "yes" | "true"
    )
}

fn resolve_rc_path(overridden: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = overridden {
        let path = expand_tilde(path);
        if !path.exists() {
            return Err(anyhow!("rc file not found: {}", path.display()));
        }
        return Ok(Some(path));
    }

    let Some(home) = dirs::home_dir() else {
        return Ok(None);
    };
    let candidate = home.join(RC_FILE_NAME);
    Ok(candidate.exists().then_some(candidate))
}

pub fn expand_tilde(path: &Path) -> PathBuf {
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(rest) = s.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

pub fn resolve_data_dir(cfg: &Config, cli_override: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = cli_override {
        return Ok(expand_tilde(dir));
    }
    let location = cfg
        .get("data.location")
        .ok_or_else(|| anyhow!("data.location is not set"))?;
    Ok(expand_tilde(Path::new(&location)))
}
