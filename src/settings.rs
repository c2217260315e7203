use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use gopher_client::ClientConfig;

/// Loads the client config from `explicit`, or from the first of the XDG and
/// home-directory locations that exists. A broken implicit config is
/// reported and ignored.
pub fn load(explicit: Option<&Path>) -> Result<ClientConfig> {
    if let Some(path) = explicit {
        return ClientConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    for path in candidate_paths() {
        if !path.is_file() {
            continue;
        }
        match ClientConfig::load(&path) {
            Ok(config) => {
                debug!(path = %path.display(), "Loaded config");
                return Ok(config);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse config");
            }
        }
    }

    Ok(ClientConfig::default())
}

fn candidate_paths() -> Vec<PathBuf> {
    config_locations(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

/// `$XDG_CONFIG_HOME/gopher-client/config.toml` (or its `~/.config` default)
/// wins over the dotfile in the home directory.
fn config_locations(xdg_config_home: Option<PathBuf>, home: Option<PathBuf>) -> Vec<PathBuf> {
    let xdg = xdg_config_home
        .filter(|dir| dir.is_absolute())
        .or_else(|| home.as_ref().map(|home| home.join(".config")));

    xdg.map(|dir| dir.join("gopher-client").join("config.toml"))
        .into_iter()
        .chain(home.map(|home| home.join(".gopher-client.toml")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_location_comes_before_dotfile() {
        let paths = config_locations(Some(PathBuf::from("/cfg")), Some(PathBuf::from("/home/u")));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/cfg/gopher-client/config.toml"),
                PathBuf::from("/home/u/.gopher-client.toml"),
            ]
        );
    }

    #[test]
    fn xdg_defaults_under_home() {
        let paths = config_locations(Some(PathBuf::from("relative")), Some(PathBuf::from("/home/u")));
        assert_eq!(paths[0], PathBuf::from("/home/u/.config/gopher-client/config.toml"));
        assert!(config_locations(None, None).is_empty());
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(&path, "timeout = 42\n").unwrap();
        assert_eq!(load(Some(&path)).unwrap().timeout, 42);
    }

    #[test]
    fn explicit_broken_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(&path, "timeout = \"soon\"\n").unwrap();
        let err = load(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to load config"));
    }
}
