use std::{path::PathBuf, time::Duration};

use tracing::warn;

use super::util::extract_arguments;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Directories searched for plain file reads.
    pub resource_dirs: Vec<PathBuf>,
    /// `UPAK` archives opened at startup.
    pub packages: Vec<PathBuf>,
    /// Queue items materialized per tick.
    pub items_per_tick: usize,
    /// Start `.as` scripts that arrive through a remote fetch.
    pub start_remote_scripts: bool,
    /// Tick period of the native host loop.
    pub tick_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            resource_dirs: vec![],
            packages: vec![],
            items_per_tick: 1,
            start_remote_scripts: true,
            tick_interval: Duration::from_millis(16),
        }
    }
}

impl CacheConfig {
    /// Reads `ASSETS_PATH` and `RESOURCE_PACKAGES` (both `;`-separated).
    pub fn from_env() -> Self {
        let mut config = CacheConfig::default();

        if let Ok(dirs) = std::env::var("ASSETS_PATH") {
            config.resource_dirs.extend(split_paths(&dirs));
        }
        if let Ok(packages) = std::env::var("RESOURCE_PACKAGES") {
            config.packages.extend(split_paths(&packages));
        }

        config
    }

    /// Applies `--assets`, `--package`, `--items-per-tick`, `--tick-ms` and
    /// `--start-remote-scripts` overrides.
    pub fn apply_args(&mut self, args: &str) {
        for (name, values) in extract_arguments(args) {
            match name {
                "assets" => self.resource_dirs = values.iter().map(PathBuf::from).collect(),
                "package" => self.packages.extend(values.iter().map(PathBuf::from)),
                "items-per-tick" => match values[0].parse::<usize>() {
                    Ok(n) if n > 0 => self.items_per_tick = n,
                    _ => warn!("Ignoring invalid --items-per-tick {}", values[0]),
                },
                "tick-ms" => match values[0].parse::<u64>() {
                    Ok(ms) => self.tick_interval = Duration::from_millis(ms),
                    Err(_) => warn!("Ignoring invalid --tick-ms {}", values[0]),
                },
                "start-remote-scripts" => match values[0].parse::<bool>() {
                    Ok(start) => self.start_remote_scripts = start,
                    Err(_) => warn!("Ignoring invalid --start-remote-scripts {}", values[0]),
                },
                _ => warn!("Unknown argument --{name}"),
            }
        }
    }
}

fn split_paths(value: &str) -> impl Iterator<Item = PathBuf> + '_ {
    value
        .split(';')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_override_defaults() {
        let mut config = CacheConfig::default();
        config.apply_args("--assets Data CoreData --package Extra.pak --items-per-tick 3 --start-remote-scripts false");

        assert_eq!(
            config.resource_dirs,
            vec![PathBuf::from("Data"), PathBuf::from("CoreData")]
        );
        assert_eq!(config.packages, vec![PathBuf::from("Extra.pak")]);
        assert_eq!(config.items_per_tick, 3);
        assert!(!config.start_remote_scripts);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let mut config = CacheConfig::default();
        config.apply_args("--items-per-tick 0 --tick-ms soon");
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn env_paths_are_split() {
        let paths: Vec<PathBuf> = split_paths("Data; CoreData;;").collect();
        assert_eq!(paths, vec![PathBuf::from("Data"), PathBuf::from("CoreData")]);
    }
}
