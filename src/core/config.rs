use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::parallel::default_worker_count;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub workers: WorkerConfig,
    #[serde(default)]
    pub aligner: AlignerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub defaults: ComparisonDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of worker threads pulling jobs from the queue
    pub count: usize,
    /// Lower bound of the randomized idle wait
    pub idle_wait_min_secs: u64,
    /// Upper bound of the randomized idle wait
    pub idle_wait_max_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignerConfig {
    /// Directory holding `blastp` and `makeblastdb` (None = search PATH)
    pub blast_bin: Option<String>,
    /// Scratch root for aligner files (None = system temp dir)
    pub temp_dir: Option<String>,
    pub threads: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Object store root (None = GENOMECMP_HOME/objects)
    pub object_store_dir: Option<String>,
    /// Job status root (None = GENOMECMP_HOME/jobs)
    pub job_status_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonDefaults {
    pub max_evalue: String,
    pub sub_bbh_percent: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
            idle_wait_min_secs: 55,
            idle_wait_max_secs: 65,
        }
    }
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            blast_bin: None,
            temp_dir: None,
            threads: 1,
        }
    }
}

impl Default for ComparisonDefaults {
    fn default() -> Self {
        Self {
            max_evalue: "1e-10".to_string(),
            sub_bbh_percent: 90.0,
        }
    }
}

impl WorkerConfig {
    pub fn idle_wait_bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.idle_wait_min_secs),
            Duration::from_secs(self.idle_wait_max_secs),
        )
    }
}

impl StorageConfig {
    pub fn object_store_path(&self) -> PathBuf {
        self.object_store_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(crate::core::paths::objects_dir)
    }

    pub fn job_status_path(&self) -> PathBuf {
        self.job_status_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(crate::core::paths::jobs_dir)
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), crate::GenomeCmpError> {
        if self.workers.count == 0 {
            return Err(crate::GenomeCmpError::Config(
                "workers.count must be at least 1".to_string(),
            ));
        }
        if self.workers.idle_wait_min_secs > self.workers.idle_wait_max_secs {
            return Err(crate::GenomeCmpError::Config(format!(
                "workers.idle_wait_min_secs ({}) exceeds workers.idle_wait_max_secs ({})",
                self.workers.idle_wait_min_secs, self.workers.idle_wait_max_secs
            )));
        }
        if self.aligner.threads == 0 {
            return Err(crate::GenomeCmpError::Config(
                "aligner.threads must be at least 1".to_string(),
            ));
        }
        let percent = self.defaults.sub_bbh_percent;
        if !(0.0..=100.0).contains(&percent) {
            return Err(crate::GenomeCmpError::Config(format!(
                "defaults.sub_bbh_percent must be within 0..=100, got {}",
                percent
            )));
        }
        if self.defaults.max_evalue.trim().is_empty() {
            return Err(crate::GenomeCmpError::Config(
                "defaults.max_evalue must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, crate::GenomeCmpError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| crate::GenomeCmpError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), crate::GenomeCmpError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| crate::GenomeCmpError::Config(format!("Failed to serialize config: {}", e)))?;
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}
