use std::path::PathBuf;
use std::sync::OnceLock;

// Cache the paths to avoid repeated environment lookups
static GENOMECMP_HOME: OnceLock<PathBuf> = OnceLock::new();
static GENOMECMP_OBJECTS_DIR: OnceLock<PathBuf> = OnceLock::new();
static GENOMECMP_JOBS_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Get the service home directory
/// Checks GENOMECMP_HOME environment variable, falls back to ${HOME}/.genomecmp
pub fn genomecmp_home() -> PathBuf {
    GENOMECMP_HOME
        .get_or_init(|| {
            if let Ok(path) = std::env::var("GENOMECMP_HOME") {
                PathBuf::from(path)
            } else {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".genomecmp")
            }
        })
        .clone()
}

/// Get the object store directory
/// Checks GENOMECMP_OBJECTS_DIR environment variable, falls back to GENOMECMP_HOME/objects
pub fn objects_dir() -> PathBuf {
    GENOMECMP_OBJECTS_DIR
        .get_or_init(|| {
            if let Ok(path) = std::env::var("GENOMECMP_OBJECTS_DIR") {
                PathBuf::from(path)
            } else {
                genomecmp_home().join("objects")
            }
        })
        .clone()
}

/// Get the job status directory
/// Checks GENOMECMP_JOBS_DIR environment variable, falls back to GENOMECMP_HOME/jobs
pub fn jobs_dir() -> PathBuf {
    GENOMECMP_JOBS_DIR
        .get_or_init(|| {
            if let Ok(path) = std::env::var("GENOMECMP_JOBS_DIR") {
                PathBuf::from(path)
            } else {
                genomecmp_home().join("jobs")
            }
        })
        .clone()
}

/// Default location of the service configuration file
pub fn default_config_path() -> PathBuf {
    genomecmp_home().join("config.toml")
}

/// Check if running in a custom data directory
pub fn is_custom_home() -> bool {
    std::env::var("GENOMECMP_HOME").is_ok()
}

/// Get a human-readable description of the current path configuration
pub fn describe_paths() -> String {
    format!(
        "Genome comparison paths:\n  \
        Home: {}\n  \
        Objects: {}\n  \
        Jobs: {}\n  \
        Custom: {}",
        genomecmp_home().display(),
        objects_dir().display(),
        jobs_dir().display(),
        if is_custom_home() { "Yes" } else { "No (using defaults)" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths_live_under_home() {
        if std::env::var("GENOMECMP_OBJECTS_DIR").is_err() {
            assert!(objects_dir().starts_with(genomecmp_home()));
        }
        if std::env::var("GENOMECMP_JOBS_DIR").is_err() {
            assert!(jobs_dir().starts_with(genomecmp_home()));
        }
        assert!(default_config_path().ends_with("config.toml"));
    }

    #[test]
    fn test_describe_paths_mentions_home() {
        let description = describe_paths();
        assert!(description.contains("Home:"));
        assert!(description.contains("Jobs:"));
    }
}
