use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{export::ExportSettings, sampling::SamplingPolicy, FilmstripError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub use_time_range_filter: bool,
    pub range_start_ms: u64,
    pub range_end_ms: u64,
    pub use_interval_filtering: bool,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub frame_height_px: u32,
    pub padding_px: u32,
    pub show_timestamps: bool,
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmstripConfig {
    pub sampling: SamplingConfig,
    pub export: ExportConfig,
    pub ops: OpsConfig,
}

impl FilmstripConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            FilmstripError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            FilmstripError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.sampling.interval_ms == 0 {
            return Err(FilmstripError::Configuration(
                "sampling.interval_ms must be greater than zero".into(),
            ));
        }
        if self.sampling.use_time_range_filter
            && self.sampling.range_end_ms != 0
            && self.sampling.range_end_ms < self.sampling.range_start_ms
        {
            return Err(FilmstripError::Configuration(
                "sampling.range_end_ms must not be before sampling.range_start_ms".into(),
            ));
        }
        if self.export.frame_height_px == 0 {
            return Err(FilmstripError::Configuration(
                "export.frame_height_px must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn sampling_policy(&self) -> SamplingPolicy {
        SamplingPolicy {
            use_time_range_filter: self.sampling.use_time_range_filter,
            range_start_ms: self.sampling.range_start_ms,
            range_end_ms: self.sampling.range_end_ms,
            use_interval_filtering: self.sampling.use_interval_filtering,
            interval_ms: self.sampling.interval_ms,
        }
    }

    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            frame_height_px: self.export.frame_height_px,
            padding_px: self.export.padding_px,
            show_timestamps: self.export.show_timestamps,
        }
    }
}

impl Default for FilmstripConfig {
    fn default() -> Self {
        let policy = SamplingPolicy::default();
        let settings = ExportSettings::default();
        Self {
            sampling: SamplingConfig {
                use_time_range_filter: policy.use_time_range_filter,
                range_start_ms: policy.range_start_ms,
                range_end_ms: policy.range_end_ms,
                use_interval_filtering: policy.use_interval_filtering,
                interval_ms: policy.interval_ms,
            },
            export: ExportConfig {
                frame_height_px: settings.frame_height_px,
                padding_px: settings.padding_px,
                show_timestamps: settings.show_timestamps,
                output_dir: ".".into(),
            },
            ops: OpsConfig {
                log_level: "info".into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn load_filmstrip_config_from_file() {
        let temp_path = std::env::temp_dir().join("filmstrip-config-test.toml");
        let config = FilmstripConfig {
            sampling: SamplingConfig {
                use_time_range_filter: true,
                range_start_ms: 250,
                range_end_ms: 1_500,
                use_interval_filtering: true,
                interval_ms: 50,
            },
            export: ExportConfig {
                frame_height_px: 120,
                padding_px: 4,
                show_timestamps: false,
                output_dir: "exports".into(),
            },
            ops: OpsConfig {
                log_level: "debug".into(),
            },
        };

        let doc = toml::to_string(&config).expect("serialize config");
        fs::write(&temp_path, doc).expect("write temp config");

        let loaded = FilmstripConfig::from_file(&temp_path).expect("load config");
        assert_eq!(loaded.sampling_policy(), config.sampling_policy());
        assert_eq!(loaded.export_settings(), config.export_settings());
        assert_eq!(loaded.export.output_dir, "exports");
        assert_eq!(loaded.ops.log_level, "debug");
        fs::remove_file(&temp_path).expect("cleanup temp config");
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let path = std::env::temp_dir().join("filmstrip-config-does-not-exist.toml");
        let err = FilmstripConfig::from_file(&path).expect_err("missing file");
        assert!(matches!(err, FilmstripError::Configuration(_)));
    }

    #[test]
    fn validate_configuration_rules() {
        let mut config = FilmstripConfig::default();
        assert!(config.validate().is_ok());

        config.sampling.interval_ms = 0;
        assert!(config.validate().is_err());
        config.sampling.interval_ms = 100;

        config.sampling.use_time_range_filter = true;
        config.sampling.range_start_ms = 500;
        config.sampling.range_end_ms = 200;
        assert!(config.validate().is_err());
        config.sampling.range_end_ms = 0;
        assert!(config.validate().is_ok());
        config.sampling.range_end_ms = 900;
        assert!(config.validate().is_ok());

        config.export.frame_height_px = 0;
        assert!(config.validate().is_err());
        config.export.frame_height_px = 200;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_match_export_and_sampling_defaults() {
        let config = FilmstripConfig::default();
        assert_eq!(config.sampling_policy(), SamplingPolicy::default());
        assert_eq!(config.export_settings(), ExportSettings::default());
    }
}
