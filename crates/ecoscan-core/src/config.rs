//! Pipeline configuration.

use crate::error::{EcoScanError, Result};
use serde::{Deserialize, Serialize};

/// How raw k-mer counts are weighted into features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KmerWeighting {
    /// Raw occurrence counts.
    Counts,
    /// Counts divided by the number of k-mers in the sequence.
    Frequency,
    /// Smoothed TF-IDF with L2-normalized rows.
    #[default]
    TfIdf,
}

/// Tunables for one analysis run.
///
/// Every run fits fresh models from these parameters; nothing is carried
/// over between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Length of the k-mers used as features.
    #[serde(default = "default_kmer_size")]
    pub kmer_size: usize,
    /// Feature weighting scheme.
    #[serde(default)]
    pub weighting: KmerWeighting,
    /// Expected fraction of anomalies; sets the decision threshold.
    #[serde(default = "default_contamination")]
    pub contamination: f64,
    /// Number of isolation trees in the ensemble.
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    /// Upper bound on the rows drawn to grow each tree.
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    /// Seed for the tree ensemble.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_kmer_size() -> usize { 3 }
fn default_contamination() -> f64 { 0.1 }
fn default_n_trees() -> usize { 200 }
fn default_max_samples() -> usize { 256 }
fn default_seed() -> u64 { 42 }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            kmer_size: default_kmer_size(),
            weighting: KmerWeighting::default(),
            contamination: default_contamination(),
            n_trees: default_n_trees(),
            max_samples: default_max_samples(),
            seed: default_seed(),
        }
    }
}

impl PipelineConfig {
    pub fn with_kmer_size(mut self, kmer_size: usize) -> Self {
        self.kmer_size = kmer_size;
        self
    }

    pub fn with_weighting(mut self, weighting: KmerWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    pub fn with_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        if self.kmer_size == 0 {
            return Err(EcoScanError::invalid_config("kmer_size", "must be at least 1"));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(EcoScanError::invalid_config(
                "contamination",
                format!("{} is outside (0, 0.5]", self.contamination),
            ));
        }
        if self.n_trees == 0 {
            return Err(EcoScanError::invalid_config("n_trees", "must be at least 1"));
        }
        if self.max_samples < 2 {
            return Err(EcoScanError::invalid_config("max_samples", "must be at least 2"));
        }
        Ok(())
    }
}

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "ecoscan.toml";

/// HTTP service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8000 }
fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// `host:port` to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(EcoScanError::invalid_config("max_upload_bytes", "must be positive"));
        }
        Ok(())
    }
}

/// Contents of an `ecoscan.toml` file.
///
/// ```toml
/// [pipeline]
/// contamination = 0.1
///
/// [server]
/// port = 8000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        self.server.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_model() {
        let config = PipelineConfig::default();
        assert_eq!(config.kmer_size, 3);
        assert_eq!(config.weighting, KmerWeighting::TfIdf);
        assert_eq!(config.contamination, 0.1);
        assert_eq!(config.n_trees, 200);
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad = [
            PipelineConfig::default().with_kmer_size(0),
            PipelineConfig::default().with_contamination(0.0),
            PipelineConfig::default().with_contamination(0.75),
            PipelineConfig::default().with_contamination(f64::NAN),
            PipelineConfig::default().with_trees(0),
            PipelineConfig::default().with_max_samples(1),
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(EcoScanError::InvalidConfig { .. })),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: PipelineConfig =
            toml::from_str("contamination = 0.05\nseed = 7\nweighting = \"counts\"\n").unwrap();
        assert_eq!(config.contamination, 0.05);
        assert_eq!(config.seed, 7);
        assert_eq!(config.weighting, KmerWeighting::Counts);
        assert_eq!(config.n_trees, 200);
        assert_eq!(config.kmer_size, 3);
    }

    #[test]
    fn settings_file_sections_are_optional() {
        let settings: Settings = toml::from_str("[server]\nport = 9001\n").unwrap();
        assert_eq!(settings.server.port, 9001);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(settings.pipeline, PipelineConfig::default());
        assert_eq!(settings.server.address(), "127.0.0.1:9001");

        let empty: Settings = toml::from_str("").unwrap();
        assert_eq!(empty, Settings::default());
        assert!(empty.validate().is_ok());
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let mut settings = Settings::default();
        settings.server.allowed_origins = vec!["http://localhost:5173".into()];
        settings.pipeline.contamination = 0.2;
        let text = toml::to_string_pretty(&settings).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn zero_upload_limit_is_invalid() {
        let mut settings = Settings::default();
        settings.server.max_upload_bytes = 0;
        assert!(matches!(
            settings.validate(),
            Err(EcoScanError::InvalidConfig { .. })
        ));
    }
}
