//! The end-to-end screening pipeline.
//!
//! encode → standardize → {isolation forest, PCA} → assemble
//!
//! Every model is fitted on the batch being analyzed and dropped afterwards;
//! nothing is shared between runs.

use crate::assemble::assemble;
use crate::isolation::{ForestParams, IsolationForest};
use crate::pca::{Pca, MAP_COMPONENTS};
use ecoscan_core::{sequence_of, EcoScanError, PipelineConfig, Record, Result, ResultRow};
use ecoscan_features::{KmerVectorizer, StandardScaler, Vectorizer};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Batch-level statistics of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    /// Rows analyzed.
    pub samples: usize,
    /// Width of the encoded feature matrix.
    pub features: usize,
    /// Rows that produced no features, typically sequences shorter than k.
    pub empty_rows: usize,
    /// Rows labelled as new organisms.
    pub flagged: usize,
    /// Isolation forest decision threshold.
    pub offset: f64,
    /// Variance share of the two map axes.
    pub explained_variance_ratio: [f64; 2],
    /// Encoder used for this run.
    pub vectorizer: String,
}

impl AnalysisSummary {
    /// Fraction of rows flagged.
    pub fn flagged_rate(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.flagged as f64 / self.samples as f64
        }
    }
}

/// Output rows plus the statistics of the run that produced them.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub rows: Vec<ResultRow>,
    pub summary: AnalysisSummary,
}

/// Configured pipeline. Cheap to build; holds no fitted state.
pub struct Pipeline {
    config: PipelineConfig,
    vectorizer: Box<dyn Vectorizer>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("vectorizer", &self.vectorizer.name())
            .finish()
    }
}

impl Pipeline {
    /// Build a pipeline with the k-mer encoder described by `config`.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let vectorizer = KmerVectorizer::new(config.kmer_size).with_weighting(config.weighting);
        Ok(Self {
            config,
            vectorizer: Box::new(vectorizer),
        })
    }

    /// Swap in a different sequence encoder.
    pub fn with_vectorizer(mut self, vectorizer: impl Vectorizer + 'static) -> Self {
        self.vectorizer = Box::new(vectorizer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Screen a batch and return one result row per record, in order.
    pub fn run(&self, records: &[Record]) -> Result<Vec<ResultRow>> {
        self.run_with_summary(records).map(|analysis| analysis.rows)
    }

    /// Like [`run`](Self::run), also returning batch statistics.
    #[instrument(skip(self, records), fields(rows = records.len(), vectorizer = self.vectorizer.name()))]
    pub fn run_with_summary(&self, records: &[Record]) -> Result<Analysis> {
        if records.is_empty() {
            return Err(EcoScanError::EmptyBatch);
        }
        let sequences = records
            .iter()
            .enumerate()
            .map(|(row, record)| sequence_of(record, row))
            .collect::<Result<Vec<&str>>>()?;

        let features = self.vectorizer.fit_transform(&sequences);
        if features.width() < MAP_COMPONENTS {
            return Err(EcoScanError::DegenerateBatch {
                features: features.width(),
            });
        }
        debug!(width = features.width(), "encoded batch");

        let empty_rows = features.empty_rows();
        if !empty_rows.is_empty() {
            warn!(
                count = empty_rows.len(),
                rows = ?empty_rows,
                k = self.config.kmer_size,
                "sequences produced no k-mers"
            );
        }

        let scaled = StandardScaler::fit_transform(&features.matrix);

        let params = ForestParams::from(&self.config);
        let (forest, pca) = rayon::join(
            || IsolationForest::fit(&scaled, &params),
            || Pca::fit(&scaled, MAP_COMPONENTS),
        );
        let pca = pca?;
        let verdicts = forest.predict(&scaled);
        let projections = pca.project(&scaled)?;

        let rows = assemble(records, &verdicts, &projections)?;

        let ratio = pca.explained_variance_ratio();
        let summary = AnalysisSummary {
            samples: rows.len(),
            features: features.width(),
            empty_rows: empty_rows.len(),
            flagged: rows.iter().filter(|r| r.status().is_anomaly()).count(),
            offset: forest.offset(),
            explained_variance_ratio: [
                ratio.first().copied().unwrap_or(0.0),
                ratio.get(1).copied().unwrap_or(0.0),
            ],
            vectorizer: self.vectorizer.name().to_string(),
        };
        info!(
            samples = summary.samples,
            flagged = summary.flagged,
            "analysis complete"
        );

        Ok(Analysis { rows, summary })
    }
}

/// Run the pipeline with default settings.
pub fn analyze(records: &[Record]) -> Result<Vec<ResultRow>> {
    Pipeline::new(PipelineConfig::default())?.run(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoscan_core::{KmerWeighting, SchemaError, Status};
    use ecoscan_features::FeatureMatrix;
    use ndarray::Array2;
    use serde_json::json;

    fn batch(sequences: &[&str]) -> Vec<Record> {
        sequences
            .iter()
            .filter_map(|s| json!({ "Sequence": s }).as_object().cloned())
            .collect()
    }

    /// Encoder that emits a single column regardless of input.
    struct OneColumn;

    impl Vectorizer for OneColumn {
        fn fit_transform(&self, sequences: &[&str]) -> FeatureMatrix {
            FeatureMatrix::new(vec!["len".into()], Array2::zeros((sequences.len(), 1)))
        }

        fn name(&self) -> &str {
            "one-column"
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let err = Pipeline::new(PipelineConfig::default().with_contamination(0.9)).unwrap_err();
        assert!(matches!(err, EcoScanError::InvalidConfig { .. }));
    }

    #[test]
    fn empty_batch_is_checked_first() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        assert!(matches!(pipeline.run(&[]), Err(EcoScanError::EmptyBatch)));
    }

    #[test]
    fn schema_is_checked_before_width() {
        let mut records = batch(&["A", "C"]);
        records[1].remove("Sequence");
        let err = analyze(&records).unwrap_err();
        assert!(matches!(
            err,
            EcoScanError::Schema(SchemaError::MissingColumn { row: 1, .. })
        ));
    }

    #[test]
    fn narrow_vocabulary_is_degenerate() {
        // Only "AAA" occurs
        let err = analyze(&batch(&["AAAA", "AAA"])).unwrap_err();
        assert!(matches!(err, EcoScanError::DegenerateBatch { features: 1 }));

        let err = analyze(&batch(&["AC", "G"])).unwrap_err();
        assert!(matches!(err, EcoScanError::DegenerateBatch { features: 0 }));
    }

    #[test]
    fn custom_vectorizer_is_used() {
        let pipeline = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .with_vectorizer(OneColumn);
        let err = pipeline.run(&batch(&["ATCGGA", "GGCTAA"])).unwrap_err();
        assert!(matches!(err, EcoScanError::DegenerateBatch { features: 1 }));
    }

    #[test]
    fn summary_matches_rows() {
        let pipeline = Pipeline::new(
            PipelineConfig::default()
                .with_trees(50)
                .with_weighting(KmerWeighting::Frequency),
        )
        .unwrap();
        let analysis = pipeline
            .run_with_summary(&batch(&["ATCGAT", "ATCGAA", "GGGCCC", "ATCGTT"]))
            .unwrap();

        let s = &analysis.summary;
        assert_eq!(s.samples, 4);
        assert_eq!(s.empty_rows, 0);
        assert_eq!(s.vectorizer, "kmer-frequency");
        assert_eq!(
            s.flagged,
            analysis
                .rows
                .iter()
                .filter(|r| r.status() == Status::NewOrganism)
                .count()
        );
        assert!(s.explained_variance_ratio[0] >= s.explained_variance_ratio[1]);
        assert!(s.flagged_rate() <= 0.5);
    }
}
