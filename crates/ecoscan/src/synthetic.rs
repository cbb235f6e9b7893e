//! Seeded generator for demo eDNA batches.
//!
//! Most samples are copies of one of three reference barcodes, sometimes
//! with a single point substitution, collected around the same survey zone.
//! The rest are random sequences from a distant zone and play the part of
//! unknown organisms.

use ecoscan_core::{round_to, Record};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const BASES: [char; 4] = ['A', 'T', 'C', 'G'];
const RANDOM_SEQUENCE_LENGTH: usize = 40;
const COORDINATE_DECIMALS: i32 = 4;

/// Label written for random samples when ground truth is requested.
pub const UNKNOWN_SPECIES: &str = "Unknown";

/// A species with a fixed barcode sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSpecies {
    pub name: &'static str,
    pub barcode: &'static str,
}

pub const REFERENCE_SPECIES: [ReferenceSpecies; 3] = [
    ReferenceSpecies {
        name: "Thunnus thynnus (Bluefin Tuna)",
        barcode: "ATCGGCTACGATCGATCGATCGTAGCTAGCTAGCTAGCTG",
    },
    ReferenceSpecies {
        name: "Gadus morhua (Cod)",
        barcode: "GGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCTAGCT",
    },
    ReferenceSpecies {
        name: "Chelonia mydas (Green Turtle)",
        barcode: "TTTTAAAACCCCGGGGATCGATCGTAGCTAGCTAGCTAGC",
    },
];

/// Where a group of samples was collected.
#[derive(Debug, Clone, Copy)]
struct Zone {
    name: &'static str,
    latitude: f64,
    longitude: f64,
    spread: f64,
}

const SURVEY_ZONE: Zone = Zone {
    name: "Pacific Ocean Zone A",
    latitude: 35.0,
    longitude: 139.0,
    spread: 1.0,
};

const UNCHARTED_ZONE: Zone = Zone {
    name: "Uncharted Zone X",
    latitude: 0.0,
    longitude: 160.0,
    spread: 2.0,
};

/// Generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// Number of samples.
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Probability that a sample is a random sequence.
    #[serde(default = "default_anomaly_rate")]
    pub anomaly_rate: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Add a `Species` column with the ground truth.
    #[serde(default)]
    pub with_labels: bool,
}

fn default_samples() -> usize {
    200
}

fn default_anomaly_rate() -> f64 {
    0.1
}

fn default_seed() -> u64 {
    42
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            anomaly_rate: default_anomaly_rate(),
            seed: default_seed(),
            with_labels: false,
        }
    }
}

impl SyntheticConfig {
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_anomaly_rate(mut self, anomaly_rate: f64) -> Self {
        self.anomaly_rate = anomaly_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_labels(mut self, with_labels: bool) -> Self {
        self.with_labels = with_labels;
        self
    }
}

/// One generated sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticSample {
    pub sequence: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Ground truth: a reference species name or [`UNKNOWN_SPECIES`].
    pub species: String,
}

impl SyntheticSample {
    /// Whether this sample is a random sequence.
    pub fn is_unknown(&self) -> bool {
        self.species == UNKNOWN_SPECIES
    }

    /// Convert to an input record (`Sequence, Location, Latitude, Longitude`
    /// and optionally `Species`).
    pub fn to_record(&self, with_label: bool) -> Record {
        let mut record = Record::new();
        record.insert("Sequence".into(), Value::from(self.sequence.clone()));
        record.insert("Location".into(), Value::from(self.location.clone()));
        record.insert("Latitude".into(), Value::from(self.latitude));
        record.insert("Longitude".into(), Value::from(self.longitude));
        if with_label {
            record.insert("Species".into(), Value::from(self.species.clone()));
        }
        record
    }
}

/// Generate a batch. The same config always yields the same batch.
pub fn generate(config: &SyntheticConfig) -> Vec<SyntheticSample> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let anomaly_rate = config.anomaly_rate.clamp(0.0, 1.0);

    (0..config.samples)
        .map(|_| {
            if rng.gen::<f64>() >= anomaly_rate {
                known_sample(&mut rng)
            } else {
                unknown_sample(&mut rng)
            }
        })
        .collect()
}

/// Generate a batch as input records.
pub fn generate_records(config: &SyntheticConfig) -> Vec<Record> {
    generate(config)
        .iter()
        .map(|sample| sample.to_record(config.with_labels))
        .collect()
}

fn known_sample(rng: &mut StdRng) -> SyntheticSample {
    let species = REFERENCE_SPECIES[rng.gen_range(0..REFERENCE_SPECIES.len())];
    let mut bases: Vec<char> = species.barcode.chars().collect();
    // The replacement may equal the original base.
    if rng.gen_bool(0.5) {
        let position = rng.gen_range(0..bases.len());
        bases[position] = random_base(rng);
    }
    sample_at(rng, bases.into_iter().collect(), SURVEY_ZONE, species.name)
}

fn unknown_sample(rng: &mut StdRng) -> SyntheticSample {
    let sequence: String = (0..RANDOM_SEQUENCE_LENGTH).map(|_| random_base(rng)).collect();
    sample_at(rng, sequence, UNCHARTED_ZONE, UNKNOWN_SPECIES)
}

fn sample_at(rng: &mut StdRng, sequence: String, zone: Zone, species: &str) -> SyntheticSample {
    let latitude = zone.latitude + rng.gen_range(-zone.spread..=zone.spread);
    let longitude = zone.longitude + rng.gen_range(-zone.spread..=zone.spread);
    SyntheticSample {
        sequence,
        location: zone.name.to_string(),
        latitude: round_to(latitude, COORDINATE_DECIMALS),
        longitude: round_to(longitude, COORDINATE_DECIMALS),
        species: species.to_string(),
    }
}

fn random_base(rng: &mut StdRng) -> char {
    BASES.choose(rng).copied().unwrap_or('A')
}
