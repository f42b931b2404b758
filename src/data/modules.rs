// ============================================================
// Layer 4 — Data Modules
// ============================================================
// A data module turns its hyperparameter record into three
// ready-to-batch splits. Two are registered:
//
//   MpraTsv       — activity table on disk (see loader.rs)
//   SyntheticMpra — seeded random sequences with a known
//                   activity function, for smoke runs

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::PathBuf;

use crate::data::{
    dataset::{MpraDataset, MpraSample},
    loader::load_activity_table,
    splitter::{split_samples, Splits},
    DataModule,
};
use crate::domain::args::{ArgKind, ArgSpec};
use crate::domain::error::{BodaError, Result};
use crate::domain::hparams::HParams;

const BASES: [char; 4] = ['A', 'C', 'G', 'T'];

/// Flags shared by every data module
fn common_schema() -> Vec<ArgSpec> {
    vec![
        ArgSpec::int("batch_size", "32", "Samples per training batch."),
        ArgSpec::int("padded_len", "600", "Sequences are padded or truncated to this length."),
        ArgSpec::float("val_fraction", "0.1", "Fraction of samples held out for validation."),
        ArgSpec::float("test_fraction", "0.1", "Fraction of samples held out for testing."),
        ArgSpec::int("split_seed", "0", "Seed for the train/val/test shuffle."),
    ]
}

/// Settings read from the shared flags
#[derive(Debug, Clone)]
struct SplitSettings {
    batch_size:    usize,
    padded_len:    usize,
    val_fraction:  f64,
    test_fraction: f64,
    split_seed:    u64,
}

impl SplitSettings {
    fn from_hparams(hp: &HParams) -> Result<Self> {
        let settings = Self {
            batch_size:    hp.get_usize("batch_size")?,
            padded_len:    hp.get_usize("padded_len")?,
            val_fraction:  hp.get_f64("val_fraction")?,
            test_fraction: hp.get_f64("test_fraction")?,
            split_seed:    hp.get_usize("split_seed")? as u64,
        };
        if settings.batch_size == 0 || settings.padded_len == 0 {
            return Err(BodaError::Data("batch_size and padded_len must be positive".into()));
        }
        if settings.val_fraction + settings.test_fraction >= 1.0 {
            return Err(BodaError::Data(
                "val_fraction + test_fraction must leave samples for training".into(),
            ));
        }
        Ok(settings)
    }

    fn split(&self, samples: Vec<MpraSample>) -> Splits<MpraSample> {
        split_samples(samples, self.val_fraction, self.test_fraction, self.split_seed)
    }
}

// ─── MpraTsv ──────────────────────────────────────────────────────────────────

pub struct MpraTsvData {
    path:     PathBuf,
    settings: SplitSettings,
    splits:   Splits<MpraSample>,
}

impl MpraTsvData {
    pub const NAME: &'static str = "MpraTsv";

    pub fn schema() -> Vec<ArgSpec> {
        let mut schema = vec![ArgSpec::required(
            "data_path",
            ArgKind::Str,
            "Tab-separated file of sequence and activity columns.",
        )];
        schema.extend(common_schema());
        schema
    }

    pub fn from_hparams(hp: &HParams) -> Result<Self> {
        Ok(Self {
            path:     PathBuf::from(hp.get_str("data_path")?),
            settings: SplitSettings::from_hparams(hp)?,
            splits:   Splits::default(),
        })
    }
}

impl DataModule for MpraTsvData {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn setup(&mut self) -> Result<()> {
        let records = load_activity_table(&self.path)?;
        if records.is_empty() {
            return Err(BodaError::Data(format!("'{}' holds no records", self.path.display())));
        }
        let samples = records
            .into_iter()
            .map(|r| MpraSample::from_sequence(&r.sequence, r.activity, self.settings.padded_len))
            .collect();
        self.splits = self.settings.split(samples);
        Ok(())
    }

    fn batch_size(&self) -> usize {
        self.settings.batch_size
    }

    fn train_set(&self) -> MpraDataset {
        MpraDataset::new(self.splits.train.clone())
    }

    fn val_set(&self) -> MpraDataset {
        MpraDataset::new(self.splits.val.clone())
    }

    fn test_set(&self) -> MpraDataset {
        MpraDataset::new(self.splits.test.clone())
    }
}

// ─── SyntheticMpra ────────────────────────────────────────────────────────────

pub struct SyntheticMpraData {
    num_samples: usize,
    seed:        u64,
    settings:    SplitSettings,
    splits:      Splits<MpraSample>,
}

impl SyntheticMpraData {
    pub const NAME: &'static str = "SyntheticMpra";

    pub fn schema() -> Vec<ArgSpec> {
        let mut schema = vec![
            ArgSpec::int("num_samples", "512", "Number of synthetic sequences."),
            ArgSpec::int("data_seed", "7", "Seed for sequence generation."),
        ];
        schema.extend(common_schema());
        schema
    }

    pub fn from_hparams(hp: &HParams) -> Result<Self> {
        Ok(Self {
            num_samples: hp.get_usize("num_samples")?,
            seed:        hp.get_usize("data_seed")? as u64,
            settings:    SplitSettings::from_hparams(hp)?,
            splits:      Splits::default(),
        })
    }
}

/// GC content plus a bonus per TATA box
pub fn synthetic_activity(sequence: &str) -> f32 {
    if sequence.is_empty() {
        return 0.0;
    }
    let gc = sequence.chars().filter(|c| matches!(c, 'G' | 'C')).count() as f32;
    let tata = sequence.matches("TATA").count() as f32;
    gc / sequence.len() as f32 + 0.1 * tata
}

impl DataModule for SyntheticMpraData {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn setup(&mut self) -> Result<()> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let len = self.settings.padded_len;
        let samples = (0..self.num_samples)
            .map(|_| {
                let seq: String = (0..len).map(|_| BASES[rng.gen_range(0..BASES.len())]).collect();
                let activity = synthetic_activity(&seq);
                MpraSample::from_sequence(&seq, vec![activity], len)
            })
            .collect();
        self.splits = self.settings.split(samples);
        tracing::info!("Generated {} synthetic sequences of length {}", self.num_samples, len);
        Ok(())
    }

    fn batch_size(&self) -> usize {
        self.settings.batch_size
    }

    fn train_set(&self) -> MpraDataset {
        MpraDataset::new(self.splits.train.clone())
    }

    fn val_set(&self) -> MpraDataset {
        MpraDataset::new(self.splits.val.clone())
    }

    fn test_set(&self) -> MpraDataset {
        MpraDataset::new(self.splits.test.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::args::ParsedArgs;
    use std::fs;

    #[test]
    fn test_synthetic_module_splits() {
        let schema = SyntheticMpraData::schema();
        let hp = ParsedArgs::from_defaults(&schema, &[("num_samples", "20"), ("padded_len", "30")])
            .unwrap()
            .extract(&schema)
            .unwrap();
        let mut data = SyntheticMpraData::from_hparams(&hp).unwrap();
        data.setup().unwrap();
        assert_eq!(data.train_set().sample_count(), 16);
        assert_eq!(data.val_set().sample_count(), 2);
        assert_eq!(data.test_set().sample_count(), 2);
        assert_eq!(data.train_set().sample_shape(), Some((4, 30, 1)));
    }

    #[test]
    fn test_synthetic_activity() {
        assert_eq!(synthetic_activity("GGCC"), 1.0);
        assert!((synthetic_activity("TATAAAAA") - 0.1).abs() < 1e-6);
        assert_eq!(synthetic_activity(""), 0.0);
    }

    #[test]
    fn test_tsv_module_reads_file() {
        let dir = std::env::temp_dir().join(format!("boda-tsv-{}", rand::random::<u32>()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("activity.tsv");
        let rows: String = (0..10).map(|i| format!("ACGTACGT\t{}.0\n", i)).collect();
        fs::write(&path, format!("sequence\tactivity\n{rows}")).unwrap();

        let schema = MpraTsvData::schema();
        let path_str = path.to_string_lossy().to_string();
        let hp = ParsedArgs::from_defaults(&schema, &[("data_path", &path_str), ("padded_len", "8")])
            .unwrap()
            .extract(&schema)
            .unwrap();
        let mut data = MpraTsvData::from_hparams(&hp).unwrap();
        data.setup().unwrap();
        let total = data.train_set().sample_count()
            + data.val_set().sample_count()
            + data.test_set().sample_count();
        assert_eq!(total, 10);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_tsv_requires_path() {
        let schema = MpraTsvData::schema();
        let parsed = ParsedArgs::from_defaults(&schema, &[]).unwrap();
        assert!(parsed.extract(&schema).is_err());
    }

    #[test]
    fn test_fractions_must_leave_training_data() {
        let schema = SyntheticMpraData::schema();
        let hp = ParsedArgs::from_defaults(&schema, &[("val_fraction", "0.5"), ("test_fraction", "0.5")])
            .unwrap()
            .extract(&schema)
            .unwrap();
        assert!(SyntheticMpraData::from_hparams(&hp).is_err());
    }
}
