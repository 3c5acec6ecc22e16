//! SigMF container for synthesized datasets.
//!
//! A dataset is a pair of files sharing a base path: `<base>.sigmf-data`
//! holds interleaved little-endian `f32` I/Q samples (`cf32_le`) and
//! `<base>.sigmf-meta` holds the JSON metadata. Each annotation carries the
//! `signal` extension objects `signal:detail` and, when known,
//! `signal:emitter`.

use crate::metadata::{EmitterDetail, SignalDetail};
use crate::prelude::{Sample, SynthError, SynthResult};
use crate::telemetry::log::LogManager;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const DATATYPE: &str = "cf32_le";
pub const SIGMF_VERSION: &str = "1.0.0";
pub const DATA_EXTENSION: &str = "sigmf-data";
pub const META_EXTENSION: &str = "sigmf-meta";

/// Bytes per `cf32_le` sample.
const SAMPLE_BYTES: usize = 8;

/// Extension declared in the global object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigMfExtension {
    pub name: String,
    pub version: String,
    pub optional: bool,
}

impl SigMfExtension {
    pub fn signal() -> Self {
        Self {
            name: "signal".to_string(),
            version: "1.0.0".to_string(),
            optional: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigMfGlobal {
    #[serde(rename = "core:datatype")]
    pub datatype: String,
    #[serde(rename = "core:sample_rate")]
    pub sample_rate: f64,
    #[serde(rename = "core:version")]
    pub version: String,
    #[serde(rename = "core:author", default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(
        rename = "core:description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(rename = "core:extensions", default)]
    pub extensions: Vec<SigMfExtension>,
}

impl SigMfGlobal {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            datatype: DATATYPE.to_string(),
            sample_rate,
            version: SIGMF_VERSION.to_string(),
            author: None,
            description: None,
            extensions: vec![SigMfExtension::signal()],
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigMfCapture {
    #[serde(rename = "core:sample_start")]
    pub sample_start: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigMfAnnotation {
    #[serde(rename = "core:sample_start")]
    pub sample_start: u64,
    #[serde(rename = "core:sample_count")]
    pub sample_count: u64,
    #[serde(rename = "core:label")]
    pub label: String,
    #[serde(rename = "core:datetime")]
    pub datetime: String,
    #[serde(rename = "signal:detail", default)]
    pub detail: SignalDetail,
    #[serde(
        rename = "signal:emitter",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub emitter: Option<EmitterDetail>,
}

impl SigMfAnnotation {
    pub fn end(&self) -> Option<u64> {
        self.sample_start.checked_add(self.sample_count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigMfMeta {
    pub global: SigMfGlobal,
    pub captures: Vec<SigMfCapture>,
    pub annotations: Vec<SigMfAnnotation>,
}

impl SigMfMeta {
    /// Checks the metadata against a data file of `total_samples` samples.
    pub fn validate(&self, total_samples: u64) -> SynthResult<()> {
        if self.global.datatype != DATATYPE {
            return Err(SynthError::Validation(format!(
                "datatype {} is not {}",
                self.global.datatype, DATATYPE
            )));
        }
        if !(self.global.sample_rate.is_finite() && self.global.sample_rate > 0.0) {
            return Err(SynthError::Validation(format!(
                "sample rate {} is not positive",
                self.global.sample_rate
            )));
        }
        if let Some(capture) = self
            .captures
            .iter()
            .find(|capture| capture.sample_start > total_samples)
        {
            return Err(SynthError::Validation(format!(
                "capture starts at {} past the {} samples on disk",
                capture.sample_start, total_samples
            )));
        }

        let mut previous_end = 0u64;
        for (index, annotation) in self.annotations.iter().enumerate() {
            let end = annotation.end().ok_or_else(|| {
                SynthError::Validation(format!("annotation {} overflows", index))
            })?;
            if annotation.sample_count == 0 {
                return Err(SynthError::Validation(format!(
                    "annotation {} is empty",
                    index
                )));
            }
            if end > total_samples {
                return Err(SynthError::Validation(format!(
                    "annotation {} ends at {} past the {} samples on disk",
                    index, end, total_samples
                )));
            }
            if annotation.sample_start < previous_end {
                return Err(SynthError::Validation(format!(
                    "annotation {} starts at {} inside the previous annotation ending at {}",
                    index, annotation.sample_start, previous_end
                )));
            }
            previous_end = end;
        }
        Ok(())
    }
}

/// `<base>.sigmf-data` and `<base>.sigmf-meta`.
pub fn dataset_paths(base: &Path) -> (PathBuf, PathBuf) {
    (
        with_suffix(base, DATA_EXTENSION),
        with_suffix(base, META_EXTENSION),
    )
}

fn with_suffix(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Removes every tracked path on drop unless committed.
struct PartGuard {
    paths: Vec<PathBuf>,
}

impl PartGuard {
    fn commit(mut self) {
        self.paths.clear();
    }
}

impl Drop for PartGuard {
    fn drop(&mut self) {
        for path in &self.paths {
            let _ = fs::remove_file(path);
        }
    }
}

/// Writes a dataset pair through `.part` files that are renamed into place.
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    data_path: PathBuf,
    meta_path: PathBuf,
    logger: LogManager,
}

impl DatasetWriter {
    pub fn new(output_dir: impl AsRef<Path>, name: &str) -> Self {
        let (data_path, meta_path) = dataset_paths(&output_dir.as_ref().join(name));
        Self {
            data_path,
            meta_path,
            logger: LogManager::new("sigmf"),
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn meta_path(&self) -> &Path {
        &self.meta_path
    }

    /// Validates `meta` against `samples`, then writes both files.
    ///
    /// Nothing is created when validation fails, and no partial file is left
    /// behind when a write fails.
    pub fn write<'a, I>(&self, meta: &SigMfMeta, samples: I) -> SynthResult<()>
    where
        I: ExactSizeIterator<Item = &'a Sample>,
    {
        let total = samples.len();
        meta.validate(total as u64)?;

        if let Some(parent) = self.data_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data_part = with_suffix(&self.data_path, "part");
        let meta_part = with_suffix(&self.meta_path, "part");
        let mut guard = PartGuard {
            paths: vec![data_part.clone(), meta_part.clone()],
        };

        let mut data = BufWriter::new(File::create(&data_part)?);
        for sample in samples {
            data.write_all(&sample.re.to_le_bytes())?;
            data.write_all(&sample.im.to_le_bytes())?;
        }
        data.into_inner().map_err(|e| e.into_error())?.sync_all()?;

        let mut meta_file = BufWriter::new(File::create(&meta_part)?);
        serde_json::to_writer_pretty(&mut meta_file, meta)?;
        meta_file.write_all(b"\n")?;
        meta_file.flush()?;

        fs::rename(&data_part, &self.data_path)?;
        guard.paths[0] = self.data_path.clone();
        fs::rename(&meta_part, &self.meta_path)?;
        guard.commit();

        self.logger.record(&format!(
            "wrote {} samples and {} annotations to {}",
            total,
            meta.annotations.len(),
            self.data_path.display()
        ));
        Ok(())
    }
}

/// A dataset loaded back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub meta: SigMfMeta,
    pub samples: Vec<Sample>,
}

/// Reads and validates the pair stored under `base`.
pub fn read_dataset(base: impl AsRef<Path>) -> SynthResult<Dataset> {
    let (data_path, meta_path) = dataset_paths(base.as_ref());
    let meta: SigMfMeta = serde_json::from_slice(&fs::read(&meta_path)?)?;

    let bytes = fs::read(&data_path)?;
    if bytes.len() % SAMPLE_BYTES != 0 {
        return Err(SynthError::Validation(format!(
            "{} holds {} bytes, not a whole number of {} samples",
            data_path.display(),
            bytes.len(),
            DATATYPE
        )));
    }
    let samples: Vec<Sample> = bytes
        .chunks_exact(SAMPLE_BYTES)
        .map(|c| {
            Sample::new(
                f32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                f32::from_le_bytes([c[4], c[5], c[6], c[7]]),
            )
        })
        .collect();
    meta.validate(samples.len() as u64)?;
    Ok(Dataset { meta, samples })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{DetailField, SignalType};

    fn annotation(start: u64, count: u64) -> SigMfAnnotation {
        let mut detail = SignalDetail::new();
        detail
            .set(DetailField::Type(SignalType::Digital))
            .set(DetailField::Class("ask".into()))
            .set(DetailField::Snr("-20".into()));
        SigMfAnnotation {
            sample_start: start,
            sample_count: count,
            label: "Square".to_string(),
            datetime: "2024-01-01T00:00:00.000000Z".to_string(),
            detail,
            emitter: None,
        }
    }

    fn meta(annotations: Vec<SigMfAnnotation>) -> SigMfMeta {
        SigMfMeta {
            global: SigMfGlobal::new(20e6).with_author("tests"),
            captures: vec![SigMfCapture { sample_start: 0 }],
            annotations,
        }
    }

    #[test]
    fn metadata_uses_sigmf_keys() {
        let value = serde_json::to_value(meta(vec![annotation(0, 4)])).unwrap();
        assert_eq!(value["global"]["core:datatype"], "cf32_le");
        assert_eq!(value["global"]["core:version"], "1.0.0");
        assert_eq!(value["global"]["core:extensions"][0]["name"], "signal");
        assert!(value["global"].get("core:description").is_none());
        let first = &value["annotations"][0];
        assert_eq!(first["core:sample_start"], 0);
        assert_eq!(first["core:sample_count"], 4);
        assert_eq!(first["signal:detail"]["class"], "ask");
        assert_eq!(first["signal:detail"]["snr"], "-20");
        assert!(first["signal:detail"].get("signal:detail").is_none());
        assert!(first.get("signal:emitter").is_none());
    }

    #[test]
    fn validation_accepts_contiguous_annotations() {
        let meta = meta(vec![annotation(0, 4), annotation(4, 4)]);
        assert!(meta.validate(8).is_ok());
    }

    #[test]
    fn validation_rejects_overlap_and_overrun() {
        let overlapping = meta(vec![annotation(0, 4), annotation(3, 4)]);
        assert!(matches!(
            overlapping.validate(8),
            Err(SynthError::Validation(_))
        ));

        let overrun = meta(vec![annotation(0, 4), annotation(4, 4)]);
        assert!(overrun.validate(7).is_err());

        let mut wrong_type = meta(vec![annotation(0, 4)]);
        wrong_type.global.datatype = "ci16_le".to_string();
        assert!(wrong_type.validate(4).is_err());
    }

    #[test]
    fn failed_validation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::new(dir.path().join("out"), "bad");
        let samples = vec![Sample::new(1.0, 0.0); 4];
        let result = writer.write(&meta(vec![annotation(2, 4)]), samples.iter());
        assert!(result.is_err());
        assert!(!writer.data_path().exists());
        assert!(!writer.meta_path().exists());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn data_file_is_byte_exact_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::new(dir.path(), "pair");
        let samples = vec![
            Sample::new(0.25, -0.5),
            Sample::new(1.0e-3, 3.0),
            Sample::new(-2.0, 0.0),
            Sample::new(0.0, 7.5),
        ];
        let meta = meta(vec![annotation(0, 2), annotation(2, 2)]);
        writer.write(&meta, samples.iter()).unwrap();

        let bytes = fs::read(writer.data_path()).unwrap();
        let expected: Vec<u8> = samples
            .iter()
            .flat_map(|s| [s.re.to_le_bytes(), s.im.to_le_bytes()].concat())
            .collect();
        assert_eq!(bytes, expected);
        assert!(!with_suffix(writer.data_path(), "part").exists());

        let loaded = read_dataset(dir.path().join("pair")).unwrap();
        assert_eq!(loaded.samples, samples);
        assert_eq!(loaded.meta, meta);
    }

    #[test]
    fn float_details_read_back_bit_exact() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::new(dir.path(), "floats");
        let mut first = annotation(0, 2);
        first
            .detail
            .set(DetailField::Bandwidth(73_215_948.123_456_78))
            .set(DetailField::NoiseVoltage(10f64.powf(-0.5)));
        let mut second = annotation(2, 2);
        second.detail.set(DetailField::Bandwidth(1.0 / 3.0e-7));
        let meta = meta(vec![first, second]);
        let samples = vec![Sample::new(0.5, 0.5); 4];
        writer.write(&meta, samples.iter()).unwrap();

        let loaded = read_dataset(dir.path().join("floats")).unwrap();
        assert_eq!(loaded.meta, meta);
        assert_eq!(
            loaded.meta.annotations[1].detail.bandwidth.map(f64::to_bits),
            Some((1.0 / 3.0e-7f64).to_bits())
        );
    }

    #[test]
    fn truncated_data_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::new(dir.path(), "pair");
        let samples = vec![Sample::new(1.0, 1.0); 2];
        writer
            .write(&meta(vec![annotation(0, 2)]), samples.iter())
            .unwrap();
        fs::write(writer.data_path(), [0u8; 12]).unwrap();
        assert!(read_dataset(dir.path().join("pair")).is_err());
    }
}
