use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::error::BookingError;
use crate::models::{AssignmentRecord, RECORD_HEADER};

/// Append-only record set per doctor.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Durably appends `record` to the store of `record.doctor_id`.
    async fn append(&self, record: &AssignmentRecord) -> Result<(), BookingError>;

    /// All records of a doctor in append order. Unknown doctors have none.
    async fn records(&self, doctor_id: &str) -> Result<Vec<AssignmentRecord>, BookingError>;

    async fn count(&self, doctor_id: &str) -> Result<usize, BookingError>;
}

/// One CSV file per doctor under the records directory, header row first.
pub struct CsvPatientStore {
    records_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvPatientStore {
    pub fn new(config: &AppConfig) -> Result<Self, BookingError> {
        Self::open(&config.records_dir)
    }

    pub fn open(records_dir: &Path) -> Result<Self, BookingError> {
        fs::create_dir_all(records_dir)?;
        info!("Patient records stored under {}", records_dir.display());

        Ok(Self {
            records_dir: records_dir.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn record_path(&self, doctor_id: &str) -> PathBuf {
        self.records_dir.join(format!("{}.csv", doctor_id))
    }
}

#[async_trait]
impl PatientStore for CsvPatientStore {
    async fn append(&self, record: &AssignmentRecord) -> Result<(), BookingError> {
        let path = self.record_path(&record.doctor_id);
        let row = record.clone();

        let _guard = self.write_lock.lock().await;
        tokio::task::spawn_blocking(move || append_row(&path, &row))
            .await
            .map_err(|e| BookingError::Store(e.to_string()))??;

        debug!("Appended record for {}", record.doctor_id);
        Ok(())
    }

    async fn records(&self, doctor_id: &str) -> Result<Vec<AssignmentRecord>, BookingError> {
        let path = self.record_path(doctor_id);

        tokio::task::spawn_blocking(move || read_rows(&path))
            .await
            .map_err(|e| BookingError::Store(e.to_string()))?
    }

    async fn count(&self, doctor_id: &str) -> Result<usize, BookingError> {
        Ok(self.records(doctor_id).await?.len())
    }
}

fn append_row(path: &Path, record: &AssignmentRecord) -> Result<(), BookingError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let needs_header = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if needs_header {
        writer.write_record(RECORD_HEADER)?;
    }
    writer.serialize(record)?;
    writer.flush()?;

    let file: File = writer
        .into_inner()
        .map_err(|e| BookingError::Store(e.to_string()))?;
    file.sync_all()?;

    Ok(())
}

fn read_rows(path: &Path) -> Result<Vec<AssignmentRecord>, BookingError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<AssignmentRecord>, csv::Error>>()?;

    Ok(rows)
}

/// Keeps records in memory only; lost on restart.
#[derive(Default)]
pub struct MemoryPatientStore {
    records: RwLock<HashMap<String, Vec<AssignmentRecord>>>,
}

impl MemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<AssignmentRecord>) -> Self {
        let mut by_doctor: HashMap<String, Vec<AssignmentRecord>> = HashMap::new();
        for record in records {
            by_doctor.entry(record.doctor_id.clone()).or_default().push(record);
        }

        Self {
            records: RwLock::new(by_doctor),
        }
    }
}

#[async_trait]
impl PatientStore for MemoryPatientStore {
    async fn append(&self, record: &AssignmentRecord) -> Result<(), BookingError> {
        self.records
            .write()
            .await
            .entry(record.doctor_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn records(&self, doctor_id: &str) -> Result<Vec<AssignmentRecord>, BookingError> {
        Ok(self
            .records
            .read()
            .await
            .get(doctor_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn count(&self, doctor_id: &str) -> Result<usize, BookingError> {
        Ok(self
            .records
            .read()
            .await
            .get(doctor_id)
            .map_or(0, Vec::len))
    }
}
