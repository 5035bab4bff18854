use crate::config::EtlConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{CatalogBundle, EnvironmentType, Measurement, Municipality, Pollutant, Station};
use crate::utils::constants::*;
use crate::writers::{CatalogSink, LoadSummary, TableSummary};
use arrow::array::{
    ArrayRef, Date32Array, Float64Array, Int32Array, StringArray, UInt32Array, UInt8Array,
};
use arrow::datatypes::{DataType, Date32Type, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs::{self, File};
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Writes a catalog as one Parquet file per table under `output_dir`.
pub struct ParquetCatalogWriter {
    output_dir: PathBuf,
    compression: Compression,
    row_group_size: usize,
    max_workers: usize,
}

impl ParquetCatalogWriter {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            max_workers: num_cpus::get(),
        }
    }

    pub fn from_config(config: &EtlConfig) -> Result<Self> {
        Ok(Self::new(&config.output_dir)
            .with_compression(&config.compression)?
            .with_row_group_size(config.row_group_size))
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.output_dir.join(format!("{}.parquet", table))
    }

    /// Build the batch of every table, collapsing rows that share a key.
    /// The last row for a key wins and keeps the position of the first.
    fn table_batches(&self, bundle: &CatalogBundle) -> Result<Vec<(TableSummary, RecordBatch)>> {
        let environment_types =
            upsert_by_key(&bundle.environment_types, |t| t.environment_type_id);
        let municipalities = upsert_by_key(&bundle.municipalities, |m| m.municipality_id);
        let stations = upsert_by_key(&bundle.stations, |s| s.station_id);
        let pollutants = upsert_by_key(&bundle.pollutants, |p| p.code.clone());
        let measurements = upsert_by_key(&bundle.measurements, Measurement::natural_key);

        let summary = |table: &str, received: usize, written: usize| TableSummary {
            table: table.to_string(),
            rows_received: received,
            rows_written: written,
        };

        Ok(vec![
            (
                summary(
                    TABLE_ENVIRONMENT_TYPES,
                    bundle.environment_types.len(),
                    environment_types.len(),
                ),
                environment_types_batch(&environment_types)?,
            ),
            (
                summary(
                    TABLE_MUNICIPALITIES,
                    bundle.municipalities.len(),
                    municipalities.len(),
                ),
                municipalities_batch(&municipalities)?,
            ),
            (
                summary(TABLE_STATIONS, bundle.stations.len(), stations.len()),
                stations_batch(&stations)?,
            ),
            (
                summary(TABLE_POLLUTANTS, bundle.pollutants.len(), pollutants.len()),
                pollutants_batch(&pollutants)?,
            ),
            (
                summary(
                    TABLE_MEASUREMENTS,
                    bundle.measurements.len(),
                    measurements.len(),
                ),
                measurements_batch(&measurements)?,
            ),
        ])
    }

    fn write_batch(&self, batch: &RecordBatch, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
        if batch.num_rows() > 0 {
            writer.write(batch)?;
        }
        writer.close()?;

        debug!("Wrote {} rows to {}", batch.num_rows(), path.display());
        Ok(())
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = fs::metadata(path)?.len();

        let mut row_group_sizes = Vec::new();
        for i in 0..row_groups {
            row_group_sizes.push(metadata.row_group(i).num_rows());
        }

        let compression = (row_groups > 0 && metadata.row_group(0).num_columns() > 0)
            .then(|| metadata.row_group(0).column(0).compression());

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
        })
    }

    /// File statistics for every table present in the output directory,
    /// in load order.
    pub fn table_infos(&self) -> Result<Vec<(&'static str, Option<ParquetFileInfo>)>> {
        TABLE_LOAD_ORDER
            .iter()
            .map(|table| -> Result<(&'static str, Option<ParquetFileInfo>)> {
                let path = self.table_path(table);
                if path.exists() {
                    Ok((*table, Some(self.get_file_info(&path)?)))
                } else {
                    Ok((*table, None))
                }
            })
            .collect()
    }
}

impl CatalogSink for ParquetCatalogWriter {
    fn load(&self, bundle: &CatalogBundle) -> Result<LoadSummary> {
        fs::create_dir_all(&self.output_dir)?;

        let tables = self.table_batches(bundle)?;

        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.output_dir)?;
        debug!("Staging tables in {}", staging.path().display());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let staged: Vec<(PathBuf, PathBuf)> = pool.install(|| {
            tables
                .par_iter()
                .map(|(summary, batch)| -> Result<(PathBuf, PathBuf)> {
                    let file_name = format!("{}.parquet", summary.table);
                    let staged_path = staging.path().join(&file_name);
                    self.write_batch(batch, &staged_path)?;
                    Ok((staged_path, self.output_dir.join(file_name)))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let backup_dir = staging.path().join("previous");
        fs::create_dir(&backup_dir)?;
        publish(&staged, &backup_dir)?;

        let summary = LoadSummary {
            tables: tables.into_iter().map(|(summary, _)| summary).collect(),
        };
        info!(
            "Published {} tables to {}: {}",
            summary.tables.len(),
            self.output_dir.display(),
            summary.summary()
        );

        Ok(summary)
    }
}

/// Move staged files onto their targets in order. When a move fails, the
/// targets already replaced are restored from `backup_dir`.
fn publish(staged: &[(PathBuf, PathBuf)], backup_dir: &Path) -> Result<()> {
    let mut published: Vec<(&Path, Option<PathBuf>)> = Vec::with_capacity(staged.len());

    for (i, (source, target)) in staged.iter().enumerate() {
        let backup = if target.exists() {
            let backup = backup_dir.join(format!("{}.previous", i));
            if let Err(e) = fs::rename(target, &backup) {
                restore(&published);
                return Err(e.into());
            }
            Some(backup)
        } else {
            None
        };

        if let Err(e) = fs::rename(source, target) {
            if let Some(backup) = &backup {
                if let Err(e) = fs::rename(backup, target) {
                    warn!("Could not restore {}: {}", target.display(), e);
                }
            }
            restore(&published);
            return Err(e.into());
        }
        published.push((target, backup));
    }

    Ok(())
}

fn restore(published: &[(&Path, Option<PathBuf>)]) {
    for (target, backup) in published.iter().rev() {
        let restored = match backup {
            Some(backup) => fs::rename(backup, target),
            None => fs::remove_file(target),
        };
        if let Err(e) = restored {
            warn!("Could not restore {}: {}", target.display(), e);
        }
    }
}

/// Collapse rows sharing a key. The last row wins and takes the position
/// of the first.
fn upsert_by_key<T, K, F>(rows: &[T], key: F) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut positions: HashMap<K, usize> = HashMap::with_capacity(rows.len());
    let mut kept: Vec<T> = Vec::with_capacity(rows.len());

    for row in rows {
        match positions.get(&key(row)) {
            Some(&position) => kept[position] = row.clone(),
            None => {
                positions.insert(key(row), kept.len());
                kept.push(row.clone());
            }
        }
    }

    kept
}

fn date32(date: NaiveDate) -> i32 {
    Date32Type::from_naive_date(date)
}

fn environment_types_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("environment_type_id", DataType::UInt32, false),
        Field::new("name", DataType::Utf8, false),
    ]))
}

fn municipalities_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("municipality_id", DataType::UInt32, false),
        Field::new("name", DataType::Utf8, false),
    ]))
}

fn stations_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("station_id", DataType::UInt32, false),
        Field::new("address", DataType::Utf8, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("x_coord", DataType::Float64, false),
        Field::new("y_coord", DataType::Float64, false),
        Field::new("open_date", DataType::Date32, true),
        Field::new("close_date", DataType::Date32, true),
        Field::new("municipality_id", DataType::UInt32, false),
        Field::new("environment_type_id", DataType::UInt32, false),
    ]))
}

fn pollutants_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("code", DataType::Utf8, false),
        Field::new("description", DataType::Utf8, false),
    ]))
}

fn measurements_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("station_id", DataType::UInt32, false),
        Field::new("date", DataType::Date32, false),
        Field::new("hour", DataType::UInt8, false),
        Field::new("pollutant_code", DataType::Utf8, false),
        Field::new("value", DataType::Int32, false),
    ]))
}

fn environment_types_batch(rows: &[EnvironmentType]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from_iter_values(
            rows.iter().map(|r| r.environment_type_id),
        )),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.name))),
    ];
    Ok(RecordBatch::try_new(environment_types_schema(), columns)?)
}

fn municipalities_batch(rows: &[Municipality]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from_iter_values(
            rows.iter().map(|r| r.municipality_id),
        )),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.name))),
    ];
    Ok(RecordBatch::try_new(municipalities_schema(), columns)?)
}

fn stations_batch(rows: &[Station]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.station_id))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.address))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.latitude))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.longitude))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.x_coord))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.y_coord))),
        Arc::new(Date32Array::from(
            rows.iter()
                .map(|r| r.open_date.map(date32))
                .collect::<Vec<_>>(),
        )),
        Arc::new(Date32Array::from(
            rows.iter()
                .map(|r| r.close_date.map(date32))
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from_iter_values(
            rows.iter().map(|r| r.municipality_id),
        )),
        Arc::new(UInt32Array::from_iter_values(
            rows.iter().map(|r| r.environment_type_id),
        )),
    ];
    Ok(RecordBatch::try_new(stations_schema(), columns)?)
}

fn pollutants_batch(rows: &[Pollutant]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.code))),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| &r.description),
        )),
    ];
    Ok(RecordBatch::try_new(pollutants_schema(), columns)?)
}

fn measurements_batch(rows: &[Measurement]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.station_id))),
        Arc::new(Date32Array::from_iter_values(
            rows.iter().map(|r| date32(r.date)),
        )),
        Arc::new(UInt8Array::from_iter_values(rows.iter().map(|r| r.hour))),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| &r.pollutant_code),
        )),
        Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.value))),
    ];
    Ok(RecordBatch::try_new(measurements_schema(), columns)?)
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    /// Codec of the first column chunk; `None` for a file with no rows.
    pub compression: Option<Compression>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let average = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "{} rows, {} row groups (avg {:.0} rows), {:.2} KB, compression {}",
            self.total_rows,
            self.row_groups,
            average,
            self.file_size as f64 / 1024.0,
            self.compression
                .map(|c| format!("{:?}", c))
                .unwrap_or_else(|| "n/a".to_string())
        )
    }
}
