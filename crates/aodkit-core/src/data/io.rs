//! Table I/O implementations and shared column helpers.

use super::*;
use arrow::{
    array::{
        Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, UInt8Array,
    },
    compute::cast,
    datatypes::{DataType, Schema},
};
use parquet::arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter};
use std::{
    collections::HashMap,
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info};

const DEFAULT_WRITE_BATCH_SIZE: usize = 10_000;

/// Schema metadata key holding the table name.
pub const TABLE_NAME_KEY: &str = "aod.table";

fn expand_path(file_path: &str) -> AodResult<PathBuf> {
    Ok(PathBuf::from(&*shellexpand::full(file_path)?))
}

/// Options for writing tables to disk.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Number of rows to include in each batch when writing.
    pub batch_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_WRITE_BATCH_SIZE,
        }
    }
}

impl WriteOptions {
    /// Override the batch size used for writing; defaults to 10_000.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// The Arrow schema of a row type, tagged with its table name.
pub fn schema<R: AodRow>() -> Schema {
    Schema::new(R::fields()).with_metadata(HashMap::from([(
        TABLE_NAME_KEY.to_string(),
        R::TABLE_NAME.to_string(),
    )]))
}

/// Load a [`Table`] from a Parquet file.
pub fn read_table<R: AodRow>(file_path: &str) -> AodResult<Table<R>> {
    let path = expand_path(file_path)?;
    read_table_at(&path)
}

fn read_table_at<R: AodRow>(path: &Path) -> AodResult<Table<R>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let mut rows = Vec::new();
    for batch in reader {
        rows.extend(R::from_record_batch(&batch?)?);
    }
    debug!(
        table = R::TABLE_NAME,
        rows = rows.len(),
        path = %path.display(),
        "read table"
    );
    Ok(Table::new(rows))
}

/// Persist a [`Table`] to a Parquet file.
pub fn write_table<R: AodRow>(
    table: &Table<R>,
    file_path: &str,
    options: &WriteOptions,
) -> AodResult<()> {
    let path = expand_path(file_path)?;
    write_table_at(table, &path, options)
}

fn write_table_at<R: AodRow>(
    table: &Table<R>,
    path: &Path,
    options: &WriteOptions,
) -> AodResult<()> {
    let batch_size = options.batch_size.max(1);
    let schema = Arc::new(schema::<R>());
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema.clone(), None)?;
    // an empty table still produces a file with the full schema
    for chunk in table.rows().chunks(batch_size) {
        let batch = RecordBatch::try_new(schema.clone(), R::columns(chunk))?;
        writer.write(&batch)?;
    }
    writer.close()?;
    debug!(
        table = R::TABLE_NAME,
        rows = table.len(),
        path = %path.display(),
        "wrote table"
    );
    Ok(())
}

fn table_path<R: AodRow>(dir: &Path) -> PathBuf {
    dir.join(format!("{}.parquet", R::FILE_STEM))
}

fn read_table_if_present<R: AodRow>(dir: &Path) -> AodResult<Option<Table<R>>> {
    let path = table_path::<R>(dir);
    if path.exists() {
        Ok(Some(read_table_at(&path)?))
    } else {
        debug!(table = R::TABLE_NAME, "no file in input directory");
        Ok(None)
    }
}

impl AodFrame {
    /// Load every AOD table found in `dir`. Missing files become empty tables; the
    /// innermost-update track table is loaded only when `tracks_iu.parquet` exists.
    pub fn open(dir: &str) -> AodResult<Self> {
        let dir = expand_path(dir)?;
        if !dir.is_dir() {
            return Err(AodError::Custom(format!(
                "AOD input \"{}\" is not a directory",
                dir.display()
            )));
        }
        let frame = Self {
            collisions: read_table_if_present(&dir)?.unwrap_or_default(),
            tracks: read_table_if_present(&dir)?.unwrap_or_default(),
            tracks_iu: {
                let path = dir.join(format!("{}_iu.parquet", Track::FILE_STEM));
                if path.exists() {
                    Some(read_table_at(&path)?)
                } else {
                    None
                }
            },
            v0s: read_table_if_present(&dir)?.unwrap_or_default(),
            mc_particles: read_table_if_present(&dir)?.unwrap_or_default(),
            hf_cand_2prongs: read_table_if_present(&dir)?.unwrap_or_default(),
        };
        info!(
            collisions = frame.collisions.len(),
            tracks = frame.tracks.len(),
            v0s = frame.v0s.len(),
            path = %dir.display(),
            "opened AOD"
        );
        Ok(frame)
    }

    /// Write every table to `dir`, creating it if needed. Empty tables are skipped.
    pub fn write(&self, dir: &str, options: &WriteOptions) -> AodResult<()> {
        let dir = expand_path(dir)?;
        std::fs::create_dir_all(&dir)?;
        write_if_not_empty(&self.collisions, &dir, options)?;
        write_if_not_empty(&self.tracks, &dir, options)?;
        if let Some(tracks_iu) = &self.tracks_iu {
            let path = dir.join(format!("{}_iu.parquet", Track::FILE_STEM));
            write_table_at(tracks_iu, &path, options)?;
        }
        write_if_not_empty(&self.v0s, &dir, options)?;
        write_if_not_empty(&self.mc_particles, &dir, options)?;
        write_if_not_empty(&self.hf_cand_2prongs, &dir, options)?;
        Ok(())
    }
}

fn write_if_not_empty<R: AodRow>(
    table: &Table<R>,
    dir: &Path,
    options: &WriteOptions,
) -> AodResult<()> {
    if table.is_empty() {
        return Ok(());
    }
    write_table_at(table, &table_path::<R>(dir), options)
}

impl DerivedTables {
    /// Load previously written derived tables from `dir` (missing files are empty).
    pub fn open(dir: &str) -> AodResult<Self> {
        let dir = expand_path(dir)?;
        Ok(Self {
            d0_candidates: read_table_if_present(&dir)?.unwrap_or_default(),
        })
    }

    /// Write all derived tables to `dir`, creating it if needed. Tables are written even when
    /// empty so downstream readers always find a file with the right schema.
    pub fn write(&self, dir: &str, options: &WriteOptions) -> AodResult<()> {
        let dir = expand_path(dir)?;
        std::fs::create_dir_all(&dir)?;
        write_table_at(
            &self.d0_candidates,
            &table_path::<D0Candidate>(&dir),
            options,
        )
    }
}

/// A scalar type which can be stored in one Arrow column.
pub trait ColumnValue: Copy + Sized {
    /// The (non-nullable) Arrow field for a column of this type.
    fn field(name: &str) -> Field;
    /// Build an array from values.
    fn to_array(values: Vec<Self>) -> ArrayRef;
    /// Read the named column of `batch`.
    fn read_column(batch: &RecordBatch, table: &str, name: &str) -> AodResult<Vec<Self>>;
}

fn get_column<'a>(batch: &'a RecordBatch, table: &str, name: &str) -> AodResult<&'a ArrayRef> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| AodError::MissingColumn {
            table: table.to_string(),
            name: name.to_string(),
        })?;
    if column.null_count() > 0 {
        let row = (0..column.len())
            .find(|&row| column.is_null(row))
            .unwrap_or_default();
        return Err(AodError::NullValue {
            name: name.to_string(),
            row,
        });
    }
    Ok(column)
}

fn invalid_type(name: &str, datatype: &DataType) -> AodError {
    AodError::InvalidColumnType {
        name: name.to_string(),
        datatype: datatype.to_string(),
    }
}

#[derive(Clone, Copy)]
enum FloatColumn<'a> {
    F32(&'a Float32Array),
    F64(&'a Float64Array),
}

impl<'a> FloatColumn<'a> {
    fn prepare(column: &'a ArrayRef, name: &str) -> AodResult<Self> {
        match column.data_type() {
            DataType::Float32 => column
                .as_any()
                .downcast_ref::<Float32Array>()
                .map(Self::F32)
                .ok_or_else(|| invalid_type(name, column.data_type())),
            DataType::Float64 => column
                .as_any()
                .downcast_ref::<Float64Array>()
                .map(Self::F64)
                .ok_or_else(|| invalid_type(name, column.data_type())),
            other => Err(invalid_type(name, other)),
        }
    }

    fn value(&self, row: usize) -> f64 {
        match self {
            Self::F32(array) => array.value(row) as f64,
            Self::F64(array) => array.value(row),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::F32(array) => array.len(),
            Self::F64(array) => array.len(),
        }
    }
}

/// Read any integer column, widened to `i64`.
fn read_integer_column(batch: &RecordBatch, table: &str, name: &str) -> AodResult<Vec<i64>> {
    let column = get_column(batch, table, name)?;
    if !column.data_type().is_integer() {
        return Err(invalid_type(name, column.data_type()));
    }
    let widened = cast(column, &DataType::Int64)?;
    // the cast turns values that do not fit into nulls
    if widened.null_count() > 0 {
        let row = (0..widened.len())
            .find(|&row| widened.is_null(row))
            .unwrap_or_default();
        return Err(AodError::Custom(format!(
            "Value at row {row} in column \"{name}\" overflows i64"
        )));
    }
    let values = widened
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| invalid_type(name, column.data_type()))?;
    Ok(values.values().to_vec())
}

impl ColumnValue for f32 {
    fn field(name: &str) -> Field {
        Field::new(name, DataType::Float32, false)
    }
    fn to_array(values: Vec<Self>) -> ArrayRef {
        Arc::new(Float32Array::from(values))
    }
    fn read_column(batch: &RecordBatch, table: &str, name: &str) -> AodResult<Vec<Self>> {
        let column = FloatColumn::prepare(get_column(batch, table, name)?, name)?;
        Ok((0..column.len())
            .map(|row| column.value(row) as f32)
            .collect())
    }
}

impl ColumnValue for f64 {
    fn field(name: &str) -> Field {
        Field::new(name, DataType::Float64, false)
    }
    fn to_array(values: Vec<Self>) -> ArrayRef {
        Arc::new(Float64Array::from(values))
    }
    fn read_column(batch: &RecordBatch, table: &str, name: &str) -> AodResult<Vec<Self>> {
        let column = FloatColumn::prepare(get_column(batch, table, name)?, name)?;
        Ok((0..column.len()).map(|row| column.value(row)).collect())
    }
}

impl ColumnValue for i32 {
    fn field(name: &str) -> Field {
        Field::new(name, DataType::Int32, false)
    }
    fn to_array(values: Vec<Self>) -> ArrayRef {
        Arc::new(Int32Array::from(values))
    }
    fn read_column(batch: &RecordBatch, table: &str, name: &str) -> AodResult<Vec<Self>> {
        read_integer_column(batch, table, name)?
            .into_iter()
            .map(|value| {
                i32::try_from(value).map_err(|_| {
                    AodError::Custom(format!("Value {value} in column \"{name}\" overflows i32"))
                })
            })
            .collect()
    }
}

impl ColumnValue for u8 {
    fn field(name: &str) -> Field {
        Field::new(name, DataType::UInt8, false)
    }
    fn to_array(values: Vec<Self>) -> ArrayRef {
        Arc::new(UInt8Array::from(values))
    }
    fn read_column(batch: &RecordBatch, table: &str, name: &str) -> AodResult<Vec<Self>> {
        read_integer_column(batch, table, name)?
            .into_iter()
            .map(|value| {
                u8::try_from(value).map_err(|_| {
                    AodError::Custom(format!("Value {value} in column \"{name}\" overflows u8"))
                })
            })
            .collect()
    }
}

impl ColumnValue for bool {
    fn field(name: &str) -> Field {
        Field::new(name, DataType::Boolean, false)
    }
    fn to_array(values: Vec<Self>) -> ArrayRef {
        Arc::new(BooleanArray::from(values))
    }
    fn read_column(batch: &RecordBatch, table: &str, name: &str) -> AodResult<Vec<Self>> {
        let column = get_column(batch, table, name)?;
        match column.as_any().downcast_ref::<BooleanArray>() {
            Some(array) => Ok(array.iter().map(|value| value.unwrap_or(false)).collect()),
            // integer flags are accepted as well, any non-zero value is true
            None if column.data_type().is_integer() => Ok(read_integer_column(batch, table, name)?
                .into_iter()
                .map(|value| value != 0)
                .collect()),
            None => Err(invalid_type(name, column.data_type())),
        }
    }
}

/// Index columns are stored as signed 64-bit integers.
impl ColumnValue for usize {
    fn field(name: &str) -> Field {
        Field::new(name, DataType::Int64, false)
    }
    fn to_array(values: Vec<Self>) -> ArrayRef {
        Arc::new(Int64Array::from_iter_values(
            values.into_iter().map(|value| value as i64),
        ))
    }
    fn read_column(batch: &RecordBatch, table: &str, name: &str) -> AodResult<Vec<Self>> {
        read_integer_column(batch, table, name)?
            .into_iter()
            .map(|value| {
                usize::try_from(value).map_err(|_| {
                    AodError::Custom(format!(
                        "Negative index {value} in required index column \"{name}\""
                    ))
                })
            })
            .collect()
    }
}

/// Optional index columns use `-1` for "no row".
impl ColumnValue for Option<usize> {
    fn field(name: &str) -> Field {
        Field::new(name, DataType::Int64, false)
    }
    fn to_array(values: Vec<Self>) -> ArrayRef {
        Arc::new(Int64Array::from_iter_values(
            values
                .into_iter()
                .map(|value| value.map_or(-1, |index| index as i64)),
        ))
    }
    fn read_column(batch: &RecordBatch, table: &str, name: &str) -> AodResult<Vec<Self>> {
        Ok(read_integer_column(batch, table, name)?
            .into_iter()
            .map(|value| usize::try_from(value).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use arrow::array::UInt64Array;
    use tempfile::tempdir;

    #[test]
    fn test_d0_candidate_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("d0.parquet");
        let path = path.to_str().unwrap();
        let table = Table::new(vec![D0Candidate {
            inv_mass_d0: 1.86,
            inv_mass_d0bar: 1.90,
            pt: 5.0,
            cosine_pointing: 0.95,
            collision_id: Some(42),
        }]);
        write_table(&table, path, &WriteOptions::default()).unwrap();
        let read: Table<D0Candidate> = read_table(path).unwrap();
        assert_eq!(read.len(), 1);
        let row = read.get(0).unwrap();
        assert_relative_eq!(row.inv_mass_d0, 1.86);
        assert_relative_eq!(row.inv_mass_d0bar, 1.90);
        assert_relative_eq!(row.pt, 5.0);
        assert_relative_eq!(row.cosine_pointing, 0.95);
        assert_eq!(row.collision_id, Some(42));
    }

    #[test]
    fn test_schema_carries_table_name() {
        let schema = schema::<D0Candidate>();
        assert_eq!(
            schema.metadata().get(TABLE_NAME_KEY).map(String::as_str),
            Some("D0CANDIDATES")
        );
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(
            names,
            vec![
                "fInvMassD0",
                "fInvMassD0bar",
                "fPt",
                "fCosinePointing",
                "fIndexCollisions"
            ]
        );
    }

    #[test]
    fn test_small_batches_preserve_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracks.parquet");
        let path = path.to_str().unwrap();
        let frame = test_frame();
        write_table(&frame.tracks, path, &WriteOptions::default().batch_size(4)).unwrap();
        let read: Table<Track> = read_table(path).unwrap();
        assert_eq!(read, frame.tracks);
    }

    #[test]
    fn test_empty_table_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.parquet");
        let path = path.to_str().unwrap();
        write_table(&Table::<V0>::default(), path, &WriteOptions::default()).unwrap();
        let read: Table<V0> = read_table(path).unwrap();
        assert!(read.is_empty());
    }

    #[test]
    fn test_frame_directory_round_trip() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path().to_str().unwrap();
        let frame = test_frame();
        frame.write(dir_path, &WriteOptions::default()).unwrap();
        let read = AodFrame::open(dir_path).unwrap();
        assert_eq!(read.collisions, frame.collisions);
        assert_eq!(read.tracks, frame.tracks);
        assert!(read.tracks_iu.is_none());
        assert_eq!(read.v0s, frame.v0s);
        assert_eq!(read.mc_particles, frame.mc_particles);
        assert_eq!(read.hf_cand_2prongs, frame.hf_cand_2prongs);
    }

    #[test]
    fn test_missing_files_are_empty_tables() {
        let dir = tempdir().unwrap();
        let frame = AodFrame::open(dir.path().to_str().unwrap()).unwrap();
        assert!(frame.collisions.is_empty());
        assert!(frame.tracks.is_empty());
        assert!(frame.hf_cand_2prongs.is_empty());
        let derived = DerivedTables::open(dir.path().to_str().unwrap()).unwrap();
        assert!(derived.is_empty());
    }

    #[test]
    fn test_missing_column_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("collisions.parquet");
        let schema = Arc::new(Schema::new(vec![Field::new(
            "fPosX",
            DataType::Float64,
            false,
        )]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Float64Array::from(vec![0.1, 0.2]))],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        let result = read_table::<Collision>(path.to_str().unwrap());
        assert!(matches!(
            result,
            Err(AodError::MissingColumn { ref name, .. }) if name == "fPosY"
        ));
    }

    #[test]
    fn test_wider_column_types_are_accepted() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("fPdgCode", DataType::Int64, false),
            Field::new("fPx", DataType::Float64, false),
            Field::new("fPy", DataType::Float64, false),
            Field::new("fPz", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![310_i64, -3122])),
                Arc::new(Float64Array::from(vec![1.0, 0.5])),
                Arc::new(Float64Array::from(vec![0.0, 0.5])),
                Arc::new(Float64Array::from(vec![2.0, -1.0])),
            ],
        )
        .unwrap();
        let rows = McParticle::from_record_batch(&batch).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pdg_code, 310);
        assert_eq!(rows[1].pdg_code, -3122);
        assert_relative_eq!(rows[1].pz, -1.0);
    }

    #[test]
    fn test_invalid_column_type_is_reported() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "fPdgCode",
            DataType::Float32,
            false,
        )]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Float32Array::from(vec![1.0_f32]))])
                .unwrap();
        let result = i32::read_column(&batch, "MCPARTICLE", "fPdgCode");
        assert!(matches!(result, Err(AodError::InvalidColumnType { .. })));
    }

    #[test]
    fn test_null_values_are_reported() {
        let schema = Arc::new(Schema::new(vec![Field::new("fPt", DataType::Float32, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Float32Array::from(vec![Some(1.0_f32), None]))],
        )
        .unwrap();
        let result = f32::read_column(&batch, "TRACK", "fPt");
        assert!(matches!(result, Err(AodError::NullValue { row: 1, .. })));
    }

    #[test]
    fn test_unsigned_overflow_is_reported() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "fIndexCollisions",
            DataType::UInt64,
            false,
        )]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(UInt64Array::from(vec![2_u64, u64::MAX]))],
        )
        .unwrap();
        let result = Option::<usize>::read_column(&batch, "TRACK", "fIndexCollisions");
        assert!(matches!(result, Err(AodError::Custom(ref message)) if message.contains("row 1")));
        assert!(bool::read_column(&batch, "V0DATA", "fIndexCollisions").is_err());
    }

    #[test]
    fn test_negative_optional_index_is_none() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "fIndexCollisions",
            DataType::Int32,
            false,
        )]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(vec![3, -1]))]).unwrap();
        let values = Option::<usize>::read_column(&batch, "TRACK", "fIndexCollisions").unwrap();
        assert_eq!(values, vec![Some(3), None]);
        assert!(usize::read_column(&batch, "V0DATA", "fIndexCollisions").is_err());
    }
}
