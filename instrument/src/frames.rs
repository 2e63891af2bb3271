// Polars conversion and parquet export of recorded tables

use std::collections::HashMap;
use std::path::Path;

use polars::prelude::*;

use crate::subscriber::drain;
use crate::table::{DynamicTable, Recorder, TypedColumn};

fn io_error(error: std::io::Error) -> PolarsError {
    PolarsError::IO {
        error: error.into(),
        msg: None,
    }
}

impl TypedColumn {
    fn to_column(&self, name: &str) -> Column {
        match self {
            TypedColumn::U64(v) => Column::new(name.into(), v),
            TypedColumn::I64(v) => Column::new(name.into(), v),
            TypedColumn::F64(v) => Column::new(name.into(), v),
            TypedColumn::Bool(v) => Column::new(name.into(), v),
            TypedColumn::Str(v) => Column::new(name.into(), v),
        }
    }
}

impl DynamicTable {
    /// Nullable polars frame, columns in first-seen order.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns()
            .map(|(name, column)| column.to_column(name))
            .collect();
        DataFrame::new(columns)
    }
}

impl Recorder {
    pub fn to_dataframes(&self) -> PolarsResult<HashMap<String, DataFrame>> {
        self.tables
            .iter()
            .map(|(name, table)| Ok((name.clone(), table.to_dataframe()?)))
            .collect()
    }
}

/// Drain this thread's recorder into one frame per target.
pub fn drain_to_dataframes() -> PolarsResult<HashMap<String, DataFrame>> {
    drain().to_dataframes()
}

/// Write each frame to `{dir}/{target}.parquet`, creating `dir` as needed.
pub fn save_parquet(dfs: &mut HashMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    std::fs::create_dir_all(dir).map_err(io_error)?;
    for (name, df) in dfs.iter_mut() {
        let file = std::fs::File::create(dir.join(format!("{name}.parquet"))).map_err(io_error)?;
        ParquetWriter::new(file).finish(df)?;
    }
    Ok(())
}
