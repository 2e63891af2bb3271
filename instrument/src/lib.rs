//! Column-oriented recording of `tracing` events for simulation analysis.
//!
//! A [`DataFrameSubscriber`] turns every INFO event into a row of the table
//! named after the event's target. Columns appear as fields are first seen;
//! rows missing a field hold a null. Tables convert to polars frames for
//! lazy queries in tests, or to parquet for offline inspection.
//!
//! ```ignore
//! // simulation code
//! tracing::info!(target: "sale", turn, vendor_id, units, unit_price);
//!
//! // test
//! let (report, recorder) = instrument::capture(|| market.run_turn(&scenario));
//! let sales = recorder.table("sale").unwrap().to_dataframe()?;
//! ```

mod frames;
mod scoped;
mod subscriber;
mod table;

pub use frames::{drain_to_dataframes, save_parquet};
pub use scoped::ScopedRecorder;
pub use subscriber::{
    DataFrameSubscriber, capture, capture_with, clear, drain, install_subscriber,
};
pub use table::{DynamicTable, Recorder, TypedColumn, Value};
