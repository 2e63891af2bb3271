use std::cell::RefCell;

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Level, Metadata, Subscriber};

use crate::table::{Recorder, Value};

thread_local! {
    static RECORDER: RefCell<Recorder> = RefCell::default();
}

/// Collects an event's fields in emission order.
#[derive(Default)]
struct RowVisitor {
    fields: Vec<(String, Value)>,
}

impl RowVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        self.fields.push((field.name().to_string(), value));
    }
}

impl Visit for RowVisitor {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::U64(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::I64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::Str(format!("{value:?}")));
    }
}

/// Tracing subscriber that appends every INFO-or-louder event to the
/// calling thread's [`Recorder`], one table per event target.
///
/// Spans are accepted but not tracked.
#[derive(Debug, Clone, Default)]
pub struct DataFrameSubscriber {
    targets: Option<Vec<String>>,
}

impl DataFrameSubscriber {
    /// Record only the listed targets.
    pub fn only<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: Some(targets.into_iter().map(Into::into).collect()),
        }
    }

    fn wants(&self, target: &str) -> bool {
        self.targets
            .as_ref()
            .is_none_or(|targets| targets.iter().any(|t| t == target))
    }
}

impl Subscriber for DataFrameSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= Level::INFO && self.wants(metadata.target())
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut visitor = RowVisitor::default();
        event.record(&mut visitor);
        let target = event.metadata().target();
        RECORDER.with(|r| r.borrow_mut().push(target, visitor.fields));
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Install a record-everything [`DataFrameSubscriber`] as the global default.
///
/// Returns false when another global subscriber was already set.
pub fn install_subscriber() -> bool {
    tracing::subscriber::set_global_default(DataFrameSubscriber::default()).is_ok()
}

/// Take everything recorded on this thread, leaving the recorder empty.
pub fn drain() -> Recorder {
    RECORDER.with(|r| std::mem::take(&mut *r.borrow_mut()))
}

/// Discard everything recorded on this thread.
pub fn clear() {
    RECORDER.with(|r| *r.borrow_mut() = Recorder::default());
}

/// Run `f` with a scoped [`DataFrameSubscriber`] and return its result
/// together with the events it emitted. Earlier recordings are discarded.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Recorder) {
    capture_with(DataFrameSubscriber::default(), f)
}

pub fn capture_with<R>(subscriber: DataFrameSubscriber, f: impl FnOnce() -> R) -> (R, Recorder) {
    clear();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, drain())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TypedColumn;

    #[test]
    fn events_land_in_tables_by_target() {
        let ((), recorder) = capture(|| {
            tracing::info!(target: "sale", turn = 1u64, units = 4u64, item = "soup");
            tracing::info!(target: "sale", turn = 2u64, units = 1u64);
            tracing::info!(target: "loss", turn = 2u64, lost_stock = 3u64);
            tracing::debug!(target: "sale", turn = 3u64, units = 9u64);
        });

        let sale = recorder.table("sale").unwrap();
        assert_eq!(sale.row_count(), 2);
        assert_eq!(
            sale.column("units"),
            Some(&TypedColumn::U64(vec![Some(4), Some(1)]))
        );
        assert_eq!(
            sale.column("item"),
            Some(&TypedColumn::Str(vec![Some("soup".into()), None]))
        );
        assert_eq!(recorder.row_count("loss"), 1);
    }

    #[test]
    fn negative_and_float_fields_keep_their_types() {
        let ((), recorder) = capture(|| {
            tracing::info!(target: "t", delta = -3i64, score = 0.25f64, ok = true);
        });
        let t = recorder.table("t").unwrap();
        assert_eq!(t.column("delta"), Some(&TypedColumn::I64(vec![Some(-3)])));
        assert_eq!(t.column("score"), Some(&TypedColumn::F64(vec![Some(0.25)])));
        assert_eq!(t.column("ok"), Some(&TypedColumn::Bool(vec![Some(true)])));
    }

    #[test]
    fn target_filter_drops_other_events() {
        let ((), recorder) = capture_with(DataFrameSubscriber::only(["turn"]), || {
            tracing::info!(target: "turn", turn = 1u64);
            tracing::info!(target: "allocation", customers = 10u64);
        });
        assert_eq!(recorder.row_count("turn"), 1);
        assert!(recorder.table("allocation").is_none());
    }

    #[test]
    fn drain_empties_the_recorder() {
        let ((), first) = capture(|| tracing::info!(target: "x", n = 1u64));
        assert_eq!(first.row_count("x"), 1);
        assert!(drain().tables.is_empty());
    }
}
