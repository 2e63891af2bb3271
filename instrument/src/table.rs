use std::collections::BTreeMap;

/// One field value captured from an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::U64(v) => Some(*v as f64),
            Value::I64(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            Value::Bool(_) | Value::Str(_) => None,
        }
    }
}

/// A nullable column of typed values. A row whose event lacked the field is null.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedColumn {
    U64(Vec<Option<u64>>),
    I64(Vec<Option<i64>>),
    F64(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Str(Vec<Option<String>>),
}

impl TypedColumn {
    /// A column typed after `value`, holding `rows` nulls.
    fn nulls_like(value: &Value, rows: usize) -> Self {
        match value {
            Value::U64(_) => TypedColumn::U64(vec![None; rows]),
            Value::I64(_) => TypedColumn::I64(vec![None; rows]),
            Value::F64(_) => TypedColumn::F64(vec![None; rows]),
            Value::Bool(_) => TypedColumn::Bool(vec![None; rows]),
            Value::Str(_) => TypedColumn::Str(vec![None; rows]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TypedColumn::U64(v) => v.len(),
            TypedColumn::I64(v) => v.len(),
            TypedColumn::F64(v) => v.len(),
            TypedColumn::Bool(v) => v.len(),
            TypedColumn::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            TypedColumn::U64(v) => v.iter().filter(|x| x.is_none()).count(),
            TypedColumn::I64(v) => v.iter().filter(|x| x.is_none()).count(),
            TypedColumn::F64(v) => v.iter().filter(|x| x.is_none()).count(),
            TypedColumn::Bool(v) => v.iter().filter(|x| x.is_none()).count(),
            TypedColumn::Str(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    fn push_null(&mut self) {
        match self {
            TypedColumn::U64(v) => v.push(None),
            TypedColumn::I64(v) => v.push(None),
            TypedColumn::F64(v) => v.push(None),
            TypedColumn::Bool(v) => v.push(None),
            TypedColumn::Str(v) => v.push(None),
        }
    }

    fn widen_to_f64(&mut self) {
        let widened = match self {
            TypedColumn::U64(v) => v.iter().map(|x| x.map(|x| x as f64)).collect(),
            TypedColumn::I64(v) => v.iter().map(|x| x.map(|x| x as f64)).collect(),
            _ => return,
        };
        *self = TypedColumn::F64(widened);
    }

    /// Append `value`. Mixed numeric kinds widen the column to f64; any
    /// other type clash stores a null.
    fn push(&mut self, value: Value) {
        let integral = matches!(self, TypedColumn::U64(_) | TypedColumn::I64(_));
        let same_kind = matches!(
            (&*self, &value),
            (TypedColumn::U64(_), Value::U64(_)) | (TypedColumn::I64(_), Value::I64(_))
        );
        if integral && !same_kind && value.as_f64().is_some() {
            self.widen_to_f64();
        }

        match (self, value) {
            (TypedColumn::U64(v), Value::U64(x)) => v.push(Some(x)),
            (TypedColumn::I64(v), Value::I64(x)) => v.push(Some(x)),
            (TypedColumn::Bool(v), Value::Bool(x)) => v.push(Some(x)),
            (TypedColumn::Str(v), Value::Str(x)) => v.push(Some(x)),
            (TypedColumn::F64(v), other) => v.push(other.as_f64()),
            (column, _) => column.push_null(),
        }
    }
}

/// Rows of one event target. Columns keep the order in which fields were
/// first seen.
#[derive(Debug, Clone, Default)]
pub struct DynamicTable {
    names: Vec<String>,
    columns: Vec<TypedColumn>,
    rows: usize,
}

impl DynamicTable {
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Option<&TypedColumn> {
        let idx = self.names.iter().position(|n| n == name)?;
        self.columns.get(idx)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &TypedColumn)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Append one row. Unknown fields open a new column backfilled with
    /// nulls; known fields missing from the row get a null. A field repeated
    /// within one row keeps its first value.
    pub fn push_row(&mut self, fields: impl IntoIterator<Item = (String, Value)>) {
        for (name, value) in fields {
            let idx = match self.names.iter().position(|n| *n == name) {
                Some(idx) => idx,
                None => {
                    self.columns.push(TypedColumn::nulls_like(&value, self.rows));
                    self.names.push(name);
                    self.columns.len() - 1
                }
            };
            let column = &mut self.columns[idx];
            if column.len() == self.rows {
                column.push(value);
            }
        }
        self.rows += 1;
        for column in &mut self.columns {
            if column.len() < self.rows {
                column.push_null();
            }
        }
    }
}

/// All tables recorded so far, keyed by tracing target.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub tables: BTreeMap<String, DynamicTable>,
}

impl Recorder {
    pub fn table(&self, target: &str) -> Option<&DynamicTable> {
        self.tables.get(target)
    }

    /// Rows recorded under `target`; 0 when nothing was emitted there.
    pub fn row_count(&self, target: &str) -> usize {
        self.tables.get(target).map_or(0, DynamicTable::row_count)
    }

    pub fn push(&mut self, target: &str, fields: impl IntoIterator<Item = (String, Value)>) {
        self.tables.entry(target.to_string()).or_default().push_row(fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[(&str, Value)]) -> Vec<(String, Value)> {
        fields.iter().map(|(n, v)| (n.to_string(), v.clone())).collect()
    }

    #[test]
    fn missing_fields_become_nulls() {
        let mut table = DynamicTable::default();
        table.push_row(row(&[("turn", Value::U64(1)), ("revenue", Value::F64(10.0))]));
        table.push_row(row(&[("turn", Value::U64(2)), ("units", Value::U64(5))]));

        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column("revenue"),
            Some(&TypedColumn::F64(vec![Some(10.0), None]))
        );
        assert_eq!(
            table.column("units"),
            Some(&TypedColumn::U64(vec![None, Some(5)]))
        );
        assert_eq!(table.column("turn").unwrap().null_count(), 0);
    }

    #[test]
    fn columns_keep_first_seen_order() {
        let mut table = DynamicTable::default();
        table.push_row(row(&[("z", Value::Bool(true)), ("a", Value::U64(1))]));
        table.push_row(row(&[("m", Value::Str("x".into())), ("z", Value::Bool(false))]));
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn mixed_numbers_widen_to_f64() {
        let mut table = DynamicTable::default();
        table.push_row(row(&[("minutes", Value::U64(3))]));
        table.push_row(row(&[("minutes", Value::F64(2.5))]));
        table.push_row(row(&[("minutes", Value::I64(-1))]));
        table.push_row(row(&[("minutes", Value::Str("lots".into()))]));
        assert_eq!(
            table.column("minutes"),
            Some(&TypedColumn::F64(vec![Some(3.0), Some(2.5), Some(-1.0), None]))
        );
    }

    #[test]
    fn repeated_field_keeps_first_value() {
        let mut table = DynamicTable::default();
        table.push_row(row(&[("x", Value::U64(1)), ("x", Value::U64(2))]));
        assert_eq!(table.column("x"), Some(&TypedColumn::U64(vec![Some(1)])));
    }

    #[test]
    fn recorder_routes_rows_by_target() {
        let mut recorder = Recorder::default();
        recorder.push("sale", row(&[("units", Value::U64(3))]));
        recorder.push("sale", row(&[("units", Value::U64(4))]));
        recorder.push("loss", row(&[("lost_stock", Value::U64(1))]));
        assert_eq!(recorder.row_count("sale"), 2);
        assert_eq!(recorder.row_count("loss"), 1);
        assert_eq!(recorder.row_count("expiry"), 0);
    }
}
