//! Row cursor over a MySQL result set.

use mysql::{Binary, QueryResult};
use sqlbridge_core::error::{Error, ProtocolError};
use sqlbridge_core::{Result, Rows, Value};

use crate::error::from_mysql;
use crate::types::{FieldType, NativeType, decode_value};

/// One column's destination slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// `None` when the server sent a type code this crate does not know.
    pub field: Option<FieldType>,
    pub native: NativeType,
    /// Declared fractional-second digits of temporal columns.
    pub decimals: u8,
}

impl Slot {
    pub fn for_code(code: u8) -> Self {
        Self {
            field: FieldType::from_u8(code),
            native: NativeType::for_code(code),
            decimals: 0,
        }
    }

    pub fn for_column(column: &mysql::Column) -> Self {
        Self {
            decimals: column.decimals(),
            ..Self::for_code(column.column_type() as u8)
        }
    }
}

/// Column names and native slots of a result, discovered once per result
/// and reused for every fetched row.
#[derive(Debug, Clone)]
pub struct ResultBinding {
    names: Vec<String>,
    slots: Vec<Slot>,
}

impl ResultBinding {
    pub fn from_columns(columns: &[mysql::Column]) -> Self {
        let names = columns
            .iter()
            .map(|c| c.name_str().into_owned())
            .collect();
        let slots = columns
            .iter()
            .map(Slot::for_column)
            .collect();
        Self { names, slots }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Fails unless `dest` has exactly one slot per result column.
    pub fn check_width(&self, dest: &[Value]) -> Result<()> {
        if dest.len() == self.slots.len() {
            return Ok(());
        }
        Err(Error::Protocol(ProtocolError {
            message: format!(
                "destination has {} slots, result has {} columns",
                dest.len(),
                self.slots.len()
            ),
            source: None,
        }))
    }

    /// Convert a fetched row through the bound slots into `dest`.
    pub fn fill(&self, mut row: mysql::Row, dest: &mut [Value]) -> Result<()> {
        self.check_width(dest)?;

        for (i, (slot, out)) in self.slots.iter().zip(dest.iter_mut()).enumerate() {
            let raw = row.take::<mysql::Value, usize>(i).ok_or_else(|| {
                Error::Protocol(ProtocolError {
                    message: format!("row is missing column {}", i),
                    source: None,
                })
            })?;
            *out = decode_value(slot.native, slot.field, slot.decimals, raw).map_err(|e| match e {
                Error::Type(mut te) => {
                    te.column = Some(self.names[i].clone());
                    Error::Type(te)
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

/// Cursor over the rows of one executed statement.
pub struct MySqlRows<'s> {
    result: QueryResult<'s, 's, 's, Binary>,
    binding: Option<ResultBinding>,
    done: bool,
    fetched: u64,
}

impl<'s> MySqlRows<'s> {
    pub(crate) fn new(result: QueryResult<'s, 's, 's, Binary>) -> Self {
        Self {
            result,
            binding: None,
            done: false,
            fetched: 0,
        }
    }

    fn binding(&mut self) -> &ResultBinding {
        let result = &self.result;
        self.binding
            .get_or_insert_with(|| ResultBinding::from_columns(result.columns().as_ref()))
    }

    /// Number of rows fetched so far.
    pub fn fetched(&self) -> u64 {
        self.fetched
    }
}

impl Rows for MySqlRows<'_> {
    fn columns(&mut self) -> &[String] {
        self.binding().names()
    }

    fn next(&mut self, dest: &mut [Value]) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        // A destination of the wrong width must not consume a row.
        self.binding().check_width(dest)?;

        match self.result.next() {
            None => {
                self.done = true;
                tracing::trace!(rows = self.fetched, "End of result set");
                Ok(false)
            }
            Some(Err(e)) => {
                self.done = true;
                Err(from_mysql(e))
            }
            Some(Ok(row)) => {
                if let Some(binding) = &self.binding {
                    binding.fill(row, dest)?;
                }
                self.fetched += 1;
                Ok(true)
            }
        }
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        if !self.done {
            let mut skipped = 0_u64;
            for row in self.result.by_ref() {
                row.map_err(from_mysql)?;
                skipped += 1;
            }
            self.done = true;
            tracing::trace!(fetched = self.fetched, skipped, "Closed cursor early");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mysql::consts::ColumnType;
    use mysql_common::row::new_row;

    fn columns() -> Arc<[mysql::Column]> {
        vec![
            mysql::Column::new(ColumnType::MYSQL_TYPE_LONG).with_name(b"id"),
            mysql::Column::new(ColumnType::MYSQL_TYPE_VARCHAR).with_name(b"name"),
            mysql::Column::new(ColumnType::MYSQL_TYPE_DATETIME)
                .with_name(b"seen")
                .with_decimals(3),
        ]
        .into()
    }

    fn row(columns: &Arc<[mysql::Column]>, values: Vec<mysql::Value>) -> mysql::Row {
        new_row(values, Arc::clone(columns))
    }

    #[test]
    fn test_slot_for_known_code() {
        let slot = Slot::for_code(0x03);
        assert_eq!(slot.field, Some(FieldType::Long));
        assert_eq!(slot.native, NativeType::Int64);
        assert_eq!(slot.decimals, 0);
    }

    #[test]
    fn test_slot_for_unknown_code() {
        let slot = Slot::for_code(0x30);
        assert_eq!(slot.field, None);
        assert_eq!(slot.native, NativeType::Bytes);
    }

    #[test]
    fn test_binding_reads_column_metadata() {
        let binding = ResultBinding::from_columns(&columns());
        assert_eq!(binding.names(), &["id", "name", "seen"]);

        let natives: Vec<NativeType> = binding.slots().iter().map(|s| s.native).collect();
        assert_eq!(
            natives,
            [NativeType::Int64, NativeType::Text, NativeType::Text]
        );
        assert_eq!(binding.slots()[2].field, Some(FieldType::DateTime));
        assert_eq!(binding.slots()[2].decimals, 3);
    }

    #[test]
    fn test_one_binding_fills_every_row() {
        let cols = columns();
        let binding = ResultBinding::from_columns(&cols);
        let mut dest = vec![Value::Null; 3];

        binding
            .fill(
                row(
                    &cols,
                    vec![
                        mysql::Value::Int(1),
                        mysql::Value::Bytes(b"ada".to_vec()),
                        mysql::Value::Date(2024, 1, 2, 3, 4, 5, 120_000),
                    ],
                ),
                &mut dest,
            )
            .unwrap();
        assert_eq!(
            dest,
            [
                Value::BigInt(1),
                Value::Text("ada".to_string()),
                Value::Text("2024-01-02 03:04:05.120".to_string()),
            ]
        );

        binding
            .fill(
                row(
                    &cols,
                    vec![
                        mysql::Value::UInt(2),
                        mysql::Value::NULL,
                        mysql::Value::Date(2024, 1, 2, 3, 4, 5, 0),
                    ],
                ),
                &mut dest,
            )
            .unwrap();
        assert_eq!(
            dest,
            [
                Value::BigInt(2),
                Value::Null,
                Value::Text("2024-01-02 03:04:05.000".to_string()),
            ]
        );
    }

    #[test]
    fn test_width_mismatch_is_rejected() {
        let cols = columns();
        let binding = ResultBinding::from_columns(&cols);

        let mut short = vec![Value::Null];
        assert!(matches!(
            binding.check_width(&short),
            Err(Error::Protocol(_))
        ));
        assert!(binding.check_width(&[Value::Null, Value::Null, Value::Null]).is_ok());

        let full = row(
            &cols,
            vec![
                mysql::Value::Int(1),
                mysql::Value::NULL,
                mysql::Value::NULL,
            ],
        );
        let err = binding.fill(full, &mut short).unwrap_err();
        assert!(err.to_string().contains("destination has 1 slots, result has 3 columns"));
        assert_eq!(short, [Value::Null]);
    }

    #[test]
    fn test_type_error_names_the_column() {
        let cols = columns();
        let binding = ResultBinding::from_columns(&cols);
        let mut dest = vec![Value::Null; 3];

        let bad = row(
            &cols,
            vec![
                mysql::Value::Bytes(b"not a number".to_vec()),
                mysql::Value::NULL,
                mysql::Value::NULL,
            ],
        );
        match binding.fill(bad, &mut dest) {
            Err(Error::Type(te)) => assert_eq!(te.column.as_deref(), Some("id")),
            other => panic!("expected a type error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_binding() {
        let binding = ResultBinding::from_columns(&[]);
        assert!(binding.names().is_empty());
        assert!(binding.check_width(&[]).is_ok());
    }
}
