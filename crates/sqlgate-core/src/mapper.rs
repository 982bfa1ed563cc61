//! Row mapping capability

use crate::{DriverResult, Row};

/// Converts one fetched row into a typed value
///
/// Mappers read columns by 1-based position and only see a shared borrow of
/// the current row, so they cannot move or close the cursor. Any closure of
/// the shape `Fn(&Row) -> DriverResult<T>` is a mapper.
///
/// ```
/// use sqlgate_core::{Row, RowMapper, Value};
///
/// let mapper = |row: &Row| row.get::<String>(2);
/// let row = Row::new(vec![Value::Int64(1), Value::from("alice")]);
/// assert_eq!(mapper.map_row(&row).unwrap(), "alice");
/// ```
pub trait RowMapper<T> {
    fn map_row(&self, row: &Row) -> DriverResult<T>;
}

impl<T, F> RowMapper<T> for F
where
    F: Fn(&Row) -> DriverResult<T>,
{
    fn map_row(&self, row: &Row) -> DriverResult<T> {
        self(row)
    }
}
