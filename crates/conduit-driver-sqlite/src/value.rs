use conduit_core::{Error, Result, Value as CoreValue};
use rusqlite::{
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
    Row,
};

/// Binds a [`CoreValue`] as a SQLite parameter.
#[derive(Debug)]
pub struct Value<'a>(pub &'a CoreValue);

impl ToSql for Value<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self.0 {
            CoreValue::Null => Ok(ToSqlOutput::Owned(SqlValue::Null)),
            CoreValue::Bool(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v as i64))),
            CoreValue::I64(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v))),
            CoreValue::F64(v) => Ok(ToSqlOutput::Owned(SqlValue::Real(*v))),
            CoreValue::String(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes()))),
            CoreValue::Bytes(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Blob(&v[..]))),
        }
    }
}

/// Reads the cell at `index` into a [`CoreValue`] by its storage class.
pub(crate) fn load(row: &Row<'_>, index: usize) -> Result<CoreValue> {
    let value = row
        .get_ref(index)
        .map_err(Error::driver_operation_failed)?;

    Ok(match value {
        ValueRef::Null => CoreValue::Null,
        ValueRef::Integer(v) => CoreValue::I64(v),
        ValueRef::Real(v) => CoreValue::F64(v),
        ValueRef::Text(v) => CoreValue::String(
            std::str::from_utf8(v)
                .map_err(Error::driver_operation_failed)?
                .to_owned(),
        ),
        ValueRef::Blob(v) => CoreValue::Bytes(v.to_vec()),
    })
}
