use conduit_core::{Error, Result, Value as CoreValue};
use postgres_types::{private::BytesMut, to_sql_checked, IsNull, ToSql, Type};

type BoxError = Box<dyn std::error::Error + Sync + Send>;

/// Binds a [`CoreValue`] to whatever parameter type the server inferred.
#[derive(Debug)]
pub struct Value<'a>(pub &'a CoreValue);

impl ToSql for Value<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError>
    where
        Self: Sized,
    {
        match self.0 {
            CoreValue::Null => Ok(IsNull::Yes),
            CoreValue::Bool(value) => value.to_sql(ty, out),
            CoreValue::I64(value) => match *ty {
                Type::INT2 => i16::try_from(*value)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*value)?.to_sql(ty, out),
                Type::INT8 => value.to_sql(ty, out),
                Type::OID => u32::try_from(*value)?.to_sql(ty, out),
                Type::FLOAT4 => (*value as f32).to_sql(ty, out),
                Type::FLOAT8 => (*value as f64).to_sql(ty, out),
                Type::BOOL => (*value != 0).to_sql(ty, out),
                _ => Err(mismatch(self.0, ty)),
            },
            CoreValue::F64(value) => match *ty {
                Type::FLOAT4 => (*value as f32).to_sql(ty, out),
                Type::FLOAT8 => value.to_sql(ty, out),
                _ => Err(mismatch(self.0, ty)),
            },
            CoreValue::String(value) => match *ty {
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                    value.to_sql(ty, out)
                }
                _ => Err(mismatch(self.0, ty)),
            },
            CoreValue::Bytes(value) => match *ty {
                Type::BYTEA => value.to_sql(ty, out),
                _ => Err(mismatch(self.0, ty)),
            },
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn mismatch(value: &CoreValue, ty: &Type) -> BoxError {
    format!("cannot bind {} to a parameter of type {ty}", value.type_name()).into()
}

/// Reads the cell at `index` into a [`CoreValue`].
pub(crate) fn load(row: &tokio_postgres::Row, index: usize) -> Result<CoreValue> {
    let ty = row.columns()[index].type_();

    let value = match *ty {
        Type::BOOL => row
            .try_get::<_, Option<bool>>(index)
            .map(|v| v.map(CoreValue::Bool)),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(index)
            .map(|v| v.map(CoreValue::from)),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(index)
            .map(|v| v.map(CoreValue::from)),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(index)
            .map(|v| v.map(CoreValue::I64)),
        Type::OID => row
            .try_get::<_, Option<u32>>(index)
            .map(|v| v.map(CoreValue::from)),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(index)
            .map(|v| v.map(CoreValue::from)),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(index)
            .map(|v| v.map(CoreValue::F64)),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
            .try_get::<_, Option<String>>(index)
            .map(|v| v.map(CoreValue::String)),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(index)
            .map(|v| v.map(CoreValue::Bytes)),
        ref ty => {
            return Err(conduit_core::err!(
                "unsupported column type `{ty}` for column `{}`",
                row.columns()[index].name()
            ))
        }
    }
    .map_err(Error::driver_operation_failed)?;

    Ok(value.unwrap_or(CoreValue::Null))
}
