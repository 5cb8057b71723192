use crate::{err, FromValue, Result, Value};
use std::sync::Arc;

/// One result row with the column names of the statement that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Row {
        debug_assert_eq!(columns.len(), values.len());
        Row { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Reads the cell at `index` as `T`.
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T> {
        let Some(value) = self.values.get(index) else {
            return Err(err!(
                "column index {index} out of range for row with {} columns",
                self.values.len()
            ));
        };
        T::from_value(value.clone())
    }

    /// Reads the cell of the first column named `name` as `T`.
    pub fn get_named<T: FromValue>(&self, name: &str) -> Result<T> {
        let Some(index) = self.columns.iter().position(|column| column == name) else {
            return Err(err!("no column named `{name}`"));
        };
        self.get(index)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Builds a value from a result row.
///
/// Scalars read column 0; tuples read one column per element. Implement it
/// by hand for structs:
///
/// ```
/// use conduit_core::{FromRow, Result, Row};
///
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> Result<Self> {
///         Ok(User {
///             id: row.get_named("id")?,
///             name: row.get_named("name")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.clone())
    }
}

macro_rules! impl_from_row_scalar {
    ( $( $ty:ty ),* ) => {
        $(
            impl FromRow for $ty {
                fn from_row(row: &Row) -> Result<Self> {
                    row.get(0)
                }
            }

            impl FromRow for Option<$ty> {
                fn from_row(row: &Row) -> Result<Self> {
                    row.get(0)
                }
            }
        )*
    };
}

impl_from_row_scalar!(
    Value, bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, String, Vec<u8>
);

macro_rules! impl_from_row_tuple {
    ( $( ( $( $name:ident : $idx:tt ),+ ) )* ) => {
        $(
            impl<$( $name ),+> FromRow for ( $( $name, )+ )
            where
                $( $name: FromValue ),+
            {
                fn from_row(row: &Row) -> Result<Self> {
                    Ok(( $( row.get::<$name>($idx)?, )+ ))
                }
            }
        )*
    };
}

impl_from_row_tuple! {
    (T0: 0)
    (T0: 0, T1: 1)
    (T0: 0, T1: 1, T2: 2)
    (T0: 0, T1: 1, T2: 2, T3: 3)
    (T0: 0, T1: 1, T2: 2, T3: 3, T4: 4)
    (T0: 0, T1: 1, T2: 2, T3: 3, T4: 4, T5: 5)
    (T0: 0, T1: 1, T2: 2, T3: 3, T4: 4, T5: 5, T6: 6)
    (T0: 0, T1: 1, T2: 2, T3: 3, T4: 4, T5: 5, T6: 6, T7: 7)
}

impl From<Row> for Vec<Value> {
    fn from(row: Row) -> Vec<Value> {
        row.values
    }
}
