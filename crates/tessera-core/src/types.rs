//! Boxed values handed to display and diagnostics paths.
//!
//! Operators never see these on the hot path; they read raw bytes from blocks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::logical_type::LogicalType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

impl Scalar {
    /// Logical type this value naturally belongs to; `None` for `Null`.
    pub fn logical_type(&self) -> Option<LogicalType> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(_) => Some(LogicalType::Boolean),
            Scalar::I8(_) => Some(LogicalType::TinyInt),
            Scalar::I16(_) => Some(LogicalType::SmallInt),
            Scalar::I32(_) => Some(LogicalType::Integer),
            Scalar::I64(_) => Some(LogicalType::BigInt),
            Scalar::F32(_) => Some(LogicalType::Real),
            Scalar::F64(_) => Some(LogicalType::Double),
            Scalar::Str(_) => Some(LogicalType::Varchar),
            Scalar::Bin(_) => Some(LogicalType::Varbinary),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("NULL"),
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::I8(v) => write!(f, "{v}"),
            Scalar::I16(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
            Scalar::Str(v) => f.write_str(v),
            Scalar::Bin(v) => {
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}
