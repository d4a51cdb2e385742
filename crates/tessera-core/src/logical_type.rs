//! Logical column types. Pure data; the block layer never interprets SQL
//! semantics beyond the byte width a type is stored with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Varchar,
    Varbinary,
}

impl LogicalType {
    pub const ALL: [LogicalType; 9] = [
        LogicalType::Boolean,
        LogicalType::TinyInt,
        LogicalType::SmallInt,
        LogicalType::Integer,
        LogicalType::BigInt,
        LogicalType::Real,
        LogicalType::Double,
        LogicalType::Varchar,
        LogicalType::Varbinary,
    ];

    /// Stored width in bytes, or `None` for variable-width types.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            LogicalType::Boolean | LogicalType::TinyInt => Some(1),
            LogicalType::SmallInt => Some(2),
            LogicalType::Integer | LogicalType::Real => Some(4),
            LogicalType::BigInt | LogicalType::Double => Some(8),
            LogicalType::Varchar | LogicalType::Varbinary => None,
        }
    }

    pub const fn is_fixed_width(self) -> bool {
        self.fixed_width().is_some()
    }

    /// Stable SQL name, also used as the type tag on the wire.
    pub const fn name(self) -> &'static str {
        match self {
            LogicalType::Boolean => "boolean",
            LogicalType::TinyInt => "tinyint",
            LogicalType::SmallInt => "smallint",
            LogicalType::Integer => "integer",
            LogicalType::BigInt => "bigint",
            LogicalType::Real => "real",
            LogicalType::Double => "double",
            LogicalType::Varchar => "varchar",
            LogicalType::Varbinary => "varbinary",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogicalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LogicalType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::IllegalArgument(format!("unknown logical type '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for t in LogicalType::ALL {
            assert_eq!(t.name().parse::<LogicalType>().unwrap(), t);
        }
        assert!("decimal".parse::<LogicalType>().is_err());
    }

    #[test]
    fn widths() {
        assert_eq!(LogicalType::BigInt.fixed_width(), Some(8));
        assert_eq!(LogicalType::Real.fixed_width(), Some(4));
        assert_eq!(LogicalType::Varchar.fixed_width(), None);
        assert!(!LogicalType::Varbinary.is_fixed_width());
    }
}
