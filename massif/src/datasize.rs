//! Byte counts with binary and decimal magnitude conversions.
//!
//! Massif reports every size as an exact byte count. [`DataSize`] wraps
//! such a count for display without ever changing the stored value.

use serde::{Deserialize, Serialize};
use std::fmt;

const KIBIBYTE: f64 = 1024.0;
const MEBIBYTE: f64 = KIBIBYTE * 1024.0;
const GIBIBYTE: f64 = MEBIBYTE * 1024.0;
const TEBIBYTE: f64 = GIBIBYTE * 1024.0;

const KILOBYTE: f64 = 1000.0;
const MEGABYTE: f64 = KILOBYTE * 1000.0;
const GIGABYTE: f64 = MEGABYTE * 1000.0;

/// Largest first.
const BINARY_UNITS: [(&str, f64); 4] = [
    ("TiB", TEBIBYTE),
    ("GiB", GIBIBYTE),
    ("MiB", MEBIBYTE),
    ("KiB", KIBIBYTE),
];

/// A signed number of bytes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DataSize(i64);

impl DataSize {
    pub const fn from_bytes(bytes: i64) -> Self {
        DataSize(bytes)
    }

    pub const fn bytes(self) -> i64 {
        self.0
    }

    pub fn kibibytes(self) -> f64 {
        self.0 as f64 / KIBIBYTE
    }

    pub fn mebibytes(self) -> f64 {
        self.0 as f64 / MEBIBYTE
    }

    pub fn gibibytes(self) -> f64 {
        self.0 as f64 / GIBIBYTE
    }

    pub fn kilobytes(self) -> f64 {
        self.0 as f64 / KILOBYTE
    }

    pub fn megabytes(self) -> f64 {
        self.0 as f64 / MEGABYTE
    }

    pub fn gigabytes(self) -> f64 {
        self.0 as f64 / GIGABYTE
    }
}

impl From<i64> for DataSize {
    fn from(bytes: i64) -> Self {
        DataSize(bytes)
    }
}

/// Uses the largest binary unit the value reaches, with two decimals.
/// Values under one KiB are printed as whole bytes.
impl fmt::Display for DataSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs() as f64;
        for (unit, scale) in BINARY_UNITS {
            if magnitude >= scale {
                return write!(f, "{:.2} {}", self.0 as f64 / scale, unit);
            }
        }
        write!(f, "{} B", self.0)
    }
}
