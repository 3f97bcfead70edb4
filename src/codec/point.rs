use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Number;
use std::fmt;
use std::str::FromStr;

use super::{CodecError, braces_to_brackets};

/// A two-component coordinate, written as `"{x, y}"` in package JSON.
///
/// Components keep the exact text they were read with, so a value read
/// from a file is written back digit for digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: Number,
    pub y: Number,
}

impl Point {
    pub fn new(x: Number, y: Number) -> Self {
        Self { x, y }
    }

    /// Build a point from floats, formatted with the shortest text that
    /// reads back to the same value.
    pub fn from_f64(x: f64, y: f64) -> Result<Self, CodecError> {
        let x = Number::from_f64(x).ok_or(CodecError::NonFinite(x))?;
        let y = Number::from_f64(y).ok_or(CodecError::NonFinite(y))?;
        Ok(Self { x, y })
    }

    pub fn x_f64(&self) -> Option<f64> {
        self.x.as_f64()
    }

    pub fn y_f64(&self) -> Option<f64> {
        self.y.as_f64()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.x, self.y)
    }
}

impl FromStr for Point {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CodecError::MalformedPoint(s.to_owned());
        let array = braces_to_brackets(s).ok_or_else(malformed)?;
        let mut parts: Vec<Number> = serde_json::from_str(&array).map_err(|_| malformed())?;
        if parts.len() != 2 {
            return Err(CodecError::PointArity {
                text: s.to_owned(),
                found: parts.len(),
            });
        }
        let y = parts.pop();
        let x = parts.pop();
        match (x, y) {
            (Some(x), Some(y)) => Ok(Self { x, y }),
            _ => Err(malformed()),
        }
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(PointVisitor)
    }
}

struct PointVisitor;

impl Visitor<'_> for PointVisitor {
    type Value = Point;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a point string such as \"{0.5, 1}\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Point, E> {
        v.parse().map_err(E::custom)
    }
}
