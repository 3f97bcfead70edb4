use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Number;
use std::fmt;
use std::str::FromStr;

use super::{CodecError, Point, braces_to_brackets};

/// An ordered list of points, written as `"{{x1, y1},{x2, y2}}"`.
///
/// Used for regions such as clipping masks and glyph bounds; order is
/// preserved as read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PointList(pub Vec<Point>);

impl PointList {
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Point>> for PointList {
    fn from(points: Vec<Point>) -> Self {
        Self(points)
    }
}

impl IntoIterator for PointList {
    type Item = Point;
    type IntoIter = std::vec::IntoIter<Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PointList {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for PointList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, point) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", point)?;
        }
        f.write_str("}")
    }
}

impl FromStr for PointList {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CodecError::MalformedPointList(s.to_owned());
        let array = braces_to_brackets(s).ok_or_else(malformed)?;
        let rows: Vec<Vec<Number>> = serde_json::from_str(&array).map_err(|_| malformed())?;
        rows.into_iter()
            .map(|row| match <[Number; 2]>::try_from(row) {
                Ok([x, y]) => Ok(Point { x, y }),
                Err(_) => Err(malformed()),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(PointList)
    }
}

impl Serialize for PointList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PointList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(PointListVisitor)
    }
}

struct PointListVisitor;

impl Visitor<'_> for PointListVisitor {
    type Value = PointList;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a point list string such as \"{{0, 0},{1, 1}}\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<PointList, E> {
        v.parse().map_err(E::custom)
    }
}
