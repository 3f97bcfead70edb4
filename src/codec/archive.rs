use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::CodecError;
use crate::plist::{self, Value};

/// A keyed archive embedded in package JSON as base64 text.
///
/// Rich text attributes (fonts, colors, paragraph styles) are stored this
/// way. The payload is decoded structurally into a string-keyed map and
/// left uninterpreted. Encoding produces a valid archive with the same
/// structure, not the original bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Archive {
    entries: BTreeMap<String, Value>,
}

impl Archive {
    pub fn new(entries: BTreeMap<String, Value>) -> Self {
        Self { entries }
    }

    /// Decode base64 text holding a binary property list.
    pub fn from_base64(text: &str) -> Result<Self, CodecError> {
        let bytes = STANDARD.decode(text.trim())?;
        Self::from_plist(&bytes)
    }

    /// Decode a binary property list whose top object is a dictionary.
    pub fn from_plist(bytes: &[u8]) -> Result<Self, CodecError> {
        match plist::from_bytes(bytes)? {
            Value::Dictionary(entries) => Ok(Self { entries }),
            _ => Err(CodecError::NotADictionary),
        }
    }

    pub fn to_plist(&self) -> Vec<u8> {
        plist::to_bytes(&Value::Dictionary(self.entries.clone()))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_plist())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }

    pub fn into_entries(self) -> BTreeMap<String, Value> {
        self.entries
    }

    /// Follow a keyed-archive reference into the `$objects` table.
    ///
    /// Values that are not [`Value::Uid`], or that point outside the
    /// table, are returned unchanged.
    pub fn resolve<'a>(&'a self, value: &'a Value) -> &'a Value {
        let Some(uid) = value.as_uid() else {
            return value;
        };
        self.get("$objects")
            .and_then(Value::as_array)
            .and_then(|objects| objects.get(uid as usize))
            .unwrap_or(value)
    }

    /// The object named by `$top.<key>`, resolved.
    pub fn top(&self, key: &str) -> Option<&Value> {
        self.get("$top")
            .and_then(|top| top.get(key))
            .map(|value| self.resolve(value))
    }
}

impl Serialize for Archive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Archive {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(ArchiveVisitor)
    }
}

struct ArchiveVisitor;

impl Visitor<'_> for ArchiveVisitor {
    type Value = Archive;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a base64-encoded binary property list")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Archive, E> {
        Archive::from_base64(v).map_err(E::custom)
    }
}
