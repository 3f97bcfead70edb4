use std::collections::BTreeMap;

use super::{MAGIC, Value};

/// Encode `value` as a binary property list.
///
/// Every value becomes its own object (nothing is deduplicated), integers
/// use the narrowest width that holds them and strings are stored as ASCII
/// when possible, UTF-16BE otherwise.
pub fn to_bytes(value: &Value) -> Vec<u8> {
    let mut objects = Vec::new();
    flatten(value, &mut objects);

    let ref_size = uint_width(objects.len().saturating_sub(1) as u64);
    let mut out = MAGIC.to_vec();
    let mut offsets = Vec::with_capacity(objects.len());

    for object in &objects {
        offsets.push(out.len() as u64);
        write_object(object, ref_size, &mut out);
    }

    let offset_table_offset = out.len() as u64;
    let offset_size = uint_width(offsets.last().copied().unwrap_or(0));
    for offset in &offsets {
        put_uint(&mut out, *offset, offset_size);
    }

    out.extend_from_slice(&[0; 6]);
    out.push(offset_size as u8);
    out.push(ref_size as u8);
    out.extend_from_slice(&(objects.len() as u64).to_be_bytes());
    out.extend_from_slice(&0u64.to_be_bytes());
    out.extend_from_slice(&offset_table_offset.to_be_bytes());
    out
}

/// One entry of the object table.
enum Object<'a> {
    Scalar(&'a Value),
    Key(&'a str),
    Array(Vec<u64>),
    Dictionary(Vec<u64>, Vec<u64>),
}

/// Append `value` and its descendants, containers before their children.
/// Returns the index of `value`.
fn flatten<'a>(value: &'a Value, objects: &mut Vec<Object<'a>>) -> u64 {
    let index = objects.len();
    match value {
        Value::Array(items) => {
            objects.push(Object::Array(Vec::new()));
            let refs = items.iter().map(|item| flatten(item, objects)).collect();
            objects[index] = Object::Array(refs);
        }
        Value::Dictionary(map) => {
            objects.push(Object::Dictionary(Vec::new(), Vec::new()));
            let (keys, values) = flatten_dictionary(map, objects);
            objects[index] = Object::Dictionary(keys, values);
        }
        scalar => objects.push(Object::Scalar(scalar)),
    }
    index as u64
}

fn flatten_dictionary<'a>(
    map: &'a BTreeMap<String, Value>,
    objects: &mut Vec<Object<'a>>,
) -> (Vec<u64>, Vec<u64>) {
    let keys = map
        .keys()
        .map(|key| {
            objects.push(Object::Key(key));
            (objects.len() - 1) as u64
        })
        .collect();
    let values = map.values().map(|value| flatten(value, objects)).collect();
    (keys, values)
}

fn write_object(object: &Object<'_>, ref_size: usize, out: &mut Vec<u8>) {
    match object {
        Object::Key(key) => write_string(key, out),
        Object::Array(refs) => {
            write_header(0xA, refs.len(), out);
            for r in refs {
                put_uint(out, *r, ref_size);
            }
        }
        Object::Dictionary(keys, values) => {
            write_header(0xD, keys.len(), out);
            for r in keys.iter().chain(values) {
                put_uint(out, *r, ref_size);
            }
        }
        Object::Scalar(value) => match value {
            Value::Null => out.push(0x00),
            Value::Boolean(false) => out.push(0x08),
            Value::Boolean(true) => out.push(0x09),
            Value::Integer(i) => write_int(*i, out),
            Value::Real(r) => {
                out.push(0x23);
                out.extend_from_slice(&r.to_be_bytes());
            }
            Value::Date(d) => {
                out.push(0x33);
                out.extend_from_slice(&d.to_be_bytes());
            }
            Value::String(s) => write_string(s, out),
            Value::Data(bytes) => {
                write_header(0x4, bytes.len(), out);
                out.extend_from_slice(bytes);
            }
            Value::Uid(uid) => {
                let width = uid_width(*uid);
                out.push(0x80 | (width as u8 - 1));
                put_uint(out, *uid, width);
            }
            // Containers are flattened into their own objects.
            Value::Array(_) | Value::Dictionary(_) => {}
        },
    }
}

fn write_string(s: &str, out: &mut Vec<u8>) {
    if s.is_ascii() {
        write_header(0x5, s.len(), out);
        out.extend_from_slice(s.as_bytes());
    } else {
        let units: Vec<u16> = s.encode_utf16().collect();
        write_header(0x6, units.len(), out);
        for unit in units {
            out.extend_from_slice(&unit.to_be_bytes());
        }
    }
}

/// Marker with an inline length, or 0xF followed by an integer object.
fn write_header(kind: u8, len: usize, out: &mut Vec<u8>) {
    if len < 0x0F {
        out.push(kind << 4 | len as u8);
    } else {
        out.push(kind << 4 | 0x0F);
        write_int(len as i128, out);
    }
}

fn write_int(value: i128, out: &mut Vec<u8>) {
    if (0..=0xFF).contains(&value) {
        out.push(0x10);
        out.push(value as u8);
    } else if (0..=0xFFFF).contains(&value) {
        out.push(0x11);
        out.extend_from_slice(&(value as u16).to_be_bytes());
    } else if (0..=0xFFFF_FFFF).contains(&value) {
        out.push(0x12);
        out.extend_from_slice(&(value as u32).to_be_bytes());
    } else if let Ok(value) = i64::try_from(value) {
        // Negative numbers always take the full signed 8 bytes.
        out.push(0x13);
        out.extend_from_slice(&value.to_be_bytes());
    } else {
        out.push(0x14);
        out.extend_from_slice(&value.to_be_bytes());
    }
}

fn uint_width(max: u64) -> usize {
    if max <= 0xFF {
        1
    } else if max <= 0xFFFF {
        2
    } else if max <= 0xFFFF_FFFF {
        4
    } else {
        8
    }
}

fn uid_width(uid: u64) -> usize {
    (8 - uid.leading_zeros() as usize / 8).max(1)
}

fn put_uint(out: &mut Vec<u8>, value: u64, width: usize) {
    out.extend_from_slice(&value.to_be_bytes()[8 - width..]);
}
