use byteorder::{BigEndian, ByteOrder};
use std::collections::BTreeMap;

use super::{MAGIC, PlistError, TRAILER_SIZE, Value};

/// Containers nested deeper than this are rejected.
const MAX_DEPTH: usize = 512;

/// Objects decoded per object in the table, before the bounds below.
const OBJECTS_PER_ENTRY: u64 = 16;
const MIN_OBJECT_BUDGET: u64 = 4096;
const MAX_OBJECT_BUDGET: u64 = 1 << 20;

/// Parse a binary property list and return its top object.
pub fn from_bytes(data: &[u8]) -> Result<Value, PlistError> {
    let mut reader = Reader::new(data)?;
    let top = reader.trailer.top_object;
    reader.read_object(top)
}

struct Trailer {
    offset_int_size: usize,
    object_ref_size: usize,
    num_objects: u64,
    top_object: u64,
    offset_table_offset: u64,
}

impl Trailer {
    fn parse(data: &[u8]) -> Result<Self, PlistError> {
        let raw = &data[data.len() - TRAILER_SIZE..];
        let trailer = Self {
            offset_int_size: raw[6] as usize,
            object_ref_size: raw[7] as usize,
            num_objects: BigEndian::read_u64(&raw[8..16]),
            top_object: BigEndian::read_u64(&raw[16..24]),
            offset_table_offset: BigEndian::read_u64(&raw[24..32]),
        };

        if !(1..=8).contains(&trailer.offset_int_size) {
            return Err(PlistError::BadTrailer("offset size must be 1 to 8 bytes"));
        }
        if !(1..=8).contains(&trailer.object_ref_size) {
            return Err(PlistError::BadTrailer("reference size must be 1 to 8 bytes"));
        }
        if trailer.num_objects == 0 {
            return Err(PlistError::BadTrailer("no objects"));
        }
        if trailer.top_object >= trailer.num_objects {
            return Err(PlistError::BadTrailer("top object out of range"));
        }

        let table_end = trailer
            .num_objects
            .checked_mul(trailer.offset_int_size as u64)
            .and_then(|len| len.checked_add(trailer.offset_table_offset));
        match table_end {
            Some(end)
                if trailer.offset_table_offset >= MAGIC.len() as u64
                    && end <= (data.len() - TRAILER_SIZE) as u64 => {}
            _ => return Err(PlistError::BadTrailer("offset table out of range")),
        }

        Ok(trailer)
    }
}

struct Reader<'a> {
    data: &'a [u8],
    trailer: Trailer,
    offsets: Vec<usize>,
    /// Objects currently being decoded, outermost first.
    stack: Vec<u64>,
    /// Shared references are expanded each time they are visited, so the
    /// total number of decoded values is bounded separately.
    decoded: u64,
    budget: u64,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Result<Self, PlistError> {
        if data.len() < MAGIC.len() + TRAILER_SIZE || &data[..MAGIC.len()] != MAGIC {
            return Err(PlistError::BadMagic);
        }
        let trailer = Trailer::parse(data)?;

        let table = trailer.offset_table_offset as usize;
        let width = trailer.offset_int_size;
        let mut offsets = Vec::with_capacity(trailer.num_objects as usize);
        for index in 0..trailer.num_objects {
            let at = table + index as usize * width;
            let offset = BigEndian::read_uint(&data[at..at + width], width);
            if offset < MAGIC.len() as u64 || offset >= trailer.offset_table_offset {
                return Err(PlistError::BadOffset { index, offset });
            }
            offsets.push(offset as usize);
        }

        let budget = trailer
            .num_objects
            .saturating_mul(OBJECTS_PER_ENTRY)
            .clamp(MIN_OBJECT_BUDGET, MAX_OBJECT_BUDGET);

        Ok(Self {
            data,
            trailer,
            offsets,
            stack: Vec::new(),
            decoded: 0,
            budget,
        })
    }

    /// Object bytes end where the offset table starts.
    fn objects_end(&self) -> usize {
        self.trailer.offset_table_offset as usize
    }

    fn bytes(&self, at: usize, len: usize) -> Result<&'a [u8], PlistError> {
        match at.checked_add(len) {
            Some(end) if end <= self.objects_end() => Ok(&self.data[at..end]),
            _ => Err(PlistError::Truncated(at)),
        }
    }

    fn read_object(&mut self, index: u64) -> Result<Value, PlistError> {
        if index >= self.trailer.num_objects {
            return Err(PlistError::BadReference {
                index,
                count: self.trailer.num_objects,
            });
        }
        if self.stack.contains(&index) {
            return Err(PlistError::Cycle(index));
        }
        if self.stack.len() >= MAX_DEPTH {
            return Err(PlistError::TooDeep(MAX_DEPTH));
        }
        self.decoded += 1;
        if self.decoded > self.budget {
            return Err(PlistError::TooManyObjects(self.budget));
        }

        self.stack.push(index);
        let value = self.parse_at(self.offsets[index as usize]);
        self.stack.pop();
        value
    }

    fn parse_at(&mut self, offset: usize) -> Result<Value, PlistError> {
        let marker = self.bytes(offset, 1)?[0];
        let info = marker & 0x0F;

        match marker >> 4 {
            0x0 => match info {
                0x0 => Ok(Value::Null),
                0x8 => Ok(Value::Boolean(false)),
                0x9 => Ok(Value::Boolean(true)),
                _ => Err(PlistError::UnknownMarker { marker, offset }),
            },
            0x1 => self.read_int(offset).map(|(value, _)| Value::Integer(value)),
            0x2 => match info {
                0x2 => Ok(Value::Real(BigEndian::read_f32(self.bytes(offset + 1, 4)?) as f64)),
                0x3 => Ok(Value::Real(BigEndian::read_f64(self.bytes(offset + 1, 8)?))),
                _ => Err(PlistError::UnknownMarker { marker, offset }),
            },
            0x3 if info == 0x3 => Ok(Value::Date(BigEndian::read_f64(self.bytes(offset + 1, 8)?))),
            0x4 => {
                let (len, start) = self.read_length(offset)?;
                Ok(Value::Data(self.bytes(start, len)?.to_vec()))
            }
            0x5 => {
                let (len, start) = self.read_length(offset)?;
                let raw = self.bytes(start, len)?;
                if !raw.is_ascii() {
                    return Err(PlistError::InvalidString(offset));
                }
                Ok(Value::String(raw.iter().map(|&b| b as char).collect()))
            }
            0x6 => {
                let (len, start) = self.read_length(offset)?;
                let byte_len = len.checked_mul(2).ok_or(PlistError::Truncated(start))?;
                let raw = self.bytes(start, byte_len)?;
                let units: Vec<u16> = raw.chunks_exact(2).map(BigEndian::read_u16).collect();
                String::from_utf16(&units)
                    .map(Value::String)
                    .map_err(|_| PlistError::InvalidString(offset))
            }
            0x8 => {
                let width = info as usize + 1;
                if width > 8 {
                    return Err(PlistError::UnknownMarker { marker, offset });
                }
                Ok(Value::Uid(BigEndian::read_uint(self.bytes(offset + 1, width)?, width)))
            }
            0xA | 0xC => {
                let (len, start) = self.read_length(offset)?;
                let refs = self.read_refs(start, len)?;
                let mut items = Vec::with_capacity(refs.len());
                for index in refs {
                    items.push(self.read_object(index)?);
                }
                Ok(Value::Array(items))
            }
            0xD => {
                let (len, start) = self.read_length(offset)?;
                let count = len.checked_mul(2).ok_or(PlistError::Truncated(start))?;
                let refs = self.read_refs(start, count)?;
                let (keys, values) = refs.split_at(len);
                let mut map = BTreeMap::new();
                for (&key_ref, &value_ref) in keys.iter().zip(values) {
                    let key = match self.read_object(key_ref)? {
                        Value::String(key) => key,
                        _ => return Err(PlistError::NonStringKey(offset)),
                    };
                    let value = self.read_object(value_ref)?;
                    map.insert(key, value);
                }
                Ok(Value::Dictionary(map))
            }
            _ => Err(PlistError::UnknownMarker { marker, offset }),
        }
    }

    /// Read an integer object; returns the value and the offset past it.
    fn read_int(&self, offset: usize) -> Result<(i128, usize), PlistError> {
        let marker = self.bytes(offset, 1)?[0];
        if marker >> 4 != 0x1 {
            return Err(PlistError::UnknownMarker { marker, offset });
        }
        let start = offset + 1;
        let value = match marker & 0x0F {
            0 => self.bytes(start, 1)?[0] as i128,
            1 => BigEndian::read_u16(self.bytes(start, 2)?) as i128,
            2 => BigEndian::read_u32(self.bytes(start, 4)?) as i128,
            3 => BigEndian::read_i64(self.bytes(start, 8)?) as i128,
            4 => BigEndian::read_i128(self.bytes(start, 16)?),
            _ => return Err(PlistError::UnknownMarker { marker, offset }),
        };
        let width = 1usize << (marker & 0x0F);
        Ok((value, start + width))
    }

    /// Element count of a data, string or container object, and where its
    /// payload begins. A low nibble of 0xF means an integer object follows.
    fn read_length(&self, offset: usize) -> Result<(usize, usize), PlistError> {
        let info = self.bytes(offset, 1)?[0] & 0x0F;
        if info != 0x0F {
            return Ok((info as usize, offset + 1));
        }
        let (len, start) = self.read_int(offset + 1)?;
        let len = usize::try_from(len).map_err(|_| PlistError::Truncated(offset))?;
        if len > self.objects_end() {
            return Err(PlistError::Truncated(offset));
        }
        Ok((len, start))
    }

    fn read_refs(&self, start: usize, count: usize) -> Result<Vec<u64>, PlistError> {
        let width = self.trailer.object_ref_size;
        let byte_len = count.checked_mul(width).ok_or(PlistError::Truncated(start))?;
        let raw = self.bytes(start, byte_len)?;
        Ok(raw
            .chunks_exact(width)
            .map(|chunk| BigEndian::read_uint(chunk, width))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a plist from pre-encoded objects with one-byte offsets and refs.
    fn assemble(objects: &[&[u8]], top: u64) -> Vec<u8> {
        let mut out = MAGIC.to_vec();
        let mut offsets = Vec::new();
        for object in objects {
            offsets.push(out.len() as u8);
            out.extend_from_slice(object);
        }
        let table = out.len() as u64;
        out.extend_from_slice(&offsets);
        out.extend_from_slice(&[0, 0, 0, 0, 0, 0, 1, 1]);
        out.extend_from_slice(&(objects.len() as u64).to_be_bytes());
        out.extend_from_slice(&top.to_be_bytes());
        out.extend_from_slice(&table.to_be_bytes());
        out
    }

    #[test]
    fn test_scalars() {
        let data = assemble(
            &[
                &[0xA5, 1, 2, 3, 4, 5],
                &[0x09],
                &[0x10, 0x2A],
                &[0x13, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE],
                &[0x52, b'h', b'i'],
                &[0x81, 0x01, 0x00],
            ],
            0,
        );
        let value = from_bytes(&data).unwrap();
        assert_eq!(
            value,
            Value::Array(vec![
                Value::Boolean(true),
                Value::Integer(42),
                Value::Integer(-2),
                Value::String("hi".into()),
                Value::Uid(256),
            ])
        );
    }

    #[test]
    fn test_utf16_string_and_long_length() {
        // "é" as UTF-16BE, then a 16-byte data blob with an explicit length.
        let mut blob = vec![0x4F, 0x10, 16];
        blob.extend_from_slice(&[7u8; 16]);
        let data = assemble(&[&[0xA2, 1, 2], &[0x61, 0x00, 0xE9], &blob], 0);
        let value = from_bytes(&data).unwrap();
        assert_eq!(value.as_array().unwrap()[0].as_str(), Some("é"));
        assert_eq!(value.as_array().unwrap()[1].as_data(), Some(&[7u8; 16][..]));
    }

    #[test]
    fn test_dictionary() {
        let data = assemble(
            &[
                &[0xD1, 1, 2],
                &[0x53, b'k', b'e', b'y'],
                &[0x23, 0x3F, 0xF8, 0, 0, 0, 0, 0, 0],
            ],
            0,
        );
        let value = from_bytes(&data).unwrap();
        assert_eq!(value.get("key"), Some(&Value::Real(1.5)));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut data = assemble(&[&[0x08]], 0);
        data[0] = b'x';
        assert_eq!(from_bytes(&data), Err(PlistError::BadMagic));
        assert_eq!(from_bytes(b"bplist00"), Err(PlistError::BadMagic));
    }

    #[test]
    fn test_rejects_cycle() {
        let data = assemble(&[&[0xA1, 0]], 0);
        assert_eq!(from_bytes(&data), Err(PlistError::Cycle(0)));
    }

    #[test]
    fn test_rejects_dangling_reference() {
        let data = assemble(&[&[0xA1, 9]], 0);
        assert_eq!(
            from_bytes(&data),
            Err(PlistError::BadReference { index: 9, count: 1 })
        );
    }

    #[test]
    fn test_rejects_non_string_key() {
        let data = assemble(&[&[0xD1, 1, 1], &[0x10, 1]], 0);
        assert!(matches!(from_bytes(&data), Err(PlistError::NonStringKey(_))));
    }

    #[test]
    fn test_rejects_truncated_object() {
        let data = assemble(&[&[0x55, b'a']], 0);
        assert!(matches!(from_bytes(&data), Err(PlistError::Truncated(_))));
    }

    #[test]
    fn test_rejects_exponential_expansion() {
        // Each array holds the next one twice: 27 objects expanding to 2^26 values.
        let levels: Vec<Vec<u8>> = (1..=26u8).map(|next| vec![0xA2, next, next]).collect();
        let mut objects: Vec<&[u8]> = levels.iter().map(Vec::as_slice).collect();
        objects.push(&[0x09]);

        let data = assemble(&objects, 0);
        assert_eq!(
            from_bytes(&data),
            Err(PlistError::TooManyObjects(MIN_OBJECT_BUDGET))
        );
    }

    #[test]
    fn test_shared_references_within_budget() {
        // One string referenced from every slot of a small array.
        let data = assemble(&[&[0xA4, 1, 1, 1, 1], &[0x51, b'x']], 0);
        let value = from_bytes(&data).unwrap();
        assert_eq!(value.as_array().map(<[Value]>::len), Some(4));
    }

    #[test]
    fn test_rejects_top_out_of_range() {
        let data = assemble(&[&[0x08]], 3);
        assert!(matches!(from_bytes(&data), Err(PlistError::BadTrailer(_))));
    }
}
