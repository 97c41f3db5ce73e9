use std::fmt;

use crate::util::{Result, Status};

/// Byte appended to a column family name to form its key prefix.
///
/// It is forbidden inside column family names, which keeps the set of
/// prefixes prefix-free: no family's prefix can start another family's
/// prefix, so physical keys from different families never collide.
pub const CF_SEPARATOR: u8 = b'_';

/// Physical key prefix of one column family: `UTF8(name) ++ 0x5F`
///
/// Computed once when a column family is registered and then shared by every
/// iterator bound to it. The physical layout is part of the on-disk format
/// and must stay bit-exact:
///
/// ```text
/// physical_key = cf_name || '_' || logical_key
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CfPrefix {
    bytes: Box<[u8]>,
}

impl CfPrefix {
    /// Build the prefix for `cf`, rejecting names the codec cannot keep apart
    pub fn new(cf: &str) -> Result<Self> {
        validate_cf_name(cf)?;
        Ok(Self::new_unchecked(cf))
    }

    pub(crate) fn new_unchecked(cf: &str) -> Self {
        let mut bytes = Vec::with_capacity(cf.len() + 1);
        bytes.extend_from_slice(cf.as_bytes());
        bytes.push(CF_SEPARATOR);
        CfPrefix {
            bytes: bytes.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length of the prefix in bytes, i.e. the number of bytes `decode` strips
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `prefix ++ key`
    pub fn encode(&self, key: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.bytes.len() + key.len());
        self.encode_into(key, &mut buf);
        buf
    }

    /// Encode into a caller buffer, reusing its allocation
    pub fn encode_into(&self, key: &[u8], dst: &mut Vec<u8>) {
        dst.clear();
        dst.extend_from_slice(&self.bytes);
        dst.extend_from_slice(key);
    }

    /// Strip the prefix from a physical key produced by this family
    #[inline]
    pub fn decode<'a>(&self, physical: &'a [u8]) -> &'a [u8] {
        decode_key(physical, self.bytes.len())
    }

    /// Does `physical` belong to this column family?
    #[inline]
    pub fn covers(&self, physical: &[u8]) -> bool {
        physical.starts_with(&self.bytes)
    }

    /// Does `physical` carry `prefix ++ extra`?
    #[inline]
    pub fn covers_with(&self, physical: &[u8], extra: &[u8]) -> bool {
        self.covers(physical) && physical[self.bytes.len()..].starts_with(extra)
    }

    /// Smallest byte string ordered after every key of this family
    ///
    /// The separator is never 0xFF, so bumping the last byte cannot carry.
    pub fn upper_bound(&self) -> Vec<u8> {
        let mut bound = self.bytes.to_vec();
        if let Some(last) = bound.last_mut() {
            *last += 1;
        }
        bound
    }
}

impl fmt::Debug for CfPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CfPrefix(\"{}\")", String::from_utf8_lossy(&self.bytes))
    }
}

/// Column family names must be non-empty and must not contain the separator
pub fn validate_cf_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Status::invalid_argument(
            "column family name must not be empty",
        ));
    }
    if name.as_bytes().contains(&CF_SEPARATOR) {
        return Err(Status::invalid_argument(format!(
            "column family name {name:?} contains the separator '{}'",
            CF_SEPARATOR as char
        )));
    }
    Ok(())
}

/// `UTF8(cf) ++ '_' ++ key`
pub fn encode_key(cf: &str, key: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(cf.len() + 1 + key.len());
    buf.extend_from_slice(cf.as_bytes());
    buf.push(CF_SEPARATOR);
    buf.extend_from_slice(key);
    buf
}

/// `physical[prefix_len..]`
///
/// The caller supplies the prefix length of the family the key was read
/// through. A length past the end of the key yields an empty slice.
#[inline]
pub fn decode_key(physical: &[u8], prefix_len: usize) -> &[u8] {
    physical.get(prefix_len..).unwrap_or_default()
}
