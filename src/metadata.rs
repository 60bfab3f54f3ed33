use std::collections::BTreeMap;

use bencode::streaming::Error as BencStreamingError;
use bencode::Bencode;
use thiserror::Error;

/// Deepest list/dictionary nesting accepted from a peer.
pub const MAX_DEPTH: usize = 64;

/// Loosely typed metadata tree, decoded once from the raw bencoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bytes(Vec<u8>),
    Integer(i64),
    List(Vec<Value>),
    Dict(BTreeMap<Vec<u8>, Value>),
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed metadata: {0}")]
    Malformed(#[from] BStreamingError),

    #[error("metadata is empty")]
    Empty,

    #[error("metadata is not a dictionary")]
    NotADictionary,

    #[error("integer at offset {0} does not fit in 64 bits")]
    IntegerOverflow(usize),

    #[error("byte string at offset {0} runs past the end of the metadata")]
    Truncated(usize),

    #[error("metadata nests deeper than {0} levels")]
    TooDeep(usize),
}

/// Wrapper for `streaming::Error`, which has no `Display` of its own.
#[derive(Debug)]
pub struct BStreamingError(BencStreamingError);

impl std::fmt::Display for BStreamingError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl std::error::Error for BStreamingError {}

impl From<BencStreamingError> for BStreamingError {
    fn from(err: BencStreamingError) -> Self {
        BStreamingError(err)
    }
}

/// Decodes a raw info dictionary. The top level must be a dictionary.
///
/// The bytes are scanned for oversized integers and excessive nesting before
/// they reach the parser, which checks neither.
pub fn decode(raw: &[u8]) -> Result<Value, DecodeError> {
    scan(raw)?;
    let bencode = bencode::from_buffer(raw).map_err(BStreamingError::from)?;
    match from_bencode(bencode)? {
        dict @ Value::Dict(_) => Ok(dict),
        _ => Err(DecodeError::NotADictionary),
    }
}

/// Walks the token stream without recursion. Input the parser would reject
/// anyway ends the scan early and is left to the parser to report.
fn scan(raw: &[u8]) -> Result<(), DecodeError> {
    let mut depth = 0;
    let mut pos = 0;

    while pos < raw.len() {
        match raw[pos] {
            b'l' | b'd' => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(DecodeError::TooDeep(MAX_DEPTH));
                }
                pos += 1;
            }
            b'e' => {
                if depth <= 1 {
                    return Ok(());
                }
                depth -= 1;
                pos += 1;
            }
            b'i' => match scan_number(raw, pos + 1, b'e', true)? {
                Some((_, end)) => pos = end + 1,
                None => return Ok(()),
            },
            b'0'..=b'9' => match scan_number(raw, pos, b':', false)? {
                Some((len, colon)) => {
                    let remaining = raw.len() - colon - 1;
                    if len > remaining as u64 {
                        return Err(DecodeError::Truncated(pos));
                    }
                    pos = colon + 1 + len as usize;
                }
                None => return Ok(()),
            },
            _ => return Ok(()),
        }

        if depth == 0 {
            return Ok(());
        }
    }
    Ok(())
}

/// Reads decimal digits from `start` up to `terminator`, returning the magnitude
/// and the terminator's offset. `None` when the token is not a well-formed number.
fn scan_number(
    raw: &[u8],
    start: usize,
    terminator: u8,
    signed: bool,
) -> Result<Option<(u64, usize)>, DecodeError> {
    let mut pos = start;
    if signed && raw.get(pos) == Some(&b'-') {
        pos += 1;
    }

    let mut value: u64 = 0;
    while let Some(&b) = raw.get(pos) {
        match b {
            b'0'..=b'9' => {
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(u64::from(b - b'0')))
                    .filter(|v| *v <= i64::MAX as u64)
                    .ok_or(DecodeError::IntegerOverflow(start))?;
                pos += 1;
            }
            b if b == terminator => return Ok(Some((value, pos))),
            _ => return Ok(None),
        }
    }
    Ok(None)
}

fn from_bencode(b: Bencode) -> Result<Value, DecodeError> {
    match b {
        Bencode::Empty => Err(DecodeError::Empty),
        Bencode::Number(num) => Ok(Value::Integer(num)),
        Bencode::ByteString(bytes) => Ok(Value::Bytes(bytes)),
        Bencode::List(list) => list
            .into_iter()
            .map(from_bencode)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Bencode::Dict(dict_map) => dict_map
            .into_iter()
            .map(|(key, value)| Ok((key.as_slice().to_vec(), from_bencode(value)?)))
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Value::Dict),
    }
}

impl Value {
    /// Dictionary lookup by a textual key; `None` for missing keys or non-dictionaries.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Dict(dict_map) => dict_map.get(key.as_bytes()),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bytes(_) => "byte string",
            Value::Integer(_) => "integer",
            Value::List(_) => "list",
            Value::Dict(_) => "dictionary",
        }
    }
}
