use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use thiserror::Error;

use crate::metadata::Value;

const NAME_KEY: &str = "name";
const FILES_KEY: &str = "files";
const LENGTH_KEY: &str = "length";
const PATH_KEY: &str = "path";

/// 20-byte torrent identifier, rendered as 40 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InfoHash(pub [u8; 20]);

impl InfoHash {
    /// SHA-1 of the raw info dictionary, i.e. the hash peers announce.
    pub fn of_metadata(raw: &[u8]) -> Self {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&Sha1::digest(raw));
        InfoHash(hash)
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[derive(Error, Debug)]
#[error("invalid info hash {input:?}: {source}")]
pub struct ParseInfoHashError {
    input: String,
    source: hex::FromHexError,
}

impl FromStr for InfoHash {
    type Err = ParseInfoHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut hash = [0u8; 20];
        hex::decode_to_slice(s, &mut hash).map_err(|source| ParseInfoHashError {
            input: s.to_string(),
            source,
        })?;
        Ok(InfoHash(hash))
    }
}

impl TryFrom<String> for InfoHash {
    type Error = ParseInfoHashError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<InfoHash> for String {
    fn from(hash: InfoHash) -> Self {
        hash.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Path segments, never empty.
    pub path: Vec<String>,
    pub length: u64,
}

/// Exactly one of `files` or `length`, flattened into the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileLayout {
    MultiFile { files: Vec<File> },
    SingleFile { length: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentRecord {
    #[serde(rename = "infohash")]
    pub info_hash: InfoHash,
    pub name: String,
    #[serde(flatten)]
    pub layout: FileLayout,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("metadata is not a dictionary")]
    NotADictionary,

    #[error("key not found: {0}")]
    MissingKey(&'static str),

    #[error("wrong type for {key}: expected {expected}, found {found}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("torrent name is empty")]
    EmptyName,

    #[error("file entry {0} has an empty path")]
    EmptyPath(usize),

    #[error("negative length: {0}")]
    NegativeLength(i64),

    #[error("both files and length are present")]
    AmbiguousLayout,

    #[error("neither files nor length is present")]
    MissingLayout,
}

/// Typed accessors over the loose metadata tree.
trait MetadataDecodable<'a>: Sized {
    fn decode(v: &'a Value) -> Result<Self, ValidationError>;

    fn get_struct(v: &'a Value) -> Result<&'a BTreeMap<Vec<u8>, Value>, ValidationError> {
        match v {
            Value::Dict(dict_map) => Ok(dict_map),
            _ => Err(ValidationError::NotADictionary),
        }
    }

    fn get_struct_value(
        key: &'static str,
        dict_map: &'a BTreeMap<Vec<u8>, Value>,
    ) -> Result<&'a Value, ValidationError> {
        dict_map
            .get(key.as_bytes())
            .ok_or(ValidationError::MissingKey(key))
    }

    fn get_u64(key: &'static str, v: &'a Value) -> Result<u64, ValidationError> {
        match v {
            Value::Integer(num) => {
                u64::try_from(*num).map_err(|_| ValidationError::NegativeLength(*num))
            }
            other => Err(wrong_type(key, "integer", other)),
        }
    }

    fn get_string(key: &'static str, v: &'a Value) -> Result<Cow<'a, str>, ValidationError> {
        match v {
            Value::Bytes(bytes) => Ok(String::from_utf8_lossy(bytes)),
            other => Err(wrong_type(key, "byte string", other)),
        }
    }

    fn get_list(key: &'static str, v: &'a Value) -> Result<&'a [Value], ValidationError> {
        match v {
            Value::List(list) => Ok(list.as_slice()),
            other => Err(wrong_type(key, "list", other)),
        }
    }
}

fn wrong_type(key: &'static str, expected: &'static str, found: &Value) -> ValidationError {
    ValidationError::WrongType {
        key,
        expected,
        found: found.kind(),
    }
}

impl<'a> MetadataDecodable<'a> for File {
    fn decode(v: &'a Value) -> Result<Self, ValidationError> {
        let dict_map = match v {
            Value::Dict(dict_map) => dict_map,
            other => return Err(wrong_type(FILES_KEY, "dictionary", other)),
        };

        let path = Self::get_list(PATH_KEY, Self::get_struct_value(PATH_KEY, dict_map)?)?
            .iter()
            .map(|segment| Self::get_string(PATH_KEY, segment).map(Cow::into_owned))
            .collect::<Result<Vec<_>, _>>()?;
        let length = Self::get_u64(LENGTH_KEY, Self::get_struct_value(LENGTH_KEY, dict_map)?)?;

        Ok(Self { path, length })
    }
}

impl<'a> MetadataDecodable<'a> for FileLayout {
    fn decode(v: &'a Value) -> Result<Self, ValidationError> {
        Self::get_struct(v)?;

        match (v.get(FILES_KEY), v.get(LENGTH_KEY)) {
            (Some(_), Some(_)) => Err(ValidationError::AmbiguousLayout),
            (None, None) => Err(ValidationError::MissingLayout),
            (Some(files), None) => {
                let files = Self::get_list(FILES_KEY, files)?
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| {
                        let file = File::decode(entry)?;
                        if file.path.is_empty() {
                            return Err(ValidationError::EmptyPath(i));
                        }
                        Ok(file)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FileLayout::MultiFile { files })
            }
            (None, Some(length)) => Ok(FileLayout::SingleFile {
                length: Self::get_u64(LENGTH_KEY, length)?,
            }),
        }
    }
}

struct Info {
    name: String,
    layout: FileLayout,
}

impl<'a> MetadataDecodable<'a> for Info {
    fn decode(v: &'a Value) -> Result<Self, ValidationError> {
        let dict_map = Self::get_struct(v)?;

        let name = Self::get_string(NAME_KEY, Self::get_struct_value(NAME_KEY, dict_map)?)?;
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let layout = FileLayout::decode(v)?;

        Ok(Self {
            name: name.into_owned(),
            layout,
        })
    }
}

/// Validates a decoded info dictionary and shapes it into a [`TorrentRecord`].
///
/// Only `name` and one of `files`/`length` are read; every other key is ignored.
/// File order and path segment order are kept as found.
pub fn normalize(info_hash: InfoHash, metadata: &Value) -> Result<TorrentRecord, ValidationError> {
    let Info { name, layout } = Info::decode(metadata)?;
    Ok(TorrentRecord {
        info_hash,
        name,
        layout,
    })
}

impl TorrentRecord {
    pub fn files(&self) -> Option<&[File]> {
        match &self.layout {
            FileLayout::MultiFile { files } => Some(files),
            FileLayout::SingleFile { .. } => None,
        }
    }

    /// Declared length of a single-file torrent.
    pub fn length(&self) -> Option<u64> {
        match self.layout {
            FileLayout::SingleFile { length } => Some(length),
            FileLayout::MultiFile { .. } => None,
        }
    }

    pub fn total_size(&self) -> u64 {
        match &self.layout {
            FileLayout::SingleFile { length } => *length,
            FileLayout::MultiFile { files } => files.iter().map(|f| f.length).sum(),
        }
    }
}
