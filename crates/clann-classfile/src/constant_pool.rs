//! Constant pool parsing.

use tracing::trace;

use crate::error::{ClassFileError, Result};
use crate::reader::ByteReader;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Constant {
    /// Index 0 and the upper half of long/double entries.
    Unusable,
    Utf8(String),
    Class { name_index: u16 },
    /// Any constant whose payload the decoder never needs.
    Other,
}

/// The constant pool of one class file.
#[derive(Debug, Clone)]
pub(crate) struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Reads `constant_pool_count` and the entries that follow it.
    pub(crate) fn parse(r: &mut ByteReader<'_>) -> Result<Self> {
        let count = r.u16()?;
        let mut entries = Vec::with_capacity(usize::from(count));
        entries.push(Constant::Unusable);

        let mut index: u16 = 1;
        while index < count {
            let tag = r.u8()?;
            let constant = match tag {
                TAG_UTF8 => {
                    let len = r.u16()?;
                    let bytes = r.bytes(usize::from(len))?;
                    Constant::Utf8(decode_modified_utf8(bytes).ok_or(ClassFileError::BadUtf8(index))?)
                }
                TAG_CLASS => Constant::Class {
                    name_index: r.u16()?,
                },
                TAG_STRING | TAG_METHOD_TYPE | TAG_MODULE | TAG_PACKAGE => {
                    r.skip(2)?;
                    Constant::Other
                }
                TAG_METHOD_HANDLE => {
                    r.skip(3)?;
                    Constant::Other
                }
                TAG_INTEGER
                | TAG_FLOAT
                | TAG_FIELDREF
                | TAG_METHODREF
                | TAG_INTERFACE_METHODREF
                | TAG_NAME_AND_TYPE
                | TAG_DYNAMIC
                | TAG_INVOKE_DYNAMIC => {
                    r.skip(4)?;
                    Constant::Other
                }
                TAG_LONG | TAG_DOUBLE => {
                    r.skip(8)?;
                    entries.push(Constant::Other);
                    index = index.saturating_add(1);
                    Constant::Unusable
                }
                _ => return Err(ClassFileError::UnknownConstantTag { tag, index }),
            };
            entries.push(constant);
            index = index.saturating_add(1);
        }

        trace!(count, "Parsed constant pool");
        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant> {
        match self.entries.get(usize::from(index)) {
            None | Some(Constant::Unusable) => Err(ClassFileError::BadConstantIndex(index)),
            Some(constant) => Ok(constant),
        }
    }

    /// Resolves a `CONSTANT_Utf8` entry.
    pub(crate) fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Utf8",
            }),
        }
    }

    /// Resolves a `CONSTANT_Class` entry to its binary name.
    pub(crate) fn class_name(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Class",
            }),
        }
    }
}

/// Decodes the JVM's modified UTF-8 (two-byte NUL, surrogate pairs encoded
/// separately). Unpaired surrogates are replaced with U+FFFD.
fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();

    while let Some(b) = iter.next() {
        let unit = match b {
            0x00..=0x7F => u16::from(b),
            0xC0..=0xDF => {
                let b2 = continuation(iter.next())?;
                (u16::from(b & 0x1F) << 6) | b2
            }
            0xE0..=0xEF => {
                let b2 = continuation(iter.next())?;
                let b3 = continuation(iter.next())?;
                (u16::from(b & 0x0F) << 12) | (b2 << 6) | b3
            }
            _ => return None,
        };
        units.push(unit);
    }

    Some(String::from_utf16_lossy(&units))
}

fn continuation(byte: Option<u8>) -> Option<u16> {
    match byte {
        Some(b) if b & 0xC0 == 0x80 => Some(u16::from(b & 0x3F)),
        _ => None,
    }
}
