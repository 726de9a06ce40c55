//! Class file decoding errors.

use clann_core::DecodeError;

/// Errors raised while decoding a class file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassFileError {
    /// The data ended in the middle of a structure.
    #[error("unexpected end of data at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof {
        /// Offset at which the read started.
        offset: usize,
        /// Number of bytes missing.
        needed: usize,
    },

    /// The file does not start with `0xCAFEBABE`.
    #[error("bad magic number 0x{0:08X}")]
    BadMagic(u32),

    /// A constant pool entry has an unknown tag.
    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag {
        /// The tag byte.
        tag: u8,
        /// Constant pool index of the entry.
        index: u16,
    },

    /// A constant pool reference is out of range or points at an unusable slot.
    #[error("invalid constant pool index {0}")]
    BadConstantIndex(u16),

    /// A constant pool reference points at an entry of the wrong kind.
    #[error("constant pool entry {index} is not a {expected} constant")]
    UnexpectedConstant {
        /// Constant pool index.
        index: u16,
        /// Expected constant kind.
        expected: &'static str,
    },

    /// A `CONSTANT_Utf8` entry is not valid modified UTF-8.
    #[error("malformed modified UTF-8 in constant pool entry {0}")]
    BadUtf8(u16),

    /// A type annotation has an unknown `target_type`.
    #[error("unknown type annotation target type 0x{0:02X}")]
    UnknownTargetType(u8),

    /// A type path step has an unknown kind.
    #[error("unknown type path kind {0}")]
    UnknownTypePathKind(u8),

    /// An element value has an unknown tag.
    #[error("unknown element value tag 0x{0:02X}")]
    UnknownElementTag(u8),

    /// Annotation element values are nested too deeply.
    #[error("annotation values nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

impl From<ClassFileError> for DecodeError {
    fn from(err: ClassFileError) -> Self {
        DecodeError::new(err)
    }
}

/// Result alias for class file decoding.
pub type Result<T> = std::result::Result<T, ClassFileError>;
