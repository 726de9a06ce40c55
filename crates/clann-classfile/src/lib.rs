//! # clann-classfile
//!
//! JVM class file decoder for clann.
//!
//! [`ClassFileDecoder`] implements [`clann_core::ClassDecoder`]: it walks the
//! class file structure (JVMS chapter 4) and reports the class header, every
//! field and method declaration, and every annotation, parameter annotation
//! and type annotation found on them, including the type annotations stored
//! inside method bodies.
//!
//! ## Example
//!
//! ```ignore
//! use clann_classfile::ClassFileDecoder;
//! use clann_core::{format_report, ArchiveAnalyzer};
//!
//! let analyzer = ArchiveAnalyzer::builder()
//!     .decoder(ClassFileDecoder::new())
//!     .build()?;
//! let result = analyzer.analyze_path("app.jar".as_ref())?;
//! print!("{}", format_report(&result.classes));
//! ```
//!
//! With the `fixtures` feature, [`ClassFileBuilder`] writes small class files
//! for tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod annotations;
mod constant_pool;
mod decoder;
mod error;
#[cfg(any(test, feature = "fixtures"))]
mod fixture;
mod reader;

pub use decoder::{decode_class, ClassFileDecoder};
pub use error::ClassFileError;
#[cfg(any(test, feature = "fixtures"))]
pub use fixture::{ClassFileBuilder, TypeTarget};
