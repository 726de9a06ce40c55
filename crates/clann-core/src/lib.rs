//! # clann-core
//!
//! Core of clann, a JAR annotation usage analyzer.
//!
//! This crate classifies where annotations are attached inside compiled
//! classes. It includes:
//!
//! - [`AnnotationLevel`], the closed taxonomy of attachment sites
//! - [`ClassAnnotations`], the per-class ledger of annotation names and levels
//! - [`ClassEvent`] and the [`ClassDecoder`] trait consumed from a class file decoder
//! - [`Classifier`], which maps events onto levels
//! - [`ArchiveAnalyzer`] for decoding every class entry of an archive
//! - [`format_report`] for the plain-text report
//!
//! ## Example
//!
//! ```ignore
//! use clann_core::{format_report, ArchiveAnalyzer};
//!
//! let analyzer = ArchiveAnalyzer::builder()
//!     .decoder(MyDecoder::new())
//!     .build()?;
//!
//! let result = analyzer.analyze_path("app.jar".as_ref())?;
//! print!("{}", format_report(&result.classes));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod classifier;
mod config;
mod event;
mod ledger;
mod level;
mod report;

pub use analyzer::{
    AnalysisResult, AnalyzerError, ArchiveAnalyzer, ArchiveAnalyzerBuilder, ArchiveEntry,
    EntryFailure, EntryOutcome,
};
pub use classifier::{collect_annotations, Classifier, ClassifyError, InvalidDescriptorPolicy, Scope};
pub use config::{AnalyzerConfig, Config, ConfigError, DEFAULT_CLASS_SUFFIX};
pub use event::{
    Annotation, ClassDecoder, ClassEvent, DecodeError, DecoderBox, LocalVariableRange, TypePath,
    TypePathStep, TypeRefSort,
};
pub use ledger::{AnnotationDetails, AnnotationName, ClassAnnotations, DescriptorError};
pub use level::AnnotationLevel;
pub use report::format_report;
