//! Archive analyzer: decodes and classifies every class entry of an archive.

use crate::classifier::{collect_annotations, InvalidDescriptorPolicy};
use crate::config::{Config, DEFAULT_CLASS_SUFFIX};
use crate::event::{ClassDecoder, DecoderBox};
use crate::ledger::ClassAnnotations;

use rayon::prelude::*;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};
use zip::result::ZipError;
use zip::ZipArchive;

/// Errors that abort the analysis of a whole archive.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum AnalyzerError {
    /// IO error reading the archive.
    #[error("IO error: {0}")]
    #[diagnostic(code(clann::io))]
    Io(#[from] std::io::Error),

    /// The archive file could not be opened.
    #[error("Failed to open archive {path}: {source}")]
    #[diagnostic(code(clann::open))]
    Open {
        /// Path of the archive.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Glob pattern error.
    #[error("Invalid exclude pattern: {0}")]
    #[diagnostic(code(clann::config::exclude))]
    Glob(#[from] glob::PatternError),

    /// No decoder was supplied to the builder.
    #[error("No class file decoder configured")]
    #[diagnostic(code(clann::config::decoder))]
    MissingDecoder,

    /// The worker pool could not be created.
    #[error("Failed to start decoder threads: {0}")]
    #[diagnostic(code(clann::threads))]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// One named entry of an archive, with its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name (e.g. `com/example/Foo.class`).
    pub name: String,
    /// Raw entry bytes.
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// A class entry that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    /// Entry name.
    pub entry: String,
    /// Human-readable reason.
    pub reason: String,
}

impl std::fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.entry, self.reason)
    }
}

/// Result of attempting one class entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// The entry decoded; its ledger is complete.
    Decoded(ClassAnnotations),
    /// The entry failed and was skipped.
    Failed(EntryFailure),
}

/// Result of analyzing one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Ledgers of successfully decoded classes, in archive order.
    pub classes: Vec<ClassAnnotations>,
    /// Class entries that could not be decoded, in archive order.
    pub failures: Vec<EntryFailure>,
    /// Number of archive entries seen, of any kind.
    pub entries_seen: usize,
}

impl AnalysisResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the archive had no entries at all.
    #[must_use]
    pub fn is_empty_archive(&self) -> bool {
        self.entries_seen == 0
    }

    /// Returns true if at least one class entry failed to decode.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Iterates the classes that carry at least one annotation.
    pub fn annotated_classes(&self) -> impl Iterator<Item = &ClassAnnotations> {
        self.classes.iter().filter(|c| !c.is_empty())
    }

    /// Folds one entry outcome into the result.
    #[must_use]
    pub fn record(mut self, outcome: EntryOutcome) -> Self {
        match outcome {
            EntryOutcome::Decoded(ledger) => self.classes.push(ledger),
            EntryOutcome::Failed(failure) => self.failures.push(failure),
        }
        self
    }
}

/// Work item collected while walking an archive.
enum Pending {
    Decode(ArchiveEntry),
    Rejected(EntryFailure),
}

/// Builder for configuring an [`ArchiveAnalyzer`].
#[derive(Default)]
pub struct ArchiveAnalyzerBuilder {
    decoder: Option<DecoderBox>,
    config: Option<Config>,
    class_suffix: Option<String>,
    exclude_patterns: Vec<String>,
    parallelism: Option<usize>,
    policy: Option<InvalidDescriptorPolicy>,
}

impl ArchiveAnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the class file decoder.
    #[must_use]
    pub fn decoder<D: ClassDecoder + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Some(Box::new(decoder));
        self
    }

    /// Sets a boxed class file decoder.
    #[must_use]
    pub fn decoder_box(mut self, decoder: DecoderBox) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Sets the configuration. Explicit builder settings take precedence.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the entry name suffix identifying class files.
    #[must_use]
    pub fn class_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.class_suffix = Some(suffix.into());
        self
    }

    /// Adds an exclude glob pattern over entry names.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets the number of decoder threads (1 decodes on the calling thread).
    #[must_use]
    pub fn parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Sets the invalid descriptor policy.
    #[must_use]
    pub fn on_invalid_descriptor(mut self, policy: InvalidDescriptorPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if no decoder was set, an exclude pattern is invalid,
    /// or the worker pool cannot be started.
    pub fn build(self) -> Result<ArchiveAnalyzer, AnalyzerError> {
        let decoder = self.decoder.ok_or(AnalyzerError::MissingDecoder)?;
        let config = self.config.unwrap_or_default();

        let class_suffix = self
            .class_suffix
            .unwrap_or_else(|| config.analyzer.class_suffix.clone());
        let class_suffix = if class_suffix.is_empty() {
            DEFAULT_CLASS_SUFFIX.to_string()
        } else {
            class_suffix
        };

        // Merge exclude patterns from config
        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.analyzer.exclude.iter().cloned());
        let exclude = exclude_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        let threads = self
            .parallelism
            .or(config.analyzer.parallelism)
            .unwrap_or(1);
        let pool = if threads > 1 {
            debug!("Decoding with {threads} threads");
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("clann-decode-{i}"))
                    .build()?,
            )
        } else {
            None
        };

        Ok(ArchiveAnalyzer {
            decoder,
            class_suffix,
            exclude,
            pool,
            policy: self
                .policy
                .unwrap_or(config.analyzer.on_invalid_descriptor),
        })
    }
}

/// Decodes the class entries of archives and collects their annotations.
///
/// Use [`ArchiveAnalyzer::builder()`] to construct an instance.
pub struct ArchiveAnalyzer {
    decoder: DecoderBox,
    class_suffix: String,
    exclude: Vec<glob::Pattern>,
    pool: Option<rayon::ThreadPool>,
    policy: InvalidDescriptorPolicy,
}

impl ArchiveAnalyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> ArchiveAnalyzerBuilder {
        ArchiveAnalyzerBuilder::new()
    }

    /// Returns the entry name suffix identifying class files.
    #[must_use]
    pub fn class_suffix(&self) -> &str {
        &self.class_suffix
    }

    /// Returns the number of decoder threads.
    #[must_use]
    pub fn parallelism(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, rayon::ThreadPool::current_num_threads)
    }

    /// Returns true if an entry with this name is decoded as a class.
    #[must_use]
    pub fn is_class_entry(&self, name: &str) -> bool {
        if !name.ends_with(&self.class_suffix) {
            return false;
        }
        if self.exclude.iter().any(|p| p.matches(name)) {
            debug!("Excluding: {name}");
            return false;
        }
        true
    }

    /// Analyzes the archive file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn analyze_path(&self, path: &Path) -> Result<AnalysisResult, AnalyzerError> {
        info!("Analyzing archive {}", path.display());

        let file = std::fs::File::open(path).map_err(|e| AnalyzerError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.analyze_archive(std::io::BufReader::new(file))
    }

    /// Analyzes an in-memory archive.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the archive fails.
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<AnalysisResult, AnalyzerError> {
        self.analyze_archive(Cursor::new(bytes))
    }

    /// Analyzes an archive from a non-seekable stream, buffering it first.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the stream fails.
    pub fn analyze_reader<R: Read>(&self, mut reader: R) -> Result<AnalysisResult, AnalyzerError> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        self.analyze_bytes(&buffer)
    }

    /// Analyzes a zip archive.
    ///
    /// A container without a readable zip directory is reported like an
    /// archive with zero entries. Only class entries are opened; one the zip
    /// layer refuses, or whose data is corrupt, is recorded as a failure.
    /// I/O errors from the underlying reader abort the analysis.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the archive fails.
    pub fn analyze_archive<R: Read + Seek>(
        &self,
        reader: R,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let mut archive = match ZipArchive::new(reader) {
            Ok(archive) => archive,
            Err(ZipError::Io(e)) => return Err(AnalyzerError::Io(e)),
            Err(e) => {
                debug!("Not a readable archive: {e}");
                return Ok(self.finish(0, Vec::new()));
            }
        };

        let mut pending = Vec::new();
        for index in 0..archive.len() {
            let Some(name) = archive.name_for_index(index).map(str::to_owned) else {
                continue;
            };
            trace!("got archive entry {name}");
            if !self.is_class_entry(&name) {
                continue;
            }

            let mut file = match archive.by_index(index) {
                Ok(file) => file,
                Err(ZipError::Io(e)) => return Err(AnalyzerError::Io(e)),
                Err(e) => {
                    pending.push(Pending::Rejected(EntryFailure {
                        entry: name,
                        reason: e.to_string(),
                    }));
                    continue;
                }
            };

            let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
            match file.read_to_end(&mut bytes) {
                Ok(_) => pending.push(Pending::Decode(ArchiveEntry { name, bytes })),
                Err(e) => pending.push(Pending::Rejected(EntryFailure {
                    entry: name,
                    reason: format!("Failed to read entry: {e}"),
                })),
            }
        }

        Ok(self.finish(archive.len(), pending))
    }

    /// Analyzes entries that were already read from some container.
    pub fn analyze_entries<I>(&self, entries: I) -> AnalysisResult
    where
        I: IntoIterator<Item = ArchiveEntry>,
    {
        let mut entries_seen = 0;
        let pending: Vec<Pending> = entries
            .into_iter()
            .inspect(|_| entries_seen += 1)
            .filter(|entry| self.is_class_entry(&entry.name))
            .map(Pending::Decode)
            .collect();

        self.finish(entries_seen, pending)
    }

    /// Decodes and classifies one class entry.
    #[must_use]
    pub fn analyze_entry(&self, entry: &ArchiveEntry) -> EntryOutcome {
        debug!("Analyzing: {}", entry.name);

        let decoded = self
            .decoder
            .decode(&entry.bytes)
            .map_err(|e| e.to_string())
            .and_then(|events| collect_annotations(events, self.policy).map_err(|e| e.to_string()));

        match decoded {
            Ok(ledger) => EntryOutcome::Decoded(ledger),
            Err(reason) => EntryOutcome::Failed(EntryFailure {
                entry: entry.name.clone(),
                reason,
            }),
        }
    }

    fn resolve(&self, pending: Pending) -> EntryOutcome {
        match pending {
            Pending::Decode(entry) => self.analyze_entry(&entry),
            Pending::Rejected(failure) => EntryOutcome::Failed(failure),
        }
    }

    fn finish(&self, entries_seen: usize, pending: Vec<Pending>) -> AnalysisResult {
        let outcomes: Vec<EntryOutcome> = match &self.pool {
            Some(pool) => pool.install(|| pending.into_par_iter().map(|p| self.resolve(p)).collect()),
            None => pending.into_iter().map(|p| self.resolve(p)).collect(),
        };

        let result = outcomes.into_iter().fold(
            AnalysisResult {
                entries_seen,
                ..AnalysisResult::new()
            },
            AnalysisResult::record,
        );

        if result.is_empty_archive() {
            error!(
                "Failed to parse archive. Found zero entries in archive. Check that the \
                 archive is valid and has one or more class files."
            );
        } else {
            if result.has_failures() {
                let failed: Vec<String> = result.failures.iter().map(ToString::to_string).collect();
                warn!(
                    "Failed to parse annotations from {} class file(s): [{}]",
                    result.failures.len(),
                    failed.join(", ")
                );
            }

            info!(
                "Parsed annotations from {} class file(s) out of {} archive entries",
                result.classes.len(),
                result.entries_seen
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Annotation, ClassEvent, DecodeError, TypePath, TypeRefSort};
    use crate::level::AnnotationLevel;
    use std::io::Write;

    /// Decodes a line-oriented text script into events.
    ///
    /// `class a/B`, `field f`, `method m`, `ann Lx;`, `type <sort byte> Lx;`,
    /// `param <n> Lx;`; any line starting with `fail` makes decoding fail.
    struct ScriptDecoder;

    impl ClassDecoder for ScriptDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<Vec<ClassEvent>, DecodeError> {
            let text = std::str::from_utf8(bytes).map_err(DecodeError::new)?;
            let mut events = Vec::new();
            for line in text.lines() {
                let parts: Vec<&str> = line.split_whitespace().collect();
                let event = match parts.as_slice() {
                    ["class", name] => ClassEvent::Class {
                        name: (*name).to_string(),
                    },
                    ["field", name] => ClassEvent::Field {
                        name: (*name).to_string(),
                    },
                    ["method", name] => ClassEvent::Method {
                        name: (*name).to_string(),
                    },
                    ["ann", d] => ClassEvent::Annotation(Annotation::visible(*d)),
                    ["type", sort, d] => ClassEvent::TypeAnnotation {
                        sort: TypeRefSort::from_target_type(sort.parse().unwrap()).unwrap(),
                        type_path: TypePath::empty(),
                        annotation: Annotation::visible(*d),
                    },
                    ["param", n, d] => ClassEvent::ParameterAnnotation {
                        parameter: n.parse().unwrap(),
                        annotation: Annotation::visible(*d),
                    },
                    _ => return Err(DecodeError::new(format!("bad line: {line}"))),
                };
                events.push(event);
            }
            Ok(events)
        }
    }

    fn analyzer() -> ArchiveAnalyzer {
        ArchiveAnalyzer::builder()
            .decoder(ScriptDecoder)
            .build()
            .expect("Failed to build analyzer")
    }

    fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn stored_zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// Rewrites the compression method of `name` in both its local and
    /// central directory headers.
    fn set_compression_method(archive: &mut [u8], name: &str, method: u16) {
        let u16_at = |a: &[u8], i: usize| usize::from(u16::from_le_bytes([a[i], a[i + 1]]));
        let mut patched = 0;
        for i in 0..archive.len().saturating_sub(46) {
            let (name_len_at, name_at, method_at) = match archive[i..i + 4] {
                [0x50, 0x4B, 0x03, 0x04] => (26, 30, 8),
                [0x50, 0x4B, 0x01, 0x02] => (28, 46, 10),
                _ => continue,
            };
            let len = u16_at(archive, i + name_len_at);
            if &archive[i + name_at..i + name_at + len] == name.as_bytes() {
                archive[i + method_at..i + method_at + 2].copy_from_slice(&method.to_le_bytes());
                patched += 1;
            }
        }
        assert_eq!(patched, 2, "headers of {name} not found");
    }

    const GOOD: &str = "class com/example/Good\nann Ljava/lang/Deprecated;\nfield f\ntype 19 Lcom/example/NonNull;\n";

    #[test]
    fn test_builder_requires_decoder() {
        let err = ArchiveAnalyzer::builder().build().err().unwrap();
        assert!(matches!(err, AnalyzerError::MissingDecoder));
    }

    #[test]
    fn test_builder_rejects_bad_exclude_pattern() {
        let err = ArchiveAnalyzer::builder()
            .decoder(ScriptDecoder)
            .exclude("[")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AnalyzerError::Glob(_)));
    }

    #[test]
    fn test_builder_settings_override_config() {
        let mut config = Config::default();
        config.analyzer.class_suffix = ".klass".into();
        config.analyzer.parallelism = Some(2);

        let from_config = ArchiveAnalyzer::builder()
            .decoder(ScriptDecoder)
            .config(config.clone())
            .build()
            .unwrap();
        assert_eq!(from_config.class_suffix(), ".klass");
        assert_eq!(from_config.parallelism(), 2);

        let overridden = ArchiveAnalyzer::builder()
            .decoder(ScriptDecoder)
            .config(config)
            .class_suffix(".class")
            .parallelism(1)
            .build()
            .unwrap();
        assert_eq!(overridden.class_suffix(), ".class");
        assert_eq!(overridden.parallelism(), 1);
    }

    #[test]
    fn test_exclude_patterns() {
        let analyzer = ArchiveAnalyzer::builder()
            .decoder(ScriptDecoder)
            .exclude("META-INF/versions/**")
            .exclude("module-info.class")
            .build()
            .unwrap();

        assert!(analyzer.is_class_entry("com/example/Foo.class"));
        assert!(!analyzer.is_class_entry("META-INF/versions/11/com/example/Foo.class"));
        assert!(!analyzer.is_class_entry("module-info.class"));
        assert!(!analyzer.is_class_entry("META-INF/MANIFEST.MF"));
        assert!(!analyzer.is_class_entry("com/example/"));
    }

    #[test]
    fn single_class_with_class_and_field_type_use_annotations() {
        let bytes = zip_of(&[("com/example/Good.class", GOOD)]);
        let result = analyzer().analyze_bytes(&bytes).unwrap();

        assert_eq!(result.entries_seen, 1);
        assert!(result.failures.is_empty());
        assert_eq!(result.classes.len(), 1);

        let class = &result.classes[0];
        assert_eq!(class.class_name(), "com.example.Good");
        assert_eq!(class.len(), 2);

        let deprecated = class.get("@java.lang.Deprecated").unwrap();
        assert_eq!(deprecated.levels().collect::<Vec<_>>(), vec![AnnotationLevel::Class]);
        let non_null = class.get("@com.example.NonNull").unwrap();
        assert_eq!(
            non_null.levels().collect::<Vec<_>>(),
            vec![AnnotationLevel::FieldTypeUse]
        );
    }

    #[test]
    fn malformed_entry_is_recorded_and_skipped() {
        let bytes = zip_of(&[
            ("com/example/Bad.class", "fail here\n"),
            ("com/example/Good.class", GOOD),
        ]);
        let result = analyzer().analyze_bytes(&bytes).unwrap();

        assert_eq!(result.classes.len(), 1);
        assert_eq!(result.classes[0].class_name(), "com.example.Good");
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].entry, "com/example/Bad.class");
        assert_eq!(
            result.failures[0].reason,
            "Failed to parse class file content: bad line: fail here"
        );
    }

    #[test]
    fn invalid_descriptor_fails_the_entry() {
        let bytes = zip_of(&[
            ("a/Bad.class", "class a/Bad\nann java/lang/Deprecated\n"),
            ("a/Good.class", GOOD),
        ]);
        let result = analyzer().analyze_bytes(&bytes).unwrap();

        assert_eq!(result.classes.len(), 1);
        assert_eq!(
            result.failures[0].to_string(),
            "a/Bad.class: Not a valid annotation descriptor: java/lang/Deprecated"
        );
    }

    #[test]
    fn invalid_descriptor_can_be_skipped_per_occurrence() {
        let analyzer = ArchiveAnalyzer::builder()
            .decoder(ScriptDecoder)
            .on_invalid_descriptor(InvalidDescriptorPolicy::SkipOccurrence)
            .build()
            .unwrap();
        let bytes = zip_of(&[(
            "a/Bad.class",
            "class a/Bad\nann java/lang/Deprecated\nann La/Marker;\n",
        )]);
        let result = analyzer.analyze_bytes(&bytes).unwrap();

        assert!(result.failures.is_empty());
        assert_eq!(result.classes.len(), 1);
        assert!(result.classes[0].get("@a.Marker").is_some());
    }

    #[test]
    fn non_class_entries_are_seen_but_not_reported() {
        let bytes = zip_of(&[
            ("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\n"),
            ("readme.txt", "fail\n"),
            ("com/example/Good.class", GOOD),
        ]);
        let result = analyzer().analyze_bytes(&bytes).unwrap();

        assert_eq!(result.entries_seen, 3);
        assert_eq!(result.classes.len(), 1);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn only_class_entries_are_opened() {
        let mut bytes = stored_zip_of(&[
            ("README.txt", "read me\n"),
            ("a/Refused.class", "class a/Refused\n"),
            ("a/Good.class", GOOD),
        ]);
        set_compression_method(&mut bytes, "README.txt", 12);
        set_compression_method(&mut bytes, "a/Refused.class", 12);

        let result = analyzer().analyze_bytes(&bytes).unwrap();

        assert_eq!(result.entries_seen, 3);
        assert_eq!(result.classes.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].entry, "a/Refused.class");
    }

    #[test]
    fn resource_the_zip_layer_refuses_is_not_a_failure() {
        let mut bytes = stored_zip_of(&[("README.txt", "read me\n")]);
        set_compression_method(&mut bytes, "README.txt", 12);

        let result = analyzer().analyze_bytes(&bytes).unwrap();

        assert!(!result.is_empty_archive());
        assert!(!result.has_failures());
    }

    #[test]
    fn corrupt_entry_data_fails_only_that_entry() {
        let mut bytes = stored_zip_of(&[
            ("a/Good.class", GOOD),
            ("a/Bad.class", "class a/Bad\nann La/Marker;\n"),
        ]);
        let payload = b"ann La/Marker;";
        let at = bytes
            .windows(payload.len())
            .position(|w| w == payload)
            .unwrap();
        bytes[at + 4] ^= 0x20;

        let result = analyzer().analyze_bytes(&bytes).unwrap();

        assert_eq!(result.classes.len(), 1);
        assert_eq!(result.classes[0].class_name(), "com.example.Good");
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].entry, "a/Bad.class");
        assert!(result.failures[0].reason.starts_with("Failed to read entry"));
    }

    #[test]
    fn empty_archive_is_not_fatal() {
        let bytes = zip_of(&[]);
        let result = analyzer().analyze_bytes(&bytes).unwrap();
        assert!(result.is_empty_archive());
        assert!(result.classes.is_empty());
        assert!(result.failures.is_empty());
    }

    #[test]
    fn garbage_is_reported_as_empty_archive() {
        let result = analyzer().analyze_bytes(b"definitely not a zip file").unwrap();
        assert!(result.is_empty_archive());
        assert!(result.classes.is_empty());
    }

    #[test]
    fn archive_with_only_resources_is_not_empty() {
        let bytes = zip_of(&[("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\n")]);
        let result = analyzer().analyze_bytes(&bytes).unwrap();
        assert!(!result.is_empty_archive());
        assert!(result.classes.is_empty());
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = analyzer()
            .analyze_path(Path::new("/nonexistent/archive.jar"))
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Open { .. }));
    }

    #[test]
    fn reader_input_is_buffered() {
        let bytes = zip_of(&[("com/example/Good.class", GOOD)]);
        let result = analyzer().analyze_reader(bytes.as_slice()).unwrap();
        assert_eq!(result.classes.len(), 1);
    }

    #[test]
    fn entries_can_be_analyzed_without_a_container() {
        let result = analyzer().analyze_entries(vec![
            ArchiveEntry::new("x/Empty.class", "class x/Empty\n"),
            ArchiveEntry::new("x/Broken.class", "fail\n"),
            ArchiveEntry::new("notes.md", "fail\n"),
        ]);

        assert_eq!(result.entries_seen, 3);
        assert_eq!(result.classes.len(), 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.annotated_classes().count(), 0);
    }

    #[test]
    fn parallel_decoding_matches_sequential_order() {
        let mut entries = Vec::new();
        for i in 0..64 {
            let content = if i % 7 == 0 {
                "fail\n".to_string()
            } else {
                format!("class p/C{i}\nmethod m\nparam 0 Lp/A{i};\n")
            };
            entries.push(ArchiveEntry::new(format!("p/C{i}.class"), content));
        }

        let sequential = analyzer().analyze_entries(entries.clone());
        let parallel = ArchiveAnalyzer::builder()
            .decoder(ScriptDecoder)
            .parallelism(4)
            .build()
            .unwrap()
            .analyze_entries(entries);

        assert_eq!(sequential, parallel);
        assert_eq!(parallel.failures.len(), 10);
        assert_eq!(parallel.classes[0].class_name(), "p.C1");
    }

    #[test]
    fn record_folds_outcomes() {
        let result = AnalysisResult::new()
            .record(EntryOutcome::Decoded(ClassAnnotations::new()))
            .record(EntryOutcome::Failed(EntryFailure {
                entry: "a.class".into(),
                reason: "boom".into(),
            }));
        assert_eq!(result.classes.len(), 1);
        assert!(result.has_failures());
    }
}
