//! Per-class annotation ledger.
//!
//! A [`ClassAnnotations`] records, for one decoded class, which annotations
//! were seen and at which [`AnnotationLevel`]s. Annotation names are derived
//! from raw JVM field descriptors (`Lcom/example/Marker;` becomes
//! `@com.example.Marker`).

use std::collections::{BTreeMap, BTreeSet};

use crate::level::AnnotationLevel;

/// Errors raised when an annotation descriptor cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum DescriptorError {
    /// The descriptor is not of the form `L<name>;`.
    #[error("Not a valid annotation descriptor: {0}")]
    #[diagnostic(
        code(clann::descriptor),
        help("annotation descriptors must start with 'L' and end with ';'")
    )]
    Invalid(String),
}

/// A normalized, dot-qualified annotation name such as `@java.lang.Deprecated`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnnotationName(String);

impl AnnotationName {
    /// Normalizes a raw annotation descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Invalid`] unless the descriptor starts with
    /// `L` and ends with `;`.
    pub fn from_descriptor(descriptor: &str) -> Result<Self, DescriptorError> {
        let inner = descriptor
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
            .ok_or_else(|| DescriptorError::Invalid(descriptor.to_owned()))?;

        Ok(Self(format!("@{}", inner.replace('/', "."))))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AnnotationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for AnnotationName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The set of levels at which one annotation was seen in one class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationDetails {
    levels: BTreeSet<AnnotationLevel>,
}

impl AnnotationDetails {
    /// Iterates the levels in taxonomy order.
    pub fn levels(&self) -> impl Iterator<Item = AnnotationLevel> + '_ {
        self.levels.iter().copied()
    }

    /// Returns true if the annotation was seen at `level`.
    #[must_use]
    pub fn contains(&self, level: AnnotationLevel) -> bool {
        self.levels.contains(&level)
    }

    /// Number of distinct levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns true if no level has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    fn insert(&mut self, level: AnnotationLevel) {
        self.levels.insert(level);
    }
}

impl std::fmt::Display for AnnotationDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, level) in self.levels.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{level}")?;
        }
        f.write_str("]")
    }
}

/// Annotation usage of a single class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassAnnotations {
    class_name: String,
    annotations: BTreeMap<AnnotationName, AnnotationDetails>,
}

impl ClassAnnotations {
    /// Creates an empty ledger with no class name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the class name from its binary (slash separated) form.
    pub fn set_class_name(&mut self, binary_name: &str) {
        self.class_name = binary_name.replace('/', ".");
    }

    /// Returns the dot separated class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Records that the annotation described by `descriptor` was seen at `level`.
    ///
    /// Recording the same name and level twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError`] if the descriptor is malformed; the ledger is
    /// left untouched in that case.
    pub fn add_annotation(
        &mut self,
        descriptor: &str,
        level: AnnotationLevel,
    ) -> Result<(), DescriptorError> {
        let name = AnnotationName::from_descriptor(descriptor)?;
        self.annotations.entry(name).or_default().insert(level);
        Ok(())
    }

    /// Iterates annotations sorted by name.
    pub fn annotations(&self) -> impl Iterator<Item = (&AnnotationName, &AnnotationDetails)> {
        self.annotations.iter()
    }

    /// Looks up the details of one annotation by its normalized name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AnnotationDetails> {
        self.annotations.get(name)
    }

    /// Number of distinct annotation names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Returns true if the class carries no annotations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_is_normalized() {
        let name = AnnotationName::from_descriptor("Ljava/lang/Deprecated;").unwrap();
        assert_eq!(name.as_str(), "@java.lang.Deprecated");
    }

    #[test]
    fn minimal_descriptors_are_accepted() {
        assert_eq!(AnnotationName::from_descriptor("Lfoo;").unwrap().as_str(), "@foo");
        assert_eq!(AnnotationName::from_descriptor("L;").unwrap().as_str(), "@");
    }

    #[test]
    fn malformed_descriptors_are_rejected() {
        for descriptor in ["", "foo", "Lfoo", "foo;", "L", ";"] {
            let err = AnnotationName::from_descriptor(descriptor).unwrap_err();
            assert_eq!(err, DescriptorError::Invalid(descriptor.to_owned()));
        }
    }

    #[test]
    fn error_message_names_the_descriptor() {
        let err = AnnotationName::from_descriptor("Lfoo").unwrap_err();
        assert_eq!(err.to_string(), "Not a valid annotation descriptor: Lfoo");
    }

    #[test]
    fn normalized_names_start_with_at_and_have_no_slash() {
        for descriptor in ["La/b/c;", "Lx;", "L/;", "Lorg/example/Outer$Inner;"] {
            let name = AnnotationName::from_descriptor(descriptor).unwrap();
            assert!(name.as_str().starts_with('@'));
            assert!(!name.as_str().contains('/'));
        }
    }

    #[test]
    fn class_name_is_dot_separated() {
        let mut ledger = ClassAnnotations::new();
        ledger.set_class_name("com/example/Outer$Inner");
        assert_eq!(ledger.class_name(), "com.example.Outer$Inner");
    }

    #[test]
    fn adding_twice_is_idempotent() {
        let mut once = ClassAnnotations::new();
        once.add_annotation("Lfoo;", AnnotationLevel::Field).unwrap();

        let mut twice = ClassAnnotations::new();
        twice.add_annotation("Lfoo;", AnnotationLevel::Field).unwrap();
        twice.add_annotation("Lfoo;", AnnotationLevel::Field).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.get("@foo").map(AnnotationDetails::len), Some(1));
    }

    #[test]
    fn levels_render_in_taxonomy_order() {
        let mut ledger = ClassAnnotations::new();
        ledger
            .add_annotation("Lfoo;", AnnotationLevel::MethodTypeUseReturn)
            .unwrap();
        ledger.add_annotation("Lfoo;", AnnotationLevel::Field).unwrap();
        ledger.add_annotation("Lfoo;", AnnotationLevel::Class).unwrap();

        let details = ledger.get("@foo").unwrap();
        assert_eq!(details.to_string(), "[CLASS, FIELD, METHOD_TYPE_USE_RETURN]");
    }

    #[test]
    fn invalid_descriptor_leaves_ledger_untouched() {
        let mut ledger = ClassAnnotations::new();
        assert!(ledger.add_annotation("foo;", AnnotationLevel::Class).is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn annotations_iterate_sorted_by_name() {
        let mut ledger = ClassAnnotations::new();
        ledger.add_annotation("Lz/Last;", AnnotationLevel::Class).unwrap();
        ledger.add_annotation("La/First;", AnnotationLevel::Class).unwrap();

        let names: Vec<&str> = ledger.annotations().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["@a.First", "@z.Last"]);
    }

    #[test]
    fn empty_details_render_as_empty_brackets() {
        assert_eq!(AnnotationDetails::default().to_string(), "[]");
    }
}
