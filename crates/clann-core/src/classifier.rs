//! Maps decode events onto annotation levels.
//!
//! The [`Classifier`] tracks which member of the class the event stream is
//! currently inside and, for every annotation event, picks exactly one
//! [`AnnotationLevel`]. All of the scope and type-reference rules live in
//! [`Classifier::level_for`].

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::event::{Annotation, ClassEvent, TypeRefSort};
use crate::ledger::{ClassAnnotations, DescriptorError};
use crate::level::AnnotationLevel;

/// What to do with an annotation whose descriptor cannot be normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidDescriptorPolicy {
    /// Fail the whole class; the archive entry is reported as a failure.
    #[default]
    AbortClass,
    /// Drop only the offending occurrence and keep decoding the class.
    SkipOccurrence,
}

/// Errors raised while classifying the events of one class.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum ClassifyError {
    /// An annotation descriptor was malformed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Descriptor(#[from] DescriptorError),

    /// An event arrived before the class header.
    #[error("{event} before class header")]
    #[diagnostic(code(clann::classify::missing_header))]
    MissingClassHeader {
        /// Kind of the offending event.
        event: &'static str,
    },

    /// A second class header arrived for the same class.
    #[error("duplicate class header for {name}")]
    #[diagnostic(code(clann::classify::duplicate_header))]
    DuplicateClassHeader {
        /// Binary name carried by the second header.
        name: String,
    },

    /// A method-only event arrived outside of a method.
    #[error("{event} outside of a method (in {scope} scope)")]
    #[diagnostic(code(clann::classify::out_of_scope))]
    OutOfScope {
        /// Kind of the offending event.
        event: &'static str,
        /// Scope the classifier was in.
        scope: Scope,
    },
}

/// The part of the class the event stream is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// No class header seen yet.
    Start,
    /// Class level, before any member declaration.
    Class,
    /// Inside a field.
    Field,
    /// Inside a method.
    Method,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Class => write!(f, "class"),
            Self::Field => write!(f, "field"),
            Self::Method => write!(f, "method"),
        }
    }
}

/// Streaming classifier for the events of a single class.
#[derive(Debug, Clone)]
pub struct Classifier {
    scope: Scope,
    policy: InvalidDescriptorPolicy,
}

impl Classifier {
    /// Creates a classifier positioned before the class header.
    #[must_use]
    pub fn new(policy: InvalidDescriptorPolicy) -> Self {
        Self {
            scope: Scope::Start,
            policy,
        }
    }

    /// Returns the current scope.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Applies one event to `ledger`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError`] for out-of-order events, or for a malformed
    /// descriptor under [`InvalidDescriptorPolicy::AbortClass`].
    pub fn apply(
        &mut self,
        ledger: &mut ClassAnnotations,
        event: &ClassEvent,
    ) -> Result<(), ClassifyError> {
        match event {
            ClassEvent::Class { name } => {
                if self.scope != Scope::Start {
                    return Err(ClassifyError::DuplicateClassHeader { name: name.clone() });
                }
                ledger.set_class_name(name);
                self.scope = Scope::Class;
                Ok(())
            }
            ClassEvent::Field { name } => {
                self.enter(Scope::Field, event)?;
                trace!("visiting field: {name}");
                Ok(())
            }
            ClassEvent::Method { name } => {
                self.enter(Scope::Method, event)?;
                trace!("visiting method: {name}");
                Ok(())
            }
            ClassEvent::Annotation(annotation)
            | ClassEvent::TypeAnnotation { annotation, .. }
            | ClassEvent::ParameterAnnotation { annotation, .. }
            | ClassEvent::LocalVariableAnnotation { annotation, .. }
            | ClassEvent::TryCatchAnnotation { annotation, .. } => {
                let level = self.level_for(event)?;
                self.record(ledger, annotation, level)
            }
        }
    }

    /// Picks the level for an annotation event in the current scope.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError`] if the event cannot occur in the current
    /// scope. Declaration events are rejected as out of scope.
    pub fn level_for(&self, event: &ClassEvent) -> Result<AnnotationLevel, ClassifyError> {
        let scope = match self.scope {
            Scope::Start => {
                return Err(ClassifyError::MissingClassHeader {
                    event: event.kind(),
                })
            }
            other => other,
        };

        let level = match (scope, event) {
            (Scope::Class, ClassEvent::Annotation(_)) => AnnotationLevel::Class,
            (Scope::Class, ClassEvent::TypeAnnotation { sort, .. }) => match sort {
                TypeRefSort::ClassTypeParameter => AnnotationLevel::ClassTypeUseTypeParameter,
                TypeRefSort::ClassTypeParameterBound => {
                    AnnotationLevel::ClassTypeUseTypeParameterBound
                }
                TypeRefSort::ClassExtends => AnnotationLevel::ClassTypeUseExtends,
                _ => AnnotationLevel::ClassTypeUse,
            },

            (Scope::Field, ClassEvent::Annotation(_)) => AnnotationLevel::Field,
            (Scope::Field, ClassEvent::TypeAnnotation { .. }) => AnnotationLevel::FieldTypeUse,

            (Scope::Method, ClassEvent::Annotation(_)) => AnnotationLevel::Method,
            (Scope::Method, ClassEvent::ParameterAnnotation { .. }) => {
                AnnotationLevel::MethodParameter
            }
            (Scope::Method, ClassEvent::LocalVariableAnnotation { .. }) => {
                AnnotationLevel::MethodLocalVariable
            }
            (Scope::Method, ClassEvent::TryCatchAnnotation { .. }) => {
                AnnotationLevel::MethodTrycatch
            }
            (Scope::Method, ClassEvent::TypeAnnotation { sort, .. }) => match sort {
                TypeRefSort::MethodTypeParameter => AnnotationLevel::MethodTypeUseTypeParameter,
                TypeRefSort::MethodTypeParameterBound => {
                    AnnotationLevel::MethodTypeUseTypeParameterBound
                }
                TypeRefSort::MethodFormalParameter => AnnotationLevel::MethodTypeUseParameter,
                TypeRefSort::MethodReturn => AnnotationLevel::MethodTypeUseReturn,
                TypeRefSort::MethodReceiver => AnnotationLevel::MethodTypeUseReceiver,
                TypeRefSort::Throws => AnnotationLevel::MethodTypeUseThrows,
                _ => AnnotationLevel::MethodTypeUse,
            },

            (
                _,
                ClassEvent::Class { .. }
                | ClassEvent::Field { .. }
                | ClassEvent::Method { .. }
                | ClassEvent::ParameterAnnotation { .. }
                | ClassEvent::LocalVariableAnnotation { .. }
                | ClassEvent::TryCatchAnnotation { .. },
            )
            | (Scope::Start, _) => {
                return Err(ClassifyError::OutOfScope {
                    event: event.kind(),
                    scope,
                })
            }
        };

        Ok(level)
    }

    fn enter(&mut self, scope: Scope, event: &ClassEvent) -> Result<(), ClassifyError> {
        if self.scope == Scope::Start {
            return Err(ClassifyError::MissingClassHeader {
                event: event.kind(),
            });
        }
        self.scope = scope;
        Ok(())
    }

    fn record(
        &self,
        ledger: &mut ClassAnnotations,
        annotation: &Annotation,
        level: AnnotationLevel,
    ) -> Result<(), ClassifyError> {
        match ledger.add_annotation(&annotation.descriptor, level) {
            Ok(()) => Ok(()),
            Err(e) if self.policy == InvalidDescriptorPolicy::SkipOccurrence => {
                warn!(
                    "Skipping annotation in {} at {level}: {e}",
                    ledger.class_name()
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(InvalidDescriptorPolicy::default())
    }
}

/// Folds the complete event sequence of one class into a finished ledger.
///
/// # Errors
///
/// Returns the first [`ClassifyError`] raised by [`Classifier::apply`], or
/// [`ClassifyError::MissingClassHeader`] if the sequence has no header.
pub fn collect_annotations<I>(
    events: I,
    policy: InvalidDescriptorPolicy,
) -> Result<ClassAnnotations, ClassifyError>
where
    I: IntoIterator,
    I::Item: std::borrow::Borrow<ClassEvent>,
{
    use std::borrow::Borrow;

    let mut classifier = Classifier::new(policy);
    let mut ledger = ClassAnnotations::new();

    for event in events {
        classifier.apply(&mut ledger, event.borrow())?;
    }

    if classifier.scope() == Scope::Start {
        return Err(ClassifyError::MissingClassHeader {
            event: "end of class",
        });
    }

    Ok(ledger)
}
