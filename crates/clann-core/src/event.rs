//! Structural decode events and the decoder interface.
//!
//! A [`ClassDecoder`] turns the bytes of one class file into a flat sequence
//! of [`ClassEvent`]s. Member declarations (`Field`, `Method`) open a scope;
//! every annotation event that follows belongs to that member until the next
//! declaration. Annotation events seen before any member belong to the class.

/// A raw annotation occurrence as reported by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Raw field descriptor of the annotation type (e.g. `Ljava/lang/Deprecated;`).
    pub descriptor: String,
    /// Whether the annotation is retained at runtime.
    pub visible: bool,
}

impl Annotation {
    /// Creates a runtime-visible annotation.
    #[must_use]
    pub fn visible(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            visible: true,
        }
    }

    /// Creates a class-retained (runtime-invisible) annotation.
    #[must_use]
    pub fn invisible(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            visible: false,
        }
    }
}

/// Kind of type referenced by a type annotation (JVMS §4.7.20.1 `target_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRefSort {
    /// Type parameter declaration of a generic class or interface.
    ClassTypeParameter,
    /// Type parameter declaration of a generic method or constructor.
    MethodTypeParameter,
    /// Type in the `extends` or `implements` clause of a class.
    ClassExtends,
    /// Bound of a type parameter of a generic class or interface.
    ClassTypeParameterBound,
    /// Bound of a type parameter of a generic method or constructor.
    MethodTypeParameterBound,
    /// Type of a field or record component.
    Field,
    /// Return type of a method, or type of a newly constructed object.
    MethodReturn,
    /// Receiver type of a method or constructor.
    MethodReceiver,
    /// Type of a formal parameter.
    MethodFormalParameter,
    /// Type in the `throws` clause.
    Throws,
    /// Type of a local variable.
    LocalVariable,
    /// Type of a try-with-resources variable.
    ResourceVariable,
    /// Type of an exception parameter in a `catch` clause.
    ExceptionParameter,
    /// Type in an `instanceof` expression.
    Instanceof,
    /// Type in a `new` expression.
    New,
    /// Type in a constructor reference expression.
    ConstructorReference,
    /// Type in a method reference expression.
    MethodReference,
    /// Type in a cast expression.
    Cast,
    /// Type argument of a generic constructor invocation.
    ConstructorInvocationTypeArgument,
    /// Type argument of a generic method invocation.
    MethodInvocationTypeArgument,
    /// Type argument of a generic constructor reference.
    ConstructorReferenceTypeArgument,
    /// Type argument of a generic method reference.
    MethodReferenceTypeArgument,
}

impl TypeRefSort {
    /// Maps a JVM `target_type` byte to its sort.
    #[must_use]
    pub fn from_target_type(target_type: u8) -> Option<Self> {
        let sort = match target_type {
            0x00 => Self::ClassTypeParameter,
            0x01 => Self::MethodTypeParameter,
            0x10 => Self::ClassExtends,
            0x11 => Self::ClassTypeParameterBound,
            0x12 => Self::MethodTypeParameterBound,
            0x13 => Self::Field,
            0x14 => Self::MethodReturn,
            0x15 => Self::MethodReceiver,
            0x16 => Self::MethodFormalParameter,
            0x17 => Self::Throws,
            0x40 => Self::LocalVariable,
            0x41 => Self::ResourceVariable,
            0x42 => Self::ExceptionParameter,
            0x43 => Self::Instanceof,
            0x44 => Self::New,
            0x45 => Self::ConstructorReference,
            0x46 => Self::MethodReference,
            0x47 => Self::Cast,
            0x48 => Self::ConstructorInvocationTypeArgument,
            0x49 => Self::MethodInvocationTypeArgument,
            0x4A => Self::ConstructorReferenceTypeArgument,
            0x4B => Self::MethodReferenceTypeArgument,
            _ => return None,
        };
        Some(sort)
    }
}

/// One step of a [`TypePath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypePathStep {
    /// Deeper in an array type.
    ArrayElement,
    /// Deeper in a nested type.
    InnerType,
    /// The bound of a wildcard type argument.
    WildcardBound,
    /// A type argument of a parameterized type.
    TypeArgument(u8),
}

/// Location of an annotated type inside a compound type.
///
/// Carried through for completeness; classification does not look at it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypePath {
    /// Steps from the outermost type inwards.
    pub steps: Vec<TypePathStep>,
}

impl TypePath {
    /// The empty path (the annotation applies to the outermost type).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl std::fmt::Display for TypePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for step in &self.steps {
            match step {
                TypePathStep::ArrayElement => f.write_str("[")?,
                TypePathStep::InnerType => f.write_str(".")?,
                TypePathStep::WildcardBound => f.write_str("*")?,
                TypePathStep::TypeArgument(index) => write!(f, "{index};")?,
            }
        }
        Ok(())
    }
}

/// Live range of an annotated local variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalVariableRange {
    /// First bytecode offset where the variable is live.
    pub start_pc: u16,
    /// Length of the live range in bytes.
    pub length: u16,
    /// Local variable slot.
    pub index: u16,
}

/// A structural event emitted while decoding one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassEvent {
    /// The class header; `name` is the binary (slash separated) name.
    Class {
        /// Binary class name.
        name: String,
    },
    /// A field declaration; opens the field scope.
    Field {
        /// Field name.
        name: String,
    },
    /// A method declaration; opens the method scope.
    Method {
        /// Method name.
        name: String,
    },
    /// A declaration annotation on the current scope.
    Annotation(Annotation),
    /// A type annotation on the current scope.
    TypeAnnotation {
        /// Which type the annotation refers to.
        sort: TypeRefSort,
        /// Path inside the referenced type.
        type_path: TypePath,
        /// The annotation.
        annotation: Annotation,
    },
    /// An annotation on a method parameter.
    ParameterAnnotation {
        /// Zero-based parameter index.
        parameter: u8,
        /// The annotation.
        annotation: Annotation,
    },
    /// A type annotation on a local or resource variable.
    LocalVariableAnnotation {
        /// [`TypeRefSort::LocalVariable`] or [`TypeRefSort::ResourceVariable`].
        sort: TypeRefSort,
        /// Path inside the variable type.
        type_path: TypePath,
        /// Live ranges of the variable.
        ranges: Vec<LocalVariableRange>,
        /// The annotation.
        annotation: Annotation,
    },
    /// A type annotation on an exception handler type.
    TryCatchAnnotation {
        /// Index into the method's exception table.
        exception_index: u16,
        /// Path inside the handler type.
        type_path: TypePath,
        /// The annotation.
        annotation: Annotation,
    },
}

impl ClassEvent {
    /// Short name of the event kind, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Class { .. } => "class header",
            Self::Field { .. } => "field declaration",
            Self::Method { .. } => "method declaration",
            Self::Annotation(_) => "annotation",
            Self::TypeAnnotation { .. } => "type annotation",
            Self::ParameterAnnotation { .. } => "parameter annotation",
            Self::LocalVariableAnnotation { .. } => "local variable annotation",
            Self::TryCatchAnnotation { .. } => "try-catch annotation",
        }
    }
}

/// Error returned by a [`ClassDecoder`] for bytes it cannot decode.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("Failed to parse class file content: {source}")]
#[diagnostic(code(clann::decode))]
pub struct DecodeError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl DecodeError {
    /// Wraps the decoder-specific cause.
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Decodes the bytes of one class file into structural events.
///
/// Implementations must be shareable across threads so the analyzer can
/// decode entries in parallel.
pub trait ClassDecoder: Send + Sync {
    /// Decodes one class file.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the bytes are not a well-formed class file.
    fn decode(&self, bytes: &[u8]) -> Result<Vec<ClassEvent>, DecodeError>;
}

/// Type alias for boxed decoder trait objects.
pub type DecoderBox = Box<dyn ClassDecoder>;
