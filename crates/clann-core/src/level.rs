//! Annotation attachment levels.

/// Where, structurally, an annotation was found inside a class.
///
/// The declaration order is the total order used whenever levels are
/// rendered, so reports stay stable regardless of the order in which
/// annotations were encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnnotationLevel {
    /// Applies to the class itself.
    Class,
    /// Catch-all for type-use annotations at the class level.
    ClassTypeUse,
    /// Applies to a type parameter declared by the class.
    ClassTypeUseTypeParameter,
    /// Applies to a bound of a type parameter declared by the class.
    ClassTypeUseTypeParameterBound,
    /// Applies to the superclass or an implemented interface.
    ClassTypeUseExtends,

    /// Applies to a field.
    Field,
    /// Applies to the type of a field.
    FieldTypeUse,

    /// Applies to a method as a whole.
    Method,
    /// Applies to a method parameter.
    MethodParameter,
    /// Applies to a local variable (or resource variable) declaration.
    MethodLocalVariable,
    /// Applies to the type of an exception handler.
    MethodTrycatch,
    /// Catch-all for type-use annotations at the method level.
    MethodTypeUse,
    /// Applies to a type parameter declared by a method.
    MethodTypeUseTypeParameter,
    /// Applies to a bound of a type parameter declared by a method.
    MethodTypeUseTypeParameterBound,
    /// Applies to the type of a formal parameter.
    MethodTypeUseParameter,
    /// Applies to the return type.
    MethodTypeUseReturn,
    /// Applies to a type in the `throws` clause.
    MethodTypeUseThrows,
    /// Applies to the explicit receiver parameter.
    MethodTypeUseReceiver,
}

impl AnnotationLevel {
    /// Every level, in rendering order.
    pub const ALL: [Self; 18] = [
        Self::Class,
        Self::ClassTypeUse,
        Self::ClassTypeUseTypeParameter,
        Self::ClassTypeUseTypeParameterBound,
        Self::ClassTypeUseExtends,
        Self::Field,
        Self::FieldTypeUse,
        Self::Method,
        Self::MethodParameter,
        Self::MethodLocalVariable,
        Self::MethodTrycatch,
        Self::MethodTypeUse,
        Self::MethodTypeUseTypeParameter,
        Self::MethodTypeUseTypeParameterBound,
        Self::MethodTypeUseParameter,
        Self::MethodTypeUseReturn,
        Self::MethodTypeUseThrows,
        Self::MethodTypeUseReceiver,
    ];

    /// Returns the name used in reports (e.g. `CLASS_TYPE_USE_EXTENDS`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "CLASS",
            Self::ClassTypeUse => "CLASS_TYPE_USE",
            Self::ClassTypeUseTypeParameter => "CLASS_TYPE_USE_TYPE_PARAMETER",
            Self::ClassTypeUseTypeParameterBound => "CLASS_TYPE_USE_TYPE_PARAMETER_BOUND",
            Self::ClassTypeUseExtends => "CLASS_TYPE_USE_EXTENDS",
            Self::Field => "FIELD",
            Self::FieldTypeUse => "FIELD_TYPE_USE",
            Self::Method => "METHOD",
            Self::MethodParameter => "METHOD_PARAMETER",
            Self::MethodLocalVariable => "METHOD_LOCAL_VARIABLE",
            Self::MethodTrycatch => "METHOD_TRYCATCH",
            Self::MethodTypeUse => "METHOD_TYPE_USE",
            Self::MethodTypeUseTypeParameter => "METHOD_TYPE_USE_TYPE_PARAMETER",
            Self::MethodTypeUseTypeParameterBound => "METHOD_TYPE_USE_TYPE_PARAMETER_BOUND",
            Self::MethodTypeUseParameter => "METHOD_TYPE_USE_PARAMETER",
            Self::MethodTypeUseReturn => "METHOD_TYPE_USE_RETURN",
            Self::MethodTypeUseThrows => "METHOD_TYPE_USE_THROWS",
            Self::MethodTypeUseReceiver => "METHOD_TYPE_USE_RECEIVER",
        }
    }
}

impl std::fmt::Display for AnnotationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
