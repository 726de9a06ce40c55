//! A small class file writer for tests.
//!
//! ```
//! use clann_classfile::{ClassFileBuilder, TypeTarget};
//!
//! let bytes = ClassFileBuilder::new("com/example/Sample")
//!     .class_annotation("Ljava/lang/Deprecated;", true)
//!     .field("name", "Ljava/lang/String;")
//!     .type_annotation(TypeTarget::Field, "Lcom/example/NonNull;")
//!     .build();
//! assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
//! ```

use std::collections::HashMap;

use clann_core::TypePathStep;

/// Target of a type annotation written by [`ClassFileBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTarget {
    /// `0x00`: class type parameter.
    ClassTypeParameter(u8),
    /// `0x01`: method type parameter.
    MethodTypeParameter(u8),
    /// `0x10`: supertype index (`0xFFFF` for the superclass).
    Supertype(u16),
    /// `0x11`: class type parameter bound.
    ClassTypeParameterBound(u8, u8),
    /// `0x12`: method type parameter bound.
    MethodTypeParameterBound(u8, u8),
    /// `0x13`: field type.
    Field,
    /// `0x14`: method return type.
    Return,
    /// `0x15`: method receiver type.
    Receiver,
    /// `0x16`: formal parameter type.
    FormalParameter(u8),
    /// `0x17`: `throws` clause entry.
    Throws(u16),
    /// `0x40`: local variable with a single live range.
    LocalVariable {
        /// Start of the live range.
        start_pc: u16,
        /// Length of the live range.
        length: u16,
        /// Local variable slot.
        index: u16,
    },
    /// `0x41`: try-with-resources variable with a single live range.
    ResourceVariable {
        /// Start of the live range.
        start_pc: u16,
        /// Length of the live range.
        length: u16,
        /// Local variable slot.
        index: u16,
    },
    /// `0x42`: exception table entry.
    ExceptionParameter(u16),
    /// `0x43`: `instanceof` at a bytecode offset.
    Instanceof(u16),
    /// `0x44`: `new` at a bytecode offset.
    New(u16),
    /// `0x47`: cast at a bytecode offset.
    Cast(u16, u8),
    /// Arbitrary `target_type` with raw `target_info` bytes.
    Raw(u8, Vec<u8>),
}

impl TypeTarget {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::ClassTypeParameter(i) => out.extend([0x00, *i]),
            Self::MethodTypeParameter(i) => out.extend([0x01, *i]),
            Self::Supertype(i) => push_u8_u16(out, 0x10, *i),
            Self::ClassTypeParameterBound(p, b) => out.extend([0x11, *p, *b]),
            Self::MethodTypeParameterBound(p, b) => out.extend([0x12, *p, *b]),
            Self::Field => out.push(0x13),
            Self::Return => out.push(0x14),
            Self::Receiver => out.push(0x15),
            Self::FormalParameter(i) => out.extend([0x16, *i]),
            Self::Throws(i) => push_u8_u16(out, 0x17, *i),
            Self::LocalVariable {
                start_pc,
                length,
                index,
            } => push_local_variable(out, 0x40, *start_pc, *length, *index),
            Self::ResourceVariable {
                start_pc,
                length,
                index,
            } => push_local_variable(out, 0x41, *start_pc, *length, *index),
            Self::ExceptionParameter(i) => push_u8_u16(out, 0x42, *i),
            Self::Instanceof(offset) => push_u8_u16(out, 0x43, *offset),
            Self::New(offset) => push_u8_u16(out, 0x44, *offset),
            Self::Cast(offset, argument) => {
                push_u8_u16(out, 0x47, *offset);
                out.push(*argument);
            }
            Self::Raw(target_type, info) => {
                out.push(*target_type);
                out.extend_from_slice(info);
            }
        }
    }
}

fn push_u8_u16(out: &mut Vec<u8>, tag: u8, value: u16) {
    out.push(tag);
    out.extend(value.to_be_bytes());
}

fn push_local_variable(out: &mut Vec<u8>, tag: u8, start_pc: u16, length: u16, index: u16) {
    push_u8_u16(out, tag, 1);
    for value in [start_pc, length, index] {
        out.extend(value.to_be_bytes());
    }
}

fn len_u16(len: usize) -> [u8; 2] {
    u16::try_from(len).unwrap_or(u16::MAX).to_be_bytes()
}

#[allow(clippy::cast_possible_truncation)]
fn modified_utf8(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

#[derive(Debug, Default)]
struct Pool {
    bytes: Vec<u8>,
    slots: u16,
    utf8: HashMap<String, u16>,
}

impl Pool {
    fn push(&mut self, entry: &[u8], slots: u16) -> u16 {
        let index = self.slots + 1;
        self.bytes.extend_from_slice(entry);
        self.slots += slots;
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.utf8.get(value) {
            return index;
        }
        let encoded = modified_utf8(value);
        let mut entry = vec![1];
        entry.extend(len_u16(encoded.len()));
        entry.extend(encoded);
        let index = self.push(&entry, 1);
        self.utf8.insert(value.to_owned(), index);
        index
    }

    fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        let mut entry = vec![7];
        entry.extend(name_index.to_be_bytes());
        self.push(&entry, 1)
    }

    fn integer(&mut self, value: i32) -> u16 {
        let mut entry = vec![3];
        entry.extend(value.to_be_bytes());
        self.push(&entry, 1)
    }
}

#[derive(Debug, Default)]
struct Element {
    visible: Vec<Vec<u8>>,
    invisible: Vec<Vec<u8>>,
    visible_type: Vec<Vec<u8>>,
    invisible_type: Vec<Vec<u8>>,
    visible_parameters: Vec<(u8, Vec<u8>)>,
    invisible_parameters: Vec<(u8, Vec<u8>)>,
    code_type: Vec<Vec<u8>>,
    custom: Vec<(String, Vec<u8>)>,
}

impl Element {
    fn attributes(self, pool: &mut Pool) -> Vec<(u16, Vec<u8>)> {
        let mut attrs = Vec::new();
        for (name, annotations) in [
            ("RuntimeVisibleAnnotations", self.visible),
            ("RuntimeInvisibleAnnotations", self.invisible),
            ("RuntimeVisibleTypeAnnotations", self.visible_type),
            ("RuntimeInvisibleTypeAnnotations", self.invisible_type),
        ] {
            if !annotations.is_empty() {
                attrs.push((pool.utf8(name), counted(&annotations)));
            }
        }
        for (name, parameters) in [
            ("RuntimeVisibleParameterAnnotations", self.visible_parameters),
            ("RuntimeInvisibleParameterAnnotations", self.invisible_parameters),
        ] {
            if !parameters.is_empty() {
                attrs.push((pool.utf8(name), parameter_table(&parameters)));
            }
        }
        if !self.code_type.is_empty() {
            let mut code = vec![0, 1, 0, 1, 0, 0, 0, 1, 0xB1, 0, 0];
            let nested = (pool.utf8("RuntimeVisibleTypeAnnotations"), counted(&self.code_type));
            write_attributes(&mut code, &[nested]);
            attrs.push((pool.utf8("Code"), code));
        }
        for (name, body) in self.custom {
            attrs.push((pool.utf8(&name), body));
        }
        attrs
    }
}

fn counted(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = len_u16(items.len()).to_vec();
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

fn parameter_table(parameters: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let count = parameters.iter().map(|(i, _)| *i).max().map_or(0, |i| i + 1);
    let mut out = vec![count];
    for parameter in 0..count {
        let annotations: Vec<_> = parameters
            .iter()
            .filter(|(i, _)| *i == parameter)
            .map(|(_, a)| a.clone())
            .collect();
        out.extend(counted(&annotations));
    }
    out
}

fn write_attributes(out: &mut Vec<u8>, attrs: &[(u16, Vec<u8>)]) {
    out.extend(len_u16(attrs.len()));
    for (name, body) in attrs {
        out.extend(name.to_be_bytes());
        out.extend(u32::try_from(body.len()).unwrap_or(u32::MAX).to_be_bytes());
        out.extend_from_slice(body);
    }
}

#[derive(Debug)]
struct MemberDef {
    name: u16,
    descriptor: u16,
    element: Element,
}

#[derive(Debug, Clone, Copy)]
enum Current {
    Class,
    Field(usize),
    Method(usize),
}

/// Writes minimal, well-formed class files carrying annotations.
///
/// Member-level calls (`annotation`, `type_annotation`, ...) apply to the
/// most recently declared field or method, or to the class before any.
#[derive(Debug)]
pub struct ClassFileBuilder {
    pool: Pool,
    this_class: u16,
    super_class: u16,
    class: Element,
    fields: Vec<MemberDef>,
    methods: Vec<MemberDef>,
    current: Current,
}

impl ClassFileBuilder {
    /// Starts a class with the given binary name (e.g. `com/example/Foo`).
    #[must_use]
    pub fn new(name: &str) -> Self {
        let mut pool = Pool::default();
        let this_class = pool.class(name);
        let super_class = pool.class("java/lang/Object");
        Self {
            pool,
            this_class,
            super_class,
            class: Element::default(),
            fields: Vec::new(),
            methods: Vec::new(),
            current: Current::Class,
        }
    }

    fn member(&mut self, name: &str, descriptor: &str) -> MemberDef {
        MemberDef {
            name: self.pool.utf8(name),
            descriptor: self.pool.utf8(descriptor),
            element: Element::default(),
        }
    }

    fn current(&mut self) -> &mut Element {
        match self.current {
            Current::Class => &mut self.class,
            Current::Field(i) => &mut self.fields[i].element,
            Current::Method(i) => &mut self.methods[i].element,
        }
    }

    fn annotation_bytes(&mut self, descriptor: &str) -> Vec<u8> {
        let mut out = self.pool.utf8(descriptor).to_be_bytes().to_vec();
        out.extend([0, 0]);
        out
    }

    fn type_annotation_bytes(
        &mut self,
        target: &TypeTarget,
        path: &[TypePathStep],
        descriptor: &str,
    ) -> Vec<u8> {
        let mut out = Vec::new();
        target.encode(&mut out);
        out.push(u8::try_from(path.len()).unwrap_or(u8::MAX));
        for step in path {
            out.extend(match step {
                TypePathStep::ArrayElement => [0, 0],
                TypePathStep::InnerType => [1, 0],
                TypePathStep::WildcardBound => [2, 0],
                TypePathStep::TypeArgument(i) => [3, *i],
            });
        }
        out.extend(self.annotation_bytes(descriptor));
        out
    }

    /// Declares a field; following member-level calls apply to it.
    #[must_use]
    pub fn field(mut self, name: &str, descriptor: &str) -> Self {
        let field = self.member(name, descriptor);
        self.fields.push(field);
        self.current = Current::Field(self.fields.len() - 1);
        self
    }

    /// Declares a method; following member-level calls apply to it.
    #[must_use]
    pub fn method(mut self, name: &str, descriptor: &str) -> Self {
        let method = self.member(name, descriptor);
        self.methods.push(method);
        self.current = Current::Method(self.methods.len() - 1);
        self
    }

    /// Adds a declaration annotation to the current element.
    #[must_use]
    pub fn annotation(mut self, descriptor: &str, visible: bool) -> Self {
        let bytes = self.annotation_bytes(descriptor);
        let element = self.current();
        if visible {
            element.visible.push(bytes);
        } else {
            element.invisible.push(bytes);
        }
        self
    }

    /// Adds a runtime-visible type annotation to the current element.
    #[must_use]
    pub fn type_annotation(self, target: TypeTarget, descriptor: &str) -> Self {
        self.type_annotation_with_path(target, &[], descriptor)
    }

    /// Adds a runtime-visible type annotation with a type path.
    #[must_use]
    pub fn type_annotation_with_path(
        mut self,
        target: TypeTarget,
        path: &[TypePathStep],
        descriptor: &str,
    ) -> Self {
        let bytes = self.type_annotation_bytes(&target, path, descriptor);
        self.current().visible_type.push(bytes);
        self
    }

    /// Adds a class-retained type annotation to the current element.
    #[must_use]
    pub fn invisible_type_annotation(mut self, target: TypeTarget, descriptor: &str) -> Self {
        let bytes = self.type_annotation_bytes(&target, &[], descriptor);
        self.current().invisible_type.push(bytes);
        self
    }

    /// Adds an annotation on parameter `index` of the current method.
    #[must_use]
    pub fn parameter_annotation(mut self, index: u8, descriptor: &str, visible: bool) -> Self {
        let bytes = self.annotation_bytes(descriptor);
        let element = self.current();
        if visible {
            element.visible_parameters.push((index, bytes));
        } else {
            element.invisible_parameters.push((index, bytes));
        }
        self
    }

    /// Adds a type annotation inside the current method's `Code` attribute.
    #[must_use]
    pub fn code_type_annotation(mut self, target: TypeTarget, descriptor: &str) -> Self {
        let bytes = self.type_annotation_bytes(&target, &[], descriptor);
        self.current().code_type.push(bytes);
        self
    }

    /// Adds a declaration annotation to the class itself.
    #[must_use]
    pub fn class_annotation(mut self, descriptor: &str, visible: bool) -> Self {
        let current = std::mem::replace(&mut self.current, Current::Class);
        self = self.annotation(descriptor, visible);
        self.current = current;
        self
    }

    /// Adds a runtime-visible type annotation to the class itself.
    #[must_use]
    pub fn class_type_annotation(mut self, target: TypeTarget, descriptor: &str) -> Self {
        let bytes = self.type_annotation_bytes(&target, &[], descriptor);
        self.class.visible_type.push(bytes);
        self
    }

    /// Adds a visible class annotation whose elements use every value kind.
    #[must_use]
    pub fn class_annotation_with_values(mut self, descriptor: &str) -> Self {
        let type_index = self.pool.utf8(descriptor);
        let value = self.pool.utf8("value");
        let int = self.pool.integer(42);
        let enum_type = self.pool.utf8("Ljava/lang/annotation/RetentionPolicy;");
        let enum_const = self.pool.utf8("RUNTIME");
        let nested = self.pool.utf8("Ljava/lang/annotation/Documented;");

        let mut out = type_index.to_be_bytes().to_vec();
        out.extend([0, 4]);
        out.extend(value.to_be_bytes());
        out.push(b'I');
        out.extend(int.to_be_bytes());
        out.extend(value.to_be_bytes());
        out.push(b'e');
        out.extend(enum_type.to_be_bytes());
        out.extend(enum_const.to_be_bytes());
        out.extend(value.to_be_bytes());
        out.extend([b'[', 0, 2, b's']);
        out.extend(enum_const.to_be_bytes());
        out.push(b'c');
        out.extend(enum_type.to_be_bytes());
        out.extend(value.to_be_bytes());
        out.push(b'@');
        out.extend(nested.to_be_bytes());
        out.extend([0, 0]);

        self.class.visible.push(out);
        self
    }

    /// Adds an arbitrary attribute to the class.
    #[must_use]
    pub fn custom_class_attribute(mut self, name: &str, body: &[u8]) -> Self {
        self.class.custom.push((name.to_owned(), body.to_vec()));
        self
    }

    /// Adds a `CONSTANT_Long`, which occupies two constant pool slots.
    #[must_use]
    pub fn long_constant(mut self, value: i64) -> Self {
        let mut entry = vec![5];
        entry.extend(value.to_be_bytes());
        self.pool.push(&entry, 2);
        self
    }

    /// Serializes the class file.
    #[must_use]
    pub fn build(mut self) -> Vec<u8> {
        let class_attrs = std::mem::take(&mut self.class).attributes(&mut self.pool);
        let fields = members(std::mem::take(&mut self.fields), &mut self.pool);
        let methods = members(std::mem::take(&mut self.methods), &mut self.pool);

        let mut out = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 61];
        out.extend((self.pool.slots + 1).to_be_bytes());
        out.extend_from_slice(&self.pool.bytes);
        out.extend([0x00, 0x21]);
        out.extend(self.this_class.to_be_bytes());
        out.extend(self.super_class.to_be_bytes());
        out.extend([0, 0]);
        out.extend(fields);
        out.extend(methods);
        write_attributes(&mut out, &class_attrs);
        out
    }
}

fn members(defs: Vec<MemberDef>, pool: &mut Pool) -> Vec<u8> {
    let mut out = len_u16(defs.len()).to_vec();
    for def in defs {
        out.extend([0x00, 0x01]);
        out.extend(def.name.to_be_bytes());
        out.extend(def.descriptor.to_be_bytes());
        let attrs = def.element.attributes(pool);
        write_attributes(&mut out, &attrs);
    }
    out
}
