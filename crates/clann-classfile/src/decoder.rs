//! Class file structure walk and event emission.

use clann_core::{Annotation, ClassDecoder, ClassEvent, DecodeError};
use tracing::{debug, trace};

use crate::annotations::{
    read_annotations, read_parameter_annotations, read_type_annotations, Target, TypeAnnotation,
};
use crate::constant_pool::ConstantPool;
use crate::error::{ClassFileError, Result};
use crate::reader::ByteReader;

const MAGIC: u32 = 0xCAFE_BABE;

/// Where an attribute table sits; decides which attributes are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Class,
    Field,
    Method,
    Code,
}

/// Annotation-bearing attributes of one class, field, method or `Code`.
#[derive(Debug, Default)]
struct Attributes {
    annotations: Vec<Annotation>,
    type_annotations: Vec<TypeAnnotation>,
    parameter_annotations: Vec<(u8, Annotation)>,
    code_annotations: Vec<TypeAnnotation>,
}

impl Attributes {
    fn read(r: &mut ByteReader<'_>, cp: &ConstantPool, context: Context) -> Result<Self> {
        let mut attrs = Self::default();
        let count = r.u16()?;

        for _ in 0..count {
            let name = cp.utf8(r.u16()?)?;
            let length = r.u32()? as usize;
            let mut body = r.sub(length)?;

            match (context, name) {
                (Context::Code, "RuntimeVisibleTypeAnnotations") => {
                    read_type_annotations(&mut body, cp, true, &mut attrs.type_annotations)?;
                }
                (Context::Code, "RuntimeInvisibleTypeAnnotations") => {
                    read_type_annotations(&mut body, cp, false, &mut attrs.type_annotations)?;
                }
                (Context::Code, _) => {}
                (_, "RuntimeVisibleAnnotations") => {
                    read_annotations(&mut body, cp, true, &mut attrs.annotations)?;
                }
                (_, "RuntimeInvisibleAnnotations") => {
                    read_annotations(&mut body, cp, false, &mut attrs.annotations)?;
                }
                (_, "RuntimeVisibleTypeAnnotations") => {
                    read_type_annotations(&mut body, cp, true, &mut attrs.type_annotations)?;
                }
                (_, "RuntimeInvisibleTypeAnnotations") => {
                    read_type_annotations(&mut body, cp, false, &mut attrs.type_annotations)?;
                }
                (Context::Method, "RuntimeVisibleParameterAnnotations") => {
                    read_parameter_annotations(&mut body, cp, true, &mut attrs.parameter_annotations)?;
                }
                (Context::Method, "RuntimeInvisibleParameterAnnotations") => {
                    read_parameter_annotations(
                        &mut body,
                        cp,
                        false,
                        &mut attrs.parameter_annotations,
                    )?;
                }
                (Context::Method, "Code") => {
                    attrs.code_annotations = read_code(&mut body, cp)?;
                }
                _ => trace!(attribute = name, "Skipping attribute"),
            }
        }

        Ok(attrs)
    }

    /// Appends the events for these attributes in declaration order:
    /// annotations, type annotations, parameter annotations, then code.
    fn emit(self, events: &mut Vec<ClassEvent>) {
        events.extend(self.annotations.into_iter().map(ClassEvent::Annotation));
        events.extend(self.type_annotations.into_iter().map(declaration_event));
        events.extend(
            self.parameter_annotations
                .into_iter()
                .map(|(parameter, annotation)| ClassEvent::ParameterAnnotation {
                    parameter,
                    annotation,
                }),
        );
        events.extend(self.code_annotations.into_iter().map(code_event));
    }
}

fn read_code(r: &mut ByteReader<'_>, cp: &ConstantPool) -> Result<Vec<TypeAnnotation>> {
    r.skip(4)?; // max_stack, max_locals
    let code_length = r.u32()? as usize;
    r.skip(code_length)?;
    let exception_table_length = usize::from(r.u16()?);
    r.skip(exception_table_length * 8)?;
    Ok(Attributes::read(r, cp, Context::Code)?.type_annotations)
}

fn declaration_event(ta: TypeAnnotation) -> ClassEvent {
    ClassEvent::TypeAnnotation {
        sort: ta.sort,
        type_path: ta.type_path,
        annotation: ta.annotation,
    }
}

fn code_event(ta: TypeAnnotation) -> ClassEvent {
    match ta.target {
        Target::LocalVariable(ranges) => ClassEvent::LocalVariableAnnotation {
            sort: ta.sort,
            type_path: ta.type_path,
            ranges,
            annotation: ta.annotation,
        },
        Target::ExceptionParameter(exception_index) => ClassEvent::TryCatchAnnotation {
            exception_index,
            type_path: ta.type_path,
            annotation: ta.annotation,
        },
        Target::Other => declaration_event(ta),
    }
}

struct Member {
    kind: Context,
    name: String,
    attributes: Attributes,
}

fn read_members(r: &mut ByteReader<'_>, cp: &ConstantPool, kind: Context) -> Result<Vec<Member>> {
    let count = r.u16()?;
    (0..count)
        .map(|_| {
            r.skip(2)?; // access_flags
            let name = cp.utf8(r.u16()?)?.to_owned();
            cp.utf8(r.u16()?)?; // descriptor
            let attributes = Attributes::read(r, cp, kind)?;
            Ok(Member {
                kind,
                name,
                attributes,
            })
        })
        .collect()
}

/// Decodes one class file into its event stream.
///
/// # Errors
///
/// Returns [`ClassFileError`] for truncated data, bad constant pool
/// references and unknown tags or target types.
pub fn decode_class(bytes: &[u8]) -> Result<Vec<ClassEvent>> {
    let mut r = ByteReader::new(bytes);

    let magic = r.u32()?;
    if magic != MAGIC {
        return Err(ClassFileError::BadMagic(magic));
    }
    let minor = r.u16()?;
    let major = r.u16()?;
    let cp = ConstantPool::parse(&mut r)?;

    r.skip(2)?; // access_flags
    let name = cp.class_name(r.u16()?)?.to_owned();
    r.skip(2)?; // super_class, 0 for java/lang/Object
    let interfaces = usize::from(r.u16()?);
    r.skip(interfaces * 2)?;

    let fields = read_members(&mut r, &cp, Context::Field)?;
    let methods = read_members(&mut r, &cp, Context::Method)?;
    let class_attributes = Attributes::read(&mut r, &cp, Context::Class)?;

    debug!(
        class = %name,
        major,
        minor,
        fields = fields.len(),
        methods = methods.len(),
        "Decoded class file"
    );

    let mut events = vec![ClassEvent::Class { name }];
    class_attributes.emit(&mut events);
    for member in fields.into_iter().chain(methods) {
        let name = member.name;
        events.push(match member.kind {
            Context::Field => ClassEvent::Field { name },
            _ => ClassEvent::Method { name },
        });
        member.attributes.emit(&mut events);
    }

    Ok(events)
}

/// [`ClassDecoder`] for JVM class files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassFileDecoder;

impl ClassFileDecoder {
    /// Creates a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ClassDecoder for ClassFileDecoder {
    fn decode(&self, bytes: &[u8]) -> std::result::Result<Vec<ClassEvent>, DecodeError> {
        Ok(decode_class(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{ClassFileBuilder, TypeTarget};
    use clann_core::{LocalVariableRange, TypePath, TypePathStep, TypeRefSort};

    fn class(name: &str) -> ClassEvent {
        ClassEvent::Class { name: name.into() }
    }

    fn type_ann(sort: TypeRefSort, descriptor: &str) -> ClassEvent {
        ClassEvent::TypeAnnotation {
            sort,
            type_path: TypePath::empty(),
            annotation: Annotation::visible(descriptor),
        }
    }

    #[test]
    fn minimal_class_emits_only_the_header() {
        let bytes = ClassFileBuilder::new("com/example/Empty").build();
        assert_eq!(decode_class(&bytes).unwrap(), vec![class("com/example/Empty")]);
    }

    #[test]
    fn class_annotations_precede_members() {
        let bytes = ClassFileBuilder::new("a/Sample")
            .field("count", "I")
            .annotation("La/Inject;", true)
            .method("run", "()V")
            .annotation("La/Timed;", false)
            .class_annotation("La/Entity;", true)
            .class_annotation("La/Generated;", false)
            .build();

        assert_eq!(
            decode_class(&bytes).unwrap(),
            vec![
                class("a/Sample"),
                ClassEvent::Annotation(Annotation::visible("La/Entity;")),
                ClassEvent::Annotation(Annotation::invisible("La/Generated;")),
                ClassEvent::Field {
                    name: "count".into()
                },
                ClassEvent::Annotation(Annotation::visible("La/Inject;")),
                ClassEvent::Method { name: "run".into() },
                ClassEvent::Annotation(Annotation::invisible("La/Timed;")),
            ]
        );
    }

    #[test]
    fn declaration_type_annotations_keep_their_sort() {
        let bytes = ClassFileBuilder::new("a/Generic")
            .class_type_annotation(TypeTarget::ClassTypeParameter(0), "La/T;")
            .class_type_annotation(TypeTarget::ClassTypeParameterBound(0, 1), "La/B;")
            .class_type_annotation(TypeTarget::Supertype(0xFFFF), "La/E;")
            .method("get", "()Ljava/lang/Object;")
            .type_annotation(TypeTarget::Return, "La/R;")
            .type_annotation(TypeTarget::Throws(0), "La/X;")
            .type_annotation(TypeTarget::FormalParameter(0), "La/P;")
            .build();

        assert_eq!(
            decode_class(&bytes).unwrap(),
            vec![
                class("a/Generic"),
                type_ann(TypeRefSort::ClassTypeParameter, "La/T;"),
                type_ann(TypeRefSort::ClassTypeParameterBound, "La/B;"),
                type_ann(TypeRefSort::ClassExtends, "La/E;"),
                ClassEvent::Method { name: "get".into() },
                type_ann(TypeRefSort::MethodReturn, "La/R;"),
                type_ann(TypeRefSort::Throws, "La/X;"),
                type_ann(TypeRefSort::MethodFormalParameter, "La/P;"),
            ]
        );
    }

    #[test]
    fn parameter_annotations_follow_type_annotations() {
        let bytes = ClassFileBuilder::new("a/Params")
            .method("call", "(II)V")
            .parameter_annotation(1, "La/NotNull;", true)
            .annotation("La/Deprecated;", true)
            .type_annotation(TypeTarget::Receiver, "La/Recv;")
            .parameter_annotation(0, "La/Hidden;", false)
            .build();

        assert_eq!(
            decode_class(&bytes).unwrap(),
            vec![
                class("a/Params"),
                ClassEvent::Method {
                    name: "call".into()
                },
                ClassEvent::Annotation(Annotation::visible("La/Deprecated;")),
                type_ann(TypeRefSort::MethodReceiver, "La/Recv;"),
                ClassEvent::ParameterAnnotation {
                    parameter: 1,
                    annotation: Annotation::visible("La/NotNull;"),
                },
                ClassEvent::ParameterAnnotation {
                    parameter: 0,
                    annotation: Annotation::invisible("La/Hidden;"),
                },
            ]
        );
    }

    #[test]
    fn code_type_annotations_are_dispatched_by_target() {
        let bytes = ClassFileBuilder::new("a/Body")
            .method("work", "()V")
            .code_type_annotation(
                TypeTarget::LocalVariable {
                    start_pc: 0,
                    length: 1,
                    index: 1,
                },
                "La/Local;",
            )
            .code_type_annotation(TypeTarget::ExceptionParameter(0), "La/Caught;")
            .code_type_annotation(TypeTarget::New(0), "La/Fresh;")
            .build();

        assert_eq!(
            decode_class(&bytes).unwrap(),
            vec![
                class("a/Body"),
                ClassEvent::Method {
                    name: "work".into()
                },
                ClassEvent::LocalVariableAnnotation {
                    sort: TypeRefSort::LocalVariable,
                    type_path: TypePath::empty(),
                    ranges: vec![LocalVariableRange {
                        start_pc: 0,
                        length: 1,
                        index: 1
                    }],
                    annotation: Annotation::visible("La/Local;"),
                },
                ClassEvent::TryCatchAnnotation {
                    exception_index: 0,
                    type_path: TypePath::empty(),
                    annotation: Annotation::visible("La/Caught;"),
                },
                type_ann(TypeRefSort::New, "La/Fresh;"),
            ]
        );
    }

    #[test]
    fn type_paths_are_decoded() {
        let bytes = ClassFileBuilder::new("a/Paths")
            .field("names", "Ljava/util/List;")
            .type_annotation_with_path(
                TypeTarget::Field,
                &[TypePathStep::TypeArgument(0), TypePathStep::ArrayElement],
                "La/Elem;",
            )
            .build();

        let events = decode_class(&bytes).unwrap();
        assert_eq!(
            events[2],
            ClassEvent::TypeAnnotation {
                sort: TypeRefSort::Field,
                type_path: TypePath {
                    steps: vec![TypePathStep::TypeArgument(0), TypePathStep::ArrayElement]
                },
                annotation: Annotation::visible("La/Elem;"),
            }
        );
    }

    #[test]
    fn element_values_and_unknown_attributes_are_skipped() {
        let bytes = ClassFileBuilder::new("a/Values")
            .long_constant(7)
            .class_annotation_with_values("La/Config;")
            .custom_class_attribute("SourceFile", &[0, 1])
            .build();

        assert_eq!(
            decode_class(&bytes).unwrap(),
            vec![
                class("a/Values"),
                ClassEvent::Annotation(Annotation::visible("La/Config;")),
            ]
        );
    }

    #[test]
    fn modified_utf8_names_decode() {
        let bytes = ClassFileBuilder::new("a/Caf\u{e9}\u{1F600}").build();
        assert_eq!(
            decode_class(&bytes).unwrap(),
            vec![class("a/Caf\u{e9}\u{1F600}")]
        );
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = ClassFileBuilder::new("a/A").build();
        bytes[0] = 0;
        assert_eq!(
            decode_class(&bytes).unwrap_err(),
            ClassFileError::BadMagic(0x00FE_BABE)
        );
    }

    #[test]
    fn every_truncation_is_an_error() {
        let bytes = ClassFileBuilder::new("a/Full")
            .class_annotation("La/A;", true)
            .field("f", "I")
            .type_annotation(TypeTarget::Field, "La/B;")
            .method("m", "(I)V")
            .parameter_annotation(0, "La/C;", false)
            .code_type_annotation(TypeTarget::ExceptionParameter(0), "La/D;")
            .build();

        assert!(decode_class(&bytes).is_ok());
        for len in 0..bytes.len() {
            assert!(decode_class(&bytes[..len]).is_err(), "prefix of {len} bytes decoded");
        }
    }

    #[test]
    fn unknown_target_type_is_an_error() {
        let bytes = ClassFileBuilder::new("a/Odd")
            .class_type_annotation(TypeTarget::Raw(0x20, Vec::new()), "La/A;")
            .build();
        assert_eq!(
            decode_class(&bytes).unwrap_err(),
            ClassFileError::UnknownTargetType(0x20)
        );
    }

    #[test]
    fn decoder_wraps_errors() {
        let err = ClassFileDecoder::new().decode(b"not a class").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Failed to parse class file content: bad magic number"));
    }
}
