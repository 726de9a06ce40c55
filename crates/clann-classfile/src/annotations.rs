//! Annotation attribute bodies (JVMS §4.7.16 - §4.7.20).

use clann_core::{Annotation, LocalVariableRange, TypePath, TypePathStep, TypeRefSort};

use crate::constant_pool::ConstantPool;
use crate::error::{ClassFileError, Result};
use crate::reader::ByteReader;

/// Deepest nesting of array and annotation element values accepted.
pub(crate) const MAX_VALUE_DEPTH: usize = 64;

/// Extra target information the classifier cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    LocalVariable(Vec<LocalVariableRange>),
    ExceptionParameter(u16),
    Other,
}

/// A decoded `type_annotation` structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TypeAnnotation {
    pub(crate) sort: TypeRefSort,
    pub(crate) target: Target,
    pub(crate) type_path: TypePath,
    pub(crate) annotation: Annotation,
}

/// Reads a `Runtime[In]VisibleAnnotations` body.
pub(crate) fn read_annotations(
    r: &mut ByteReader<'_>,
    cp: &ConstantPool,
    visible: bool,
    out: &mut Vec<Annotation>,
) -> Result<()> {
    let count = r.u16()?;
    for _ in 0..count {
        out.push(read_annotation(r, cp, visible)?);
    }
    Ok(())
}

/// Reads a `Runtime[In]VisibleParameterAnnotations` body.
pub(crate) fn read_parameter_annotations(
    r: &mut ByteReader<'_>,
    cp: &ConstantPool,
    visible: bool,
    out: &mut Vec<(u8, Annotation)>,
) -> Result<()> {
    let parameters = r.u8()?;
    for parameter in 0..parameters {
        let count = r.u16()?;
        for _ in 0..count {
            out.push((parameter, read_annotation(r, cp, visible)?));
        }
    }
    Ok(())
}

/// Reads a `Runtime[In]VisibleTypeAnnotations` body.
pub(crate) fn read_type_annotations(
    r: &mut ByteReader<'_>,
    cp: &ConstantPool,
    visible: bool,
    out: &mut Vec<TypeAnnotation>,
) -> Result<()> {
    let count = r.u16()?;
    for _ in 0..count {
        let target_type = r.u8()?;
        let sort = TypeRefSort::from_target_type(target_type)
            .ok_or(ClassFileError::UnknownTargetType(target_type))?;
        let target = read_target_info(r, sort)?;
        let type_path = read_type_path(r)?;
        let annotation = read_annotation(r, cp, visible)?;
        out.push(TypeAnnotation {
            sort,
            target,
            type_path,
            annotation,
        });
    }
    Ok(())
}

fn read_target_info(r: &mut ByteReader<'_>, sort: TypeRefSort) -> Result<Target> {
    use TypeRefSort as S;

    match sort {
        S::ClassTypeParameter | S::MethodTypeParameter | S::MethodFormalParameter => r.skip(1)?,
        S::ClassTypeParameterBound
        | S::MethodTypeParameterBound
        | S::ClassExtends
        | S::Throws
        | S::Instanceof
        | S::New
        | S::ConstructorReference
        | S::MethodReference => r.skip(2)?,
        S::Field | S::MethodReturn | S::MethodReceiver => {}
        S::LocalVariable | S::ResourceVariable => {
            let length = r.u16()?;
            let ranges = (0..length)
                .map(|_| {
                    Ok(LocalVariableRange {
                        start_pc: r.u16()?,
                        length: r.u16()?,
                        index: r.u16()?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(Target::LocalVariable(ranges));
        }
        S::ExceptionParameter => return Ok(Target::ExceptionParameter(r.u16()?)),
        S::Cast
        | S::ConstructorInvocationTypeArgument
        | S::MethodInvocationTypeArgument
        | S::ConstructorReferenceTypeArgument
        | S::MethodReferenceTypeArgument => r.skip(3)?,
    }
    Ok(Target::Other)
}

fn read_type_path(r: &mut ByteReader<'_>) -> Result<TypePath> {
    let length = r.u8()?;
    let steps = (0..length)
        .map(|_| {
            let kind = r.u8()?;
            let argument = r.u8()?;
            match kind {
                0 => Ok(TypePathStep::ArrayElement),
                1 => Ok(TypePathStep::InnerType),
                2 => Ok(TypePathStep::WildcardBound),
                3 => Ok(TypePathStep::TypeArgument(argument)),
                _ => Err(ClassFileError::UnknownTypePathKind(kind)),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TypePath { steps })
}

/// Reads one `annotation` structure, skipping its element values.
fn read_annotation(r: &mut ByteReader<'_>, cp: &ConstantPool, visible: bool) -> Result<Annotation> {
    let descriptor = read_annotation_at_depth(r, cp, 0)?;
    Ok(Annotation {
        descriptor,
        visible,
    })
}

fn read_annotation_at_depth(r: &mut ByteReader<'_>, cp: &ConstantPool, depth: usize) -> Result<String> {
    let type_index = r.u16()?;
    let descriptor = cp.utf8(type_index)?.to_owned();
    let pairs = r.u16()?;
    for _ in 0..pairs {
        cp.utf8(r.u16()?)?;
        skip_element_value(r, cp, depth + 1)?;
    }
    Ok(descriptor)
}

fn skip_element_value(r: &mut ByteReader<'_>, cp: &ConstantPool, depth: usize) -> Result<()> {
    if depth > MAX_VALUE_DEPTH {
        return Err(ClassFileError::NestingTooDeep(MAX_VALUE_DEPTH));
    }
    let tag = r.u8()?;
    match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' | b'c' => r.skip(2)?,
        b'e' => r.skip(4)?,
        b'@' => {
            read_annotation_at_depth(r, cp, depth)?;
        }
        b'[' => {
            let count = r.u16()?;
            for _ in 0..count {
                skip_element_value(r, cp, depth + 1)?;
            }
        }
        _ => return Err(ClassFileError::UnknownElementTag(tag)),
    }
    Ok(())
}
