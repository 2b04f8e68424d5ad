//! Big-endian binary NBT codec (spec §4.4): reads and writes the wire
//! grammar where a root tag is always a named [`NbtCompound`], strings are
//! length-prefixed `u16` Java modified-UTF-8, and every multi-byte integer
//! is big-endian.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::NbtError;
use crate::tag::{NbtCompound, NbtList, NbtTag, TagId};

type Result<T> = std::result::Result<T, NbtError>;

/// Reads a complete named root compound from `reader`, returning its name
/// and value. Opaque/unknown tags below the root are preserved verbatim
/// because every known tag id round-trips byte-for-byte through
/// [`NbtTag`] already; there is no "unknown tag" representation to lose.
pub fn read_named_compound(reader: &mut impl Read) -> Result<(String, NbtCompound)> {
    let tag_id = TagId::from_byte(reader.read_u8()?)?;
    if tag_id != TagId::Compound {
        return Err(NbtError::NoRootCompound);
    }
    let name = read_string(reader)?;
    let compound = read_compound_body(reader)?;
    Ok((name, compound))
}

/// Writes `compound` as a named root compound.
pub fn write_named_compound(writer: &mut impl Write, name: &str, compound: &NbtCompound) -> Result<()> {
    writer.write_u8(TagId::Compound.to_byte())?;
    write_string(writer, name)?;
    write_compound_body(writer, compound)?;
    Ok(())
}

fn read_compound_body(reader: &mut impl Read) -> Result<NbtCompound> {
    let mut compound = NbtCompound::new();
    loop {
        let tag_id = TagId::from_byte(reader.read_u8()?)?;
        if tag_id == TagId::End {
            break;
        }
        let name = read_string(reader)?;
        let value = read_payload(reader, tag_id)?;
        compound.insert(name, value);
    }
    Ok(compound)
}

fn write_compound_body(writer: &mut impl Write, compound: &NbtCompound) -> Result<()> {
    for (name, value) in compound.iter() {
        writer.write_u8(TagId::of(value).to_byte())?;
        write_string(writer, name)?;
        write_payload(writer, value)?;
    }
    writer.write_u8(TagId::End.to_byte())?;
    Ok(())
}

fn read_payload(reader: &mut impl Read, tag_id: TagId) -> Result<NbtTag> {
    Ok(match tag_id {
        TagId::End => return Err(NbtError::MalformedNbt("unexpected end tag".into())),
        TagId::Byte => NbtTag::Byte(reader.read_i8()?),
        TagId::Short => NbtTag::Short(reader.read_i16::<BigEndian>()?),
        TagId::Int => NbtTag::Int(reader.read_i32::<BigEndian>()?),
        TagId::Long => NbtTag::Long(reader.read_i64::<BigEndian>()?),
        TagId::Float => NbtTag::Float(reader.read_f32::<BigEndian>()?),
        TagId::Double => NbtTag::Double(reader.read_f64::<BigEndian>()?),
        TagId::ByteArray => {
            let len = read_array_len(reader)?;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;
            NbtTag::ByteArray(buf.into_iter().map(|b| b as i8).collect())
        }
        TagId::String => NbtTag::String(read_string(reader)?),
        TagId::List => NbtTag::List(read_list(reader)?),
        TagId::Compound => NbtTag::Compound(read_compound_body(reader)?),
        TagId::IntArray => {
            let len = read_array_len(reader)?;
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(reader.read_i32::<BigEndian>()?);
            }
            NbtTag::IntArray(values)
        }
        TagId::LongArray => {
            let len = read_array_len(reader)?;
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(reader.read_i64::<BigEndian>()?);
            }
            NbtTag::LongArray(values)
        }
    })
}

fn write_payload(writer: &mut impl Write, tag: &NbtTag) -> Result<()> {
    match tag {
        NbtTag::Byte(v) => writer.write_i8(*v)?,
        NbtTag::Short(v) => writer.write_i16::<BigEndian>(*v)?,
        NbtTag::Int(v) => writer.write_i32::<BigEndian>(*v)?,
        NbtTag::Long(v) => writer.write_i64::<BigEndian>(*v)?,
        NbtTag::Float(v) => writer.write_f32::<BigEndian>(*v)?,
        NbtTag::Double(v) => writer.write_f64::<BigEndian>(*v)?,
        NbtTag::ByteArray(v) => {
            writer.write_i32::<BigEndian>(v.len() as i32)?;
            for b in v {
                writer.write_i8(*b)?;
            }
        }
        NbtTag::String(v) => write_string(writer, v)?,
        NbtTag::List(v) => write_list(writer, v)?,
        NbtTag::Compound(v) => write_compound_body(writer, v)?,
        NbtTag::IntArray(v) => {
            writer.write_i32::<BigEndian>(v.len() as i32)?;
            for n in v {
                writer.write_i32::<BigEndian>(*n)?;
            }
        }
        NbtTag::LongArray(v) => {
            writer.write_i32::<BigEndian>(v.len() as i32)?;
            for n in v {
                writer.write_i64::<BigEndian>(*n)?;
            }
        }
    }
    Ok(())
}

fn read_array_len(reader: &mut impl Read) -> Result<usize> {
    let len = reader.read_i32::<BigEndian>()?;
    usize::try_from(len).map_err(|_| NbtError::MalformedNbt(format!("negative array length {len}")))
}

fn read_list(reader: &mut impl Read) -> Result<NbtList> {
    let element_type = TagId::from_byte(reader.read_u8()?)?;
    let len = read_array_len(reader)?;
    if len == 0 {
        return Ok(NbtList::empty_typed(element_type));
    }
    let mut values = Vec::with_capacity(len);
    for _ in 0..len {
        values.push(read_payload(reader, element_type)?);
    }
    Ok(NbtList::from_homogeneous(element_type, values))
}

fn write_list(writer: &mut impl Write, list: &NbtList) -> Result<()> {
    writer.write_u8(list.element_type().to_byte())?;
    writer.write_i32::<BigEndian>(list.len() as i32)?;
    for value in list.values() {
        write_payload(writer, value)?;
    }
    Ok(())
}

/// Reads a length-prefixed (`u16` big-endian) Java modified-UTF-8 string.
pub fn read_string(reader: &mut impl Read) -> Result<String> {
    let len = reader.read_u16::<BigEndian>()? as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    cesu8::from_java_cesu8(&buf)
        .map(|cow| cow.into_owned())
        .map_err(|_| NbtError::InvalidModifiedUtf8(String::from_utf8_lossy(&buf).into_owned()))
}

/// Writes a string as a length-prefixed (`u16` big-endian) Java
/// modified-UTF-8 byte sequence.
pub fn write_string(writer: &mut impl Write, value: &str) -> Result<()> {
    let encoded = cesu8::to_java_cesu8(value);
    let len = u16::try_from(encoded.len())
        .map_err(|_| NbtError::MalformedNbt(format!("string too long: {} bytes", encoded.len())))?;
    writer.write_u16::<BigEndian>(len)?;
    writer.write_all(&encoded)?;
    Ok(())
}
