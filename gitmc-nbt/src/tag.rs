//! The NBT value tree: [`TagId`], [`NbtTag`], [`NbtList`] and [`NbtCompound`].

use indexmap::IndexMap;

use crate::error::NbtError;

/// The one-byte tag id used on the wire and to track a [`NbtList`]'s
/// declared element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagId {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagId {
    pub fn from_byte(byte: u8) -> Result<Self, NbtError> {
        Ok(match byte {
            0 => TagId::End,
            1 => TagId::Byte,
            2 => TagId::Short,
            3 => TagId::Int,
            4 => TagId::Long,
            5 => TagId::Float,
            6 => TagId::Double,
            7 => TagId::ByteArray,
            8 => TagId::String,
            9 => TagId::List,
            10 => TagId::Compound,
            11 => TagId::IntArray,
            12 => TagId::LongArray,
            other => return Err(NbtError::InvalidTagId(other)),
        })
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn of(tag: &NbtTag) -> Self {
        match tag {
            NbtTag::Byte(_) => TagId::Byte,
            NbtTag::Short(_) => TagId::Short,
            NbtTag::Int(_) => TagId::Int,
            NbtTag::Long(_) => TagId::Long,
            NbtTag::Float(_) => TagId::Float,
            NbtTag::Double(_) => TagId::Double,
            NbtTag::ByteArray(_) => TagId::ByteArray,
            NbtTag::String(_) => TagId::String,
            NbtTag::List(_) => TagId::List,
            NbtTag::Compound(_) => TagId::Compound,
            NbtTag::IntArray(_) => TagId::IntArray,
            NbtTag::LongArray(_) => TagId::LongArray,
        }
    }
}

/// A homogeneous NBT list. Keeps the declared element type even when empty,
/// so that `[]` (a `Compound`-typed empty list by convention) round-trips
/// through SNBT and binary NBT identically to how it arrived.
#[derive(Debug, Clone)]
pub struct NbtList {
    element_type: TagId,
    values: Vec<NbtTag>,
}

impl NbtList {
    /// An empty list with the conventional default element type
    /// (`Compound`), matching vanilla's own empty-list convention.
    pub fn empty() -> Self {
        Self {
            element_type: TagId::Compound,
            values: Vec::new(),
        }
    }

    /// An empty list that remembers a specific declared element type.
    pub fn empty_typed(element_type: TagId) -> Self {
        Self {
            element_type,
            values: Vec::new(),
        }
    }

    /// Builds a list from already-homogeneous values. Returns
    /// [`NbtError::ListTypeMismatch`] if `values` are not all the same tag.
    pub fn new(values: Vec<NbtTag>) -> Result<Self, NbtError> {
        let element_type = match values.first() {
            Some(first) => TagId::of(first),
            None => return Ok(Self::empty()),
        };
        for v in &values {
            let found = TagId::of(v);
            if found != element_type {
                return Err(NbtError::ListTypeMismatch {
                    declared: element_type,
                    found,
                });
            }
        }
        Ok(Self {
            element_type,
            values,
        })
    }

    /// Builds a list from values already known to share `element_type`
    /// (the binary and SNBT readers enforce this as they decode each
    /// element, so no separate check is needed here).
    pub(crate) fn from_homogeneous(element_type: TagId, values: Vec<NbtTag>) -> Self {
        Self {
            element_type,
            values,
        }
    }

    pub fn element_type(&self) -> TagId {
        self.element_type
    }

    pub fn values(&self) -> &[NbtTag] {
        &self.values
    }

    pub fn into_values(self) -> Vec<NbtTag> {
        self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Push a value, enforcing the list stays homogeneous with its
    /// declared element type. The declared type of an empty list adopts
    /// the first pushed value's type.
    pub fn push(&mut self, value: NbtTag) -> Result<(), NbtError> {
        let found = TagId::of(&value);
        if self.values.is_empty() {
            self.element_type = found;
        } else if found != self.element_type {
            return Err(NbtError::ListTypeMismatch {
                declared: self.element_type,
                found,
            });
        }
        self.values.push(value);
        Ok(())
    }
}

impl PartialEq for NbtList {
    fn eq(&self, other: &Self) -> bool {
        // An empty list's declared type only matters when both are empty;
        // a non-empty list's type follows from its elements already.
        if self.values.is_empty() && other.values.is_empty() {
            return self.element_type == other.element_type;
        }
        self.values == other.values
    }
}

/// A named-child container, terminated on the wire by a `TagId::End`
/// sentinel. Iteration order is insertion order, so round-tripping through
/// SNBT (or re-extracting an unchanged save) produces a stable diff.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NbtCompound {
    entries: IndexMap<String, NbtTag>,
}

impl NbtCompound {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&NbtTag> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<NbtTag>) -> Option<NbtTag> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<NbtTag> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, NbtTag> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a NbtCompound {
    type Item = (&'a String, &'a NbtTag);
    type IntoIter = indexmap::map::Iter<'a, String, NbtTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(String, NbtTag)> for NbtCompound {
    fn from_iter<T: IntoIterator<Item = (String, NbtTag)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A complete NBT value: one tagged payload, as described by §3 of the
/// engine's data model (Byte through Compound, plus the three typed
/// numeric array tags).
#[derive(Debug, Clone)]
pub enum NbtTag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(NbtList),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl PartialEq for NbtTag {
    fn eq(&self, other: &Self) -> bool {
        use NbtTag::*;
        match (self, other) {
            (Byte(a), Byte(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            // Bitwise comparison: the round-trip invariant must hold for
            // NaN and signed zero, neither of which IEEE equality treats
            // as self-equal (NaN) or distinct (+0.0 / -0.0).
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (ByteArray(a), ByteArray(b)) => a == b,
            (String(a), String(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Compound(a), Compound(b)) => a == b,
            (IntArray(a), IntArray(b)) => a == b,
            (LongArray(a), LongArray(b)) => a == b,
            _ => false,
        }
    }
}

macro_rules! from_variant {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for NbtTag {
            fn from(v: $ty) -> Self {
                NbtTag::$variant(v)
            }
        }
    };
}

from_variant!(i8, Byte);
from_variant!(i16, Short);
from_variant!(i32, Int);
from_variant!(i64, Long);
from_variant!(f32, Float);
from_variant!(f64, Double);
from_variant!(String, String);
from_variant!(NbtList, List);
from_variant!(NbtCompound, Compound);

impl From<&str> for NbtTag {
    fn from(v: &str) -> Self {
        NbtTag::String(v.to_owned())
    }
}

impl From<bool> for NbtTag {
    fn from(v: bool) -> Self {
        NbtTag::Byte(i8::from(v))
    }
}
