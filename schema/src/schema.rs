use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The fixed-width integer keywords of the schema language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntKind {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
}

impl IntKind {
    /// Maps an integer keyword to its kind. `int` is an alias of `int32`.
    pub fn from_keyword(keyword: &str) -> Option<IntKind> {
        match keyword {
            "int8" => Some(IntKind::Int8),
            "uint8" => Some(IntKind::UInt8),
            "int16" => Some(IntKind::Int16),
            "uint16" => Some(IntKind::UInt16),
            "int32" | "int" => Some(IntKind::Int32),
            "uint32" => Some(IntKind::UInt32),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            IntKind::Int8 => "int8",
            IntKind::UInt8 => "uint8",
            IntKind::Int16 => "int16",
            IntKind::UInt16 => "uint16",
            IntKind::Int32 => "int32",
            IntKind::UInt32 => "uint32",
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            IntKind::Int8 | IntKind::UInt8 => 8,
            IntKind::Int16 | IntKind::UInt16 => 16,
            IntKind::Int32 | IntKind::UInt32 => 32,
        }
    }

    /// Number of bytes this kind occupies on the wire.
    pub fn width(self) -> usize {
        (self.bits() / 8) as usize
    }

    pub fn is_signed(self) -> bool {
        matches!(self, IntKind::Int8 | IntKind::Int16 | IntKind::Int32)
    }

    /// The min/max representable by this kind's width and signedness.
    pub fn intrinsic_range(self) -> IntRange {
        let bits = self.bits();
        if self.is_signed() {
            IntRange {
                min: -(1i64 << (bits - 1)),
                max: (1i64 << (bits - 1)) - 1,
            }
        } else {
            IntRange {
                min: 0,
                max: (1i64 << bits) - 1,
            }
        }
    }
}

/// An inclusive `[min,max]` integer interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl IntRange {
    pub fn new(min: i64, max: i64) -> IntRange {
        IntRange { min, max }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }

    /// True when every value of `self` also lies in `outer`.
    pub fn is_within(&self, outer: &IntRange) -> bool {
        outer.min <= self.min && self.max <= outer.max
    }
}

impl fmt::Display for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{},{}]", self.min, self.max)
    }
}

/// A field's declared type, as written in the schema.
///
/// Bare identifiers stay unresolved (`Named`) until a value is validated,
/// encoded or decoded, which is what allows a struct to reference types that
/// are declared later in the document, or itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    Bool,
    Utf8String,
    Float32,
    Float64,
    AnyJson,
    SizedInteger {
        int: IntKind,
        range: Option<IntRange>,
    },
    Named {
        name: String,
    },
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeRef::Bool => f.write_str("bool"),
            TypeRef::Utf8String => f.write_str("string"),
            TypeRef::Float32 => f.write_str("float32"),
            TypeRef::Float64 => f.write_str("float64"),
            TypeRef::AnyJson => f.write_str("any"),
            TypeRef::SizedInteger { int, range: None } => f.write_str(int.keyword()),
            TypeRef::SizedInteger {
                int,
                range: Some(range),
            } => write!(f, "{}{}", int.keyword(), range),
            TypeRef::Named { name } => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Raw default literal text, kept exactly as written.
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

/// An enumeration with bidirectional name/value lookup.
///
/// Several members may share a value; `name_of` then answers with the member
/// declared last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDef {
    pub name: String,
    pub members: Vec<EnumMember>,
    #[serde(skip)]
    name_to_value: HashMap<String, i64>,
    #[serde(skip)]
    value_to_name: HashMap<i64, String>,
}

impl EnumDef {
    pub fn new(name: String, members: Vec<EnumMember>) -> EnumDef {
        let mut name_to_value = HashMap::new();
        let mut value_to_name = HashMap::new();
        for member in &members {
            name_to_value.insert(member.name.clone(), member.value);
            value_to_name.insert(member.value, member.name.clone());
        }
        EnumDef {
            name,
            members,
            name_to_value,
            value_to_name,
        }
    }

    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.name_to_value.get(name).copied()
    }

    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.value_to_name.get(&value).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDef {
    pub name: String,
    /// Declaration order is wire order.
    pub fields: Vec<FieldDef>,
    /// Enums declared inside the struct body. These shadow global enums.
    pub enums: BTreeMap<String, EnumDef>,
}

impl StructDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn local_enum(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }
}

/// A compiled schema: the struct registry plus the global enum table.
///
/// Built once by the compiler and never mutated afterwards; every encode and
/// decode only borrows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaDocument {
    structs: BTreeMap<String, StructDef>,
    enums: BTreeMap<String, EnumDef>,
}

impl SchemaDocument {
    pub fn new(structs: BTreeMap<String, StructDef>, enums: BTreeMap<String, EnumDef>) -> SchemaDocument {
        SchemaDocument { structs, enums }
    }

    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(name)
    }

    pub fn global_enum(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDef> {
        self.structs.values()
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDef> {
        self.enums.values()
    }
}
