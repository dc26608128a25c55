use ast::Parameter;
use itertools::Itertools;
use std::{
    collections::{hash_map::Entry, HashMap},
    fmt,
    rc::Rc,
};
use strum_macros::{Display, EnumString};

/// The built-in value types. `String` is treated like a primitive: it only
/// accepts itself.
#[derive(Display, EnumString, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    #[strum(serialize = "byte")]
    Byte,
    #[strum(serialize = "short")]
    Short,
    #[strum(serialize = "char")]
    Char,
    #[strum(serialize = "int")]
    Int,
    #[strum(serialize = "long")]
    Long,
    #[strum(serialize = "float")]
    Float,
    #[strum(serialize = "double")]
    Double,
    #[strum(serialize = "boolean")]
    Boolean,
    #[strum(to_string = "String", serialize = "string")]
    String,
}

impl PrimitiveType {
    /// Every type a value of `self` may be assigned to without a cast,
    /// `self` included.
    pub fn widens_to(self) -> &'static [PrimitiveType] {
        use self::PrimitiveType::*;
        match self {
            Byte => &[Byte, Short, Int, Long, Float, Double],
            Short => &[Short, Int, Long, Float, Double],
            Char => &[Char, Int, Long, Float, Double],
            Int => &[Int, Long, Float, Double],
            Long => &[Long, Float, Double],
            Float => &[Float, Double],
            Double => &[Double],
            Boolean => &[Boolean],
            String => &[String],
        }
    }

    /// Position in the numeric promotion order
    /// `byte < short < char < int < long < float < double`.
    /// `char` sits between `short` and `int` although neither widens to it.
    pub fn promotion_rank(self) -> Option<usize> {
        use self::PrimitiveType::*;
        match self {
            Byte => Some(0),
            Short => Some(1),
            Char => Some(2),
            Int => Some(3),
            Long => Some(4),
            Float => Some(5),
            Double => Some(6),
            Boolean | String => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.promotion_rank().is_some()
    }
}

/// The type of a variable, parameter, return value or expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CheckedType {
    Primitive(PrimitiveType),
    Void,
    /// Any other type name. Class types are not resolved, two class types
    /// are compatible only if their names are equal.
    Class(String),
    /// The type could not be determined. Checks involving it are skipped or
    /// downgraded to warnings.
    Unknown,
}

impl CheckedType {
    pub fn from_name(name: &str) -> CheckedType {
        match name {
            "void" => CheckedType::Void,
            "unknown" => CheckedType::Unknown,
            _ => match name.parse::<PrimitiveType>() {
                Ok(prim) => CheckedType::Primitive(prim),
                Err(_) => CheckedType::Class(name.to_string()),
            },
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == CheckedType::Unknown
    }

    pub fn is_numeric(&self) -> bool {
        match self {
            CheckedType::Primitive(prim) => prim.is_numeric(),
            _ => false,
        }
    }

    pub fn is_boolean(&self) -> bool {
        *self == CheckedType::Primitive(PrimitiveType::Boolean)
    }

    pub fn is_string(&self) -> bool {
        *self == CheckedType::Primitive(PrimitiveType::String)
    }
}

impl From<PrimitiveType> for CheckedType {
    fn from(prim: PrimitiveType) -> CheckedType {
        CheckedType::Primitive(prim)
    }
}

impl fmt::Display for CheckedType {
    fn fmt(&self, f: &'_ mut fmt::Formatter<'_>) -> fmt::Result {
        use self::CheckedType::*;
        match self {
            Primitive(prim) => write!(f, "{}", prim),
            Void => write!(f, "void"),
            Class(name) => write!(f, "{}", name),
            Unknown => write!(f, "unknown"),
        }
    }
}

/// `from` can be assigned to `to` if the types are equal or `from` widens to
/// `to`.
pub fn is_assignment_compatible(from: &CheckedType, to: &CheckedType) -> bool {
    if from == to {
        return true;
    }
    match (from, to) {
        (CheckedType::Primitive(from), CheckedType::Primitive(to)) => {
            from.widens_to().contains(to)
        }
        _ => false,
    }
}

/// The result type of numeric promotion, `Unknown` if either side is not
/// numeric.
pub fn wider(a: &CheckedType, b: &CheckedType) -> CheckedType {
    match (a, b) {
        (CheckedType::Primitive(pa), CheckedType::Primitive(pb)) => {
            match (pa.promotion_rank(), pb.promotion_rank()) {
                (Some(ra), Some(rb)) if ra >= rb => a.clone(),
                (Some(_), Some(_)) => b.clone(),
                _ => CheckedType::Unknown,
            }
        }
        _ => CheckedType::Unknown,
    }
}

#[derive(derive_more::Display, Debug, Clone, PartialEq, Eq)]
#[display(fmt = "{} {}", ty, name)]
pub struct MethodParamDef {
    pub name: String,
    pub ty: CheckedType,
    /// Recorded, but the checked type of an array parameter is its element
    /// type.
    pub is_array: bool,
}

impl From<&Parameter> for MethodParamDef {
    fn from(param: &Parameter) -> MethodParamDef {
        MethodParamDef {
            name: param.name.clone(),
            ty: CheckedType::from_name(&param.ty),
            is_array: param.is_array,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub return_ty: CheckedType,
    pub params: Vec<MethodParamDef>,
    /// Line of the declaration.
    pub line: usize,
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &'_ mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}({})",
            self.return_ty,
            self.name,
            self.params.iter().join(", ")
        )
    }
}

#[derive(Debug)]
pub struct MethodAlreadyDeclared {
    /// Line of the declaration that stays in the catalogue.
    pub line: usize,
}

/// Method signatures by name. There is no overloading: the first declaration
/// of a name wins.
#[derive(Debug, Default)]
pub struct SignatureCatalogue {
    signatures: HashMap<String, Rc<MethodSignature>>,
}

impl SignatureCatalogue {
    pub fn add_method(&mut self, signature: MethodSignature) -> Result<(), MethodAlreadyDeclared> {
        match self.signatures.entry(signature.name.clone()) {
            Entry::Occupied(e) => Err(MethodAlreadyDeclared { line: e.get().line }),
            Entry::Vacant(e) => {
                e.insert(Rc::new(signature));
                Ok(())
            }
        }
    }

    pub fn method(&self, name: &str) -> Option<Rc<MethodSignature>> {
        self.signatures.get(name).map(Rc::clone)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}
