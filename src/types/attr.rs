//! Type attribute set and the declaration keywords that build it.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Orthogonal attributes of a type: size class, signedness, storage
    /// class, qualifiers and a couple of markers.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct TypeAttr: u32 {
        // size class
        const CHAR = 1 << 0;
        const SHORT = 1 << 1;
        const INT = 1 << 2;
        const LONG = 1 << 3;
        const LONG_LONG = 1 << 4;

        // signedness
        const SIGNED = 1 << 8;
        const UNSIGNED = 1 << 9;
        /// The sign was written out by the user rather than defaulted.
        const USER_SIGN = 1 << 10;

        // storage class
        const STATIC = 1 << 12;
        const REGISTER = 1 << 13;
        const EXTERN = 1 << 14;
        const TYPEDEF = 1 << 15;

        // qualifiers
        const CONST = 1 << 16;
        const VOLATILE = 1 << 17;

        // markers
        const VOID = 1 << 20;
        /// Base value that came from an enumeration.
        const ENUM = 1 << 21;
    }
}

impl Default for TypeAttr {
    fn default() -> Self {
        Self::empty()
    }
}

impl TypeAttr {
    pub const SIZE_MASK: Self = Self::CHAR
        .union(Self::SHORT)
        .union(Self::INT)
        .union(Self::LONG)
        .union(Self::LONG_LONG);
    pub const SIGN_MASK: Self = Self::SIGNED.union(Self::UNSIGNED);
    pub const STORAGE_MASK: Self = Self::STATIC
        .union(Self::REGISTER)
        .union(Self::EXTERN)
        .union(Self::TYPEDEF);

    #[inline]
    pub fn size_class(self) -> Self {
        self & Self::SIZE_MASK
    }

    #[inline]
    pub fn sign(self) -> Self {
        self & Self::SIGN_MASK
    }

    #[inline]
    pub fn storage(self) -> Self {
        self & Self::STORAGE_MASK
    }
}

/// What a keyword contributes to a type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordClass {
    Size,
    Sign,
    Storage,
    Qualifier,
    Void,
}

/// Declaration keywords understood by the base-type builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Void,
    Typedef,
    Extern,
    Static,
    Volatile,
    Const,
    Register,
    Unsigned,
    Signed,
    Char,
    Short,
    Int,
    Long,
    LongLong,
}

impl Keyword {
    /// Every keyword, in the order type names are rendered
    pub const ALL: [Keyword; 14] = [
        Keyword::Void,
        Keyword::Typedef,
        Keyword::Extern,
        Keyword::Static,
        Keyword::Volatile,
        Keyword::Const,
        Keyword::Register,
        Keyword::Unsigned,
        Keyword::Signed,
        Keyword::Char,
        Keyword::Short,
        Keyword::Int,
        Keyword::Long,
        Keyword::LongLong,
    ];

    pub fn attr(self) -> TypeAttr {
        match self {
            Keyword::Void => TypeAttr::VOID,
            Keyword::Typedef => TypeAttr::TYPEDEF,
            Keyword::Extern => TypeAttr::EXTERN,
            Keyword::Static => TypeAttr::STATIC,
            Keyword::Volatile => TypeAttr::VOLATILE,
            Keyword::Const => TypeAttr::CONST,
            Keyword::Register => TypeAttr::REGISTER,
            Keyword::Unsigned => TypeAttr::UNSIGNED,
            Keyword::Signed => TypeAttr::SIGNED,
            Keyword::Char => TypeAttr::CHAR,
            Keyword::Short => TypeAttr::SHORT,
            Keyword::Int => TypeAttr::INT,
            Keyword::Long => TypeAttr::LONG,
            Keyword::LongLong => TypeAttr::LONG_LONG,
        }
    }

    pub fn class(self) -> KeywordClass {
        match self {
            Keyword::Void => KeywordClass::Void,
            Keyword::Typedef | Keyword::Extern | Keyword::Static | Keyword::Register => {
                KeywordClass::Storage
            }
            Keyword::Volatile | Keyword::Const => KeywordClass::Qualifier,
            Keyword::Unsigned | Keyword::Signed => KeywordClass::Sign,
            Keyword::Char | Keyword::Short | Keyword::Int | Keyword::Long | Keyword::LongLong => {
                KeywordClass::Size
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Void => "void",
            Keyword::Typedef => "typedef",
            Keyword::Extern => "extern",
            Keyword::Static => "static",
            Keyword::Volatile => "volatile",
            Keyword::Const => "const",
            Keyword::Register => "register",
            Keyword::Unsigned => "unsigned",
            Keyword::Signed => "signed",
            Keyword::Char => "char",
            Keyword::Short => "short",
            Keyword::Int => "int",
            Keyword::Long => "long",
            Keyword::LongLong => "long long",
        }
    }

    /// Map a single source word to a keyword. `long long` is two words and
    /// is assembled by the builder from two `long`s.
    pub fn from_word(word: &str) -> Option<Self> {
        let kw = match word {
            "void" => Keyword::Void,
            "typedef" => Keyword::Typedef,
            "extern" => Keyword::Extern,
            "static" => Keyword::Static,
            "volatile" => Keyword::Volatile,
            "const" => Keyword::Const,
            "register" => Keyword::Register,
            "unsigned" => Keyword::Unsigned,
            "signed" => Keyword::Signed,
            "char" => Keyword::Char,
            "short" => Keyword::Short,
            "int" => Keyword::Int,
            "long" => Keyword::Long,
            _ => return None,
        };
        Some(kw)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
