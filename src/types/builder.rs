//! Base-type construction from declaration keywords.
//!
//! Keywords are folded in one at a time, the way a C parser sees them. The
//! accepted size combinations follow C:
//!
//! ```text
//!             char   short  int    long   longlong
//! char        -      -      -      -      -
//! short       -      -      ok     -      -
//! int         -      ok     -      ok     ok
//! long        -      -      ok     ok     -
//! longlong    -      -      ok     -      -
//! ```
//!
//! A rejected size keyword only warns and leaves the type as it was.

use crate::interpreter::errors::{Diagnostics, ErrorKind, RuntimeError, Warning};
use crate::target::TargetProfile;

use super::attr::{Keyword, KeywordClass, TypeAttr};
use super::{BaseIdx, Type, TypeIdx, TypeKind};

/// Accumulates keywords into a base type
#[derive(Debug, Clone)]
pub struct TypeBuilder<'p> {
    profile: &'p TargetProfile,
    attr: TypeAttr,
    saw_int: bool,
    longs: u8,
}

impl<'p> TypeBuilder<'p> {
    /// Start from a first keyword
    pub fn new(profile: &'p TargetProfile, first: Keyword) -> Self {
        let mut attr = first.attr();
        if first.class() == KeywordClass::Sign {
            attr |= TypeAttr::USER_SIGN;
        }
        TypeBuilder {
            profile,
            attr,
            saw_int: first == Keyword::Int,
            longs: match first {
                Keyword::Long => 1,
                Keyword::LongLong => 2,
                _ => 0,
            },
        }
    }

    /// Start from the profile's default base type (native word, default sign)
    pub fn native(profile: &'p TargetProfile) -> Self {
        let size = if profile.word_size() == 8 {
            TypeAttr::LONG_LONG
        } else {
            TypeAttr::INT
        };
        let sign = if profile.default_signed() {
            TypeAttr::SIGNED
        } else {
            TypeAttr::UNSIGNED
        };
        TypeBuilder {
            profile,
            attr: size | sign,
            saw_int: false,
            longs: 0,
        }
    }

    pub fn attr(&self) -> TypeAttr {
        self.attr
    }

    /// Fold one more keyword in
    pub fn add(
        &mut self,
        keyword: Keyword,
        diagnostics: &mut Diagnostics,
    ) -> Result<&mut Self, RuntimeError> {
        match keyword.class() {
            KeywordClass::Size => self.add_size(keyword, diagnostics),
            KeywordClass::Sign => self.add_sign(keyword, diagnostics)?,
            KeywordClass::Storage => {
                if self.attr.storage().is_empty() {
                    self.attr |= keyword.attr();
                } else {
                    diagnostics.warn(Warning::SupplementalStorage { keyword });
                }
            }
            KeywordClass::Qualifier => self.attr |= keyword.attr(),
            KeywordClass::Void => {
                if self.attr.intersects(TypeAttr::SIZE_MASK | TypeAttr::VOID) {
                    diagnostics.warn(Warning::InvalidSizeCombination { keyword });
                } else {
                    self.attr |= TypeAttr::VOID;
                }
            }
        }
        Ok(self)
    }

    fn add_size(&mut self, keyword: Keyword, diagnostics: &mut Diagnostics) {
        let before = self.attr;
        let mut accepted = false;
        let attr = &mut self.attr;

        if !attr.contains(TypeAttr::VOID) {
            match keyword {
                Keyword::Long => {
                    // a third `long` is rejected
                    if !attr.intersects(TypeAttr::CHAR | TypeAttr::SHORT) && self.longs < 2 {
                        self.longs += 1;
                        accepted = true;
                        if self.longs == 2 {
                            attr.remove(TypeAttr::LONG);
                            attr.insert(TypeAttr::LONG_LONG);
                        } else {
                            attr.insert(TypeAttr::LONG);
                        }
                    }
                }
                Keyword::LongLong => {
                    if !attr.intersects(TypeAttr::CHAR | TypeAttr::SHORT) && self.longs == 0 {
                        self.longs = 2;
                        attr.insert(TypeAttr::LONG_LONG);
                    }
                }
                Keyword::Int => {
                    if !self.saw_int && !attr.contains(TypeAttr::CHAR) {
                        self.saw_int = true;
                        accepted = true;
                        // `long int` and `long long int` keep their size
                        if !attr.intersects(TypeAttr::LONG | TypeAttr::LONG_LONG) {
                            attr.insert(TypeAttr::INT);
                        }
                    }
                }
                Keyword::Short => {
                    if !attr.intersects(
                        TypeAttr::SHORT | TypeAttr::CHAR | TypeAttr::LONG | TypeAttr::LONG_LONG,
                    ) {
                        attr.insert(TypeAttr::SHORT);
                    }
                }
                Keyword::Char => {
                    if !attr.intersects(TypeAttr::SIZE_MASK) {
                        attr.insert(TypeAttr::CHAR);
                    }
                }
                _ => {}
            }
        }

        if self.attr == before && !accepted {
            diagnostics.warn(Warning::InvalidSizeCombination { keyword });
        }
    }

    fn add_sign(
        &mut self,
        keyword: Keyword,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), RuntimeError> {
        let sign = keyword.attr();
        if self.attr.contains(TypeAttr::USER_SIGN) {
            if self.attr.sign() == sign {
                diagnostics.warn(Warning::DuplicateSpecifier { keyword });
            } else {
                return Err(ErrorKind::InvalidSpecifierCombination.into());
            }
        }
        // the last sign written wins
        self.attr.remove(TypeAttr::SIGN_MASK);
        self.attr |= sign | TypeAttr::USER_SIGN;
        Ok(())
    }

    /// Apply default sign and size, then resolve the canonical identity
    pub fn finish(self) -> Type {
        let mut attr = self.attr;
        if attr.contains(TypeAttr::VOID) {
            return Type::void().with_attr(attr);
        }
        if attr.sign().is_empty() {
            if attr.contains(TypeAttr::CHAR) && !self.profile.default_signed() {
                attr |= TypeAttr::UNSIGNED;
            } else {
                attr |= TypeAttr::SIGNED;
            }
        }
        if attr.size_class().is_empty() {
            attr |= TypeAttr::INT;
        }
        base_type_from_attr(self.profile, attr)
    }
}

/// Map an attribute set to one of the eight canonical identities and its size.
///
/// Without a sign the default applies: the profile's default for `char`,
/// signed for everything else. `long` is 4 or 8 bytes depending on the target
/// word size.
pub fn resolve_canonical_index(profile: &TargetProfile, attr: TypeAttr) -> (BaseIdx, usize) {
    let (size, default_signed) = if attr.contains(TypeAttr::CHAR) {
        (1, profile.default_signed())
    } else if attr.contains(TypeAttr::SHORT) {
        (2, true)
    } else if attr.contains(TypeAttr::LONG_LONG) {
        (8, true)
    } else if attr.contains(TypeAttr::LONG) {
        (profile.word_size(), true)
    } else {
        (4, true)
    };

    let signed = if attr.contains(TypeAttr::SIGNED) {
        true
    } else if attr.contains(TypeAttr::UNSIGNED) {
        false
    } else {
        default_signed
    };

    let idx = match (size, signed) {
        (1, true) => BaseIdx::SignedChar,
        (1, false) => BaseIdx::UnsignedChar,
        (2, true) => BaseIdx::SignedShort,
        (2, false) => BaseIdx::UnsignedShort,
        (8, true) => BaseIdx::SignedLongLong,
        (8, false) => BaseIdx::UnsignedLongLong,
        (_, true) => BaseIdx::SignedInt,
        (_, false) => BaseIdx::UnsignedInt,
    };
    (idx, idx.size())
}

pub(crate) fn base_type_from_attr(profile: &TargetProfile, attr: TypeAttr) -> Type {
    let (idx, size) = resolve_canonical_index(profile, attr);
    Type {
        kind: TypeKind::Base,
        size,
        attr,
        idx: TypeIdx::Base(idx),
        ref_depth: 0,
        pointee: TypeKind::Base,
        dims: None,
    }
}

/// Build a base type from a keyword sequence such as `[Unsigned, Long, Long]`.
///
/// An empty sequence yields the profile's native type.
pub fn new_base_type(
    profile: &TargetProfile,
    keywords: &[Keyword],
    diagnostics: &mut Diagnostics,
) -> Result<Type, RuntimeError> {
    let Some((&first, rest)) = keywords.split_first() else {
        return Ok(TypeBuilder::native(profile).finish());
    };
    let mut builder = TypeBuilder::new(profile, first);
    for &keyword in rest {
        builder.add(keyword, diagnostics)?;
    }
    Ok(builder.finish())
}
