//! Parsing of type names such as `unsigned long`, `struct task *` or
//! `pid_t`, as found in casts and declarations.

use crate::interpreter::errors::{Diagnostics, ErrorKind, RuntimeError};
use crate::target::TargetProfile;

use super::attr::Keyword;
use super::builder::new_base_type;
use super::registry::TypeRegistry;
use super::{BaseIdx, Type, TypeKind};

impl TypeRegistry {
    /// Parse a type name.
    ///
    /// A tag that is not declared is accepted behind a pointer (it becomes an
    /// incomplete declaration) and rejected otherwise. A single unknown word
    /// is looked up as a typedef. `enum <tag>` names an `unsigned int`,
    /// declared or not.
    pub fn parse_type(
        &mut self,
        profile: &TargetProfile,
        text: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Type, RuntimeError> {
        let trimmed = text.trim_end_matches(|c: char| c == '*' || c.is_whitespace());
        let depth = text[trimmed.len()..].chars().filter(|&c| c == '*').count() as u32;
        let words: Vec<&str> = trimmed
            .split(|c: char| c.is_whitespace() || c == '*')
            .filter(|w| !w.is_empty())
            .collect();

        let mut t = match words.as_slice() {
            [] => {
                return Err(ErrorKind::UnknownType {
                    name: text.to_string(),
                }
                .into())
            }
            ["enum", _tag] => Type::base(BaseIdx::UnsignedInt),
            [kw @ ("struct" | "union" | "enum"), rest @ ..] => {
                let kind = match *kw {
                    "struct" => TypeKind::Struct,
                    "union" => TypeKind::Union,
                    _ => TypeKind::Enum,
                };
                self.parse_tagged(kind, rest, depth)?
            }
            [word] if Keyword::from_word(word).is_none() => match self.typedef(word) {
                Some(target) => target.clone(),
                None => {
                    return Err(ErrorKind::UnknownType {
                        name: word.to_string(),
                    }
                    .into())
                }
            },
            words => parse_keywords(profile, words, diagnostics)?,
        };

        t.push_ref(depth);
        Ok(t)
    }

    fn parse_tagged(
        &mut self,
        kind: TypeKind,
        rest: &[&str],
        depth: u32,
    ) -> Result<Type, RuntimeError> {
        match rest {
            [] => Ok(Type::anonymous(kind)),
            [name] => match self.lookup(kind, name) {
                Some(t) => Ok(t),
                None if depth > 0 => Ok(self.declare_opaque(kind, name)),
                None => Err(ErrorKind::UnknownComposite {
                    kind,
                    name: name.to_string(),
                }
                .into()),
            },
            [_, token, ..] => Err(ErrorKind::UnexpectedTypeToken {
                token: token.to_string(),
            }
            .into()),
        }
    }
}

fn parse_keywords(
    profile: &TargetProfile,
    words: &[&str],
    diagnostics: &mut Diagnostics,
) -> Result<Type, RuntimeError> {
    let keywords = words
        .iter()
        .map(|w| {
            Keyword::from_word(w).ok_or_else(|| {
                RuntimeError::from(ErrorKind::UnexpectedTypeToken {
                    token: w.to_string(),
                })
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    new_base_type(profile, &keywords, diagnostics)
}
