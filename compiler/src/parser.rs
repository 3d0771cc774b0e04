use std::collections::BTreeMap;
use std::ops::Range;

use crate::{
    error::IdlError,
    utils::{error, error_at, quote},
};
use brine_idl_schema::{EnumDef, EnumMember, FieldDef, IntKind, IntRange, SchemaDocument, StructDef, TypeRef};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LINE_COMMENT: Regex = Regex::new(r"//[^\n]*").unwrap();
    static ref STRUCT_HEAD:  Regex = Regex::new(r"\bstruct\s+([A-Za-z_][A-Za-z0-9_]*)\s*\{").unwrap();
    static ref ENUM_BLOCK:   Regex = Regex::new(r"\benum\s+([A-Za-z_][A-Za-z0-9_]*)\s*\{([^{}]*)\}").unwrap();
    static ref ENUM_ENTRY:   Regex = Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*(?:=\s*(-?\d+))?$").unwrap();
    static ref FIELD_DECL:   Regex = Regex::new(
        r"(?s)^([A-Za-z_][A-Za-z0-9_]*)(?:\s*(\[[^\]]*\])\s*|\s+)([A-Za-z_][A-Za-z0-9_]*)\s*(?::\s*(.*?))?\s*$"
    ).unwrap();
    static ref TYPE_TOKEN:   Regex = Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(\[[^\]]*\])?\s*$").unwrap();
    static ref RANGE:        Regex = Regex::new(r"^\[([^,\]]*),([^,\]]*)\]$").unwrap();
}

/// Parses schema text into a `SchemaDocument`.
///
/// Structs are located first by brace matching, since their bodies may hold
/// inline `enum` blocks. Each consumed struct is blanked out of a working copy
/// of the text so the flat scan for global enums that follows cannot pick up
/// inline ones. Anything left over after both passes is a syntax error.
///
/// Ranges are parsed here but checked against the integer widths by the
/// verifier.
pub fn parse_schema(text: &str) -> Result<SchemaDocument, IdlError> {
    let mut work    = strip_comments(text);
    let mut structs = BTreeMap::new();
    let mut enums   = BTreeMap::new();
    let mut from    = 0;

    // Structs, outermost braces first
    while let Some((name, start, open)) = next_struct_head(&work, from) {
        let close = find_matching_brace(&work, open).ok_or_else(|| {
            error_at(text, open, &format!("Unmatched \"{{\" in struct {}", quote(&name)))
        })?;

        if structs.contains_key(&name) {
            return Err(error_at(text, start, &format!("The struct {} is defined twice", quote(&name))));
        }

        let def = parse_struct_body(text, &name, &work[open + 1..close], open + 1)?;
        structs.insert(name, def);

        blank_span(&mut work, start..close + 1);
        from = close + 1;
    }

    // Global enums in what remains
    let blocks: Vec<(String, Range<usize>, usize)> = ENUM_BLOCK
        .captures_iter(&work)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let body  = caps.get(2)?;
            Some((caps[1].to_owned(), whole.range(), body.start()))
        })
        .collect();

    for (name, span, body_start) in blocks {
        if enums.contains_key(&name) {
            return Err(error_at(text, span.start, &format!("The enum {} is defined twice", quote(&name))));
        }
        let body = &work[body_start..span.end - 1];
        let def  = parse_enum_body(text, &name, body, body_start)?;
        enums.insert(name, def);
        blank_span(&mut work, span);
    }

    if let Some(pos) = work.find(|c: char| !c.is_whitespace()) {
        let snippet: String = work[pos..].split_whitespace().next().unwrap_or("").to_owned();
        return Err(error_at(text, pos, &format!("Unexpected text {}", quote(&snippet))));
    }

    Ok(SchemaDocument::new(structs, enums))
}

/// Parses a raw type token such as `bool`, `uint8[0,200]` or `Color`.
/// Bare identifiers are returned unresolved.
pub fn parse_type_token(token: &str) -> Result<TypeRef, IdlError> {
    let caps = TYPE_TOKEN
        .captures(token)
        .ok_or_else(|| error(&format!("Malformed type token {}", quote(token)), 1, 1))?;
    type_ref(&caps[1], caps.get(2).map(|m| m.as_str()), token)
}

/// Name, start offset and `{` offset of the next struct header at or after `from`.
fn next_struct_head(text: &str, from: usize) -> Option<(String, usize, usize)> {
    let caps  = STRUCT_HEAD.captures_at(text, from)?;
    let whole = caps.get(0)?;
    Some((caps[1].to_owned(), whole.start(), whole.end() - 1))
}

/// Replaces `//` comments with spaces, keeping every byte offset intact.
fn strip_comments(text: &str) -> String {
    let mut out = text.to_owned();
    let spans: Vec<Range<usize>> = LINE_COMMENT.find_iter(text).map(|m| m.range()).collect();
    for span in spans {
        blank_span(&mut out, span);
    }
    out
}

/// Overwrites `span` with spaces, keeping newlines so line numbers survive.
/// Multi-byte characters become one space per byte.
fn blank_span(text: &mut String, span: Range<usize>) {
    let blank: String = text[span.clone()]
        .chars()
        .flat_map(|c| {
            let fill = if c == '\n' { '\n' } else { ' ' };
            std::iter::repeat(fill).take(c.len_utf8())
        })
        .collect();
    text.replace_range(span, &blank);
}

/// Byte offset of the `}` closing the `{` at `open`.
fn find_matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_struct_body(text: &str, name: &str, body: &str, body_offset: usize) -> Result<StructDef, IdlError> {
    let mut enums = BTreeMap::new();
    let mut rest  = body.to_owned();

    let blocks: Vec<(String, Range<usize>, usize)> = ENUM_BLOCK
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(2)?;
            Some((caps[1].to_owned(), whole.range(), inner.start()))
        })
        .collect();

    for (enum_name, span, inner_start) in blocks {
        if enums.contains_key(&enum_name) {
            return Err(error_at(
                text,
                body_offset + span.start,
                &format!("The enum {} is defined twice in struct {}", quote(&enum_name), quote(name)),
            ));
        }
        let def = parse_enum_body(text, &enum_name, &body[inner_start..span.end - 1], body_offset + inner_start)?;
        enums.insert(enum_name, def);
        blank_span(&mut rest, span);
    }

    if let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        return Err(error_at(
            text,
            body_offset + pos,
            &format!("Unexpected {} in struct {}", quote(&rest[pos..pos + 1]), quote(name)),
        ));
    }

    let mut fields: Vec<FieldDef> = Vec::new();
    let mut offset = 0;

    for segment in rest.split(';') {
        let at = body_offset + offset + (segment.len() - segment.trim_start().len());
        offset += segment.len() + 1;

        let decl = segment.trim();
        if decl.is_empty() {
            continue;
        }

        let caps = match FIELD_DECL.captures(decl) {
            Some(caps) => caps,
            None if decl.split_whitespace().count() < 2 => {
                tracing::warn!(owner = name, declaration = decl, "skipping malformed field declaration");
                continue;
            }
            None => {
                return Err(error_at(text, at, &format!("Malformed field declaration {}", quote(decl))));
            }
        };

        let field_name = caps[3].to_owned();
        if fields.iter().any(|f| f.name == field_name) {
            return Err(error_at(
                text,
                at,
                &format!("The field {} is defined twice in struct {}", quote(&field_name), quote(name)),
            ));
        }

        let default = match caps.get(4).map(|m| m.as_str()) {
            Some("") => {
                return Err(error_at(text, at, &format!("Expected a default literal for field {}", quote(&field_name))));
            }
            other => other.map(str::to_owned),
        };

        let ty = type_ref(&caps[1], caps.get(2).map(|m| m.as_str()), &format!("{}.{}", name, field_name))?;

        fields.push(FieldDef {
            name: field_name,
            ty,
            default,
        });
    }

    Ok(StructDef {
        name: name.to_owned(),
        fields,
        enums,
    })
}

fn parse_enum_body(text: &str, name: &str, body: &str, body_offset: usize) -> Result<EnumDef, IdlError> {
    let mut members = Vec::new();
    let mut next    = Some(0i64);
    let mut offset  = 0;

    for entry in body.split(';') {
        let at = body_offset + offset + (entry.len() - entry.trim_start().len());
        offset += entry.len() + 1;

        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let caps = ENUM_ENTRY.captures(entry).ok_or_else(|| {
            error_at(text, at, &format!("Malformed entry {} in enum {}", quote(entry), quote(name)))
        })?;

        let value = match caps.get(2) {
            Some(literal) => literal.as_str().parse::<i64>().map_err(|_| {
                error_at(text, at, &format!("Invalid integer {}", quote(literal.as_str())))
            })?,
            None => next.ok_or_else(|| {
                error_at(text, at, &format!("Value of {} overflows in enum {}", quote(&caps[1]), quote(name)))
            })?,
        };

        next = value.checked_add(1);
        members.push(EnumMember {
            name: caps[1].to_owned(),
            value,
        });
    }

    Ok(EnumDef::new(name.to_owned(), members))
}

/// Builds a `TypeRef` from a keyword and an optional `[min,max]` suffix.
/// `owner` names the field in range errors.
fn type_ref(keyword: &str, bracket: Option<&str>, owner: &str) -> Result<TypeRef, IdlError> {
    let scalar = match keyword {
        "bool"             => Some(TypeRef::Bool),
        "string"           => Some(TypeRef::Utf8String),
        "float" | "float64" => Some(TypeRef::Float64),
        "float32"          => Some(TypeRef::Float32),
        "any"              => Some(TypeRef::AnyJson),
        _                  => None,
    };

    if let Some(int) = IntKind::from_keyword(keyword) {
        let range = bracket.map(|b| parse_range(b, owner)).transpose()?;
        return Ok(TypeRef::SizedInteger { int, range });
    }

    if bracket.is_some() {
        return Err(IdlError::SchemaRange {
            field: owner.to_owned(),
            msg:   format!("range bounds are only allowed on integer types, not {}", quote(keyword)),
        });
    }

    Ok(scalar.unwrap_or_else(|| TypeRef::Named {
        name: keyword.to_owned(),
    }))
}

fn parse_range(bracket: &str, owner: &str) -> Result<IntRange, IdlError> {
    let range_error = || IdlError::SchemaRange {
        field: owner.to_owned(),
        msg:   format!("expected integer bounds [min,max] but found {}", quote(bracket)),
    };

    let caps = RANGE.captures(bracket).ok_or_else(range_error)?;
    let min  = caps[1].trim().parse::<i64>().map_err(|_| range_error())?;
    let max  = caps[2].trim().parse::<i64>().map_err(|_| range_error())?;
    Ok(IntRange::new(min, max))
}
