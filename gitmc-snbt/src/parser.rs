//! Tokenless recursive-descent SNBT parser built on `nom` combinators, in
//! the same style as the corpus's own stringified-NBT grammar but
//! producing a [`gitmc_nbt::NbtTag`] tree directly instead of going
//! through `serde`.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{alphanumeric1, char, digit0, digit1, multispace0, one_of};
use nom::combinator::{cut, map, opt, recognize};
use nom::multi::{many1, separated_list0};
use nom::sequence::{delimited, pair, tuple};
use nom::IResult;

use gitmc_nbt::{NbtCompound, NbtList, NbtTag};

use crate::error::SnbtError;

fn nom_err(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Verify))
}

fn ws(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

/// `[A-Za-z0-9._+-]+`: the bare-key / bare-string charset.
fn bare_token(input: &str) -> IResult<&str, &str> {
    recognize(many1(alt((alphanumeric1, nom::bytes::complete::is_a("_.+-")))))(input)
}

fn quoted_string(quote: char) -> impl Fn(&str) -> IResult<&str, String> {
    move |input: &str| {
        let (input, _) = char(quote)(input)?;
        let mut out = String::new();
        let mut chars = input.char_indices();
        while let Some((i, c)) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some((_, '\\')) => out.push('\\'),
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, esc)) if esc == quote => out.push(quote),
                    Some((_, other)) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err(nom_err(input)),
                }
            } else if c == quote {
                let rest = &input[i + c.len_utf8()..];
                return Ok((rest, out));
            } else {
                out.push(c);
            }
        }
        Err(nom_err(input))
    }
}

fn any_quoted_string(input: &str) -> IResult<&str, String> {
    alt((quoted_string('"'), quoted_string('\'')))(input)
}

fn key(input: &str) -> IResult<&str, String> {
    alt((any_quoted_string, map(bare_token, |s| s.to_owned())))(input)
}

/// Digits, optionally signed, rejecting a leading zero followed by more
/// digits ("007" falls through to a bare string rather than parsing as 7).
fn decimal(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(one_of("+-")),
        alt((recognize(pair(one_of("123456789"), digit0)), tag("0"))),
    ))(input)
}

/// `123.456`, `.5`, or `123e10` (a dot makes the exponent optional; without
/// one the exponent is mandatory, since bare digits alone would be an Int).
fn float_literal(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(one_of("+-")),
        alt((
            recognize(pair(
                alt((
                    recognize(tuple((digit1, char('.'), digit0))),
                    recognize(pair(char('.'), digit1)),
                )),
                opt(tuple((one_of("eE"), opt(one_of("+-")), cut(digit1)))),
            )),
            recognize(tuple((digit1, one_of("eE"), opt(one_of("+-")), cut(digit1)))),
        )),
    ))(input)
}

fn parse_i8(input: &str) -> IResult<&str, i8> {
    let (input, digits) = decimal(input)?;
    let (input, _) = one_of("bB")(input)?;
    digits.parse().map(|v| (input, v)).map_err(|_| nom_err(input))
}

fn parse_i16(input: &str) -> IResult<&str, i16> {
    let (input, digits) = decimal(input)?;
    let (input, _) = one_of("sS")(input)?;
    digits.parse().map(|v| (input, v)).map_err(|_| nom_err(input))
}

fn parse_i32(input: &str) -> IResult<&str, i32> {
    let (input, digits) = decimal(input)?;
    digits.parse().map(|v| (input, v)).map_err(|_| nom_err(input))
}

fn parse_i64(input: &str) -> IResult<&str, i64> {
    let (input, digits) = decimal(input)?;
    let (input, _) = one_of("lL")(input)?;
    digits.parse().map(|v| (input, v)).map_err(|_| nom_err(input))
}

fn parse_f32(input: &str) -> IResult<&str, f32> {
    let (input, digits) = float_literal(input)?;
    let (input, _) = one_of("fF")(input)?;
    digits.parse().map(|v| (input, v)).map_err(|_| nom_err(input))
}

/// Unsuffixed float, or one with a trailing `d`/`D`: both mean Double.
fn parse_f64(input: &str) -> IResult<&str, f64> {
    let (input, digits) = float_literal(input)?;
    let (input, _) = opt(one_of("dD"))(input)?;
    digits.parse().map(|v| (input, v)).map_err(|_| nom_err(input))
}

/// `Infinity`, `-Infinity`, `NaN`, `∞`, `-∞`, each with an optional `f`/`d`
/// suffix deciding Float vs. Double (defaulting to Double when bare).
fn special_float(input: &str) -> IResult<&str, NbtTag> {
    let (input, value) = alt((
        map(tag("-Infinity"), |_| f64::NEG_INFINITY),
        map(tag("-\u{221E}"), |_| f64::NEG_INFINITY),
        map(tag("Infinity"), |_| f64::INFINITY),
        map(tag("\u{221E}"), |_| f64::INFINITY),
        map(tag("NaN"), |_| f64::NAN),
    ))(input)?;
    let (input, suffix) = opt(one_of("fFdD"))(input)?;
    Ok((
        input,
        match suffix {
            Some('f') | Some('F') => NbtTag::Float(value as f32),
            _ => NbtTag::Double(value),
        },
    ))
}

fn parse_bool(input: &str) -> IResult<&str, NbtTag> {
    alt((
        map(tag("true"), |_| NbtTag::Byte(1)),
        map(tag("false"), |_| NbtTag::Byte(0)),
    ))(input)
}

/// Tries every numeric/bool/special form against the *whole* of `span`,
/// requiring it be consumed entirely. A span like `"007"` matches none of
/// them (`decimal` rejects the leading zero) and so isn't secretly parsed
/// as `Int(7)` from a partial match; the caller degrades it to a String.
pub(crate) fn parse_exact_atom(span: &str) -> Option<NbtTag> {
    if let Ok(("", v)) = parse_i8(span) {
        return Some(NbtTag::Byte(v));
    }
    if let Ok(("", v)) = parse_i16(span) {
        return Some(NbtTag::Short(v));
    }
    if let Ok(("", v)) = parse_i64(span) {
        return Some(NbtTag::Long(v));
    }
    if let Ok(("", v)) = parse_f32(span) {
        return Some(NbtTag::Float(v));
    }
    if let Ok(("", v)) = parse_f64(span) {
        return Some(NbtTag::Double(v));
    }
    if let Ok(("", t)) = special_float(span) {
        return Some(t);
    }
    if let Ok(("", t)) = parse_bool(span) {
        return Some(t);
    }
    if let Ok(("", v)) = parse_i32(span) {
        return Some(NbtTag::Int(v));
    }
    None
}

/// Any value that isn't a compound, list/array, or quoted string: the
/// maximal bare token, parsed as a number/bool/special if the whole of it
/// matches one of those forms, else kept as a String.
fn atom(input: &str) -> IResult<&str, NbtTag> {
    let (rest, span) = bare_token(input)?;
    Ok((rest, parse_exact_atom(span).unwrap_or_else(|| NbtTag::String(span.to_owned()))))
}

fn compound_entry(input: &str) -> IResult<&str, (String, NbtTag)> {
    let (input, k) = key(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char(':')(input)?;
    let (input, _) = ws(input)?;
    let (input, v) = value(input)?;
    Ok((input, (k, v)))
}

fn compound(input: &str) -> IResult<&str, NbtTag> {
    let (input, entries) = delimited(
        pair(char('{'), ws),
        separated_list0(delimited(ws, char(','), ws), compound_entry),
        pair(ws, char('}')),
    )(input)?;
    let comp: NbtCompound = entries.into_iter().collect();
    Ok((input, NbtTag::Compound(comp)))
}

fn array_element_i8(input: &str) -> IResult<&str, i8> {
    let (input, digits) = decimal(input)?;
    let (input, _) = opt(one_of("bB"))(input)?;
    digits.parse().map(|v| (input, v)).map_err(|_| nom_err(input))
}

fn array_element_i32(input: &str) -> IResult<&str, i32> {
    let (input, digits) = decimal(input)?;
    let (input, _) = opt(one_of("iI"))(input)?;
    digits.parse().map(|v| (input, v)).map_err(|_| nom_err(input))
}

fn array_element_i64(input: &str) -> IResult<&str, i64> {
    let (input, digits) = decimal(input)?;
    let (input, _) = opt(one_of("lL"))(input)?;
    digits.parse().map(|v| (input, v)).map_err(|_| nom_err(input))
}

fn typed_array(input: &str) -> IResult<&str, NbtTag> {
    let (input, _) = char('[')(input)?;
    let (input, _) = ws(input)?;
    let (input, kind) = one_of("BIL")(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char(';')(input)?;
    let (input, _) = ws(input)?;

    match kind {
        'B' => {
            let (input, values) = separated_list0(
                delimited(ws, char(','), ws),
                delimited(ws, array_element_i8, ws),
            )(input)?;
            let (input, _) = char(']')(input)?;
            Ok((input, NbtTag::ByteArray(values)))
        }
        'I' => {
            let (input, values) = separated_list0(
                delimited(ws, char(','), ws),
                delimited(ws, array_element_i32, ws),
            )(input)?;
            let (input, _) = char(']')(input)?;
            Ok((input, NbtTag::IntArray(values)))
        }
        'L' => {
            let (input, values) = separated_list0(
                delimited(ws, char(','), ws),
                delimited(ws, array_element_i64, ws),
            )(input)?;
            let (input, _) = char(']')(input)?;
            Ok((input, NbtTag::LongArray(values)))
        }
        _ => unreachable!("one_of(\"BIL\") only yields those three"),
    }
}

fn list(input: &str) -> IResult<&str, NbtTag> {
    let (input, values) = delimited(
        pair(char('['), ws),
        separated_list0(delimited(ws, char(','), ws), value),
        pair(ws, char(']')),
    )(input)?;
    match NbtList::new(values) {
        Ok(list) => Ok((input, NbtTag::List(list))),
        Err(_) => Err(nom_err(input)),
    }
}

fn list_or_array(input: &str) -> IResult<&str, NbtTag> {
    alt((typed_array, list))(input)
}

/// Grammar entry point for any single SNBT value.
pub fn value(input: &str) -> IResult<&str, NbtTag> {
    alt((
        compound,
        list_or_array,
        map(any_quoted_string, NbtTag::String),
        atom,
    ))(input)
}

/// Parses a complete SNBT document. Whitespace-only (or empty) input
/// produces an empty [`NbtTag::Compound`]; anything left unconsumed after a
/// successfully parsed value is a [`SnbtError::TrailingInput`].
pub fn parse_document(input: &str) -> Result<NbtTag, SnbtError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(NbtTag::Compound(NbtCompound::new()));
    }
    let (rest, tag) =
        value(trimmed).map_err(|_| SnbtError::MalformedSnbt(trimmed.to_owned()))?;
    let rest = rest.trim_start();
    if rest.is_empty() {
        Ok(tag)
    } else {
        Err(SnbtError::TrailingInput(rest.to_owned()))
    }
}
