//! String functions
//!
//! Comparisons are ordinal; startsWith/endsWith/indexOf/lastIndexOf are
//! additionally ASCII case-insensitive. uniqueString() and guid() hash
//! their arguments deterministically; newGuid() is the one intentionally
//! non-deterministic function in the library.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::context::TemplateContext;
use crate::errors::{EvalResult, ExpressionError};
use crate::value::Value;

use super::{check_exact, check_min, check_range};

fn expect_string<'a>(function: &str, args: &'a [Value], index: usize) -> EvalResult<&'a str> {
    args[index]
        .try_string()
        .ok_or_else(|| ExpressionError::argument_format(function))
}

/// base64(inputString)
pub fn base64(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("base64", &args, 1)?;
    let input = args[0]
        .try_string()
        .ok_or_else(|| ExpressionError::argument_invalid_string("base64", "inputString"))?;
    Ok(Value::String(BASE64.encode(input.as_bytes())))
}

/// base64ToString(base64Value)
pub fn base64_to_string(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("base64ToString", &args, 1)?;
    let input = args[0]
        .try_string()
        .ok_or_else(|| ExpressionError::argument_invalid_string("base64ToString", "base64Value"))?;
    let bytes = BASE64
        .decode(input)
        .map_err(|_| ExpressionError::argument_format("base64ToString"))?;
    String::from_utf8(bytes)
        .map(Value::String)
        .map_err(|_| ExpressionError::argument_format("base64ToString"))
}

/// base64ToJson(base64Value)
pub fn base64_to_json(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("base64ToJson", &args, 1)?;
    let input = args[0]
        .try_string()
        .ok_or_else(|| ExpressionError::argument_invalid_string("base64ToJson", "base64Value"))?;
    let bytes = BASE64
        .decode(input)
        .map_err(|_| ExpressionError::argument_format("base64ToJson"))?;
    serde_json::from_slice::<serde_json::Value>(&bytes)
        .map(Value::from_serde_json)
        .map_err(|_| ExpressionError::argument_format("base64ToJson"))
}

/// dataUri(stringToConvert)
pub fn data_uri(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("dataUri", &args, 1)?;
    let input = expect_string("dataUri", &args, 0)?;
    Ok(Value::String(format!(
        "data:text/plain;charset=utf8;base64,{}",
        BASE64.encode(input.as_bytes())
    )))
}

/// dataUriToString(dataUriToConvert)
pub fn data_uri_to_string(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("dataUriToString", &args, 1)?;
    let input = expect_string("dataUriToString", &args, 0)?;
    let rest = input
        .strip_prefix("data:")
        .ok_or_else(|| ExpressionError::argument_format("dataUriToString"))?;
    let comma = rest
        .find(',')
        .ok_or_else(|| ExpressionError::argument_format("dataUriToString"))?;
    let media_type = &rest[..comma];
    let data = &rest[comma + 1..];
    if media_type.to_ascii_lowercase().ends_with(";base64") {
        let bytes = BASE64
            .decode(data)
            .map_err(|_| ExpressionError::argument_format("dataUriToString"))?;
        String::from_utf8(bytes)
            .map(Value::String)
            .map_err(|_| ExpressionError::argument_format("dataUriToString"))
    } else {
        Ok(Value::String(data.to_string()))
    }
}

/// startsWith(stringToSearch, stringToFind) — ASCII case-insensitive
pub fn starts_with(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("startsWith", &args, 2)?;
    let haystack = expect_string("startsWith", &args, 0)?.to_ascii_lowercase();
    let needle = expect_string("startsWith", &args, 1)?.to_ascii_lowercase();
    Ok(Value::Bool(haystack.starts_with(&needle)))
}

/// endsWith(stringToSearch, stringToFind) — ASCII case-insensitive
pub fn ends_with(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("endsWith", &args, 2)?;
    let haystack = expect_string("endsWith", &args, 0)?.to_ascii_lowercase();
    let needle = expect_string("endsWith", &args, 1)?.to_ascii_lowercase();
    Ok(Value::Bool(haystack.ends_with(&needle)))
}

/// indexOf(stringToSearch, stringToFind) — ASCII case-insensitive; -1 when
/// absent
pub fn index_of(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("indexOf", &args, 2)?;
    let haystack = expect_string("indexOf", &args, 0)?.to_ascii_lowercase();
    let needle = expect_string("indexOf", &args, 1)?.to_ascii_lowercase();
    let index = haystack
        .find(&needle)
        .map(|i| haystack[..i].chars().count() as i64)
        .unwrap_or(-1);
    Ok(Value::Int(index))
}

/// lastIndexOf(stringToSearch, stringToFind) — ASCII case-insensitive; -1
/// when absent
pub fn last_index_of(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("lastIndexOf", &args, 2)?;
    let haystack = expect_string("lastIndexOf", &args, 0)?.to_ascii_lowercase();
    let needle = expect_string("lastIndexOf", &args, 1)?.to_ascii_lowercase();
    let index = haystack
        .rfind(&needle)
        .map(|i| haystack[..i].chars().count() as i64)
        .unwrap_or(-1);
    Ok(Value::Int(index))
}

/// format(formatString, arg1, arg2, ...) — {n} positional placeholders
/// with {{ and }} escapes; any composite format specifier after ':' is
/// ignored
pub fn format(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_min("format", &args, 2)?;
    let template = expect_string("format", &args, 0)?;
    let values = &args[1..];

    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                result.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                result.push('}');
            }
            '{' => {
                let mut placeholder = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => placeholder.push(c),
                        None => return Err(ExpressionError::argument_format("format")),
                    }
                }
                let index_text = placeholder.split(':').next().unwrap_or("");
                let index: usize = index_text
                    .parse()
                    .map_err(|_| ExpressionError::argument_format("format"))?;
                let value = values
                    .get(index)
                    .ok_or_else(|| ExpressionError::argument_format("format"))?;
                result.push_str(&value.to_string());
            }
            c => result.push(c),
        }
    }
    Ok(Value::String(result))
}

/// SHA-256 over the string forms of all arguments, used by guid() and
/// uniqueString(). Same inputs always produce the same digest.
fn unique_hash(args: &[Value]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            hasher.update([b'-']);
        }
        hasher.update(arg.to_string().as_bytes());
    }
    hasher.finalize().into()
}

fn format_guid(bytes: &[u8]) -> String {
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        bytes[6], bytes[7],
        bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

/// guid(baseString, ...) — deterministic: the first 16 digest bytes laid
/// out as a 128-bit identifier
pub fn guid(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_min("guid", &args, 1)?;
    let hash = unique_hash(&args);
    Ok(Value::String(format_guid(&hash[..16])))
}

/// newGuid() — a fresh random identifier each call
pub fn new_guid(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("newGuid", &args, 0)?;
    let mut bytes: [u8; 16] = rand::random();
    // RFC 4122 version 4 layout
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Ok(Value::String(format_guid(&bytes)))
}

/// uniqueString(baseString, ...) — deterministic 13-character hash
pub fn unique_string(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_min("uniqueString", &args, 1)?;
    let hash = unique_hash(&args);
    Ok(Value::String(base32(&hash, 13)))
}

/// Lowercase base-32 rendering of a digest, truncated to `length` chars.
fn base32(bytes: &[u8], length: usize) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";
    let mut result = String::with_capacity(length);
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for byte in bytes {
        buffer = (buffer << 8) | u32::from(*byte);
        bits += 8;
        while bits >= 5 && result.len() < length {
            bits -= 5;
            result.push(ALPHABET[(buffer >> bits) as usize & 0x1f] as char);
        }
        if result.len() >= length {
            break;
        }
    }
    result
}

/// padLeft(valueToPad, totalLength, [paddingCharacter])
pub fn pad_left(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_range("padLeft", &args, 2, 3)?;
    let total_length = args[1]
        .try_int()
        .ok_or_else(|| ExpressionError::argument_invalid_integer("padLeft", "totalLength"))?
        .max(0) as usize;
    let pad = match args.get(2) {
        Some(v) => {
            let s = v
                .try_string()
                .ok_or_else(|| ExpressionError::argument_format("padLeft"))?;
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(ExpressionError::argument_format("padLeft")),
            }
        }
        None => ' ',
    };

    let value = if let Some(s) = args[0].try_string() {
        s.to_string()
    } else if let Some(n) = args[0].try_convert_long() {
        n.to_string()
    } else {
        return Err(ExpressionError::argument_format("padLeft"));
    };

    let current = value.chars().count();
    if current >= total_length {
        return Ok(Value::String(value));
    }
    let mut result = String::with_capacity(total_length);
    for _ in 0..(total_length - current) {
        result.push(pad);
    }
    result.push_str(&value);
    Ok(Value::String(result))
}

/// replace(originalString, oldString, newString)
pub fn replace(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("replace", &args, 3)?;
    let original = expect_string("replace", &args, 0)?;
    let old = expect_string("replace", &args, 1)?;
    let new = expect_string("replace", &args, 2)?;
    Ok(Value::String(original.replace(old, new)))
}

/// split(inputString, delimiter) — delimiter may be a string or an array
/// of strings; empty entries are kept
pub fn split(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("split", &args, 2)?;
    let input = expect_string("split", &args, 0)?;
    let delimiters: Vec<String> = match &args[1] {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => {
            let mut result = Vec::with_capacity(items.len());
            for item in items {
                let s = item
                    .try_string()
                    .ok_or_else(|| ExpressionError::argument_format("split"))?;
                result.push(s.to_string());
            }
            result
        }
        _ => return Err(ExpressionError::argument_format("split")),
    };

    let mut parts = Vec::new();
    let mut remaining = input;
    'outer: loop {
        let mut earliest: Option<(usize, usize)> = None;
        for delimiter in &delimiters {
            if delimiter.is_empty() {
                continue;
            }
            if let Some(at) = remaining.find(delimiter.as_str()) {
                if earliest.map_or(true, |(e, _)| at < e) {
                    earliest = Some((at, delimiter.len()));
                }
            }
        }
        match earliest {
            Some((at, len)) => {
                parts.push(Value::String(remaining[..at].to_string()));
                remaining = &remaining[at + len..];
            }
            None => {
                parts.push(Value::String(remaining.to_string()));
                break 'outer;
            }
        }
    }
    Ok(Value::Array(parts))
}

/// string(valueToConvert) — scalars render to their literal text; arrays
/// and objects serialize to canonical JSON
pub fn string(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("string", &args, 1)?;
    if let Some(s) = args[0].try_scalar_string() {
        return Ok(Value::String(s));
    }
    Ok(Value::String(args[0].to_serde_json().to_string()))
}

/// substring(stringToParse, startIndex, [length]) — character based
pub fn substring(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_range("substring", &args, 2, 3)?;
    let input = expect_string("substring", &args, 0)?;
    let start = args[1]
        .try_int()
        .ok_or_else(|| ExpressionError::argument_invalid_integer("substring", "startIndex"))?;
    if start < 0 {
        return Err(ExpressionError::argument_format("substring"));
    }
    let total = input.chars().count() as i64;
    match args.get(2) {
        None => {
            if start > total {
                return Err(ExpressionError::argument_format("substring"));
            }
            Ok(Value::String(input.chars().skip(start as usize).collect()))
        }
        Some(v) => {
            let length = v
                .try_int()
                .ok_or_else(|| ExpressionError::argument_invalid_integer("substring", "length"))?;
            if length < 0 || start + length > total {
                return Err(ExpressionError::argument_format("substring"));
            }
            Ok(Value::String(
                input
                    .chars()
                    .skip(start as usize)
                    .take(length as usize)
                    .collect(),
            ))
        }
    }
}

/// toLower(stringToChange)
pub fn to_lower(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("toLower", &args, 1)?;
    let input = expect_string("toLower", &args, 0)?;
    Ok(Value::String(input.to_lowercase()))
}

/// toUpper(stringToChange)
pub fn to_upper(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("toUpper", &args, 1)?;
    let input = expect_string("toUpper", &args, 0)?;
    Ok(Value::String(input.to_uppercase()))
}

/// trim(stringToTrim)
pub fn trim(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("trim", &args, 1)?;
    let input = expect_string("trim", &args, 0)?;
    Ok(Value::String(input.trim().to_string()))
}

/// uri(baseUri, relativeUri)
pub fn uri(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("uri", &args, 2)?;
    let base = args[0]
        .try_string()
        .ok_or_else(|| ExpressionError::argument_invalid_string("uri", "baseUri"))?;
    let relative = args[1]
        .try_string()
        .ok_or_else(|| ExpressionError::argument_invalid_string("uri", "relativeUri"))?;
    Ok(Value::String(resolve_uri(base, relative)))
}

/// RFC 3986 style reference resolution, covering the absolute, authority,
/// absolute-path and relative-path forms.
fn resolve_uri(base: &str, relative: &str) -> String {
    if has_scheme(relative) {
        return relative.to_string();
    }
    let scheme_end = base.find("://").map(|i| i + 3);
    if let Some(rest) = relative.strip_prefix("//") {
        let scheme = base.split("://").next().unwrap_or("https");
        return format!("{}://{}", scheme, rest);
    }
    if relative.starts_with('/') {
        if let Some(scheme_end) = scheme_end {
            let authority_end = base[scheme_end..]
                .find('/')
                .map(|i| scheme_end + i)
                .unwrap_or(base.len());
            return format!("{}{}", &base[..authority_end], relative);
        }
        return relative.to_string();
    }
    // Relative path: replace everything after the last path separator.
    let path_start = scheme_end.unwrap_or(0);
    match base[path_start..].rfind('/') {
        Some(i) => format!("{}{}", &base[..path_start + i + 1], relative),
        None => format!("{}/{}", base, relative),
    }
}

fn has_scheme(uri: &str) -> bool {
    match uri.find(':') {
        Some(i) if i > 0 => uri[..i]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.'),
        _ => false,
    }
}

/// uriComponent(stringToEncode)
pub fn uri_component(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_exact("uriComponent", &args, 1)?;
    let input = args[0]
        .try_string()
        .ok_or_else(|| ExpressionError::argument_invalid_string("uriComponent", "stringToEncode"))?;
    Ok(Value::String(urlencoding::encode(input).into_owned()))
}

/// uriComponentToString(uriEncodedString)
pub fn uri_component_to_string(
    _context: &dyn TemplateContext,
    args: Vec<Value>,
) -> EvalResult<Value> {
    check_exact("uriComponentToString", &args, 1)?;
    let input = args[0].try_string().ok_or_else(|| {
        ExpressionError::argument_invalid_string("uriComponentToString", "uriEncodedString")
    })?;
    urlencoding::decode(input)
        .map(|s| Value::String(s.into_owned()))
        .map_err(|_| ExpressionError::argument_format("uriComponentToString"))
}
