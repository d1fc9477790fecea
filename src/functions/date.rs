//! Date functions
//!
//! All output uses a fixed invariant culture; the default timestamp
//! format is `yyyyMMddTHHmmssZ` regardless of host locale.

use chrono::{DateTime, Duration, Utc};

use crate::context::TemplateContext;
use crate::errors::{EvalResult, ExpressionError};
use crate::value::Value;

use super::check_range;

const DEFAULT_FORMAT: &str = "yyyyMMddTHHmmssZ";

/// dateTimeAdd(base, duration, [format])
pub fn date_time_add(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_range("dateTimeAdd", &args, 2, 3)?;
    let base = args[0].try_convert_datetime().ok_or_else(|| {
        ExpressionError::InvalidDateTime {
            function: "dateTimeAdd".to_string(),
            value: args[0].to_string(),
        }
    })?;
    let duration = args[1]
        .try_string()
        .ok_or_else(|| ExpressionError::argument_invalid_string("dateTimeAdd", "duration"))?;
    let format = match args.get(2) {
        Some(v) => v
            .try_string()
            .ok_or_else(|| ExpressionError::argument_invalid_string("dateTimeAdd", "format"))?,
        None => DEFAULT_FORMAT,
    };
    let offset = parse_duration(duration).ok_or_else(|| ExpressionError::InvalidDuration {
        function: "dateTimeAdd".to_string(),
        value: duration.to_string(),
    })?;
    Ok(Value::String(format_datetime(base + offset, format)))
}

/// utcNow([format])
pub fn utc_now(_context: &dyn TemplateContext, args: Vec<Value>) -> EvalResult<Value> {
    check_range("utcNow", &args, 0, 1)?;
    let format = match args.first() {
        Some(v) => v
            .try_string()
            .ok_or_else(|| ExpressionError::argument_invalid_string("utcNow", "format"))?,
        None => DEFAULT_FORMAT,
    };
    Ok(Value::String(format_datetime(Utc::now(), format)))
}

/// Parse an ISO 8601 duration such as `P1Y2M3DT4H5M6S` or `-PT30M`.
/// Years count as 365 days and months as 30, matching the source
/// template engine's duration handling.
fn parse_duration(s: &str) -> Option<Duration> {
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let s = s.strip_prefix('P')?;
    let (date_part, time_part) = match s.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (s, None),
    };
    if date_part.is_empty() && time_part.map_or(true, str::is_empty) {
        return None;
    }

    let mut total = Duration::zero();
    for (number, designator) in components(date_part)? {
        let days = match designator {
            'Y' => 365.0 * number,
            'M' => 30.0 * number,
            'W' => 7.0 * number,
            'D' => number,
            _ => return None,
        };
        total = total + Duration::seconds((days * 86_400.0) as i64);
    }
    if let Some(time_part) = time_part {
        for (number, designator) in components(time_part)? {
            let seconds = match designator {
                'H' => 3600.0 * number,
                'M' => 60.0 * number,
                'S' => number,
                _ => return None,
            };
            total = total + Duration::milliseconds((seconds * 1000.0) as i64);
        }
    }
    Some(if negative { -total } else { total })
}

/// Split a duration part into (number, designator) pairs.
fn components(s: &str) -> Option<Vec<(f64, char)>> {
    let mut result = Vec::new();
    let mut number = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
        } else if c.is_ascii_uppercase() {
            let value = number.parse::<f64>().ok()?;
            result.push((value, c));
            number.clear();
        } else {
            return None;
        }
    }
    if !number.is_empty() {
        return None;
    }
    Some(result)
}

/// Render a timestamp using a .NET style custom format string, translated
/// token by token onto chrono's formatter.
fn format_datetime(value: DateTime<Utc>, format: &str) -> String {
    let mut chrono_format = String::new();
    let chars: Vec<char> = format.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|x| **x == c).count();
        let (token, used): (&str, usize) = match c {
            'y' if run >= 4 => ("%Y", 4),
            'y' => ("%y", run.min(2)),
            'M' if run >= 2 => ("%m", 2),
            'M' => ("%-m", 1),
            'd' if run >= 2 => ("%d", 2),
            'd' => ("%-d", 1),
            'H' if run >= 2 => ("%H", 2),
            'H' => ("%-H", 1),
            'h' if run >= 2 => ("%I", 2),
            'h' => ("%-I", 1),
            'm' if run >= 2 => ("%M", 2),
            'm' => ("%-M", 1),
            's' if run >= 2 => ("%S", 2),
            's' => ("%-S", 1),
            'f' => ("%3f", run),
            't' => ("%p", run),
            '%' => ("%%", 1),
            _ => {
                chrono_format.push(c);
                i += 1;
                continue;
            }
        };
        chrono_format.push_str(token);
        i += used;
    }
    value.format(&chrono_format).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DeploymentContext;
    use pretty_assertions::assert_eq;

    fn ctx() -> DeploymentContext {
        DeploymentContext::new()
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("PT1H"), Some(Duration::hours(1)));
        assert_eq!(parse_duration("P1D"), Some(Duration::days(1)));
        assert_eq!(
            parse_duration("P1DT2H30M"),
            Some(Duration::days(1) + Duration::hours(2) + Duration::minutes(30))
        );
        assert_eq!(parse_duration("-PT15M"), Some(Duration::minutes(-15)));
        assert_eq!(parse_duration("P1Y"), Some(Duration::days(365)));
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("P"), None);
        assert_eq!(parse_duration("1H"), None);
    }

    #[test]
    fn test_date_time_add_default_format() {
        let result = date_time_add(
            &ctx(),
            vec!["2024-03-01T10:00:00Z".into(), "PT1H".into()],
        )
        .unwrap();
        assert_eq!(result, Value::String("20240301T110000Z".into()));
    }

    #[test]
    fn test_date_time_add_custom_format() {
        let result = date_time_add(
            &ctx(),
            vec![
                "2024-03-01T10:00:00Z".into(),
                "P2D".into(),
                "yyyy-MM-dd".into(),
            ],
        )
        .unwrap();
        assert_eq!(result, Value::String("2024-03-03".into()));
    }

    #[test]
    fn test_date_time_add_invalid_duration() {
        let err = date_time_add(
            &ctx(),
            vec!["2024-03-01T10:00:00Z".into(), "one hour".into()],
        )
        .unwrap_err();
        assert!(matches!(err, ExpressionError::InvalidDuration { .. }));
    }

    #[test]
    fn test_utc_now_default_shape() {
        let result = utc_now(&ctx(), vec![]).unwrap();
        let s = result.try_string().unwrap();
        // yyyyMMddTHHmmssZ
        assert_eq!(s.len(), 16);
        assert_eq!(&s[8..9], "T");
        assert!(s.ends_with('Z'));
    }

    #[test]
    fn test_utc_now_rejects_extra_args() {
        let err = utc_now(&ctx(), vec!["x".into(), "y".into()]).unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::ArgumentsOutOfRange { ref function, count: 2 } if function == "utcNow"
        ));
    }
}
