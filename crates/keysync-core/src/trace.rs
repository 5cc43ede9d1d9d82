// Keysync Trace Parser
// Text recordings of native key event streams, for replay

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::input::NativeKeyEvent;

/// Trace parser errors
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },
}

fn line_regex() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(r"^(press|release)((?:\s+[a-z]+=\S+)*)$").expect("trace line regex is valid")
    })
}

fn field_regex() -> &'static Regex {
    static FIELD: OnceLock<Regex> = OnceLock::new();
    FIELD.get_or_init(|| Regex::new(r"([a-z]+)=(\S+)").expect("trace field regex is valid"))
}

/// Parse a trace.
///
/// One event per line:
///
/// ```text
/// # ShiftLeft, then a capital A
/// press code=0x32 value=0xffe1 time=10
/// press code=0x26 value=0x41 state=0x1 time=20
/// ```
///
/// `code` and `value` are required, `state` and `time` default to 0.
/// Numbers are decimal or `0x` hexadecimal. `#` starts a comment.
pub fn parse_trace(content: &str) -> Result<Vec<NativeKeyEvent>, TraceError> {
    let mut events = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        events.push(parse_line(line).map_err(|reason| TraceError::InvalidLine {
            line: index + 1,
            reason,
        })?);
    }
    Ok(events)
}

/// Read and parse a trace file
pub fn parse_trace_path<P: AsRef<Path>>(path: P) -> Result<Vec<NativeKeyEvent>, TraceError> {
    let content = fs::read_to_string(path)?;
    parse_trace(&content)
}

fn parse_line(line: &str) -> Result<NativeKeyEvent, String> {
    let captures = line_regex()
        .captures(line)
        .ok_or_else(|| format!("expected 'press|release code=<n> value=<n> ...', got '{}'", line))?;
    let is_press = &captures[1] == "press";

    let (mut code, mut value, mut state, mut time) = (None, None, 0, 0);
    for field in field_regex().captures_iter(&captures[2]) {
        let number = parse_u32(&field[2])?;
        match &field[1] {
            "code" => code = Some(number),
            "value" => value = Some(number),
            "state" => state = number,
            "time" => time = number,
            other => return Err(format!("unknown field '{}'", other)),
        }
    }

    let code = code.ok_or("missing code")?;
    let value = value.ok_or("missing value")?;
    let event = if is_press {
        NativeKeyEvent::press(code, value)
    } else {
        NativeKeyEvent::release(code, value)
    };
    Ok(event.with_state(state).at(time))
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|_| format!("invalid number '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events() {
        let trace = "\
# comment line
press code=0x32 value=0xffe1 time=10
press code=38 value=0x41 state=0x1 time=20   # trailing comment

release code=0x26 value=0x41
";
        let events = parse_trace(trace).unwrap();
        assert_eq!(
            events,
            vec![
                NativeKeyEvent::press(0x32, 0xffe1).at(10),
                NativeKeyEvent::press(0x26, 0x41).with_state(1).at(20),
                NativeKeyEvent::release(0x26, 0x41),
            ]
        );
    }

    #[test]
    fn test_field_order_is_free() {
        let events = parse_trace("release time=5 value=0x61 code=0x26").unwrap();
        assert_eq!(events, vec![NativeKeyEvent::release(0x26, 0x61).at(5)]);
    }

    #[test]
    fn test_reports_line_number() {
        let err = parse_trace("press code=1 value=2\ntap code=1 value=2\n").unwrap_err();
        match err {
            TraceError::InvalidLine { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_and_unknown_fields() {
        let err = parse_trace("press code=1").unwrap_err();
        assert!(err.to_string().contains("missing value"));

        let err = parse_trace("press code=1 value=2 repeat=1").unwrap_err();
        assert!(err.to_string().contains("unknown field 'repeat'"));

        let err = parse_trace("press code=0xg value=2").unwrap_err();
        assert!(err.to_string().contains("invalid number '0xg'"));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_trace_path("/nonexistent/trace.txt").unwrap_err();
        assert!(matches!(err, TraceError::Io(_)));
    }
}
