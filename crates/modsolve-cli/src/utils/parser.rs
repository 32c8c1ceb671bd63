use modsolve::workflows::simulate::ParameterEvent;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Invalid event '{0}'. Expected 'TIME=VALUE' (e.g., '0.5=-10').")]
    InvalidEventFormat(String),

    #[error("Invalid event time '{time}' in '{event}'.")]
    InvalidEventTime { event: String, time: String },

    #[error("Invalid event value '{value}' in '{event}'.")]
    InvalidEventValue { event: String, value: String },

    #[error("Event time {0} must not be negative.")]
    NegativeEventTime(f64),
}

/// Parses a `TIME=VALUE` event specification from the command line.
pub fn parse_event(spec: &str) -> Result<ParameterEvent, ParseError> {
    let (time_str, value_str) = spec
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidEventFormat(spec.to_string()))?;

    let time: f64 = time_str
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidEventTime {
            event: spec.to_string(),
            time: time_str.to_string(),
        })?;
    let value: f64 = value_str
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidEventValue {
            event: spec.to_string(),
            value: value_str.to_string(),
        })?;

    if time < 0.0 {
        return Err(ParseError::NegativeEventTime(time));
    }

    Ok(ParameterEvent { time, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_times_and_negative_values() {
        assert_eq!(
            parse_event("0.5=-10").unwrap(),
            ParameterEvent {
                time: 0.5,
                value: -10.0
            }
        );
        assert_eq!(
            parse_event("10=-1").unwrap(),
            ParameterEvent {
                time: 10.0,
                value: -1.0
            }
        );
    }

    #[test]
    fn tolerates_whitespace_around_the_fields() {
        assert_eq!(
            parse_event(" 1.5 = 2.5 ").unwrap(),
            ParameterEvent {
                time: 1.5,
                value: 2.5
            }
        );
    }

    #[test]
    fn missing_separator_is_rejected() {
        let err = parse_event("0.5:-10").unwrap_err();
        assert_eq!(err, ParseError::InvalidEventFormat("0.5:-10".to_string()));
    }

    #[test]
    fn non_numeric_fields_are_rejected() {
        assert!(matches!(
            parse_event("soon=-10").unwrap_err(),
            ParseError::InvalidEventTime { .. }
        ));
        assert!(matches!(
            parse_event("0.5=low").unwrap_err(),
            ParseError::InvalidEventValue { .. }
        ));
    }

    #[test]
    fn negative_times_are_rejected() {
        assert_eq!(
            parse_event("-1=0").unwrap_err(),
            ParseError::NegativeEventTime(-1.0)
        );
    }
}
