//! Turns a raw w1-therm frame into a [`Reading`], or says why it can't.
//!
//! The DS18B20 reports a 12-bit two's complement value with four fractional
//! bits, so anything it can represent lies in `[-128, 128)` °C. Values that
//! parse outside that window are bus noise, not weather.

use chrono::{DateTime, Utc};

use crate::db::models::Reading;

use super::{
    error::{FrameDefect, InvalidFrame},
    frame::RawFrame,
};

pub const INTEGRITY_MARKER: &str = "YES";
pub const MIN_CELSIUS: f64 = -128.0;
/// Exclusive upper bound.
pub const MAX_CELSIUS: f64 = 128.0;

/// Validates `frame` and stamps it with the current wall-clock time.
pub fn validate(frame: &RawFrame) -> Result<Reading, InvalidFrame> {
    let celsius = convert(frame)?;
    Ok(Reading::new(Utc::now().timestamp_millis(), celsius))
}

/// Same as [`validate`] with an explicit acceptance time.
pub fn validate_at(frame: &RawFrame, accepted_at: DateTime<Utc>) -> Result<Reading, InvalidFrame> {
    let celsius = convert(frame)?;
    Ok(Reading::new(accepted_at.timestamp_millis(), celsius))
}

fn convert(frame: &RawFrame) -> Result<f64, InvalidFrame> {
    let reject = |reason| InvalidFrame {
        reason,
        raw: frame.raw().to_string(),
    };

    if !integrity_ok(&frame.integrity_line) {
        return Err(reject(FrameDefect::IntegrityFailed));
    }

    let data_line = frame
        .data_line
        .as_deref()
        .ok_or_else(|| reject(FrameDefect::MissingDataLine))?;
    let millidegrees = parse_millidegrees(data_line).ok_or_else(|| reject(FrameDefect::MalformedValue))?;

    // The window applies to what gets stored, i.e. after rounding.
    let celsius = round_tenths(millidegrees as f64 / 1000.0);
    if !(MIN_CELSIUS..MAX_CELSIUS).contains(&celsius) {
        return Err(reject(FrameDefect::OutOfRange(celsius)));
    }

    Ok(celsius)
}

/// Lines of two characters or fewer can't carry the marker and fail.
fn integrity_ok(line: &str) -> bool {
    line.len() > 2 && line.ends_with(INTEGRITY_MARKER)
}

/// Second `=`-separated segment of the data line, e.g. `t=23125` -> 23125.
fn parse_millidegrees(line: &str) -> Option<i64> {
    line.split('=').nth(1)?.trim().parse().ok()
}

/// Nearest tenth, ties away from zero (`f64::round`).
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn frame(integrity: &str, data: &str) -> RawFrame {
        RawFrame::parse(format!("{integrity}\n{data}\n"))
    }

    fn defect(result: Result<Reading, InvalidFrame>) -> FrameDefect {
        result.expect_err("frame should be rejected").reason
    }

    #[test]
    fn test_accepts_valid_frame() {
        let reading = validate(&frame("a1 b2 YES", "t2=23500")).unwrap();
        assert_eq!(reading.celsius, 23.5);
    }

    #[test]
    fn test_stamps_acceptance_time() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let reading = validate_at(&frame("a1 b2 YES", "t2=23500"), at).unwrap();
        assert_eq!(reading.unix_time, at.timestamp_millis());
    }

    #[test]
    fn test_real_kernel_frame() {
        let raw = "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t=23125\n";
        let reading = validate(&RawFrame::parse(raw)).unwrap();
        assert_eq!(reading.celsius, 23.1);
    }

    #[test]
    fn test_rejects_no_marker() {
        assert_eq!(
            defect(validate(&frame("a1 b2 NO", "t2=23500"))),
            FrameDefect::IntegrityFailed
        );
    }

    #[test]
    fn test_rejects_short_and_empty_integrity_lines() {
        for line in ["", "Y", "ES", "YE"] {
            assert_eq!(
                defect(validate(&frame(line, "t=1000"))),
                FrameDefect::IntegrityFailed,
                "line {line:?}"
            );
        }
    }

    #[test]
    fn test_marker_must_be_suffix() {
        assert_eq!(
            defect(validate(&frame("YES crc=00", "t=1000"))),
            FrameDefect::IntegrityFailed
        );
        assert_eq!(
            defect(validate(&frame("crc=00 yes", "t=1000"))),
            FrameDefect::IntegrityFailed
        );
    }

    #[test]
    fn test_bare_marker_is_enough() {
        assert!(validate(&frame("YES", "t=1000")).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(
            defect(validate(&frame("a1 b2 YES", "t2=130000"))),
            FrameDefect::OutOfRange(130.0)
        );
        assert_eq!(
            defect(validate(&frame("YES", "t=-128100"))),
            FrameDefect::OutOfRange(-128.1)
        );
    }

    #[test]
    fn test_range_is_checked_after_rounding() {
        assert_eq!(validate(&frame("YES", "t=-128001")).unwrap().celsius, -128.0);
        assert_eq!(validate(&frame("YES", "t=-128049")).unwrap().celsius, -128.0);
        assert_eq!(
            defect(validate(&frame("YES", "t=-128050"))),
            FrameDefect::OutOfRange(-128.1)
        );
        assert_eq!(
            defect(validate(&frame("YES", "t=127950"))),
            FrameDefect::OutOfRange(128.0)
        );
    }

    #[test]
    fn test_range_bounds() {
        assert_eq!(validate(&frame("YES", "t=-128000")).unwrap().celsius, -128.0);
        assert_eq!(validate(&frame("YES", "t=127900")).unwrap().celsius, 127.9);
        assert!(matches!(
            defect(validate(&frame("YES", "t=128000"))),
            FrameDefect::OutOfRange(_)
        ));
        // Rounds up onto the exclusive bound.
        assert_eq!(
            defect(validate(&frame("YES", "t=127960"))),
            FrameDefect::OutOfRange(128.0)
        );
        assert!(matches!(
            defect(validate(&frame("YES", "t=-128100"))),
            FrameDefect::OutOfRange(_)
        ));
    }

    #[test]
    fn test_rejects_malformed_values() {
        for data in ["t=", "t=abc", "no separator", "t=12.5"] {
            assert_eq!(
                defect(validate(&frame("YES", data))),
                FrameDefect::MalformedValue,
                "data {data:?}"
            );
        }
    }

    #[test]
    fn test_rejects_missing_data_line() {
        assert_eq!(
            defect(validate(&RawFrame::parse("a1 b2 YES"))),
            FrameDefect::MissingDataLine
        );
    }

    #[test]
    fn test_rejection_keeps_raw_text() {
        let err = validate(&frame("a1 b2 NO", "t2=23500")).unwrap_err();
        assert_eq!(err.raw, "a1 b2 NO\nt2=23500\n");
        assert!(err.to_string().contains("a1 b2 NO"));
    }

    #[test]
    fn test_rounding_is_one_decimal() {
        assert_eq!(validate(&frame("YES", "t=23125")).unwrap().celsius, 23.1);
        assert_eq!(validate(&frame("YES", "t=23160")).unwrap().celsius, 23.2);
        assert_eq!(validate(&frame("YES", "t=-10062")).unwrap().celsius, -10.1);
        assert_eq!(validate(&frame("YES", "t=0")).unwrap().celsius, 0.0);
    }

    #[test]
    fn test_every_in_range_value_is_accepted_and_rounded() {
        for milli in (-128_000..128_000).step_by(37) {
            let reading = validate(&frame("crc=aa YES", &format!("t={milli}")));
            let expected = round_tenths(milli as f64 / 1000.0);
            if expected >= MAX_CELSIUS {
                assert!(reading.is_err());
                continue;
            }
            let reading = reading.unwrap();
            assert_eq!(reading.celsius, expected);
            assert!((MIN_CELSIUS..MAX_CELSIUS).contains(&reading.celsius));
            assert_eq!(round_tenths(reading.celsius), reading.celsius);
        }
    }
}
