use crate::error::{Error, ErrorKind};
use anyhow::anyhow;
use std::time::Duration;
use time::{
    OffsetDateTime, PrimitiveDateTime, UtcOffset,
    format_description::well_known::{Iso8601, Rfc3339},
};

/// Parses a caller-supplied timestamp that must carry an explicit UTC offset (or `Z`) and
/// returns the corresponding instant in UTC, truncated to microseconds as storage keeps them.
pub fn parse_target_time(value: &str) -> Result<OffsetDateTime, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidTimestamp,
            "Target time must not be empty.",
        ));
    }

    let parsed = OffsetDateTime::parse(value, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(value, &Iso8601::DEFAULT));
    match parsed {
        Ok(instant) => {
            let instant = instant.to_offset(UtcOffset::UTC);
            instant
                .replace_microsecond(instant.microsecond())
                .map_err(|err| Error::invalid_timestamp_with_root_cause(anyhow!(err)))
        }
        // A local date-time without an offset is ambiguous, report it explicitly.
        Err(_) if PrimitiveDateTime::parse(value, &Iso8601::DEFAULT).is_ok() => Err(Error::new(
            ErrorKind::InvalidTimestamp,
            format!("Target time `{value}` must include a UTC offset (e.g. `Z` or `+07:00`)."),
        )),
        Err(err) => Err(Error::invalid_timestamp_with_root_cause(
            anyhow!(err).context(format!("Cannot parse target time `{value}`.")),
        )),
    }
}

/// Makes sure that the target instant is at least `min_lead_time` ahead of `now`.
pub fn ensure_lead_time(
    target_at: OffsetDateTime,
    now: OffsetDateTime,
    min_lead_time: Duration,
) -> Result<(), Error> {
    if target_at - now < min_lead_time {
        return Err(Error::new(
            ErrorKind::LeadTimeTooShort,
            format!(
                "Target time must be at least {}s in the future.",
                min_lead_time.as_secs_f64()
            ),
        ));
    }

    Ok(())
}
