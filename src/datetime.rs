//! Component parsing for the four temporal atom kinds.
//!
//! The lexer already guarantees the digit layout (`YYYY-MM-DD`, `HH:MM:SS[.fraction]`, offset
//! `Z`/`±HH:MM`), so these functions only slice at fixed positions and range-check the components.

use {
	std::convert::TryFrom,
	time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset},
};

fn number<T: std::str::FromStr>(image: &str, range: std::ops::Range<usize>) -> Option<T> {
	image.get(range)?.parse().ok()
}

pub fn local_date(image: &str) -> Option<Date> {
	let month = Month::try_from(number::<u8>(image, 5..7)?).ok()?;
	Date::from_calendar_date(number(image, 0..4)?, month, number(image, 8..10)?).ok()
}

pub fn local_time(image: &str) -> Option<Time> {
	let nanosecond = match image.get(8..) {
		None | Some("") => 0,
		Some(fraction) => {
			let digits = fraction.strip_prefix('.')?;
			// Anything below nanoseconds is truncated.
			let digits = digits.get(..9).unwrap_or(digits);
			let scale = 10_u32.pow(9 - u32::try_from(digits.len()).ok()?);
			digits.parse::<u32>().ok()? * scale
		}
	};
	Time::from_hms_nano(
		number(image, 0..2)?,
		number(image, 3..5)?,
		number(image, 6..8)?,
		nanosecond,
	)
	.ok()
}

pub fn local_date_time(image: &str) -> Option<PrimitiveDateTime> {
	Some(PrimitiveDateTime::new(
		local_date(image.get(..10)?)?,
		local_time(image.get(11..)?)?,
	))
}

pub fn offset_date_time(image: &str) -> Option<OffsetDateTime> {
	let (local, offset) = if let Some(local) = image.strip_suffix(&['Z', 'z'][..]) {
		(local, UtcOffset::UTC)
	} else {
		let split = image.len().checked_sub(6)?;
		let (local, offset) = (image.get(..split)?, image.get(split..)?);
		let sign = match offset.get(..1)? {
			"+" => 1,
			"-" => -1,
			_ => return None,
		};
		let hours: i8 = number(offset, 1..3)?;
		let minutes: i8 = number(offset, 4..6)?;
		(
			local,
			UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()?,
		)
	};
	Some(local_date_time(local)?.assume_offset(offset))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ymd(year: i32, month: Month, day: u8) -> Date {
		Date::from_calendar_date(year, month, day).unwrap()
	}

	fn hms_nano(hour: u8, minute: u8, second: u8, nanosecond: u32) -> Time {
		Time::from_hms_nano(hour, minute, second, nanosecond).unwrap()
	}

	#[test]
	fn dates() {
		assert_eq!(local_date("1979-05-27"), Some(ymd(1979, Month::May, 27)));
		assert_eq!(local_date("2000-02-29"), Some(ymd(2000, Month::February, 29)));
		assert_eq!(local_date("2021-02-29"), None);
		assert_eq!(local_date("2021-13-01"), None);
	}

	#[test]
	fn times() {
		assert_eq!(local_time("07:32:00"), Some(hms_nano(7, 32, 0, 0)));
		assert_eq!(
			local_time("00:32:00.999999"),
			Some(hms_nano(0, 32, 0, 999_999_000))
		);
		assert_eq!(
			local_time("00:32:00.1234567891"),
			Some(hms_nano(0, 32, 0, 123_456_789))
		);
		assert_eq!(local_time("24:00:00"), None);
	}

	#[test]
	fn date_times() {
		let may_27 = ymd(1979, Month::May, 27);
		assert_eq!(
			local_date_time("1979-05-27T07:32:00"),
			Some(PrimitiveDateTime::new(may_27, hms_nano(7, 32, 0, 0)))
		);
		assert_eq!(
			offset_date_time("1979-05-27 07:32:00Z"),
			Some(PrimitiveDateTime::new(may_27, hms_nano(7, 32, 0, 0)).assume_utc())
		);
		assert_eq!(
			offset_date_time("1979-05-27T00:32:00.999999-07:00"),
			Some(
				PrimitiveDateTime::new(may_27, hms_nano(0, 32, 0, 999_999_000))
					.assume_offset(UtcOffset::from_hms(-7, 0, 0).unwrap())
			)
		);
		assert_eq!(offset_date_time("1979-05-27T00:32:00+05:60"), None);
	}
}
