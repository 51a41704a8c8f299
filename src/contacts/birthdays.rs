//! Upcoming-birthday window.
//!
//! A stored birthday carries an arbitrary year; only month and day are used.
//! The birthday is re-anchored to the current year, and if that date is
//! already behind `today` it is re-anchored to next year. The result is then
//! tested against the inclusive window `[today, today + UPCOMING_WINDOW_DAYS]`.

use time::{Date, Duration, Month};

/// Length of the reminder window in days, both ends inclusive.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// Places `birthday`'s month and day in `year`.
/// Feb 29 falls back to Feb 28 in common years.
fn anchor(birthday: Date, year: i32) -> Option<Date> {
    match birthday.replace_year(year) {
        Ok(d) => Some(d),
        Err(_) if birthday.month() == Month::February && birthday.day() == 29 => {
            Date::from_calendar_date(year, Month::February, 28).ok()
        }
        Err(_) => None,
    }
}

/// Next occurrence of `birthday` on or after `today`.
pub fn next_occurrence(birthday: Date, today: Date) -> Option<Date> {
    let this_year = anchor(birthday, today.year())?;
    if this_year < today {
        anchor(birthday, today.year() + 1)
    } else {
        Some(this_year)
    }
}

/// Whether `birthday` falls within the reminder window starting at `today`.
pub fn is_upcoming(birthday: Date, today: Date) -> bool {
    let Some(end) = today.checked_add(Duration::days(UPCOMING_WINDOW_DAYS)) else {
        return false;
    };
    next_occurrence(birthday, today).is_some_and(|d| today <= d && d <= end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn inside_window_regardless_of_stored_year() {
        let today = date!(2024 - 06 - 25);
        assert!(is_upcoming(date!(1990 - 06 - 28), today));
        assert!(is_upcoming(date!(2030 - 06 - 28), today));
    }

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let today = date!(2024 - 06 - 25);
        assert!(is_upcoming(date!(1985 - 06 - 25), today));
        assert!(is_upcoming(date!(1985 - 07 - 02), today));
        assert!(!is_upcoming(date!(1985 - 07 - 03), today));
    }

    #[test]
    fn yesterday_is_a_year_away() {
        let today = date!(2024 - 06 - 25);
        assert!(!is_upcoming(date!(1985 - 06 - 24), today));
        assert_eq!(
            next_occurrence(date!(1985 - 06 - 24), today),
            Some(date!(2025 - 06 - 24))
        );
    }

    #[test]
    fn far_birthday_is_excluded() {
        let today = date!(2024 - 06 - 25);
        assert!(!is_upcoming(date!(1999 - 12 - 30), today));
        assert_eq!(
            next_occurrence(date!(1999 - 12 - 30), today),
            Some(date!(2024 - 12 - 30))
        );
    }

    #[test]
    fn wraps_across_new_year() {
        let today = date!(2024 - 12 - 28);
        assert!(is_upcoming(date!(2000 - 01 - 01), today));
        assert_eq!(
            next_occurrence(date!(2000 - 01 - 01), today),
            Some(date!(2025 - 01 - 01))
        );
        assert!(is_upcoming(date!(2000 - 01 - 04), today));
        assert!(!is_upcoming(date!(2000 - 01 - 05), today));
        assert!(is_upcoming(date!(2000 - 12 - 31), today));
    }

    #[test]
    fn leap_day_in_common_year_lands_on_feb_28() {
        let today = date!(2023 - 02 - 25);
        assert_eq!(
            next_occurrence(date!(2000 - 02 - 29), today),
            Some(date!(2023 - 02 - 28))
        );
        assert!(is_upcoming(date!(2000 - 02 - 29), today));
    }

    #[test]
    fn leap_day_in_leap_year_stays_put() {
        let today = date!(2024 - 02 - 25);
        assert_eq!(
            next_occurrence(date!(2000 - 02 - 29), today),
            Some(date!(2024 - 02 - 29))
        );
        assert!(is_upcoming(date!(2000 - 02 - 29), today));
    }

    #[test]
    fn leap_day_wrap_into_leap_year() {
        // 2023-03-01: this year's anchor (Feb 28) has passed, next is 2024-02-29.
        let today = date!(2023 - 03 - 01);
        assert_eq!(
            next_occurrence(date!(2000 - 02 - 29), today),
            Some(date!(2024 - 02 - 29))
        );
        assert!(!is_upcoming(date!(2000 - 02 - 29), today));
    }

    #[test]
    fn window_crossing_end_of_february_in_leap_year() {
        let today = date!(2024 - 02 - 26);
        assert!(is_upcoming(date!(1970 - 03 - 04), today));
        assert!(!is_upcoming(date!(1970 - 03 - 05), today));
    }

    #[test]
    fn every_day_of_the_year_hits_the_window_eight_times() {
        // Each birthday is upcoming for exactly eight consecutive days.
        let birthday = date!(1990 - 01 - 03);
        let mut day = date!(2023 - 01 - 01);
        let mut hits = 0;
        while day < date!(2024 - 01 - 01) {
            if is_upcoming(birthday, day) {
                hits += 1;
            }
            day = day.next_day().unwrap();
        }
        assert_eq!(hits, 8);
    }
}
