use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};

/// Datumformat för lagrade nycklar (`YYYY-MM-DD`)
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Strikt tolkning av en datumnyckel (`YYYY-MM-DD`)
pub fn parse_date_key(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_KEY_FORMAT).ok()
}

/// Formatera ett datum som lagringsnyckel
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Fredagen som gäller för ett datum. Veckan löper lördag till och med fredag.
pub fn active_friday(date: NaiveDate) -> NaiveDate {
    let day = date.weekday().num_days_from_sunday() as i64;
    let days_until_friday = (5 - day + 7) % 7;
    date + Duration::days(days_until_friday)
}

/// Senaste mötesfredagarna, nyast först, aldrig före systemets startdatum.
/// Returnerar alltid minst en fredag.
pub fn recent_fridays(today: NaiveDate, limit: usize, start: NaiveDate) -> Vec<NaiveDate> {
    let mut fridays = Vec::with_capacity(limit);
    let mut current = active_friday(today);

    for _ in 0..limit {
        if current < start {
            break;
        }
        fridays.push(current);
        current -= Duration::days(7);
    }

    if fridays.is_empty() {
        fridays.push(active_friday(today));
    }

    fridays
}

pub fn is_friday(date_key: &str) -> bool {
    parse_date_key(date_key).is_some_and(|d| d.weekday() == Weekday::Fri)
}

/// Har registreringsfristen för ett datum passerat? Dagen stänger kl 23.
pub fn is_past_deadline(date: NaiveDate, now: NaiveDateTime) -> bool {
    let today = now.date();
    if date < today {
        return true;
    }
    date == today && now.hour() >= 23
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date_key(s).unwrap()
    }

    #[test]
    fn test_parse_date_key() {
        assert_eq!(
            parse_date_key("2026-03-06"),
            NaiveDate::from_ymd_opt(2026, 3, 6)
        );
        assert_eq!(parse_date_key(""), None);
        assert_eq!(parse_date_key("invalid"), None);
        assert_eq!(parse_date_key("2026/03/06"), None);
        assert_eq!(parse_date_key("2026-13-01"), None);
    }

    #[test]
    fn test_active_friday() {
        // 2026-03-06 är en fredag
        assert_eq!(active_friday(d("2026-03-06")), d("2026-03-06"));
        // Lördag hör till nästa vecka
        assert_eq!(active_friday(d("2026-03-07")), d("2026-03-13"));
        assert_eq!(active_friday(d("2026-03-04")), d("2026-03-06"));
    }

    #[test]
    fn test_recent_fridays_stops_at_start() {
        let fridays = recent_fridays(d("2026-03-10"), 5, d("2026-02-20"));
        assert_eq!(
            fridays,
            vec![d("2026-03-13"), d("2026-03-06"), d("2026-02-27"), d("2026-02-20")]
        );

        let before_start = recent_fridays(d("2026-01-01"), 5, d("2026-02-20"));
        assert_eq!(before_start, vec![d("2026-01-02")]);
    }

    #[test]
    fn test_deadline() {
        let now = d("2026-03-06").and_hms_opt(22, 59, 0).unwrap();
        assert!(!is_past_deadline(d("2026-03-06"), now));
        assert!(is_past_deadline(d("2026-03-05"), now));

        let late = d("2026-03-06").and_hms_opt(23, 0, 0).unwrap();
        assert!(is_past_deadline(d("2026-03-06"), late));
        assert!(is_friday("2026-03-06"));
        assert!(!is_friday("2026-03-07"));
    }
}
