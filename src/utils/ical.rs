//! Minimal RFC 5545 writer for the public events feed.
//!
//! Only what the feed needs: one VCALENDAR holding VEVENTs with UTC times,
//! escaped TEXT values, CRLF line endings and 75-octet line folding.

use chrono::{DateTime, Utc};

const MAX_LINE_OCTETS: usize = 75;

#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub uid: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: String,
    pub description: String,
    pub location: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// `YYYYMMDDTHHMMSSZ`
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape a TEXT value: backslash, semicolon, comma and line breaks.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Fold a content line so no physical line exceeds 75 octets.
/// Continuation lines start with a single space. Never splits a UTF-8 sequence.
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut current = 0usize;
    // first physical line carries 75 octets, continuations 74 plus the leading space
    let mut limit = MAX_LINE_OCTETS;
    for c in line.chars() {
        let len = c.len_utf8();
        if current + len > limit {
            out.push_str("\r\n ");
            current = 0;
            limit = MAX_LINE_OCTETS - 1;
        }
        out.push(c);
        current += len;
    }
    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(&fold_line(line));
    out.push_str("\r\n");
}

pub fn render_calendar(
    calendar_name: &str,
    events: &[CalendarEvent],
    dtstamp: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let stamp = format_utc(&dtstamp);

    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, "PRODID:-//Association//Evenements//FR");
    push_line(&mut out, "CALSCALE:GREGORIAN");
    push_line(&mut out, "METHOD:PUBLISH");
    push_line(
        &mut out,
        &format!("X-WR-CALNAME:{}", escape_text(calendar_name)),
    );

    for event in events {
        push_line(&mut out, "BEGIN:VEVENT");
        push_line(&mut out, &format!("UID:{}", event.uid));
        push_line(&mut out, &format!("DTSTAMP:{stamp}"));
        push_line(&mut out, &format!("DTSTART:{}", format_utc(&event.start)));
        push_line(&mut out, &format!("DTEND:{}", format_utc(&event.end)));
        push_line(&mut out, &format!("SUMMARY:{}", escape_text(&event.summary)));
        push_line(
            &mut out,
            &format!("DESCRIPTION:{}", escape_text(&event.description)),
        );
        if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
            push_line(&mut out, &format!("LOCATION:{}", escape_text(location)));
        }
        if let Some(category) = &event.category {
            push_line(&mut out, &format!("CATEGORIES:{}", escape_text(category)));
        }
        if let Some(url) = &event.url {
            push_line(&mut out, &format!("URL:{url}"));
        }
        if let Some(modified) = &event.last_modified {
            push_line(&mut out, &format!("LAST-MODIFIED:{}", format_utc(modified)));
        }
        push_line(&mut out, "END:VEVENT");
    }

    push_line(&mut out, "END:VCALENDAR");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_event() -> CalendarEvent {
        CalendarEvent {
            uid: "evenement-1@asso.test".to_string(),
            start: Utc.with_ymd_and_hms(2025, 6, 21, 18, 30, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 6, 21, 23, 0, 0).unwrap(),
            summary: "Fête; musique, danse".to_string(),
            description: "Ligne 1\nLigne 2 \\ fin".to_string(),
            location: Some("Salle des fêtes, Lyon".to_string()),
            url: Some("https://asso.test/evenements/1".to_string()),
            category: Some("Culturel".to_string()),
            last_modified: None,
        }
    }

    #[test]
    fn test_format_utc() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 5, 7, 8, 9).unwrap();
        assert_eq!(format_utc(&dt), "20250105T070809Z");
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a;b,c"), "a\\;b\\,c");
        assert_eq!(escape_text("back\\slash"), "back\\\\slash");
        assert_eq!(escape_text("l1\nl2"), "l1\\nl2");
        assert_eq!(escape_text("l1\r\nl2"), "l1\\nl2");
        assert_eq!(escape_text("plain"), "plain");
    }

    #[test]
    fn test_fold_line_limits_octets() {
        let short = "SUMMARY:court";
        assert_eq!(fold_line(short), short);

        let long = format!("DESCRIPTION:{}", "é".repeat(60));
        let folded = fold_line(&long);
        for physical in folded.split("\r\n") {
            assert!(physical.len() <= 75, "line too long: {}", physical.len());
        }
        // unfolding restores the original content line
        assert_eq!(folded.replace("\r\n ", ""), long);
    }

    #[test]
    fn test_render_calendar_single_event() {
        let stamp = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let ics = render_calendar("Agenda", &[sample_event()], stamp);

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ics.ends_with("END:VEVENT\r\nEND:VCALENDAR\r\n"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
        assert!(ics.contains("\r\nDTSTAMP:20250601T120000Z\r\n"));
        assert!(ics.contains("\r\nDTSTART:20250621T183000Z\r\n"));
        assert!(ics.contains("\r\nDTEND:20250621T230000Z\r\n"));
        assert!(ics.contains("\r\nSUMMARY:Fête\\; musique\\, danse\r\n"));
        assert!(ics.contains("\r\nDESCRIPTION:Ligne 1\\nLigne 2 \\\\ fin\r\n"));
        assert!(ics.contains("\r\nLOCATION:Salle des fêtes\\, Lyon\r\n"));
        assert!(ics.contains("\r\nUID:evenement-1@asso.test\r\n"));
    }

    #[test]
    fn test_render_calendar_empty() {
        let stamp = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let ics = render_calendar("Agenda", &[], stamp);
        assert!(!ics.contains("BEGIN:VEVENT"));
        assert!(ics.contains("X-WR-CALNAME:Agenda\r\n"));
    }

    #[test]
    fn test_location_omitted_when_missing() {
        let stamp = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut event = sample_event();
        event.location = None;
        let ics = render_calendar("Agenda", &[event], stamp);
        assert!(!ics.contains("LOCATION:"));
    }
}
