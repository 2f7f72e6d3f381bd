//! Day-grouped rendering order for a message thread.

use chrono::{DateTime, Datelike, TimeZone};

use ardath_shared::models::Message;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// One row of a thread: a day header or a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineItem {
    Header { key: String, text: String },
    Message { key: String, message: Message },
}

impl TimelineItem {
    /// Stable key for list diffing.
    pub fn key(&self) -> &str {
        match self {
            TimelineItem::Header { key, .. } | TimelineItem::Message { key, .. } => key.as_str(),
        }
    }
}

/// Relative label for a message sent at `millis`, as seen at `now`.
pub fn day_label<Tz: TimeZone>(millis: i64, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let Some(at) = now.timezone().timestamp_millis_opt(millis).single() else {
        return String::new();
    };
    let days = (now.timestamp_millis() - millis) / MILLIS_PER_DAY;
    let hour = at.format("%I:%M %p");

    match days {
        0 if at.date_naive() != now.date_naive() => format!("Yesterday at {hour}"),
        0 => format!("Today at {hour}"),
        1 => format!("Yesterday at {hour}"),
        2..=5 => at.format("%A").to_string(),
        _ if now.year() > at.year() => at.format("%a, %b %-d, %Y").to_string(),
        _ => at.format("%a, %B %-d").to_string(),
    }
}

/// Group `messages` under day headers. Groups appear in the order their
/// first message appears; messages keep their order within a group.
pub fn build_timeline<Tz: TimeZone>(messages: &[Message], now: &DateTime<Tz>) -> Vec<TimelineItem>
where
    Tz::Offset: std::fmt::Display,
{
    let mut groups: Vec<(String, Vec<&Message>)> = Vec::new();
    for message in messages {
        let label = day_label(message.timestamp, now);
        match groups.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, members)) => members.push(message),
            None => groups.push((label, vec![message])),
        }
    }

    let mut items = Vec::with_capacity(messages.len() + groups.len());
    for (label, members) in groups {
        items.push(TimelineItem::Header {
            key: format!("header_{label}"),
            text: label,
        });
        items.extend(members.into_iter().map(|message| TimelineItem::Message {
            key: format!("message_{}_{}", message.id, message.sender_name),
            message: message.clone(),
        }));
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn labels() {
        let now = now();
        assert_eq!(day_label(at(2024, 3, 15, 9, 30), &now), "Today at 09:30 AM");
        assert_eq!(day_label(at(2024, 3, 14, 20, 0), &now), "Yesterday at 08:00 PM");
        assert_eq!(day_label(at(2024, 3, 13, 18, 0), &now), "Yesterday at 06:00 PM");
        assert_eq!(day_label(at(2024, 3, 12, 10, 0), &now), "Tuesday");
        assert_eq!(day_label(at(2024, 1, 7, 10, 0), &now), "Sun, January 7");
        assert_eq!(day_label(at(2023, 12, 25, 10, 0), &now), "Mon, Dec 25, 2023");
    }

    #[test]
    fn groups_in_first_occurrence_order() {
        let msg = |id: &str, ts: i64| Message {
            id: id.into(),
            sender_name: "Bob".into(),
            timestamp: ts,
            ..Default::default()
        };
        let tuesday = at(2024, 3, 12, 10, 0);
        let messages = vec![
            msg("m1", tuesday),
            msg("m2", at(2024, 3, 15, 9, 30)),
            msg("m3", tuesday + 60_000),
        ];
        let items = build_timeline(&messages, &now());
        let keys: Vec<&str> = items.iter().map(TimelineItem::key).collect();
        assert_eq!(
            keys,
            vec![
                "header_Tuesday",
                "message_m1_Bob",
                "message_m3_Bob",
                "header_Today at 09:30 AM",
                "message_m2_Bob",
            ]
        );
    }
}
