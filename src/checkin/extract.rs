//! Ticket-id extraction from decoded QR text.
//!
//! Payloads seen at the gate come in several shapes: a bare token, a
//! multi-line label block (`TicketID:<value>`), a JSON object, or free text
//! containing a UUID. Strategies are tried in a fixed order and the first
//! match wins, so the same text always yields the same identifier.

use serde_json::Value;
use uuid::Uuid;

use crate::models::TicketIdentifier;

const TICKET_LABEL: &str = "TicketID:";
const JSON_ID_FIELDS: [&str; 3] = ["ticketId", "id", "ticket_id"];
const MIN_FALLBACK_TOKEN_LEN: usize = 6;
const NOISE_WORDS: [&str; 2] = ["event", "ticket"];
const UUID_LEN: usize = 36;

pub fn extract(raw_text: &str) -> Option<TicketIdentifier> {
    let text = raw_text.trim();
    if text.is_empty() {
        return None;
    }

    if is_bare_token(text) {
        // Compact JSON carrying an id field still yields that field.
        return json_value(text).or_else(|| TicketIdentifier::new(text));
    }

    if let Some(labeled) = labeled_value(text) {
        // A present-but-empty label is a malformed ticket, not a cue to guess.
        return labeled.and_then(TicketIdentifier::new);
    }

    if let Some(id) = json_value(text) {
        return Some(id);
    }

    if let Some(uuid) = text.lines().find_map(find_uuid) {
        return TicketIdentifier::new(uuid);
    }

    text.lines()
        .map(str::trim)
        .find(|line| is_fallback_token(line))
        .and_then(TicketIdentifier::new)
}

/// Single token without whitespace, unless it is a label line.
fn is_bare_token(text: &str) -> bool {
    !text.chars().any(char::is_whitespace) && !text.starts_with(TICKET_LABEL)
}

/// `None` when no label line exists, `Some(None)` when it exists but is empty.
fn labeled_value(text: &str) -> Option<Option<&str>> {
    text.lines().find_map(|line| {
        line.trim_start().strip_prefix(TICKET_LABEL).map(|value| {
            let value = value.trim();
            (!value.is_empty()).then_some(value)
        })
    })
}

fn json_value(text: &str) -> Option<TicketIdentifier> {
    let Value::Object(fields) = serde_json::from_str::<Value>(text).ok()? else {
        return None;
    };

    JSON_ID_FIELDS
        .iter()
        .filter_map(|field| fields.get(*field))
        .find_map(|value| match value {
            Value::String(s) => TicketIdentifier::new(s.trim()),
            Value::Number(n) => TicketIdentifier::new(n.to_string()),
            _ => None,
        })
}

/// First canonical `8-4-4-4-12` UUID in the line.
fn find_uuid(line: &str) -> Option<&str> {
    if line.len() < UUID_LEN {
        return None;
    }

    (0..=line.len() - UUID_LEN)
        .filter(|&start| line.is_char_boundary(start) && line.is_char_boundary(start + UUID_LEN))
        .map(|start| &line[start..start + UUID_LEN])
        .find(|candidate| is_hyphenated_uuid(candidate))
}

fn is_hyphenated_uuid(candidate: &str) -> bool {
    let hyphens_in_place = candidate
        .char_indices()
        .all(|(idx, c)| matches!(idx, 8 | 13 | 18 | 23) == (c == '-'));

    hyphens_in_place && Uuid::parse_str(candidate).is_ok()
}

fn is_fallback_token(line: &str) -> bool {
    if line.chars().count() < MIN_FALLBACK_TOKEN_LEN
        || !line.chars().all(char::is_alphanumeric)
    {
        return false;
    }

    let lowered = line.to_lowercase();
    !NOISE_WORDS.iter().any(|word| lowered.contains(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted(raw: &str) -> Option<String> {
        extract(raw).map(|id| id.as_str().to_string())
    }

    #[test]
    fn test_bare_token_is_returned_unchanged() {
        for token in ["abc123", "T1", "X", "0f9e8d7c6b5a", "ticket-42_b"] {
            assert_eq!(extracted(token).as_deref(), Some(token));
        }
        assert_eq!(extracted("  T1\n").as_deref(), Some("T1"));
    }

    #[test]
    fn test_labeled_line() {
        assert_eq!(extracted("TicketID: abc123\nEvent: Foo").as_deref(), Some("abc123"));
        assert_eq!(extracted("Event: Foo\nTicketID:T1").as_deref(), Some("T1"));
        assert_eq!(extracted("TicketID:T1").as_deref(), Some("T1"));
        assert_eq!(extracted("Event: Foo\r\nTicketID: T1\r\n").as_deref(), Some("T1"));
    }

    #[test]
    fn test_value_after_first_colon_is_kept_whole() {
        assert_eq!(extracted("TicketID: a:b:c\nName: X").as_deref(), Some("a:b:c"));
    }

    #[test]
    fn test_empty_label_fails_extraction() {
        assert_eq!(extracted("TicketID:   \nabcdef123"), None);
    }

    #[test]
    fn test_label_is_case_sensitive() {
        // Falls through to the alphanumeric heuristic; the label line is not a token.
        assert_eq!(extracted("ticketid: abc123\nXYZ789"), Some("XYZ789".to_string()));
    }

    #[test]
    fn test_json_fields_in_priority_order() {
        assert_eq!(extracted(r#"{"ticket_id":"xyz"}"#).as_deref(), Some("xyz"));
        assert_eq!(
            extracted(r#"{"ticket_id": "c", "id": "b", "ticketId": "a"}"#).as_deref(),
            Some("a")
        );
        assert_eq!(extracted(r#"{"id": 1042, "ticket_id": "c"}"#).as_deref(), Some("1042"));
        assert_eq!(extracted(r#"{"event": "Gala", "seat": "A1"}"#), None);
    }

    #[test]
    fn test_brace_prefixed_token_without_id_field_is_kept() {
        assert_eq!(extracted("{abc123").as_deref(), Some("{abc123"));
        assert_eq!(
            extracted(r#"{"event":"Gala"}"#).as_deref(),
            Some(r#"{"event":"Gala"}"#)
        );
        assert_eq!(extracted(r#"{"ticketId":"T1"}"#).as_deref(), Some("T1"));
    }

    #[test]
    fn test_uuid_inside_free_text() {
        let raw = "Admit one\nRef 3F2504E0-4F89-11D3-9A0C-0305E82C3301 thanks";
        assert_eq!(
            extracted(raw).as_deref(),
            Some("3F2504E0-4F89-11D3-9A0C-0305E82C3301")
        );
        assert_eq!(extracted("Ref 3F2504E04F8911D39A0C0305E82C3301 x\nVenue: Y"), None);
    }

    #[test]
    fn test_alphanumeric_fallback_skips_noise_lines() {
        assert_eq!(extracted("Venue Hall\nEventABC123\nQ7W8E9R0").as_deref(), Some("Q7W8E9R0"));
        assert_eq!(extracted("Seat 4\nabc12"), None);
    }

    #[test]
    fn test_unrecognisable_text() {
        assert_eq!(extracted(""), None);
        assert_eq!(extracted("   \n  "), None);
        assert_eq!(extracted("Event: Foo\nVenue: Bar"), None);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let inputs = [
            "TicketID: abc123\nEvent: Foo",
            r#"{"ticket_id":"xyz"}"#,
            "Event: Foo\nVenue: Bar",
            "abc123",
        ];
        for raw in inputs {
            let first = extract(raw);
            for _ in 0..5 {
                assert_eq!(extract(raw), first);
            }
        }
    }
}
