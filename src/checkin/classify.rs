use crate::models::{EventCheckInSession, ScanOutcome, TicketIdentifier};

/// Classifies one extracted id against the session, admitting it when new and valid.
pub fn classify(id: Option<TicketIdentifier>, session: &mut EventCheckInSession) -> ScanOutcome {
    let Some(id) = id else {
        return ScanOutcome::unparseable();
    };

    if session.is_checked_in(&id) {
        ScanOutcome::duplicate(id)
    } else if session.check_in(&id) {
        ScanOutcome::new_valid(id)
    } else {
        ScanOutcome::invalid(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutcomeKind;
    use chrono::Utc;

    fn id(value: &str) -> TicketIdentifier {
        TicketIdentifier::new(value).unwrap()
    }

    fn session_with(ids: &[&str]) -> EventCheckInSession {
        let mut session = EventCheckInSession::new("E1");
        session.install_live("Gala".to_string(), ids.iter().map(|v| id(v)), Utc::now());
        session
    }

    #[test]
    fn test_classification_sequence() {
        let mut session = session_with(&["A", "B"]);

        let first = classify(Some(id("A")), &mut session);
        assert_eq!(first.kind, OutcomeKind::NewValid);
        assert_eq!(first.ticket_id, Some(id("A")));
        assert_eq!(session.checked_in().len(), 1);
        assert!(session.is_checked_in(&id("A")));

        assert_eq!(classify(Some(id("A")), &mut session).kind, OutcomeKind::Duplicate);
        assert_eq!(classify(Some(id("Z")), &mut session).kind, OutcomeKind::Invalid);
        assert_eq!(classify(None, &mut session).kind, OutcomeKind::Unparseable);
        assert_eq!(session.checked_in_count(), 1);
    }

    #[test]
    fn test_duplicate_is_idempotent() {
        let mut session = session_with(&["A", "B"]);
        classify(Some(id("B")), &mut session);
        let snapshot = session.checked_in().clone();

        for _ in 0..10 {
            assert_eq!(classify(Some(id("B")), &mut session).kind, OutcomeKind::Duplicate);
            assert_eq!(session.checked_in(), &snapshot);
        }
    }

    #[test]
    fn test_invalid_scan_never_checks_in() {
        let mut session = session_with(&["A"]);
        classify(Some(id("Z")), &mut session);
        assert_eq!(session.checked_in_count(), 0);
    }

    #[test]
    fn test_checked_in_id_dropped_by_refresh_is_still_a_duplicate() {
        let mut session = session_with(&["A"]);
        classify(Some(id("A")), &mut session);
        session.install_live("Gala".to_string(), vec![id("B")], Utc::now());

        assert_eq!(classify(Some(id("A")), &mut session).kind, OutcomeKind::Duplicate);
    }
}
