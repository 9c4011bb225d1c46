//! Severity mapping and the fixed three-tier escalation text (§4.3
//! "Escalation text").

const MILD_MESSAGE: &str =
    "You appear to be repeating the same action without progress. Consider a different \
     approach: scroll to find new elements, re-read the page, or try a different command.";
const MODERATE_MESSAGE: &str =
    "You have been stuck in a loop for several steps. Stop repeating the same action - \
     re-read the page state carefully and pick a genuinely different next step.";
const SEVERE_MESSAGE: &str =
    "You are critically stuck. Repeating this pattern will not make progress. If the task \
     cannot be completed this way, call finish with success=false and explain why.";

/// Map cumulative total repetitions onto a 0-3 severity (§4.3, §8 TESTABLE
/// PROPERTIES).
pub fn severity_for(total_repetitions: i64) -> u8 {
    if total_repetitions >= 12 {
        3
    } else if total_repetitions >= 8 {
        2
    } else if total_repetitions >= 5 {
        1
    } else {
        0
    }
}

/// The escalation text for the current repetition count, empty below the
/// mild threshold.
pub fn escalation_message(total_repetitions: i64) -> &'static str {
    if total_repetitions >= 12 {
        SEVERE_MESSAGE
    } else if total_repetitions >= 8 {
        MODERATE_MESSAGE
    } else if total_repetitions >= 5 {
        MILD_MESSAGE
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_thresholds_match_the_spec_table() {
        assert_eq!(severity_for(0), 0);
        assert_eq!(severity_for(4), 0);
        assert_eq!(severity_for(5), 1);
        assert_eq!(severity_for(7), 1);
        assert_eq!(severity_for(8), 2);
        assert_eq!(severity_for(11), 2);
        assert_eq!(severity_for(12), 3);
        assert_eq!(severity_for(100), 3);
    }

    #[test]
    fn escalation_message_is_empty_below_mild_threshold() {
        assert_eq!(escalation_message(3), "");
        assert_ne!(escalation_message(5), "");
    }
}
