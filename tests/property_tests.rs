//! Property-based tests for request_logger using proptest

use http::{Method, Uri};
use proptest::prelude::*;
use request_logger::appenders::MemoryAppender;
use request_logger::core::output_format::interpolate;
use request_logger::prelude::*;
use request_logger::ContextEnricher;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop::sample::select(LogLevel::ALL.to_vec())
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Level names parse back regardless of case
    #[test]
    fn test_log_level_str_roundtrip(level in any_level(), lower in any::<bool>()) {
        let name = if lower {
            level.to_str().to_lowercase()
        } else {
            level.to_str().to_string()
        };
        let parsed: LogLevel = name.parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Syslog severity decreases as the level grows
    #[test]
    fn test_syslog_severity_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a < b, a.syslog_severity() > b.syslog_severity());
    }
}

// ============================================================================
// Context Tests
// ============================================================================

proptest! {
    /// Merging keeps first positions and lets later values win
    #[test]
    fn test_merge_later_wins(
        first in prop::collection::vec(("[a-e]", any::<i64>()), 0..10),
        second in prop::collection::vec(("[a-e]", any::<i64>()), 0..10),
    ) {
        let left: LogContext = first.iter().cloned().collect();
        let right: LogContext = second.iter().cloned().collect();
        let merged = LogContext::merged([&left, &right]);

        let mut expected_keys: Vec<String> = Vec::new();
        for (key, _) in first.iter().chain(second.iter()) {
            if !expected_keys.contains(key) {
                expected_keys.push(key.clone());
            }
        }
        let keys: Vec<String> = merged.keys().map(str::to_string).collect();
        prop_assert_eq!(keys, expected_keys);

        for key in merged.keys() {
            let expected = right.get(key).or_else(|| left.get(key));
            prop_assert_eq!(merged.get(key), expected);
        }
    }

    /// Templates without placeholders render unchanged
    #[test]
    fn test_interpolate_plain_text(message in "[^{}]*", value in any::<i64>()) {
        let context = LogContext::new().with_field("value", value);
        prop_assert_eq!(interpolate(&message, &context), message);
    }
}

// ============================================================================
// Enricher Tests
// ============================================================================

proptest! {
    /// Chunks reassemble into the original string
    #[test]
    fn test_chunks_reassemble(value in "\\PC{0,200}", chunk_size in 1usize..40) {
        let enricher = ContextEnricher::new().with_chunk_size(chunk_size);
        let context = LogContext::new().with_field("body", value.as_str());

        let enriched = enricher.enrich(&context);

        let mut rebuilt = String::new();
        for (index, (key, part)) in enriched.iter().enumerate() {
            let expected_key = if index == 0 {
                "body".to_string()
            } else {
                format!("body_{}", index)
            };
            prop_assert_eq!(key, expected_key.as_str());

            let part = part.as_str().unwrap();
            prop_assert!(part.chars().count() <= chunk_size);
            rebuilt.push_str(part);
        }

        prop_assert_eq!(rebuilt, value.clone());
        let chunks = value.chars().count().div_ceil(chunk_size).max(1);
        prop_assert_eq!(enriched.len(), chunks);
    }

    /// Fault chains never expand past the depth limit
    #[test]
    fn test_fault_chain_depth_bounded(depth in 1usize..10) {
        let mut fault = Fault::new("Root", "root");
        for i in 1..depth {
            fault = Fault::new(format!("Level{}", i), "wrapped").with_previous(fault);
        }

        let enriched = ContextEnricher::new()
            .enrich(&LogContext::new().with_field("exception", fault));

        let class_keys = enriched.keys().filter(|key| key.ends_with("_class")).count();
        prop_assert_eq!(class_keys, depth.min(request_logger::core::MAX_FAULT_CHAIN_DEPTH));
    }
}

// ============================================================================
// Buffering Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Buffered entries are dispatched in log order once correlated
    #[test]
    fn test_buffer_is_fifo(
        before in prop::collection::vec("[a-z]{1,8}", 0..20),
        after in prop::collection::vec("[a-z]{1,8}", 0..20),
    ) {
        let memory = MemoryAppender::new();
        let mut logger = BufferedLogger::builder().appender(memory.clone()).build();

        for message in &before {
            logger.info(message.as_str(), LogContext::new());
        }
        prop_assert!(memory.is_empty());

        let uri: Uri = "/".parse().unwrap();
        logger.set_app_request(HttpRequest::new(&Method::GET, &uri).with_correlation("s", "r"));

        for message in &after {
            logger.info(message.as_str(), LogContext::new());
            prop_assert!(logger.buffer().is_empty());
        }

        let expected: Vec<String> = before.iter().chain(after.iter()).cloned().collect();
        prop_assert_eq!(memory.messages(), expected);
    }

    /// Request signatures stay bounded however long the query is
    #[test]
    fn test_signature_truncation(query in "[a-z0-9=&]{0,120}") {
        let uri: Uri = format!("/search?{}", query).parse().unwrap();
        let request = HttpRequest::new(&Method::GET, &uri);

        let signature = request.signature();
        let tail = signature.split_once('?').map_or("", |(_, tail)| tail);
        prop_assert!(tail.chars().count() <= 45 + 3);
    }

    /// Unknown action names are rejected
    #[test]
    fn test_policy_action_rejects_unknown(name in "[a-z_]{1,12}") {
        let known = ["silence", "log_error", "log_notice", "exception"];
        prop_assume!(!known.contains(&name.as_str()));
        prop_assert!(name.parse::<PolicyAction>().is_err());
    }
}
