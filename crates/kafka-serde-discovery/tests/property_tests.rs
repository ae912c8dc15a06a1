//! Property-based tests for default serde discovery
//!
//! These tests use proptest to generate random beans and configurations and
//! verify invariants of the discovery pass.

use kafka_serde_discovery::names;
use kafka_serde_discovery::{
    AnnotationInstance, ClassIndex, ClassInfo, DefaultSerdeDiscovery, MethodInfo, ParameterInfo,
    Properties, TypeSignature,
};
use proptest::prelude::*;

/// Well-known payloads with their serializer and deserializer simple names
const PAYLOADS: &[(&str, &str)] = &[
    ("String", "String"),
    ("Long", "Long"),
    ("Integer", "Integer"),
    ("Double", "Double"),
    ("Float", "Float"),
    ("Short", "Short"),
    ("UUID", "UUID"),
    ("byte[]", "ByteArray"),
    ("ByteBuffer", "ByteBuffer"),
    ("Bytes", "Bytes"),
];

const REACTIVE_WRAPPERS: &[&str] = &["Uni", "Multi", "Publisher", "PublisherBuilder", "CompletionStage"];

fn sig(s: &str) -> TypeSignature {
    TypeSignature::parse(s).unwrap()
}

fn wrap(payload: &str, wrappers: &[&str], message: bool) -> String {
    let mut signature = if message {
        format!("Message<{}>", payload)
    } else {
        payload.to_string()
    };
    for wrapper in wrappers.iter().rev() {
        signature = format!("{}<{}>", wrapper, signature);
    }
    signature
}

// Generate channel names
prop_compose! {
    fn channel_name()(s in "[a-z][a-z0-9\\-]{0,12}") -> String {
        s
    }
}

// Generate a wrapped payload signature with the index of its payload
prop_compose! {
    fn wrapped_payload(max_wrappers: usize)(
        payload in 0..PAYLOADS.len(),
        wrappers in prop::collection::vec(prop::sample::select(REACTIVE_WRAPPERS), 0..=max_wrappers),
        message in any::<bool>(),
    ) -> (usize, String) {
        (payload, wrap(PAYLOADS[payload].0, &wrappers, message))
    }
}

/// A bean with one producing method per outgoing channel and one consuming
/// method per incoming channel
fn bean(outgoing: &[(String, String)], incoming: &[(String, String)]) -> ClassIndex {
    let mut class = ClassInfo::new("com.acme.GeneratedBean");
    for (k, (channel, returns)) in outgoing.iter().enumerate() {
        class = class.with_method(
            MethodInfo::new(format!("produce{}", k), sig(returns))
                .annotated(AnnotationInstance::new(names::OUTGOING).with_value(channel.as_str())),
        );
    }
    for (k, (channel, parameter)) in incoming.iter().enumerate() {
        class = class.with_method(
            MethodInfo::new(format!("consume{}", k), sig("void"))
                .with_parameter(ParameterInfo::new(sig(parameter)))
                .annotated(AnnotationInstance::new(names::INCOMING).with_value(channel.as_str())),
        );
    }
    ClassIndex::from_classes([class]).unwrap()
}

fn kafka_serde(simple: &str, role: &str) -> String {
    format!("org.apache.kafka.common.serialization.{}{}", simple, role)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Test that up to four reactive wrappers and a message never change the
    /// resolved serde
    #[test]
    fn test_wrappers_do_not_change_serde(
        channel in channel_name(),
        (payload, signature) in wrapped_payload(4),
    ) {
        let index = bean(&[(channel.clone(), signature.clone())], &[]);
        let report = DefaultSerdeDiscovery::new(&index, &Properties::new()).run();

        let key = format!("mp.messaging.outgoing.{}.value.serializer", channel);
        let expected = kafka_serde(PAYLOADS[payload].1, "Serializer");
        prop_assert_eq!(report.default_value(&key), Some(expected.as_str()), "{}", signature);
        prop_assert_eq!(report.defaults.len(), 1);
    }

    /// Test that too deeply nested signatures are given up on
    #[test]
    fn test_deep_nesting_produces_nothing(
        channel in channel_name(),
        payload in 0..PAYLOADS.len(),
        wrappers in prop::collection::vec(prop::sample::select(REACTIVE_WRAPPERS), 5..8),
    ) {
        let signature = wrap(PAYLOADS[payload].0, &wrappers, false);
        let index = bean(&[(channel, signature)], &[]);
        let report = DefaultSerdeDiscovery::new(&index, &Properties::new()).run();
        prop_assert!(report.defaults.is_empty());
    }

    /// Test that running twice gives the same report, and that applying the
    /// generated defaults leaves nothing more to generate
    #[test]
    fn test_discovery_is_idempotent(
        outgoing in prop::collection::vec((channel_name(), wrapped_payload(2)), 0..6),
        incoming in prop::collection::vec((channel_name(), wrapped_payload(2)), 0..6),
    ) {
        let outgoing: Vec<(String, String)> = outgoing.into_iter().map(|(c, (_, s))| (c, s)).collect();
        let incoming: Vec<(String, String)> = incoming.into_iter().map(|(c, (_, s))| (c, s)).collect();
        let index = bean(&outgoing, &incoming);
        let props = Properties::new();

        let first = DefaultSerdeDiscovery::new(&index, &props).run();
        let second = DefaultSerdeDiscovery::new(&index, &props).run();
        prop_assert_eq!(&first, &second);

        let applied = Properties::from_pairs(
            first.defaults.iter().map(|d| (d.key.clone(), d.value.clone())),
        );
        let third = DefaultSerdeDiscovery::new(&index, &applied).run();
        prop_assert!(third.defaults.is_empty());
    }

    /// Test that an explicit serde key is never overridden
    #[test]
    fn test_explicit_serde_is_never_overridden(
        channels in prop::collection::btree_set(channel_name(), 1..6),
        explicit in prop::collection::vec(any::<bool>(), 6),
        (_, signature) in wrapped_payload(2),
    ) {
        let incoming: Vec<(String, String)> =
            channels.iter().map(|c| (c.clone(), signature.clone())).collect();
        let index = bean(&[], &incoming);

        let mut props = Properties::new();
        for (channel, set) in channels.iter().zip(&explicit) {
            if *set {
                props.set(
                    format!("mp.messaging.incoming.{}.value.deserializer", channel),
                    "com.acme.Explicit",
                );
            }
        }
        let report = DefaultSerdeDiscovery::new(&index, &props).run();

        for (channel, set) in channels.iter().zip(&explicit) {
            let key = format!("mp.messaging.incoming.{}.value.deserializer", channel);
            prop_assert_eq!(report.default_value(&key).is_none(), *set);
        }
    }

    /// Test that arbitrary signatures never panic the parser
    #[test]
    fn test_signature_parse_never_panics(s in "[A-Za-z<>\\[\\]?, .$]{0,40}") {
        let _ = TypeSignature::parse(&s);
    }

    /// Test that arbitrary property files never panic the parser
    #[test]
    fn test_properties_parse_never_panics(s in "[a-z.=:# \\\\\n${}-]{0,200}") {
        let _ = Properties::parse(&s);
    }
}
