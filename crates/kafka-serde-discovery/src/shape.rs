//! Type signature classifier
//!
//! Decomposes the declared type of an injection point into the payload it
//! carries:
//!
//! ```text
//!   Uni<Message<Record<Integer, UUID>>>
//!    │     │       │
//!    │     │       └── key-value carrier  → (Integer, UUID)
//!    │     └────────── message envelope   → unwrapped
//!    └──────────────── reactive wrapper   → peeled (bounded depth)
//! ```

use crate::names;
use crate::signature::{TypeSignature, WildcardBound};
use crate::types::{ChannelDirection, InjectionPoint, Slot};
use tracing::trace;

/// Payload layout of a classified signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeKind {
    /// A single value; no key serde is implied
    Value(TypeSignature),
    /// A record with independent key and value types
    KeyValue {
        key: TypeSignature,
        value: TypeSignature,
    },
}

/// The decomposed form of a declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeShape {
    pub kind: ShapeKind,
    /// Number of layers peeled to reach the payload
    pub wrapper_depth: usize,
}

impl TypeShape {
    /// Resolvable payload types, per slot
    pub fn slots(&self) -> Vec<(Slot, &TypeSignature)> {
        let slots = match &self.kind {
            ShapeKind::Value(value) => vec![(Slot::Value, value)],
            ShapeKind::KeyValue { key, value } => vec![(Slot::Key, key), (Slot::Value, value)],
        };
        slots
            .into_iter()
            .filter(|(_, signature)| !signature.is_unresolvable())
            .collect()
    }

    pub fn payload(&self, slot: Slot) -> Option<&TypeSignature> {
        self.slots()
            .into_iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, signature)| signature)
    }
}

/// An injection point together with its classified payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedPoint {
    pub point: InjectionPoint,
    pub shape: TypeShape,
}

enum Peeled<'a> {
    Inner(&'a TypeSignature),
    /// A wrapper used raw, without type arguments
    Raw,
    NotWrapper,
}

/// Classify `signature` as seen from `direction`
///
/// Returns `None` when the signature does not decompose into a concrete
/// payload: raw wrappers, `Object`, wildcards, type variables, `void`,
/// key-value carriers used in the wrong direction, or more than
/// `max_wrapper_depth` reactive wrappers.
pub fn classify(
    signature: &TypeSignature,
    direction: ChannelDirection,
    max_wrapper_depth: usize,
) -> Option<TypeShape> {
    let mut current = upper_bound(signature);
    let mut reactive_depth = 0;

    loop {
        match peel_reactive(current, direction) {
            Peeled::Inner(inner) => {
                reactive_depth += 1;
                if reactive_depth > max_wrapper_depth {
                    trace!("'{}' nests more than {} wrappers", signature, max_wrapper_depth);
                    return None;
                }
                current = upper_bound(inner);
            }
            Peeled::Raw => {
                trace!("'{}' uses a raw wrapper", signature);
                return None;
            }
            Peeled::NotWrapper => break,
        }
    }

    let mut wrapper_depth = reactive_depth;
    if current.is(names::MESSAGE) {
        current = upper_bound(current.argument(0)?);
        wrapper_depth += 1;
    }

    if let Some(allowed) = key_value_direction(current) {
        if allowed.is_some_and(|d| d != direction) {
            trace!("'{}' cannot be used as {}", current, direction);
            return None;
        }
        let [key, value] = current.arguments() else {
            return None;
        };
        let shape = TypeShape {
            kind: ShapeKind::KeyValue {
                key: upper_bound(key).clone(),
                value: upper_bound(value).clone(),
            },
            wrapper_depth: wrapper_depth + 1,
        };
        return (!shape.slots().is_empty()).then_some(shape);
    }

    if current.raw_name().is_some_and(names::is_wrapper_type) || current.is_unresolvable() {
        return None;
    }

    Some(TypeShape {
        kind: ShapeKind::Value(current.clone()),
        wrapper_depth,
    })
}

fn peel_reactive(signature: &TypeSignature, direction: ChannelDirection) -> Peeled<'_> {
    let Some(raw) = signature.raw_name() else {
        return Peeled::NotWrapper;
    };
    let position = match raw {
        names::COMPLETION_STAGE
        | names::UNI
        | names::MULTI
        | names::PUBLISHER
        | names::FLOW_PUBLISHER
        | names::PUBLISHER_BUILDER
        | names::SUBSCRIBER
        | names::FLOW_SUBSCRIBER
        | names::SUBSCRIBER_BUILDER => 0,
        names::PROCESSOR | names::FLOW_PROCESSOR | names::PROCESSOR_BUILDER => match direction {
            ChannelDirection::Incoming => 0,
            ChannelDirection::Outgoing => 1,
        },
        _ => return Peeled::NotWrapper,
    };
    match signature.argument(position) {
        Some(inner) => Peeled::Inner(inner),
        None => Peeled::Raw,
    }
}

/// `Some(None)` for carriers usable both ways, `Some(Some(d))` for one-way carriers
fn key_value_direction(signature: &TypeSignature) -> Option<Option<ChannelDirection>> {
    match signature.raw_name()? {
        names::RECORD | names::KAFKA_RECORD => Some(None),
        names::CONSUMER_RECORD => Some(Some(ChannelDirection::Incoming)),
        names::PRODUCER_RECORD => Some(Some(ChannelDirection::Outgoing)),
        _ => None,
    }
}

/// `? extends T` reads as `T`
fn upper_bound(signature: &TypeSignature) -> &TypeSignature {
    match signature {
        TypeSignature::Wildcard(WildcardBound::Extends(bound)) => upper_bound(bound),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Primitive;

    fn classify_str(signature: &str, direction: ChannelDirection) -> Option<TypeShape> {
        classify(&TypeSignature::parse(signature).unwrap(), direction, 4)
    }

    fn value_of(signature: &str, direction: ChannelDirection) -> Option<TypeSignature> {
        match classify_str(signature, direction)?.kind {
            ShapeKind::Value(value) => Some(value),
            ShapeKind::KeyValue { .. } => None,
        }
    }

    #[test]
    fn test_plain_value() {
        let shape = classify_str("Long", ChannelDirection::Outgoing).unwrap();
        assert_eq!(shape.kind, ShapeKind::Value(TypeSignature::class(names::LONG)));
        assert_eq!(shape.wrapper_depth, 0);
    }

    #[test]
    fn test_reactive_and_message_wrappers() {
        for signature in [
            "Message<Long>",
            "CompletionStage<Long>",
            "CompletionStage<Message<Long>>",
            "Uni<Long>",
            "Uni<Message<Long>>",
            "Publisher<Long>",
            "Publisher<Message<Long>>",
            "PublisherBuilder<Long>",
            "PublisherBuilder<Message<Long>>",
            "Multi<Long>",
            "Multi<Message<Long>>",
            "java.util.concurrent.Flow$Publisher<Long>",
        ] {
            assert_eq!(
                value_of(signature, ChannelDirection::Outgoing),
                Some(TypeSignature::class(names::LONG)),
                "{}",
                signature
            );
        }

        let shape = classify_str("Uni<Message<Long>>", ChannelDirection::Outgoing).unwrap();
        assert_eq!(shape.wrapper_depth, 2);
    }

    #[test]
    fn test_processor_is_direction_dependent() {
        let signature = "Processor<Message<Float>, Message<Short>>";
        assert_eq!(
            value_of(signature, ChannelDirection::Incoming),
            Some(TypeSignature::class(names::FLOAT))
        );
        assert_eq!(
            value_of(signature, ChannelDirection::Outgoing),
            Some(TypeSignature::class(names::SHORT))
        );
        assert_eq!(
            value_of("ProcessorBuilder<String, byte[]>", ChannelDirection::Outgoing),
            Some(TypeSignature::Array(Box::new(TypeSignature::Primitive(
                Primitive::Byte
            ))))
        );
        assert_eq!(
            value_of("SubscriberBuilder<Long, Void>", ChannelDirection::Incoming),
            Some(TypeSignature::class(names::LONG))
        );
    }

    #[test]
    fn test_key_value_carriers() {
        let shape =
            classify_str("Multi<KafkaRecord<Integer, UUID>>", ChannelDirection::Incoming).unwrap();
        assert_eq!(
            shape.kind,
            ShapeKind::KeyValue {
                key: TypeSignature::class(names::INTEGER),
                value: TypeSignature::class(names::UUID),
            }
        );
        assert_eq!(shape.wrapper_depth, 2);
        assert_eq!(shape.slots().len(), 2);

        assert!(classify_str("ConsumerRecord<Integer, UUID>", ChannelDirection::Incoming).is_some());
        assert!(classify_str("ConsumerRecord<Integer, UUID>", ChannelDirection::Outgoing).is_none());
        assert!(classify_str("ProducerRecord<Double, ByteBuffer>", ChannelDirection::Outgoing).is_some());
        assert!(classify_str("ProducerRecord<Double, ByteBuffer>", ChannelDirection::Incoming).is_none());
    }

    #[test]
    fn test_key_value_with_unresolvable_key() {
        let shape = classify_str("Record<Object, String>", ChannelDirection::Outgoing).unwrap();
        assert!(shape.payload(Slot::Key).is_none());
        assert_eq!(
            shape.payload(Slot::Value),
            Some(&TypeSignature::class(names::STRING))
        );

        assert!(classify_str("Record<K, V>", ChannelDirection::Outgoing).is_none());
    }

    #[test]
    fn test_unclassifiable() {
        for signature in [
            "Object",
            "void",
            "T",
            "Message<?>",
            "Multi<? super Long>",
            "CompletionStage<Void>",
            "io.smallrye.mutiny.Multi",
            "org.eclipse.microprofile.reactive.messaging.Message",
            "Record<Integer>",
            "Emitter<Long>",
        ] {
            assert!(
                classify_str(signature, ChannelDirection::Outgoing).is_none(),
                "{}",
                signature
            );
        }
    }

    #[test]
    fn test_upper_bounded_wildcard() {
        assert_eq!(
            value_of("Multi<? extends String>", ChannelDirection::Incoming),
            Some(TypeSignature::class(names::STRING))
        );
    }

    #[test]
    fn test_depth_limit() {
        let signature = TypeSignature::parse("Uni<Uni<Uni<Long>>>").unwrap();
        assert!(classify(&signature, ChannelDirection::Outgoing, 3).is_some());
        assert!(classify(&signature, ChannelDirection::Outgoing, 2).is_none());
    }
}
