//! Well-known fully qualified names
//!
//! Annotations, wrapper types, payload types and serde classes that the
//! discovery pass recognises. Names follow the binary-name convention of the
//! index (`Outer$Inner` for nested classes).

use std::collections::HashMap;
use std::sync::LazyLock;

/// Connector name of the Kafka connector
pub const KAFKA_CONNECTOR: &str = "smallrye-kafka";

// Messaging annotations
pub const INCOMING: &str = "org.eclipse.microprofile.reactive.messaging.Incoming";
pub const INCOMINGS: &str = "io.smallrye.reactive.messaging.annotations.Incomings";
pub const OUTGOING: &str = "org.eclipse.microprofile.reactive.messaging.Outgoing";
pub const CHANNEL: &str = "org.eclipse.microprofile.reactive.messaging.Channel";
pub const LEGACY_CHANNEL: &str = "io.smallrye.reactive.messaging.annotations.Channel";

// Emitters
pub const EMITTER: &str = "org.eclipse.microprofile.reactive.messaging.Emitter";
pub const MUTINY_EMITTER: &str = "io.smallrye.reactive.messaging.MutinyEmitter";
pub const LEGACY_EMITTER: &str = "io.smallrye.reactive.messaging.annotations.Emitter";

// Envelopes
pub const MESSAGE: &str = "org.eclipse.microprofile.reactive.messaging.Message";
pub const METADATA: &str = "org.eclipse.microprofile.reactive.messaging.Metadata";
pub const KAFKA_RECORD: &str = "io.smallrye.reactive.messaging.kafka.KafkaRecord";
pub const RECORD: &str = "io.smallrye.reactive.messaging.kafka.Record";
pub const CONSUMER_RECORD: &str = "org.apache.kafka.clients.consumer.ConsumerRecord";
pub const PRODUCER_RECORD: &str = "org.apache.kafka.clients.producer.ProducerRecord";
pub const INCOMING_KAFKA_RECORD_METADATA: &str =
    "io.smallrye.reactive.messaging.kafka.api.IncomingKafkaRecordMetadata";
pub const KAFKA_MESSAGE_METADATA: &str =
    "io.smallrye.reactive.messaging.kafka.api.KafkaMessageMetadata";

// Reactive and async wrappers
pub const COMPLETION_STAGE: &str = "java.util.concurrent.CompletionStage";
pub const UNI: &str = "io.smallrye.mutiny.Uni";
pub const MULTI: &str = "io.smallrye.mutiny.Multi";
pub const PUBLISHER: &str = "org.reactivestreams.Publisher";
pub const FLOW_PUBLISHER: &str = "java.util.concurrent.Flow$Publisher";
pub const PUBLISHER_BUILDER: &str =
    "org.eclipse.microprofile.reactive.streams.operators.PublisherBuilder";
pub const SUBSCRIBER: &str = "org.reactivestreams.Subscriber";
pub const FLOW_SUBSCRIBER: &str = "java.util.concurrent.Flow$Subscriber";
pub const SUBSCRIBER_BUILDER: &str =
    "org.eclipse.microprofile.reactive.streams.operators.SubscriberBuilder";
pub const PROCESSOR: &str = "org.reactivestreams.Processor";
pub const FLOW_PROCESSOR: &str = "java.util.concurrent.Flow$Processor";
pub const PROCESSOR_BUILDER: &str =
    "org.eclipse.microprofile.reactive.streams.operators.ProcessorBuilder";

// Payload types
pub const OBJECT: &str = "java.lang.Object";
pub const STRING: &str = "java.lang.String";
pub const LONG: &str = "java.lang.Long";
pub const INTEGER: &str = "java.lang.Integer";
pub const SHORT: &str = "java.lang.Short";
pub const FLOAT: &str = "java.lang.Float";
pub const DOUBLE: &str = "java.lang.Double";
pub const BOOLEAN: &str = "java.lang.Boolean";
pub const BYTE: &str = "java.lang.Byte";
pub const CHARACTER: &str = "java.lang.Character";
pub const VOID: &str = "java.lang.Void";
pub const UUID: &str = "java.util.UUID";
pub const LIST: &str = "java.util.List";
pub const BYTE_ARRAY: &str = "byte[]";
pub const BYTE_BUFFER: &str = "java.nio.ByteBuffer";
pub const KAFKA_BYTES: &str = "org.apache.kafka.common.utils.Bytes";
pub const VERTX_BUFFER: &str = "io.vertx.core.buffer.Buffer";
pub const VERTX_JSON_OBJECT: &str = "io.vertx.core.json.JsonObject";
pub const VERTX_JSON_ARRAY: &str = "io.vertx.core.json.JsonArray";
pub const AVRO_GENERATED: &str = "org.apache.avro.specific.AvroGenerated";
pub const AVRO_GENERIC_RECORD: &str = "org.apache.avro.generic.GenericRecord";
pub const AVRO_GENERIC_DATA_RECORD: &str = "org.apache.avro.generic.GenericData$Record";

// Serde interfaces and bases
pub const KAFKA_SERIALIZER: &str = "org.apache.kafka.common.serialization.Serializer";
pub const KAFKA_DESERIALIZER: &str = "org.apache.kafka.common.serialization.Deserializer";
pub const OBJECT_MAPPER_SERIALIZER: &str =
    "io.quarkus.kafka.client.serialization.ObjectMapperSerializer";
pub const OBJECT_MAPPER_DESERIALIZER: &str =
    "io.quarkus.kafka.client.serialization.ObjectMapperDeserializer";
pub const JSONB_SERIALIZER: &str = "io.quarkus.kafka.client.serialization.JsonbSerializer";
pub const JSONB_DESERIALIZER: &str = "io.quarkus.kafka.client.serialization.JsonbDeserializer";

// Concrete serde classes
pub const APICURIO_AVRO_SERIALIZER: &str = "io.apicurio.registry.serde.avro.AvroKafkaSerializer";
pub const APICURIO_AVRO_DESERIALIZER: &str =
    "io.apicurio.registry.serde.avro.AvroKafkaDeserializer";
pub const SPECIFIC_AVRO_READER_PROPERTY: &str = "apicurio.registry.use-specific-avro-reader";

/// Serializer/deserializer pair for a well-known payload type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerdePair {
    pub serializer: &'static str,
    pub deserializer: &'static str,
}

macro_rules! kafka_pair {
    ($prefix:literal) => {
        SerdePair {
            serializer: concat!("org.apache.kafka.common.serialization.", $prefix, "Serializer"),
            deserializer: concat!(
                "org.apache.kafka.common.serialization.",
                $prefix,
                "Deserializer"
            ),
        }
    };
}

macro_rules! vertx_pair {
    ($prefix:literal) => {
        SerdePair {
            serializer: concat!("io.vertx.kafka.client.serialization.", $prefix, "Serializer"),
            deserializer: concat!("io.vertx.kafka.client.serialization.", $prefix, "Deserializer"),
        }
    };
}

/// Exact payload type → built-in serde pair. Primitives map like their boxes.
static WELL_KNOWN_SERDES: LazyLock<HashMap<&'static str, SerdePair>> = LazyLock::new(|| {
    HashMap::from([
        (STRING, kafka_pair!("String")),
        (LONG, kafka_pair!("Long")),
        ("long", kafka_pair!("Long")),
        (INTEGER, kafka_pair!("Integer")),
        ("int", kafka_pair!("Integer")),
        (SHORT, kafka_pair!("Short")),
        ("short", kafka_pair!("Short")),
        (FLOAT, kafka_pair!("Float")),
        ("float", kafka_pair!("Float")),
        (DOUBLE, kafka_pair!("Double")),
        ("double", kafka_pair!("Double")),
        (UUID, kafka_pair!("UUID")),
        (BYTE_ARRAY, kafka_pair!("ByteArray")),
        (BYTE_BUFFER, kafka_pair!("ByteBuffer")),
        (KAFKA_BYTES, kafka_pair!("Bytes")),
        (VERTX_BUFFER, vertx_pair!("Buffer")),
    ])
});

/// JSON container payload type → Vert.x JSON serde pair
static JSON_CONTAINER_SERDES: LazyLock<HashMap<&'static str, SerdePair>> = LazyLock::new(|| {
    HashMap::from([
        (VERTX_JSON_OBJECT, vertx_pair!("JsonObject")),
        (VERTX_JSON_ARRAY, vertx_pair!("JsonArray")),
    ])
});

pub fn well_known_serde(payload: &str) -> Option<SerdePair> {
    WELL_KNOWN_SERDES.get(payload).copied()
}

pub fn json_container_serde(payload: &str) -> Option<SerdePair> {
    JSON_CONTAINER_SERDES.get(payload).copied()
}

/// Built-in serde classes whose application subclasses need reflection
pub fn built_in_serde_classes() -> Vec<&'static str> {
    let mut classes: Vec<&'static str> = WELL_KNOWN_SERDES
        .values()
        .chain(JSON_CONTAINER_SERDES.values())
        .flat_map(|pair| [pair.serializer, pair.deserializer])
        .collect();
    classes.sort_unstable();
    classes.dedup();
    classes
}

/// Types that only ever wrap a payload and never are one
pub const WRAPPER_TYPES: &[&str] = &[
    COMPLETION_STAGE,
    UNI,
    MULTI,
    PUBLISHER,
    FLOW_PUBLISHER,
    PUBLISHER_BUILDER,
    SUBSCRIBER,
    FLOW_SUBSCRIBER,
    SUBSCRIBER_BUILDER,
    PROCESSOR,
    FLOW_PROCESSOR,
    PROCESSOR_BUILDER,
    MESSAGE,
    EMITTER,
    MUTINY_EMITTER,
    LEGACY_EMITTER,
    KAFKA_RECORD,
    RECORD,
    CONSUMER_RECORD,
    PRODUCER_RECORD,
];

pub fn is_wrapper_type(name: &str) -> bool {
    WRAPPER_TYPES.contains(&name)
}

/// Simple names resolved without an explicit import when parsing signatures
pub static DEFAULT_IMPORTS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let names = [
        INCOMING,
        INCOMINGS,
        OUTGOING,
        CHANNEL,
        EMITTER,
        MUTINY_EMITTER,
        MESSAGE,
        METADATA,
        KAFKA_RECORD,
        RECORD,
        CONSUMER_RECORD,
        PRODUCER_RECORD,
        COMPLETION_STAGE,
        UNI,
        MULTI,
        PUBLISHER,
        PUBLISHER_BUILDER,
        SUBSCRIBER,
        SUBSCRIBER_BUILDER,
        PROCESSOR,
        PROCESSOR_BUILDER,
        OBJECT,
        STRING,
        LONG,
        INTEGER,
        SHORT,
        FLOAT,
        DOUBLE,
        BOOLEAN,
        BYTE,
        CHARACTER,
        VOID,
        UUID,
        LIST,
        BYTE_BUFFER,
        KAFKA_BYTES,
        VERTX_BUFFER,
        VERTX_JSON_OBJECT,
        VERTX_JSON_ARRAY,
        AVRO_GENERATED,
        AVRO_GENERIC_RECORD,
        KAFKA_SERIALIZER,
        KAFKA_DESERIALIZER,
        OBJECT_MAPPER_SERIALIZER,
        OBJECT_MAPPER_DESERIALIZER,
        JSONB_SERIALIZER,
        JSONB_DESERIALIZER,
    ];
    names
        .into_iter()
        .map(|name| (simple_name(name), name))
        .collect()
});

/// Last segment of a binary name (`a.b.Outer$Inner` → `Inner`)
pub fn simple_name(name: &str) -> &str {
    let tail = name.rsplit('.').next().unwrap_or(name);
    tail.rsplit('$').next().unwrap_or(tail)
}
