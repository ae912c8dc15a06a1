//! # Kafka Default Serde Discovery
//!
//! Static analysis that infers the Kafka key/value serializer and
//! deserializer of every reactive-messaging channel from the declared types
//! of its injection points.
//!
//! ## Features
//!
//! - **Wrapper Peeling**: `CompletionStage`, `Uni`, `Multi`, `Publisher`,
//!   `Subscriber`, `Processor` and their builders, then `Message`
//! - **Key/Value Carriers**: `Record`, `KafkaRecord`, `ConsumerRecord`, `ProducerRecord`
//! - **Payload Heuristics**: well-known types, Avro generated classes and
//!   generic records, Vert.x JSON, application Jackson/JSON-B serdes
//! - **Never Overrides**: explicit channel or connector configuration wins
//! - **Connector Aware**: only channels routed through `smallrye-kafka` get defaults
//! - **Reflection Lists**: payload and serde classes needing reflective access
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  DefaultSerdeDiscovery::run                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TypeIndex ──▶ ChannelWalker ──▶ InjectionPoint*             │
//! │                     │                                        │
//! │  ConfigSource ──▶ ConnectorRouter (Kafka channels only)      │
//! │                     │                                        │
//! │                 classify() ──▶ TypeShape                     │
//! │                     │                                        │
//! │                 SerdeResolver ──▶ ClassifiedPayloadType      │
//! │                     │                                        │
//! │                 DefaultEmitter ──▶ ConfigDefault*            │
//! │                     │                                        │
//! │                 reflection ──▶ PayloadRegistration*          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kafka_serde_discovery::{DefaultSerdeDiscovery, IndexManifest, Properties};
//!
//! let index = IndexManifest::load("index.yaml")?.to_index()?;
//! let props = Properties::load("application.properties")?;
//!
//! let report = DefaultSerdeDiscovery::new(&index, &props).run();
//! print!("{}", report.to_properties());
//! ```
//!
//! ## Generated Keys
//!
//! | Key | When |
//! |-----|------|
//! | `mp.messaging.<dir>.<channel>.value.<role>` | payload resolved |
//! | `mp.messaging.<dir>.<channel>.key.<role>` | record key resolved |
//! | `mp.messaging.incoming.<channel>.apicurio.registry.use-specific-avro-reader` | Avro generated payload consumed |
//!
//! `<role>` is `deserializer` for incoming channels and `serializer` for
//! outgoing ones.

pub mod channel;
pub mod config;
pub mod discovery;
pub mod emitter;
pub mod error;
pub mod index;
pub mod manifest;
pub mod names;
pub mod reflection;
pub mod resolver;
pub mod shape;
pub mod signature;
pub mod types;

// Re-exports for convenience
pub use channel::{ChannelWalker, ConnectorRouter};
pub use config::{ConfigSource, DiscoveryConfig, Properties};
pub use discovery::{DefaultSerdeDiscovery, DiscoveryReport};
pub use emitter::{DefaultEmitter, EffectiveConfig};
pub use error::{DiscoveryError, DiscoveryResult};
pub use index::{
    Annotated, AnnotationInstance, AnnotationTarget, ClassIndex, ClassInfo, FieldInfo, MethodInfo,
    ParameterInfo, TypeIndex,
};
pub use manifest::IndexManifest;
pub use resolver::{ClassifiedPayloadType, SerdeResolver};
pub use shape::{classify, ClassifiedPoint, ShapeKind, TypeShape};
pub use signature::{Imports, Primitive, TypeSignature, WildcardBound};
pub use types::{
    ChannelDirection, ConfigDefault, InjectionPoint, InjectionSite, PayloadRegistration,
    Provenance, SerdeAssignment, SerdeRole, Slot,
};
