//! Payload-to-serde resolution
//!
//! Maps one concrete payload type to the serde class that handles it. The
//! rules are tried in order and the first match wins:
//!
//! 1. well-known types (`String`, boxed numbers, `byte[]`, ...), unless an
//!    application serde targets the exact same type
//! 2. Avro generated classes
//! 3. Avro generic records
//! 4. Vert.x JSON containers
//! 5. application serdes found in the index
//! 6. unresolved

use crate::index::{Annotated, TypeIndex};
use crate::names::{self, SerdePair};
use crate::signature::TypeSignature;
use crate::types::SerdeRole;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Resolution outcome for one payload type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedPayloadType {
    WellKnown(SerdePair),
    AvroGenerated,
    AvroGenericRecord,
    JsonContainer(SerdePair),
    /// An application serde class, for the requested role
    Custom(String),
    Unresolved,
}

impl ClassifiedPayloadType {
    /// Serde class to configure for `role`
    pub fn serde_class(&self, role: SerdeRole) -> Option<&str> {
        let pair = match self {
            ClassifiedPayloadType::WellKnown(pair) | ClassifiedPayloadType::JsonContainer(pair) => {
                *pair
            }
            ClassifiedPayloadType::AvroGenerated | ClassifiedPayloadType::AvroGenericRecord => {
                SerdePair {
                    serializer: names::APICURIO_AVRO_SERIALIZER,
                    deserializer: names::APICURIO_AVRO_DESERIALIZER,
                }
            }
            ClassifiedPayloadType::Custom(class) => return Some(class.as_str()),
            ClassifiedPayloadType::Unresolved => return None,
        };
        Some(match role {
            SerdeRole::Serializer => pair.serializer,
            SerdeRole::Deserializer => pair.deserializer,
        })
    }

    /// Whether the deserializer needs the specific Avro reader switched on
    pub fn uses_specific_avro_reader(&self, role: SerdeRole) -> bool {
        matches!(self, ClassifiedPayloadType::AvroGenerated) && role == SerdeRole::Deserializer
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, ClassifiedPayloadType::Unresolved)
    }
}

/// Bases an application serde extends or implements, per role
fn serde_bases(role: SerdeRole) -> [&'static str; 3] {
    match role {
        SerdeRole::Serializer => [
            names::OBJECT_MAPPER_SERIALIZER,
            names::JSONB_SERIALIZER,
            names::KAFKA_SERIALIZER,
        ],
        SerdeRole::Deserializer => [
            names::OBJECT_MAPPER_DESERIALIZER,
            names::JSONB_DESERIALIZER,
            names::KAFKA_DESERIALIZER,
        ],
    }
}

/// Resolves payload types against a type index
///
/// Application serdes are collected once at construction, keyed by the
/// payload type they are bound to.
pub struct SerdeResolver<'a, I: TypeIndex + ?Sized> {
    index: &'a I,
    serializers: HashMap<TypeSignature, Vec<String>>,
    deserializers: HashMap<TypeSignature, Vec<String>>,
}

impl<'a, I: TypeIndex + ?Sized> SerdeResolver<'a, I> {
    pub fn new(index: &'a I) -> Self {
        let serializers = collect_custom_serdes(index, SerdeRole::Serializer);
        let deserializers = collect_custom_serdes(index, SerdeRole::Deserializer);
        debug!(
            "Found {} application serializer target(s) and {} deserializer target(s)",
            serializers.len(),
            deserializers.len()
        );
        Self {
            index,
            serializers,
            deserializers,
        }
    }

    pub fn resolve(&self, payload: &TypeSignature, role: SerdeRole) -> ClassifiedPayloadType {
        if payload.is_unresolvable() {
            return ClassifiedPayloadType::Unresolved;
        }
        let Some(name) = payload.erasure() else {
            return ClassifiedPayloadType::Unresolved;
        };
        let custom = self.custom_candidates(payload, role);

        if let Some(pair) = names::well_known_serde(&name) {
            return match custom {
                [] => ClassifiedPayloadType::WellKnown(pair),
                _ => self.pick_custom(payload, role, custom),
            };
        }

        if self
            .index
            .class_by_name(&name)
            .is_some_and(|class| class.has_annotation(names::AVRO_GENERATED))
        {
            return ClassifiedPayloadType::AvroGenerated;
        }

        if name == names::AVRO_GENERIC_RECORD || name == names::AVRO_GENERIC_DATA_RECORD {
            return ClassifiedPayloadType::AvroGenericRecord;
        }

        if let Some(pair) = names::json_container_serde(&name) {
            return ClassifiedPayloadType::JsonContainer(pair);
        }

        if custom.is_empty() {
            return ClassifiedPayloadType::Unresolved;
        }
        self.pick_custom(payload, role, custom)
    }

    fn custom_candidates(&self, payload: &TypeSignature, role: SerdeRole) -> &[String] {
        let table = match role {
            SerdeRole::Serializer => &self.serializers,
            SerdeRole::Deserializer => &self.deserializers,
        };
        table.get(payload).map(Vec::as_slice).unwrap_or_default()
    }

    fn pick_custom(
        &self,
        payload: &TypeSignature,
        role: SerdeRole,
        candidates: &[String],
    ) -> ClassifiedPayloadType {
        match candidates {
            [single] => ClassifiedPayloadType::Custom(single.clone()),
            _ => {
                warn!(
                    "Unable to pick a default {} for '{}': multiple candidates found: {}",
                    role,
                    payload,
                    candidates.join(", ")
                );
                ClassifiedPayloadType::Unresolved
            }
        }
    }
}

fn collect_custom_serdes<I: TypeIndex + ?Sized>(
    index: &I,
    role: SerdeRole,
) -> HashMap<TypeSignature, Vec<String>> {
    let mut found: HashMap<TypeSignature, BTreeSet<String>> = HashMap::new();
    for class in index.classes() {
        if !class.type_parameters.is_empty() {
            continue;
        }
        for base in serde_bases(role) {
            let Some(supertype) = index.generic_supertype(class, base) else {
                continue;
            };
            match supertype.argument(0) {
                Some(target) if !target.is_unresolvable() => {
                    found
                        .entry(target.clone())
                        .or_default()
                        .insert(class.name.clone());
                }
                _ => {}
            }
        }
    }
    found
        .into_iter()
        .map(|(target, classes)| (target, classes.into_iter().collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{AnnotationInstance, ClassIndex, ClassInfo};

    fn sig(s: &str) -> TypeSignature {
        TypeSignature::parse(s).unwrap()
    }

    fn index(classes: Vec<ClassInfo>) -> ClassIndex {
        ClassIndex::from_classes(classes).unwrap()
    }

    #[test]
    fn test_well_known_types() {
        let index = ClassIndex::new();
        let resolver = SerdeResolver::new(&index);

        let long = resolver.resolve(&sig("Long"), SerdeRole::Serializer);
        assert_eq!(
            long.serde_class(SerdeRole::Serializer),
            Some("org.apache.kafka.common.serialization.LongSerializer")
        );
        let bytes = resolver.resolve(&sig("byte[]"), SerdeRole::Deserializer);
        assert_eq!(
            bytes.serde_class(SerdeRole::Deserializer),
            Some("org.apache.kafka.common.serialization.ByteArrayDeserializer")
        );
        let primitive = resolver.resolve(&sig("int"), SerdeRole::Deserializer);
        assert_eq!(
            primitive.serde_class(SerdeRole::Deserializer),
            Some("org.apache.kafka.common.serialization.IntegerDeserializer")
        );
    }

    #[test]
    fn test_avro_generated_and_generic() {
        let index = index(vec![
            ClassInfo::new("com.acme.AvroDto").annotated(AnnotationInstance::new(names::AVRO_GENERATED))
        ]);
        let resolver = SerdeResolver::new(&index);

        let avro = resolver.resolve(&sig("com.acme.AvroDto"), SerdeRole::Deserializer);
        assert_eq!(avro, ClassifiedPayloadType::AvroGenerated);
        assert!(avro.uses_specific_avro_reader(SerdeRole::Deserializer));
        assert!(!avro.uses_specific_avro_reader(SerdeRole::Serializer));
        assert_eq!(
            avro.serde_class(SerdeRole::Serializer),
            Some(names::APICURIO_AVRO_SERIALIZER)
        );

        let generic = resolver.resolve(&sig("GenericRecord"), SerdeRole::Serializer);
        assert_eq!(generic, ClassifiedPayloadType::AvroGenericRecord);
        assert!(!generic.uses_specific_avro_reader(SerdeRole::Deserializer));
        assert_eq!(
            resolver.resolve(
                &sig("org.apache.avro.generic.GenericData$Record"),
                SerdeRole::Serializer
            ),
            ClassifiedPayloadType::AvroGenericRecord
        );
    }

    #[test]
    fn test_json_containers() {
        let index = ClassIndex::new();
        let resolver = SerdeResolver::new(&index);
        assert_eq!(
            resolver
                .resolve(&sig("JsonObject"), SerdeRole::Serializer)
                .serde_class(SerdeRole::Serializer),
            Some("io.vertx.kafka.client.serialization.JsonObjectSerializer")
        );
    }

    #[test]
    fn test_custom_serde_subclasses() {
        let index = index(vec![
            ClassInfo::new("com.acme.JacksonDtoDeserializer")
                .extends(sig("ObjectMapperDeserializer<com.acme.JacksonDto>")),
            ClassInfo::new("com.acme.JsonbDtoSerializer")
                .extends(sig("JsonbSerializer<com.acme.JsonbDto>")),
            ClassInfo::new("com.acme.PlainSerializer").implements(sig("Serializer<com.acme.Plain>")),
        ]);
        let resolver = SerdeResolver::new(&index);

        assert_eq!(
            resolver.resolve(&sig("com.acme.JacksonDto"), SerdeRole::Deserializer),
            ClassifiedPayloadType::Custom("com.acme.JacksonDtoDeserializer".to_string())
        );
        assert_eq!(
            resolver.resolve(&sig("com.acme.JacksonDto"), SerdeRole::Serializer),
            ClassifiedPayloadType::Unresolved
        );
        assert_eq!(
            resolver.resolve(&sig("com.acme.JsonbDto"), SerdeRole::Serializer),
            ClassifiedPayloadType::Custom("com.acme.JsonbDtoSerializer".to_string())
        );
        assert_eq!(
            resolver.resolve(&sig("com.acme.Plain"), SerdeRole::Serializer),
            ClassifiedPayloadType::Custom("com.acme.PlainSerializer".to_string())
        );
        assert_eq!(
            resolver.resolve(&sig("com.acme.Unknown"), SerdeRole::Serializer),
            ClassifiedPayloadType::Unresolved
        );
    }

    #[test]
    fn test_transitive_custom_serde() {
        let index = index(vec![
            ClassInfo::new("com.acme.BaseDeserializer")
                .with_type_parameter("T")
                .extends(sig("ObjectMapperDeserializer<T>")),
            ClassInfo::new("com.acme.OrderDeserializer")
                .extends(sig("com.acme.BaseDeserializer<com.acme.Order>")),
        ]);
        let resolver = SerdeResolver::new(&index);
        assert_eq!(
            resolver.resolve(&sig("com.acme.Order"), SerdeRole::Deserializer),
            ClassifiedPayloadType::Custom("com.acme.OrderDeserializer".to_string())
        );
    }

    #[test]
    fn test_custom_serde_beats_well_known() {
        let index = index(vec![ClassInfo::new("com.acme.UpperCaseDeserializer")
            .implements(sig("Deserializer<String>"))]);
        let resolver = SerdeResolver::new(&index);
        assert_eq!(
            resolver.resolve(&sig("String"), SerdeRole::Deserializer),
            ClassifiedPayloadType::Custom("com.acme.UpperCaseDeserializer".to_string())
        );
        assert!(matches!(
            resolver.resolve(&sig("String"), SerdeRole::Serializer),
            ClassifiedPayloadType::WellKnown(_)
        ));
    }

    #[test]
    fn test_ambiguous_custom_serde_is_unresolved() {
        let index = index(vec![
            ClassInfo::new("com.acme.FirstDtoSerializer")
                .extends(sig("ObjectMapperSerializer<com.acme.Dto>")),
            ClassInfo::new("com.acme.SecondDtoSerializer")
                .extends(sig("JsonbSerializer<com.acme.Dto>")),
        ]);
        let resolver = SerdeResolver::new(&index);
        assert_eq!(
            resolver.resolve(&sig("com.acme.Dto"), SerdeRole::Serializer),
            ClassifiedPayloadType::Unresolved
        );
    }

    #[test]
    fn test_unresolvable_payloads() {
        let index = ClassIndex::new();
        let resolver = SerdeResolver::new(&index);
        for payload in ["Object", "T", "void"] {
            assert!(!resolver
                .resolve(&sig(payload), SerdeRole::Serializer)
                .is_resolved());
        }
    }
}
