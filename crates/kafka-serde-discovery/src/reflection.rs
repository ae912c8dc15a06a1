//! Reflective-access registration
//!
//! Application serde classes instantiate and (de)serialize payloads
//! reflectively. This module lists the payload classes that such serdes
//! handle, and the serde classes themselves.

use crate::emitter::EffectiveConfig;
use crate::index::TypeIndex;
use crate::names;
use crate::shape::ClassifiedPoint;
use crate::signature::TypeSignature;
use crate::types::PayloadRegistration;
use std::collections::BTreeSet;
use tracing::trace;

/// Whether a payload type may be registered for reflection
fn registrable_payload(payload: &TypeSignature) -> Option<String> {
    match payload {
        TypeSignature::Class(_) | TypeSignature::Parameterized { .. } => {}
        TypeSignature::Array(component) if !matches!(**component, TypeSignature::Primitive(_)) => {}
        _ => return None,
    }
    if payload.is_unresolvable() {
        return None;
    }
    let name = payload.erasure()?;
    if names::is_wrapper_type(&name) {
        return None;
    }
    Some(name)
}

/// Payload registrations for every classified point whose effective serde is
/// an application class
pub fn payload_registrations<I: TypeIndex + ?Sized>(
    index: &I,
    effective: &EffectiveConfig<'_>,
    points: &[ClassifiedPoint],
) -> Vec<PayloadRegistration> {
    let mut registrations = BTreeSet::new();

    for ClassifiedPoint { point, shape } in points {
        for (slot, payload) in shape.slots() {
            let Some(serde_class) = effective.serde_class(point.direction, &point.channel, slot)
            else {
                continue;
            };
            if index.class_by_name(&serde_class).is_none() {
                trace!("'{}' is not an application class", serde_class);
                continue;
            }
            let Some(payload) = registrable_payload(payload) else {
                continue;
            };
            registrations.insert(PayloadRegistration {
                site: point.site.clone(),
                channel: point.channel.clone(),
                payload,
            });
        }
    }

    registrations.into_iter().collect()
}

/// Application classes that are Kafka serdes and need reflective instantiation
pub fn serde_registrations<I: TypeIndex + ?Sized>(index: &I) -> Vec<String> {
    let mut bases = vec![
        names::KAFKA_SERIALIZER,
        names::KAFKA_DESERIALIZER,
        names::OBJECT_MAPPER_SERIALIZER,
        names::OBJECT_MAPPER_DESERIALIZER,
        names::JSONB_SERIALIZER,
        names::JSONB_DESERIALIZER,
    ];
    bases.extend(names::built_in_serde_classes());

    let classes: BTreeSet<String> = bases
        .iter()
        .flat_map(|base| index.known_subtypes(base))
        .map(|class| class.name.clone())
        .collect();
    classes.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Properties;
    use crate::index::{ClassIndex, ClassInfo};
    use crate::shape::{ShapeKind, TypeShape};
    use crate::types::{
        ChannelDirection, ConfigDefault, InjectionPoint, InjectionSite, Provenance,
    };

    fn sig(s: &str) -> TypeSignature {
        TypeSignature::parse(s).unwrap()
    }

    fn classified(channel: &str, direction: ChannelDirection, kind: ShapeKind) -> ClassifiedPoint {
        ClassifiedPoint {
            point: InjectionPoint {
                channel: channel.to_string(),
                direction,
                signature: None,
                provenance: Provenance::Annotation,
                site: InjectionSite::Method {
                    class: "com.acme.Bean".to_string(),
                    method: channel.to_string(),
                },
            },
            shape: TypeShape {
                kind,
                wrapper_depth: 0,
            },
        }
    }

    #[test]
    fn test_registrable_payloads() {
        assert_eq!(
            registrable_payload(&sig("com.acme.Dto")).as_deref(),
            Some("com.acme.Dto")
        );
        assert_eq!(
            registrable_payload(&sig("java.util.List<com.acme.Dto>")).as_deref(),
            Some("java.util.List")
        );
        assert_eq!(
            registrable_payload(&sig("com.acme.Dto[]")).as_deref(),
            Some("com.acme.Dto[]")
        );
        for excluded in ["long", "byte[]", "Object", "T", "Multi<Long>", "?"] {
            assert!(registrable_payload(&sig(excluded)).is_none(), "{}", excluded);
        }
    }

    #[test]
    fn test_registers_payloads_of_application_serdes() {
        let index = ClassIndex::from_classes([
            ClassInfo::new("com.acme.DtoDeserializer")
                .extends(sig("ObjectMapperDeserializer<com.acme.Dto>")),
            ClassInfo::new("com.acme.Dto"),
        ])
        .unwrap();
        let props = Properties::new()
            .with("mp.messaging.incoming.explicit.value.deserializer", "com.acme.DtoDeserializer");
        let defaults = vec![ConfigDefault::new(
            "mp.messaging.incoming.generated.value.deserializer",
            "com.acme.DtoDeserializer",
        )];
        let effective = EffectiveConfig::new(&props, &defaults);

        let dto = || ShapeKind::Value(sig("com.acme.Dto"));
        let points = vec![
            classified("explicit", ChannelDirection::Incoming, dto()),
            classified("generated", ChannelDirection::Incoming, dto()),
            classified("generated", ChannelDirection::Incoming, dto()),
            classified("builtin", ChannelDirection::Incoming, ShapeKind::Value(sig("String"))),
        ];
        let registrations = payload_registrations(&index, &effective, &points);

        let rendered: Vec<String> = registrations
            .iter()
            .map(|r| format!("{} {} {}", r.site, r.channel, r.payload))
            .collect();
        assert_eq!(
            rendered,
            vec![
                "com.acme.Bean#explicit explicit com.acme.Dto",
                "com.acme.Bean#generated generated com.acme.Dto",
            ]
        );
    }

    #[test]
    fn test_serde_registrations() {
        let index = ClassIndex::from_classes([
            ClassInfo::new("com.acme.DtoDeserializer")
                .extends(sig("ObjectMapperDeserializer<com.acme.Dto>")),
            ClassInfo::new("com.acme.RawSerializer").implements(sig("Serializer<byte[]>")),
            ClassInfo::new("com.acme.LoudStringSerializer")
                .extends(sig("org.apache.kafka.common.serialization.StringSerializer")),
            ClassInfo::new("com.acme.Dto"),
        ])
        .unwrap();
        assert_eq!(
            serde_registrations(&index),
            vec![
                "com.acme.DtoDeserializer",
                "com.acme.LoudStringSerializer",
                "com.acme.RawSerializer",
            ]
        );
    }
}
