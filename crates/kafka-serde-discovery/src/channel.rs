//! Channel discovery
//!
//! [`ChannelWalker`] enumerates the messaging injection points declared in
//! the index. [`ConnectorRouter`] decides which of their channels are served
//! by the Kafka connector.

use crate::config::{ConfigSource, DiscoveryConfig};
use crate::index::{Annotated, AnnotationInstance, AnnotationTarget, MethodInfo, TypeIndex};
use crate::names;
use crate::signature::TypeSignature;
use crate::types::{ChannelDirection, InjectionPoint, InjectionSite, Provenance};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// Parameter types carrying metadata rather than a payload
const CONTEXT_PARAMETER_TYPES: &[&str] = &[
    names::METADATA,
    names::INCOMING_KAFKA_RECORD_METADATA,
    names::KAFKA_MESSAGE_METADATA,
];

const EMITTER_TYPES: &[&str] = &[names::EMITTER, names::MUTINY_EMITTER, names::LEGACY_EMITTER];

const CHANNEL_STREAM_TYPES: &[&str] = &[
    names::PUBLISHER,
    names::FLOW_PUBLISHER,
    names::MULTI,
    names::PUBLISHER_BUILDER,
];

/// Return types that let a parameterless `@Incoming` method consume
const CONSUMING_RETURN_TYPES: &[&str] = &[
    names::SUBSCRIBER,
    names::FLOW_SUBSCRIBER,
    names::SUBSCRIBER_BUILDER,
    names::PROCESSOR,
    names::FLOW_PROCESSOR,
    names::PROCESSOR_BUILDER,
];

/// Return types that carry no outgoing payload
const NON_PRODUCING_RETURN_TYPES: &[&str] = &[
    names::SUBSCRIBER,
    names::FLOW_SUBSCRIBER,
    names::SUBSCRIBER_BUILDER,
];

fn is_one_of(signature: &TypeSignature, candidates: &[&str]) -> bool {
    signature
        .raw_name()
        .is_some_and(|raw| candidates.contains(&raw))
}

/// Enumerates injection points from a type index
pub struct ChannelWalker<'a, I: TypeIndex + ?Sized> {
    index: &'a I,
}

impl<'a, I: TypeIndex + ?Sized> ChannelWalker<'a, I> {
    pub fn new(index: &'a I) -> Self {
        Self { index }
    }

    /// All injection points, in index order: outgoing methods, incoming
    /// methods, then `@Channel` fields and parameters
    pub fn injection_points(&self) -> Vec<InjectionPoint> {
        let mut points = Vec::new();
        self.outgoing_methods(&mut points);
        self.incoming_methods(&mut points);
        self.channel_injections(names::CHANNEL, &mut points);
        self.channel_injections(names::LEGACY_CHANNEL, &mut points);
        debug!("Discovered {} injection point(s)", points.len());
        points
    }

    fn outgoing_methods(&self, points: &mut Vec<InjectionPoint>) {
        for target in self.index.annotations(names::OUTGOING) {
            let AnnotationTarget::Method { class, method } = target else {
                continue;
            };
            let Some(annotation) = method.annotation(names::OUTGOING) else {
                continue;
            };
            let Some(channel) = channel_name(annotation, &target) else {
                continue;
            };
            points.push(InjectionPoint {
                channel,
                direction: ChannelDirection::Outgoing,
                signature: outgoing_signature(method),
                provenance: Provenance::Annotation,
                site: InjectionSite::Method {
                    class: class.name.clone(),
                    method: method.name.clone(),
                },
            });
        }
    }

    fn incoming_methods(&self, points: &mut Vec<InjectionPoint>) {
        let mut targets = self.index.annotations(names::INCOMING);
        targets.extend(self.index.annotations(names::INCOMINGS));
        targets.sort_by(|a, b| a.to_string().cmp(&b.to_string()));

        let mut seen = HashSet::new();
        for target in targets {
            let AnnotationTarget::Method { class, method } = target else {
                continue;
            };
            if !seen.insert(method as *const MethodInfo) {
                continue;
            }

            let repeated = method
                .annotation(names::INCOMINGS)
                .map(|container| container.nested.iter().collect::<Vec<_>>())
                .unwrap_or_default();
            let annotations = method
                .annotations
                .iter()
                .filter(|a| a.name == names::INCOMING)
                .chain(repeated.into_iter().filter(|a| a.name == names::INCOMING));

            for annotation in annotations {
                let Some(channel) = channel_name(annotation, &target) else {
                    continue;
                };
                points.push(InjectionPoint {
                    channel,
                    direction: ChannelDirection::Incoming,
                    signature: incoming_signature(method),
                    provenance: Provenance::Annotation,
                    site: InjectionSite::Method {
                        class: class.name.clone(),
                        method: method.name.clone(),
                    },
                });
            }
        }
    }

    fn channel_injections(&self, annotation_name: &str, points: &mut Vec<InjectionPoint>) {
        for target in self.index.annotations(annotation_name) {
            let (declared, annotation, site) = match target {
                AnnotationTarget::Field { class, field } => (
                    &field.signature,
                    field.annotation(annotation_name),
                    InjectionSite::Field {
                        class: class.name.clone(),
                        field: field.name.clone(),
                    },
                ),
                AnnotationTarget::Parameter {
                    class,
                    method,
                    position,
                } => {
                    let parameter = &method.parameters[position];
                    (
                        &parameter.signature,
                        parameter.annotation(annotation_name),
                        InjectionSite::Parameter {
                            class: class.name.clone(),
                            method: method.name.clone(),
                            position,
                        },
                    )
                }
                _ => continue,
            };
            let Some(annotation) = annotation else {
                continue;
            };
            let Some(channel) = channel_name(annotation, &target) else {
                continue;
            };

            let (direction, signature) = if is_one_of(declared, EMITTER_TYPES) {
                (ChannelDirection::Outgoing, declared.argument(0).cloned())
            } else if is_one_of(declared, CHANNEL_STREAM_TYPES) {
                (ChannelDirection::Incoming, Some(declared.clone()))
            } else {
                trace!("Ignoring {} injected as '{}'", target, declared);
                continue;
            };

            points.push(InjectionPoint {
                channel,
                direction,
                signature,
                provenance: Provenance::Channel,
                site,
            });
        }
    }
}

fn channel_name(annotation: &AnnotationInstance, target: &AnnotationTarget<'_>) -> Option<String> {
    match annotation.value.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Some(name.to_string()),
        _ => {
            warn!(
                "Skipping @{} on {}: channel name is empty",
                names::simple_name(&annotation.name),
                target
            );
            None
        }
    }
}

fn outgoing_signature(method: &MethodInfo) -> Option<TypeSignature> {
    let returned = &method.return_type;
    if *returned == TypeSignature::Void || is_one_of(returned, NON_PRODUCING_RETURN_TYPES) {
        return None;
    }
    Some(returned.clone())
}

fn incoming_signature(method: &MethodInfo) -> Option<TypeSignature> {
    let payloads: Vec<&TypeSignature> = method
        .parameters
        .iter()
        .map(|p| &p.signature)
        .filter(|s| !is_one_of(s, CONTEXT_PARAMETER_TYPES))
        .collect();

    match payloads.as_slice() {
        [payload] => Some((*payload).clone()),
        [] if is_one_of(&method.return_type, CONSUMING_RETURN_TYPES) => {
            Some(method.return_type.clone())
        }
        _ => None,
    }
}

/// Decides whether channels route through the Kafka connector
pub struct ConnectorRouter<'a> {
    config: &'a DiscoveryConfig,
    source: &'a dyn ConfigSource,
    incoming: HashSet<String>,
    outgoing: HashSet<String>,
}

impl<'a> ConnectorRouter<'a> {
    pub fn new(
        config: &'a DiscoveryConfig,
        source: &'a dyn ConfigSource,
        points: &[InjectionPoint],
    ) -> Self {
        let mut incoming = HashSet::new();
        let mut outgoing = HashSet::new();
        for point in points {
            match point.direction {
                ChannelDirection::Incoming => incoming.insert(point.channel.clone()),
                ChannelDirection::Outgoing => outgoing.insert(point.channel.clone()),
            };
        }
        Self {
            config,
            source,
            incoming,
            outgoing,
        }
    }

    /// A channel is an orphan when the application does not also serve the
    /// opposite end of it
    pub fn is_orphan(&self, direction: ChannelDirection, channel: &str) -> bool {
        let served = match direction.opposite() {
            ChannelDirection::Incoming => &self.incoming,
            ChannelDirection::Outgoing => &self.outgoing,
        };
        !served.contains(channel)
    }

    /// Connector serving the channel, if any
    ///
    /// An explicit `mp.messaging.<direction>.<channel>.connector` wins. Without
    /// one, orphan channels attach to the sole connector available for their
    /// direction.
    pub fn connector(&self, direction: ChannelDirection, channel: &str) -> Option<String> {
        let key = format!(
            "mp.messaging.{}.{}.connector",
            direction.config_segment(),
            channel
        );
        if let Some(connector) = self.source.value(&key) {
            return Some(connector.trim().to_string());
        }

        if !self.config.auto_connector_attachment || !self.is_orphan(direction, channel) {
            return None;
        }
        match self.config.connectors(direction) {
            [sole] => Some(sole.clone()),
            _ => None,
        }
    }

    pub fn routes_to_kafka(&self, direction: ChannelDirection, channel: &str) -> bool {
        self.connector(direction, channel).as_deref() == Some(names::KAFKA_CONNECTOR)
    }
}
