//! Configuration default emission
//!
//! Turns serde assignments into `mp.messaging.*` defaults that never
//! override what the user configured.

use crate::config::ConfigSource;
use crate::names;
use crate::types::{
    channel_serde_key, connector_serde_key, ChannelDirection, ConfigDefault, SerdeAssignment,
    Slot,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Collects defaults for one discovery run
///
/// The first assignment for a (channel, direction, slot) triple wins; later
/// ones are ignored whether or not the first was emitted.
pub struct DefaultEmitter<'a> {
    source: &'a dyn ConfigSource,
    decided: HashSet<String>,
    defaults: Vec<ConfigDefault>,
}

impl<'a> DefaultEmitter<'a> {
    pub fn new(source: &'a dyn ConfigSource) -> Self {
        Self {
            source,
            decided: HashSet::new(),
            defaults: Vec::new(),
        }
    }

    /// Whether the user configured this slot, per channel or connector-wide
    pub fn is_explicit(&self, direction: ChannelDirection, channel: &str, slot: Slot) -> bool {
        self.source
            .is_set(&channel_serde_key(direction, channel, slot))
            || self
                .source
                .is_set(&connector_serde_key(names::KAFKA_CONNECTOR, direction, slot))
    }

    /// Offer an assignment; returns whether a default was emitted
    ///
    /// With `specific_avro_reader`, an incoming assignment also emits the
    /// Apicurio specific reader flag unless the user set it.
    pub fn offer(&mut self, assignment: &SerdeAssignment, specific_avro_reader: bool) -> bool {
        let key = assignment.config_key();
        if !self.decided.insert(key.clone()) {
            return false;
        }

        if self.is_explicit(assignment.direction, &assignment.channel, assignment.slot) {
            debug!("Keeping user configuration for '{}'", key);
            return false;
        }

        debug!("Default {}={}", key, assignment.serde_class);
        self.defaults
            .push(ConfigDefault::new(key, assignment.serde_class.clone()));

        if specific_avro_reader && assignment.direction == ChannelDirection::Incoming {
            self.offer_avro_reader_flag(&assignment.channel);
        }
        true
    }

    fn offer_avro_reader_flag(&mut self, channel: &str) {
        let key = format!(
            "mp.messaging.incoming.{}.{}",
            channel,
            names::SPECIFIC_AVRO_READER_PROPERTY
        );
        let connector_key = format!(
            "mp.messaging.connector.{}.{}",
            names::KAFKA_CONNECTOR,
            names::SPECIFIC_AVRO_READER_PROPERTY
        );
        if self.source.is_set(&key) || self.source.is_set(&connector_key) {
            return;
        }
        if self.decided.insert(key.clone()) {
            self.defaults.push(ConfigDefault::new(key, "true"));
        }
    }

    pub fn defaults(&self) -> &[ConfigDefault] {
        &self.defaults
    }

    pub fn into_defaults(self) -> Vec<ConfigDefault> {
        self.defaults
    }
}

/// Effective serde configuration after defaults are applied
///
/// Channel-scoped user values first, then connector-scoped ones, then
/// generated defaults.
pub struct EffectiveConfig<'a> {
    source: &'a dyn ConfigSource,
    defaults: HashMap<&'a str, &'a str>,
}

impl<'a> EffectiveConfig<'a> {
    pub fn new(source: &'a dyn ConfigSource, defaults: &'a [ConfigDefault]) -> Self {
        Self {
            source,
            defaults: defaults
                .iter()
                .map(|d| (d.key.as_str(), d.value.as_str()))
                .collect(),
        }
    }

    pub fn serde_class(&self, direction: ChannelDirection, channel: &str, slot: Slot) -> Option<String> {
        let key = channel_serde_key(direction, channel, slot);
        self.source
            .value(&key)
            .or_else(|| {
                self.source
                    .value(&connector_serde_key(names::KAFKA_CONNECTOR, direction, slot))
            })
            .or_else(|| self.defaults.get(key.as_str()).map(|v| v.to_string()))
            .map(|v| v.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Properties;

    fn assignment(channel: &str, direction: ChannelDirection, slot: Slot, class: &str) -> SerdeAssignment {
        SerdeAssignment {
            channel: channel.to_string(),
            direction,
            slot,
            serde_class: class.to_string(),
        }
    }

    #[test]
    fn test_emits_channel_default() {
        let props = Properties::new();
        let mut emitter = DefaultEmitter::new(&props);
        assert!(emitter.offer(
            &assignment("in", ChannelDirection::Incoming, Slot::Value, "com.acme.D"),
            false
        ));
        assert_eq!(
            emitter.defaults(),
            &[ConfigDefault::new(
                "mp.messaging.incoming.in.value.deserializer",
                "com.acme.D"
            )]
        );
    }

    #[test]
    fn test_first_assignment_wins() {
        let props = Properties::new();
        let mut emitter = DefaultEmitter::new(&props);
        assert!(emitter.offer(
            &assignment("out", ChannelDirection::Outgoing, Slot::Value, "first"),
            false
        ));
        assert!(!emitter.offer(
            &assignment("out", ChannelDirection::Outgoing, Slot::Value, "second"),
            false
        ));
        assert!(emitter.offer(
            &assignment("out", ChannelDirection::Outgoing, Slot::Key, "key"),
            false
        ));
        assert_eq!(emitter.defaults().len(), 2);
        assert_eq!(emitter.defaults()[0].value, "first");
    }

    #[test]
    fn test_explicit_values_suppress_defaults() {
        let props = Properties::new()
            .with("mp.messaging.incoming.in.value.deserializer", "com.acme.Mine")
            .with("mp.messaging.connector.smallrye-kafka.key.serializer", "com.acme.Keys")
            .with("mp.messaging.incoming.blank.value.deserializer", "");
        let mut emitter = DefaultEmitter::new(&props);

        assert!(!emitter.offer(
            &assignment("in", ChannelDirection::Incoming, Slot::Value, "x"),
            true
        ));
        assert!(!emitter.offer(
            &assignment("any", ChannelDirection::Outgoing, Slot::Key, "x"),
            false
        ));
        assert!(emitter.offer(
            &assignment("blank", ChannelDirection::Incoming, Slot::Value, "x"),
            false
        ));
        // Suppressed serde means no companion flag either
        assert_eq!(emitter.defaults().len(), 1);
    }

    #[test]
    fn test_specific_avro_reader_flag() {
        let props = Properties::new()
            .with("mp.messaging.incoming.preset.apicurio.registry.use-specific-avro-reader", "false");
        let mut emitter = DefaultEmitter::new(&props);
        emitter.offer(
            &assignment("in", ChannelDirection::Incoming, Slot::Value, names::APICURIO_AVRO_DESERIALIZER),
            true,
        );
        emitter.offer(
            &assignment("preset", ChannelDirection::Incoming, Slot::Value, names::APICURIO_AVRO_DESERIALIZER),
            true,
        );
        emitter.offer(
            &assignment("out", ChannelDirection::Outgoing, Slot::Value, names::APICURIO_AVRO_SERIALIZER),
            true,
        );

        let keys: Vec<String> = emitter.into_defaults().into_iter().map(|d| d.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "mp.messaging.incoming.in.value.deserializer=io.apicurio.registry.serde.avro.AvroKafkaDeserializer",
                "mp.messaging.incoming.in.apicurio.registry.use-specific-avro-reader=true",
                "mp.messaging.incoming.preset.value.deserializer=io.apicurio.registry.serde.avro.AvroKafkaDeserializer",
                "mp.messaging.outgoing.out.value.serializer=io.apicurio.registry.serde.avro.AvroKafkaSerializer",
            ]
        );
    }

    #[test]
    fn test_effective_precedence() {
        let props = Properties::new()
            .with("mp.messaging.incoming.a.value.deserializer", "channel")
            .with("mp.messaging.connector.smallrye-kafka.value.deserializer", "connector");
        let defaults = vec![
            ConfigDefault::new("mp.messaging.incoming.a.value.deserializer", "default-a"),
            ConfigDefault::new("mp.messaging.outgoing.c.value.serializer", "default-c"),
        ];
        let effective = EffectiveConfig::new(&props, &defaults);

        assert_eq!(
            effective.serde_class(ChannelDirection::Incoming, "a", Slot::Value).as_deref(),
            Some("channel")
        );
        assert_eq!(
            effective.serde_class(ChannelDirection::Incoming, "b", Slot::Value).as_deref(),
            Some("connector")
        );
        assert_eq!(
            effective.serde_class(ChannelDirection::Outgoing, "c", Slot::Value).as_deref(),
            Some("default-c")
        );
        assert_eq!(
            effective.serde_class(ChannelDirection::Outgoing, "c", Slot::Key),
            None
        );
    }
}
