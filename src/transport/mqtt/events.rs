//! Pure routing of rumqttc events into connection-state decisions

use rumqttc::v5::mqttbytes::v5::{ConnectReturnCode, Packet};
use rumqttc::v5::Event;

/// Routing decisions for MQTT events
#[derive(Debug, Clone, PartialEq)]
pub enum EventRoute {
    /// ConnAck with a success code
    ConnectionAcknowledged,
    /// ConnAck carrying a refusal code
    ConnectionRefused(String),
    /// Broker confirmed a QoS 1 publish
    PublishAcknowledged { packet_id: u16 },
    /// Broker sent DISCONNECT
    BrokerDisconnected(String),
    /// Infrastructure event (PingResp, etc.)
    InfrastructureEvent(String),
    /// Outgoing event (handled by rumqttc)
    OutgoingEvent(String),
}

pub struct EventRouter;

impl EventRouter {
    pub fn route_mqtt_event(event: &Event) -> EventRoute {
        match event {
            Event::Incoming(incoming) => match incoming {
                Packet::ConnAck(connack) => {
                    if connack.code == ConnectReturnCode::Success {
                        EventRoute::ConnectionAcknowledged
                    } else {
                        EventRoute::ConnectionRefused(format!("{:?}", connack.code))
                    }
                }
                Packet::PubAck(puback) => EventRoute::PublishAcknowledged {
                    packet_id: puback.pkid,
                },
                Packet::Disconnect(disconnect) => {
                    EventRoute::BrokerDisconnected(format!("{:?}", disconnect.reason_code))
                }
                other => EventRoute::InfrastructureEvent(format!("{other:?}")),
            },
            Event::Outgoing(outgoing) => EventRoute::OutgoingEvent(format!("{outgoing:?}")),
        }
    }
}
