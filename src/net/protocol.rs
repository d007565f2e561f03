//! Hub protocol message definitions
//! These are the wire types for client-hub communication

use std::collections::HashMap;
use std::time::Duration;

use glam::Vec3;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Send interval used when the handshake does not carry one
pub const DEFAULT_INTERVAL_MS: u64 = 100;

/// Plain `{x, y, z}` vector as carried on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WireVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for WireVec3 {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<WireVec3> for Vec3 {
    fn from(v: WireVec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Transient shot/impact event embedded in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotEvent {
    pub origin: WireVec3,
    pub direction: WireVec3,
    /// Opaque tag; the hub relays it untouched
    #[serde(rename = "color")]
    pub tag: f64,
}

/// One player's state in a roster tick or an outbound update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    #[serde(rename = "playerID")]
    pub player_id: String,
    pub player_name: String,
    /// Eye point (capsule top)
    pub position: WireVec3,
    pub velocity: WireVec3,
    pub orientation: WireVec3,
    pub direction: WireVec3,
    #[serde(rename = "shots", default)]
    pub events: Vec<ShotEvent>,
}

/// Roster tick payload keyed by player id
pub type RosterState = HashMap<String, StateSnapshot>;

/// Handshake assigning this client its identity
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connected {
    #[serde(rename = "connected")]
    pub player_id: String,
    #[serde(default)]
    pub is_lead: bool,
    /// Send interval in milliseconds; any JSON number
    #[serde(default)]
    pub interval: Option<f64>,
}

impl Connected {
    /// Send interval, falling back to the default for missing, non-finite or non-positive values
    pub fn send_interval(&self) -> Duration {
        match self.interval {
            Some(ms) if ms.is_finite() && ms > 0.0 => Duration::from_secs_f64(ms / 1000.0),
            _ => Duration::from_millis(DEFAULT_INTERVAL_MS),
        }
    }
}

/// World selection broadcast by the lead client
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Started {
    #[serde(default)]
    pub world: Option<String>,
    #[serde(default)]
    pub screen_dimensions: Option<WireVec3>,
    #[serde(default)]
    pub screen_pos: Option<WireVec3>,
}

/// Messages received from the hub, classified before any field access
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMsg {
    /// Join handshake
    Connected(Connected),
    /// Roster tick with every player's latest state
    State(RosterState),
    /// Request to clear transient world effects
    ClearWorld,
    /// HUD content (not handled by the simulation)
    ScreenData(String),
    /// Game start with the selected world
    Started(Started),
    /// Anything else, including unparsable payloads
    Unrecognized { reason: String },
}

impl InboundMsg {
    /// Classify a text payload
    pub fn classify(text: &str) -> Self {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => return Self::unrecognized(format!("invalid json: {e}")),
        };
        let Value::Object(fields) = value else {
            return Self::unrecognized("payload is not an object");
        };
        Self::classify_fields(fields)
    }

    fn classify_fields(mut fields: Map<String, Value>) -> Self {
        if fields.contains_key("connected") {
            return match serde_json::from_value::<Connected>(Value::Object(fields)) {
                Ok(connected) => Self::Connected(connected),
                Err(e) => Self::unrecognized(format!("bad handshake: {e}")),
            };
        }

        if let Some(state) = fields.remove("state") {
            return match serde_json::from_value::<RosterState>(state) {
                Ok(state) => Self::State(state),
                Err(e) => Self::unrecognized(format!("bad roster state: {e}")),
            };
        }

        if let Some(screen) = fields.remove("screenData") {
            return match screen {
                Value::String(html) => Self::ScreenData(html),
                other => Self::ScreenData(other.to_string()),
            };
        }

        if fields.get("clearWorld").and_then(Value::as_bool) == Some(true) {
            return Self::ClearWorld;
        }

        if fields.get("started").and_then(Value::as_bool) == Some(true) {
            return match serde_json::from_value::<Started>(Value::Object(fields)) {
                Ok(started) => Self::Started(started),
                Err(e) => Self::unrecognized(format!("bad start message: {e}")),
            };
        }

        Self::unrecognized("no known message key")
    }

    fn unrecognized(reason: impl Into<String>) -> Self {
        Self::Unrecognized {
            reason: reason.into(),
        }
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::State(_) => "state",
            Self::ClearWorld => "clear_world",
            Self::ScreenData(_) => "screen_data",
            Self::Started(_) => "started",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }
}

/// Game start request; only the lead player may send it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub world: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_dimensions: Option<WireVec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_pos: Option<WireVec3>,
}

impl StartRequest {
    pub fn new(world: impl Into<String>) -> Self {
        Self {
            world: world.into(),
            screen_dimensions: None,
            screen_pos: None,
        }
    }

    /// Attach a shared screen of `width` x `height`; its center sits at half height
    pub fn with_screen(mut self, width: f32, height: f32, x: f32, z: f32) -> Self {
        self.screen_dimensions = Some(WireVec3 {
            x: width,
            y: height,
            z: 0.0,
        });
        self.screen_pos = Some(WireVec3 {
            x,
            y: height / 2.0,
            z,
        });
        self
    }
}

/// Messages sent to the hub, each a single-key object
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMsg {
    /// Periodic local player update
    Player(StateSnapshot),
    /// Ask every client to clear transient effects (lead only)
    ClearWorld,
    /// Start the game in the selected world (lead only)
    Start(StartRequest),
}

impl Serialize for OutboundMsg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Player(snapshot) => map.serialize_entry("player", snapshot)?,
            Self::ClearWorld => map.serialize_entry("clearWorld", &true)?,
            Self::Start(request) => map.serialize_entry("start", request)?,
        }
        map.end()
    }
}

impl OutboundMsg {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Player(_) => "player",
            Self::ClearWorld => "clear_world",
            Self::Start(_) => "start",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> StateSnapshot {
        StateSnapshot {
            player_id: "p1".to_string(),
            player_name: "ada".to_string(),
            position: WireVec3 { x: 1.0, y: 2.0, z: 3.0 },
            velocity: WireVec3::default(),
            orientation: WireVec3 { x: 0.0, y: 1.5, z: 0.0 },
            direction: WireVec3 { x: 0.0, y: 0.0, z: -1.0 },
            events: vec![ShotEvent {
                origin: WireVec3::default(),
                direction: WireVec3 { x: 1.0, y: 0.0, z: 0.0 },
                tag: 255.0,
            }],
        }
    }

    #[test]
    fn test_outbound_uses_hub_field_names() {
        let json = OutboundMsg::Player(sample_snapshot()).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        let player = &value["player"];
        assert_eq!(player["playerID"], "p1");
        assert_eq!(player["playerName"], "ada");
        assert_eq!(player["position"]["y"], 2.0);
        assert_eq!(player["shots"][0]["color"], 255.0);
        assert!(player.get("events").is_none());
    }

    #[test]
    fn test_control_messages_use_hub_shapes() {
        assert_eq!(OutboundMsg::ClearWorld.to_json().unwrap(), r#"{"clearWorld":true}"#);

        let json = OutboundMsg::Start(StartRequest::new("space")).to_json().unwrap();
        assert_eq!(json, r#"{"start":{"world":"space"}}"#);

        let json = OutboundMsg::Start(StartRequest::new("space").with_screen(20.0, 10.0, 30.0, 0.0))
            .to_json()
            .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["start"]["screenDimensions"]["x"], 20.0);
        assert_eq!(value["start"]["screenPos"]["y"], 5.0);
        assert_eq!(value["start"]["screenPos"]["x"], 30.0);
    }

    #[test]
    fn test_classify_handshake() {
        let msg = InboundMsg::classify(r#"{"connected":"abc","isLead":true,"interval":50}"#);
        let InboundMsg::Connected(connected) = msg else {
            panic!("expected handshake");
        };
        assert_eq!(connected.player_id, "abc");
        assert!(connected.is_lead);
        assert_eq!(connected.send_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_classify_handshake_with_fractional_interval() {
        let msg = InboundMsg::classify(r#"{"connected":"p1","isLead":false,"interval":100.0}"#);
        let InboundMsg::Connected(connected) = msg else {
            panic!("expected handshake");
        };
        assert_eq!(connected.send_interval(), Duration::from_millis(100));

        let msg = InboundMsg::classify(r#"{"connected":"p1","interval":33.5}"#);
        let InboundMsg::Connected(connected) = msg else {
            panic!("expected handshake");
        };
        let interval = connected.send_interval().as_secs_f64();
        assert!((interval - 0.0335).abs() < 1e-6, "interval {interval}");
    }

    #[test]
    fn test_non_positive_interval_uses_default() {
        for text in [
            r#"{"connected":"p1","interval":0}"#,
            r#"{"connected":"p1","interval":-20}"#,
        ] {
            let InboundMsg::Connected(connected) = InboundMsg::classify(text) else {
                panic!("expected handshake");
            };
            assert_eq!(connected.send_interval(), Duration::from_millis(DEFAULT_INTERVAL_MS));
        }
    }

    #[test]
    fn test_handshake_without_interval_uses_default() {
        let msg = InboundMsg::classify(r#"{"connected":"abc"}"#);
        let InboundMsg::Connected(connected) = msg else {
            panic!("expected handshake");
        };
        assert!(!connected.is_lead);
        assert_eq!(connected.send_interval(), Duration::from_millis(DEFAULT_INTERVAL_MS));
    }

    #[test]
    fn test_classify_roster_state() {
        let text = r#"{"state":{"p2":{
            "playerID":"p2","playerName":"bob",
            "position":{"x":1,"y":2,"z":3},
            "velocity":{"x":0,"y":0,"z":0},
            "orientation":{"x":0,"y":0.5,"z":0},
            "direction":{"x":0,"y":0,"z":-1},
            "shots":[{"origin":{"x":0,"y":1,"z":0},"direction":{"x":1,"y":0,"z":0},"color":1234567.25}]
        }}}"#;
        let InboundMsg::State(state) = InboundMsg::classify(text) else {
            panic!("expected roster state");
        };
        let p2 = &state["p2"];
        assert_eq!(p2.player_name, "bob");
        assert_eq!(Vec3::from(p2.position), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p2.events.len(), 1);
        assert_eq!(p2.events[0].tag, 1234567.25);
    }

    #[test]
    fn test_roster_entry_without_shots() {
        let text = r#"{"state":{"p2":{
            "playerID":"p2","playerName":"bob",
            "position":{"x":0,"y":0,"z":0},"velocity":{"x":0,"y":0,"z":0},
            "orientation":{"x":0,"y":0,"z":0},"direction":{"x":0,"y":0,"z":0}
        }}}"#;
        let InboundMsg::State(state) = InboundMsg::classify(text) else {
            panic!("expected roster state");
        };
        assert!(state["p2"].events.is_empty());
    }

    #[test]
    fn test_classify_out_of_core_messages() {
        assert_eq!(InboundMsg::classify(r#"{"clearWorld":true}"#), InboundMsg::ClearWorld);
        assert_eq!(
            InboundMsg::classify(r#"{"screenData":"<p>hi</p>"}"#),
            InboundMsg::ScreenData("<p>hi</p>".to_string())
        );

        let msg = InboundMsg::classify(r#"{"started":true,"world":"space"}"#);
        let InboundMsg::Started(started) = msg else {
            panic!("expected start message");
        };
        assert_eq!(started.world.as_deref(), Some("space"));
    }

    #[test]
    fn test_classify_malformed_payloads() {
        for text in [
            "not json",
            "[1,2,3]",
            "\"connected\"",
            r#"{"hello":"world"}"#,
            r#"{"clearWorld":false}"#,
            r#"{"connected":42}"#,
            r#"{"state":{"p2":{"playerID":"p2"}}}"#,
        ] {
            let msg = InboundMsg::classify(text);
            assert!(
                matches!(msg, InboundMsg::Unrecognized { .. }),
                "{text} classified as {}",
                msg.kind()
            );
        }
    }
}
