use serde::{Deserialize, Serialize};

/// Port snapshot returned by the host on every `get_ports` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortStatus {
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub connected: Option<String>,
    #[serde(default)]
    pub status_text: Option<String>,
}

impl PortStatus {
    /// The connected port, treating an empty name as "not connected".
    pub fn connected_port(&self) -> Option<&str> {
        self.connected.as_deref().filter(|p| !p.is_empty())
    }

    /// The status message, treating an empty string as absent.
    pub fn message(&self) -> Option<&str> {
        self.status_text.as_deref().filter(|s| !s.is_empty())
    }
}

/// System stats sample. Every field is independently optional; an absent
/// field leaves the corresponding display untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_down_kb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_percent: Option<f64>,
}

impl StatsSnapshot {
    /// Payload text the host sends before its first sample.
    pub const EMPTY_PAYLOAD: &'static str = "{}";

    /// True when the raw payload carries no data yet.
    pub fn is_empty_payload(raw: &str) -> bool {
        let trimmed = raw.trim();
        trimmed.is_empty() || trimmed == Self::EMPTY_PAYLOAD
    }

    /// Only a JSON object is a sample. Arrays and scalars are rejected so that
    /// positional values never land in named fields.
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            return Err(<serde_json::Error as serde::de::Error>::custom(
                "stats payload is not a JSON object",
            ));
        }
        serde_json::from_value(value)
    }
}

/// Arguments of `toggle_connection`. Field names follow the host's wire
/// contract (`portName`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub port_name: String,
    pub connect: bool,
}

impl ToggleRequest {
    pub fn connect(port: impl Into<String>) -> Self {
        Self {
            port_name: port.into(),
            connect: true,
        }
    }

    pub fn disconnect() -> Self {
        Self {
            port_name: String::new(),
            connect: false,
        }
    }
}

/// Arguments of `set_autostart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutostartRequest {
    pub enable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_status_tolerates_missing_and_null_fields() -> anyhow::Result<()> {
        let status: PortStatus = serde_json::from_str(r#"{"ports":["COM3"],"connected":null}"#)?;
        assert_eq!(status.ports, vec!["COM3".to_string()]);
        assert_eq!(status.connected_port(), None);
        assert_eq!(status.message(), None);

        let status: PortStatus =
            serde_json::from_str(r#"{"ports":[],"connected":"","status_text":""}"#)?;
        assert_eq!(status.connected_port(), None);
        assert_eq!(status.message(), None);
        Ok(())
    }

    #[test]
    fn stats_accepts_integer_fields_from_host() -> anyhow::Result<()> {
        let stats = StatsSnapshot::parse(
            r#"{"cpu_percent":12.5,"net_down_kb":2048,"mem_percent":40.2,"disk_percent":71}"#,
        )?;
        assert_eq!(stats.net_down_kb, Some(2048.0));
        assert_eq!(stats.disk_percent, Some(71.0));

        let partial = StatsSnapshot::parse(r#"{"cpu_percent":3.0}"#)?;
        assert_eq!(partial.mem_percent, None);
        Ok(())
    }

    #[test]
    fn stats_rejects_non_object_payloads() {
        assert!(StatsSnapshot::parse("[50, 1, 2, 3]").is_err());
        assert!(StatsSnapshot::parse("42").is_err());
        assert!(StatsSnapshot::parse(r#""cpu""#).is_err());
        assert!(StatsSnapshot::parse("null").is_err());
    }

    #[test]
    fn empty_payload_detection() {
        assert!(StatsSnapshot::is_empty_payload(""));
        assert!(StatsSnapshot::is_empty_payload("{}"));
        assert!(StatsSnapshot::is_empty_payload(" {} \n"));
        assert!(!StatsSnapshot::is_empty_payload(r#"{"cpu_percent":1}"#));
    }

    #[test]
    fn toggle_request_uses_camel_case_port_name() -> anyhow::Result<()> {
        let json = serde_json::to_value(ToggleRequest::connect("COM3"))?;
        assert_eq!(json["portName"], "COM3");
        assert_eq!(json["connect"], true);
        Ok(())
    }
}
