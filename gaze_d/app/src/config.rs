use common::TrackerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PerceptionMode {
    #[default]
    #[serde(alias = "udp")]
    Udp,
    #[serde(alias = "simulated", alias = "sim")]
    Simulated,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerceptionConfig {
    pub mode: PerceptionMode,
    pub listen_address: String,
    pub listen_port: u16,
    /// After this long without a datagram the face is reported as lost.
    pub stale_ms: u64,
    /// Frame rate the simulated source pretends to run at.
    pub simulated_fps: f32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            mode: PerceptionMode::default(),
            listen_address: "127.0.0.1".to_string(),
            listen_port: 9200,
            stale_ms: 500,
            simulated_fps: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    #[serde(alias = "generic", alias = "udp")]
    Generic,
    #[serde(alias = "log")]
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub mode: OutputMode,
    pub send_address: String,
    pub send_port: u16,
    /// How long a click indicator stays up; repeat clicks inside it are folded together.
    pub click_hold_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::default(),
            send_address: "127.0.0.1".to_string(),
            send_port: 9000,
            click_hold_ms: 150,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DaemonConfig {
    pub tracker: TrackerConfig,
    pub perception: PerceptionConfig,
    pub output: OutputConfig,
    pub control_port: u16,
    pub update_hz: f32,
    pub display_hz: f32,
    pub calibration_file: String,
    pub autosave_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            perception: PerceptionConfig::default(),
            output: OutputConfig::default(),
            control_port: 9100,
            update_hz: 30.0,
            display_hz: 60.0,
            calibration_file: "calibration_default.json".to_string(),
            autosave_secs: 30,
        }
    }
}

impl DaemonConfig {
    pub fn update_period_s(&self) -> f64 {
        period_s(self.update_hz, 30.0)
    }

    pub fn display_period_s(&self) -> f64 {
        period_s(self.display_hz, 60.0)
    }
}

fn period_s(hz: f32, fallback: f32) -> f64 {
    let hz = if hz.is_finite() && hz > 0.0 { hz } else { fallback };
    1.0 / hz as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: DaemonConfig = serde_json::from_str(
            r#"{ "perception": { "mode": "sim" }, "output": { "mode": "log" }, "update_hz": 15 }"#,
        )
        .unwrap();
        assert_eq!(config.perception.mode, PerceptionMode::Simulated);
        assert_eq!(config.perception.listen_port, 9200);
        assert_eq!(config.output.mode, OutputMode::Log);
        assert_eq!(config.control_port, 9100);
        assert_eq!(config.tracker, TrackerConfig::default());
        assert!((config.update_period_s() - 1.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn nonsense_rates_fall_back() {
        let config = DaemonConfig {
            display_hz: 0.0,
            update_hz: f32::NAN,
            ..Default::default()
        };
        assert!((config.display_period_s() - 1.0 / 60.0).abs() < 1e-9);
        assert!((config.update_period_s() - 1.0 / 30.0).abs() < 1e-9);
    }
}
