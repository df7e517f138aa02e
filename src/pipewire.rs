//! `PipeWire` session source
//!
//! Production [`SessionSource`]: queries the graph once per call via
//! `pw-dump` and derives the raw audio sessions registered against the
//! default playback sink.
//!
//! The default sink is taken from the `default.audio.sink` entry of the
//! `default` metadata object. If `pw-dump` is missing, fails, or no default
//! sink is configured, the snapshot is `NoDevice` - a normal outcome for a
//! machine without a playback device, never an error.

use color_eyre::eyre::{self, Context, Result};
use serde::Deserialize;
use std::process::Command;
use tracing::{debug, trace};

use crate::sessions::{RawSession, SessionSnapshot, SessionSource, SessionState};

/// Media class of sound-producing client streams.
const OUTPUT_STREAM_CLASS: &str = "Stream/Output/Audio";

// ============================================================================
// PipeWire JSON Structures (from pw-dump)
// ============================================================================

/// Top-level `PipeWire` object from `pw-dump` output
#[derive(Debug, Deserialize)]
pub struct PwObject {
    #[serde(rename = "type")]
    pub obj_type: String,
    #[serde(default)]
    pub info: Option<PwInfo>,
    #[serde(default)]
    pub props: Option<PwProps>,
    #[serde(default)]
    pub metadata: Option<Vec<PwMetadataEntry>>,
}

impl PwObject {
    /// Get props from either info.props or top-level props (metadata objects use top-level)
    #[must_use]
    pub fn get_props(&self) -> Option<&PwProps> {
        self.info
            .as_ref()
            .and_then(|i| i.props.as_ref())
            .or(self.props.as_ref())
    }
}

#[derive(Debug, Deserialize)]
pub struct PwInfo {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub props: Option<PwProps>,
    #[serde(default)]
    pub params: Option<PwParams>,
}

/// `PipeWire` object properties - uses permissive deserialization
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PwProps {
    #[serde(rename = "media.class")]
    pub media_class: Option<String>,
    #[serde(rename = "application.process.id")]
    pub process_id: Option<u32>,
    #[serde(rename = "metadata.name")]
    pub metadata_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PwParams {
    #[serde(rename = "Props")]
    pub props: Option<Vec<PwNodeProps>>,
}

/// One `Props` param object. pw-dump emits several per node; only some
/// carry the mute flag and channel volumes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PwNodeProps {
    pub mute: Option<bool>,
    #[serde(rename = "channelVolumes")]
    pub channel_volumes: Option<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct PwMetadataEntry {
    pub key: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

impl PwMetadataEntry {
    /// Extract sink name from metadata value (handles multiple formats)
    pub fn get_name(&self) -> Option<String> {
        let value = self.value.as_ref()?;
        // Try object with "name" field first
        if let Some(name_val) = value.as_object().and_then(|obj| obj.get("name")) {
            return name_val.as_str().map(String::from);
        }
        // Fall back to plain string
        value.as_str().map(String::from)
    }
}

// ============================================================================
// Session Source
// ============================================================================

/// `SessionSource` backed by `pw-dump`.
pub struct PipeWireSource;

impl PipeWireSource {
    /// Get all `PipeWire` objects via `pw-dump`
    ///
    /// # Errors
    /// Returns an error if `pw-dump` fails to execute or returns invalid JSON.
    pub fn dump() -> Result<Vec<PwObject>> {
        let output = Command::new("pw-dump")
            .output()
            .context("PipeWire tool 'pw-dump' not found or failed. Is PipeWire installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            eyre::bail!("pw-dump failed: {}", stderr.trim());
        }

        let objects: Vec<PwObject> =
            serde_json::from_slice(&output.stdout).context("Failed to parse pw-dump JSON")?;

        trace!("pw-dump returned {} objects", objects.len());
        Ok(objects)
    }

    /// Extract the default playback sink name from metadata objects
    #[must_use]
    pub fn default_sink_name(objects: &[PwObject]) -> Option<String> {
        for obj in objects {
            if obj.obj_type != "PipeWire:Interface:Metadata" {
                continue;
            }

            let Some(props) = obj.get_props() else {
                continue;
            };
            if props.metadata_name.as_deref() != Some("default") {
                continue;
            }

            if let Some(metadata) = &obj.metadata {
                for entry in metadata {
                    if entry.key == "default.audio.sink" {
                        return entry.get_name();
                    }
                }
            }
        }
        None
    }

    /// Collect every output-stream node as a raw session
    #[must_use]
    pub fn output_streams(objects: &[PwObject]) -> Vec<RawSession> {
        objects
            .iter()
            .filter(|obj| obj.obj_type == "PipeWire:Interface:Node")
            .filter_map(|obj| {
                let props = obj.get_props()?;
                if props.media_class.as_deref() != Some(OUTPUT_STREAM_CLASS) {
                    return None;
                }
                Some(Self::stream_to_session(obj, props))
            })
            .collect()
    }

    fn stream_to_session(obj: &PwObject, props: &PwProps) -> RawSession {
        // Missing application.process.id means the stream is not attributable
        // to a user process (system-owned sound).
        let pid = props.process_id.unwrap_or(0);

        let state = match obj.info.as_ref().and_then(|i| i.state.as_deref()) {
            Some("running") => SessionState::Active,
            Some("idle" | "suspended" | "creating") => SessionState::Inactive,
            _ => SessionState::Expired,
        };

        let node_props = obj
            .info
            .as_ref()
            .and_then(|i| i.params.as_ref())
            .and_then(|p| p.props.as_ref());

        let muted = node_props
            .and_then(|entries| entries.iter().find_map(|p| p.mute))
            .unwrap_or(false);

        // pw-dump exposes no peak meter. The max channel volume of a running
        // stream stands in for the instantaneous level; silent states report 0.
        let peak = if state == SessionState::Active {
            node_props
                .and_then(|entries| entries.iter().find_map(|p| p.channel_volumes.as_ref()))
                .map(|vols| vols.iter().copied().fold(0.0f32, f32::max))
                .unwrap_or(0.0)
        } else {
            0.0
        };

        RawSession {
            pid,
            muted,
            peak,
            state,
        }
    }

    /// Build a snapshot from already-dumped objects. Split out for tests.
    #[must_use]
    pub fn snapshot_from_objects(objects: &[PwObject]) -> SessionSnapshot {
        if Self::default_sink_name(objects).is_none() {
            debug!("no default.audio.sink in PipeWire metadata");
            return SessionSnapshot::NoDevice;
        }
        SessionSnapshot::Sessions(Self::output_streams(objects))
    }
}

impl SessionSource for PipeWireSource {
    fn open_default_sessions(&self) -> SessionSnapshot {
        // Any platform failure degrades to "no device observed"; a later
        // query will simply re-observe current state. No retries.
        match Self::dump() {
            Ok(objects) => Self::snapshot_from_objects(&objects),
            Err(e) => {
                debug!("pw-dump query failed: {e:#}");
                SessionSnapshot::NoDevice
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DEFAULT_METADATA_JSON: &str = r#"[
        {
            "id": 0,
            "type": "PipeWire:Interface:Metadata",
            "props": {
                "metadata.name": "default"
            },
            "metadata": [
                {
                    "key": "default.audio.sink",
                    "value": {"name": "alsa_output.pci-0000_00_1f.3.analog-stereo"}
                }
            ]
        }
    ]"#;

    const DEFAULT_METADATA_STRING_JSON: &str = r#"[
        {
            "id": 0,
            "type": "PipeWire:Interface:Metadata",
            "props": {
                "metadata.name": "default"
            },
            "metadata": [
                {
                    "key": "default.audio.sink",
                    "value": "alsa_output.pci-0000_00_1f.3.analog-stereo"
                }
            ]
        }
    ]"#;

    const RUNNING_STREAM_JSON: &str = r#"[
        {
            "id": 75,
            "type": "PipeWire:Interface:Node",
            "info": {
                "state": "running",
                "props": {
                    "media.class": "Stream/Output/Audio",
                    "application.name": "music",
                    "application.process.id": 4242
                },
                "params": {
                    "Props": [
                        {"volume": 1.0},
                        {"mute": false, "channelVolumes": [0.25, 0.30]}
                    ]
                }
            }
        }
    ]"#;

    const MIXED_NODES_JSON: &str = r#"[
        {
            "id": 40,
            "type": "PipeWire:Interface:Node",
            "info": {
                "state": "running",
                "props": {
                    "media.class": "Audio/Sink",
                    "node.name": "alsa_output.pci-0000_00_1f.3.analog-stereo"
                }
            }
        },
        {
            "id": 75,
            "type": "PipeWire:Interface:Node",
            "info": {
                "state": "idle",
                "props": {
                    "media.class": "Stream/Output/Audio",
                    "application.process.id": 100
                }
            }
        },
        {
            "id": 76,
            "type": "PipeWire:Interface:Node",
            "info": {
                "state": "running",
                "props": {
                    "media.class": "Stream/Input/Audio",
                    "application.process.id": 101
                }
            }
        }
    ]"#;

    fn parse(json: &str) -> Vec<PwObject> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn default_sink_name_object_format() {
        let objects = parse(DEFAULT_METADATA_JSON);
        assert_eq!(
            PipeWireSource::default_sink_name(&objects),
            Some("alsa_output.pci-0000_00_1f.3.analog-stereo".to_string())
        );
    }

    #[test]
    fn default_sink_name_string_format() {
        let objects = parse(DEFAULT_METADATA_STRING_JSON);
        assert_eq!(
            PipeWireSource::default_sink_name(&objects),
            Some("alsa_output.pci-0000_00_1f.3.analog-stereo".to_string())
        );
    }

    #[test]
    fn metadata_without_sink_entry_yields_none() {
        let json = r#"[{
            "id": 0,
            "type": "PipeWire:Interface:Metadata",
            "props": {
                "metadata.name": "default"
            },
            "metadata": []
        }]"#;
        assert_eq!(PipeWireSource::default_sink_name(&parse(json)), None);
    }

    #[test]
    fn running_stream_maps_to_active_session() {
        let sessions = PipeWireSource::output_streams(&parse(RUNNING_STREAM_JSON));
        assert_eq!(
            sessions,
            vec![RawSession {
                pid: 4242,
                muted: false,
                peak: 0.30,
                state: SessionState::Active,
            }]
        );
    }

    #[test]
    fn sinks_and_input_streams_are_not_sessions() {
        let sessions = PipeWireSource::output_streams(&parse(MIXED_NODES_JSON));
        // Only the idle output stream survives the media.class filter.
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].pid, 100);
        assert_eq!(sessions[0].state, SessionState::Inactive);
        assert_eq!(sessions[0].peak, 0.0);
    }

    #[test]
    fn stream_without_pid_is_system_owned() {
        let json = r#"[{
            "id": 80,
            "type": "PipeWire:Interface:Node",
            "info": {
                "state": "running",
                "props": {
                    "media.class": "Stream/Output/Audio"
                }
            }
        }]"#;
        let sessions = PipeWireSource::output_streams(&parse(json));
        assert_eq!(sessions[0].pid, 0);
    }

    #[test]
    fn no_default_sink_means_no_device() {
        // Streams exist but there is no default sink to play through.
        let objects = parse(RUNNING_STREAM_JSON);
        assert_eq!(
            PipeWireSource::snapshot_from_objects(&objects),
            SessionSnapshot::NoDevice
        );
    }

    #[test]
    fn snapshot_with_default_sink_collects_streams() {
        let mut combined = parse(DEFAULT_METADATA_JSON);
        combined.extend(parse(RUNNING_STREAM_JSON));
        match PipeWireSource::snapshot_from_objects(&combined) {
            SessionSnapshot::Sessions(sessions) => assert_eq!(sessions.len(), 1),
            SessionSnapshot::NoDevice => panic!("expected sessions"),
        }
    }
}
