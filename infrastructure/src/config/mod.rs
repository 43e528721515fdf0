//! Configuration loading with multi-source merging.
//!
//! Raw TOML structure plus a figment-based loader. Priority, highest to
//! lowest: environment (`PANEL_*`), explicit config path, project-level
//! `panel.toml` / `.panel.toml`, built-in defaults.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use panel_domain::{Dimension, DimensionWeights, ReaderPersona};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub gateway: GatewayConfig,
    pub focus_group: FocusGroupConfig,
    /// Configured reader personas; empty means the built-in panel
    pub readers: Vec<ReaderConfig>,
}

impl PanelConfig {
    /// Resolve the configured readers, falling back to the built-in panel.
    pub fn panel(&self) -> Vec<ReaderPersona> {
        if self.readers.is_empty() {
            return ReaderPersona::default_panel();
        }
        self.readers.iter().map(ReaderConfig::to_persona).collect()
    }
}

/// Inference endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Model used for reader, moderator, and executive calls
    pub model: String,
    /// Smaller model for memory extraction; falls back to `model`
    pub extraction_model: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_string(),
            api_key: None,
            model: "panel-default".to_string(),
            extraction_model: None,
        }
    }
}

impl GatewayConfig {
    pub fn extraction_model(&self) -> &str {
        self.extraction_model.as_deref().unwrap_or(&self.model)
    }
}

/// Focus-group session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusGroupConfig {
    /// Delay between turns, in milliseconds
    pub pacing_ms: u64,
    /// Reaction sub-rounds per question round
    pub reaction_rounds: usize,
}

impl Default for FocusGroupConfig {
    fn default() -> Self {
        Self {
            pacing_ms: 400,
            reaction_rounds: 2,
        }
    }
}

impl FocusGroupConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

/// One configured reader persona
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub id: String,
    pub name: String,
    pub instruction: String,
    /// Per-dimension weight multipliers; unlisted dimensions default to 1.0
    pub weights: BTreeMap<Dimension, f64>,
    pub color: Option<String>,
}

impl ReaderConfig {
    fn to_persona(&self) -> ReaderPersona {
        let mut persona = ReaderPersona::new(self.id.as_str(), self.name.clone())
            .with_instruction(self.instruction.clone())
            .with_weights(self.weights.iter().map(|(d, w)| (*d, *w)).collect::<DimensionWeights>());
        if let Some(color) = &self.color {
            persona = persona.with_color(color.clone());
        }
        persona
    }
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority.
    pub fn load(config_path: Option<&PathBuf>) -> Result<PanelConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(PanelConfig::default()));

        for filename in &["panel.toml", ".panel.toml"] {
            let path = PathBuf::from(filename);
            if path.exists() {
                figment = figment.merge(Toml::file(&path));
                break;
            }
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(Env::prefixed("PANEL_").split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// Load only default configuration.
    pub fn load_defaults() -> PanelConfig {
        PanelConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.gateway.base_url, "http://localhost:8080/v1");
        assert_eq!(config.gateway.extraction_model(), "panel-default");
        assert_eq!(config.focus_group.pacing(), Duration::from_millis(400));
        assert_eq!(config.panel().len(), 3);
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
[gateway]
base_url = "http://inference:9000/v1"
model = "reader-large"
extraction_model = "reader-small"

[focus_group]
pacing_ms = 0

[[readers]]
id = "craft"
name = "Craft"
instruction = "Judge prose."
"#
        )
        .unwrap();

        let config = ConfigLoader::load(Some(&path)).unwrap();
        assert_eq!(config.gateway.base_url, "http://inference:9000/v1");
        assert_eq!(config.gateway.extraction_model(), "reader-small");
        assert_eq!(config.focus_group.pacing_ms, 0);
        let panel = config.panel();
        assert_eq!(panel.len(), 1);
        assert_eq!(panel[0].name, "Craft");
    }

    #[test]
    fn test_reader_weights_resolve_to_persona() {
        let reader = ReaderConfig {
            id: "craft".to_string(),
            name: "Craft".to_string(),
            instruction: String::new(),
            weights: BTreeMap::from([(Dimension::Pacing, 1.5)]),
            color: None,
        };
        let persona = reader.to_persona();
        assert_eq!(persona.weights.get(Dimension::Pacing), 1.5);
        assert_eq!(persona.weights.get(Dimension::Plot), 1.0);
    }
}
