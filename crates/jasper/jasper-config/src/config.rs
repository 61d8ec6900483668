use jasper_engine::FeedConfig;
use jasper_gen::GeneratorConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug)]
pub struct JasperConfig {
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default = "defaults::symbols")]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub generator: GeneratorSection,
    #[serde(default)]
    pub feed: FeedSection,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct GeneratorSection {
    pub base_price: f64,
    pub volatility: f64,
    pub spread_bps: f64,
    pub update_interval_us: u32,
    pub min_quantity: u64,
    pub max_quantity: u64,
    pub messages_per_burst: u32,
    pub enable_activity_spikes: bool,
    pub spike_probability: u32,
    pub spike_multiplier: u32,
    pub spike_duration_us: u32,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct FeedSection {
    pub consumer_yield_us: u32,
    pub enable_statistics: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

mod defaults {
    pub fn log_level() -> String {
        "info".into()
    }

    pub fn symbols() -> Vec<String> {
        ["AAPL", "MSFT", "GOOGL", "TSLA", "META", "AMZN", "NVDA", "NFLX"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

impl Default for JasperConfig {
    fn default() -> Self {
        JasperConfig {
            log_level: defaults::log_level(),
            symbols: defaults::symbols(),
            generator: GeneratorSection::default(),
            feed: FeedSection::default(),
        }
    }
}

impl Default for GeneratorSection {
    fn default() -> Self {
        GeneratorConfig::default().into()
    }
}

impl Default for FeedSection {
    fn default() -> Self {
        FeedConfig::default().into()
    }
}

impl From<GeneratorConfig> for GeneratorSection {
    fn from(c: GeneratorConfig) -> Self {
        GeneratorSection {
            base_price: c.base_price,
            volatility: c.volatility,
            spread_bps: c.spread_bps,
            update_interval_us: c.update_interval_us,
            min_quantity: c.min_quantity,
            max_quantity: c.max_quantity,
            messages_per_burst: c.messages_per_burst,
            enable_activity_spikes: c.enable_activity_spikes,
            spike_probability: c.spike_probability,
            spike_multiplier: c.spike_multiplier,
            spike_duration_us: c.spike_duration_us,
        }
    }
}

impl From<FeedConfig> for FeedSection {
    fn from(c: FeedConfig) -> Self {
        FeedSection {
            consumer_yield_us: c.consumer_yield_us,
            enable_statistics: c.enable_statistics,
        }
    }
}

impl GeneratorSection {
    pub fn to_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            base_price: self.base_price,
            volatility: self.volatility,
            spread_bps: self.spread_bps,
            update_interval_us: self.update_interval_us,
            min_quantity: self.min_quantity,
            max_quantity: self.max_quantity,
            messages_per_burst: self.messages_per_burst,
            enable_activity_spikes: self.enable_activity_spikes,
            spike_probability: self.spike_probability,
            spike_multiplier: self.spike_multiplier,
            spike_duration_us: self.spike_duration_us,
        }
    }
}

impl FeedSection {
    pub fn to_config(&self) -> FeedConfig {
        FeedConfig {
            consumer_yield_us: self.consumer_yield_us,
            enable_statistics: self.enable_statistics,
        }
    }
}

impl JasperConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: JasperConfig = toml::from_str(&raw)?;
        Ok(config)
    }
}
