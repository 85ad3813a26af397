//! Fixed weather label to severity code table.

use serde::{Deserialize, Serialize};

pub const WEATHER_LABEL: &str = "Weather_Impact";
pub const WEATHER_CODE: &str = "Weather_Impact_Num";

/// Weather impact label as recorded on a delivery
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Weather {
    None,
    #[serde(rename = "Light_Rain")]
    LightRain,
    #[serde(rename = "Heavy_Rain")]
    HeavyRain,
    Fog,
}

impl Weather {
    pub const ALL: [Weather; 4] = [Weather::None, Weather::LightRain, Weather::HeavyRain, Weather::Fog];

    pub fn code(self) -> u8 {
        match self {
            Weather::None => 0,
            Weather::LightRain => 1,
            Weather::HeavyRain => 2,
            Weather::Fog => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weather::None => "None",
            Weather::LightRain => "Light_Rain",
            Weather::HeavyRain => "Heavy_Rain",
            Weather::Fog => "Fog",
        }
    }
}

impl From<&str> for Weather {
    fn from(s: &str) -> Self {
        match s.trim() {
            "Light_Rain" => Weather::LightRain,
            "Heavy_Rain" => Weather::HeavyRain,
            "Fog" => Weather::Fog,
            _ => Weather::None, // default
        }
    }
}

/// Numeric code for a weather label; unknown labels map to 0.
pub fn weather_code(label: &str) -> f64 {
    f64::from(Weather::from(label).code())
}
