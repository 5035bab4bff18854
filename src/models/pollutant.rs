use serde::{Deserialize, Serialize};

/// Closed vocabulary of pollutant codes reported by the monitoring network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollutantType {
    Co,
    No2,
    O3,
    Pm,
    So2,
    Pm25,
    Pm10,
    Unknown,
}

impl PollutantType {
    pub const KNOWN: [PollutantType; 7] = [
        PollutantType::Co,
        PollutantType::No2,
        PollutantType::O3,
        PollutantType::Pm,
        PollutantType::So2,
        PollutantType::Pm25,
        PollutantType::Pm10,
    ];

    /// Resolve a source code, ignoring case and surrounding whitespace.
    /// Anything outside the vocabulary resolves to `Unknown`.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        Self::KNOWN
            .into_iter()
            .find(|known| known.code().eq_ignore_ascii_case(code))
            .unwrap_or(PollutantType::Unknown)
    }

    pub fn code(&self) -> &'static str {
        match self {
            PollutantType::Co => "CO",
            PollutantType::No2 => "NO2",
            PollutantType::O3 => "O3",
            PollutantType::Pm => "PM",
            PollutantType::So2 => "SO2",
            PollutantType::Pm25 => "PM25",
            PollutantType::Pm10 => "PM10",
            PollutantType::Unknown => "UNKNOWN",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PollutantType::Co => "Monoxyde de carbone",
            PollutantType::No2 => "Dioxyde d'azote",
            PollutantType::O3 => "Ozone troposphérique",
            PollutantType::Pm => "Particules fines (PM2.5)",
            PollutantType::So2 => "Dioxyde de soufre",
            PollutantType::Pm25 => "Particules fines (PM2.5)",
            PollutantType::Pm10 => "Particules grossières (PM10)",
            PollutantType::Unknown => "Inconnu",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PollutantType::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pollutant {
    /// Uppercase canonical code of the resolved vocabulary entry.
    pub code: String,
    pub description: String,
}

impl From<PollutantType> for Pollutant {
    fn from(kind: PollutantType) -> Self {
        Self {
            code: kind.code().to_string(),
            description: kind.description().to_string(),
        }
    }
}
