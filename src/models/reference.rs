use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    pub municipality_id: u32,
    pub name: String,
}

impl Municipality {
    pub fn new(municipality_id: u32, name: String) -> Self {
        Self {
            municipality_id,
            name,
        }
    }
}

/// Urban/suburban/rural style classification of a station's surroundings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentType {
    pub environment_type_id: u32,
    pub name: String,
}

impl EnvironmentType {
    pub fn new(environment_type_id: u32, name: String) -> Self {
        Self {
            environment_type_id,
            name,
        }
    }
}
