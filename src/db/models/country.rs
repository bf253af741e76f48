use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Country {
    pub id: u64,
    pub name: String,
    pub capital: String,
    pub population: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateCountryRequest {
    pub name: String,
    pub capital: String,
    pub population: u64,
}

#[derive(Debug, Deserialize)]
pub struct CountrySearchQuery {
    pub min_population: Option<u64>,
    pub name: Option<String>,
}

impl CountrySearchQuery {
    /// Both filters apply when both are given.
    pub fn matches(&self, country: &Country) -> bool {
        if let Some(min) = self.min_population {
            if country.population < min {
                return false;
            }
        }
        if let Some(ref name) = self.name {
            if !country.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        true
    }
}
