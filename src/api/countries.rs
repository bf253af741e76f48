//! Country catalog with combined search filters.

use axum::{
    extract::State,
    routing::get,
    Router,
};
use std::sync::Arc;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::{Json, Query};
use super::validation::validate_text;
use crate::db::{Country, CountrySearchQuery, CreateCountryRequest, MemoryStore, SharedStore};

pub struct CountriesState {
    pub countries: SharedStore<u64, Country>,
}

impl CountriesState {
    pub fn new() -> Self {
        Self {
            countries: MemoryStore::shared(),
        }
    }
}

impl Default for CountriesState {
    fn default() -> Self {
        Self::new()
    }
}

async fn list_countries(State(state): State<Arc<CountriesState>>) -> Json<Vec<Country>> {
    Json(state.countries.all())
}

async fn create_country(
    State(state): State<Arc<CountriesState>>,
    Json(req): Json<CreateCountryRequest>,
) -> Result<Json<Country>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("name", validate_text("Name", &req.name))
        .check("capital", validate_text("Capital", &req.capital));
    errors.finish()?;

    let country = state.countries.insert_next(&mut |id| Country {
        id: *id,
        name: req.name.clone(),
        capital: req.capital.clone(),
        population: req.population,
    });
    Ok(Json(country))
}

async fn search_countries(
    State(state): State<Arc<CountriesState>>,
    Query(query): Query<CountrySearchQuery>,
) -> Result<Json<Vec<Country>>, ApiError> {
    if query.min_population.is_none() && query.name.is_none() {
        return Err(ApiError::bad_request(
            "At least one query parameter required",
        ));
    }
    Ok(Json(state.countries.scan(&|_, country| query.matches(country))))
}

pub fn router(state: Arc<CountriesState>) -> Router {
    Router::new()
        .route("/countries", get(list_countries).post(create_country))
        .route("/countries/search", get(search_countries))
        .with_state(state)
}
