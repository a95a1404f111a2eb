//! REST handlers. Thin by design: fetch, transform via the model layer,
//! write back. Failure mapping follows one rule per path: single-object reads
//! collapse every storage failure into Not Found, writes and listings answer
//! 500 with the underlying message as `detail`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::auth::AuthEvent;
use crate::error::AppError;
use crate::filter::PlaceQuery;
use crate::model::{NewPlace, NewTrip, Place, PlacePatch, Trip, TripPatch};
use crate::state::AppState;
use crate::stats::TripStats;

pub async fn list_places(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlaceQuery>,
) -> Result<Json<Vec<Place>>, AppError> {
    let places: Vec<Place> = state
        .places()?
        .list()
        .await
        .map_err(AppError::storage("Failed to list"))?;
    Ok(Json(query.into_filter().apply(places)))
}

pub async fn create_place(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewPlace>,
) -> Result<(StatusCode, Json<Place>), AppError> {
    let place = Place::create(payload);
    place.validate()?;
    state
        .places()?
        .put(&place.id, &place)
        .await
        .map_err(AppError::storage("Failed to create"))?;
    info!(id = %place.id, "place created");
    Ok((StatusCode::CREATED, Json(place)))
}

pub async fn get_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Place>, AppError> {
    let place: Place = state
        .places()?
        .get(&id)
        .await
        .unwrap_or(None)
        .ok_or(AppError::NotFound)?;
    Ok(Json(place))
}

pub async fn update_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<PlacePatch>,
) -> Result<Json<Place>, AppError> {
    let bucket = state.places()?;
    let mut place: Place = bucket
        .get(&id)
        .await
        .unwrap_or(None)
        .ok_or(AppError::NotFound)?;

    place.apply(patch);
    place.validate()?;

    bucket
        .put(&id, &place)
        .await
        .map_err(AppError::storage("Failed to update"))?;
    Ok(Json(place))
}

pub async fn delete_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .places()?
        .delete(&id)
        .await
        .map_err(AppError::storage("Failed to delete"))?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn list_trips(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Trip>>, AppError> {
    let trips = state
        .trips()?
        .list()
        .await
        .map_err(AppError::storage("Failed to list"))?;
    Ok(Json(trips))
}

pub async fn create_trip(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewTrip>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let trip = Trip::create(payload);
    trip.validate()?;
    state
        .trips()?
        .put(&trip.id, &trip)
        .await
        .map_err(AppError::storage("Failed to create"))?;
    info!(id = %trip.id, "trip created");
    Ok((StatusCode::CREATED, Json(trip)))
}

pub async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Trip>, AppError> {
    let trip: Trip = state
        .trips()?
        .get(&id)
        .await
        .unwrap_or(None)
        .ok_or(AppError::NotFound)?;
    Ok(Json(trip))
}

pub async fn update_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<TripPatch>,
) -> Result<Json<Trip>, AppError> {
    let bucket = state.trips()?;
    let mut trip: Trip = bucket
        .get(&id)
        .await
        .unwrap_or(None)
        .ok_or(AppError::NotFound)?;

    trip.apply(patch);
    trip.validate()?;

    bucket
        .put(&id, &trip)
        .await
        .map_err(AppError::storage("Failed to update"))?;
    Ok(Json(trip))
}

pub async fn delete_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .trips()?
        .delete(&id)
        .await
        .map_err(AppError::storage("Failed to delete"))?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn trip_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TripStats>, AppError> {
    let trip: Trip = state
        .trips()?
        .get(&id)
        .await
        .unwrap_or(None)
        .ok_or(AppError::NotFound)?;
    Ok(Json(TripStats::compute(&trip)))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .config
        .credentials
        .verify(&payload.email, &payload.password)
        .ok_or(AppError::Unauthorized)?;

    state.auth.notify(&AuthEvent::SignedIn(user.clone()));
    info!(email = %user.email, "mock sign-in");
    Ok(Json(json!({ "user": user })))
}
