//! Nearby salon lookup through the Google Places nearby-search endpoint.
//!
//! Only the fields needed to place a salon on the map are read; everything
//! else in the response is ignored.

pub mod client;

pub use client::{PlacesClient, PlacesError, DEFAULT_PLACES_URL, SEARCH_RADIUS_METERS};
