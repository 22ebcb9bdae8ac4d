//! HTTP request handlers for the heatmap API.

pub mod aggregate;
pub mod choropleth;
pub mod common;
pub mod health;
pub mod overlay;
pub mod points;
