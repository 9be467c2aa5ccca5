pub mod compass_direction;
pub mod hotspot;
pub mod lat_lon;
pub mod station_reading;
pub mod uv_risk;
