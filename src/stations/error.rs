use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LocateStationError {
    #[error("Station '{station}' coincides with the query point ({latitude}, {longitude}); inverse-distance weighting is undefined")]
    DegenerateDistance {
        station: String,
        latitude: f64,
        longitude: f64,
    },

    #[error("No stations available to weight")]
    NoStations,

    #[error("Could not compute a geodesic distance to station '{station}' at ({latitude}, {longitude})")]
    InvalidCoordinate {
        station: String,
        latitude: f64,
        longitude: f64,
    },
}
