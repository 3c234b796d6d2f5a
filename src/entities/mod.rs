// Entity Models
// Each entity has a stable integer identity assigned by the store and values
// that imports merge into over time.

pub mod wind_farm;

pub use wind_farm::{WindFarm, WindFarmPayload, WindFarmStatus};
