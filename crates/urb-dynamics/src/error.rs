use thiserror::Error;

#[derive(Debug, Error)]
pub enum DynamicsError {
    #[error("unknown vehicle model {0:?}")]
    UnknownVehicle(String),

    #[error("vehicle handle {0} is not alive")]
    DeadHandle(urb_core::VehicleId),
}

pub type DynResult<T> = Result<T, DynamicsError>;
