use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SeedripperError {
    #[error("Invalid seed string")]
    SeedError,

    #[error("Failed to load game data")]
    DataLoadingError,

    #[error("Unrecognized species/form combination")]
    UnrecognizedSpecies,

    #[error("Unrecognized area")]
    UnrecognizedArea,

    #[error("Unrecognized spawner")]
    UnrecognizedSpawner,

    #[error("Unrecognized encounter table")]
    UnrecognizedTable,

    #[error("Invalid observation")]
    InvalidObservation,

    #[error("Fixed seed {0:#018X} failed host verification")]
    VerificationError(u64),

    #[error("Result buffer exceeded its analytic capacity")]
    BufferOverflow,

    #[error("Seed search unsuccessful")]
    Unsuccessful,
}
