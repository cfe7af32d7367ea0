use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeopopError {
    #[error("{table} table: missing required column `{column}`")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("{table} table: expected {expected} columns, found {found}")]
    ColumnCount {
        table: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("population `{0}` is not present in the geographic table")]
    UnknownPopulation(String),

    #[error("population `{0}` has no genetic profile")]
    MissingProfile(String),

    #[error("population `{0}` appears more than once")]
    DuplicatePopulation(String),

    #[error("{table} table: invalid numeric value `{value}`")]
    InvalidNumber { table: &'static str, value: String },

    #[error("geographic table contains no populations")]
    EmptyPanel,

    #[error("unable to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Csv(#[from] csv::Error),
}
