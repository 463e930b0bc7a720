use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("series '{label}' has {values} values but {timestamps} timestamps")]
    MismatchedLengths {
        label: String,
        values: usize,
        timestamps: usize,
    },
}
