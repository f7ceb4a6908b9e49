use std::path::PathBuf;

use thiserror::Error;

use crate::models::Key;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read student data from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid array of student records: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate student_id '{id}' in student data")]
    DuplicateId { id: Key },
}
