use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct CompletedPatch {
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}
