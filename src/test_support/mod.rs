//! In-memory sources used by the unit tests.

pub mod auth;
pub mod database;
pub mod firestore;
pub mod functions;
pub mod messaging;
pub mod storage;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestError {
    pub code: String,
}

impl TestError {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
        }
    }
}
