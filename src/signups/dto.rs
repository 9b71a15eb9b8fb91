use serde::{Deserialize, Serialize};

use crate::signups::repo_types::Signup;

/// Request body for `POST /api/signup`. Every field is optional at the JSON
/// level so that missing values surface as validation errors.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedSignupResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: Signup,
}

impl CreatedSignupResponse {
    pub fn new(data: Signup) -> Self {
        Self {
            success: true,
            message: "signup created",
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignupListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Signup>,
}

impl From<Vec<Signup>> for SignupListResponse {
    fn from(data: Vec<Signup>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}
