use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupBody {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SigninBody {
    pub email: String,
    pub password: String,
}

/// Teacher-side user management: rename, change role, approve or reject.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UserManageBody {
    pub name: String,
    pub role: Option<String>,
    pub status: Option<String>,
}
