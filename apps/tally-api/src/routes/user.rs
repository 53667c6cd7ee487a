//! Cashier accounts. Transactions refer to them by numeric `user_id`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tally_core::validation::validate_name;
use tally_core::{CoreError, User, ValidationError};
use tally_db::repository::user::NewUser;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/users", post(create).get(list))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    #[serde(default, alias = "user_id")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "user_id")]
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub role: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView {
            display_name: user.display_name(),
            user_id: user.user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
        }
    }
}

fn validate_user(body: UserBody) -> Result<NewUser, CoreError> {
    let user_id = body.user_id.ok_or_else(|| ValidationError::Required {
        field: "user_id".to_string(),
    })?;
    if user_id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "user_id".to_string(),
        }
        .into());
    }

    let first_name = body.first_name.unwrap_or_default().trim().to_string();
    validate_name("firstName", &first_name)?;
    let last_name = body.last_name.unwrap_or_default().trim().to_string();

    Ok(NewUser {
        user_id,
        first_name,
        last_name,
        role: body
            .role
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "cashier".to_string()),
    })
}

async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UserBody>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    let new = validate_user(body)?;
    let user = state.db.users().insert(&new).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<UserView>>> {
    let users = state.db.users().list().await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}
