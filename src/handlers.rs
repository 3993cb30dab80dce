use crate::errors::AppError;
use crate::models::{
    ChartPoint, ChartQuery, EmailQuery, EntryUpdate, ExistsResponse, LoginRequest, NewEntry,
    SignupRequest, User, WellnessEntry, WellnessStats,
};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;

const DEFAULT_CHART_DAYS: usize = 7;

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let session = state.session.lock().await;
    if session.check_user_exists(&payload.email).await? {
        return Err(AppError::conflict("an account with this email already exists"));
    }

    let user = session
        .signup(&payload.email, &payload.password, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<User>, AppError> {
    let user = state
        .session
        .lock()
        .await
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(user))
}

pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.session.lock().await.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(State(state): State<AppState>) -> Json<Option<User>> {
    Json(state.session.lock().await.current_user().cloned())
}

pub async fn user_exists(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<ExistsResponse>, AppError> {
    let exists = state.session.lock().await.check_user_exists(&query.email).await?;
    Ok(Json(ExistsResponse { exists }))
}

pub async fn list_entries(State(state): State<AppState>) -> Result<Json<Vec<WellnessEntry>>, AppError> {
    require_user(&state).await?;
    Ok(Json(state.entries.lock().await.list_entries()))
}

pub async fn add_entry(
    State(state): State<AppState>,
    Json(payload): Json<NewEntry>,
) -> Result<(StatusCode, Json<WellnessEntry>), AppError> {
    require_user(&state).await?;
    let entry = state.entries.lock().await.add_entry(payload).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn entry_by_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<WellnessEntry>, AppError> {
    require_user(&state).await?;
    let date = parse_date(&date)?;
    state
        .entries
        .lock()
        .await
        .get_entry_by_date(date)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("no entry for {date}")))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<EntryUpdate>,
) -> Result<Json<WellnessEntry>, AppError> {
    require_user(&state).await?;
    state
        .entries
        .lock()
        .await
        .update_entry(&id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("no entry {id}")))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_user(&state).await?;
    state.entries.lock().await.delete_entry(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<WellnessStats>, AppError> {
    require_user(&state).await?;
    Ok(Json(state.entries.lock().await.get_stats()))
}

pub async fn get_chart(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<Vec<ChartPoint>>, AppError> {
    require_user(&state).await?;
    let days = query.days.unwrap_or(DEFAULT_CHART_DAYS);
    Ok(Json(state.entries.lock().await.get_chart_data(days)))
}

async fn require_user(state: &AppState) -> Result<User, AppError> {
    state
        .session
        .lock()
        .await
        .current_user()
        .cloned()
        .ok_or_else(AppError::unauthorized)
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("date must be YYYY-MM-DD"))
}
