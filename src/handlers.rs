use crate::{
    errors::{AppError, ServiceError},
    flash::Flash,
    models::AuthorId,
    validation::{MemeForm, MethodOverrideForm},
    views, AppState,
};
use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

/// The author acting on this request, if one can be identified.
#[derive(Debug, Clone, Copy)]
pub struct CurrentAuthor(pub Option<AuthorId>);

impl<S> FromRequestParts<S> for CurrentAuthor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // TODO: resolve the author from the login session once /login exists.
        Ok(CurrentAuthor(None))
    }
}

fn back_to_feed(jar: CookieJar, flash: Flash) -> Response {
    (flash.set(jar), Redirect::to("/")).into_response()
}

/// Handler for GET /
pub async fn list_memes(
    State(state): State<Arc<AppState>>,
    CurrentAuthor(viewer): CurrentAuthor,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    tracing::debug!("Listing recent memes via handler");
    let items = state.memes.list_recent(viewer).await?;
    let (jar, flash) = Flash::take(jar);
    tracing::info!("Handler successfully retrieved {} memes", items.len());
    Ok((jar, Html(views::feed(&items, &MemeForm::default(), None, flash))))
}

/// Handler for POST /memes
pub async fn create_meme(
    State(state): State<Arc<AppState>>,
    CurrentAuthor(author): CurrentAuthor,
    jar: CookieJar,
    Form(form): Form<MemeForm>,
) -> Result<Response, AppError> {
    match state.memes.create(&form, author).await {
        Ok(meme) => {
            tracing::info!(meme_id = %meme.id, "Meme created successfully via handler");
            Ok(back_to_feed(jar, Flash::Created))
        }
        Err(ServiceError::Validation(errors)) => {
            // Re-render the feed so the form shows its messages next to the typed values.
            let items = state.memes.list_recent(author).await?;
            let html = views::feed(&items, &form.normalized(), Some(&errors), None);
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handler for GET /memes/{id}/edit
pub async fn edit_meme(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<Html<String>, AppError> {
    let meme_id = Uuid::parse_str(&id_str)?;
    tracing::debug!(%meme_id, "Rendering edit form via handler");
    // TODO: check the caller may edit this meme once authors can log in.
    let meme = state.memes.find(meme_id).await?;
    Ok(Html(views::edit(&meme, None, None)))
}

/// Handler for PUT /memes/{id}
pub async fn update_meme(
    State(state): State<Arc<AppState>>,
    CurrentAuthor(actor): CurrentAuthor,
    Path(id_str): Path<String>,
    jar: CookieJar,
    Form(form): Form<MemeForm>,
) -> Result<Response, AppError> {
    let meme_id = Uuid::parse_str(&id_str)?;
    apply_update(&state, actor, meme_id, jar, form).await
}

/// Handler for DELETE /memes/{id}
pub async fn delete_meme(
    State(state): State<Arc<AppState>>,
    CurrentAuthor(actor): CurrentAuthor,
    Path(id_str): Path<String>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let meme_id = Uuid::parse_str(&id_str)?;
    apply_delete(&state, actor, meme_id, jar).await
}

/// Handler for POST /memes/{id}: HTML forms pick PUT or DELETE through `_method`.
pub async fn override_meme(
    State(state): State<Arc<AppState>>,
    CurrentAuthor(actor): CurrentAuthor,
    Path(id_str): Path<String>,
    jar: CookieJar,
    Form(body): Form<MethodOverrideForm>,
) -> Result<Response, AppError> {
    let meme_id = Uuid::parse_str(&id_str)?;
    let (method, form) = body.into_parts();
    match method.as_deref().map(str::to_ascii_uppercase).as_deref() {
        Some("PUT") | Some("PATCH") => apply_update(&state, actor, meme_id, jar, form).await,
        Some("DELETE") => apply_delete(&state, actor, meme_id, jar).await,
        other => Err(AppError::UnsupportedMethod(other.unwrap_or("POST").to_string())),
    }
}

async fn apply_update(
    state: &AppState,
    actor: Option<AuthorId>,
    meme_id: Uuid,
    jar: CookieJar,
    form: MemeForm,
) -> Result<Response, AppError> {
    tracing::debug!(%meme_id, "Updating meme via handler");
    match state.memes.update(meme_id, &form, actor).await {
        Ok(_) => Ok(back_to_feed(jar, Flash::Updated)),
        Err(ServiceError::Validation(errors)) => {
            let meme = state.memes.find(meme_id).await?;
            let html = views::edit(&meme, Some(&form.normalized()), Some(&errors));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn apply_delete(
    state: &AppState,
    actor: Option<AuthorId>,
    meme_id: Uuid,
    jar: CookieJar,
) -> Result<Response, AppError> {
    tracing::debug!(%meme_id, "Deleting meme via handler");
    state.memes.delete(meme_id, actor).await?;
    Ok(back_to_feed(jar, Flash::Deleted))
}

/// Fallback for unknown routes.
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(views::error_page(StatusCode::NOT_FOUND, "Página no encontrada.")),
    )
        .into_response()
}
