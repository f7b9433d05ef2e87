use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::{Error, res};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<Error>() {
            Some(Error::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(Error::Conflict(_)) => StatusCode::CONFLICT,
            Some(Error::Invalid(_)) => StatusCode::BAD_REQUEST,
            Some(Error::Storage(_)) | None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match status {
            StatusCode::NOT_FOUND => (status, res::not_found()).into_response(),
            StatusCode::INTERNAL_SERVER_ERROR => {
                error!("{:#}\n{}", self.0, self.0.backtrace());
                (status, Html(res::message("Something broke", "Please try again later."))).into_response()
            }
            _ => (status, Html(res::message("That didn't work", &self.0.to_string()))).into_response(),
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_core_error() {
        assert_eq!(AppError::from(Error::NotFound("joke")).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(Error::Conflict("slug".into())).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::from(Error::Invalid("slug".into())).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(Error::Storage(sqlx::Error::PoolTimedOut)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(anyhow::anyhow!("session store down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
