// src/middleware/actor.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::common::error::AppError;

// A autenticação é feita antes deste serviço; o gateway repassa o usuário aqui.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Usuário que faz a chamada (professor ou aluno, conforme a rota).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub i64);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::BadRequest("O cabeçalho x-user-id é obrigatório.".to_string()))?;

        let value_str = value
            .to_str()
            .map_err(|_| AppError::BadRequest("Cabeçalho x-user-id contém caracteres inválidos.".to_string()))?;

        let user_id = value_str
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::BadRequest("Cabeçalho x-user-id inválido (não é um número).".to_string()))?;

        Ok(Actor(user_id))
    }
}
