use shuangse_db::models::NumberError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("combinaison invalide : {0}")]
    Validation(#[from] NumberError),

    #[error("tirage {0} introuvable (pas encore tiré ?)")]
    NotFound(String),

    #[error("erreur du stockage : {0:#}")]
    Store(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
