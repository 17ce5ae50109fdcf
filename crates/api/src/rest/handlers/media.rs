//! REST-Handler fuer die Medienliste

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::error::ApiResult;
use crate::rest::ApiState;

#[derive(Debug, Serialize)]
pub struct MedienListe {
    #[serde(rename = "Items")]
    pub items: Vec<String>,
}

/// GET /api/media – Namen aller Eintraege im Medienverzeichnis
pub async fn liste(State(state): State<ApiState>) -> ApiResult<Json<MedienListe>> {
    let mut eintraege = tokio::fs::read_dir(state.medien_verzeichnis.as_path()).await?;
    let mut items = Vec::new();
    while let Some(eintrag) = eintraege.next_entry().await? {
        items.push(eintrag.file_name().to_string_lossy().into_owned());
    }
    items.sort();
    Ok(Json(MedienListe { items }))
}
