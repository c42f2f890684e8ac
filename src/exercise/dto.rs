use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::exercise::repo::Exercise;
use crate::status::EntryStatus;

#[derive(Debug, Deserialize)]
pub struct ExerciseRequest {
    pub sports: String,
    pub weight: i32,
    pub reps: i32,
    pub break_time: i32,
    /// `YYYY-MM-DD HH:MM`, seconds optional.
    pub exercise_at: String,
}

#[derive(Debug, Serialize)]
pub struct ExerciseResponse {
    pub id: Uuid,
    pub sports: String,
    pub weight: i32,
    pub reps: i32,
    pub break_time: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub exercise_at: OffsetDateTime,
    pub status: EntryStatus,
}

impl From<Exercise> for ExerciseResponse {
    fn from(e: Exercise) -> Self {
        Self {
            id: e.id,
            sports: e.sports,
            weight: e.weight,
            reps: e.reps,
            break_time: e.break_time,
            exercise_at: e.exercise_at,
            status: e.status,
        }
    }
}
