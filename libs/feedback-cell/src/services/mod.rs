use rusqlite::params;
use tracing::{info, instrument};

use shared_database::{now_timestamp, Database};

use crate::models::{Feedback, FeedbackError, FeedbackRequest, MAX_RATING, MIN_RATING};

pub struct FeedbackService {
    db: Database,
}

impl FeedbackService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id, rating = request.rating))]
    pub async fn submit(&self, request: FeedbackRequest) -> Result<i64, FeedbackError> {
        if !(MIN_RATING..=MAX_RATING).contains(&request.rating) {
            return Err(FeedbackError::InvalidRating(request.rating));
        }

        info!("Feedback received from {}: rating={}", request.user_id, request.rating);

        let id = self
            .db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO feedback (user_id, rating, comment, message_id, timestamp)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        request.user_id,
                        request.rating,
                        request.comment.unwrap_or_default(),
                        request.message_id,
                        now_timestamp()
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        Ok(id)
    }

    /// All feedback, newest first.
    pub async fn list(&self) -> Result<Vec<Feedback>, FeedbackError> {
        let feedback = self
            .db
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, rating, comment, message_id, timestamp
                     FROM feedback ORDER BY timestamp DESC, id DESC",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(Feedback {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            rating: row.get(2)?,
                            comment: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                            message_id: row.get(4)?,
                            timestamp: row.get(5)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        Ok(feedback)
    }
}
