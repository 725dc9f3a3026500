use rusqlite::params;

use shared_database::{now_timestamp, Database, DatabaseError};

use crate::models::{HistoryEntry, HistoryPair, HistoryRole};

pub const RECENT_HISTORY_LIMIT: usize = 50;

pub async fn save_message(
    db: &Database,
    user_id: &str,
    role: HistoryRole,
    message: &str,
) -> Result<(), DatabaseError> {
    let user_id = user_id.to_string();
    let message = message.to_string();

    db.call(move |conn| {
        conn.execute(
            "INSERT INTO chat_history (user_id, role, message, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, role.as_str(), message, now_timestamp()],
        )?;
        Ok(())
    })
    .await
}

/// The user's last `limit` messages, oldest first.
pub async fn recent_messages(
    db: &Database,
    user_id: &str,
    limit: usize,
) -> Result<Vec<HistoryEntry>, DatabaseError> {
    let user_id = user_id.to_string();

    db.call(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT role, message, timestamp FROM (
                 SELECT id, role, message, timestamp FROM chat_history
                 WHERE user_id = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2
             ) ORDER BY timestamp ASC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(HistoryEntry {
                    role: row.get(0)?,
                    message: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
    .await
}

/// Pairs each user message with the assistant message directly after it.
///
/// Ids are `hist_{i}` where `i` is the user message's position in `history`.
pub fn pair_history(history: &[HistoryEntry]) -> Vec<HistoryPair> {
    history
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.role == HistoryRole::User.as_str())
        .filter_map(|(i, entry)| {
            let reply = history.get(i + 1)?;
            if reply.role != HistoryRole::Assistant.as_str() || reply.message.is_empty() {
                return None;
            }
            Some(HistoryPair {
                id: format!("hist_{}", i),
                user_message: entry.message.clone(),
                bot_message: reply.message.clone(),
                timestamp: entry.timestamp.clone(),
            })
        })
        .collect()
}
