use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;

use rre_types::activities::ActivityOption;
use rre_types::models::{NewRegistration, Registration};

use crate::models::RegistrationRow;
use crate::{Database, OptionalExt};

const REGISTRATION_COLUMNS: &str = "id, company_name, company_size, address, \
     representative_name, position, email, phone, selected_event, \
     additional_info, accept_terms, is_validated, validated_at, \
     user_password, created_at";

impl Database {
    /// Insert a registration together with its 1–3 activity attachments.
    /// The pair of inserts is the one transactional unit in the system.
    pub fn create_registration(
        &self,
        reg: &NewRegistration,
        activities: &[ActivityOption],
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO registrations (
                    company_name, company_size, address, representative_name,
                    position, email, phone, selected_event, additional_info,
                    accept_terms
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    reg.company_name,
                    reg.company_size,
                    reg.address,
                    reg.representative_name,
                    reg.position,
                    reg.email,
                    reg.phone,
                    reg.selected_event,
                    reg.additional_info,
                    reg.accept_terms,
                ],
            )?;
            let id = tx.last_insert_rowid();

            for activity in activities {
                tx.execute(
                    "INSERT INTO registration_activities (
                        registration_id, activity_id, activity_label, activity_category
                    ) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![id, activity.id, activity.label, activity.category],
                )?;
            }

            tx.commit()?;
            Ok(id)
        })
    }

    pub fn get_registration(&self, id: i64) -> Result<Option<Registration>> {
        self.with_conn(|conn| {
            let Some(row) = query_registration_row(
                conn,
                &format!("SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = ?1"),
                rusqlite::params![id],
            )?
            else {
                return Ok(None);
            };

            let activities = query_activities(conn, &[row.id])?
                .remove(&row.id)
                .unwrap_or_default();
            Ok(Some(row.into_registration(activities)))
        })
    }

    /// All registrations with their activities, newest first.
    pub fn list_registrations(&self) -> Result<Vec<Registration>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REGISTRATION_COLUMNS} FROM registrations
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([], map_registration_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
            let mut by_registration = query_activities(conn, &ids)?;

            Ok(rows
                .into_iter()
                .map(|row| {
                    let activities = by_registration.remove(&row.id).unwrap_or_default();
                    row.into_registration(activities)
                })
                .collect())
        })
    }

    /// Case-sensitive existence check, per SQLite's default collation on
    /// the email column.
    pub fn email_exists(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM registrations WHERE email = ?1",
                [email],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Flip a registration to validated and store its freshly generated
    /// credential. Returns the updated record, or None if the id is unknown.
    /// Calling this again on a validated registration keeps the flag set but
    /// replaces the credential.
    pub fn mark_validated(&self, id: i64, password: &str) -> Result<Option<Registration>> {
        let updated = self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE registrations
                 SET is_validated = 1,
                     validated_at = datetime('now'),
                     user_password = ?1,
                     updated_at = datetime('now')
                 WHERE id = ?2",
                rusqlite::params![password, id],
            )?;
            Ok(n)
        })?;

        if updated == 0 {
            return Ok(None);
        }
        self.get_registration(id)
    }

    /// Exact email + stored credential + validated flag, or no match.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Option<Registration>> {
        let id = self.with_conn(|conn| {
            conn.query_row(
                "SELECT id FROM registrations
                 WHERE email = ?1 AND user_password = ?2 AND is_validated = 1",
                rusqlite::params![email, password],
                |row| row.get::<_, i64>(0),
            )
            .optional()
        })?;

        match id {
            Some(id) => self.get_registration(id),
            None => Ok(None),
        }
    }
}

fn query_registration_row(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Option<RegistrationRow>> {
    let mut stmt = conn.prepare(sql)?;
    stmt.query_row(params, map_registration_row).optional()
}

fn map_registration_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RegistrationRow> {
    Ok(RegistrationRow {
        id: row.get(0)?,
        company_name: row.get(1)?,
        company_size: row.get(2)?,
        address: row.get(3)?,
        representative_name: row.get(4)?,
        position: row.get(5)?,
        email: row.get(6)?,
        phone: row.get(7)?,
        selected_event: row.get(8)?,
        additional_info: row.get(9)?,
        accept_terms: row.get(10)?,
        is_validated: row.get(11)?,
        validated_at: row.get(12)?,
        user_password: row.get(13)?,
        created_at: row.get(14)?,
    })
}

/// Batch-fetch activity attachments for a set of registration ids, in
/// insertion order, grouped by registration.
fn query_activities(
    conn: &Connection,
    registration_ids: &[i64],
) -> Result<HashMap<i64, Vec<ActivityOption>>> {
    if registration_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=registration_ids.len())
        .map(|i| format!("?{}", i))
        .collect();
    let sql = format!(
        "SELECT registration_id, activity_id, activity_label, activity_category
         FROM registration_activities
         WHERE registration_id IN ({})
         ORDER BY id",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = registration_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let mut grouped: HashMap<i64, Vec<ActivityOption>> = HashMap::new();
    let rows = stmt.query_map(params.as_slice(), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            ActivityOption {
                id: row.get(1)?,
                label: row.get(2)?,
                category: row.get(3)?,
            },
        ))
    })?;
    for row in rows {
        let (registration_id, activity) = row?;
        grouped.entry(registration_id).or_default().push(activity);
    }

    Ok(grouped)
}
