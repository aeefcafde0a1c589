use crate::Database;
use crate::models::{
    DecidedVerification, FoundItemRow, LostItemRow, NotificationRow, PendingVerificationRow,
    UserRow,
};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        fullname: &str,
        email: &str,
        phone: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, fullname, email, phone, password) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, fullname, email, phone, password_hash],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    /// Replace a user's password hash. Returns false when the email is unknown.
    pub fn update_password(&self, email: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let affected = conn.execute(
                "UPDATE users SET password = ?1 WHERE email = ?2",
                rusqlite::params![password_hash, email],
            )?;
            Ok(affected > 0)
        })
    }

    pub fn count_users(&self) -> Result<u64> {
        self.with_conn(|conn| count_table(conn, "SELECT COUNT(*) FROM users"))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, fullname, email, phone, password, created_at
                 FROM users
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        fullname: row.get(1)?,
                        email: row.get(2)?,
                        phone: row.get(3)?,
                        password: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Lost items --

    #[allow(clippy::too_many_arguments)]
    pub fn insert_lost_item(
        &self,
        id: &str,
        owner_name: &str,
        item_name: &str,
        image: Option<&str>,
        location: &str,
        date_lost: &str,
        contact_no: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO lost_items (id, owner_name, item_name, image, location, date_lost, contact_no)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![id, owner_name, item_name, image, location, date_lost, contact_no],
            )?;
            Ok(())
        })
    }

    pub fn list_lost_items(&self) -> Result<Vec<LostItemRow>> {
        self.with_conn(|conn| {
            query_lost_items(
                conn,
                "SELECT id, owner_name, item_name, image, location, date_lost, contact_no, created_at
                 FROM lost_items
                 ORDER BY created_at DESC, rowid DESC",
            )
        })
    }

    pub fn count_lost_items(&self) -> Result<u64> {
        self.with_conn(|conn| count_table(conn, "SELECT COUNT(*) FROM lost_items"))
    }

    /// The `limit` newest lost items by the date the item was lost.
    pub fn recent_lost_items(&self, limit: u32) -> Result<Vec<LostItemRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_name, item_name, image, location, date_lost, contact_no, created_at
                 FROM lost_items
                 ORDER BY date_lost DESC, rowid DESC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], map_lost_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Found items --

    #[allow(clippy::too_many_arguments)]
    pub fn insert_found_item(
        &self,
        id: &str,
        finder_name: &str,
        item_name: &str,
        image: Option<&str>,
        location: &str,
        date_found: &str,
        contact_no: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO found_items (id, finder_name, item_name, image, location, date_found, contact_no)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![id, finder_name, item_name, image, location, date_found, contact_no],
            )?;
            Ok(())
        })
    }

    pub fn list_found_items(&self) -> Result<Vec<FoundItemRow>> {
        self.with_conn(|conn| {
            query_found_items(
                conn,
                "SELECT id, finder_name, item_name, image, location, date_found, contact_no, created_at
                 FROM found_items
                 ORDER BY created_at DESC, rowid DESC",
            )
        })
    }

    pub fn count_found_items(&self) -> Result<u64> {
        self.with_conn(|conn| count_table(conn, "SELECT COUNT(*) FROM found_items"))
    }

    /// The `limit` newest found items by the date the item was found.
    pub fn recent_found_items(&self, limit: u32) -> Result<Vec<FoundItemRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, finder_name, item_name, image, location, date_found, contact_no, created_at
                 FROM found_items
                 ORDER BY date_found DESC, rowid DESC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], map_found_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Verification requests --

    pub fn insert_verification(
        &self,
        id: &str,
        item_id: &str,
        item_name: &str,
        username: &str,
        description: &str,
        invoice: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO verification_requests (id, item_id, item_name, username, description, invoice)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, item_id, item_name, username, description, invoice],
            )?;
            Ok(())
        })
    }

    /// Pending requests joined with their found-item details, newest first.
    pub fn list_pending_verifications(&self) -> Result<Vec<PendingVerificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT v.id, f.id, v.item_name, f.finder_name, f.location, f.date_found,
                        f.contact_no, f.image, v.username, v.description, v.request_date
                 FROM verification_requests v
                 LEFT JOIN found_items f ON f.id = v.item_id
                 WHERE v.status = 'pending'
                 ORDER BY v.request_date DESC, v.rowid DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(PendingVerificationRow {
                        verification_id: row.get(0)?,
                        found_id: row.get(1)?,
                        item_name: row.get(2)?,
                        finder_name: row.get(3)?,
                        location: row.get(4)?,
                        date_found: row.get(5)?,
                        contact_no: row.get(6)?,
                        image: row.get(7)?,
                        username: row.get(8)?,
                        description: row.get(9)?,
                        request_date: row.get(10)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Transition a pending request to `accepted` or `rejected`.
    ///
    /// The lookup and status update run in one transaction, so exactly one
    /// caller can ever decide a given request. Returns None when the request
    /// does not exist or has already been decided.
    pub fn decide_verification(
        &self,
        id: &str,
        status: &str,
    ) -> Result<Option<DecidedVerification>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let pending = tx
                .query_row(
                    "SELECT username, item_name FROM verification_requests
                     WHERE id = ?1 AND status = 'pending'",
                    [id],
                    |row| {
                        Ok(DecidedVerification {
                            username: row.get(0)?,
                            item_name: row.get(1)?,
                        })
                    },
                )
                .optional()?;

            let Some(decided) = pending else {
                return Ok(None);
            };

            tx.execute(
                "UPDATE verification_requests
                 SET status = ?1, decided_at = datetime('now')
                 WHERE id = ?2",
                rusqlite::params![status, id],
            )?;
            tx.commit()?;

            Ok(Some(decided))
        })
    }

    // -- Notifications --

    pub fn insert_notification(
        &self,
        id: &str,
        user_email: &str,
        kind: &str,
        message: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, user_email, type, message) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, user_email, kind, message],
            )?;
            Ok(())
        })
    }

    pub fn list_notifications(&self, user_email: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_email, type, message, is_read, created_at
                 FROM notifications
                 WHERE user_email = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_email], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        user_email: row.get(1)?,
                        kind: row.get(2)?,
                        message: row.get(3)?,
                        is_read: row.get::<_, i64>(4)? != 0,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Set the read flag. Idempotent: re-marking a read notification still
    /// matches the row and returns true. False means the id is unknown.
    pub fn mark_notification_read(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let affected = conn.execute("UPDATE notifications SET is_read = 1 WHERE id = ?1", [id])?;
            Ok(affected > 0)
        })
    }

    pub fn count_unread(&self, user_email: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE user_email = ?1 AND is_read = 0",
                [user_email],
                |row| row.get(0),
            )?;
            Ok(n as u64)
        })
    }

    // -- Analytics --

    /// Lost items whose `date_lost` falls in the given period.
    /// `month` is zero-padded ("05"), `year` four digits ("2024").
    pub fn count_lost_in_month(&self, year: &str, month: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM lost_items
                 WHERE strftime('%Y', date_lost) = ?1 AND strftime('%m', date_lost) = ?2",
                [year, month],
                |row| row.get(0),
            )?;
            Ok(n as u64)
        })
    }

    pub fn count_found_in_month(&self, year: &str, month: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM found_items
                 WHERE strftime('%Y', date_found) = ?1 AND strftime('%m', date_found) = ?2",
                [year, month],
                |row| row.get(0),
            )?;
            Ok(n as u64)
        })
    }

    /// Verification outcomes decided in the given period.
    pub fn count_decided_in_month(&self, status: &str, year: &str, month: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM verification_requests
                 WHERE status = ?1
                   AND decided_at IS NOT NULL
                   AND strftime('%Y', decided_at) = ?2
                   AND strftime('%m', decided_at) = ?3",
                [status, year, month],
                |row| row.get(0),
            )?;
            Ok(n as u64)
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, fullname, email, phone, password, created_at FROM users WHERE email = ?1",
    )?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                fullname: row.get(1)?,
                email: row.get(2)?,
                phone: row.get(3)?,
                password: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn count_table(conn: &Connection, sql: &str) -> Result<u64> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n as u64)
}

fn map_lost_row(row: &rusqlite::Row<'_>) -> std::result::Result<LostItemRow, rusqlite::Error> {
    Ok(LostItemRow {
        id: row.get(0)?,
        owner_name: row.get(1)?,
        item_name: row.get(2)?,
        image: row.get(3)?,
        location: row.get(4)?,
        date_lost: row.get(5)?,
        contact_no: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn map_found_row(row: &rusqlite::Row<'_>) -> std::result::Result<FoundItemRow, rusqlite::Error> {
    Ok(FoundItemRow {
        id: row.get(0)?,
        finder_name: row.get(1)?,
        item_name: row.get(2)?,
        image: row.get(3)?,
        location: row.get(4)?,
        date_found: row.get(5)?,
        contact_no: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn query_lost_items(conn: &Connection, sql: &str) -> Result<Vec<LostItemRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], map_lost_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_found_items(conn: &Connection, sql: &str) -> Result<Vec<FoundItemRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], map_found_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use uuid::Uuid;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let db = test_db();
        db.create_user(&new_id(), "Asha Rao", "asha@example.com", "555-0101", "hash-a")
            .unwrap();

        let err = db.create_user(&new_id(), "Imposter", "asha@example.com", "555-0102", "hash-b");
        assert!(err.is_err());
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn test_update_password_unknown_email() {
        let db = test_db();
        assert!(!db.update_password("nobody@example.com", "hash").unwrap());

        db.create_user(&new_id(), "Asha Rao", "asha@example.com", "555-0101", "old")
            .unwrap();
        assert!(db.update_password("asha@example.com", "new").unwrap());
        let user = db.get_user_by_email("asha@example.com").unwrap().unwrap();
        assert_eq!(user.password, "new");
    }

    #[test]
    fn test_verification_single_transition() {
        let db = test_db();
        let id = new_id();
        db.insert_verification(&id, &new_id(), "Black Umbrella", "asha@example.com", "left on bus", None)
            .unwrap();

        let decided = db.decide_verification(&id, "accepted").unwrap();
        let decided = decided.expect("first decision should find the pending row");
        assert_eq!(decided.username, "asha@example.com");
        assert_eq!(decided.item_name, "Black Umbrella");

        // second attempt, either way, sees no pending row
        assert!(db.decide_verification(&id, "accepted").unwrap().is_none());
        assert!(db.decide_verification(&id, "rejected").unwrap().is_none());
    }

    #[test]
    fn test_decide_unknown_request() {
        let db = test_db();
        assert!(db.decide_verification(&new_id(), "rejected").unwrap().is_none());
    }

    #[test]
    fn test_pending_list_excludes_decided() {
        let db = test_db();
        let keep = new_id();
        let gone = new_id();
        db.insert_verification(&keep, &new_id(), "Wallet", "a@example.com", "brown leather", None)
            .unwrap();
        db.insert_verification(&gone, &new_id(), "Keys", "b@example.com", "three keys", None)
            .unwrap();

        db.decide_verification(&gone, "rejected").unwrap();

        let pending = db.list_pending_verifications().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].verification_id, keep);
        // no found item inserted, so the join columns are empty
        assert!(pending[0].finder_name.is_none());
    }

    #[test]
    fn test_pending_list_joins_found_item() {
        let db = test_db();
        let item = new_id();
        db.insert_found_item(&item, "Ravi", "Wallet", Some("/uploads/w.jpg"), "Library", "2024-05-03", "555-0199")
            .unwrap();
        db.insert_verification(&new_id(), &item, "Wallet", "a@example.com", "brown leather", None)
            .unwrap();

        let pending = db.list_pending_verifications().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].found_id.as_deref(), Some(item.as_str()));
        assert_eq!(pending[0].finder_name.as_deref(), Some("Ravi"));
        assert_eq!(pending[0].image.as_deref(), Some("/uploads/w.jpg"));
    }

    #[test]
    fn test_notification_read_idempotent() {
        let db = test_db();
        let id = new_id();
        db.insert_notification(&id, "asha@example.com", "accept", "Your request was accepted.")
            .unwrap();
        assert_eq!(db.count_unread("asha@example.com").unwrap(), 1);

        assert!(db.mark_notification_read(&id).unwrap());
        assert_eq!(db.count_unread("asha@example.com").unwrap(), 0);

        // marking again is a no-op success and the flag stays set
        assert!(db.mark_notification_read(&id).unwrap());
        let list = db.list_notifications("asha@example.com").unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].is_read);
    }

    #[test]
    fn test_mark_read_unknown_id() {
        let db = test_db();
        assert!(!db.mark_notification_read(&new_id()).unwrap());
    }

    #[test]
    fn test_unread_count_scoped_to_recipient() {
        let db = test_db();
        db.insert_notification(&new_id(), "a@example.com", "accept", "m1").unwrap();
        db.insert_notification(&new_id(), "a@example.com", "reject", "m2").unwrap();
        db.insert_notification(&new_id(), "b@example.com", "accept", "m3").unwrap();

        assert_eq!(db.count_unread("a@example.com").unwrap(), 2);
        assert_eq!(db.count_unread("b@example.com").unwrap(), 1);
        assert_eq!(db.count_unread("c@example.com").unwrap(), 0);
    }

    #[test]
    fn test_notifications_newest_first() {
        let db = test_db();
        db.insert_notification(&new_id(), "a@example.com", "accept", "first").unwrap();
        db.insert_notification(&new_id(), "a@example.com", "reject", "second").unwrap();

        let list = db.list_notifications("a@example.com").unwrap();
        assert_eq!(list[0].message, "second");
        assert_eq!(list[1].message, "first");
    }

    #[test]
    fn test_recent_items_limit_and_order() {
        let db = test_db();
        db.insert_lost_item(&new_id(), "A", "Phone", None, "Park", "2024-05-01", "1").unwrap();
        db.insert_lost_item(&new_id(), "B", "Bag", None, "Gym", "2024-04-20", "2").unwrap();
        db.insert_lost_item(&new_id(), "C", "Hat", None, "Cafe", "2024-05-10", "3").unwrap();

        let recent = db.recent_lost_items(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].date_lost, "2024-05-10");
        assert_eq!(recent[1].date_lost, "2024-05-01");
    }

    #[test]
    fn test_analytics_zero_for_empty_period() {
        let db = test_db();
        assert_eq!(db.count_lost_in_month("2024", "05").unwrap(), 0);
        assert_eq!(db.count_found_in_month("2024", "05").unwrap(), 0);
        assert_eq!(db.count_decided_in_month("accepted", "2024", "05").unwrap(), 0);
    }

    #[test]
    fn test_analytics_counts_by_period() {
        let db = test_db();
        db.insert_lost_item(&new_id(), "A", "Phone", None, "Park", "2024-05-01", "1").unwrap();
        db.insert_lost_item(&new_id(), "B", "Bag", None, "Gym", "2024-06-02", "2").unwrap();
        db.insert_found_item(&new_id(), "C", "Hat", None, "Cafe", "2024-05-20", "3").unwrap();

        let accepted = new_id();
        db.insert_verification(&accepted, &new_id(), "Hat", "a@example.com", "mine", None).unwrap();
        db.decide_verification(&accepted, "accepted").unwrap();

        assert_eq!(db.count_lost_in_month("2024", "05").unwrap(), 1);
        assert_eq!(db.count_lost_in_month("2024", "06").unwrap(), 1);
        assert_eq!(db.count_found_in_month("2024", "05").unwrap(), 1);

        // decided today, so the current period sees it and 2024-05 may not
        let rejected_count = db.count_decided_in_month("rejected", "2024", "05").unwrap();
        assert_eq!(rejected_count, 0);
    }
}
