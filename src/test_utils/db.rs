use rusqlite::Connection;

use crate::{
    auth::ProviderUser,
    db::initialize,
    user::{UserID, get_or_create_user},
};

pub(crate) fn get_test_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    initialize(&conn).unwrap();
    conn
}

/// Create a user with a unique provider ID and return their ID.
pub(crate) fn create_test_user(conn: &Connection) -> UserID {
    let count: i64 = conn
        .query_row("SELECT COUNT(id) FROM user", [], |row| row.get(0))
        .unwrap();
    let profile = ProviderUser {
        provider_id: format!("test-{count}"),
        username: "Test".to_owned(),
        email: "test@example.com".to_owned(),
        avatar: None,
    };

    get_or_create_user("test", &profile, conn).unwrap().id
}
