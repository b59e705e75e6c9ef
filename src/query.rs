use std::fmt;
use std::str::FromStr;

use rusqlite::types::ToSql;
use rusqlite::{Connection, ParamsFromIter, Statement};
use serde::Serialize;

use crate::error::Error;
use crate::store::UserId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Scope {
    All,
    Listened,
}

impl Default for Scope {
    fn default() -> Scope {
        Scope::All
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Scope, Error> {
        match s {
            "all" => Ok(Scope::All),
            "listened" => Ok(Scope::Listened),
            other => Err(Error::InvalidScope(other.to_string())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scope::All => write!(f, "all"),
            Scope::Listened => write!(f, "listened"),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumFilter {
    pub only_favorites: bool,
    pub only_wishlist: bool,
}

impl AlbumFilter {
    pub fn new(only_favorites: bool, only_wishlist: bool) -> AlbumFilter {
        AlbumFilter {
            only_favorites,
            only_wishlist,
        }
    }
}

pub struct QueryOptions {
    joins: Vec<String>,
    clauses: Vec<String>,
    values: Vec<Box<dyn ToSql>>,
    order_string: Option<String>,
    limit: Option<i64>,
}

impl QueryOptions {
    pub fn new() -> QueryOptions {
        QueryOptions {
            joins: Vec::new(),
            clauses: Vec::new(),
            values: Vec::new(),
            order_string: None,
            limit: None,
        }
    }

    /// Join clauses must not bind values; their placeholders would precede
    /// the ones in WHERE.
    pub fn join(&mut self, join: &str) {
        self.joins.push(join.to_string());
    }

    pub fn filter(&mut self, clause: &str) {
        self.clauses.push(clause.to_string());
    }

    pub fn filter_value<T>(&mut self, clause: &str, value: T)
    where
        T: ToSql,
        T: 'static,
    {
        self.clauses.push(clause.to_string());
        self.values.push(Box::new(value));
    }

    pub fn order_string(&mut self, order_string: &str) {
        self.order_string = Some(order_string.to_string());
    }

    pub fn limit(&mut self, limit: i64) {
        self.limit = Some(limit);
    }

    pub fn joins(&self) -> &[String] {
        &self.joins
    }

    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    fn push_from_where(&self, sql: &mut String) {
        for join in &self.joins {
            *sql += " ";
            *sql += join;
        }

        if !self.clauses.is_empty() {
            *sql += " WHERE ";
            *sql += &self.clauses.join(" AND ");
        }
    }

    pub fn sql(&self, select_from: &str) -> String {
        let mut sql = select_from.to_string();

        self.push_from_where(&mut sql);

        if let Some(order) = &self.order_string {
            sql += " ORDER BY ";
            sql += order;
        }

        if let Some(limit) = self.limit {
            sql += &format!(" LIMIT {}", limit);
        }

        sql
    }

    pub fn params(&self) -> ParamsFromIter<std::slice::Iter<'_, Box<dyn ToSql>>> {
        rusqlite::params_from_iter(self.values.iter())
    }

    pub fn get_total(&self, conn: &Connection, select_from: &str) -> rusqlite::Result<i64> {
        let mut sql = select_from.to_string();

        self.push_from_where(&mut sql);

        let mut st = conn.prepare(&sql)?;

        st.query_row(self.params(), |row| row.get(0))
    }

    pub fn prepare<'a>(
        &self,
        conn: &'a Connection,
        select_from: &str,
    ) -> rusqlite::Result<Statement<'a>> {
        let sql = self.sql(select_from);
        trace!("prepare {}", sql);
        conn.prepare(&sql)
    }
}

/// Predicate over `Album` for a scope and filters. Joins `UserAlbum` once,
/// restricted to `user`, only when some predicate needs it; all predicates
/// are ANDed. Builds SQL only, nothing is executed.
pub fn album_query(user: UserId, scope: Scope, filter: AlbumFilter) -> QueryOptions {
    let mut opts = QueryOptions::new();
    let mut state_clauses: Vec<&str> = Vec::new();

    if scope == Scope::Listened {
        state_clauses.push("UserAlbum.listened = 1");
    }

    if filter.only_favorites {
        state_clauses.push("UserAlbum.favorite = 1");
    }

    if filter.only_wishlist {
        state_clauses.push("UserAlbum.wishlist = 1");
    }

    if !state_clauses.is_empty() {
        opts.join("INNER JOIN UserAlbum ON UserAlbum.album_id = Album.album_id");
        opts.filter_value("UserAlbum.user_id = ?", user.0);

        for clause in state_clauses {
            opts.filter(clause);
        }
    }

    opts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_all_without_filters_has_no_join() {
        let opts = album_query(UserId::DEFAULT, Scope::All, AlbumFilter::default());

        assert!(opts.joins().is_empty());
        assert!(opts.clauses().is_empty());
        assert_eq!(
            opts.sql("SELECT Album.album_id FROM Album"),
            "SELECT Album.album_id FROM Album"
        );
    }

    #[test]
    fn combined_predicates_share_one_join() {
        let opts = album_query(UserId(7), Scope::Listened, AlbumFilter::new(true, true));

        assert_eq!(opts.joins().len(), 1);
        assert_eq!(
            opts.sql("SELECT Album.album_id FROM Album"),
            "SELECT Album.album_id FROM Album \
             INNER JOIN UserAlbum ON UserAlbum.album_id = Album.album_id \
             WHERE UserAlbum.user_id = ? AND UserAlbum.listened = 1 \
             AND UserAlbum.favorite = 1 AND UserAlbum.wishlist = 1"
        );
    }

    #[test]
    fn favorites_filter_alone_requires_user_state() {
        let opts = album_query(UserId::DEFAULT, Scope::All, AlbumFilter::new(true, false));

        assert_eq!(opts.joins().len(), 1);
        assert_eq!(
            opts.clauses(),
            &["UserAlbum.user_id = ?".to_string(), "UserAlbum.favorite = 1".to_string()]
        );
    }

    #[test]
    fn order_and_limit_are_appended() {
        let mut opts = album_query(UserId::DEFAULT, Scope::All, AlbumFilter::default());
        opts.filter_value("Album.album_id > ?", 3i64);
        opts.order_string("Album.album_id ASC");
        opts.limit(1);

        assert_eq!(
            opts.sql("SELECT Album.album_id FROM Album"),
            "SELECT Album.album_id FROM Album WHERE Album.album_id > ? \
             ORDER BY Album.album_id ASC LIMIT 1"
        );
    }

    #[test]
    fn scope_parses_known_names_only() {
        assert_eq!("all".parse::<Scope>().unwrap(), Scope::All);
        assert_eq!("listened".parse::<Scope>().unwrap(), Scope::Listened);
        assert!(matches!(
            "not_listened".parse::<Scope>(),
            Err(Error::InvalidScope(_))
        ));
    }
}
