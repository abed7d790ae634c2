use crate::db::error::DbError;

/// The fixed set of `users` columns addressable by filters and updates.
///
/// Field names coming in at runtime are resolved against this enum instead
/// of being spliced into SQL, so an unrecognized name fails before any
/// query is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Id,
    Email,
    HashedPassword,
    SessionId,
    ResetToken,
}

impl UserField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(UserField::Id),
            "email" => Some(UserField::Email),
            "hashed_password" => Some(UserField::HashedPassword),
            "session_id" => Some(UserField::SessionId),
            "reset_token" => Some(UserField::ResetToken),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            UserField::Id => "id",
            UserField::Email => "email",
            UserField::HashedPassword => "hashed_password",
            UserField::SessionId => "session_id",
            UserField::ResetToken => "reset_token",
        }
    }
}

/// A value a filter term compares against. `Null` matches rows where the
/// column is SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Int(i64),
    Text(String),
    Null,
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Int(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

impl From<Option<String>> for FilterValue {
    fn from(v: Option<String>) -> Self {
        match v {
            Some(s) => FilterValue::Text(s),
            None => FilterValue::Null,
        }
    }
}

/// Conjunctive filter over `users`. Terms are ANDed in insertion order.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub(crate) terms: Vec<(UserField, FilterValue)>,
}

impl UserFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from runtime field names, validating each name
    /// against [`UserField`] before anything touches the store. Fails fast
    /// on the first unrecognized name.
    pub fn from_named<I, S>(pairs: I) -> Result<Self, DbError>
    where
        I: IntoIterator<Item = (S, FilterValue)>,
        S: AsRef<str>,
    {
        let mut filter = UserFilter::new();
        for (name, value) in pairs {
            let field = UserField::parse(name.as_ref())
                .ok_or_else(|| DbError::InvalidFilter(name.as_ref().to_string()))?;
            filter.terms.push((field, value));
        }
        Ok(filter)
    }

    pub fn id(mut self, id: i64) -> Self {
        self.terms.push((UserField::Id, FilterValue::Int(id)));
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.terms.push((UserField::Email, email.into()));
        self
    }

    pub fn session_id(mut self, session_id: Option<&str>) -> Self {
        self.terms.push((
            UserField::SessionId,
            session_id.map(str::to_string).into(),
        ));
        self
    }

    pub fn reset_token(mut self, reset_token: Option<&str>) -> Self {
        self.terms.push((
            UserField::ResetToken,
            reset_token.map(str::to_string).into(),
        ));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Pending assignments for `update_user`. `id` is immutable and deliberately
/// has no setter; naming it through [`UserUpdate::from_named`] is rejected
/// the same way an unknown field is.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub(crate) email: Option<String>,
    pub(crate) hashed_password: Option<String>,
    pub(crate) session_id: Option<Option<String>>,
    pub(crate) reset_token: Option<Option<String>>,
}

impl UserUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an update from runtime field names. Every name is validated
    /// before the caller gets a chance to execute anything, so a single bad
    /// name means no assignment reaches the store at all.
    pub fn from_named<I, S>(pairs: I) -> Result<Self, DbError>
    where
        I: IntoIterator<Item = (S, FilterValue)>,
        S: AsRef<str>,
    {
        let mut update = UserUpdate::new();
        for (name, value) in pairs {
            let field = UserField::parse(name.as_ref())
                .ok_or_else(|| DbError::InvalidField(name.as_ref().to_string()))?;
            match (field, value) {
                (UserField::Email, FilterValue::Text(v)) => update.email = Some(v),
                (UserField::HashedPassword, FilterValue::Text(v)) => {
                    update.hashed_password = Some(v)
                }
                (UserField::SessionId, FilterValue::Text(v)) => {
                    update.session_id = Some(Some(v))
                }
                (UserField::SessionId, FilterValue::Null) => update.session_id = Some(None),
                (UserField::ResetToken, FilterValue::Text(v)) => {
                    update.reset_token = Some(Some(v))
                }
                (UserField::ResetToken, FilterValue::Null) => update.reset_token = Some(None),
                (field, _) => {
                    return Err(DbError::InvalidField(field.column().to_string()));
                }
            }
        }
        Ok(update)
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn hashed_password(mut self, hash: &str) -> Self {
        self.hashed_password = Some(hash.to_string());
        self
    }

    pub fn session_id(mut self, session_id: Option<&str>) -> Self {
        self.session_id = Some(session_id.map(str::to_string));
        self
    }

    pub fn reset_token(mut self, reset_token: Option<&str>) -> Self {
        self.reset_token = Some(reset_token.map(str::to_string));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.hashed_password.is_none()
            && self.session_id.is_none()
            && self.reset_token.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_every_column() {
        for name in ["id", "email", "hashed_password", "session_id", "reset_token"] {
            let field = UserField::parse(name).expect("known column");
            assert_eq!(field.column(), name);
        }
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert!(UserField::parse("password").is_none());
        assert!(UserField::parse("Email").is_none());
        assert!(UserField::parse("").is_none());
    }

    #[test]
    fn filter_from_named_rejects_unknown_field() {
        let err = UserFilter::from_named([("no_such_column", FilterValue::Int(1))]).unwrap_err();
        match err {
            DbError::InvalidFilter(name) => assert_eq!(name, "no_such_column"),
            other => panic!("expected InvalidFilter, got {other:?}"),
        }
    }

    #[test]
    fn filter_from_named_fails_fast_on_first_bad_name() {
        let err = UserFilter::from_named([
            ("bogus", FilterValue::Int(1)),
            ("email", FilterValue::Text("a@b.c".into())),
        ])
        .unwrap_err();
        assert!(matches!(err, DbError::InvalidFilter(name) if name == "bogus"));
    }

    #[test]
    fn typed_filter_builders_accumulate_terms() {
        let filter = UserFilter::new().email("alice@example.com").session_id(None);
        assert_eq!(filter.terms.len(), 2);
        assert_eq!(filter.terms[0].0, UserField::Email);
        assert_eq!(filter.terms[1].1, FilterValue::Null);
    }

    #[test]
    fn update_from_named_rejects_unknown_field() {
        let err =
            UserUpdate::from_named([("no_such_column", FilterValue::Text("x".into()))])
                .unwrap_err();
        assert!(matches!(err, DbError::InvalidField(name) if name == "no_such_column"));
    }

    #[test]
    fn update_from_named_rejects_id() {
        let err = UserUpdate::from_named([("id", FilterValue::Int(7))]).unwrap_err();
        assert!(matches!(err, DbError::InvalidField(name) if name == "id"));
    }

    #[test]
    fn update_from_named_rejects_null_for_non_nullable_column() {
        let err = UserUpdate::from_named([("email", FilterValue::Null)]).unwrap_err();
        assert!(matches!(err, DbError::InvalidField(name) if name == "email"));
    }

    #[test]
    fn update_from_named_accepts_nullable_columns() {
        let update = UserUpdate::from_named([
            ("session_id", FilterValue::Null),
            ("reset_token", FilterValue::Text("tok".into())),
        ])
        .expect("valid update");
        assert_eq!(update.session_id, Some(None));
        assert_eq!(update.reset_token, Some(Some("tok".into())));
    }

    #[test]
    fn empty_update_is_empty() {
        assert!(UserUpdate::new().is_empty());
        assert!(!UserUpdate::new().session_id(None).is_empty());
    }
}
