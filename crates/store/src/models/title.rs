/// A row of the global title dedup table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TitleEntry {
    pub raw_key: i64,
    pub raw: String,
    pub normalized_key: i64,
}
