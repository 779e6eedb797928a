use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Bootcamp {
    pub id: i64,
    pub name: String,
    pub description: String,
}
