use chrono::NaiveDate;
use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    F64(f64),
    Date(NaiveDate),
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    table: &'static str,
    id_column: &'static str,
    columns: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl SqlUpdate {
    pub fn new(table: &'static str, id_column: &'static str) -> Self {
        Self {
            table,
            id_column,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Adds `column = ?` when a value is present. Column names are always
    /// compile-time literals, never user input.
    pub fn set(mut self, column: &'static str, value: Option<SqlValue>) -> Self {
        if let Some(value) = value {
            self.columns.push(column);
            self.values.push(value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn sql(&self) -> String {
        let set_clause = self
            .columns
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "UPDATE {} SET {} WHERE {} = ?",
            self.table, set_clause, self.id_column
        )
    }
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(
    pool: &MySqlPool,
    update: SqlUpdate,
    id_value: u64,
) -> Result<u64, sqlx::Error> {
    let sql = update.sql();
    let mut query = sqlx::query(&sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
        };
    }

    let result = query.bind(id_value).execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_present_values_become_assignments() {
        let update = SqlUpdate::new("employees", "id")
            .set("full_name", Some(SqlValue::String("Jane".into())))
            .set("phone", None)
            .set("salary", Some(SqlValue::F64(1.5)));

        assert_eq!(
            update.sql(),
            "UPDATE employees SET full_name = ?, salary = ? WHERE id = ?"
        );
        assert_eq!(update.values.len(), 2);
    }

    #[test]
    fn nothing_set_is_empty() {
        let update = SqlUpdate::new("employees", "id").set("phone", None);
        assert!(update.is_empty());
    }
}
