#![cfg(feature = "sqlite")]

use rowbench::{
    DEFAULT_ROW_LIMIT, Driver, DriverError, EMPTY_CELL, NULL_CELL, Provider, connect,
};
use tokio::runtime::Runtime;

#[test]
fn sqlite_driver_contract() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;

    rt.block_on(async {
        let mut driver = connect("sqlite://:memory:").await?;
        assert_eq!(driver.provider(), Provider::Sqlite);

        driver
            .execute_dml_statement(
                "CREATE TABLE users (
                     id INTEGER PRIMARY KEY,
                     name TEXT,
                     email TEXT UNIQUE,
                     score REAL
                 )",
            )
            .await?;

        for (id, name, email, score) in [
            (1, "'ada'", "'ada@example.com'", "3.5"),
            (2, "''", "'empty@example.com'", "NULL"),
            (3, "NULL", "'null@example.com'", "2.0"),
        ] {
            let result = driver
                .execute_dml_statement(&format!(
                    "INSERT INTO users VALUES ({id}, {name}, {email}, {score})"
                ))
                .await?;
            assert_eq!(result, "1 rows affected");
        }

        // Navigation
        assert_eq!(driver.get_databases().await?, vec!["main"]);
        let tables = driver.get_tables("main").await?;
        assert_eq!(tables["main"], vec!["users"]);

        let columns = driver.get_table_columns("main", "users").await?;
        assert_eq!(columns[0][0], "name");
        assert_eq!(columns.len(), 5); // header + four columns

        assert_eq!(
            driver.get_primary_key_column_names("main", "users").await?,
            vec!["id"]
        );

        let indexes = driver.get_indexes("main", "users").await?;
        assert_eq!(
            indexes[0],
            vec!["INDEX_NAME", "COLUMN_NAME", "NON_UNIQUE", "INDEX_TYPE"]
        );

        // Records: sentinel convention and both result halves
        let (rows, total) = driver.get_records("main", "users", "", "id", 0, 10).await?;
        assert_eq!(total, 3);
        assert_eq!(rows[0], vec!["id", "name", "email", "score"]);
        assert_eq!(rows[1][1], "ada");
        assert_eq!(rows[2][1], EMPTY_CELL);
        assert_eq!(rows[2][3], NULL_CELL);
        assert_eq!(rows[3][1], NULL_CELL);

        // Verbatim where fragment, wrapped sort fragment
        let (rows, _) = driver
            .get_records("main", "users", "WHERE id > 1", "id DESC", 0, 10)
            .await?;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], "3");

        // Pagination window does not change the reported total
        let (rows, total) = driver.get_records("main", "users", "", "id", 1, 1).await?;
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "2");

        // Arbitrary reads prepend the header
        let (rows, count) = driver
            .execute_query("SELECT name FROM users WHERE id = 1")
            .await?;
        assert_eq!(count, 1);
        assert_eq!(rows[0], vec!["name"]);
        assert_eq!(rows[1], vec!["ada"]);

        // Validation errors for empty names
        assert!(matches!(
            driver.get_tables("").await,
            Err(DriverError::Validation(_))
        ));
        assert!(matches!(
            driver.get_table_columns("main", "").await,
            Err(DriverError::Validation(_))
        ));
        assert!(matches!(
            driver.get_records("", "users", "", "", 0, 0).await,
            Err(DriverError::Validation(_))
        ));

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

#[test]
fn zero_limit_pages_at_the_shared_default() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;

    rt.block_on(async {
        let mut driver = connect("sqlite://:memory:").await?;
        driver
            .execute_dml_statement("CREATE TABLE n (id INTEGER PRIMARY KEY)")
            .await?;
        for id in 1..=(DEFAULT_ROW_LIMIT + 10) {
            driver
                .execute_dml_statement(&format!("INSERT INTO n VALUES ({id})"))
                .await?;
        }

        let (rows, total) = driver.get_records("main", "n", "", "id", 0, 0).await?;
        assert_eq!(total, DEFAULT_ROW_LIMIT + 10);
        assert_eq!(rows.len() - 1, DEFAULT_ROW_LIMIT);

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

#[test]
fn file_backed_database_connects_by_url() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("rowbench.db");

    rt.block_on(async {
        let url = format!("sqlite://{}", path.display());
        let mut driver = connect(&url).await?;
        driver
            .execute_dml_statement("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .await?;
        assert_eq!(driver.get_tables("main").await?["main"], vec!["t"]);
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    assert!(path.exists());
    Ok(())
}
