#![cfg(feature = "sqlite")]

use rowbench::{ArgValue, DmlChange, Driver, DriverError, connect};
use tokio::runtime::Runtime;

async fn seeded_driver() -> Result<Box<dyn Driver>, Box<dyn std::error::Error>> {
    let mut driver = connect("sqlite://:memory:").await?;
    driver
        .execute_dml_statement(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
        )
        .await?;
    for id in 1..=10 {
        driver
            .execute_dml_statement(&format!("INSERT INTO users VALUES ({id}, 'user{id}')"))
            .await?;
    }
    Ok(driver)
}

async fn names_by_id(
    driver: &mut Box<dyn Driver>,
) -> Result<Vec<(String, String)>, Box<dyn std::error::Error>> {
    let (rows, _) = driver.get_records("main", "users", "", "id", 0, 100).await?;
    Ok(rows[1..]
        .iter()
        .map(|row| (row[0].clone(), row[1].clone()))
        .collect())
}

#[test]
fn update_changes_exactly_the_identified_row() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;

    rt.block_on(async {
        let mut driver = seeded_driver().await?;

        let change = DmlChange::update(
            "main",
            "users",
            vec![("name".into(), ArgValue::from("Ada"))],
            vec![("id".into(), ArgValue::from("7"))],
        );
        driver.execute_pending_changes(&[change]).await?;

        for (id, name) in names_by_id(&mut driver).await? {
            if id == "7" {
                assert_eq!(name, "Ada");
            } else {
                assert_eq!(name, format!("user{id}"));
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

#[test]
fn batch_applies_in_input_order() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;

    rt.block_on(async {
        let mut driver = seeded_driver().await?;

        let changes = vec![
            DmlChange::insert(
                "main",
                "users",
                vec![
                    ("id".into(), ArgValue::Int(11)),
                    ("name".into(), ArgValue::from("new")),
                ],
            ),
            DmlChange::update(
                "main",
                "users",
                vec![("name".into(), ArgValue::from("renamed"))],
                vec![("id".into(), ArgValue::Int(11))],
            ),
            DmlChange::delete("main", "users", vec![("id".into(), ArgValue::Int(1))]),
        ];
        driver.execute_pending_changes(&changes).await?;

        let names = names_by_id(&mut driver).await?;
        assert_eq!(names.len(), 10);
        assert!(!names.iter().any(|(id, _)| id == "1"));
        assert!(names.contains(&("11".to_string(), "renamed".to_string())));
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

#[test]
fn failing_batch_leaves_no_trace() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;

    rt.block_on(async {
        let mut driver = seeded_driver().await?;
        let before = names_by_id(&mut driver).await?;

        let changes = vec![
            DmlChange::insert(
                "main",
                "users",
                vec![
                    ("id".into(), ArgValue::Int(11)),
                    ("name".into(), ArgValue::from("new")),
                ],
            ),
            DmlChange::update(
                "main",
                "users",
                vec![("name".into(), ArgValue::from("Ada"))],
                vec![("id".into(), ArgValue::Int(2))],
            ),
            // NOT NULL violation through the NULL keyword passthrough
            DmlChange::update(
                "main",
                "users",
                vec![("name".into(), ArgValue::from("NULL"))],
                vec![("id".into(), ArgValue::Int(3))],
            ),
        ];

        let err = driver.execute_pending_changes(&changes).await.unwrap_err();
        assert!(matches!(err, DriverError::Transaction(_)));
        assert!(err.is_rollback());

        assert_eq!(names_by_id(&mut driver).await?, before);
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

#[test]
fn preview_text_matches_the_executed_statement() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;

    rt.block_on(async {
        let mut driver = seeded_driver().await?;

        let change = DmlChange::update(
            "main",
            "users",
            vec![("name".into(), ArgValue::from("O'Brien"))],
            vec![("id".into(), ArgValue::from("4"))],
        );
        let preview = driver.dml_change_to_query_string(&change)?;
        assert_eq!(
            preview,
            "UPDATE `users` SET `name` = 'O''Brien' WHERE `id` = '4'"
        );

        // Executing the preview text verbatim and executing the staged
        // change are the same operation.
        driver.execute_pending_changes(&[change]).await?;
        let names = names_by_id(&mut driver).await?;
        assert!(names.contains(&("4".to_string(), "O'Brien".to_string())));
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

#[test]
fn update_without_primary_key_never_reaches_the_engine()
-> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;

    rt.block_on(async {
        let mut driver = seeded_driver().await?;
        let before = names_by_id(&mut driver).await?;

        let change = DmlChange::update(
            "main",
            "users",
            vec![("name".into(), ArgValue::from("Ada"))],
            vec![],
        );
        let err = driver.execute_pending_changes(&[change]).await.unwrap_err();
        assert!(matches!(err, DriverError::Validation(_)));

        assert_eq!(names_by_id(&mut driver).await?, before);
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
