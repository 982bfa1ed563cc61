//! Tests for the core types

use super::*;

mod value_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_params_macro_converts_each_argument() {
        let account = String::from("alice");
        let values = params![&account, 7_i64, 2.5_f64, true, None::<i64>];

        assert_eq!(
            values,
            vec![
                Value::String("alice".into()),
                Value::Int64(7),
                Value::Float64(2.5),
                Value::Bool(true),
                Value::Null,
            ]
        );
    }

    #[test]
    fn test_params_macro_empty() {
        let values = params![];
        assert!(values.is_empty());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Bytes(vec![1, 2, 3]).to_string(), "<3 bytes>");
        assert_eq!(Value::from("pw").to_string(), "pw");
    }

    #[test]
    fn test_value_serialization() {
        let value = Value::from("a@x.com");
        let json = serde_json::to_string(&value).expect("serialize");
        let back: Value = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, value);
    }
}

mod row_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user_row() -> Row {
        Row::new(vec![
            Value::Int64(1),
            Value::from("alice"),
            Value::Null,
            Value::from("3.5"),
        ])
    }

    #[test]
    fn test_row_positions_are_one_based() {
        let row = user_row();
        assert_eq!(row.len(), 4);
        assert!(!row.is_empty());
        assert_eq!(row.get::<i64>(1).unwrap(), 1);
        assert_eq!(row.get::<String>(2).unwrap(), "alice");
        assert_eq!(row.get::<Option<String>>(3).unwrap(), None);
    }

    #[test]
    fn test_row_position_zero_is_rejected() {
        let err = user_row().value(0).unwrap_err();
        assert_eq!(err.kind(), DriverErrorKind::Mapping);
        assert!(err.message().contains("out of range"));
    }

    #[test]
    fn test_row_position_past_end_is_rejected() {
        let row = user_row();
        assert!(row.get::<Value>(4).is_ok());
        assert!(row.get::<Value>(5).is_err());
    }

    #[test]
    fn test_row_type_mismatch() {
        let err = user_row().get::<i64>(2).unwrap_err();
        assert_eq!(err.kind(), DriverErrorKind::Mapping);
        assert_eq!(err.message(), "cannot read string value as i64");
    }

    #[test]
    fn test_null_into_non_optional_fails() {
        assert!(user_row().get::<String>(3).is_err());
    }

    #[test]
    fn test_i32_range_check() {
        let row = Row::new(vec![Value::Int64(i64::MAX)]);
        assert!(row.get::<i32>(1).is_err());
    }

    #[test]
    fn test_uuid_from_text() {
        let id = uuid::Uuid::new_v4();
        let row = Row::new(vec![Value::String(id.to_string())]);
        assert_eq!(row.get::<uuid::Uuid>(1).unwrap(), id);
    }

    #[test]
    fn test_datetime_from_sqlite_text() {
        let row = Row::new(vec![Value::from("2024-03-01 12:30:00")]);
        let dt = row.get::<chrono::NaiveDateTime>(1).unwrap();
        assert_eq!(dt.to_string(), "2024-03-01 12:30:00");
    }
}

mod mapper_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq)]
    struct Account {
        id: i64,
        name: String,
    }

    struct AccountMapper;

    impl RowMapper<Account> for AccountMapper {
        fn map_row(&self, row: &Row) -> DriverResult<Account> {
            Ok(Account {
                id: row.get(1)?,
                name: row.get(2)?,
            })
        }
    }

    #[test]
    fn test_struct_and_closure_mappers_agree() {
        let row = Row::new(vec![Value::Int64(9), Value::from("bob")]);
        let closure = |row: &Row| -> DriverResult<Account> {
            Ok(Account {
                id: row.get(1)?,
                name: row.get(2)?,
            })
        };

        assert_eq!(
            AccountMapper.map_row(&row).unwrap(),
            closure.map_row(&row).unwrap()
        );
    }
}

mod key_collector_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_keys_keep_insertion_order_and_duplicates() {
        let mut collector = KeyCollector::<i64>::new("id");
        collector.add_key(3);
        collector.add_key(1);
        collector.add_key(3);

        assert_eq!(collector.column_name(), "id");
        assert_eq!(collector.keys(), &[3, 1, 3]);
        assert_eq!(collector.into_keys(), vec![3, 1, 3]);
    }

    #[test]
    fn test_new_collector_is_empty() {
        let collector = KeyCollector::<Value>::new("id");
        assert!(collector.keys().is_empty());
    }
}

mod cursor_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_materialized_cursor_walks_in_order() {
        let mut cursor = MaterializedCursor::new(vec![
            Row::new(vec![Value::Int64(1)]),
            Row::new(vec![Value::Int64(2)]),
        ]);

        let mut seen = Vec::new();
        while let Some(row) = cursor.next_row().unwrap() {
            seen.push(row.get::<i64>(1).unwrap());
        }

        assert_eq!(seen, vec![1, 2]);
        assert_eq!(cursor.remaining(), 0);
        assert!(cursor.next_row().unwrap().is_none());
    }

    #[test]
    fn test_empty_cursor() {
        let mut cursor = MaterializedCursor::empty();
        assert!(cursor.next_row().unwrap().is_none());
    }

    #[test]
    fn test_key_request_column() {
        assert_eq!(KeyRequest::Column("id").column(), Some("id"));
        assert_eq!(KeyRequest::None.column(), None);
    }
}

mod config_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_from_json() {
        let config = ConnectionConfig::from_json(
            r#"{"driver":"sqlite","database":"app.db","params":{"foreign_keys":"off","busy_timeout_ms":"250"}}"#,
        )
        .expect("parse config");

        assert_eq!(config.driver, "sqlite");
        assert_eq!(config.get_string("path").as_deref(), Some("app.db"));
        assert_eq!(config.get_bool("foreign_keys"), Some(false));
        assert_eq!(config.get_u64("busy_timeout_ms"), Some(250));
    }

    #[test]
    fn test_config_params_override_fields() {
        let config = ConnectionConfig::new_sqlite("a.db").with_param("path", "b.db");
        assert_eq!(config.get_string("path").as_deref(), Some("b.db"));
        assert_eq!(config.get_string("database").as_deref(), Some("a.db"));
    }

    #[test]
    fn test_non_string_params_are_stringified() {
        let config = ConnectionConfig::new("sqlite")
            .with_param("busy_timeout_ms", 100)
            .with_param("foreign_keys", true);
        assert_eq!(config.get_u64("busy_timeout_ms"), Some(100));
        assert_eq!(config.get_bool("foreign_keys"), Some(true));
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        let err = ConnectionConfig::from_json("{").unwrap_err();
        assert!(matches!(err, SqlGateError::Serialization(_)));
    }
}

mod error_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error as _;

    #[test]
    fn test_execution_error_keeps_driver_cause() {
        let io = std::io::Error::other("disk gone");
        let driver = DriverError::with_source(DriverErrorKind::Execute, "step failed", io);
        let err = SqlGateError::execution("delete from users", driver);

        assert_eq!(
            err.to_string(),
            "Execution error for `delete from users`: execute failed: step failed"
        );
        let driver = err.driver_error().expect("driver error");
        assert_eq!(driver.kind(), DriverErrorKind::Execute);
        assert_eq!(driver.cause().unwrap().to_string(), "disk gone");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_non_execution_errors_have_no_driver_error() {
        let err = SqlGateError::Integrity("2 rows".into());
        assert!(err.driver_error().is_none());
    }
}
