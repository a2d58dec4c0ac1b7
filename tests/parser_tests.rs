#[cfg(test)]
mod tests {
    use recdb::ast::{
        ColumnDef, Command, Condition, CreateTableStatement, DeleteStatement, ExportFormat, ExportStatement,
        InsertPayload, InsertStatement, OrderByClause, SelectStatement, UpdateStatement,
    };
    use recdb::parser::parse_command;
    use recdb::value::{DataType, Value};
    use recdb::DbError;

    fn cond(field: &str, value: &str) -> Condition {
        Condition { field: field.to_string(), value: value.to_string() }
    }

    #[test]
    fn test_parse_select() {
        let result = parse_command("SELECT users name, age WHERE age = '30' ORDER BY name DESC;").unwrap();
        let expected = Command::Select(SelectStatement {
            table: "users".to_string(),
            fields: vec!["name".to_string(), "age".to_string()],
            where_clause: Some(cond("age", "30")),
            order_by: Some(OrderByClause { field: "name".to_string(), descending: true }),
            group_by: None,
        });
        assert_eq!(result, expected);
    }

    #[test]
    fn test_parse_select_clauses_in_any_order() {
        let result = parse_command("select people group by city where age = 30").unwrap();
        let expected = Command::Select(SelectStatement {
            table: "people".to_string(),
            fields: vec![],
            where_clause: Some(cond("age", "30")),
            order_by: None,
            group_by: Some("city".to_string()),
        });
        assert_eq!(result, expected);
    }

    #[test]
    fn test_parse_select_where_value_with_spaces() {
        match parse_command("SELECT people WHERE city = 'New York'").unwrap() {
            Command::Select(stmt) => assert_eq!(stmt.where_clause, Some(cond("city", "New York"))),
            other => panic!("unexpected {:?}", other),
        }
        match parse_command("UPDATE people SET motto = 'carpe  diem' WHERE name = 'Ann   Lee';").unwrap() {
            Command::Update(stmt) => {
                assert_eq!(stmt.assignment, cond("motto", "carpe  diem"));
                assert_eq!(stmt.where_clause, cond("name", "Ann   Lee"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_select_bad_clauses() {
        assert!(matches!(
            parse_command("SELECT t WHERE age 30"),
            Err(DbError::ClauseSyntax { clause: "WHERE", .. })
        ));
        assert!(matches!(
            parse_command("SELECT t ORDER BY age sideways"),
            Err(DbError::ClauseSyntax { clause: "ORDER BY", .. })
        ));
        assert!(matches!(
            parse_command("SELECT t GROUP BY a b"),
            Err(DbError::ClauseSyntax { clause: "GROUP BY", .. })
        ));
    }

    #[test]
    fn test_parse_insert_objects() {
        let result = parse_command("INCLUDE people [{name: Alice, age: 30}, {name: 'Bob Stone'}];").unwrap();
        match result {
            Command::Insert(InsertStatement { table, payload: InsertPayload::Records(records) }) => {
                assert_eq!(table, "people");
                assert_eq!(records.len(), 2);
                assert_eq!(records[0].get("age"), Some(&Value::Int(30)));
                assert_eq!(records[1].get("name"), Some(&Value::from("Bob Stone")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_insert_row() {
        let result = parse_command("insert users ('Smith, John', 30)").unwrap();
        let expected = Command::Insert(InsertStatement {
            table: "users".to_string(),
            payload: InsertPayload::Row(vec!["'Smith, John'".to_string(), "30".to_string()]),
        });
        assert_eq!(result, expected);
    }

    #[test]
    fn test_parse_insert_duplicate_key() {
        assert!(matches!(
            parse_command("include t {name: Alice, name: Bob}"),
            Err(DbError::DuplicateKey(_))
        ));
        assert!(matches!(parse_command("include t name=Alice"), Err(DbError::Syntax(_))));
    }

    #[test]
    fn test_parse_make() {
        assert_eq!(
            parse_command("MAKE notes").unwrap(),
            Command::CreateTable(CreateTableStatement { table: "notes".to_string(), columns: None })
        );
        assert_eq!(
            parse_command("create users (name TEXT, age INT);").unwrap(),
            Command::CreateTable(CreateTableStatement {
                table: "users".to_string(),
                columns: Some(vec![
                    ColumnDef { name: "name".to_string(), data_type: DataType::Text },
                    ColumnDef { name: "age".to_string(), data_type: DataType::Int },
                ]),
            })
        );
        assert!(matches!(parse_command("make users (name)"), Err(DbError::ColumnSyntax(_))));
        assert!(matches!(parse_command("make users ()"), Err(DbError::ColumnSyntax(_))));
    }

    #[test]
    fn test_parse_update() {
        let result = parse_command("UPDATE users SET age = 26 WHERE name = 'Alice';").unwrap();
        let expected = Command::Update(UpdateStatement {
            table: "users".to_string(),
            assignment: cond("age", "26"),
            where_clause: cond("name", "Alice"),
        });
        assert_eq!(result, expected);
    }

    #[test]
    fn test_parse_update_requires_both_clauses() {
        assert!(matches!(
            parse_command("UPDATE users SET age = 26"),
            Err(DbError::ClauseSyntax { clause: "WHERE", .. })
        ));
        assert!(matches!(
            parse_command("UPDATE users WHERE age = 26"),
            Err(DbError::ClauseSyntax { clause: "SET", .. })
        ));
    }

    #[test]
    fn test_parse_delete_forms() {
        assert_eq!(parse_command("EXCLUDE logs").unwrap(), Command::DropTable("logs".to_string()));
        assert_eq!(
            parse_command("DELETE FROM logs;").unwrap(),
            Command::Delete(DeleteStatement { table: "logs".to_string(), field: None, where_clause: None })
        );
        assert_eq!(
            parse_command("delete from logs where id = 3").unwrap(),
            Command::Delete(DeleteStatement {
                table: "logs".to_string(),
                field: None,
                where_clause: Some(cond("id", "3")),
            })
        );
        assert_eq!(
            parse_command("exclude level from logs where id = 3").unwrap(),
            Command::Delete(DeleteStatement {
                table: "logs".to_string(),
                field: Some("level".to_string()),
                where_clause: Some(cond("id", "3")),
            })
        );
        assert!(matches!(parse_command("exclude level from logs"), Err(DbError::Syntax(_))));
    }

    #[test]
    fn test_parse_lifecycle_commands() {
        assert_eq!(parse_command("create database shop").unwrap(), Command::CreateDatabase("shop".to_string()));
        assert_eq!(parse_command("USE shop;").unwrap(), Command::Use("shop".to_string()));
        assert_eq!(parse_command("remove shop").unwrap(), Command::Remove("shop".to_string()));
        assert_eq!(parse_command("EXIT shop").unwrap(), Command::Exit("shop".to_string()));
        assert_eq!(parse_command("show databases").unwrap(), Command::ShowDatabases);
        assert_eq!(parse_command("SHOW TABLES").unwrap(), Command::ShowTables);
        assert_eq!(parse_command("count logs").unwrap(), Command::Count("logs".to_string()));
        assert!(matches!(parse_command("use ../etc"), Err(DbError::Syntax(_))));
    }

    #[test]
    fn test_parse_export() {
        assert_eq!(
            parse_command("EXPORT shop AS backup IN csv").unwrap(),
            Command::Export(ExportStatement {
                database: "shop".to_string(),
                file: "backup".to_string(),
                format: ExportFormat::Csv,
            })
        );
        assert!(matches!(
            parse_command("EXPORT shop AS backup IN xml"),
            Err(DbError::UnsupportedFormat(ref f)) if f == "xml"
        ));
        assert!(matches!(parse_command("EXPORT shop backup IN csv"), Err(DbError::Syntax(_))));
    }

    #[test]
    fn test_parse_invalid_command() {
        assert!(matches!(parse_command("INVALID QUERY;"), Err(DbError::UnknownCommand(_))));
        assert!(matches!(parse_command(" ; "), Err(DbError::EmptyCommand)));
    }
}
