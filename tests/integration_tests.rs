#[cfg(test)]
mod tests {
    use std::fs;

    use recdb::config::Config;
    use recdb::{process_query, Session};
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        session: Session,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let config = Config::with_dirs(dir.path().join("data"), dir.path().join("exports"));
            let session = Session::open(config).unwrap();
            Fixture { dir, session }
        }

        fn run(&mut self, line: &str) -> String {
            process_query(&mut self.session, line)
        }

        fn with_database(name: &str) -> Self {
            let mut fx = Fixture::new();
            fx.run(&format!("CREATE DATABASE {}", name));
            fx.run(&format!("USE {}", name));
            fx
        }
    }

    #[test]
    fn test_schema_table_scenario() {
        let mut fx = Fixture::with_database("shop");
        assert_eq!(
            fx.run("MAKE users (name TEXT, age INT)"),
            "Table 'users' created with columns [name, age]."
        );
        assert_eq!(fx.run("INCLUDE users (Alice, 30)"), "1 record inserted into 'users'.");

        let output = fx.run("SELECT users WHERE age = 30");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "name | age");
        assert_eq!(lines[2], "Alice | 30");

        assert_eq!(
            fx.run("INCLUDE users (Bob, twenty)"),
            "Type mismatch for 'age'. Expected INT, got 'twenty'."
        );
        assert_eq!(fx.run("COUNT users"), "Table 'users' contains 1 record(s).");
    }

    #[test]
    fn test_schema_less_ids_and_delete() {
        let mut fx = Fixture::with_database("shop");
        fx.run("make t");
        assert_eq!(
            fx.run("include t [{name: Alice}, {name: Bob}]"),
            "2 record(s) included into 't' with IDs [1, 2]."
        );
        assert_eq!(fx.run("delete from t where id = 1"), "Deleted 1 record(s) from 't'.");
        assert_eq!(fx.run("count t"), "Table 't' contains 1 record(s).");
        assert!(fx.run("select t").contains("\"name\": \"Bob\""));
    }

    #[test]
    fn test_ids_survive_exit_and_use() {
        let mut fx = Fixture::with_database("shop");
        fx.run("make t");
        fx.run("include t [{name: Alice}, {name: Bob}, {name: Carol}]");
        fx.run("delete from t where name = Alice");
        assert_eq!(fx.run("exit shop"), "Exited database 'shop'.");
        assert_eq!(fx.run("count t"), "No database selected. Use 'USE database_name' first.");

        fx.run("use shop");
        assert_eq!(fx.run("include t {name: Dave}"), "1 record(s) included into 't' with IDs [4].");
    }

    #[test]
    fn test_schema_delete_survives_reopen() {
        let mut fx = Fixture::with_database("shop");
        fx.run("MAKE users (name TEXT, age INT)");
        fx.run("INCLUDE users (Alice, 30)");
        fx.run("INCLUDE users (Bob, 25)");

        assert_eq!(fx.run("DELETE name FROM users WHERE age = 30"), "Cleared 'name' in 1 record(s) of 'users'.");
        assert_eq!(fx.run("DELETE FROM users WHERE age = 25"), "Deleted 1 record(s) from 'users'.");
        fx.run("EXIT shop");
        fx.run("USE shop");

        let output = fx.run("SELECT users");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "NULL | 30");
    }

    #[test]
    fn test_include_keeps_punctuation_inside_strings() {
        let mut fx = Fixture::with_database("shop");
        fx.run("make t");
        assert_eq!(fx.run(r#"include t {note: "it's Bob's"}"#), "1 record(s) included into 't' with IDs [1].");
        assert_eq!(fx.run(r#"include t {note: "a, b: c"}"#), "1 record(s) included into 't' with IDs [2].");
        let output = fx.run("select t where id = 2");
        assert!(output.contains("\"note\": \"a, b: c\""));
    }

    #[test]
    fn test_update_matches_integer_not_text() {
        let mut fx = Fixture::with_database("shop");
        fx.run("make people");
        fx.run("include people [{name: Alice, age: 30}, {name: Bob, age: '30'}]");

        assert_eq!(fx.run("UPDATE people SET age = 31 WHERE age = 30"), "1 record(s) updated in 'people'.");
        let output = fx.run("SELECT people name, age ORDER BY name");
        assert!(output.contains("\"age\": 31"));
        assert!(output.contains("\"age\": \"30\""));
    }

    #[test]
    fn test_document_round_trip_through_disk() {
        let mut fx = Fixture::with_database("shop");
        fx.run("make users (name TEXT, score FLOAT, active BOOL)");
        fx.run("include users (Alice, 9, true)");
        fx.run("make notes");
        fx.run("include notes {text: hello, pinned: false}");

        let path = fx.dir.path().join("data").join("shop.json");
        let first = fs::read_to_string(&path).unwrap();
        assert!(first.contains("\"score\": \"FLOAT\""));
        assert!(first.contains("9.0"));

        fx.run("exit shop");
        fx.run("use shop");
        fx.run("update notes set pinned = true where text = hello");
        fx.run("update notes set pinned = false where text = hello");
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_select_reports_empty_and_no_match() {
        let mut fx = Fixture::with_database("shop");
        fx.run("make users (name TEXT)");
        assert_eq!(fx.run("select users"), "Table 'users' is empty.");
        assert_eq!(fx.run("select users where name = Zed"), "No records matched the condition.");
        assert_eq!(fx.run("select users where height = 3"), "Column 'height' does not exist.");
        assert_eq!(fx.run("select ghosts"), "Table 'ghosts' does not exist.");
    }

    #[test]
    fn test_group_by_renders_groups() {
        let mut fx = Fixture::with_database("shop");
        fx.run("make people");
        fx.run("include people [{name: Alice, city: Oslo}, {name: Bob, city: Rome}, {name: Carol, city: Oslo}]");
        let output = fx.run("select people group by city");
        let groups: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(groups[0]["group"], "Oslo");
        assert_eq!(groups[0]["records"].as_array().unwrap().len(), 2);
        assert_eq!(groups[1]["group"], "Rome");
    }

    #[test]
    fn test_clear_and_drop_tables() {
        let mut fx = Fixture::with_database("shop");
        fx.run("make logs");
        fx.run("include logs [{level: info}, {level: warn}]");
        assert_eq!(fx.run("exclude level from logs where level = warn"), "Cleared 'level' in 1 record(s) of 'logs'.");
        assert_eq!(fx.run("exclude from logs"), "All records excluded from 'logs' (2 removed).");
        assert_eq!(fx.run("show tables"), "Tables: logs");
        assert_eq!(fx.run("exclude logs"), "Table 'logs' has been excluded.");
        assert_eq!(fx.run("show tables"), "No tables found.");
    }

    #[test]
    fn test_export_empty_database_to_csv() {
        let mut fx = Fixture::with_database("empty");
        let output = fx.run("EXPORT empty AS dump IN CSV");
        let path = fx.dir.path().join("exports").join("dump.csv");
        assert!(output.starts_with("Database 'empty' exported as CSV."));
        assert_eq!(fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn test_export_working_copy_as_json() {
        let mut fx = Fixture::with_database("shop");
        fx.run("make items");
        fx.run("include items {name: pen}");
        fx.run("EXPORT shop AS items IN json");
        let text = fs::read_to_string(fx.dir.path().join("exports").join("items.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["items"][0]["name"], "pen");
        assert_eq!(doc["items"][0]["id"], 1);
        assert_eq!(fx.run("EXPORT shop AS items IN xlsx"), "Unsupported file format 'xlsx'. Use CSV or JSON.");
    }

    #[test]
    fn test_lifecycle_errors() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run("use nowhere"), "Database 'nowhere' does not exist.");
        assert_eq!(fx.run("exit nowhere"), "No database is currently in use.");
        fx.run("create database shop");
        assert_eq!(fx.run("create database shop"), "Database 'shop' already exists.");
        fx.run("use shop");
        assert_eq!(fx.run("exit other"), "Database 'other' is not currently in use.");
        assert_eq!(fx.run("remove shop"), "Database 'shop' removed successfully.");
        assert_eq!(fx.run("show databases"), "No databases found.");
    }
}
