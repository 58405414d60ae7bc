/// Statements that bring an empty database file to version v0.0, after which
/// the migrations take over.
pub const QUERIES: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS version (
		major INTEGER NOT NULL,
		minor INTEGER NOT NULL
	)
	"#,
	r#"
	INSERT INTO version (major, minor)
	SELECT 0, 0 WHERE NOT EXISTS (SELECT 1 FROM version)
	"#,
];
