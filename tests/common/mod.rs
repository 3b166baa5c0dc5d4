//! Behaviour every backend must share, run by each integration test file.

#![allow(dead_code)]

use sql_bridge::db::{BackendKind, Client, DbError, Handle, Limits, OpenOptions};

/// Per-backend SQL differences the shared checks need.
pub struct Dialect {
    pub kind: BackendKind,
    /// Placeholder for the n-th (1-based) parameter.
    pub placeholder: fn(usize) -> String,
    /// A query yielding `n` rows in column `i`.
    pub series: fn(usize) -> String,
}

pub const SQLITE: Dialect = Dialect {
    kind: BackendKind::Sqlite,
    placeholder: question_mark,
    series: recursive_series,
};

pub const MYSQL: Dialect = Dialect {
    kind: BackendKind::MySql,
    placeholder: question_mark,
    series: digits_series,
};

pub const POSTGRES: Dialect = Dialect {
    kind: BackendKind::Postgres,
    placeholder: dollar,
    series: generate_series,
};

fn question_mark(_: usize) -> String {
    "?".to_string()
}

fn dollar(n: usize) -> String {
    format!("${}", n)
}

fn recursive_series(n: usize) -> String {
    format!(
        "WITH RECURSIVE s(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM s WHERE i < {}) SELECT i FROM s",
        n
    )
}

fn generate_series(n: usize) -> String {
    format!("SELECT i FROM generate_series(1, {}) AS s(i)", n)
}

/// Cross join of digit tables; MySQL caps recursive CTE depth at 1000.
fn digits_series(n: usize) -> String {
    let digits = "(SELECT 0 AS d UNION ALL SELECT 1 UNION ALL SELECT 2 UNION ALL SELECT 3 \
                  UNION ALL SELECT 4 UNION ALL SELECT 5 UNION ALL SELECT 6 UNION ALL SELECT 7 \
                  UNION ALL SELECT 8 UNION ALL SELECT 9)";
    format!(
        "SELECT a.d + 10 * b.d + 100 * c.d + 1000 * e.d + 1 AS i \
         FROM {d} a, {d} b, {d} c, {d} e \
         WHERE a.d + 10 * b.d + 100 * c.d + 1000 * e.d < {n}",
        d = digits,
        n = n
    )
}

/// A client with one open connection.
pub struct Fixture {
    pub client: Client,
    pub handle: Handle,
    pub options: OpenOptions,
    pub dialect: &'static Dialect,
}

impl Fixture {
    pub fn open(options: OpenOptions, dialect: &'static Dialect, limits: Limits) -> Self {
        let client = Client::new(limits);
        let handle = client.open(&options).expect("open should succeed");
        Self {
            client,
            handle,
            options,
            dialect,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.dialect.kind
    }

    pub fn exec(&self, sql: &str) {
        self.client
            .exec(self.kind(), self.handle, sql)
            .unwrap_or_else(|e| panic!("{} failed: {}", sql, e));
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn parameter_binding(fx: &Fixture) {
    fx.exec("CREATE TEMPORARY TABLE bind_t (a VARCHAR(64))");
    let insert = format!("INSERT INTO bind_t(a) VALUES ({})", (fx.dialect.placeholder)(1));
    fx.client
        .exec_with_params(fx.kind(), fx.handle, &insert, &strings(&["hello"]))
        .unwrap();

    let result = fx
        .client
        .query(fx.kind(), fx.handle, "SELECT a FROM bind_t", &[])
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.columns(), ["a"]);
    assert_eq!(result.rows()[0].get("a"), Some("hello"));

    let serialized = fx
        .client
        .query_serialized(fx.kind(), fx.handle, "SELECT a FROM bind_t", &[])
        .unwrap();
    assert_eq!(serialized.to_text(), "a=hello\n");
}

pub fn query_with_parameters(fx: &Fixture) {
    fx.exec("CREATE TEMPORARY TABLE people (id INTEGER, name VARCHAR(64), note VARCHAR(64))");
    fx.exec("INSERT INTO people VALUES (1, 'Ann', NULL), (2, 'Bo', 'x'), (3, 'Cy', NULL)");
    let sql = format!(
        "SELECT id, name, note FROM people WHERE id >= {} AND name <> {} ORDER BY id",
        (fx.dialect.placeholder)(1),
        (fx.dialect.placeholder)(2)
    );
    let result = fx
        .client
        .query(fx.kind(), fx.handle, &sql, &strings(&["1", "Bo"]))
        .unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.rows()[0].values(), [Some("1".to_string()), Some("Ann".to_string()), None]);
    assert_eq!(result.rows()[1].get("name"), Some("Cy"));
}

pub fn empty_result(fx: &Fixture) {
    fx.exec("CREATE TEMPORARY TABLE empty_t (a VARCHAR(8))");
    let result = fx
        .client
        .query(fx.kind(), fx.handle, "SELECT * FROM empty_t WHERE 1=0", &[])
        .unwrap();
    assert!(result.is_empty());
    assert!(!result.is_truncated());
}

pub fn row_ceiling(fx: &Fixture) {
    let big = fx
        .client
        .query(fx.kind(), fx.handle, &(fx.dialect.series)(1500), &[])
        .unwrap();
    assert_eq!(big.len(), 1000);
    assert!(big.is_truncated());
    assert!(matches!(big.into_complete(), Err(DbError::ResultTruncated { max_rows: 1000 })));

    let small = fx
        .client
        .query(fx.kind(), fx.handle, &(fx.dialect.series)(5), &[])
        .unwrap();
    assert_eq!(small.len(), 5);
    assert!(!small.is_truncated());
}

pub fn parameter_mismatch(fx: &Fixture) {
    let sql = format!("SELECT {} AS x", (fx.dialect.placeholder)(1));
    let err = fx
        .client
        .query(fx.kind(), fx.handle, &sql, &strings(&["a", "b"]))
        .unwrap_err();
    assert!(matches!(err, DbError::ParamMismatch { expected: 1, actual: 2 }), "{}", err);

    let err = fx.client.query(fx.kind(), fx.handle, &sql, &[]).unwrap_err();
    assert!(matches!(err, DbError::ParamMismatch { expected: 1, actual: 0 }), "{}", err);

    let err = fx
        .client
        .exec_with_params(fx.kind(), fx.handle, &sql, &[])
        .unwrap_err();
    assert!(matches!(err, DbError::ParamMismatch { expected: 1, actual: 0 }), "{}", err);
}

/// SQL that does not compile is a prepare failure whichever entry point
/// receives it, and carries the backend's error code.
pub fn syntax_error_is_prepare_failure(fx: &Fixture) {
    let sql = "SELEC nonsense";
    let from_exec = fx.client.exec(fx.kind(), fx.handle, sql).unwrap_err();
    let from_params = fx
        .client
        .exec_with_params(fx.kind(), fx.handle, sql, &[])
        .unwrap_err();
    let from_query = fx.client.query(fx.kind(), fx.handle, sql, &[]).unwrap_err();
    for err in [from_exec, from_params, from_query] {
        match &err {
            DbError::PrepareFailed(native) => {
                assert!(native.code.is_some(), "{}", err);
                assert!(!native.message.is_empty());
            }
            other => panic!("Expected PrepareFailed, got {}", other),
        }
    }
}

pub fn changed_rows(fx: &Fixture) {
    fx.exec("CREATE TEMPORARY TABLE counted (id INTEGER, name VARCHAR(16))");
    let inserted = fx
        .client
        .exec(fx.kind(), fx.handle, "INSERT INTO counted VALUES (1, 'a'), (2, 'b'), (3, 'c')")
        .unwrap();
    assert_eq!(inserted, 3);

    let update = format!("UPDATE counted SET name = 'z' WHERE id >= {}", (fx.dialect.placeholder)(1));
    let updated = fx
        .client
        .exec_with_params(fx.kind(), fx.handle, &update, &strings(&["2"]))
        .unwrap();
    assert_eq!(updated, 2);

    let delete = format!("DELETE FROM counted WHERE id > {}", (fx.dialect.placeholder)(1));
    let deleted = fx
        .client
        .exec_with_params(fx.kind(), fx.handle, &delete, &strings(&["10"]))
        .unwrap();
    assert_eq!(deleted, 0);
}

pub fn last_error_after_failure(fx: &Fixture) {
    assert_eq!(fx.client.last_error(fx.kind(), fx.handle).unwrap(), "");
    let err = fx
        .client
        .exec(fx.kind(), fx.handle, "INSERT INTO no_such_table VALUES (1)")
        .unwrap_err();
    assert!(err.native().is_some(), "{}", err);
    let message = fx.client.last_error(fx.kind(), fx.handle).unwrap();
    assert!(!message.is_empty());

    fx.exec("SELECT 1");
    assert_eq!(fx.client.last_error(fx.kind(), fx.handle).unwrap(), "");
}

pub fn invalid_handles(fx: &Fixture) {
    let capacity = fx.client.limits().registry_capacity as i64;
    let param = strings(&["x"]);
    for raw in [-1, capacity, capacity + 5, fx.handle.raw() + 1] {
        let h = Handle::from_raw(raw);
        assert!(matches!(
            fx.client.exec(fx.kind(), h, "SELECT 1"),
            Err(DbError::InvalidHandle { .. })
        ));
        assert!(matches!(
            fx.client.exec_with_params(fx.kind(), h, "SELECT 1", &param),
            Err(DbError::InvalidHandle { .. })
        ));
        assert!(matches!(
            fx.client.query(fx.kind(), h, "SELECT 1", &[]),
            Err(DbError::InvalidHandle { .. })
        ));
        assert!(matches!(
            fx.client.query_limited(fx.kind(), h, "SELECT 1", &[], 10),
            Err(DbError::InvalidHandle { .. })
        ));
        assert!(matches!(
            fx.client.query_serialized(fx.kind(), h, "SELECT 1", &[]),
            Err(DbError::InvalidHandle { .. })
        ));
        assert!(matches!(
            fx.client.last_error(fx.kind(), h),
            Err(DbError::InvalidHandle { .. })
        ));

        // An empty slot inside the table closes as a no-op.
        let close = fx.client.close(fx.kind(), h);
        if raw < 0 || raw >= capacity {
            assert!(matches!(close, Err(DbError::InvalidHandle { .. })));
        } else {
            assert!(close.is_ok());
        }
    }
    fx.client.exec(fx.kind(), fx.handle, "SELECT 1").unwrap();
}

pub fn close_and_reuse(options: &OpenOptions, dialect: &'static Dialect) {
    let client = Client::new(Limits::default());
    let h = client.open(options).unwrap();
    client.close(dialect.kind, h).unwrap();
    client.close(dialect.kind, h).unwrap();
    assert!(matches!(
        client.exec(dialect.kind, h, "SELECT 1"),
        Err(DbError::InvalidHandle { .. })
    ));

    let reused = client.open(options).unwrap();
    assert_eq!(reused, h);
    client.exec(dialect.kind, reused, "SELECT 1").unwrap();
    client.close(dialect.kind, reused).unwrap();
}

pub fn registry_exhaustion(options: &OpenOptions, dialect: &'static Dialect) {
    let capacity = 3;
    let client = Client::new(Limits {
        registry_capacity: capacity,
        ..Limits::default()
    });
    let handles: Vec<_> = (0..capacity).map(|_| client.open(options).unwrap()).collect();

    let err = client.open(options).unwrap_err();
    assert!(matches!(err, DbError::RegistryFull { capacity: 3, .. }), "{}", err);
    for h in &handles {
        client.exec(dialect.kind, *h, "SELECT 1").unwrap();
    }
    for h in handles {
        client.close(dialect.kind, h).unwrap();
    }
}

pub fn non_ascii_text(fx: &Fixture) {
    fx.exec("CREATE TEMPORARY TABLE words (w VARCHAR(64))");
    let insert = format!("INSERT INTO words VALUES ({})", (fx.dialect.placeholder)(1));
    fx.client
        .exec_with_params(fx.kind(), fx.handle, &insert, &strings(&["Zoë 日本"]))
        .unwrap();
    let result = fx
        .client
        .query(fx.kind(), fx.handle, "SELECT w FROM words", &[])
        .unwrap();
    assert_eq!(result.rows()[0].get("w"), Some("Zoë 日本"));
}
