//! Benchmarks for the SQLite → PostgreSQL transducer.
//!
//! Tests:
//! - Whole-dump conversion throughput
//! - Per-line token rewriting

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lite2pg::convert::{convert, rewrite_line, ConvertOptions};
use std::hint::black_box;

/// Generate a DB Browser style SQLite dump for benchmarking
fn generate_sqlite_dump(tables: usize, rows_per_table: usize) -> Vec<u8> {
    let mut data = String::new();
    data.push_str("BEGIN TRANSACTION;\n");

    for t in 0..tables {
        let table_name = format!("table_{}", t);
        data.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS \"{name}\" (\n\t\"id\"\tINTEGER NOT NULL,\n\t\"name\"\tVARCHAR(255),\n\t\"active\"\tBOOLEAN DEFAULT TRUE,\n\t\"created_at\"\tDATETIME NOT NULL,\n\t\"parent_id\"\tSMALLINT UNSIGNED,\n\tPRIMARY KEY(\"id\" AUTOINCREMENT),\n\tFOREIGN KEY(\"parent_id\") REFERENCES \"table_0\"(\"id\")\n);\n",
            name = table_name
        ));

        for r in 0..rows_per_table {
            data.push_str(&format!(
                "INSERT INTO \"{}\" VALUES ({},'User {}',1,'2024-01-01 12:00:00',NULL);\n",
                table_name, r, r
            ));
        }
    }

    data.push_str("COMMIT;\n");
    data.into_bytes()
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    let options = ConvertOptions::default();

    for (tables, rows) in [(10, 100), (20, 1000)] {
        let dump = generate_sqlite_dump(tables, rows);
        group.throughput(Throughput::Bytes(dump.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("sqlite_to_postgres", format!("{}x{}", tables, rows)),
            &dump,
            |b, dump| {
                b.iter(|| {
                    let mut out = Vec::with_capacity(dump.len());
                    convert(black_box(&dump[..]), &mut out, &options).unwrap();
                    out
                })
            },
        );
    }

    group.finish();
}

fn bench_rewrite_line(c: &mut Criterion) {
    let lines = [
        "\t\"last_update\"\tDATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,\n",
        "\t\"active\"\tBOOLEAN NOT NULL DEFAULT TRUE,\n",
        "INSERT INTO \"film\" VALUES (1,'ACADEMY DINOSAUR','An Epic Drama',2006,1,NULL,6,0.99,86,20.99,'PG','Deleted Scenes,Behind the Scenes','2006-02-15 05:03:42');\n",
    ];

    c.bench_function("rewrite_line", |b| {
        b.iter(|| {
            for line in &lines {
                black_box(rewrite_line(black_box(line)));
            }
        })
    });
}

criterion_group!(benches, bench_convert, bench_rewrite_line);
criterion_main!(benches);
