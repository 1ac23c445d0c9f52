use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use coraldb::{and, asc, desc, eq, read_db, DatabaseBuilder, DocumentBuilder, Select, DB};

const COLORS: [&str; 4] = ["FF0000", "00FF00", "0000FF", "FFFF00"];
const WHEELS: [&str; 2] = ["LEFT", "RIGHT"];

fn build_db(doc_count: usize) -> DB {
    let mut builder = DatabaseBuilder::new();
    // Prices are near-unique; a dense bit set per distinct value would be
    // quadratic in the document count.
    builder.with_list_multimap("price");
    for id in 0..doc_count {
        builder.document(
            DocumentBuilder::new()
                .filterable("color", COLORS[id % COLORS.len()])
                .filterable("wheel", WHEELS[id % WHEELS.len()])
                .sortable("price", format!("{:08}", (id * 37) % 100_000))
                .payload(format!("document payload {id}")),
        );
    }
    read_db(builder.build().unwrap().as_slice()).unwrap()
}

fn bench_count(c: &mut Criterion) {
    let counts = [1_000usize, 10_000, 100_000];
    let dbs: Vec<(usize, DB)> = counts.iter().map(|&n| (n, build_db(n))).collect();

    let mut group = c.benchmark_group("count");
    for (count, db) in &dbs {
        let hit = Select::new().where_(eq("color", "FF0000"));
        group.bench_with_input(BenchmarkId::new("eq_hit", count), db, |b, db| {
            b.iter(|| black_box(db.count(&hit).unwrap()))
        });

        // Worst case: the value is absent, the dictionary search misses.
        let miss = Select::new().where_(eq("id", "autoru-xxxxxxxx"));
        group.bench_with_input(BenchmarkId::new("eq_miss", count), db, |b, db| {
            b.iter(|| {
                let n = db.count(&miss).unwrap();
                assert_eq!(n, 0);
                black_box(n)
            })
        });

        let conjunction = Select::new().where_(and([eq("color", "FF0000"), eq("wheel", "LEFT")]));
        group.bench_with_input(BenchmarkId::new("and", count), db, |b, db| {
            b.iter(|| black_box(db.count(&conjunction).unwrap()))
        });
    }
    group.finish();
}

fn bench_iterate(c: &mut Criterion) {
    let db = build_db(10_000);

    let mut group = c.benchmark_group("iterate");
    let filtered = Select::new().where_(eq("color", "FF0000"));
    group.bench_function("eq_scan", |b| {
        b.iter(|| {
            let mut docs = db.query(&filtered).unwrap();
            let mut total = 0usize;
            while docs.next() {
                docs.scan(|_, raw| {
                    total += raw.len();
                    Ok(())
                })
                .unwrap();
            }
            black_box(total)
        })
    });

    let sorted = Select::new()
        .where_(eq("color", "FF0000"))
        .order_by(desc(["price"]))
        .limit(10);
    group.bench_function("sorted_top10", |b| {
        b.iter(|| {
            let mut docs = db.query(&sorted).unwrap();
            let mut ids = Vec::with_capacity(10);
            while docs.next() {
                docs.scan(|id, _| {
                    ids.push(id);
                    Ok(())
                })
                .unwrap();
            }
            black_box(ids)
        })
    });

    let full_sort = Select::new().order_by(asc(["price"]));
    group.bench_function("order_by_all", |b| {
        b.iter(|| {
            let mut docs = db.query(&full_sort).unwrap();
            let mut last = 0usize;
            while docs.next() {
                docs.scan(|id, _| {
                    last = id;
                    Ok(())
                })
                .unwrap();
            }
            black_box(last)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_count, bench_iterate);
criterion_main!(benches);
