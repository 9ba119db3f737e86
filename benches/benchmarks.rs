use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rusty_cucopy::{
    config::Language,
    data::{Granularity, IndexResolver, IndexTable, Period, RegionRow, TableSource},
};

fn world_table(regions: usize) -> IndexTable {
    let mut table = IndexTable::new(Granularity::Annual, Language::En);
    for r in 0..regions {
        let mut row = RegionRow::new(format!("R{:03}", r));
        for year in 1960..2022 {
            let value = if year < 1999 || r % 2 == 0 {
                Some(50.0 + (year - 1960) as f64)
            } else {
                None
            };
            row = row.with_value(Period::annual(year), value);
        }
        if r % 2 == 1 {
            row = row.with_successor("R000", 1999);
        }
        table.insert_row(row);
    }
    table
}

fn world_csv(regions: usize) -> String {
    let mut csv = String::from("\"Data Source\",\"bench\",\n\n\"Last Updated Date\",\"2022-06-30\",\n\n");
    csv.push_str("\"Country Name\",\"Country Code\"");
    for year in 1960..2022 {
        csv.push_str(&format!(",\"{}\"", year));
    }
    csv.push('\n');
    for r in 0..regions {
        csv.push_str(&format!("\"Region {}\",\"R{:03}\"", r, r));
        for year in 1960..2022 {
            csv.push_str(&format!(",\"{}.5\"", year - 1900));
        }
        csv.push('\n');
    }
    csv
}

fn benchmark_resolve(c: &mut Criterion) {
    let resolver = IndexResolver::new(world_table(250));
    let direct = NaiveDate::from_ymd_opt(1990, 6, 1).unwrap();
    let fallback = NaiveDate::from_ymd_opt(2010, 6, 1).unwrap();

    c.bench_function("resolve_direct", |b| {
        b.iter(|| resolver.resolve(black_box("R101"), black_box(direct)))
    });

    c.bench_function("resolve_successor", |b| {
        b.iter(|| resolver.resolve(black_box("R101"), black_box(fallback)))
    });
}

fn benchmark_load(c: &mut Criterion) {
    let csv = world_csv(250);
    let source = TableSource::world(4);

    c.bench_function("load_world_250_regions", |b| {
        b.iter(|| source.load_from_str(black_box(&csv)))
    });
}

criterion_group!(benches, benchmark_resolve, benchmark_load);
criterion_main!(benches);
