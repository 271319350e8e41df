use criterion::{criterion_group, criterion_main, Criterion};
use lutrust::{errors::LTError, tables::lookup_table::LookupTable};

fn build_three_d_table() -> Result<LookupTable, LTError>
{
    // 20 x 20 x 20 breakpoints, two dependent values per row
    let mut rows = Vec::new();
    for i in 0..20
    {
        for j in 0..20
        {
            for k in 0..20
            {
                let (x, y, z) = (i as f64 * 0.1, j as f64 * 2.0, k as f64 * 500.0);
                rows.push(vec![x, y, z, x * x + y, y * z.sqrt()]);
            }
        }
    }
    LookupTable::from_data(rows, 3, vec!["Mach".into(), "Alpha".into(), "Altitude".into()], vec!["CL".into(), "CD".into()])
}

fn three_d(table: &LookupTable) -> Result<(), LTError>
{
    let _value = table.interpolate(&[0.73, 11.2, 4321.0])?;
    Ok(())
}

fn three_d_batch(table: &LookupTable)
{
    let x = vec![vec![0.73, 11.2, 4321.0]; 1000];
    let _values = table.interpolate_batch(&x);
}

fn run_three_d(c: &mut Criterion)
{
    let table = build_three_d_table().unwrap();
    c.bench_function("3d", |b|b.iter(||three_d(&table).unwrap()));
    c.bench_function("3d batch", |b|b.iter(||three_d_batch(&table)));
}

fn run_build(c: &mut Criterion)
{
    c.bench_function("build 3d", |b|b.iter(||build_three_d_table().unwrap()));
}

criterion_group!(benches, run_three_d, run_build);
criterion_main!(benches);
