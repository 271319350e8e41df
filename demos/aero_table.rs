use lutrust::{errors::LTError, loader::LoaderOptions, tables::lookup_table::LookupTable, TracingSink};
use tracing_subscriber::EnvFilter;

const AERO_TABLE: &str = "\
aero coefficients 2
Mach Alpha CL CD
0.5  0  0.10 0.010
0.5  5  0.30 0.030
1.0  0  0.20 0.020
1.0  5  0.50 0.050
1.5  0  0.15 0.025
1.5  5  0.40 0.060
";

///
///  Loads a small two dimensional table (from a file when a path is given) and runs a
///  few traced queries. Set `RUST_LOG=trace` to see every bracketing step.
///
fn main() -> Result<(), LTError>
{
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let table: LookupTable = match std::env::args().nth(1)
    {
        Some(path) => LookupTable::from_file(path)?,
        None => LookupTable::from_reader(AERO_TABLE.as_bytes(), &LoaderOptions::default())?,
    };
    println!("{table}");

    let n = table.num_independent();
    let queries = [vec![0.75; n], vec![0.2; n], vec![2.0; n]];
    for x in &queries
    {
        let y = table.interpolate_traced(x, &mut TracingSink)?;
        println!("{:?} = {:?} -> {:?}", table.independent_names(), x, y);
    }
    Ok(())
}
