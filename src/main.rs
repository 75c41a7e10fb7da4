use clap::Parser;
use lasso::{Rodeo, RodeoResolver, Spur};
use log::{info, warn};
use moore_families::*;
use std::fmt;
use std::time::Instant;

/// Ground sets larger than this take hours and far too much memory.
const COMFORTABLE_SIZE: usize = 4;

/// Count the compatible pairs of Moore and co-Moore families over a finite set.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Names of the ground set's elements.
    #[arg(value_name = "ELEMENT")]
    elements: Vec<String>,

    /// Without element names, use the integers from 0 up to this size.
    #[arg(short, long, value_name = "INT", default_value = "3")]
    size: usize,

    /// Print every compatible pair.
    #[arg(long)]
    pairs: bool,

    /// Log more; repeat for even more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn ground_set(args: &Cli) -> (RodeoResolver<Spur>, Subset<Spur>) {
    let mut rodeo = Rodeo::new();
    let ground = if args.elements.is_empty() {
        (0..args.size)
            .map(|i| rodeo.get_or_intern(i.to_string()))
            .collect()
    } else {
        args.elements
            .iter()
            .map(|name| rodeo.get_or_intern(name))
            .collect()
    };
    (rodeo.into_resolver(), ground)
}

fn fmt_subset<W: fmt::Write>(
    out: &mut W,
    names: &RodeoResolver<Spur>,
    subset: &Subset<Spur>,
) -> fmt::Result {
    out.write_char('{')?;
    let mut iter = subset.iter();
    if let Some(element) = iter.next() {
        out.write_str(names.resolve(&element))?;
    }
    for element in iter {
        out.write_str(", ")?;
        out.write_str(names.resolve(&element))?;
    }
    out.write_char('}')
}

fn fmt_family<W: fmt::Write>(
    out: &mut W,
    names: &RodeoResolver<Spur>,
    family: &Family<Spur>,
) -> fmt::Result {
    out.write_char('[')?;
    let mut iter = family.iter();
    if let Some(member) = iter.next() {
        fmt_subset(out, names, member)?;
    }
    for member in iter {
        out.write_str(", ")?;
        fmt_subset(out, names, member)?;
    }
    out.write_char(']')
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    let level = match args.verbose {
        0 => simplelog::LevelFilter::Warn,
        1 => simplelog::LevelFilter::Info,
        2 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let (names, ground) = ground_set(&args);
    info!("ground set has {} elements", ground.len());
    if ground.len() > COMFORTABLE_SIZE {
        warn!(
            "{} elements is more than {}; expect this to exhaust time or memory",
            ground.len(),
            COMFORTABLE_SIZE
        );
    }

    let start = Instant::now();

    let moore: Vec<_> = moore_families(&ground).collect();
    let co_moore: Vec<_> = co_moore_families(&ground).collect();

    println!("Total number of Moore families: {}", moore.len());
    println!("Total number of co-Moore families: {}", co_moore.len());

    let count = if args.pairs {
        let mut count = 0;
        for (cl, int) in compatible_pairs(&moore, &co_moore, &ground) {
            count += 1;
            let mut line = String::new();
            fmt_family(&mut line, &names, cl)?;
            println!("Pair #{}:", count);
            println!("  Moore family: {}", line);
            line.clear();
            fmt_family(&mut line, &names, int)?;
            println!("  co-Moore family: {}", line);
        }
        count
    } else {
        count_compatible_pairs(&moore, &co_moore, &ground)
    };

    println!("Number of compatible pairs (Cl1, Int2): {}", count);
    println!("Elapsed time: {:?}", start.elapsed());

    Ok(())
}
