use moore_families::{
    is_legal_removal, CoMoore, Families, Family, FamilyKind, Moore, Subset,
};
use std::fmt;

fn fmt_subset<W: fmt::Write>(out: &mut W, subset: &Subset<u8>) -> fmt::Result {
    if subset.is_empty() {
        return out.write_char('0');
    }
    for element in subset.iter() {
        out.write_char((b'A' + element).into())?;
    }
    Ok(())
}

fn fmt_family<W: fmt::Write>(out: &mut W, family: &Family<u8>) -> fmt::Result {
    let mut iter = family.iter();
    if let Some(member) = iter.next() {
        fmt_subset(out, member)?;
    }
    for member in iter {
        out.write_str(":")?;
        fmt_subset(out, member)?;
    }
    Ok(())
}

/// Prints the search tree as a Graphviz graph, with an edge from each family to every family the
/// search reaches from it by one removal.
fn print_tree<K: FamilyKind>(ground: &Subset<u8>) -> fmt::Result {
    let families = Families::<u8, K>::new(ground);
    let powerset = families.powerset().clone();
    let fixed = K::fixed_member(ground);

    let mut structures = 0;
    let mut edges = 0;

    println!("graph {{ node [shape=plaintext];");
    for family in families {
        structures += 1;

        let mut family_name = String::new();
        fmt_family(&mut family_name, &family)?;
        println!("\"{}\";", family_name);

        for member in family.iter().filter(|member| **member != fixed) {
            let child = family.without(member);
            if is_legal_removal::<u8, K>(&powerset, &child, member) {
                edges += 1;
                let mut child_name = String::new();
                fmt_family(&mut child_name, &child)?;
                println!("\"{}\" -- \"{}\";", family_name, child_name);
            }
        }
    }
    println!(
        "}} // {} {} families, {} edges",
        structures,
        K::NAME,
        edges
    );

    Ok(())
}

fn main() -> fmt::Result {
    let size = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(3);
    let dual = std::env::args().nth(2).map_or(false, |s| s == "co");

    let ground = (0u8..size).collect();
    if dual {
        print_tree::<CoMoore>(&ground)
    } else {
        print_tree::<Moore>(&ground)
    }
}
