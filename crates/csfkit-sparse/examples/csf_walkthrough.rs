//! CSF Construction Walkthrough
//!
//! This example demonstrates:
//! - Building a COO tensor and sorting it into row-major order
//! - Converting it to a CSF tree and inspecting every level
//! - Walking the tree back to coordinates
//! - What happens with unsorted input
//!
//! Run with: RUST_LOG=csfkit_sparse=trace cargo run --example csf_walkthrough

use csfkit_sparse::{CooTensor, CsfBuilder, CsfTensor};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let fmt_layer = fmt::layer().compact().with_target(true).with_filter(filter);
    tracing_subscriber::registry().with(fmt_layer).init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;

    println!("=== csfkit: CSF Construction Walkthrough ===\n");

    // 1. A 4-mode tensor with 8 nonzeros, pushed out of order
    println!("1. Creating a 2x2x2x3 COO tensor...");
    let mut coo = CooTensor::zeros(vec![2, 2, 2, 3])?;
    let entries = [
        ([1, 1, 1, 2], 8.0),
        ([0, 0, 0, 1], 1.0),
        ([0, 1, 0, 2], 4.0),
        ([0, 0, 0, 2], 2.0),
        ([1, 1, 1, 0], 6.0),
        ([0, 1, 0, 0], 3.0),
        ([1, 1, 1, 1], 7.0),
        ([0, 1, 1, 0], 5.0),
    ];
    for (index, value) in entries {
        coo.push(index.to_vec(), value)?;
    }
    println!("   {} non-zeros, sorted: {}\n", coo.nnz(), coo.is_sorted());

    // 2. Unsorted input is rejected before construction starts
    println!("2. Building from unsorted input...");
    match CsfTensor::from_coo(&coo) {
        Ok(_) => println!("   unexpectedly accepted"),
        Err(err) => println!("   rejected: {err}\n"),
    }

    // 3. Sort and build
    println!("3. Sorting and building the CSF tree...");
    coo.sort();
    let csf = CsfBuilder::new().build(&coo)?;
    println!("   {csf}");
    println!("   nodes per level: {:?}", csf.indlen());
    for level in 0..csf.ndim() {
        match csf.indptr(level) {
            Some(ptr) => println!(
                "   level {level}: indices={:?} indptr={:?}",
                csf.indices(level),
                ptr
            ),
            None => println!("   level {level}: indices={:?} (leaves)", csf.indices(level)),
        }
    }
    println!("   values: {:?}", csf.data());
    println!("   footprint: {} bytes\n", csf.memory_footprint());

    // 4. Walk the tree
    println!("4. Walking the tree in leaf order...");
    for (index, value) in csf.iter() {
        println!("   {:?} = {}", index, value);
    }

    // 5. Back to COO and dense
    println!("\n5. Converting back...");
    let back = csf.to_coo()?;
    println!("   COO round trip equal: {}", back == coo);
    let dense = csf.to_dense()?;
    println!("   dense[1, 1, 1, 2] = {}", dense[[1, 1, 1, 2]]);

    println!("\n=== Example Complete ===");
    Ok(())
}
