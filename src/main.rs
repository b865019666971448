use std::env;
use std::time::Instant;

use hashlink_chain::{Chain, DEFAULT_DIFFICULTY_BITS, Difficulty, Link};

fn print_link(height: usize, link: &Link) {
    println!("  link {height}");
    println!("    payload : {}", String::from_utf8_lossy(link.payload()));
    println!("    nonce   : {}", link.nonce());
    println!("    address : {}", link.address());
    match link.parent_address() {
        Some(parent) => println!("    parent  : {parent}"),
        None => println!("    parent  : (genesis)"),
    }
}

fn main() -> hashlink_chain::Result<()> {
    env_logger::init();

    let bits: u32 = env::var("DIFFICULTY_BITS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_DIFFICULTY_BITS);
    let difficulty = Difficulty::from_leading_zero_bits(bits);

    println!("⛓️ Mining a hash chain at difficulty {bits} bits ({difficulty})");

    let started = Instant::now();
    let mut chain = Chain::genesis("Amy pays Joe $5", difficulty)?;
    for payload in ["Joe pays Amy $7", "Amy pays Lisa $3", "Lisa pays Joe $1"] {
        chain.append(payload)?;
    }
    println!("mined {} links in {:?}\n", chain.len(), started.elapsed());

    for (height, link) in chain.iter().enumerate() {
        print_link(height, link);
    }

    println!("\nverify: {:?}", chain.verify());

    let records = serde_json::to_string_pretty(&chain.to_records()).expect("serialize records");
    println!("\npersisted records (addresses recomputed on load):\n{records}");
    Ok(())
}
