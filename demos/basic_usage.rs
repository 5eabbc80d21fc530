//! Basic SIEVE Cache Usage
//!
//! Walks through insertion, hits, eviction and removal on a small cache and
//! prints the cache state after each step.
//!
//! Run with: RUST_LOG=sieve_rs=trace cargo run --example basic_usage

use sieve_rs::config::SieveCacheConfig;
use sieve_rs::{ConfigError, SieveCache};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("SIEVE Cache Basic Usage");
    println!("=======================\n");

    let config = SieveCacheConfig::new(3)?;
    let cache: SieveCache<&'static str, u32> = SieveCache::init(config, None);

    println!("1. Fill the cache");
    cache.put("apple", 1);
    cache.put("banana", 2);
    cache.put("cherry", 3);
    println!("{cache}\n");

    println!("2. Read apple and banana (sets their visited bits)");
    println!("   apple  -> {:?}", cache.get(&"apple"));
    println!("   banana -> {:?}", cache.get(&"banana"));
    println!("   durian -> {:?}", cache.get(&"durian"));
    println!();

    println!("3. Insert durian: the hand skips visited entries and evicts cherry");
    cache.put("durian", 4);
    println!("{cache}\n");

    println!("4. Update banana in place");
    cache.put("banana", 20);
    println!("   banana -> {:?}\n", cache.get(&"banana"));

    println!("5. Remove apple");
    println!("   removed -> {:?}", cache.remove(&"apple"));
    println!("   len     -> {}/{}\n", cache.len(), cache.capacity());

    println!("6. Final statistics");
    println!("   {}", cache.stats());

    println!("\n7. Zero capacity is rejected");
    match SieveCache::<u32, u32>::new(0) {
        Ok(_) => println!("   unexpectedly accepted"),
        Err(err) => println!("   error: {err}"),
    }

    Ok(())
}
