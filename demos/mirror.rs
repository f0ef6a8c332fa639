//! Mirror Example - one parent, two children, reflect-back on
//!
//! This example demonstrates:
//! - Linking properties on a parent record
//! - Writes from the parent and from a child reaching everyone
//! - Observing a mirrored property with an effect
//! - Tearing everything down with clear()
//!
//! Run with: RUST_LOG=object_reflector=debug cargo run --example mirror

use object_reflector::{Record, Reflector, ReflectorConfig, Value};
use spark_signals::effect;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== object-reflector Mirror Example ===\n");

    let settings = Record::from_pairs([("theme", "dark"), ("volume", "7")]);
    let panel = Record::new();
    let status_bar = Record::new();

    let reflector = match Reflector::create(
        ReflectorConfig::new(&settings)
            .with_properties(["theme"])
            .with_reflect_back(true),
    ) {
        Ok(reflector) => reflector,
        Err(e) => {
            eprintln!("Failed to create reflector: {}", e);
            return;
        }
    };

    reflector.create_reflection(&panel);
    reflector.create_reflection(&status_bar);

    let watched = settings.clone();
    let _watch = effect(move || {
        println!("  [effect] theme is now {:?}", watched.get("theme"));
    });

    println!("\nParent write:");
    settings.set("theme", "light");
    print_all(&settings, &panel, &status_bar);

    println!("\nChild write (reflected back):");
    panel.set("theme", "solarized");
    print_all(&settings, &panel, &status_bar);

    println!("\nUnmirrored property stays local:");
    panel.set("volume", 11);
    println!("  settings.volume = {:?}, panel.volume = {:?}", settings.get("volume"), panel.get("volume"));

    reflector.clear();
    settings.set("theme", Value::Null);
    println!("\nAfter clear:");
    print_all(&settings, &panel, &status_bar);
}

fn print_all(settings: &Record, panel: &Record, status_bar: &Record) {
    println!("  settings   = {:?}", settings.get("theme"));
    println!("  panel      = {:?}", panel.get("theme"));
    println!("  status_bar = {:?}", status_bar.get("theme"));
}
