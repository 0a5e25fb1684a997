//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `rollbook_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("rollbook_core version={}", rollbook_core::core_version());
    match rollbook_core::SchoolService::open_in_memory() {
        Ok(service) => {
            println!(
                "rollbook_core store=memory students={} instructors={} courses={}",
                service.roster().students().count(),
                service.roster().instructors().count(),
                service.roster().courses().count()
            );
        }
        Err(err) => {
            eprintln!("rollbook_core store=memory error={err}");
            std::process::exit(1);
        }
    }
}
