fn main() {
    if let Err(err) = lineage_rs::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
