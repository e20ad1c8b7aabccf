fn main() {
    if let Err(error) = snack_import_cli::run() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
