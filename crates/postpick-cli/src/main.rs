fn main() {
    if let Err(error) = postpick_cli::run() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
