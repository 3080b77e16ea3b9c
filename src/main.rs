fn main() {
    if let Err(e) = plantcare_lib::run() {
        tracing::error!(error = %e, "Startup failed");
        eprintln!("plantcare: {e}");
        std::process::exit(1);
    }
}
