fn main() {
    #[cfg(feature = "cli")]
    hunklz::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("hunklz: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
