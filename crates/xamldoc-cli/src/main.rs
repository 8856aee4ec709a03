fn main() -> std::process::ExitCode {
    xamldoc_cli::run()
}
