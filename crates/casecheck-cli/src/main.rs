fn main() {
    std::process::exit(casecheck_cli::cli::run_from_env());
}
