fn main() {
    std::process::exit(casecheck_cli::cli::run_collapse_dirs_from_env());
}
