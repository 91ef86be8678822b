fn main() {
    // 0 = pass, 1 = regression, 2 = environment fault.
    match lintgate::cli::run() {
        Ok(verdict) => std::process::exit(verdict.exit_code()),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}
