fn main() {
    std::process::exit(pepper_greeter::cli::run());
}
