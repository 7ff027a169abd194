fn main() {
    ragsim::cli::run();
}
